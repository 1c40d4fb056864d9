//! Retry backoff schedule for failed sync operations.

use std::time::Duration;

/// Ceiling for any retry delay, in seconds.
pub const MAX_DELAY_SECS: u64 = 60;

// 2^6 = 64 already exceeds the cap, so larger exponents never shift.
const CAP_EXPONENT: u32 = 6;

/// Backoff delay for a retry attempt: `min(2^attempt, 60)` seconds.
///
/// Monotonic non-decreasing and total for every `u32` attempt; the cap is
/// applied before the shift so large attempt counts cannot overflow.
#[must_use]
pub fn delay_for(attempt: u32) -> Duration {
    let secs = if attempt >= CAP_EXPONENT {
        MAX_DELAY_SECS
    } else {
        (1u64 << attempt).min(MAX_DELAY_SECS)
    };
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_capped_power_of_two() {
        for attempt in 0..=10u32 {
            let expected = 2u64.pow(attempt.min(CAP_EXPONENT)).min(MAX_DELAY_SECS);
            assert_eq!(delay_for(attempt), Duration::from_secs(expected));
        }
        assert_eq!(delay_for(0), Duration::from_secs(1));
        assert_eq!(delay_for(4), Duration::from_secs(16));
        assert_eq!(delay_for(5), Duration::from_secs(32));
        assert_eq!(delay_for(6), Duration::from_secs(60));
    }

    #[test]
    fn never_exceeds_cap() {
        for attempt in 0..=100u32 {
            assert!(delay_for(attempt) <= Duration::from_secs(MAX_DELAY_SECS));
        }
        assert_eq!(delay_for(u32::MAX), Duration::from_secs(MAX_DELAY_SECS));
    }

    #[test]
    fn monotonic_non_decreasing() {
        let mut previous = Duration::ZERO;
        for attempt in 0..=100u32 {
            let delay = delay_for(attempt);
            assert!(delay >= previous);
            previous = delay;
        }
    }
}
