//! Sync pass summary model

use serde::{Deserialize, Serialize};

/// Immutable summary of one sync pass.
///
/// Produced once per `sync`/`sync_note` call (and once per applied conflict
/// resolution); never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Notes uploaded to the remote replica
    pub uploaded: usize,
    /// Notes downloaded and applied locally
    pub downloaded: usize,
    /// Remote deletes applied
    pub deleted: usize,
    /// Conflicts detected during the pass
    pub conflicts_detected: usize,
    /// Conflicts resolved during the pass
    pub conflicts_resolved: usize,
    /// Whether the pass completed without a pass-level failure
    pub success: bool,
    /// Pass-level failure message, if any
    pub error: Option<String>,
    /// Completion timestamp (Unix ms)
    pub completed_at: i64,
}

impl SyncResult {
    /// Count of notes that moved in either direction.
    #[must_use]
    pub const fn total_transferred(&self) -> usize {
        self.uploaded + self.downloaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_transferred_sums_both_directions() {
        let result = SyncResult {
            uploaded: 3,
            downloaded: 2,
            success: true,
            ..Default::default()
        };
        assert_eq!(result.total_transferred(), 5);
    }
}
