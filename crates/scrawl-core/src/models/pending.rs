//! Pending sync change model

use serde::{Deserialize, Serialize};

use super::NoteId;

/// Kind of change awaiting synchronization for a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// The note was created or edited locally
    CreateOrUpdate,
    /// The note was deleted locally
    Delete,
}

/// One queued change, owned exclusively by the sync queue.
///
/// At most one entry exists per note at any time; re-queuing coalesces into
/// the existing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChange {
    /// Note this change belongs to
    pub note_id: NoteId,
    /// What kind of change is pending
    pub change_type: ChangeType,
    /// Enqueue timestamp (Unix ms), the queue's chronological key
    pub queued_at: i64,
    /// Failed attempts so far
    pub retry_count: u32,
    /// Earliest retry time (Unix ms); `None` means ready now
    pub next_retry_at: Option<i64>,
}

impl PendingChange {
    /// Create a fresh entry queued at the current time.
    #[must_use]
    pub fn new(note_id: NoteId, change_type: ChangeType) -> Self {
        Self {
            note_id,
            change_type,
            queued_at: chrono::Utc::now().timestamp_millis(),
            retry_count: 0,
            next_retry_at: None,
        }
    }

    /// Whether the orchestrator may attempt this change at `now`.
    #[must_use]
    pub fn is_ready(&self, now: i64) -> bool {
        self.next_retry_at.map_or(true, |at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_change_is_ready() {
        let change = PendingChange::new(NoteId::new(), ChangeType::CreateOrUpdate);
        assert_eq!(change.retry_count, 0);
        assert!(change.is_ready(change.queued_at));
    }

    #[test]
    fn deferred_change_waits_for_retry_time() {
        let mut change = PendingChange::new(NoteId::new(), ChangeType::Delete);
        change.next_retry_at = Some(change.queued_at + 1_000);
        assert!(!change.is_ready(change.queued_at));
        assert!(change.is_ready(change.queued_at + 1_000));
        assert!(change.is_ready(change.queued_at + 2_000));
    }
}
