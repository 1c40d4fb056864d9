//! Conflict detection and merging for divergent note replicas.
//!
//! A conflict exists when both replicas changed independently since their
//! last common sync point. Detection compares wall-clock modification times
//! against the local note's `last_synced_at`; no version vectors are kept,
//! so the check inherits whatever clock skew exists between replicas.

use serde::{Deserialize, Serialize};

use crate::models::Note;

/// Marker opening the local half of a merged body.
pub const LOCAL_MARKER: &str = "<<<<<<< LOCAL";
/// Marker separating the local and remote halves.
pub const SEPARATOR_MARKER: &str = "=======";
/// Marker closing the remote half.
pub const REMOTE_MARKER: &str = ">>>>>>> REMOTE";

/// How a detected conflict should be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// The local version wins and overwrites remote
    KeepLocal,
    /// The remote version wins and overwrites local
    KeepRemote,
    /// Both bodies are combined with markers for manual resolution
    Merge,
}

/// True when both replicas changed since the last common sync point.
#[must_use]
pub fn has_conflict(local: &Note, remote: &Note) -> bool {
    has_conflict_at(local, remote.modified_at)
}

/// [`has_conflict`] against remote metadata alone, so the check can run on a
/// [`crate::provider::CloudFileInfo`] without downloading content.
#[must_use]
pub fn has_conflict_at(local: &Note, remote_modified_at: i64) -> bool {
    let last_synced = local.last_synced_epoch();
    local.modified_at > last_synced && remote_modified_at > last_synced
}

/// Combine two divergent bodies into one, delimited by the fixed markers.
///
/// The local note contributes identity and metadata; the remote side
/// contributes only content. Both original bodies appear verbatim in the
/// output.
#[must_use]
pub fn merge_notes(local: &Note, remote: &Note) -> Note {
    let mut merged = local.clone();
    merged.content = format!(
        "{LOCAL_MARKER}\n{}\n{SEPARATOR_MARKER}\n{}\n{REMOTE_MARKER}",
        local.content, remote.content
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE_MS: i64 = 60_000;

    fn note_with_times(modified_at: i64, last_synced_at: Option<i64>) -> Note {
        let mut note = Note::new("title", "body");
        note.modified_at = modified_at;
        note.last_synced_at = last_synced_at;
        note
    }

    #[test]
    fn both_sides_changed_is_a_conflict() {
        // last synced T-60m, local edited T-30m, remote edited T-20m
        let now = chrono::Utc::now().timestamp_millis();
        let local = note_with_times(now - 30 * MINUTE_MS, Some(now - 60 * MINUTE_MS));
        let remote = note_with_times(now - 20 * MINUTE_MS, None);
        assert!(has_conflict(&local, &remote));
    }

    #[test]
    fn stale_local_edit_is_not_a_conflict() {
        // local edit predates the sync point; only remote moved
        let now = chrono::Utc::now().timestamp_millis();
        let local = note_with_times(now - 70 * MINUTE_MS, Some(now - 60 * MINUTE_MS));
        assert!(!has_conflict_at(&local, now - 20 * MINUTE_MS));
    }

    #[test]
    fn only_local_changed_is_not_a_conflict() {
        let now = chrono::Utc::now().timestamp_millis();
        let local = note_with_times(now - 10 * MINUTE_MS, Some(now - 60 * MINUTE_MS));
        assert!(!has_conflict_at(&local, now - 90 * MINUTE_MS));
    }

    #[test]
    fn neither_changed_is_not_a_conflict() {
        let now = chrono::Utc::now().timestamp_millis();
        let local = note_with_times(now - 70 * MINUTE_MS, Some(now - 60 * MINUTE_MS));
        assert!(!has_conflict_at(&local, now - 65 * MINUTE_MS));
    }

    #[test]
    fn never_synced_note_conflicts_with_any_remote() {
        let now = chrono::Utc::now().timestamp_millis();
        let local = note_with_times(now, None);
        assert!(has_conflict_at(&local, now - MINUTE_MS));
    }

    #[test]
    fn merge_contains_both_bodies_and_markers() {
        let mut local = Note::new("Meeting notes", "local body");
        local.language = Some("markdown".to_string());
        local.is_pinned = true;
        let mut remote = local.clone();
        remote.content = "remote body".to_string();

        let merged = merge_notes(&local, &remote);
        assert!(merged.content.contains("local body"));
        assert!(merged.content.contains("remote body"));
        assert!(merged.content.contains(LOCAL_MARKER));
        assert!(merged.content.contains(SEPARATOR_MARKER));
        assert!(merged.content.contains(REMOTE_MARKER));
    }

    #[test]
    fn merge_preserves_local_identity_and_metadata() {
        let mut local = Note::new("Meeting notes", "local body");
        local.language = Some("markdown".to_string());
        local.is_pinned = true;
        let mut remote = Note::new("Other title", "remote body");
        remote.id = local.id;

        let merged = merge_notes(&local, &remote);
        assert_eq!(merged.id, local.id);
        assert_eq!(merged.title, "Meeting notes");
        assert_eq!(merged.language.as_deref(), Some("markdown"));
        assert!(merged.is_pinned);
    }

    #[test]
    fn merge_orders_local_before_remote() {
        let local = Note::new("t", "AAA");
        let mut remote = local.clone();
        remote.content = "BBB".to_string();

        let merged = merge_notes(&local, &remote);
        let local_pos = merged.content.find("AAA").unwrap();
        let remote_pos = merged.content.find("BBB").unwrap();
        assert!(local_pos < remote_pos);
    }
}
