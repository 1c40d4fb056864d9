//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a note, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A note as seen by the sync engine.
///
/// The local store owns the canonical copy; the engine reads and writes it
/// through the [`crate::store::NoteStore`] boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Short display title
    pub title: String,
    /// UTF-8 text body
    pub content: String,
    /// Syntax/markup hint for the editor (e.g. "markdown")
    pub language: Option<String>,
    /// Pinned in the note list
    pub is_pinned: bool,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last local mutation time (Unix ms)
    pub modified_at: i64,
    /// Time of the last successful sync; `None` if never synced
    pub last_synced_at: Option<i64>,
    /// Bumped on every successful sync, only ever increases
    pub sync_version: u64,
}

impl Note {
    /// Create a new, never-synced note.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: NoteId::new(),
            title: title.into(),
            content: content.into(),
            language: None,
            is_pinned: false,
            created_at: now,
            modified_at: now,
            last_synced_at: None,
            sync_version: 0,
        }
    }

    /// The last sync point, treating "never synced" as the epoch.
    #[must_use]
    pub fn last_synced_epoch(&self) -> i64 {
        self.last_synced_at.unwrap_or(0)
    }

    /// Whether this replica changed since its last sync point.
    ///
    /// A never-synced note counts as changed.
    #[must_use]
    pub fn modified_since_sync(&self) -> bool {
        self.modified_at > self.last_synced_epoch()
    }

    /// Record a local edit at the current time.
    pub fn touch(&mut self) {
        self.modified_at = chrono::Utc::now().timestamp_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_id_unique() {
        let id1 = NoteId::new();
        let id2 = NoteId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn note_id_parse_roundtrip() {
        let id = NoteId::new();
        let parsed: NoteId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn new_note_is_unsynced() {
        let note = Note::new("Groceries", "milk, eggs");
        assert_eq!(note.sync_version, 0);
        assert_eq!(note.last_synced_at, None);
        assert_eq!(note.created_at, note.modified_at);
        assert!(note.modified_since_sync());
    }

    #[test]
    fn modified_since_sync_compares_against_sync_point() {
        let mut note = Note::new("a", "b");
        note.last_synced_at = Some(note.modified_at);
        assert!(!note.modified_since_sync());

        note.last_synced_at = Some(note.modified_at - 1);
        assert!(note.modified_since_sync());

        // An edit older than the sync point does not count as a change.
        note.last_synced_at = Some(note.modified_at + 60_000);
        assert!(!note.modified_since_sync());
    }

    #[test]
    fn touch_advances_modified_at() {
        let mut note = Note::new("a", "b");
        let before = note.modified_at;
        note.touch();
        assert!(note.modified_at >= before);
    }
}
