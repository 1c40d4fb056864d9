//! Ordered, deduplicating queue of pending per-note sync changes.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::{ChangeType, NoteId, PendingChange};
use crate::Result;

/// Thread-safe FIFO of pending changes, at most one entry per note.
///
/// Entries are kept sorted by `queued_at`. Every operation takes a short
/// internal lock and never performs I/O, so the editing path can enqueue
/// without blocking. Entries stay queued while a sync attempt is in flight
/// and are removed only on success or explicit cancellation.
#[derive(Debug, Default)]
pub struct SyncQueue {
    entries: Mutex<Vec<PendingChange>>,
}

impl SyncQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a previously persisted queue from a JSON file.
    ///
    /// A missing file yields an empty queue.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut entries: Vec<PendingChange> = serde_json::from_str(&raw)?;
        entries.sort_by_key(|entry| entry.queued_at);
        Ok(Self {
            entries: Mutex::new(entries),
        })
    }

    /// Persist the queue to a JSON file so unsynced edits survive restarts.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let snapshot = self.pending_changes();
        let raw = serde_json::to_vec_pretty(&snapshot)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Queue a change for a note, coalescing with an existing entry.
    ///
    /// When the note already has a pending entry, only its `change_type` is
    /// updated; `queued_at` and the retry state are kept.
    pub fn enqueue(&self, note_id: NoteId, change_type: ChangeType) {
        let mut entries = self.lock();
        if let Some(existing) = entries.iter_mut().find(|entry| entry.note_id == note_id) {
            existing.change_type = change_type;
            return;
        }

        let change = PendingChange::new(note_id, change_type);
        let position = entries.partition_point(|entry| entry.queued_at <= change.queued_at);
        entries.insert(position, change);
    }

    /// Explicitly cancel a pending change.
    pub fn cancel(&self, note_id: &NoteId) -> bool {
        self.remove(note_id)
    }

    /// Remove a note's entry, e.g. after a successful sync.
    pub fn remove(&self, note_id: &NoteId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|entry| entry.note_id != *note_id);
        entries.len() < before
    }

    /// Defer a note's entry to a future retry time after a failed attempt.
    pub fn defer(&self, note_id: &NoteId, next_retry_at: i64, retry_count: u32) {
        let mut entries = self.lock();
        if let Some(entry) = entries.iter_mut().find(|entry| entry.note_id == *note_id) {
            entry.next_retry_at = Some(next_retry_at);
            entry.retry_count = retry_count;
        }
    }

    /// Entries the orchestrator may attempt at `now`, in chronological order.
    #[must_use]
    pub fn ready_changes(&self, now: i64) -> Vec<PendingChange> {
        self.lock()
            .iter()
            .filter(|entry| entry.is_ready(now))
            .cloned()
            .collect()
    }

    /// Snapshot of all pending entries, in chronological order.
    #[must_use]
    pub fn pending_changes(&self) -> Vec<PendingChange> {
        self.lock().clone()
    }

    /// The pending entry for a note, if any.
    #[must_use]
    pub fn get(&self, note_id: &NoteId) -> Option<PendingChange> {
        self.lock()
            .iter()
            .find(|entry| entry.note_id == *note_id)
            .cloned()
    }

    /// Number of distinct notes with a pending change.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no changes are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PendingChange>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
