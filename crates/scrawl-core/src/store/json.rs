//! JSON-file note store.
//!
//! One JSON document maps note id to note. This is the simple key-value
//! store the desktop app persists notes with; the sync engine shares it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::NoteStore;
use crate::models::{Note, NoteId};
use crate::Result;

/// Note store backed by a single JSON file.
#[derive(Debug, Default)]
pub struct JsonNoteStore {
    notes: Mutex<HashMap<NoteId, Note>>,
    path: Option<PathBuf>,
}

impl JsonNoteStore {
    /// Open a store at the given path, loading any existing document.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let notes = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            notes: Mutex::new(notes),
            path: Some(path),
        })
    }

    /// An unpersisted store, primarily for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Number of notes in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no notes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NoteId, Note>> {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, notes: &HashMap<NoteId, Note>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write-then-rename so a crash mid-write never truncates the store.
        let staged = staging_path(path);
        std::fs::write(&staged, serde_json::to_vec_pretty(notes)?)?;
        std::fs::rename(&staged, path)?;
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map_or_else(
        || std::ffi::OsString::from("notes.json"),
        std::ffi::OsStr::to_os_string,
    );
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl NoteStore for JsonNoteStore {
    async fn get_note(&self, id: &NoteId) -> Result<Option<Note>> {
        Ok(self.lock().get(id).cloned())
    }

    async fn update_note(&self, note: &Note) -> Result<()> {
        let snapshot = {
            let mut notes = self.lock();
            notes.insert(note.id, note.clone());
            notes.clone()
        };
        self.persist(&snapshot)
    }

    async fn all_notes(&self) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self.lock().values().cloned().collect();
        notes.sort_by_key(|note| note.created_at);
        Ok(notes)
    }
}
