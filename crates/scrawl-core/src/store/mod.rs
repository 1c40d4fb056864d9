//! Local note store boundary.
//!
//! The store owns note persistence; the sync engine only reads and writes
//! notes through this trait.

mod json;

use async_trait::async_trait;

use crate::models::{Note, NoteId};
use crate::Result;

pub use json::JsonNoteStore;

/// Read/write view of the local note store.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Fetch a note by id; `None` when it does not exist.
    async fn get_note(&self, id: &NoteId) -> Result<Option<Note>>;

    /// Insert or replace a note.
    async fn update_note(&self, note: &Note) -> Result<()>;

    /// All notes in the store.
    async fn all_notes(&self) -> Result<Vec<Note>>;
}
