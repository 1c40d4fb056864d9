//! Data models for the Scrawl sync engine

mod note;
mod pending;
mod sync_result;

pub use note::{Note, NoteId};
pub use pending::{ChangeType, PendingChange};
pub use sync_result::SyncResult;
