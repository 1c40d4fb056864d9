//! scrawl-core - Cloud sync engine for Scrawl
//!
//! This crate contains the synchronization engine shared by all Scrawl
//! interfaces: the pending-change queue, conflict detection and merging,
//! payload encryption, the provider registry, and the orchestrating service.

pub mod crypto;
pub mod error;
pub mod models;
pub mod provider;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{ChangeType, Note, NoteId, PendingChange, SyncResult};
pub use sync::{ConflictResolution, SyncEvent, SyncOptions, SyncService, SyncStatus};
