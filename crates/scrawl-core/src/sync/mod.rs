//! Sync engine: queue, conflict handling, backoff, and orchestration.

pub mod backoff;
pub mod conflict;
pub mod queue;
pub mod service;

pub use conflict::{
    has_conflict, has_conflict_at, merge_notes, ConflictResolution, LOCAL_MARKER, REMOTE_MARKER,
    SEPARATOR_MARKER,
};
pub use queue::SyncQueue;
pub use service::{
    SyncConflict, SyncEvent, SyncOptions, SyncProgress, SyncService, SyncStatus,
};
