//! Sync orchestration: connection lifecycle, queue drain, conflict handling.
//!
//! One service instance owns the pending queue, the active provider, and the
//! per-note in-flight guards. A drain pass processes ready changes in
//! chronological order; a conflicted note suspends as continuation state in
//! the conflict table and never blocks other notes.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::sync::broadcast;

use crate::crypto;
use crate::models::{ChangeType, Note, NoteId, PendingChange, SyncResult};
use crate::provider::{CloudProvider, ProviderKind, ProviderRegistry, ProviderSettings};
use crate::store::NoteStore;
use crate::sync::backoff;
use crate::sync::conflict::{self, ConflictResolution};
use crate::sync::queue::SyncQueue;
use crate::util::now_ms;
use crate::{Error, Result};

/// Connection/operation state of the sync service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No provider connection
    Disconnected,
    /// Provider authentication in progress
    Connecting,
    /// Connected and waiting for work
    Idle,
    /// A drain pass is running
    Syncing,
    /// The last connect or pass failed; user action required
    Error,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Progress notification emitted while a pass runs.
#[derive(Debug, Clone)]
pub struct SyncProgress {
    /// Operation label, e.g. "sync"
    pub operation: String,
    /// Items processed so far
    pub processed: usize,
    /// Items in the pass
    pub total: usize,
    /// Completion percentage
    pub percent: u8,
}

/// A conflict awaiting an explicit resolution.
#[derive(Debug, Clone)]
pub struct SyncConflict {
    /// Conflicted note
    pub note_id: NoteId,
    /// Local version
    pub local: Note,
    /// Remote version
    pub remote: Note,
}

/// Side-channel notifications consumed by UI layers; fire-and-forget.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Pass progress update
    Progress(SyncProgress),
    /// A conflict needs resolution
    Conflict(SyncConflict),
}

/// Configuration for a [`SyncService`].
#[derive(Clone)]
pub struct SyncOptions {
    /// Encryption passphrase for note payloads
    pub passphrase: String,
    /// Settings handed to provider factories
    pub provider_settings: ProviderSettings,
    /// Remote folder that holds note objects
    pub remote_root: String,
    /// Where the pending queue is persisted; `None` keeps it in memory
    pub queue_path: Option<PathBuf>,
}

impl std::fmt::Debug for SyncOptions {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SyncOptions")
            .field("passphrase", &"[REDACTED]")
            .field("provider_settings", &self.provider_settings)
            .field("remote_root", &self.remote_root)
            .field("queue_path", &self.queue_path)
            .finish()
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            passphrase: String::new(),
            provider_settings: ProviderSettings::default(),
            remote_root: "notes".to_string(),
            queue_path: None,
        }
    }
}

/// Continuation state for a note suspended on conflict resolution.
#[derive(Debug, Clone)]
struct PendingConflict {
    change: PendingChange,
    local: Note,
    remote: Note,
}

/// What one change attempt did.
enum Outcome {
    Uploaded,
    Downloaded,
    Deleted,
    /// Nothing to do (both replicas already in sync)
    Clean,
    /// The local note vanished; the queued change is stale
    Stale,
    /// Suspended awaiting a resolution
    Conflict,
}

/// Orchestrates synchronization between the local store and one remote
/// replica.
pub struct SyncService {
    store: Arc<dyn NoteStore>,
    registry: ProviderRegistry,
    provider_settings: ProviderSettings,
    remote_root: String,
    queue_path: Option<PathBuf>,
    passphrase: RwLock<String>,
    queue: SyncQueue,
    provider: Mutex<Option<Arc<dyn CloudProvider>>>,
    status: Mutex<SyncStatus>,
    last_result: Mutex<Option<SyncResult>>,
    in_flight: Mutex<HashSet<NoteId>>,
    conflicts: Mutex<HashMap<NoteId, PendingConflict>>,
    drain_lock: tokio::sync::Mutex<()>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncService {
    /// Create a service over a note store and provider registry.
    ///
    /// When `options.queue_path` is set, a previously persisted queue is
    /// restored so unsynced edits survive restarts.
    pub fn new(
        store: Arc<dyn NoteStore>,
        registry: ProviderRegistry,
        options: SyncOptions,
    ) -> Result<Self> {
        let queue = match &options.queue_path {
            Some(path) => SyncQueue::load(path)?,
            None => SyncQueue::new(),
        };
        let (events, _) = broadcast::channel(128);

        Ok(Self {
            store,
            registry,
            provider_settings: options.provider_settings,
            remote_root: options.remote_root,
            queue_path: options.queue_path,
            passphrase: RwLock::new(options.passphrase),
            queue,
            provider: Mutex::new(None),
            status: Mutex::new(SyncStatus::Disconnected),
            last_result: Mutex::new(None),
            in_flight: Mutex::new(HashSet::new()),
            conflicts: Mutex::new(HashMap::new()),
            drain_lock: tokio::sync::Mutex::new(()),
            events,
        })
    }

    /// Subscribe to progress and conflict notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Current connection/operation state.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        *lock(&self.status)
    }

    /// Name of the connected provider, if any.
    #[must_use]
    pub fn current_provider(&self) -> Option<String> {
        lock(&self.provider)
            .as_ref()
            .map(|provider| provider.provider_name().to_string())
    }

    /// Summary of the most recent pass or resolution.
    #[must_use]
    pub fn last_sync_result(&self) -> Option<SyncResult> {
        lock(&self.last_result).clone()
    }

    /// Snapshot of pending changes, in chronological order.
    #[must_use]
    pub fn pending_changes(&self) -> Vec<PendingChange> {
        self.queue.pending_changes()
    }

    /// Conflicts currently awaiting a resolution.
    #[must_use]
    pub fn pending_conflicts(&self) -> Vec<SyncConflict> {
        lock(&self.conflicts)
            .values()
            .map(|pending| SyncConflict {
                note_id: pending.change.note_id,
                local: pending.local.clone(),
                remote: pending.remote.clone(),
            })
            .collect()
    }

    /// Replace the encryption passphrase.
    ///
    /// The new value applies to note operations that start after the call;
    /// an operation already in flight keeps the passphrase it read at its
    /// start.
    pub fn set_passphrase(&self, passphrase: impl Into<String>) {
        *self.passphrase.write().unwrap_or_else(PoisonError::into_inner) = passphrase.into();
    }

    /// Record a local note change for the next sync pass.
    ///
    /// Pure enqueue: safe to call from the editing path on every keystroke.
    pub fn queue_note_for_sync(&self, note_id: NoteId, change_type: ChangeType) {
        self.queue.enqueue(note_id, change_type);
    }

    /// Queue every note in the store for synchronization.
    ///
    /// Useful for the first sync after connecting a provider.
    pub async fn queue_all_notes(&self) -> Result<usize> {
        let notes = self.store.all_notes().await?;
        let count = notes.len();
        for note in notes {
            self.queue.enqueue(note.id, ChangeType::CreateOrUpdate);
        }
        Ok(count)
    }

    /// Explicitly cancel a pending change.
    pub fn cancel_pending_change(&self, note_id: &NoteId) -> bool {
        self.queue.cancel(note_id)
    }

    /// Write the pending queue to its configured path, if any.
    pub fn persist_queue(&self) -> Result<()> {
        if let Some(path) = &self.queue_path {
            self.queue.save(path)?;
        }
        Ok(())
    }

    /// Connect to a provider kind from the registry and authenticate.
    ///
    /// Authentication failures surface immediately and are never retried
    /// automatically; call again after fixing credentials.
    pub async fn connect(&self, kind: ProviderKind) -> Result<()> {
        self.set_status(SyncStatus::Connecting);

        let provider = match self.registry.create(kind, &self.provider_settings) {
            Ok(provider) => provider,
            Err(error) => {
                self.set_status(SyncStatus::Error);
                return Err(error);
            }
        };

        match provider.authenticate().await {
            Ok(true) => {}
            Ok(false) => {
                self.set_status(SyncStatus::Error);
                return Err(Error::Auth(format!(
                    "{} rejected the configured credentials",
                    provider.provider_name()
                )));
            }
            Err(error) => {
                self.set_status(SyncStatus::Error);
                return Err(error);
            }
        }

        if let Err(error) = provider.create_folder(&self.remote_root).await {
            self.set_status(SyncStatus::Error);
            return Err(error);
        }

        tracing::info!("Connected to {} provider", provider.provider_name());
        *lock(&self.provider) = Some(provider);
        self.set_status(SyncStatus::Idle);
        Ok(())
    }

    /// Sign out of the provider; pending changes are preserved.
    ///
    /// Waits for a running pass instead of aborting its in-flight calls.
    pub async fn disconnect(&self) -> Result<()> {
        let _pass = self.drain_lock.lock().await;

        let provider = lock(&self.provider).take();
        if let Some(provider) = provider {
            if let Err(error) = provider.sign_out().await {
                tracing::warn!("Provider sign-out failed: {error}");
            }
        }

        self.persist_queue()?;
        self.set_status(SyncStatus::Disconnected);
        Ok(())
    }

    /// Drain ready queue entries in chronological order.
    ///
    /// Per-note failures are isolated: a transient failure defers that entry
    /// with backoff and the pass moves on. Authentication and encryption
    /// failures abort the pass (they would fail identically for every note)
    /// and leave the queue untouched.
    pub async fn sync(&self) -> Result<SyncResult> {
        let provider = self.provider_handle().ok_or(Error::NotConnected)?;
        let _pass = self.drain_lock.lock().await;
        self.set_status(SyncStatus::Syncing);

        let ready = self.queue.ready_changes(now_ms());
        let total = ready.len();
        tracing::info!("Sync pass starting with {total} ready changes");

        let mut result = SyncResult::default();
        let mut pass_error: Option<Error> = None;

        for (index, change) in ready.into_iter().enumerate() {
            if !self.try_begin(change.note_id) {
                // in flight elsewhere, e.g. awaiting a conflict resolution
                continue;
            }

            match self.sync_change(&provider, &change).await {
                Ok(Outcome::Conflict) => {
                    // guard intentionally kept until the conflict resolves
                    result.conflicts_detected += 1;
                }
                Ok(outcome) => {
                    self.apply_success(&mut result, &change.note_id, &outcome);
                }
                Err(error) if is_pass_fatal(&error) => {
                    self.finish(&change.note_id);
                    tracing::error!("Aborting sync pass: {error}");
                    pass_error = Some(error);
                    break;
                }
                Err(error) => {
                    self.defer_after_failure(&change, &error);
                    self.finish(&change.note_id);
                }
            }

            self.emit_progress("sync", index + 1, total);
        }

        if let Some(error) = pass_error {
            result.success = false;
            result.error = Some(error.to_string());
            self.set_status(SyncStatus::Error);
        } else {
            result.success = true;
            self.set_status(SyncStatus::Idle);
        }
        result.completed_at = now_ms();

        self.persist_queue()?;
        *lock(&self.last_result) = Some(result.clone());
        Ok(result)
    }

    /// Sync a single note now, bypassing the retry-time gate.
    ///
    /// Fails with [`Error::InvalidInput`] when the note is already being
    /// synced (by a drain pass or a pending conflict).
    pub async fn sync_note(&self, note_id: NoteId) -> Result<SyncResult> {
        let provider = self.provider_handle().ok_or(Error::NotConnected)?;

        if !self.try_begin(note_id) {
            return Err(Error::InvalidInput(format!(
                "sync already in progress for note {note_id}"
            )));
        }

        let change = self
            .queue
            .get(&note_id)
            .unwrap_or_else(|| PendingChange::new(note_id, ChangeType::CreateOrUpdate));

        let mut result = SyncResult::default();
        match self.sync_change(&provider, &change).await {
            Ok(Outcome::Conflict) => {
                result.conflicts_detected += 1;
                result.success = true;
            }
            Ok(outcome) => {
                self.apply_success(&mut result, &note_id, &outcome);
                result.success = true;
            }
            Err(error) => {
                if !is_pass_fatal(&error) {
                    self.defer_after_failure(&change, &error);
                }
                self.finish(&note_id);
                result.success = false;
                result.error = Some(error.to_string());
            }
        }
        result.completed_at = now_ms();

        self.persist_queue()?;
        *lock(&self.last_result) = Some(result.clone());
        Ok(result)
    }

    /// Apply a resolution to a pending conflict and upload the outcome.
    ///
    /// Returns the note as written to both replicas.
    pub async fn resolve_conflict(
        &self,
        note_id: NoteId,
        resolution: ConflictResolution,
    ) -> Result<Note> {
        let pending = lock(&self.conflicts)
            .remove(&note_id)
            .ok_or_else(|| Error::NotFound(format!("no conflict pending for note {note_id}")))?;

        let Some(provider) = self.provider_handle() else {
            lock(&self.conflicts).insert(note_id, pending);
            return Err(Error::NotConnected);
        };

        let mut resolved = match resolution {
            ConflictResolution::KeepLocal => pending.local.clone(),
            ConflictResolution::KeepRemote => {
                let mut note = pending.remote.clone();
                note.id = pending.local.id;
                note
            }
            ConflictResolution::Merge => conflict::merge_notes(&pending.local, &pending.remote),
        };
        resolved.sync_version =
            pending.local.sync_version.max(pending.remote.sync_version) + 1;
        resolved.last_synced_at = Some(now_ms());

        let path = self.remote_note_path(&note_id);
        match self.push_note(&provider, &path, &resolved).await {
            Ok(()) => {}
            Err(error) => {
                if !is_pass_fatal(&error) {
                    self.defer_after_failure(&pending.change, &error);
                }
                self.finish(&note_id);
                return Err(error);
            }
        }

        self.queue.remove(&note_id);
        self.finish(&note_id);
        self.persist_queue()?;

        tracing::info!("Conflict for note {note_id} resolved ({resolution:?})");
        *lock(&self.last_result) = Some(SyncResult {
            uploaded: 1,
            conflicts_resolved: 1,
            success: true,
            completed_at: now_ms(),
            ..Default::default()
        });
        Ok(resolved)
    }

    /// Drop a pending conflict without resolving it.
    ///
    /// The change stays queued; a later pass will detect the conflict again.
    pub fn cancel_conflict(&self, note_id: &NoteId) -> bool {
        let removed = lock(&self.conflicts).remove(note_id).is_some();
        if removed {
            self.finish(note_id);
        }
        removed
    }

    // ------------------------------------------------------------------
    // Per-change processing
    // ------------------------------------------------------------------

    async fn sync_change(
        &self,
        provider: &Arc<dyn CloudProvider>,
        change: &PendingChange,
    ) -> Result<Outcome> {
        let path = self.remote_note_path(&change.note_id);

        match change.change_type {
            ChangeType::Delete => {
                let existed = provider.delete_file(&path).await?;
                if !existed {
                    tracing::debug!("Remote copy of {} was already gone", change.note_id);
                }
                Ok(Outcome::Deleted)
            }
            ChangeType::CreateOrUpdate => {
                let Some(local) = self.store.get_note(&change.note_id).await? else {
                    tracing::warn!(
                        "Note {} vanished locally; dropping queued change",
                        change.note_id
                    );
                    return Ok(Outcome::Stale);
                };

                let Some(info) = provider.get_file_info(&path).await? else {
                    self.upload_note(provider, &path, &local).await?;
                    return Ok(Outcome::Uploaded);
                };

                if conflict::has_conflict_at(&local, info.modified_at) {
                    let Some(remote) = self.download_note(provider, &path).await? else {
                        // remote vanished between the metadata check and the
                        // download; treat as a plain upload
                        self.upload_note(provider, &path, &local).await?;
                        return Ok(Outcome::Uploaded);
                    };
                    self.register_conflict(change, local, remote);
                    return Ok(Outcome::Conflict);
                }

                if local.modified_since_sync() {
                    self.upload_note(provider, &path, &local).await?;
                    Ok(Outcome::Uploaded)
                } else if info.modified_at > local.last_synced_epoch() {
                    let Some(remote) = self.download_note(provider, &path).await? else {
                        return Ok(Outcome::Clean);
                    };
                    self.apply_remote(&local, remote).await?;
                    Ok(Outcome::Downloaded)
                } else {
                    Ok(Outcome::Clean)
                }
            }
        }
    }

    async fn upload_note(
        &self,
        provider: &Arc<dyn CloudProvider>,
        path: &str,
        local: &Note,
    ) -> Result<()> {
        let mut synced = local.clone();
        synced.sync_version += 1;
        synced.last_synced_at = Some(now_ms());
        self.push_note(provider, path, &synced).await
    }

    async fn push_note(
        &self,
        provider: &Arc<dyn CloudProvider>,
        path: &str,
        note: &Note,
    ) -> Result<()> {
        let passphrase = self.passphrase();
        let payload = serde_json::to_vec(note)?;
        let blob = crypto::encrypt(&payload, &passphrase)?;
        provider.upload_file(path, &blob).await?;
        self.store.update_note(note).await?;
        tracing::debug!("Uploaded note {} (v{})", note.id, note.sync_version);
        Ok(())
    }

    async fn download_note(
        &self,
        provider: &Arc<dyn CloudProvider>,
        path: &str,
    ) -> Result<Option<Note>> {
        let Some(blob) = provider.download_file(path).await? else {
            return Ok(None);
        };
        let passphrase = self.passphrase();
        let payload = crypto::decrypt(&blob, &passphrase)?;
        Ok(Some(serde_json::from_slice(&payload)?))
    }

    async fn apply_remote(&self, local: &Note, mut remote: Note) -> Result<()> {
        remote.id = local.id;
        remote.sync_version = remote.sync_version.max(local.sync_version) + 1;
        remote.last_synced_at = Some(now_ms());
        self.store.update_note(&remote).await?;
        tracing::debug!("Downloaded note {} (v{})", remote.id, remote.sync_version);
        Ok(())
    }

    fn register_conflict(&self, change: &PendingChange, local: Note, remote: Note) {
        tracing::info!("Conflict detected for note {}", change.note_id);
        lock(&self.conflicts).insert(
            change.note_id,
            PendingConflict {
                change: change.clone(),
                local: local.clone(),
                remote: remote.clone(),
            },
        );
        self.emit(SyncEvent::Conflict(SyncConflict {
            note_id: change.note_id,
            local,
            remote,
        }));
    }

    fn apply_success(&self, result: &mut SyncResult, note_id: &NoteId, outcome: &Outcome) {
        match outcome {
            Outcome::Uploaded => result.uploaded += 1,
            Outcome::Downloaded => result.downloaded += 1,
            Outcome::Deleted => result.deleted += 1,
            Outcome::Clean | Outcome::Stale => {}
            // conflicts keep their entry and guard; callers handle them first
            Outcome::Conflict => return,
        }
        self.queue.remove(note_id);
        self.finish(note_id);
    }

    fn defer_after_failure(&self, change: &PendingChange, error: &Error) {
        let delay = backoff::delay_for(change.retry_count);
        let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
        self.queue
            .defer(&change.note_id, now_ms() + delay_ms, change.retry_count + 1);
        tracing::warn!(
            "Sync failed for note {} (attempt {}), retrying in {:?}: {error}",
            change.note_id,
            change.retry_count + 1,
            delay
        );
    }

    // ------------------------------------------------------------------
    // Small helpers
    // ------------------------------------------------------------------

    fn provider_handle(&self) -> Option<Arc<dyn CloudProvider>> {
        lock(&self.provider).clone()
    }

    fn remote_note_path(&self, note_id: &NoteId) -> String {
        format!("{}/{note_id}.note", self.remote_root)
    }

    fn passphrase(&self) -> String {
        self.passphrase
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_status(&self, status: SyncStatus) {
        *lock(&self.status) = status;
    }

    fn try_begin(&self, note_id: NoteId) -> bool {
        lock(&self.in_flight).insert(note_id)
    }

    fn finish(&self, note_id: &NoteId) {
        lock(&self.in_flight).remove(note_id);
    }

    fn emit(&self, event: SyncEvent) {
        // fire-and-forget: nobody listening is fine
        let _ = self.events.send(event);
    }

    fn emit_progress(&self, operation: &str, processed: usize, total: usize) {
        let percent = u8::try_from((processed * 100) / total.max(1)).unwrap_or(100);
        self.emit(SyncEvent::Progress(SyncProgress {
            operation: operation.to_string(),
            processed,
            total,
            percent,
        }));
    }
}

/// Failures that would repeat identically for every note in the pass.
const fn is_pass_fatal(error: &Error) -> bool {
    matches!(error, Error::Crypto(_) | Error::Auth(_))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LocalDirProvider;
    use crate::store::JsonNoteStore;

    fn local_service(dir: &tempfile::TempDir) -> (Arc<JsonNoteStore>, SyncService) {
        let store = Arc::new(JsonNoteStore::in_memory());
        let mut registry = ProviderRegistry::new();
        let root = dir.path().join("remote");
        registry.register(
            ProviderKind::LocalFolder,
            Box::new(move |_settings: &ProviderSettings| {
                Ok(Arc::new(LocalDirProvider::new(root.clone())) as Arc<dyn CloudProvider>)
            }),
        );

        let options = SyncOptions {
            passphrase: "test-passphrase".to_string(),
            ..Default::default()
        };
        let service = SyncService::new(store.clone() as Arc<dyn NoteStore>, registry, options)
            .unwrap();
        (store, service)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connect_transitions_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, service) = local_service(&dir);

        assert_eq!(service.status(), SyncStatus::Disconnected);
        service.connect(ProviderKind::LocalFolder).await.unwrap();
        assert_eq!(service.status(), SyncStatus::Idle);
        assert_eq!(service.current_provider().as_deref(), Some("Local Folder"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connect_unregistered_kind_surfaces_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, service) = local_service(&dir);

        let error = service.connect(ProviderKind::S3Compatible).await.unwrap_err();
        assert!(matches!(error, Error::UnregisteredProvider(_)));
        assert_eq!(service.status(), SyncStatus::Error);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_requires_a_connection() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, service) = local_service(&dir);

        assert!(matches!(service.sync().await.unwrap_err(), Error::NotConnected));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_uploads_queued_note_and_clears_entry() {
        let dir = tempfile::tempdir().unwrap();
        let (store, service) = local_service(&dir);
        service.connect(ProviderKind::LocalFolder).await.unwrap();

        let note = Note::new("Groceries", "milk, eggs");
        store.update_note(&note).await.unwrap();
        service.queue_note_for_sync(note.id, ChangeType::CreateOrUpdate);
        assert_eq!(service.pending_changes().len(), 1);

        let result = service.sync().await.unwrap();
        assert!(result.success);
        assert_eq!(result.uploaded, 1);
        assert!(service.pending_changes().is_empty());
        assert_eq!(service.status(), SyncStatus::Idle);

        let synced = store.get_note(&note.id).await.unwrap().unwrap();
        assert_eq!(synced.sync_version, 1);
        assert!(synced.last_synced_at.is_some());

        // the remote object is encrypted, not the raw note JSON
        let remote_path = dir.path().join("remote/notes").join(format!("{}.note", note.id));
        let blob = std::fs::read(remote_path).unwrap();
        let payload = crypto::decrypt(&blob, "test-passphrase").unwrap();
        let remote: Note = serde_json::from_slice(&payload).unwrap();
        assert_eq!(remote.content, "milk, eggs");
        assert_eq!(remote.sync_version, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_change_removes_remote_object() {
        let dir = tempfile::tempdir().unwrap();
        let (store, service) = local_service(&dir);
        service.connect(ProviderKind::LocalFolder).await.unwrap();

        let note = Note::new("Doomed", "bye");
        store.update_note(&note).await.unwrap();
        service.queue_note_for_sync(note.id, ChangeType::CreateOrUpdate);
        service.sync().await.unwrap();

        let remote_path = dir.path().join("remote/notes").join(format!("{}.note", note.id));
        assert!(remote_path.exists());

        service.queue_note_for_sync(note.id, ChangeType::Delete);
        let result = service.sync().await.unwrap();
        assert_eq!(result.deleted, 1);
        assert!(!remote_path.exists());
        assert!(service.pending_changes().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn queue_all_notes_enqueues_every_note_once() {
        let dir = tempfile::tempdir().unwrap();
        let (store, service) = local_service(&dir);

        let first = Note::new("One", "1");
        let second = Note::new("Two", "2");
        store.update_note(&first).await.unwrap();
        store.update_note(&second).await.unwrap();
        // already queued notes coalesce instead of duplicating
        service.queue_note_for_sync(first.id, ChangeType::CreateOrUpdate);

        let count = service.queue_all_notes().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(service.pending_changes().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn disconnect_preserves_pending_queue() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, service) = local_service(&dir);
        service.connect(ProviderKind::LocalFolder).await.unwrap();

        service.queue_note_for_sync(NoteId::new(), ChangeType::CreateOrUpdate);
        service.disconnect().await.unwrap();

        assert_eq!(service.status(), SyncStatus::Disconnected);
        assert_eq!(service.current_provider(), None);
        assert_eq!(service.pending_changes().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stale_change_for_missing_note_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, service) = local_service(&dir);
        service.connect(ProviderKind::LocalFolder).await.unwrap();

        service.queue_note_for_sync(NoteId::new(), ChangeType::CreateOrUpdate);
        let result = service.sync().await.unwrap();
        assert!(result.success);
        assert_eq!(result.uploaded, 0);
        assert!(service.pending_changes().is_empty());
    }
}
