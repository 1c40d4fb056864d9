//! Command implementations for the sync CLI.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use scrawl_core::provider::ProviderRegistry;
use scrawl_core::store::{JsonNoteStore, NoteStore};
use scrawl_core::{NoteId, SyncOptions, SyncService};

use crate::cli::ResolvePolicy;
use crate::config::{default_config_path, passphrase_from_env, CliConfig};
use crate::error::CliError;

fn build_service(config: &CliConfig, passphrase: String) -> Result<SyncService, CliError> {
    let store = Arc::new(JsonNoteStore::open(&config.notes_path)?) as Arc<dyn NoteStore>;
    let options = SyncOptions {
        passphrase,
        provider_settings: config.provider_settings.clone(),
        remote_root: config.remote_root.clone(),
        queue_path: Some(config.queue_path()),
    };
    let service = SyncService::new(
        store,
        ProviderRegistry::with_builtin_providers(),
        options,
    )?;
    Ok(service)
}

fn parse_note_id(id: &str) -> Result<NoteId, CliError> {
    id.trim()
        .parse::<NoteId>()
        .map_err(|_| CliError::InvalidNoteId(id.to_string()))
}

pub async fn run_sync(
    config_path: &Path,
    queue_all: bool,
    resolve: Option<ResolvePolicy>,
    as_json: bool,
) -> Result<(), CliError> {
    let config = CliConfig::load(config_path)?;
    let service = build_service(&config, passphrase_from_env()?)?;

    service.connect(config.provider_kind()?).await?;
    if queue_all {
        let queued = service.queue_all_notes().await?;
        tracing::info!("Queued {queued} notes for a full sync");
    }
    let result = service.sync().await?;

    let conflicts = service.pending_conflicts();
    let mut resolved = 0usize;
    if let Some(policy) = resolve {
        for conflict in &conflicts {
            let note = service
                .resolve_conflict(conflict.note_id, policy.into())
                .await?;
            tracing::info!("Resolved conflict for note {} ({policy:?})", note.id);
            resolved += 1;
        }
    }
    service.disconnect().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "Sync finished: {} uploaded, {} downloaded, {} deleted, {} conflict(s) detected",
        result.uploaded, result.downloaded, result.deleted, result.conflicts_detected
    );
    if resolved > 0 {
        println!("Resolved {resolved} conflict(s) with --resolve");
    } else if !conflicts.is_empty() {
        println!("Conflicts need resolution (re-run with --resolve <strategy>):");
        for conflict in &conflicts {
            println!("  {}  {}", conflict.note_id, conflict.local.title);
        }
    }
    if let Some(error) = &result.error {
        println!("Sync error: {error}");
    }
    Ok(())
}

pub async fn run_sync_note(config_path: &Path, id: &str) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    let config = CliConfig::load(config_path)?;
    let service = build_service(&config, passphrase_from_env()?)?;

    service.connect(config.provider_kind()?).await?;
    let result = service.sync_note(note_id).await?;
    service.disconnect().await?;

    if result.conflicts_detected > 0 {
        println!("Note {note_id} has a conflict; run `scrawl-sync sync --resolve <strategy>`");
    } else if result.success {
        println!("Note {note_id} synced");
    } else {
        println!(
            "Sync failed for note {note_id}: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

pub fn run_queue_list(config_path: &Path, as_json: bool) -> Result<(), CliError> {
    let config = CliConfig::load(config_path)?;
    let service = build_service(&config, passphrase_from_env().unwrap_or_default())?;

    let pending = service.pending_changes();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&pending)?);
        return Ok(());
    }

    if pending.is_empty() {
        println!("No pending changes.");
        return Ok(());
    }
    for change in pending {
        let retry = if change.retry_count > 0 {
            format!(" (retry {})", change.retry_count)
        } else {
            String::new()
        };
        println!("{}  {:?}{retry}", change.note_id, change.change_type);
    }
    Ok(())
}

pub fn run_queue_cancel(config_path: &Path, id: &str) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    let config = CliConfig::load(config_path)?;
    let service = build_service(&config, passphrase_from_env().unwrap_or_default())?;

    if service.cancel_pending_change(&note_id) {
        service.persist_queue()?;
        println!("Cancelled pending change for note {note_id}");
    } else {
        println!("No pending change for note {note_id}");
    }
    Ok(())
}

#[derive(Serialize)]
struct StatusReport {
    provider: String,
    remote_root: String,
    notes_path: String,
    queue_path: String,
    pending_changes: usize,
}

pub fn run_status(config_path: &Path, as_json: bool) -> Result<(), CliError> {
    let config = CliConfig::load(config_path)?;
    let service = build_service(&config, passphrase_from_env().unwrap_or_default())?;

    let report = StatusReport {
        provider: config.provider.clone(),
        remote_root: config.remote_root.clone(),
        notes_path: config.notes_path.display().to_string(),
        queue_path: config.queue_path().display().to_string(),
        pending_changes: service.pending_changes().len(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Provider:        {}", report.provider);
    println!("Remote root:     {}", report.remote_root);
    println!("Notes store:     {}", report.notes_path);
    println!("Queue file:      {}", report.queue_path);
    println!("Pending changes: {}", report.pending_changes);
    Ok(())
}

pub fn run_config_init(config_path: &Path) -> Result<(), CliError> {
    if config_path.exists() {
        return Err(CliError::Config(format!(
            "{} already exists",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let template = CliConfig::template();
    std::fs::write(config_path, serde_json::to_vec_pretty(&template)?)?;

    println!("Wrote {}", config_path.display());
    println!("Edit the provider settings, then set SCRAWL_PASSPHRASE and run `scrawl-sync sync`.");
    Ok(())
}

pub fn run_config_show(config_path: &Path) -> Result<(), CliError> {
    let config = CliConfig::load(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn resolve_config_path(flag: Option<std::path::PathBuf>) -> std::path::PathBuf {
    flag.unwrap_or_else(default_config_path)
}
