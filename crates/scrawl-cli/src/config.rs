//! Sync configuration file handling.
//!
//! The config file holds public connection settings only. The encryption
//! passphrase is read from `SCRAWL_PASSPHRASE` and must never be stored
//! here.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use scrawl_core::provider::{ProviderKind, ProviderSettings};

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "sync.json";
const ENV_PASSPHRASE: &str = "SCRAWL_PASSPHRASE";

/// On-disk sync configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Provider kind identifier ("local_folder" or "s3_compatible")
    pub provider: String,
    /// Connection settings handed to the provider factory
    #[serde(default)]
    pub provider_settings: ProviderSettings,
    /// Remote folder holding note objects
    #[serde(default = "default_remote_root")]
    pub remote_root: String,
    /// Path of the local JSON note store
    pub notes_path: PathBuf,
    /// Where the pending queue is persisted; defaults next to the notes file
    #[serde(default)]
    pub queue_path: Option<PathBuf>,
}

fn default_remote_root() -> String {
    "notes".to_string()
}

impl CliConfig {
    /// Load and validate the configuration file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Err(CliError::SyncNotConfigured);
        }

        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|error| CliError::Config(format!("invalid {}: {error}", path.display())))?;
        config.provider_kind()?;
        Ok(config)
    }

    /// Parse the configured provider kind.
    pub fn provider_kind(&self) -> Result<ProviderKind, CliError> {
        self.provider
            .parse::<ProviderKind>()
            .map_err(|error| CliError::Config(error.to_string()))
    }

    /// Queue path: explicit, or `sync-queue.json` next to the note store.
    #[must_use]
    pub fn queue_path(&self) -> PathBuf {
        self.queue_path.clone().unwrap_or_else(|| {
            self.notes_path.parent().map_or_else(
                || PathBuf::from("sync-queue.json"),
                |parent| parent.join("sync-queue.json"),
            )
        })
    }

    /// A template configuration pointing at the platform data directory.
    #[must_use]
    pub fn template() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scrawl");
        Self {
            provider: ProviderKind::LocalFolder.to_string(),
            provider_settings: ProviderSettings {
                local_path: Some(data_dir.join("remote").display().to_string()),
                ..Default::default()
            },
            remote_root: default_remote_root(),
            notes_path: data_dir.join("notes.json"),
            queue_path: None,
        }
    }
}

/// Default config path: `<platform config dir>/scrawl/sync.json`.
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scrawl")
        .join(CONFIG_FILE_NAME)
}

/// Read the encryption passphrase from the environment.
pub fn passphrase_from_env() -> Result<String, CliError> {
    env::var(ENV_PASSPHRASE)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| CliError::Config(format!("{ENV_PASSPHRASE} is not set")))
}
