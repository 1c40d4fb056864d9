use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] scrawl_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid note id: {0}")]
    InvalidNoteId(String),
    #[error(
        "Sync is not configured. Run `scrawl-sync config init`, edit the generated file, and set SCRAWL_PASSPHRASE."
    )]
    SyncNotConfigured,
}
