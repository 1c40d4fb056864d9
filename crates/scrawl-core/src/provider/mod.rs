//! Cloud storage provider boundary.
//!
//! Every vendor integration satisfies the [`CloudProvider`] capability set;
//! the orchestrator never sees anything more specific. New vendors are added
//! by registering a factory with the [`ProviderRegistry`], without touching
//! existing code paths.

mod local_dir;
mod registry;
mod s3;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub use local_dir::LocalDirProvider;
pub use registry::{ProviderFactory, ProviderRegistry};
pub use s3::{S3Config, S3Provider};

/// Metadata for a remote file.
///
/// Lets the engine detect remote-side modification without downloading
/// content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudFileInfo {
    /// File name without leading directories
    pub name: String,
    /// Full remote path
    pub path: String,
    /// Object size in bytes
    pub size: u64,
    /// Remote modification time (Unix ms)
    pub modified_at: i64,
    /// Opaque revision token, when the vendor supplies one
    pub etag: Option<String>,
    /// Whether the entry is a folder
    pub is_folder: bool,
}

/// Identifies a cloud storage vendor integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Any S3-compatible object store (R2, MinIO, AWS S3)
    S3Compatible,
    /// A directory on the local filesystem
    LocalFolder,
}

impl ProviderKind {
    /// Stable identifier used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S3Compatible => "s3_compatible",
            Self::LocalFolder => "local_folder",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "s3_compatible" | "s3" => Ok(Self::S3Compatible),
            "local_folder" | "local" => Ok(Self::LocalFolder),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown provider kind: {other}"
            ))),
        }
    }
}

/// Connection settings handed to a provider factory.
///
/// Secret credentials may also come from the environment; see
/// [`S3Config::from_env`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Local directory root (local_folder provider)
    #[serde(default)]
    pub local_path: Option<String>,
    /// Explicit S3-compatible endpoint URL (MinIO, self-hosted)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Cloudflare-style account id used to derive the endpoint
    #[serde(default)]
    pub account_id: Option<String>,
    /// Bucket name
    #[serde(default)]
    pub bucket: Option<String>,
    /// Access key id for S3-compatible auth
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key for S3-compatible auth
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ProviderSettings")
            .field("local_path", &self.local_path)
            .field("endpoint", &self.endpoint)
            .field("account_id", &self.account_id)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Capability set every cloud storage vendor integration satisfies.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Human-readable vendor name
    fn provider_name(&self) -> &str;

    /// Whether a prior [`CloudProvider::authenticate`] succeeded
    fn is_authenticated(&self) -> bool;

    /// Authenticate against the vendor; `Ok(true)` on success
    async fn authenticate(&self) -> Result<bool>;

    /// Drop the authenticated session
    async fn sign_out(&self) -> Result<()>;

    /// Upload bytes, returning the vendor's revision token when available
    async fn upload_file(&self, path: &str, bytes: &[u8]) -> Result<Option<String>>;

    /// Download bytes; `None` when the file does not exist
    async fn download_file(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a file; `false` when it did not exist
    async fn delete_file(&self, path: &str) -> Result<bool>;

    /// List files directly under a remote folder
    async fn list_files(&self, path: &str) -> Result<Vec<CloudFileInfo>>;

    /// Metadata for a single file; `None` when it does not exist
    async fn get_file_info(&self, path: &str) -> Result<Option<CloudFileInfo>>;

    /// Create a remote folder; idempotent
    async fn create_folder(&self, path: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_aliases() {
        assert_eq!("s3".parse::<ProviderKind>().unwrap(), ProviderKind::S3Compatible);
        assert_eq!(
            "s3_compatible".parse::<ProviderKind>().unwrap(),
            ProviderKind::S3Compatible
        );
        assert_eq!(
            "local_folder".parse::<ProviderKind>().unwrap(),
            ProviderKind::LocalFolder
        );
        assert!("dropbox".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn provider_kind_display_roundtrip() {
        for kind in [ProviderKind::S3Compatible, ProviderKind::LocalFolder] {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
    }
}
