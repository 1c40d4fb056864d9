//! Local-directory provider: syncs note objects into a folder on disk.
//!
//! Useful both as the "sync to a local folder" vendor and as the provider
//! integration tests exercise without network access.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use tokio::fs;

use super::{CloudFileInfo, CloudProvider, ProviderSettings};
use crate::util::normalize_text_option;
use crate::{Error, Result};

/// Provider backed by a directory on the local filesystem.
#[derive(Debug)]
pub struct LocalDirProvider {
    root: PathBuf,
    authenticated: AtomicBool,
}

impl LocalDirProvider {
    /// Create a provider rooted at `root`. The directory is created on
    /// [`CloudProvider::authenticate`].
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            authenticated: AtomicBool::new(false),
        }
    }

    /// Build a provider from connection settings.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let root = normalize_text_option(settings.local_path.clone()).ok_or_else(|| {
            Error::InvalidInput("local_folder provider requires local_path".to_string())
        })?;
        Ok(Self::new(root))
    }

    /// Root directory this provider writes into.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.is_absolute()
            || relative.components().any(|component| {
                !matches!(component, Component::Normal(_) | Component::CurDir)
            });
        if escapes {
            return Err(Error::InvalidInput(format!(
                "remote path must stay under the sync root: {path}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn modified_ms(metadata: &std::fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .and_then(|duration| i64::try_from(duration.as_millis()).ok())
        .unwrap_or(0)
}

fn file_info(name: String, path: String, metadata: &std::fs::Metadata) -> CloudFileInfo {
    CloudFileInfo {
        name,
        path,
        size: metadata.len(),
        modified_at: modified_ms(metadata),
        etag: Some(format!("{}-{}", metadata.len(), modified_ms(metadata))),
        is_folder: metadata.is_dir(),
    }
}

fn is_not_found(error: &std::io::Error) -> bool {
    error.kind() == std::io::ErrorKind::NotFound
}

#[async_trait]
impl CloudProvider for LocalDirProvider {
    fn provider_name(&self) -> &str {
        "Local Folder"
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn authenticate(&self) -> Result<bool> {
        fs::create_dir_all(&self.root).await?;
        self.authenticated.store(true, Ordering::SeqCst);
        Ok(true)
    }

    async fn sign_out(&self) -> Result<()> {
        self.authenticated.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn upload_file(&self, path: &str, bytes: &[u8]) -> Result<Option<String>> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, bytes).await?;

        let metadata = fs::metadata(&target).await?;
        Ok(Some(format!("{}-{}", metadata.len(), modified_ms(&metadata))))
    }

    async fn download_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let target = self.resolve(path)?;
        match fs::read(&target).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if is_not_found(&error) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn delete_file(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(error) if is_not_found(&error) => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    async fn list_files(&self, path: &str) -> Result<Vec<CloudFileInfo>> {
        let target = self.resolve(path)?;
        let mut reader = match fs::read_dir(&target).await {
            Ok(reader) => reader,
            Err(error) if is_not_found(&error) => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        let prefix = path.trim_matches('/');
        let mut files = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let metadata = entry.metadata().await?;
            let remote_path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            files.push(file_info(name, remote_path, &metadata));
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn get_file_info(&self, path: &str) -> Result<Option<CloudFileInfo>> {
        let target = self.resolve(path)?;
        let metadata = match fs::metadata(&target).await {
            Ok(metadata) => metadata,
            Err(error) if is_not_found(&error) => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        let name = target
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().to_string());
        Ok(Some(file_info(
            name,
            path.trim_matches('/').to_string(),
            &metadata,
        )))
    }

    async fn create_folder(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        fs::create_dir_all(&target).await?;
        Ok(true)
    }
}
