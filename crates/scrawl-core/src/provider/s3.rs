//! S3-compatible object storage provider (Cloudflare R2, MinIO, AWS S3).

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::{primitives::ByteStream, Client};
use aws_types::region::Region;

use super::{CloudFileInfo, CloudProvider, ProviderSettings};
use crate::{Error, Result};

const ENV_ENDPOINT: &str = "SCRAWL_S3_ENDPOINT";
const ENV_ACCOUNT_ID: &str = "SCRAWL_S3_ACCOUNT_ID";
const ENV_BUCKET: &str = "SCRAWL_S3_BUCKET";
const ENV_ACCESS_KEY_ID: &str = "SCRAWL_S3_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "SCRAWL_S3_SECRET_ACCESS_KEY";

/// Connection configuration for an S3-compatible endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct S3Config {
    /// Explicit endpoint URL; overrides `account_id` derivation.
    pub endpoint: Option<String>,
    /// Cloudflare-style account id used to derive an R2 endpoint.
    pub account_id: Option<String>,
    /// Bucket name.
    pub bucket: String,
    /// Access key id for S3-compatible auth.
    pub access_key_id: String,
    /// Secret access key for S3-compatible auth.
    pub secret_access_key: String,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("account_id", &self.account_id)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

impl S3Config {
    /// Load configuration from `SCRAWL_S3_*` environment variables.
    ///
    /// Returns `Ok(None)` when no variables are set, and an error when only
    /// a partial configuration is provided.
    pub fn from_env() -> Result<Option<Self>> {
        parse_config(|key| env::var(key).ok())
    }

    /// Endpoint URL: the explicit endpoint when set, otherwise the
    /// R2-style URL derived from the account id.
    pub fn endpoint_url(&self) -> Result<String> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.trim_end_matches('/').to_string());
        }
        let account_id = self.account_id.as_ref().ok_or_else(|| {
            Error::InvalidInput(
                "S3 configuration needs either an endpoint or an account_id".to_string(),
            )
        })?;
        Ok(format!("https://{account_id}.r2.cloudflarestorage.com"))
    }
}

/// Provider backed by an S3-compatible bucket.
#[derive(Debug)]
pub struct S3Provider {
    config: S3Config,
    authenticated: AtomicBool,
}

impl S3Provider {
    /// Create a provider for a validated configuration.
    #[must_use]
    pub fn new(config: S3Config) -> Self {
        Self {
            config,
            authenticated: AtomicBool::new(false),
        }
    }

    /// Build a provider from connection settings, falling back to the
    /// `SCRAWL_S3_*` environment when the settings carry no S3 fields.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let from_settings = parse_config(|key| match key {
            ENV_ENDPOINT => settings.endpoint.clone(),
            ENV_ACCOUNT_ID => settings.account_id.clone(),
            ENV_BUCKET => settings.bucket.clone(),
            ENV_ACCESS_KEY_ID => settings.access_key_id.clone(),
            ENV_SECRET_ACCESS_KEY => settings.secret_access_key.clone(),
            _ => None,
        })?;

        let config = match from_settings {
            Some(config) => config,
            None => S3Config::from_env()?.ok_or_else(|| {
                Error::InvalidInput(format!(
                    "s3_compatible provider requires bucket and credentials \
                     (provider settings or {ENV_BUCKET}/{ENV_ACCESS_KEY_ID}/... env)"
                ))
            })?,
        };

        Ok(Self::new(config))
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &S3Config {
        &self.config
    }

    fn client(&self) -> Result<Client> {
        let credentials = Credentials::new(
            self.config.access_key_id.clone(),
            self.config.secret_access_key.clone(),
            None,
            None,
            "scrawl-s3-provider",
        );

        let sdk_config = aws_sdk_s3::config::Builder::new()
            .region(Region::new("auto"))
            .credentials_provider(credentials)
            .endpoint_url(self.config.endpoint_url()?)
            .force_path_style(true)
            .build();

        Ok(Client::from_conf(sdk_config))
    }
}

#[async_trait]
impl CloudProvider for S3Provider {
    fn provider_name(&self) -> &str {
        "S3 Compatible"
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn authenticate(&self) -> Result<bool> {
        let client = self.client()?;
        client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|error| {
                Error::Auth(format!(
                    "bucket '{}' is not reachable with the configured credentials: {error}",
                    self.config.bucket
                ))
            })?;
        self.authenticated.store(true, Ordering::SeqCst);
        Ok(true)
    }

    async fn sign_out(&self) -> Result<()> {
        self.authenticated.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn upload_file(&self, path: &str, bytes: &[u8]) -> Result<Option<String>> {
        let key = normalize_object_key(path)?;
        let client = self.client()?;

        let response = client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|error| request_error("put_object", &key, &error))?;

        Ok(response.e_tag().map(normalize_etag))
    }

    async fn download_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let key = normalize_object_key(path)?;
        let client = self.client()?;

        let response = match client
            .get_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(SdkError::ServiceError(context)) if context.err().is_no_such_key() => {
                return Ok(None);
            }
            Err(error) => return Err(request_error("get_object", &key, &error)),
        };

        let payload = response
            .body
            .collect()
            .await
            .map_err(|error| {
                Error::Provider(format!("S3 get_object_body failed for {key}: {error}"))
            })?;
        Ok(Some(payload.into_bytes().to_vec()))
    }

    async fn delete_file(&self, path: &str) -> Result<bool> {
        let key = normalize_object_key(path)?;
        if self.get_file_info(&key).await?.is_none() {
            return Ok(false);
        }

        let client = self.client()?;
        client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|error| request_error("delete_object", &key, &error))?;
        Ok(true)
    }

    async fn list_files(&self, path: &str) -> Result<Vec<CloudFileInfo>> {
        let prefix = normalize_object_key(path)?;
        let client = self.client()?;

        let response = client
            .list_objects_v2()
            .bucket(&self.config.bucket)
            .prefix(format!("{prefix}/"))
            .send()
            .await
            .map_err(|error| request_error("list_objects_v2", &prefix, &error))?;

        let mut files = Vec::new();
        for object in response.contents() {
            let Some(key) = object.key() else { continue };
            let name = key.rsplit('/').next().unwrap_or(key).to_string();
            files.push(CloudFileInfo {
                name,
                path: key.to_string(),
                size: object.size().and_then(|size| u64::try_from(size).ok()).unwrap_or(0),
                modified_at: object
                    .last_modified()
                    .and_then(|time| time.to_millis().ok())
                    .unwrap_or(0),
                etag: object.e_tag().map(normalize_etag),
                is_folder: key.ends_with('/'),
            });
        }
        Ok(files)
    }

    async fn get_file_info(&self, path: &str) -> Result<Option<CloudFileInfo>> {
        let key = normalize_object_key(path)?;
        let client = self.client()?;

        let response = match client
            .head_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(SdkError::ServiceError(context)) if context.err().is_not_found() => {
                return Ok(None);
            }
            Err(error) => return Err(request_error("head_object", &key, &error)),
        };

        let name = key.rsplit('/').next().unwrap_or(&key).to_string();
        Ok(Some(CloudFileInfo {
            name,
            path: key.clone(),
            size: response
                .content_length()
                .and_then(|length| u64::try_from(length).ok())
                .unwrap_or(0),
            modified_at: response
                .last_modified()
                .and_then(|time| time.to_millis().ok())
                .unwrap_or(0),
            etag: response.e_tag().map(normalize_etag),
            is_folder: false,
        }))
    }

    async fn create_folder(&self, _path: &str) -> Result<bool> {
        // Object stores are prefix-based; nothing to create.
        Ok(true)
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<S3Config>> {
    let normalize = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let endpoint = normalize(ENV_ENDPOINT);
    let account_id = normalize(ENV_ACCOUNT_ID);
    let bucket = normalize(ENV_BUCKET);
    let access_key_id = normalize(ENV_ACCESS_KEY_ID);
    let secret_access_key = normalize(ENV_SECRET_ACCESS_KEY);

    let any_present = endpoint.is_some()
        || account_id.is_some()
        || bucket.is_some()
        || access_key_id.is_some()
        || secret_access_key.is_some();
    if !any_present {
        return Ok(None);
    }

    let mut missing = Vec::new();
    if bucket.is_none() {
        missing.push(ENV_BUCKET);
    }
    if access_key_id.is_none() {
        missing.push(ENV_ACCESS_KEY_ID);
    }
    if secret_access_key.is_none() {
        missing.push(ENV_SECRET_ACCESS_KEY);
    }
    if endpoint.is_none() && account_id.is_none() {
        missing.push(ENV_ENDPOINT);
    }

    if !missing.is_empty() {
        return Err(Error::InvalidInput(format!(
            "S3 configuration is incomplete. Missing: {}",
            missing.join(", ")
        )));
    }

    Ok(Some(S3Config {
        endpoint,
        account_id,
        bucket: bucket.unwrap_or_default(),
        access_key_id: access_key_id.unwrap_or_default(),
        secret_access_key: secret_access_key.unwrap_or_default(),
    }))
}

fn request_error<E, R>(operation: &str, key: &str, error: &SdkError<E, R>) -> Error
where
    SdkError<E, R>: std::fmt::Display,
{
    let transient = matches!(
        error,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_)
    );
    let message = format!("S3 {operation} failed for {key}: {error}");
    if transient {
        Error::Network(message)
    } else {
        Error::Provider(message)
    }
}

fn normalize_object_key(path: &str) -> Result<String> {
    let key = path.trim().trim_matches('/').to_string();
    if key.is_empty() {
        return Err(Error::InvalidInput(
            "remote object key cannot be empty".to_string(),
        ));
    }
    Ok(key)
}

fn normalize_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse_from_map(map: &HashMap<&str, &str>) -> Result<Option<S3Config>> {
        parse_config(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn parse_config_none_returns_none() {
        let map = HashMap::new();
        assert!(parse_from_map(&map).unwrap().is_none());
    }

    #[test]
    fn parse_config_rejects_partial_values() {
        let mut map = HashMap::new();
        map.insert(ENV_BUCKET, "notes-bucket");

        let error = parse_from_map(&map).unwrap_err();
        match error {
            Error::InvalidInput(message) => {
                assert!(message.contains(ENV_ACCESS_KEY_ID));
                assert!(message.contains(ENV_SECRET_ACCESS_KEY));
                assert!(message.contains(ENV_ENDPOINT));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_config_accepts_account_id_in_place_of_endpoint() {
        let mut map = HashMap::new();
        map.insert(ENV_ACCOUNT_ID, "account-1");
        map.insert(ENV_BUCKET, "notes-bucket");
        map.insert(ENV_ACCESS_KEY_ID, "AKID123");
        map.insert(ENV_SECRET_ACCESS_KEY, "SECRET123");

        let config = parse_from_map(&map).unwrap().unwrap();
        assert_eq!(
            config.endpoint_url().unwrap(),
            "https://account-1.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn explicit_endpoint_wins_and_is_normalized() {
        let mut map = HashMap::new();
        map.insert(ENV_ENDPOINT, "http://localhost:9000/");
        map.insert(ENV_ACCOUNT_ID, "ignored");
        map.insert(ENV_BUCKET, "notes-bucket");
        map.insert(ENV_ACCESS_KEY_ID, "AKID123");
        map.insert(ENV_SECRET_ACCESS_KEY, "SECRET123");

        let config = parse_from_map(&map).unwrap().unwrap();
        assert_eq!(config.endpoint_url().unwrap(), "http://localhost:9000");
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let config = S3Config {
            endpoint: None,
            account_id: Some("account-1".to_string()),
            bucket: "notes-bucket".to_string(),
            access_key_id: "AKID123".to_string(),
            secret_access_key: "SECRET123".to_string(),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("SECRET123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn normalize_object_key_rejects_empty() {
        assert!(normalize_object_key("   ").is_err());
        assert_eq!(normalize_object_key("/notes/a.note/").unwrap(), "notes/a.note");
    }

    #[test]
    fn normalize_etag_strips_quotes() {
        assert_eq!(normalize_etag("\"abc123\""), "abc123");
        assert_eq!(normalize_etag("abc123"), "abc123");
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires SCRAWL_S3_* env vars plus network access"]
    async fn s3_object_roundtrip_upload_info_delete() {
        let config = S3Config::from_env()
            .expect("S3 env parsing should not error")
            .expect("S3 config should be present");
        let provider = S3Provider::new(config);

        provider.authenticate().await.unwrap();

        let key = "scrawl-test/roundtrip.note";
        provider.upload_file(key, b"s3-roundtrip-test").await.unwrap();

        let info = provider.get_file_info(key).await.unwrap().unwrap();
        assert_eq!(info.size, 17);

        let bytes = provider.download_file(key).await.unwrap().unwrap();
        assert_eq!(bytes, b"s3-roundtrip-test");

        assert!(provider.delete_file(key).await.unwrap());
        assert_eq!(provider.get_file_info(key).await.unwrap(), None);
    }
}
