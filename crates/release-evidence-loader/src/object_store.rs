// crates/release-evidence-loader/src/object_store.rs
// ============================================================================
// Module: Evidence Object Storage
// Description: Object-store clients for listing and reading release evidence.
// Purpose: Read evidence from durable object storage with strict size caps.
// Dependencies: async-trait, aws-sdk-s3, bytes, release-evidence-config, tokio
// ============================================================================

//! ## Overview
//! [`ObjectStoreClient`] is the only way the loader touches storage: list keys
//! under a prefix and read one object with a byte ceiling. Oversized objects
//! fail; they are never truncated. [`S3ObjectStoreClient`] talks to S3 or an
//! S3-compatible endpoint and [`MemoryObjectStore`] keeps objects in process.
//! Security posture: storage is untrusted; keys and payload sizes are
//! validated before use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Component;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::Client;
use aws_sdk_s3::operation::get_object::GetObjectError;
use bytes::Bytes;
use release_evidence_config::ObjectStoreConfig;
use tokio::io::AsyncReadExt;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a single key segment.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total key length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Read buffer size for streamed object bodies.
const READ_CHUNK_BYTES: usize = 8192;
/// Default listing cap for in-memory stores.
const DEFAULT_MAX_LIST_KEYS: usize = 10_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Object-store errors for evidence reads.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// Invalid configuration or key input.
    #[error("object store invalid: {0}")]
    Invalid(String),
    /// The object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
    /// Backend I/O failure.
    #[error("object store io error: {0}")]
    Io(String),
    /// Backend returned an error.
    #[error("object store backend error: {0}")]
    Backend(String),
    /// Object exceeds size limits.
    #[error("object too large: {path} ({actual_bytes} > {max_bytes})")]
    TooLarge {
        /// Object key.
        path: String,
        /// Maximum allowed bytes.
        max_bytes: u64,
        /// Declared or observed size in bytes.
        actual_bytes: u64,
    },
    /// A listing returned more keys than allowed.
    #[error("listing {prefix} exceeds {max_keys} keys")]
    TooManyKeys {
        /// Listed prefix.
        prefix: String,
        /// Configured cap.
        max_keys: usize,
    },
}

// ============================================================================
// SECTION: Object Store Client
// ============================================================================

/// Minimal object-store client abstraction.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Lists every key under `prefix`, following pagination.
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ObjectStoreError>;

    /// Reads a single object, failing when it exceeds `max_bytes`.
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        max_bytes: u64,
    ) -> Result<Bytes, ObjectStoreError>;
}

// ============================================================================
// SECTION: S3 Client
// ============================================================================

/// S3-backed object-store client.
#[derive(Debug, Clone)]
pub struct S3ObjectStoreClient {
    /// Underlying S3 client.
    client: Client,
    /// Listing cap.
    max_list_keys: usize,
}

impl S3ObjectStoreClient {
    /// Builds a new S3-backed object store client.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Invalid`] when the configuration is invalid.
    pub async fn new(
        config: &ObjectStoreConfig,
        max_list_keys: usize,
    ) -> Result<Self, ObjectStoreError> {
        config.validate().map_err(|err| ObjectStoreError::Invalid(err.to_string()))?;
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint) = config.endpoint.as_deref() {
            loader = loader.endpoint_url(endpoint.trim());
        }
        let shared_config = loader.load().await;
        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if config.force_path_style {
            s3_builder = s3_builder.force_path_style(true);
        }
        Ok(Self {
            client: Client::from_conf(s3_builder.build()),
            max_list_keys,
        })
    }
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStoreClient {
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        let prefix = normalize_prefix(prefix)?;
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket).prefix(&prefix);
            if let Some(token) = continuation.take() {
                request = request.continuation_token(token);
            }
            let output =
                request.send().await.map_err(|err| ObjectStoreError::Backend(err.to_string()))?;
            for key in output.contents().iter().filter_map(|object| object.key()) {
                if keys.len() >= self.max_list_keys {
                    return Err(ObjectStoreError::TooManyKeys {
                        prefix,
                        max_keys: self.max_list_keys,
                    });
                }
                keys.push(key.to_string());
            }
            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        Ok(keys)
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        max_bytes: u64,
    ) -> Result<Bytes, ObjectStoreError> {
        validate_relative_path(key)?;
        let output = self.client.get_object().bucket(bucket).key(key).send().await.map_err(|err| {
            if err.as_service_error().is_some_and(GetObjectError::is_no_such_key) {
                ObjectStoreError::NotFound(key.to_string())
            } else {
                ObjectStoreError::Backend(err.to_string())
            }
        })?;
        if let Some(length) = output.content_length().and_then(|length| u64::try_from(length).ok())
            && length > max_bytes
        {
            return Err(ObjectStoreError::TooLarge {
                path: key.to_string(),
                max_bytes,
                actual_bytes: length,
            });
        }
        let mut reader = output.body.into_async_read();
        let mut buffer = Vec::new();
        let mut total_bytes = 0u64;
        let mut chunk = [0u8; READ_CHUNK_BYTES];
        loop {
            let read =
                reader.read(&mut chunk).await.map_err(|err| ObjectStoreError::Io(err.to_string()))?;
            if read == 0 {
                break;
            }
            total_bytes = u64::try_from(read)
                .ok()
                .and_then(|read| total_bytes.checked_add(read))
                .ok_or_else(|| ObjectStoreError::Io("object size overflow".to_string()))?;
            if total_bytes > max_bytes {
                return Err(ObjectStoreError::TooLarge {
                    path: key.to_string(),
                    max_bytes,
                    actual_bytes: total_bytes,
                });
            }
            buffer.extend_from_slice(&chunk[.. read]);
        }
        Ok(Bytes::from(buffer))
    }
}

// ============================================================================
// SECTION: In-Memory Client
// ============================================================================

/// In-process object store keyed by bucket and object key.
#[derive(Debug)]
pub struct MemoryObjectStore {
    /// Objects per bucket.
    buckets: Mutex<BTreeMap<String, BTreeMap<String, Bytes>>>,
    /// Listing cap.
    max_list_keys: usize,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    /// Creates an empty store with the default listing cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_list_keys(DEFAULT_MAX_LIST_KEYS)
    }

    /// Creates an empty store with an explicit listing cap.
    #[must_use]
    pub fn with_max_list_keys(max_list_keys: usize) -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            max_list_keys,
        }
    }

    /// Stores an object, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the key is invalid or the lock is poisoned.
    pub fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: impl Into<Bytes>,
    ) -> Result<(), ObjectStoreError> {
        validate_relative_path(key)?;
        self.buckets
            .lock()
            .map_err(|_| ObjectStoreError::Io("object store lock poisoned".to_string()))?
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), bytes.into());
        Ok(())
    }

    /// Removes an object, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Io`] when the lock is poisoned.
    pub fn remove(&self, bucket: &str, key: &str) -> Result<bool, ObjectStoreError> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| ObjectStoreError::Io("object store lock poisoned".to_string()))?;
        Ok(buckets.get_mut(bucket).is_some_and(|objects| objects.remove(key).is_some()))
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryObjectStore {
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        let prefix = normalize_prefix(prefix)?;
        let buckets = self
            .buckets
            .lock()
            .map_err(|_| ObjectStoreError::Io("object store lock poisoned".to_string()))?;
        let keys: Vec<String> = buckets
            .get(bucket)
            .map(|objects| {
                objects.keys().filter(|key| key.starts_with(&prefix)).cloned().collect()
            })
            .unwrap_or_default();
        if keys.len() > self.max_list_keys {
            return Err(ObjectStoreError::TooManyKeys {
                prefix,
                max_keys: self.max_list_keys,
            });
        }
        Ok(keys)
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        max_bytes: u64,
    ) -> Result<Bytes, ObjectStoreError> {
        validate_relative_path(key)?;
        let bytes = self
            .buckets
            .lock()
            .map_err(|_| ObjectStoreError::Io("object store lock poisoned".to_string()))?
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))?;
        let actual_bytes = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if actual_bytes > max_bytes {
            return Err(ObjectStoreError::TooLarge {
                path: key.to_string(),
                max_bytes,
                actual_bytes,
            });
        }
        Ok(bytes)
    }
}

// ============================================================================
// SECTION: Key Helpers
// ============================================================================

/// Normalizes a listing prefix to empty or `segment/.../`.
///
/// # Errors
///
/// Returns [`ObjectStoreError::Invalid`] when the prefix is absolute or unsafe.
pub fn normalize_prefix(raw: &str) -> Result<String, ObjectStoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if trimmed.starts_with('/') {
        return Err(ObjectStoreError::Invalid(
            "prefix must be relative (no leading slash)".to_string(),
        ));
    }
    let normalized = trimmed.strip_suffix('/').unwrap_or(trimmed);
    validate_relative_path(normalized)?;
    Ok(format!("{normalized}/"))
}

/// Validates a relative object key.
///
/// # Errors
///
/// Returns [`ObjectStoreError::Invalid`] when the key is empty, absolute,
/// traverses upward, or breaks length limits.
pub fn validate_relative_path(path: &str) -> Result<(), ObjectStoreError> {
    if path.is_empty() {
        return Err(ObjectStoreError::Invalid("path must be set".to_string()));
    }
    if path.contains('\\') {
        return Err(ObjectStoreError::Invalid("path must not contain backslashes".to_string()));
    }
    if path.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ObjectStoreError::Invalid("path exceeds length limit".to_string()));
    }
    if path.starts_with('/') || Path::new(path).is_absolute() {
        return Err(ObjectStoreError::Invalid("path must be relative".to_string()));
    }
    for segment in path.split('/') {
        validate_segment(segment)?;
    }
    for component in Path::new(path).components() {
        if !matches!(component, Component::Normal(_)) {
            return Err(ObjectStoreError::Invalid(
                "path must be relative without traversal".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates a single path segment.
fn validate_segment(value: &str) -> Result<(), ObjectStoreError> {
    if value.is_empty() || value == "." || value == ".." {
        return Err(ObjectStoreError::Invalid("segment is invalid".to_string()));
    }
    if value.len() > MAX_PATH_COMPONENT_LENGTH {
        return Err(ObjectStoreError::Invalid("segment exceeds length limit".to_string()));
    }
    if value.chars().any(char::is_control) {
        return Err(ObjectStoreError::Invalid("segment contains invalid characters".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
