// crates/release-evidence-config/src/config.rs
// ============================================================================
// Module: Release Evidence Configuration
// Description: Configuration loading and validation for evidence loads.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: a loader is never built
//! from a config that names no bucket or release.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "release-evidence.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "RELEASE_EVIDENCE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound for the fetch worker pool.
pub(crate) const MAX_FETCH_WORKERS: usize = 256;

// ============================================================================
// SECTION: Loader Config
// ============================================================================

/// Top-level evidence loader configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Object store holding release evidence.
    pub object_store: ObjectStoreConfig,
    /// Release to load.
    pub release: ReleaseConfig,
    /// Size, count, and concurrency limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Load event destination.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LoaderConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is the explicit argument, else [`CONFIG_ENV_VAR`], else
    /// `release-evidence.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.object_store.validate()?;
        self.release.validate()?;
        self.limits.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Returns the effective load limits.
    #[must_use]
    pub const fn limits(&self) -> LoadLimits {
        self.limits.to_load_limits()
    }
}

// ============================================================================
// SECTION: Object Store
// ============================================================================

/// Object-store provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStoreProvider {
    /// Amazon S3 compatible object storage.
    S3,
}

/// Object-store configuration for release evidence.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    /// Provider selection for the object store.
    pub provider: ObjectStoreProvider,
    /// Bucket holding release evidence.
    pub bucket: String,
    /// Optional region (S3-only, defaults to environment).
    #[serde(default)]
    pub region: Option<String>,
    /// Optional object-store endpoint (S3-compatible).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Optional key prefix under which releases live.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Force path-style addressing (S3-compatible).
    #[serde(default)]
    pub force_path_style: bool,
    /// Allow non-TLS endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
}

impl ObjectStoreConfig {
    /// Validates object-store configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when object-store settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Invalid("object_store.bucket must be set".to_string()));
        }
        if let Some(endpoint) = &self.endpoint {
            let trimmed = endpoint.trim();
            if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
                return Err(ConfigError::Invalid(
                    "object_store.endpoint must include http:// or https://".to_string(),
                ));
            }
            if trimmed.starts_with("http://") && !self.allow_http {
                return Err(ConfigError::Invalid(
                    "object_store.endpoint uses http:// without allow_http".to_string(),
                ));
            }
        }
        if let Some(prefix) = &self.prefix {
            validate_object_store_prefix(prefix)?;
        }
        Ok(())
    }

    /// Returns the configured prefix without surrounding slashes.
    #[must_use]
    pub fn normalized_prefix(&self) -> String {
        self.prefix.as_deref().map(str::trim).unwrap_or_default().trim_matches('/').to_string()
    }
}

// ============================================================================
// SECTION: Release
// ============================================================================

/// Release identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseConfig {
    /// Release identifier; a single key segment.
    pub id: String,
}

impl ReleaseConfig {
    /// Validates the release identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the identifier is empty or not a safe segment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_release_id(&self.id)
    }
}

/// Validates that a release identifier is one safe object-key segment.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the identifier is empty, too long,
/// a dot segment, or contains separators or control characters.
pub fn validate_release_id(value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid("release.id must be set".to_string()));
    }
    if value.trim() != value {
        return Err(ConfigError::Invalid("release.id must not have surrounding whitespace".to_string()));
    }
    if value.len() > MAX_PATH_COMPONENT_LENGTH {
        return Err(ConfigError::Invalid("release.id exceeds max length".to_string()));
    }
    if value == "." || value == ".." {
        return Err(ConfigError::Invalid("release.id must not be a dot segment".to_string()));
    }
    if value.contains(['/', '\\']) || value.chars().any(char::is_control) {
        return Err(ConfigError::Invalid("release.id must be a single key segment".to_string()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Size, count, and concurrency limits as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Ceiling for manifest and inventory documents, in bytes.
    #[serde(default = "default_max_manifest_bytes")]
    pub max_manifest_bytes: u64,
    /// Ceiling for a single evidence artifact, in bytes.
    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: u64,
    /// Maximum number of indexed artifacts per release.
    #[serde(default = "default_max_artifacts")]
    pub max_artifacts: usize,
    /// Number of concurrent artifact fetches.
    #[serde(default = "default_fetch_workers")]
    pub fetch_workers: usize,
    /// Maximum number of keys returned by one listing.
    #[serde(default = "default_max_list_keys")]
    pub max_list_keys: usize,
    /// Whole-load deadline in milliseconds.
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_manifest_bytes: default_max_manifest_bytes(),
            max_artifact_bytes: default_max_artifact_bytes(),
            max_artifacts: default_max_artifacts(),
            fetch_workers: default_fetch_workers(),
            max_list_keys: default_max_list_keys(),
            load_timeout_ms: default_load_timeout_ms(),
        }
    }
}

impl LimitsConfig {
    /// Validates limit values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a limit is zero or out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_manifest_bytes == 0 {
            return Err(ConfigError::Invalid("limits.max_manifest_bytes must be > 0".to_string()));
        }
        if self.max_artifact_bytes == 0 {
            return Err(ConfigError::Invalid("limits.max_artifact_bytes must be > 0".to_string()));
        }
        if self.max_artifacts == 0 {
            return Err(ConfigError::Invalid("limits.max_artifacts must be > 0".to_string()));
        }
        if self.fetch_workers == 0 || self.fetch_workers > MAX_FETCH_WORKERS {
            return Err(ConfigError::Invalid(format!(
                "limits.fetch_workers must be between 1 and {MAX_FETCH_WORKERS}"
            )));
        }
        if self.max_list_keys == 0 {
            return Err(ConfigError::Invalid("limits.max_list_keys must be > 0".to_string()));
        }
        if self.load_timeout_ms == 0 {
            return Err(ConfigError::Invalid("limits.load_timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }

    /// Converts the file representation into runtime limits.
    #[must_use]
    pub const fn to_load_limits(&self) -> LoadLimits {
        LoadLimits {
            max_manifest_bytes: self.max_manifest_bytes,
            max_artifact_bytes: self.max_artifact_bytes,
            max_artifacts: self.max_artifacts,
            fetch_workers: self.fetch_workers,
            max_list_keys: self.max_list_keys,
            load_timeout: Duration::from_millis(self.load_timeout_ms),
        }
    }
}

/// Runtime limits applied by one evidence load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadLimits {
    /// Ceiling for manifest and inventory documents, in bytes.
    pub max_manifest_bytes: u64,
    /// Ceiling for a single evidence artifact, in bytes.
    pub max_artifact_bytes: u64,
    /// Maximum number of indexed artifacts.
    pub max_artifacts: usize,
    /// Number of concurrent artifact fetches.
    pub fetch_workers: usize,
    /// Maximum number of keys returned by one listing.
    pub max_list_keys: usize,
    /// Whole-load deadline.
    pub load_timeout: Duration,
}

impl Default for LoadLimits {
    fn default() -> Self {
        LimitsConfig::default().to_load_limits()
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Destination for structured load events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    None,
}

/// Load event logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file sink has no usable path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("logging.path required for file sink".to_string()))
            }
            (LogSinkKind::File, Some(path)) => {
                validate_path_string("logging.path", &path.to_string_lossy())
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the object-store prefix string.
fn validate_object_store_prefix(value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid("object_store.prefix must be non-empty".to_string()));
    }
    if trimmed.contains('\\') {
        return Err(ConfigError::Invalid(
            "object_store.prefix must not contain backslashes".to_string(),
        ));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("object_store.prefix exceeds max length".to_string()));
    }
    if trimmed.starts_with('/') {
        return Err(ConfigError::Invalid("object_store.prefix must be relative".to_string()));
    }
    let normalized = trimmed.strip_suffix('/').unwrap_or(trimmed);
    for component in Path::new(normalized).components() {
        match component {
            Component::Normal(value) => {
                if value.len() > MAX_PATH_COMPONENT_LENGTH {
                    return Err(ConfigError::Invalid(
                        "object_store.prefix segment too long".to_string(),
                    ));
                }
            }
            _ => {
                return Err(ConfigError::Invalid(
                    "object_store.prefix must be relative without traversal".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Default manifest and inventory ceiling (8 MiB).
const fn default_max_manifest_bytes() -> u64 {
    8 * 1024 * 1024
}

/// Default per-artifact ceiling (64 MiB).
const fn default_max_artifact_bytes() -> u64 {
    64 * 1024 * 1024
}

/// Default artifact count ceiling.
const fn default_max_artifacts() -> usize {
    10_000
}

/// Default fetch worker pool size.
const fn default_fetch_workers() -> usize {
    16
}

/// Default listing cap.
const fn default_max_list_keys() -> usize {
    10_000
}

/// Default whole-load deadline (two minutes).
const fn default_load_timeout_ms() -> u64 {
    120_000
}
