// crates/release-evidence-loader/src/error.rs
// ============================================================================
// Module: Load Errors
// Description: Fatal load errors and per-artifact failure records.
// Purpose: Separate load-aborting failures from recoverable artifact skips.
// Dependencies: release-evidence-config, release-evidence-core, thiserror
// ============================================================================

//! ## Overview
//! [`LoadError`] aborts a whole load; no bundle is produced and the store is
//! left as it was. [`ArtifactFailure`] describes one artifact that was not
//! fetched or did not verify; it is counted and logged but never aborts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use release_evidence_config::ConfigError;
use release_evidence_core::IndexError;
use release_evidence_core::ManifestError;
use serde::Serialize;
use thiserror::Error;

use crate::object_store::ObjectStoreError;

// ============================================================================
// SECTION: Load Errors
// ============================================================================

/// Errors that abort an evidence load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A manifest or inventory object could not be fetched.
    #[error("fetch s3://{bucket}/{key} failed: {source}")]
    Fetch {
        /// Bucket read from.
        bucket: String,
        /// Object key read.
        key: String,
        /// Underlying object-store failure.
        #[source]
        source: ObjectStoreError,
    },
    /// The manifest did not match the manifest schema.
    #[error("parse {key} failed: {source}")]
    Parse {
        /// Object key of the manifest.
        key: String,
        /// Underlying parse failure.
        #[source]
        source: ManifestError,
    },
    /// The manifest describes a different release than requested.
    #[error("release id mismatch: requested {expected}, manifest declares {actual}")]
    IdentityMismatch {
        /// Requested release identifier.
        expected: String,
        /// Release identifier declared by the manifest.
        actual: String,
    },
    /// The manifest has no entry for a required file.
    #[error("manifest has no {name} file entry")]
    MissingFile {
        /// Logical file name.
        name: String,
    },
    /// A required file entry declares no SHA-256.
    #[error("manifest entry {path} declares no sha256")]
    MissingHash {
        /// Declared file path.
        path: String,
    },
    /// A required file did not match its declared SHA-256.
    #[error("hash mismatch for {path}: declared {expected}, computed {actual}")]
    HashMismatch {
        /// Declared file path.
        path: String,
        /// Declared digest.
        expected: String,
        /// Computed digest.
        actual: String,
    },
    /// The inventory could not be indexed.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// The inventory declares more artifacts than allowed.
    #[error("inventory declares {count} artifacts (max {max})")]
    TooManyArtifacts {
        /// Indexed artifact count.
        count: usize,
        /// Configured ceiling.
        max: usize,
    },
    /// A declared path cannot be turned into a safe object key.
    #[error("invalid object path {path}: {reason}")]
    InvalidPath {
        /// Declared path.
        path: String,
        /// Validation failure.
        reason: String,
    },
    /// Loader configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The caller cancelled the load.
    #[error("load cancelled")]
    Cancelled,
    /// The load exceeded its deadline.
    #[error("load timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Configured deadline.
        timeout: Duration,
    },
}

impl LoadError {
    /// Returns a stable label for log events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Parse { .. } => "parse",
            Self::IdentityMismatch { .. } => "identity_mismatch",
            Self::MissingFile { .. } => "missing_file",
            Self::MissingHash { .. } => "missing_hash",
            Self::HashMismatch { .. } => "hash_mismatch",
            Self::Index(_) => "index",
            Self::TooManyArtifacts { .. } => "too_many_artifacts",
            Self::InvalidPath { .. } => "invalid_path",
            Self::Config(_) => "config",
            Self::Cancelled => "cancelled",
            Self::Timeout { .. } => "timeout",
        }
    }
}

// ============================================================================
// SECTION: Artifact Failures
// ============================================================================

/// One artifact that was excluded from the verified set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactFailure {
    /// Declared artifact path.
    pub path: String,
    /// Why the artifact was excluded.
    pub reason: FailureReason,
}

/// Reason an artifact was excluded from the verified set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// The object could not be read.
    #[error("fetch failed: {message}")]
    Fetch {
        /// Object-store error text.
        message: String,
    },
    /// The object exceeded the per-artifact ceiling.
    #[error("object exceeds {max_bytes} bytes")]
    TooLarge {
        /// Configured ceiling.
        max_bytes: u64,
    },
    /// The fetched bytes did not match the declared digest.
    #[error("hash mismatch: declared {expected}, computed {actual}")]
    HashMismatch {
        /// Declared digest.
        expected: String,
        /// Computed digest.
        actual: String,
    },
    /// The declared path is not a safe object key.
    #[error("invalid path: {message}")]
    InvalidPath {
        /// Validation failure.
        message: String,
    },
    /// The fetch task ended abnormally.
    #[error("fetch task failed: {message}")]
    Task {
        /// Join failure text.
        message: String,
    },
}

impl FailureReason {
    /// Classifies an object-store error for a per-artifact fetch.
    pub(crate) fn from_store_error(error: &ObjectStoreError) -> Self {
        match error {
            ObjectStoreError::TooLarge { max_bytes, .. } => Self::TooLarge { max_bytes: *max_bytes },
            ObjectStoreError::Invalid(message) => Self::InvalidPath { message: message.clone() },
            other => Self::Fetch { message: other.to_string() },
        }
    }
}
