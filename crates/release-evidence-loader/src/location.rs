// crates/release-evidence-loader/src/location.rs
// ============================================================================
// Module: Release Location
// Description: Validated bucket, prefix, and release identity for one load.
// Purpose: Derive every object key for a release from checked inputs.
// Dependencies: release-evidence-config, release-evidence-core
// ============================================================================

//! ## Overview
//! A release lives at `{prefix}/{release_id}/` inside a bucket. Its manifest
//! is `release.json` under that root and every path declared by the manifest
//! or inventory resolves relative to the same root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use release_evidence_config::ConfigError;
use release_evidence_config::LoaderConfig;
use release_evidence_config::validate_release_id;
use release_evidence_core::BundleLocation;
use release_evidence_core::MANIFEST_FILE_NAME;

use crate::error::LoadError;
use crate::object_store::normalize_prefix;
use crate::object_store::validate_relative_path;

// ============================================================================
// SECTION: Release Location
// ============================================================================

/// Where one release's evidence lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLocation {
    /// Bucket name.
    bucket: String,
    /// Prefix without surrounding slashes; empty for the bucket root.
    prefix: String,
    /// Release identifier.
    release_id: String,
}

impl ReleaseLocation {
    /// Validates and builds a release location.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Config`] when the bucket is empty, the prefix is
    /// not relative, or the release id is not a single safe segment.
    pub fn new(bucket: &str, prefix: &str, release_id: &str) -> Result<Self, LoadError> {
        let bucket = bucket.trim();
        if bucket.is_empty() {
            return Err(ConfigError::Invalid("object_store.bucket must be set".to_string()).into());
        }
        validate_release_id(release_id)?;
        let prefix = normalize_prefix(prefix)
            .map_err(|err| ConfigError::Invalid(format!("object_store.prefix: {err}")))?;
        Ok(Self {
            bucket: bucket.to_string(),
            prefix: prefix.trim_end_matches('/').to_string(),
            release_id: release_id.to_string(),
        })
    }

    /// Builds the configured release location.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Config`] when the configuration is invalid.
    pub fn from_config(config: &LoaderConfig) -> Result<Self, LoadError> {
        Self::new(
            &config.object_store.bucket,
            &config.object_store.normalized_prefix(),
            &config.release.id,
        )
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the normalized prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the release identifier.
    #[must_use]
    pub fn release_id(&self) -> &str {
        &self.release_id
    }

    /// Returns the key prefix every release object shares.
    #[must_use]
    pub fn release_root(&self) -> String {
        if self.prefix.is_empty() {
            self.release_id.clone()
        } else {
            format!("{}/{}", self.prefix, self.release_id)
        }
    }

    /// Returns the manifest object key.
    #[must_use]
    pub fn manifest_key(&self) -> String {
        format!("{}/{MANIFEST_FILE_NAME}", self.release_root())
    }

    /// Resolves a declared relative path to an object key.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidPath`] when the path is absolute, empty, or
    /// escapes the release root.
    pub fn object_key(&self, relative: &str) -> Result<String, LoadError> {
        let trimmed = relative.strip_prefix("./").unwrap_or(relative);
        validate_relative_path(trimmed).map_err(|err| LoadError::InvalidPath {
            path: relative.to_string(),
            reason: err.to_string(),
        })?;
        Ok(format!("{}/{trimmed}", self.release_root()))
    }

    /// Returns the location metadata recorded on a bundle.
    #[must_use]
    pub fn to_bundle_location(&self) -> BundleLocation {
        BundleLocation {
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            release_id: self.release_id.clone(),
        }
    }
}
