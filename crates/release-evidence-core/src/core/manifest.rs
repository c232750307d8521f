// crates/release-evidence-core/src/core/manifest.rs
// ============================================================================
// Module: Release Manifest
// Description: Typed model of `release.json` and its validation rules.
// Purpose: Describe one release: identity, provenance, files, and binaries.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The release manifest is the declarative entry point of an evidence bundle.
//! It names the release, records where the build came from, maps logical file
//! names (for example `inventory`) to hashed file references, and lists the
//! per-platform binaries that were produced.
//!
//! Unknown fields are ignored so that newer manifests stay readable. The raw
//! manifest bytes are kept separately by the bundle for byte-identical
//! passthrough serving.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Object name of the release manifest inside a release root.
pub const MANIFEST_FILE_NAME: &str = "release.json";
/// Logical file name of the evidence inventory in the manifest `files` map.
pub const INVENTORY_FILE_KEY: &str = "inventory";

// ============================================================================
// SECTION: Manifest Types
// ============================================================================

/// Declared hashes for a referenced file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHashes {
    /// Lowercase hex SHA-256 digest; empty when not declared.
    #[serde(default, deserialize_with = "null_as_default")]
    pub sha256: String,
}

/// Hashed reference to a file inside a release root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Path relative to the release root.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    /// Declared content hashes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hashes: FileHashes,
    /// Declared size in bytes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
}

impl FileRef {
    /// Returns the declared SHA-256 digest when present.
    #[must_use]
    pub fn declared_sha256(&self) -> Option<&str> {
        let value = self.hashes.sha256.trim();
        if value.is_empty() { None } else { Some(value) }
    }
}

/// Source or builder provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Repository identifier (for example `github.com/org/repo`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub repo: String,
    /// Commit identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub commit: String,
}

/// Binary reference for one platform artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryRef {
    /// Lowercase hex SHA-256 digest of the binary.
    #[serde(default, deserialize_with = "null_as_default")]
    pub sha256: String,
    /// Binary size in bytes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
}

/// One platform build listed by the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseArtifact {
    /// Target operating system.
    #[serde(default, deserialize_with = "null_as_default")]
    pub os: String,
    /// Target architecture.
    #[serde(default, deserialize_with = "null_as_default")]
    pub arch: String,
    /// Produced binary.
    #[serde(default, deserialize_with = "null_as_default")]
    pub binary: BinaryRef,
}

impl ReleaseArtifact {
    /// Returns the `os/arch` platform label.
    #[must_use]
    pub fn platform(&self) -> String {
        platform_label(&self.os, &self.arch)
    }
}

/// Declarative description of one release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseManifest {
    /// Release identifier; must match the requested release.
    pub release_id: String,
    /// Release version string.
    pub version: String,
    /// Release track (for example `stable`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub track: String,
    /// Source provenance.
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Provenance,
    /// Builder provenance.
    #[serde(default, deserialize_with = "null_as_default")]
    pub builder: Provenance,
    /// Logical file name to file reference.
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: BTreeMap<String, FileRef>,
    /// Raw policy block, carried without interpretation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Value>,
    /// Per-platform release artifacts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub artifacts: Vec<ReleaseArtifact>,
}

impl ReleaseManifest {
    /// Parses and validates manifest bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the bytes are not a valid manifest.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ManifestError> {
        let manifest: Self =
            serde_json::from_slice(bytes).map_err(|err| ManifestError::Parse(err.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validates required manifest fields.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Invalid`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.release_id.trim().is_empty() {
            return Err(ManifestError::Invalid("release_id must be set".to_string()));
        }
        if self.version.trim().is_empty() {
            return Err(ManifestError::Invalid("version must be set".to_string()));
        }
        Ok(())
    }

    /// Returns the declared inventory file reference.
    #[must_use]
    pub fn inventory(&self) -> Option<&FileRef> {
        self.files.get(INVENTORY_FILE_KEY)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Manifest parsing and validation errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Bytes are not valid manifest JSON.
    #[error("manifest parse error: {0}")]
    Parse(String),
    /// Manifest JSON is missing required content.
    #[error("manifest invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds an `os/arch` platform label.
#[must_use]
pub fn platform_label(os: &str, arch: &str) -> String {
    format!("{os}/{arch}")
}

/// Deserializes `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
