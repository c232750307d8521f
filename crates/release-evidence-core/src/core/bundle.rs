// crates/release-evidence-core/src/core/bundle.rs
// ============================================================================
// Module: Evidence Bundle Model
// Description: Classified evidence references, verified files, and bundles.
// Purpose: Hold the immutable result of one verified evidence load.
// Dependencies: bytes, serde, time, crate::core::{hashing, manifest}
// ============================================================================

//! ## Overview
//! A [`Bundle`] is built once per successful load (or once per platform
//! scoping) and never mutated afterwards. It carries the parsed manifest, the
//! raw manifest and inventory bytes, the flat index of every declared
//! artifact, and the subset of artifacts that were fetched and verified.
//!
//! Invariants:
//! - Every key of [`Bundle::files`] is also a key of [`Bundle::file_index`].
//! - Fields are private; a bundle is observed only through accessors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::hashing::HashDigest;
use crate::core::manifest::ReleaseManifest;

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Whether evidence applies to the whole release or to one built artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceScope {
    /// Platform-independent source evidence.
    Source,
    /// Evidence for one target platform.
    Artifact,
}

/// Evidence category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceCategory {
    /// Software bill of materials.
    Sbom,
    /// Vulnerability scan report.
    Scan,
    /// License report.
    License,
}

/// Evidence document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// Primary report document.
    Report,
    /// Signature or attestation accompanying a report.
    Attestation,
}

// ============================================================================
// SECTION: Evidence References
// ============================================================================

/// Flattened, classified reference to one inventory artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceFileRef {
    /// Path relative to the release root (unique key).
    pub path: String,
    /// Declared lowercase hex SHA-256; empty when not declared.
    pub sha256: String,
    /// Declared size in bytes.
    pub size: u64,
    /// Evidence scope.
    pub scope: EvidenceScope,
    /// Evidence category.
    pub category: EvidenceCategory,
    /// Evidence kind.
    pub kind: EvidenceKind,
    /// `os/arch` platform; empty for source evidence.
    pub platform: String,
}

impl EvidenceFileRef {
    /// Returns true when the reference applies to every platform.
    #[must_use]
    pub fn is_universal(&self) -> bool {
        self.platform.is_empty()
    }

    /// Returns true when the reference survives scoping to `platform`.
    #[must_use]
    pub fn applies_to(&self, platform: &str) -> bool {
        self.is_universal() || self.platform == platform
    }
}

/// Fetched and hash-verified artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceFile {
    /// Index reference the bytes were verified against.
    pub reference: EvidenceFileRef,
    /// Artifact bytes.
    pub bytes: Bytes,
}

/// Flat index of every declared artifact, keyed by path.
pub type FileIndex = BTreeMap<String, EvidenceFileRef>;

/// Verified artifacts keyed by path.
pub type EvidenceFiles = BTreeMap<String, EvidenceFile>;

// ============================================================================
// SECTION: Bundle
// ============================================================================

/// Storage location a bundle was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleLocation {
    /// Object-store bucket.
    pub bucket: String,
    /// Key prefix above the release directory (may be empty).
    pub prefix: String,
    /// Release identifier.
    pub release_id: String,
}

/// Inputs used to assemble a [`Bundle`].
#[derive(Debug, Clone)]
pub struct BundleParts {
    /// Parsed manifest, if any.
    pub release: Option<ReleaseManifest>,
    /// Raw manifest bytes.
    pub raw_manifest: Bytes,
    /// Raw inventory bytes.
    pub raw_inventory: Bytes,
    /// Verified inventory digest.
    pub inventory_hash: HashDigest,
    /// Flat index of declared artifacts.
    pub file_index: FileIndex,
    /// Verified artifacts.
    pub files: EvidenceFiles,
    /// Storage location metadata.
    pub location: BundleLocation,
    /// Load timestamp.
    pub loaded_at: OffsetDateTime,
}

/// Immutable result of one verified evidence load.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Parsed manifest.
    release: Option<ReleaseManifest>,
    /// Raw manifest bytes.
    raw_manifest: Bytes,
    /// Raw inventory bytes.
    raw_inventory: Bytes,
    /// Verified inventory digest.
    inventory_hash: HashDigest,
    /// Every declared artifact.
    file_index: FileIndex,
    /// Fetched and verified artifacts.
    files: EvidenceFiles,
    /// Storage location metadata.
    location: BundleLocation,
    /// Load timestamp.
    loaded_at: OffsetDateTime,
    /// Platform this bundle was scoped to, if any.
    platform_scope: Option<String>,
}

impl Bundle {
    /// Assembles a bundle from loaded parts.
    ///
    /// Files whose path is not indexed are dropped so that the verified set
    /// stays a subset of the index.
    #[must_use]
    pub fn new(parts: BundleParts) -> Self {
        Self::assemble(parts, None)
    }

    /// Assembles a bundle with an explicit platform scope.
    pub(crate) fn assemble(parts: BundleParts, platform_scope: Option<String>) -> Self {
        let BundleParts {
            release,
            raw_manifest,
            raw_inventory,
            inventory_hash,
            file_index,
            mut files,
            location,
            loaded_at,
        } = parts;
        files.retain(|path, _| file_index.contains_key(path));
        Self {
            release,
            raw_manifest,
            raw_inventory,
            inventory_hash,
            file_index,
            files,
            location,
            loaded_at,
            platform_scope,
        }
    }

    /// Returns the parsed manifest.
    #[must_use]
    pub const fn release(&self) -> Option<&ReleaseManifest> {
        self.release.as_ref()
    }

    /// Returns the raw manifest bytes.
    #[must_use]
    pub const fn raw_manifest(&self) -> &Bytes {
        &self.raw_manifest
    }

    /// Returns the raw inventory bytes.
    #[must_use]
    pub const fn raw_inventory(&self) -> &Bytes {
        &self.raw_inventory
    }

    /// Returns the verified inventory digest.
    #[must_use]
    pub const fn inventory_hash(&self) -> &HashDigest {
        &self.inventory_hash
    }

    /// Returns the flat index of every declared artifact.
    #[must_use]
    pub const fn file_index(&self) -> &FileIndex {
        &self.file_index
    }

    /// Returns the verified artifacts.
    #[must_use]
    pub const fn files(&self) -> &EvidenceFiles {
        &self.files
    }

    /// Returns the storage location metadata.
    #[must_use]
    pub const fn location(&self) -> &BundleLocation {
        &self.location
    }

    /// Returns the load timestamp.
    #[must_use]
    pub const fn loaded_at(&self) -> OffsetDateTime {
        self.loaded_at
    }

    /// Returns the platform this bundle was scoped to.
    #[must_use]
    pub fn platform_scope(&self) -> Option<&str> {
        self.platform_scope.as_deref()
    }

    /// Returns a verified file by path.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&EvidenceFile> {
        self.files.get(path)
    }

    /// Returns an index reference by path.
    #[must_use]
    pub fn file_ref(&self, path: &str) -> Option<&EvidenceFileRef> {
        self.file_index.get(path)
    }

    /// Classifies a path as verified, declared-but-unavailable, or unknown.
    #[must_use]
    pub fn lookup(&self, path: &str) -> FileLookup<'_> {
        if let Some(file) = self.files.get(path) {
            return FileLookup::Verified(file);
        }
        match self.file_index.get(path) {
            Some(reference) => FileLookup::Unavailable(reference),
            None => FileLookup::Unknown,
        }
    }

    /// Returns index references matching the optional filters, sorted by path.
    #[must_use]
    pub fn file_refs(
        &self,
        scope: Option<EvidenceScope>,
        category: Option<EvidenceCategory>,
    ) -> Vec<&EvidenceFileRef> {
        self.file_index
            .values()
            .filter(|reference| scope.is_none_or(|scope| reference.scope == scope))
            .filter(|reference| category.is_none_or(|category| reference.category == category))
            .collect()
    }

    /// Returns counts over the index and verified set.
    #[must_use]
    pub fn summary(&self) -> EvidenceSummary {
        let mut summary = EvidenceSummary {
            release_id: self.location.release_id.clone(),
            platform_scope: self.platform_scope.clone(),
            indexed: self.file_index.len(),
            verified: self.files.len(),
            by_scope: BTreeMap::new(),
            by_category: BTreeMap::new(),
            by_kind: BTreeMap::new(),
        };
        for reference in self.file_index.values() {
            *summary.by_scope.entry(reference.scope).or_default() += 1;
            *summary.by_category.entry(reference.category).or_default() += 1;
            *summary.by_kind.entry(reference.kind).or_default() += 1;
        }
        summary
    }
}

/// Result of resolving a path against a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLookup<'a> {
    /// The artifact was fetched and verified.
    Verified(&'a EvidenceFile),
    /// The artifact is declared but was not fetched or failed verification.
    Unavailable(&'a EvidenceFileRef),
    /// The path is not declared by the inventory.
    Unknown,
}

/// Evidence counts for one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceSummary {
    /// Release identifier.
    pub release_id: String,
    /// Platform scope, when the bundle is scoped.
    pub platform_scope: Option<String>,
    /// Number of declared artifacts.
    pub indexed: usize,
    /// Number of verified artifacts.
    pub verified: usize,
    /// Declared artifacts per scope.
    pub by_scope: BTreeMap<EvidenceScope, usize>,
    /// Declared artifacts per category.
    pub by_category: BTreeMap<EvidenceCategory, usize>,
    /// Declared artifacts per kind.
    pub by_kind: BTreeMap<EvidenceKind, usize>,
}
