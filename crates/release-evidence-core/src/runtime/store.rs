// crates/release-evidence-core/src/runtime/store.rs
// ============================================================================
// Module: Bundle Store
// Description: Process-wide holder of the currently published bundle.
// Purpose: Publish verified bundles atomically to any number of readers.
// Dependencies: arc-swap, crate::core::bundle, crate::runtime::filter
// ============================================================================

//! ## Overview
//! [`BundleStore`] holds at most one [`Bundle`] behind a single atomically
//! swappable reference. Readers load the current `Arc<Bundle>` without taking
//! a lock and keep observing that bundle even if a newer one is published
//! while they work. A publish replaces the previous bundle; it never merges.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::core::bundle::Bundle;
use crate::core::bundle::EvidenceCategory;
use crate::core::bundle::EvidenceFile;
use crate::core::bundle::EvidenceFileRef;
use crate::core::bundle::EvidenceScope;
use crate::core::bundle::EvidenceSummary;
use crate::core::bundle::FileLookup;
use crate::runtime::filter::filter_bundle_by_platform;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Owned result of resolving a path against the published bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredFile {
    /// The artifact was fetched and verified.
    Verified(EvidenceFile),
    /// The artifact is declared but not available.
    Unavailable(EvidenceFileRef),
    /// The path is unknown, or no bundle is published.
    Unknown,
}

/// Holder of the currently published bundle.
#[derive(Debug, Default)]
pub struct BundleStore {
    /// Published bundle, if any.
    current: ArcSwapOption<Bundle>,
}

impl BundleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a bundle, superseding the previous one.
    pub fn set(&self, bundle: Arc<Bundle>) {
        self.current.store(Some(bundle));
    }

    /// Returns the published bundle.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Bundle>> {
        self.current.load_full()
    }

    /// Returns a verified file from the published bundle.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<EvidenceFile> {
        self.with_bundle(|bundle| bundle.file(path).cloned()).flatten()
    }

    /// Returns an index reference from the published bundle.
    #[must_use]
    pub fn file_ref(&self, path: &str) -> Option<EvidenceFileRef> {
        self.with_bundle(|bundle| bundle.file_ref(path).cloned()).flatten()
    }

    /// Resolves a path, distinguishing unavailable from unknown artifacts.
    #[must_use]
    pub fn lookup(&self, path: &str) -> StoredFile {
        self.with_bundle(|bundle| match bundle.lookup(path) {
            FileLookup::Verified(file) => StoredFile::Verified(file.clone()),
            FileLookup::Unavailable(reference) => StoredFile::Unavailable(reference.clone()),
            FileLookup::Unknown => StoredFile::Unknown,
        })
        .unwrap_or(StoredFile::Unknown)
    }

    /// Lists index references matching the optional filters, sorted by path.
    #[must_use]
    pub fn list_file_refs(
        &self,
        scope: Option<EvidenceScope>,
        category: Option<EvidenceCategory>,
    ) -> Vec<EvidenceFileRef> {
        self.with_bundle(|bundle| bundle.file_refs(scope, category).into_iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns evidence counts for the published bundle.
    #[must_use]
    pub fn summary(&self) -> Option<EvidenceSummary> {
        self.with_bundle(Bundle::summary)
    }

    /// Returns true when a bundle is published with at least one verified file.
    #[must_use]
    pub fn has_evidence(&self) -> bool {
        self.with_bundle(|bundle| !bundle.files().is_empty()).unwrap_or(false)
    }

    /// Returns the published bundle scoped to `platform`.
    #[must_use]
    pub fn get_for_platform(&self, platform: &str) -> Option<Arc<Bundle>> {
        self.get().map(|bundle| filter_bundle_by_platform(&bundle, platform))
    }

    /// Runs `read` against the published bundle without cloning it.
    fn with_bundle<T>(&self, read: impl FnOnce(&Bundle) -> T) -> Option<T> {
        let guard = self.current.load();
        guard.as_deref().map(read)
    }
}

#[cfg(test)]
mod tests;
