// crates/release-evidence-core/src/runtime/filter.rs
// ============================================================================
// Module: Platform Filter
// Description: Derives platform-scoped bundles from a loaded bundle.
// Purpose: Serve one platform's evidence plus source evidence, consistently.
// Dependencies: bytes, crate::core, crate::runtime::raw_json
// ============================================================================

//! ## Overview
//! Scoping never mutates its input. A scoped bundle keeps index entries and
//! verified files whose platform is empty or equal to the requested platform,
//! release artifacts whose `os/arch` equals it, and raw manifest and
//! inventory bytes rewritten to match.
//!
//! Platform equality is exact string equality on the `os/arch` form. Raw
//! documents that cannot be rewritten pass through unchanged; the typed fields
//! are filtered regardless.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use bytes::Bytes;

use crate::core::bundle::Bundle;
use crate::core::bundle::BundleParts;
use crate::core::bundle::EvidenceFiles;
use crate::core::bundle::FileIndex;
use crate::core::inventory::resolve_platform;
use crate::core::manifest::ReleaseManifest;
use crate::core::manifest::platform_label;
use crate::runtime::raw_json::filter_array_member;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Manifest member listing per-platform artifacts.
const MANIFEST_ARTIFACTS_KEY: &str = "artifacts";
/// Inventory member listing per-target evidence.
const INVENTORY_TARGETS_KEY: &str = "targets";

// ============================================================================
// SECTION: Filtering
// ============================================================================

/// Returns a bundle scoped to `platform`.
///
/// An empty platform is a no-op request and returns the input bundle itself.
#[must_use]
pub fn filter_bundle_by_platform(bundle: &Arc<Bundle>, platform: &str) -> Arc<Bundle> {
    if platform.is_empty() {
        return Arc::clone(bundle);
    }
    Arc::new(bundle.scoped_to(platform))
}

impl Bundle {
    /// Builds a new bundle containing only evidence for `platform`.
    ///
    /// Universal (source) entries always survive. The receiver is untouched.
    #[must_use]
    pub fn scoped_to(&self, platform: &str) -> Self {
        let file_index: FileIndex = self
            .file_index()
            .iter()
            .filter(|(_, reference)| reference.applies_to(platform))
            .map(|(path, reference)| (path.clone(), reference.clone()))
            .collect();
        let files: EvidenceFiles = self
            .files()
            .iter()
            .filter(|(_, file)| file.reference.applies_to(platform))
            .map(|(path, file)| (path.clone(), file.clone()))
            .collect();
        let release = self.release().map(|release| filter_release(release, platform));
        let raw_manifest = rewrite_or_pass(
            self.raw_manifest(),
            filter_array_member(self.raw_manifest(), MANIFEST_ARTIFACTS_KEY, |fields| {
                platform_label(&fields.os, &fields.arch) == platform
            }),
        );
        let raw_inventory = rewrite_or_pass(
            self.raw_inventory(),
            filter_array_member(self.raw_inventory(), INVENTORY_TARGETS_KEY, |fields| {
                let resolved = resolve_platform(&fields.platform, &fields.os, &fields.arch);
                resolved.is_empty() || resolved == platform
            }),
        );
        Self::assemble(
            BundleParts {
                release,
                raw_manifest,
                raw_inventory,
                inventory_hash: self.inventory_hash().clone(),
                file_index,
                files,
                location: self.location().clone(),
                loaded_at: self.loaded_at(),
            },
            Some(platform.to_string()),
        )
    }
}

/// Copies a manifest keeping only artifacts built for `platform`.
fn filter_release(release: &ReleaseManifest, platform: &str) -> ReleaseManifest {
    let mut filtered = release.clone();
    filtered.artifacts = release
        .artifacts
        .iter()
        .filter(|artifact| artifact.platform() == platform)
        .cloned()
        .collect();
    filtered
}

/// Uses rewritten bytes when available, else the original buffer.
fn rewrite_or_pass(original: &Bytes, rewritten: Option<Vec<u8>>) -> Bytes {
    rewritten.map_or_else(|| original.clone(), Bytes::from)
}
