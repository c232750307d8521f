// crates/release-evidence-core/src/runtime/index.rs
// ============================================================================
// Module: Inventory Indexer
// Description: Flattens a nested inventory into a path-keyed evidence index.
// Purpose: Classify every report and attestation by scope, category, and kind.
// Dependencies: crate::core::{bundle, inventory}, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`build_file_index`] walks the inventory in a fixed order: source evidence
//! first (`sbom`, `scans`, `license`), then each target in document order with
//! the same category order. Within a report the primary document is emitted
//! before its attestations. Paths are unique keys; when a path recurs the
//! entry processed last replaces the earlier one.
//!
//! Entries with an empty path mean "not produced" and are skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::bundle::EvidenceCategory;
use crate::core::bundle::EvidenceFileRef;
use crate::core::bundle::EvidenceKind;
use crate::core::bundle::EvidenceScope;
use crate::core::bundle::FileIndex;
use crate::core::inventory::EvidenceSet;
use crate::core::inventory::Inventory;
use crate::core::manifest::FileHashes;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Inventory indexing errors.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Inventory bytes are not a valid inventory document.
    #[error("inventory parse error: {0}")]
    Parse(String),
}

// ============================================================================
// SECTION: Indexing
// ============================================================================

/// Parses inventory bytes and builds the flat evidence index.
///
/// # Errors
///
/// Returns [`IndexError::Parse`] when the top-level JSON is malformed.
pub fn build_file_index(raw: &[u8]) -> Result<FileIndex, IndexError> {
    let inventory: Inventory =
        serde_json::from_slice(raw).map_err(|err| IndexError::Parse(err.to_string()))?;
    Ok(index_inventory(&inventory))
}

/// Builds the flat evidence index from a parsed inventory.
#[must_use]
pub fn index_inventory(inventory: &Inventory) -> FileIndex {
    let mut index = FileIndex::new();
    if let Some(source) = &inventory.source_evidence {
        index_set(&mut index, source, EvidenceScope::Source, "");
    }
    for target in &inventory.targets {
        let platform = target.resolved_platform();
        index_set(&mut index, &target.evidence, EvidenceScope::Artifact, &platform);
    }
    index
}

/// Adds every report and attestation of one evidence set.
fn index_set(index: &mut FileIndex, set: &EvidenceSet, scope: EvidenceScope, platform: &str) {
    for (category, reports) in set.sections() {
        for report in reports {
            let entry = Entry {
                scope,
                category,
                platform,
            };
            entry.insert(index, EvidenceKind::Report, &report.path, &report.hashes, report.size);
            for attestation in &report.attestations {
                entry.insert(
                    index,
                    EvidenceKind::Attestation,
                    &attestation.path,
                    &attestation.hashes,
                    attestation.size,
                );
            }
        }
    }
}

/// Classification shared by a report and its attestations.
struct Entry<'a> {
    /// Evidence scope.
    scope: EvidenceScope,
    /// Evidence category.
    category: EvidenceCategory,
    /// Resolved platform.
    platform: &'a str,
}

impl Entry<'_> {
    /// Inserts one classified reference, replacing any earlier entry.
    fn insert(
        &self,
        index: &mut FileIndex,
        kind: EvidenceKind,
        path: &str,
        hashes: &FileHashes,
        size: u64,
    ) {
        if path.is_empty() {
            return;
        }
        index.insert(
            path.to_string(),
            EvidenceFileRef {
                path: path.to_string(),
                sha256: hashes.sha256.trim().to_ascii_lowercase(),
                size,
                scope: self.scope,
                category: self.category,
                kind,
                platform: self.platform.to_string(),
            },
        );
    }
}
