// crates/release-evidence-core/src/tests.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: Shared bundle fixtures for release evidence core unit tests.
// Purpose: Build realistic multi-platform bundles without I/O.
// Dependencies: release-evidence-core, serde_json
// ============================================================================

//! ## Overview
//! Provides a six-artifact bundle (two source files, two per Linux target)
//! with matching manifest and inventory documents.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only fixtures favor direct unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use bytes::Bytes;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;

use crate::core::Bundle;
use crate::core::BundleLocation;
use crate::core::BundleParts;
use crate::core::EvidenceFile;
use crate::core::EvidenceFiles;
use crate::core::ReleaseManifest;
use crate::core::hash_bytes;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::runtime::build_file_index;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Manifest document with one artifact per Linux target.
pub(crate) fn manifest_json() -> Value {
    json!({
        "release_id": "rel-1",
        "version": "1.2.3",
        "track": "stable",
        "source": { "repo": "github.com/acme/app", "commit": "abc" },
        "files": { "inventory": { "path": "inventory.json", "hashes": { "sha256": "00" }, "size": 1 } },
        "policy": { "require_attestations": true },
        "future_field": [1, 2, 3],
        "artifacts": [
            { "os": "linux", "arch": "amd64", "binary": { "sha256": "aa", "size": 1 } },
            { "os": "linux", "arch": "arm64", "binary": { "sha256": "bb", "size": 2 } }
        ]
    })
}

/// Inventory document with source evidence and two Linux targets.
pub(crate) fn inventory_json() -> Value {
    json!({
        "source_evidence": {
            "sbom": [{ "path": "source/sbom.json", "hashes": { "sha256": "" },
                       "attestations": [{ "path": "source/sbom.sig" }] }]
        },
        "targets": [
            { "platform": "linux/amd64", "subject": { "path": "bin/amd64" },
              "scans": [{ "path": "amd64/scan.json", "attestations": [{ "path": "amd64/scan.sig" }] }] },
            { "os": "linux", "arch": "arm64",
              "scans": [{ "path": "arm64/scan.json", "attestations": [{ "path": "arm64/scan.sig" }] }] }
        ],
        "generator": "evidence-tool"
    })
}

/// Builds the six-artifact bundle with every artifact verified.
pub(crate) fn sample_bundle() -> Bundle {
    bundle_from(&manifest_json(), &inventory_json())
}

/// Builds a bundle from the given documents with every indexed artifact
/// verified.
pub(crate) fn bundle_from(manifest: &Value, inventory: &Value) -> Bundle {
    let raw_manifest = serde_json::to_vec(manifest).unwrap();
    let raw_inventory = serde_json::to_vec(inventory).unwrap();
    let file_index = build_file_index(&raw_inventory).unwrap();
    let files: EvidenceFiles = file_index
        .values()
        .map(|reference| {
            (
                reference.path.clone(),
                EvidenceFile {
                    reference: reference.clone(),
                    bytes: Bytes::from(reference.path.clone()),
                },
            )
        })
        .collect();
    Bundle::new(BundleParts {
        release: Some(ReleaseManifest::from_slice(&raw_manifest).unwrap()),
        raw_manifest: Bytes::from(raw_manifest),
        inventory_hash: hash_bytes(DEFAULT_HASH_ALGORITHM, &raw_inventory),
        raw_inventory: Bytes::from(raw_inventory),
        file_index,
        files,
        location: BundleLocation {
            bucket: "evidence".to_string(),
            prefix: "releases".to_string(),
            release_id: "rel-1".to_string(),
        },
        loaded_at: OffsetDateTime::UNIX_EPOCH,
    })
}
