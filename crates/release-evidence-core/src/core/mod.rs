// crates/release-evidence-core/src/core/mod.rs
// ============================================================================
// Module: Release Evidence Core Types
// Description: Manifest, inventory, and bundle structures plus hashing.
// Purpose: Provide stable, serializable types for verified release evidence.
// Dependencies: serde, serde_json, sha2, bytes, time
// ============================================================================

//! ## Overview
//! Core types describe what a release declares (manifest and inventory) and
//! what a load produced (the flat evidence index and the verified bundle).
//! They perform no I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod bundle;
pub mod hashing;
pub mod inventory;
pub mod manifest;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bundle::Bundle;
pub use bundle::BundleLocation;
pub use bundle::BundleParts;
pub use bundle::EvidenceCategory;
pub use bundle::EvidenceFile;
pub use bundle::EvidenceFileRef;
pub use bundle::EvidenceFiles;
pub use bundle::EvidenceKind;
pub use bundle::EvidenceScope;
pub use bundle::EvidenceSummary;
pub use bundle::FileIndex;
pub use bundle::FileLookup;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::hash_bytes;
pub use inventory::EvidenceSet;
pub use inventory::Inventory;
pub use inventory::ReportRef;
pub use inventory::TargetEvidence;
pub use manifest::BinaryRef;
pub use manifest::FileHashes;
pub use manifest::FileRef;
pub use manifest::INVENTORY_FILE_KEY;
pub use manifest::MANIFEST_FILE_NAME;
pub use manifest::ManifestError;
pub use manifest::Provenance;
pub use manifest::ReleaseArtifact;
pub use manifest::ReleaseManifest;
pub use manifest::platform_label;
