// crates/release-evidence-core/src/core/inventory.rs
// ============================================================================
// Module: Evidence Inventory Schema
// Description: Typed model of `inventory.json` (source and per-target evidence).
// Purpose: Describe every SBOM, scan, and license report shipped with a release.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An inventory has an optional `source_evidence` section with
//! platform-independent reports, and a `targets` list with one section per
//! build target. Each section holds `sbom`, `scans`, and `license` report
//! lists; every report may carry attestation files.
//!
//! The schema is forward compatible: unknown fields are ignored and `null`
//! collections read as empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::bundle::EvidenceCategory;
use crate::core::manifest::FileHashes;
use crate::core::manifest::FileRef;
use crate::core::manifest::null_as_default;
use crate::core::manifest::platform_label;

// ============================================================================
// SECTION: Inventory Types
// ============================================================================

/// Primary evidence document plus its attestations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRef {
    /// Path relative to the release root; empty when not produced.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    /// Declared content hashes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hashes: FileHashes,
    /// Declared size in bytes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
    /// Signed statements accompanying the report.
    #[serde(default, deserialize_with = "null_as_default")]
    pub attestations: Vec<FileRef>,
}

/// Reports grouped by evidence category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSet {
    /// Software bills of materials.
    #[serde(default, deserialize_with = "null_as_default")]
    pub sbom: Vec<ReportRef>,
    /// Vulnerability scan reports.
    #[serde(default, deserialize_with = "null_as_default")]
    pub scans: Vec<ReportRef>,
    /// License reports.
    #[serde(default, deserialize_with = "null_as_default")]
    pub license: Vec<ReportRef>,
}

impl EvidenceSet {
    /// Returns report lists in processing order with their category.
    #[must_use]
    pub fn sections(&self) -> [(EvidenceCategory, &[ReportRef]); 3] {
        [
            (EvidenceCategory::Sbom, self.sbom.as_slice()),
            (EvidenceCategory::Scan, self.scans.as_slice()),
            (EvidenceCategory::License, self.license.as_slice()),
        ]
    }
}

/// Evidence for one build target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEvidence {
    /// Explicit `os/arch` platform label.
    #[serde(default, deserialize_with = "null_as_default")]
    pub platform: String,
    /// Target operating system.
    #[serde(default, deserialize_with = "null_as_default")]
    pub os: String,
    /// Target architecture.
    #[serde(default, deserialize_with = "null_as_default")]
    pub arch: String,
    /// Binary the evidence describes.
    #[serde(default)]
    pub subject: Option<FileRef>,
    /// Target evidence reports.
    #[serde(flatten)]
    pub evidence: EvidenceSet,
}

impl TargetEvidence {
    /// Resolves the target platform.
    ///
    /// An explicit `platform` always wins; otherwise `os/arch` is synthesized
    /// when `os` is set; otherwise the platform is empty.
    #[must_use]
    pub fn resolved_platform(&self) -> String {
        resolve_platform(&self.platform, &self.os, &self.arch)
    }
}

/// Evidence inventory document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Platform-independent evidence.
    #[serde(default)]
    pub source_evidence: Option<EvidenceSet>,
    /// Per-target evidence.
    #[serde(default, deserialize_with = "null_as_default")]
    pub targets: Vec<TargetEvidence>,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Applies the platform precedence rule to raw target fields.
#[must_use]
pub fn resolve_platform(platform: &str, os: &str, arch: &str) -> String {
    if !platform.is_empty() {
        return platform.to_string();
    }
    if !os.is_empty() {
        return platform_label(os, arch);
    }
    String::new()
}
