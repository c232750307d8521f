// crates/release-evidence-core/src/lib.rs
// ============================================================================
// Module: Release Evidence Core Library
// Description: Public API surface for the release evidence core.
// Purpose: Expose evidence types, the indexer, the platform filter, and the store.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! Release evidence core models a release's supply-chain evidence (SBOMs,
//! vulnerability scans, license reports, and their attestations), flattens
//! the evidence inventory into a path-keyed index, derives platform-scoped
//! views, and publishes immutable bundles to concurrent readers. It is
//! I/O-free; fetching and verification live in `release-evidence-loader`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use runtime::BundleStore;
pub use runtime::IndexError;
pub use runtime::StoredFile;
pub use runtime::build_file_index;
pub use runtime::filter_bundle_by_platform;
pub use runtime::index_inventory;

#[cfg(test)]
mod tests;
