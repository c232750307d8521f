// crates/release-evidence-core/src/runtime/mod.rs
// ============================================================================
// Module: Release Evidence Runtime
// Description: Indexing, platform scoping, and bundle publication.
// Purpose: Transform loaded documents into served, immutable bundles.
// Dependencies: crate::core, arc-swap, serde_json
// ============================================================================

//! ## Overview
//! Runtime modules turn an inventory into a flat index, derive
//! platform-scoped bundles, and publish bundles to concurrent readers.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod filter;
pub mod index;
mod raw_json;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use filter::filter_bundle_by_platform;
pub use index::IndexError;
pub use index::build_file_index;
pub use index::index_inventory;
pub use store::BundleStore;
pub use store::StoredFile;
