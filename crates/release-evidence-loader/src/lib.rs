// crates/release-evidence-loader/src/lib.rs
// ============================================================================
// Module: Release Evidence Loader Library
// Description: Object-store evidence loading with verified fan-out fetch.
// Purpose: Turn a release prefix in a bucket into a verified evidence bundle.
// Dependencies: release-evidence-core, release-evidence-config, aws-sdk-s3, tokio
// ============================================================================

//! ## Overview
//! `release-evidence-loader` fetches a release manifest, verifies the
//! inventory it declares, indexes that inventory, and fetches every indexed
//! artifact with bounded concurrency. The result is an immutable
//! [`release_evidence_core::Bundle`] ready to publish into a
//! [`release_evidence_core::BundleStore`].
//!
//! Security posture: object-store content is untrusted. Every document is
//! size-capped, every declared path is validated as a relative key under the
//! release root, and every declared digest is checked.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod events;
pub mod fetcher;
pub mod loader;
pub mod location;
pub mod object_store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::ArtifactFailure;
pub use error::FailureReason;
pub use error::LoadError;
pub use events::FileLoadEventSink;
pub use events::LoadEvent;
pub use events::LoadEventDetail;
pub use events::LoadEventSink;
pub use events::NoopLoadEventSink;
pub use events::StderrLoadEventSink;
pub use events::sink_from_config;
pub use fetcher::FetchReport;
pub use fetcher::Fetcher;
pub use loader::Loader;
pub use location::ReleaseLocation;
pub use object_store::MemoryObjectStore;
pub use object_store::ObjectStoreClient;
pub use object_store::ObjectStoreError;
pub use object_store::S3ObjectStoreClient;
pub use release_evidence_config::LoadLimits;
pub use tokio_util::sync::CancellationToken;
