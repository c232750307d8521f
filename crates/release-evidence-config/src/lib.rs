// crates/release-evidence-config/src/lib.rs
// ============================================================================
// Module: Release Evidence Config Library
// Description: Canonical loader configuration model and validation.
// Purpose: Single source of truth for release-evidence.toml semantics.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! `release-evidence-config` defines where evidence lives (object store and
//! release identity), how much of it a load may pull (size, count, and
//! concurrency limits), and where load events go. Validation is strict and
//! fail-closed and runs before any network activity.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
