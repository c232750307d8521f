// crates/release-evidence-loader/src/events.rs
// ============================================================================
// Module: Load Events
// Description: Structured progress and outcome events for evidence loads.
// Purpose: Emit load telemetry without hard dependencies on a log pipeline.
// Dependencies: release-evidence-config, serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines load event payloads and sinks. Events are JSON lines
//! with an `event` label and a millisecond timestamp, so deployments can route
//! them to their preferred logging pipeline. Events are observational only;
//! a failing sink never affects a load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use release_evidence_config::LogSinkKind;
use release_evidence_config::LoggingConfig;
use serde::Serialize;

use crate::location::ReleaseLocation;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Load event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadEvent {
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Bucket being loaded from.
    pub bucket: String,
    /// Release being loaded.
    pub release_id: String,
    /// Event-specific fields, including the `event` label.
    #[serde(flatten)]
    pub detail: LoadEventDetail,
}

/// Event-specific load fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LoadEventDetail {
    /// A load began.
    LoadStarted,
    /// The manifest was fetched, parsed, and matched the requested release.
    ManifestVerified {
        /// Declared release version.
        version: String,
        /// Number of declared platform artifacts.
        artifacts: usize,
    },
    /// The inventory matched its declared hash and was indexed.
    InventoryVerified {
        /// Verified inventory digest.
        inventory_hash: String,
        /// Number of indexed evidence files.
        indexed: usize,
    },
    /// One evidence file was excluded from the verified set.
    ArtifactSkipped {
        /// Declared artifact path.
        path: String,
        /// Failure description.
        reason: String,
    },
    /// A load produced a bundle.
    LoadCompleted {
        /// Indexed evidence files.
        discovered: usize,
        /// Verified evidence files.
        fetched: usize,
        /// Excluded evidence files.
        skipped: usize,
        /// Bytes of verified evidence.
        total_bytes: u64,
        /// Wall-clock load duration.
        elapsed_ms: u128,
    },
    /// A load aborted without a bundle.
    LoadFailed {
        /// Stable error label.
        error_kind: &'static str,
        /// Error description.
        message: String,
        /// Wall-clock time until failure.
        elapsed_ms: u128,
    },
}

impl LoadEvent {
    /// Creates a new load event with a consistent timestamp.
    #[must_use]
    pub fn new(location: &ReleaseLocation, detail: LoadEventDetail) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            timestamp_ms,
            bucket: location.bucket().to_string(),
            release_id: location.release_id().to_string(),
            detail,
        }
    }

    /// Returns the event label.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self.detail {
            LoadEventDetail::LoadStarted => "load_started",
            LoadEventDetail::ManifestVerified { .. } => "manifest_verified",
            LoadEventDetail::InventoryVerified { .. } => "inventory_verified",
            LoadEventDetail::ArtifactSkipped { .. } => "artifact_skipped",
            LoadEventDetail::LoadCompleted { .. } => "load_completed",
            LoadEventDetail::LoadFailed { .. } => "load_failed",
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink for load events.
pub trait LoadEventSink: Send + Sync {
    /// Record a load event.
    fn record(&self, event: &LoadEvent);
}

/// Load event sink that logs JSON lines to stderr.
pub struct StderrLoadEventSink;

impl LoadEventSink for StderrLoadEventSink {
    fn record(&self, event: &LoadEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Load event sink that logs JSON lines to a file.
pub struct FileLoadEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileLoadEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LoadEventSink for FileLoadEventSink {
    fn record(&self, event: &LoadEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op load event sink.
pub struct NoopLoadEventSink;

impl LoadEventSink for NoopLoadEventSink {
    fn record(&self, _event: &LoadEvent) {}
}

/// Builds the sink selected by logging configuration.
///
/// # Errors
///
/// Returns an error if the file sink cannot open its log file.
pub fn sink_from_config(config: &LoggingConfig) -> io::Result<Arc<dyn LoadEventSink>> {
    match (config.sink, config.path.as_deref()) {
        (LogSinkKind::Stderr, _) => Ok(Arc::new(StderrLoadEventSink)),
        (LogSinkKind::None, _) => Ok(Arc::new(NoopLoadEventSink)),
        (LogSinkKind::File, Some(path)) => Ok(Arc::new(FileLoadEventSink::new(path)?)),
        (LogSinkKind::File, None) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "logging.path required for file sink",
        )),
    }
}

#[cfg(test)]
mod tests;
