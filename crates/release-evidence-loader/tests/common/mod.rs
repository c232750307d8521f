// crates/release-evidence-loader/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared release fixtures, instrumented stores, and sinks.
// Purpose: Seed realistic releases into an in-memory object store.
// Dependencies: release-evidence-core, release-evidence-loader, serde_json, tokio
// ============================================================================

//! ## Overview
//! Builds a manifest and inventory whose declared hashes match the seeded
//! bytes, with knobs for tampering, omitting, or leaving hashes undeclared.
//! [`InstrumentedStore`] wraps the in-memory store to delay artifact reads
//! and record peak concurrency.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]
#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use release_evidence_core::DEFAULT_HASH_ALGORITHM;
use release_evidence_core::hash_bytes;
use release_evidence_loader::LoadEvent;
use release_evidence_loader::LoadEventSink;
use release_evidence_loader::LoadLimits;
use release_evidence_loader::MemoryObjectStore;
use release_evidence_loader::ObjectStoreClient;
use release_evidence_loader::ObjectStoreError;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fixture bucket.
pub const BUCKET: &str = "evidence";
/// Fixture prefix.
pub const PREFIX: &str = "releases";
/// Fixture release id.
pub const RELEASE_ID: &str = "v1.0.0";

// ============================================================================
// SECTION: Release Fixtures
// ============================================================================

/// How an artifact's digest is declared in the inventory.
#[derive(Debug, Clone)]
pub enum Declared {
    /// The true SHA-256 of the seeded bytes.
    Correct,
    /// A digest of different bytes.
    Wrong,
    /// No digest.
    Absent,
}

/// One artifact to seed.
#[derive(Debug, Clone)]
pub struct ArtifactSpec {
    /// Path relative to the release root.
    pub path: String,
    /// Object bytes.
    pub bytes: Vec<u8>,
    /// Target platform; `None` for source evidence.
    pub platform: Option<String>,
    /// Declared digest mode.
    pub declared: Declared,
    /// Whether the object is written to the store.
    pub uploaded: bool,
}

impl ArtifactSpec {
    /// Source-scope artifact.
    pub fn source(path: &str, bytes: &[u8]) -> Self {
        Self {
            path: path.to_string(),
            bytes: bytes.to_vec(),
            platform: None,
            declared: Declared::Correct,
            uploaded: true,
        }
    }

    /// Target-scope artifact.
    pub fn target(platform: &str, path: &str, bytes: &[u8]) -> Self {
        Self {
            platform: Some(platform.to_string()),
            ..Self::source(path, bytes)
        }
    }

    /// Overrides the declared digest mode.
    pub fn declared(mut self, declared: Declared) -> Self {
        self.declared = declared;
        self
    }

    /// Declares the artifact without writing it.
    pub fn not_uploaded(mut self) -> Self {
        self.uploaded = false;
        self
    }

    /// Declared digest text.
    fn digest(&self) -> String {
        match self.declared {
            Declared::Correct => hash_bytes(DEFAULT_HASH_ALGORITHM, &self.bytes).value,
            Declared::Wrong => hash_bytes(DEFAULT_HASH_ALGORITHM, b"something else").value,
            Declared::Absent => String::new(),
        }
    }

    /// Inventory report entry.
    fn report(&self) -> Value {
        json!({
            "path": self.path,
            "hashes": { "sha256": self.digest() },
            "size": self.bytes.len(),
        })
    }
}

/// The standard six-artifact release: two source files, two per Linux target.
pub fn standard_artifacts() -> Vec<ArtifactSpec> {
    vec![
        ArtifactSpec::source("source/sbom.json", br#"{"bomFormat":"CycloneDX"}"#),
        ArtifactSpec::source("source/license.json", br#"{"licenses":["MIT"]}"#),
        ArtifactSpec::target("linux/amd64", "amd64/sbom.json", br#"{"target":"amd64"}"#),
        ArtifactSpec::target("linux/amd64", "amd64/scan.json", br#"{"findings":[]}"#),
        ArtifactSpec::target("linux/arm64", "arm64/sbom.json", br#"{"target":"arm64"}"#),
        ArtifactSpec::target("linux/arm64", "arm64/scan.json", br#"{"findings":[1]}"#),
    ]
}

/// Builds an inventory document for `artifacts`.
///
/// Paths containing `license` are filed as license reports, `scan` as scan
/// reports, and everything else as SBOMs.
pub fn inventory_document(artifacts: &[ArtifactSpec]) -> Value {
    let mut source = json!({ "sbom": [], "scans": [], "license": [] });
    let mut targets: BTreeMap<String, Value> = BTreeMap::new();
    for artifact in artifacts {
        let section = if artifact.path.contains("license") {
            "license"
        } else if artifact.path.contains("scan") {
            "scans"
        } else {
            "sbom"
        };
        let holder = match &artifact.platform {
            None => &mut source,
            Some(platform) => targets.entry(platform.clone()).or_insert_with(|| {
                json!({ "platform": platform, "sbom": [], "scans": [], "license": [] })
            }),
        };
        holder[section].as_array_mut().unwrap().push(artifact.report());
    }
    json!({
        "schema": "evidence-inventory/v1",
        "source_evidence": source,
        "targets": targets.into_values().collect::<Vec<_>>(),
    })
}

/// Builds a manifest document declaring `inventory_bytes` as its inventory.
pub fn manifest_document(release_id: &str, inventory_bytes: &[u8]) -> Value {
    json!({
        "release_id": release_id,
        "version": "1.0.0",
        "track": "stable",
        "source": { "repo": "github.com/acme/app", "commit": "0123abcd" },
        "builder": { "repo": "github.com/acme/builder", "commit": "4567ef01" },
        "files": {
            "inventory": {
                "path": "inventory.json",
                "hashes": { "sha256": hash_bytes(DEFAULT_HASH_ALGORITHM, inventory_bytes).value },
                "size": inventory_bytes.len(),
            }
        },
        "artifacts": [
            { "os": "linux", "arch": "amd64", "binary": { "sha256": "aa", "size": 10 } },
            { "os": "linux", "arch": "arm64", "binary": { "sha256": "bb", "size": 11 } }
        ]
    })
}

/// Writes a JSON document to `key`.
pub fn put_json(store: &MemoryObjectStore, key: &str, value: &Value) {
    store.put(BUCKET, key, serde_json::to_vec(value).unwrap()).unwrap();
}

/// Seeds a complete release into `store` and returns the inventory bytes.
pub fn seed_release(
    store: &MemoryObjectStore,
    release_id: &str,
    artifacts: &[ArtifactSpec],
) -> Vec<u8> {
    let root = format!("{PREFIX}/{release_id}");
    let inventory = serde_json::to_vec(&inventory_document(artifacts)).unwrap();
    put_json(store, &format!("{root}/release.json"), &manifest_document(release_id, &inventory));
    store.put(BUCKET, &format!("{root}/inventory.json"), inventory.clone()).unwrap();
    for artifact in artifacts.iter().filter(|artifact| artifact.uploaded) {
        store.put(BUCKET, &format!("{root}/{}", artifact.path), artifact.bytes.clone()).unwrap();
    }
    inventory
}

/// Limits sized for fixtures.
pub fn test_limits() -> LoadLimits {
    LoadLimits {
        max_manifest_bytes: 64 * 1024,
        max_artifact_bytes: 1024,
        max_artifacts: 100,
        fetch_workers: 4,
        max_list_keys: 1000,
        load_timeout: Duration::from_secs(10),
    }
}

// ============================================================================
// SECTION: Instrumented Store
// ============================================================================

/// Object store wrapper that delays artifact reads and tracks concurrency.
pub struct InstrumentedStore {
    /// Backing store.
    inner: MemoryObjectStore,
    /// Delay applied to every artifact read.
    artifact_delay: Duration,
    /// Reads currently in flight.
    in_flight: AtomicUsize,
    /// Peak reads in flight.
    peak: AtomicUsize,
    /// Completed artifact reads.
    completed: AtomicUsize,
}

impl InstrumentedStore {
    /// Wraps `inner`, delaying artifact reads by `artifact_delay`.
    pub fn new(inner: MemoryObjectStore, artifact_delay: Duration) -> Self {
        Self {
            inner,
            artifact_delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    /// Peak number of concurrent artifact reads observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Number of artifact reads that ran to completion.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the read is dropped.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStoreClient for InstrumentedStore {
    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        self.inner.list_keys(bucket, prefix).await
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        max_bytes: u64,
    ) -> Result<Bytes, ObjectStoreError> {
        if key.ends_with("/release.json") || key.ends_with("/inventory.json") {
            return self.inner.get_object(bucket, key, max_bytes).await;
        }
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard(&self.in_flight);
        self.peak.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.artifact_delay).await;
        let result = self.inner.get_object(bucket, key, max_bytes).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

// ============================================================================
// SECTION: Recording Sink
// ============================================================================

/// Event sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    /// Recorded events.
    events: Mutex<Vec<LoadEvent>>,
}

impl RecordingSink {
    /// Returns recorded events.
    pub fn events(&self) -> Vec<LoadEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns recorded event labels in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(LoadEvent::name).collect()
    }
}

impl LoadEventSink for RecordingSink {
    fn record(&self, event: &LoadEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Returns a shared recording sink and its trait-object handle.
pub fn recording_sink() -> (Arc<RecordingSink>, Arc<dyn LoadEventSink>) {
    let sink = Arc::new(RecordingSink::default());
    let handle: Arc<dyn LoadEventSink> = sink.clone();
    (sink, handle)
}
