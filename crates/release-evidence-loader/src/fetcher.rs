// crates/release-evidence-loader/src/fetcher.rs
// ============================================================================
// Module: Concurrent Fetcher
// Description: Bounded fan-out fetch and hash verification of evidence files.
// Purpose: Pull every indexed artifact with a fixed number of in-flight reads.
// Dependencies: release-evidence-core, tokio, tokio-util
// ============================================================================

//! ## Overview
//! The fetcher admits one task per indexed artifact through a semaphore with
//! a fixed number of permits, so at most `workers` reads are in flight no
//! matter how large the index is. Permits are taken before a task is spawned.
//! Each task fetches under the per-artifact ceiling and verifies the declared
//! SHA-256 when one is present. Task results flow back to a single collector
//! on the calling task, which alone builds the verified map.
//!
//! Per-artifact failures are recorded and counted and never stop siblings.
//! Cancellation stops admission and unwinds in-flight reads; the report then
//! holds whatever completed and is flagged as cancelled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use release_evidence_core::DEFAULT_HASH_ALGORITHM;
use release_evidence_core::EvidenceFile;
use release_evidence_core::EvidenceFileRef;
use release_evidence_core::EvidenceFiles;
use release_evidence_core::FileIndex;
use release_evidence_core::hash_bytes;
use tokio::sync::Semaphore;
use tokio::task;
use tokio::task::JoinError;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::ArtifactFailure;
use crate::error::FailureReason;
use crate::location::ReleaseLocation;
use crate::object_store::ObjectStoreClient;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Aggregate result of one fan-out fetch.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Verified artifacts keyed by path.
    pub files: EvidenceFiles,
    /// Number of verified artifacts.
    pub fetched: usize,
    /// Number of excluded artifacts.
    pub skipped: usize,
    /// Bytes of verified artifacts.
    pub total_bytes: u64,
    /// Excluded artifacts, sorted by path.
    pub failures: Vec<ArtifactFailure>,
    /// True when the fetch was cut short by cancellation.
    pub cancelled: bool,
}

/// Bounded-concurrency artifact fetcher.
#[derive(Clone)]
pub struct Fetcher {
    /// Object-store client shared with every task.
    client: Arc<dyn ObjectStoreClient>,
    /// Maximum in-flight fetches.
    workers: usize,
    /// Per-artifact byte ceiling.
    max_artifact_bytes: u64,
}

/// Outcome of one fetch task.
enum FetchOutcome {
    /// Artifact fetched and verified.
    Verified(EvidenceFile),
    /// Artifact excluded.
    Failed(FailureReason),
    /// Task observed cancellation before finishing.
    Cancelled,
}

/// Inputs owned by one fetch task.
struct FetchTask {
    /// Object-store client.
    client: Arc<dyn ObjectStoreClient>,
    /// Bucket to read from.
    bucket: String,
    /// Resolved object key.
    key: String,
    /// Index entry being fetched.
    reference: EvidenceFileRef,
    /// Per-artifact byte ceiling.
    max_bytes: u64,
    /// Load-wide cancellation.
    cancel: CancellationToken,
}

// ============================================================================
// SECTION: Fetcher
// ============================================================================

impl Fetcher {
    /// Creates a fetcher with at least one worker slot.
    #[must_use]
    pub fn new(client: Arc<dyn ObjectStoreClient>, workers: usize, max_artifact_bytes: u64) -> Self {
        Self {
            client,
            workers: workers.max(1),
            max_artifact_bytes,
        }
    }

    /// Fetches and verifies every artifact in `index`.
    pub async fn fetch_all(
        &self,
        location: &ReleaseLocation,
        index: &FileIndex,
        cancel: &CancellationToken,
    ) -> FetchReport {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut collector = Collector::default();

        for reference in index.values() {
            let key = match location.object_key(&reference.path) {
                Ok(key) => key,
                Err(err) => {
                    collector.fail(
                        reference.path.clone(),
                        FailureReason::InvalidPath {
                            message: err.to_string(),
                        },
                    );
                    continue;
                }
            };
            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                break;
            };
            while let Some(joined) = tasks.try_join_next_with_id() {
                collector.absorb(joined);
            }
            let fetch = FetchTask {
                client: Arc::clone(&self.client),
                bucket: location.bucket().to_string(),
                key,
                reference: reference.clone(),
                max_bytes: self.max_artifact_bytes,
                cancel: cancel.clone(),
            };
            let handle = tasks.spawn(async move {
                let _permit = permit;
                fetch.run().await
            });
            collector.pending.insert(handle.id(), reference.path.clone());
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            collector.absorb(joined);
        }
        collector.finish(cancel.is_cancelled())
    }
}

impl FetchTask {
    /// Fetches and verifies one artifact.
    async fn run(self) -> FetchOutcome {
        let fetched = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return FetchOutcome::Cancelled,
            result = self.client.get_object(&self.bucket, &self.key, self.max_bytes) => result,
        };
        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(err) => return FetchOutcome::Failed(FailureReason::from_store_error(&err)),
        };
        if !self.reference.sha256.is_empty() {
            let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &bytes);
            if !digest.matches_declared(&self.reference.sha256) {
                return FetchOutcome::Failed(FailureReason::HashMismatch {
                    expected: self.reference.sha256,
                    actual: digest.value,
                });
            }
        }
        FetchOutcome::Verified(EvidenceFile {
            reference: self.reference,
            bytes,
        })
    }
}

// ============================================================================
// SECTION: Collector
// ============================================================================

/// Single owner of the aggregate fetch state.
#[derive(Default)]
struct Collector {
    /// Report under construction.
    report: FetchReport,
    /// Artifact path per running task.
    pending: HashMap<task::Id, String>,
}

impl Collector {
    /// Folds one finished task into the report.
    fn absorb(&mut self, joined: Result<(task::Id, FetchOutcome), JoinError>) {
        match joined {
            Ok((id, outcome)) => {
                let path = self.pending.remove(&id).unwrap_or_default();
                match outcome {
                    FetchOutcome::Verified(file) => {
                        let size = u64::try_from(file.bytes.len()).unwrap_or(u64::MAX);
                        self.report.total_bytes = self.report.total_bytes.saturating_add(size);
                        self.report.fetched += 1;
                        self.report.files.insert(file.reference.path.clone(), file);
                    }
                    FetchOutcome::Failed(reason) => self.fail(path, reason),
                    FetchOutcome::Cancelled => {}
                }
            }
            Err(err) => {
                let path = self.pending.remove(&err.id()).unwrap_or_default();
                if !err.is_cancelled() {
                    self.fail(
                        path,
                        FailureReason::Task {
                            message: err.to_string(),
                        },
                    );
                }
            }
        }
    }

    /// Records an excluded artifact.
    fn fail(&mut self, path: String, reason: FailureReason) {
        self.report.skipped += 1;
        self.report.failures.push(ArtifactFailure { path, reason });
    }

    /// Finalizes the report.
    fn finish(mut self, cancelled: bool) -> FetchReport {
        self.report.failures.sort_by(|left, right| left.path.cmp(&right.path));
        self.report.cancelled = cancelled;
        self.report
    }
}
