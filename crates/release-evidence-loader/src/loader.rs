// crates/release-evidence-loader/src/loader.rs
// ============================================================================
// Module: Evidence Loader
// Description: Orchestrates manifest, inventory, index, and artifact fetches.
// Purpose: Produce one verified, immutable bundle per load or fail closed.
// Dependencies: release-evidence-core, tokio, tokio-util, time
// ============================================================================

//! ## Overview
//! A load runs strictly in order: fetch and parse `release.json`, check that
//! it names the requested release, fetch the inventory and verify it against
//! the manifest-declared SHA-256, index it, and fan out over the index with
//! the [`Fetcher`]. Nothing downstream of the inventory is trusted until its
//! digest matches.
//!
//! Every step before the fan-out is fatal on failure. The fan-out tolerates
//! per-artifact failures but the load as a whole is all-or-nothing: a
//! cancelled or timed-out load never yields a bundle built from partial
//! results. Progress and outcome are reported through a [`LoadEventSink`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use release_evidence_config::ConfigError;
use release_evidence_config::LoadLimits;
use release_evidence_config::LoaderConfig;
use release_evidence_config::validate_release_id;
use release_evidence_core::Bundle;
use release_evidence_core::BundleParts;
use release_evidence_core::BundleStore;
use release_evidence_core::DEFAULT_HASH_ALGORITHM;
use release_evidence_core::INVENTORY_FILE_KEY;
use release_evidence_core::MANIFEST_FILE_NAME;
use release_evidence_core::ReleaseManifest;
use release_evidence_core::build_file_index;
use release_evidence_core::hash_bytes;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::error::LoadError;
use crate::events::LoadEvent;
use crate::events::LoadEventDetail;
use crate::events::LoadEventSink;
use crate::events::NoopLoadEventSink;
use crate::events::sink_from_config;
use crate::fetcher::FetchReport;
use crate::fetcher::Fetcher;
use crate::location::ReleaseLocation;
use crate::object_store::ObjectStoreClient;
use crate::object_store::S3ObjectStoreClient;
use crate::object_store::normalize_prefix;

// ============================================================================
// SECTION: Loader
// ============================================================================

/// Release evidence loader.
#[derive(Clone)]
pub struct Loader {
    /// Object-store backend.
    client: Arc<dyn ObjectStoreClient>,
    /// Size, count, concurrency, and deadline limits.
    limits: LoadLimits,
    /// Destination for load events.
    events: Arc<dyn LoadEventSink>,
}

impl Loader {
    /// Creates a loader over `client` that discards load events.
    #[must_use]
    pub fn new(client: Arc<dyn ObjectStoreClient>, limits: LoadLimits) -> Self {
        Self {
            client,
            limits,
            events: Arc::new(NoopLoadEventSink),
        }
    }

    /// Replaces the load event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn LoadEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Builds an S3-backed loader from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Config`] when the configuration is invalid or the
    /// event sink cannot be opened.
    pub async fn from_config(config: &LoaderConfig) -> Result<Self, LoadError> {
        config.validate()?;
        let limits = config.limits();
        let events = sink_from_config(&config.logging)
            .map_err(|err| ConfigError::Io(format!("logging sink: {err}")))?;
        let client = S3ObjectStoreClient::new(&config.object_store, limits.max_list_keys)
            .await
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(Self::new(Arc::new(client), limits).with_event_sink(events))
    }

    /// Returns the limits this loader enforces.
    #[must_use]
    pub const fn limits(&self) -> LoadLimits {
        self.limits
    }

    /// Loads the release stored at `{prefix}/{release_id}/` in `bucket`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Config`] for invalid inputs before any I/O, and
    /// any error of [`Loader::load_at`] afterwards.
    pub async fn load(
        &self,
        bucket: &str,
        prefix: &str,
        release_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Bundle, LoadError> {
        let location = ReleaseLocation::new(bucket, prefix, release_id)?;
        self.load_at(&location, cancel).await
    }

    /// Loads the release at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when any load-aborting step fails, the load is
    /// cancelled, or it exceeds the configured deadline.
    pub async fn load_at(
        &self,
        location: &ReleaseLocation,
        cancel: &CancellationToken,
    ) -> Result<Bundle, LoadError> {
        let started = Instant::now();
        self.emit(location, LoadEventDetail::LoadStarted);
        let timeout = self.limits.load_timeout;
        let outcome = match tokio::time::timeout(timeout, self.run(location, cancel)).await {
            Ok(result) => result,
            Err(_) => Err(LoadError::Timeout { timeout }),
        };
        let elapsed_ms = started.elapsed().as_millis();
        match outcome {
            Ok((bundle, report)) => {
                self.emit(
                    location,
                    LoadEventDetail::LoadCompleted {
                        discovered: bundle.file_index().len(),
                        fetched: report.fetched,
                        skipped: report.skipped,
                        total_bytes: report.total_bytes,
                        elapsed_ms,
                    },
                );
                Ok(bundle)
            }
            Err(err) => {
                self.emit(
                    location,
                    LoadEventDetail::LoadFailed {
                        error_kind: err.kind(),
                        message: err.to_string(),
                        elapsed_ms,
                    },
                );
                Err(err)
            }
        }
    }

    /// Loads `location` and publishes the result to `store`.
    ///
    /// The store keeps its previous bundle when the load fails.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Loader::load_at`].
    pub async fn refresh(
        &self,
        location: &ReleaseLocation,
        store: &BundleStore,
        cancel: &CancellationToken,
    ) -> Result<Arc<Bundle>, LoadError> {
        let bundle = Arc::new(self.load_at(location, cancel).await?);
        store.set(Arc::clone(&bundle));
        Ok(bundle)
    }

    /// Lists release ids under `prefix` that carry a manifest.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Config`] for an invalid bucket or prefix,
    /// [`LoadError::Fetch`] when listing fails, and [`LoadError::Cancelled`]
    /// when cancelled.
    pub async fn list_releases(
        &self,
        bucket: &str,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, LoadError> {
        let bucket = bucket.trim();
        if bucket.is_empty() {
            return Err(ConfigError::Invalid("object_store.bucket must be set".to_string()).into());
        }
        let prefix = normalize_prefix(prefix)
            .map_err(|err| ConfigError::Invalid(format!("object_store.prefix: {err}")))?;
        let keys = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(LoadError::Cancelled),
            result = self.client.list_keys(bucket, &prefix) => result.map_err(|source| {
                LoadError::Fetch {
                    bucket: bucket.to_string(),
                    key: prefix.clone(),
                    source,
                }
            })?,
        };
        let releases: BTreeSet<String> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(prefix.as_str()))
            .filter_map(|rest| rest.split_once('/'))
            .filter(|(id, name)| *name == MANIFEST_FILE_NAME && validate_release_id(id).is_ok())
            .map(|(id, _)| id.to_string())
            .collect();
        Ok(releases.into_iter().collect())
    }

    // ------------------------------------------------------------------------
    // Load steps
    // ------------------------------------------------------------------------

    /// Runs the load pipeline without deadline or outcome events.
    async fn run(
        &self,
        location: &ReleaseLocation,
        cancel: &CancellationToken,
    ) -> Result<(Bundle, FetchReport), LoadError> {
        let manifest_key = location.manifest_key();
        let raw_manifest = self.fetch_document(location, &manifest_key, cancel).await?;
        let manifest = ReleaseManifest::from_slice(&raw_manifest).map_err(|source| {
            LoadError::Parse {
                key: manifest_key,
                source,
            }
        })?;
        if manifest.release_id != location.release_id() {
            return Err(LoadError::IdentityMismatch {
                expected: location.release_id().to_string(),
                actual: manifest.release_id,
            });
        }
        self.emit(
            location,
            LoadEventDetail::ManifestVerified {
                version: manifest.version.clone(),
                artifacts: manifest.artifacts.len(),
            },
        );

        let inventory = manifest.inventory().ok_or_else(|| LoadError::MissingFile {
            name: INVENTORY_FILE_KEY.to_string(),
        })?;
        let declared = inventory.declared_sha256().ok_or_else(|| LoadError::MissingHash {
            path: inventory.path.clone(),
        })?;
        let inventory_key = location.object_key(&inventory.path)?;
        let raw_inventory = self.fetch_document(location, &inventory_key, cancel).await?;
        let inventory_hash = hash_bytes(DEFAULT_HASH_ALGORITHM, &raw_inventory);
        if !inventory_hash.matches_declared(declared) {
            return Err(LoadError::HashMismatch {
                path: inventory.path.clone(),
                expected: declared.to_string(),
                actual: inventory_hash.value,
            });
        }

        let file_index = build_file_index(&raw_inventory)?;
        if file_index.len() > self.limits.max_artifacts {
            return Err(LoadError::TooManyArtifacts {
                count: file_index.len(),
                max: self.limits.max_artifacts,
            });
        }
        self.emit(
            location,
            LoadEventDetail::InventoryVerified {
                inventory_hash: inventory_hash.value.clone(),
                indexed: file_index.len(),
            },
        );

        let fetcher = Fetcher::new(
            Arc::clone(&self.client),
            self.limits.fetch_workers,
            self.limits.max_artifact_bytes,
        );
        let mut report = fetcher.fetch_all(location, &file_index, cancel).await;
        for failure in &report.failures {
            self.emit(
                location,
                LoadEventDetail::ArtifactSkipped {
                    path: failure.path.clone(),
                    reason: failure.reason.to_string(),
                },
            );
        }
        if report.cancelled || cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        let bundle = Bundle::new(BundleParts {
            release: Some(manifest),
            raw_manifest,
            raw_inventory,
            inventory_hash,
            file_index,
            files: std::mem::take(&mut report.files),
            location: location.to_bundle_location(),
            loaded_at: OffsetDateTime::now_utc(),
        });
        Ok((bundle, report))
    }

    /// Fetches a manifest-class document under the manifest size ceiling.
    async fn fetch_document(
        &self,
        location: &ReleaseLocation,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<Bytes, LoadError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(LoadError::Cancelled),
            result = self.client.get_object(location.bucket(), key, self.limits.max_manifest_bytes) => {
                result.map_err(|source| LoadError::Fetch {
                    bucket: location.bucket().to_string(),
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    /// Records one load event.
    fn emit(&self, location: &ReleaseLocation, detail: LoadEventDetail) {
        self.events.record(&LoadEvent::new(location, detail));
    }
}
