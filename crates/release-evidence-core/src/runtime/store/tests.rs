// crates/release-evidence-core/src/runtime/store/tests.rs
// ============================================================================
// Module: Bundle Store Tests
// Description: Unit tests for atomic bundle publication and reads.
// Purpose: Validate empty-store behavior, supersession, and concurrent reads.
// Dependencies: release-evidence-core
// ============================================================================

//! ## Overview
//! Publishes fixture bundles into a [`BundleStore`] and checks every read
//! path, including readers racing a publisher.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::use_debug,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::thread;

use super::*;
use crate::core::BundleParts;
use crate::core::EvidenceFiles;
use crate::core::EvidenceKind;
use crate::tests::sample_bundle;

/// Rebuilds the fixture bundle keeping only the files selected by `keep`.
fn bundle_with_files(release_id: &str, keep: impl Fn(&str) -> bool) -> Bundle {
    let source = sample_bundle();
    let files: EvidenceFiles = source
        .files()
        .iter()
        .filter(|(path, _)| keep(path))
        .map(|(path, file)| (path.clone(), file.clone()))
        .collect();
    let mut location = source.location().clone();
    location.release_id = release_id.to_string();
    Bundle::new(BundleParts {
        release: source.release().cloned(),
        raw_manifest: source.raw_manifest().clone(),
        raw_inventory: source.raw_inventory().clone(),
        inventory_hash: source.inventory_hash().clone(),
        file_index: source.file_index().clone(),
        files,
        location,
        loaded_at: source.loaded_at(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn empty_store_reports_nothing() {
    let store = BundleStore::new();
    assert!(store.get().is_none());
    assert!(store.file("source/sbom.json").is_none());
    assert!(store.file_ref("source/sbom.json").is_none());
    assert_eq!(store.lookup("source/sbom.json"), StoredFile::Unknown);
    assert!(store.list_file_refs(None, None).is_empty());
    assert!(store.summary().is_none());
    assert!(!store.has_evidence());
    assert!(store.get_for_platform("linux/amd64").is_none());
}

#[test]
fn set_supersedes_previous_bundle() {
    let store = BundleStore::new();
    let first = Arc::new(bundle_with_files("rel-1", |_| true));
    let second = Arc::new(bundle_with_files("rel-2", |_| true));

    store.set(Arc::clone(&first));
    let held = store.get().unwrap();
    assert!(Arc::ptr_eq(&held, &first));

    store.set(Arc::clone(&second));
    assert!(Arc::ptr_eq(&store.get().unwrap(), &second));
    assert_eq!(held.location().release_id, "rel-1", "earlier readers keep their bundle");
    assert_eq!(store.summary().unwrap().release_id, "rel-2");
}

#[test]
fn lookup_distinguishes_unavailable_from_unknown() {
    let store = BundleStore::new();
    store.set(Arc::new(bundle_with_files("rel-1", |path| path != "amd64/scan.json")));

    match store.lookup("source/sbom.json") {
        StoredFile::Verified(file) => assert_eq!(file.bytes.as_ref(), b"source/sbom.json"),
        other => panic!("expected verified file, got {other:?}"),
    }
    match store.lookup("amd64/scan.json") {
        StoredFile::Unavailable(reference) => assert_eq!(reference.platform, "linux/amd64"),
        other => panic!("expected unavailable file, got {other:?}"),
    }
    assert_eq!(store.lookup("nope.json"), StoredFile::Unknown);

    assert!(store.file("amd64/scan.json").is_none());
    assert!(store.file_ref("amd64/scan.json").is_some());
}

#[test]
fn has_evidence_requires_a_verified_file() {
    let store = BundleStore::new();
    store.set(Arc::new(bundle_with_files("rel-1", |_| false)));
    assert!(store.get().is_some());
    assert!(!store.has_evidence());

    store.set(Arc::new(bundle_with_files("rel-1", |path| path == "arm64/scan.sig")));
    assert!(store.has_evidence());
}

#[test]
fn list_file_refs_filters_and_sorts() {
    let store = BundleStore::new();
    store.set(Arc::new(sample_bundle()));

    let all = store.list_file_refs(None, None);
    let paths: Vec<&str> = all.iter().map(|reference| reference.path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "amd64/scan.json",
            "amd64/scan.sig",
            "arm64/scan.json",
            "arm64/scan.sig",
            "source/sbom.json",
            "source/sbom.sig"
        ]
    );

    let source = store.list_file_refs(Some(EvidenceScope::Source), None);
    assert_eq!(source.len(), 2);
    let scans = store.list_file_refs(Some(EvidenceScope::Artifact), Some(EvidenceCategory::Scan));
    assert_eq!(scans.len(), 4);
    assert!(store.list_file_refs(None, Some(EvidenceCategory::License)).is_empty());
}

#[test]
fn summary_counts_by_dimension() {
    let store = BundleStore::new();
    store.set(Arc::new(bundle_with_files("rel-1", |path| path.starts_with("source/"))));

    let summary = store.summary().unwrap();
    assert_eq!(summary.indexed, 6);
    assert_eq!(summary.verified, 2);
    assert_eq!(summary.by_scope[&EvidenceScope::Source], 2);
    assert_eq!(summary.by_scope[&EvidenceScope::Artifact], 4);
    assert_eq!(summary.by_category[&EvidenceCategory::Sbom], 2);
    assert_eq!(summary.by_category[&EvidenceCategory::Scan], 4);
    assert_eq!(summary.by_kind[&EvidenceKind::Report], 3);
    assert_eq!(summary.by_kind[&EvidenceKind::Attestation], 3);
    assert_eq!(summary.platform_scope, None);
}

#[test]
fn get_for_platform_scopes_the_published_bundle() {
    let store = BundleStore::new();
    store.set(Arc::new(sample_bundle()));

    let scoped = store.get_for_platform("linux/arm64").unwrap();
    assert_eq!(scoped.file_index().len(), 4);
    assert_eq!(scoped.summary().platform_scope.as_deref(), Some("linux/arm64"));
    assert_eq!(store.get().unwrap().file_index().len(), 6);

    let unscoped = store.get_for_platform("").unwrap();
    assert!(Arc::ptr_eq(&unscoped, &store.get().unwrap()));
}

#[test]
fn concurrent_readers_see_whole_bundles() {
    let store = Arc::new(BundleStore::new());
    store.set(Arc::new(bundle_with_files("rel-0", |_| true)));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..500 {
                    let bundle = store.get().unwrap();
                    let id = bundle.location().release_id.clone();
                    assert_eq!(bundle.files().len(), 6, "bundle {id} observed partially");
                    assert_eq!(bundle.file_index().len(), 6);
                    assert!(store.has_evidence());
                }
            })
        })
        .collect();

    for round in 1..=50 {
        store.set(Arc::new(bundle_with_files(&format!("rel-{round}"), |_| true)));
    }
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(store.get().unwrap().location().release_id, "rel-50");
}
