// crates/release-evidence-loader/src/object_store/tests.rs
// ============================================================================
// Module: Evidence Object Storage Tests
// Description: Unit tests for key validation and the in-memory store.
// Purpose: Ensure keys are validated and size caps never truncate.
// Dependencies: release-evidence-loader, tokio
// ============================================================================

//! ## Overview
//! Covers prefix normalization, key validation, and the in-memory client's
//! listing and size-cap behavior.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::use_debug,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use super::*;

#[test]
fn normalize_prefix_accepts_relative_prefixes() {
    assert_eq!(normalize_prefix("").unwrap(), "");
    assert_eq!(normalize_prefix("  ").unwrap(), "");
    assert_eq!(normalize_prefix("releases").unwrap(), "releases/");
    assert_eq!(normalize_prefix("releases/evidence/").unwrap(), "releases/evidence/");
}

#[test]
fn normalize_prefix_rejects_absolute_and_traversal() {
    assert!(matches!(normalize_prefix("/releases"), Err(ObjectStoreError::Invalid(_))));
    assert!(matches!(normalize_prefix("a/../b"), Err(ObjectStoreError::Invalid(_))));
    assert!(matches!(normalize_prefix("a\\b"), Err(ObjectStoreError::Invalid(_))));
}

#[test]
fn relative_path_validation_rejects_unsafe_keys() {
    for key in ["", "/abs", "a//b", "a/./b", "../x", "a/..", "a\\b", "a/\u{0}"] {
        assert!(validate_relative_path(key).is_err(), "{key:?} should be rejected");
    }
    assert!(validate_relative_path(&"a".repeat(256)).is_err());
    assert!(validate_relative_path(&"a/".repeat(2100)).is_err());
    validate_relative_path("releases/r1/evidence/sbom.spdx.json").unwrap();
}

#[tokio::test]
async fn memory_store_reads_within_cap_and_rejects_above() {
    let store = MemoryObjectStore::new();
    store.put("bucket", "a/b.json", b"12345".as_slice()).unwrap();

    let bytes = store.get_object("bucket", "a/b.json", 5).await.unwrap();
    assert_eq!(bytes.as_ref(), b"12345");

    match store.get_object("bucket", "a/b.json", 4).await {
        Err(ObjectStoreError::TooLarge { max_bytes, actual_bytes, .. }) => {
            assert_eq!(max_bytes, 4);
            assert_eq!(actual_bytes, 5);
        }
        other => panic!("expected too large, got {other:?}"),
    }
}

#[tokio::test]
async fn memory_store_reports_missing_objects() {
    let store = MemoryObjectStore::new();
    store.put("bucket", "present.json", Bytes::from_static(b"{}")).unwrap();
    assert!(matches!(
        store.get_object("bucket", "absent.json", 10).await,
        Err(ObjectStoreError::NotFound(_))
    ));
    assert!(matches!(
        store.get_object("other", "present.json", 10).await,
        Err(ObjectStoreError::NotFound(_))
    ));
    assert!(store.remove("bucket", "present.json").unwrap());
    assert!(!store.remove("bucket", "present.json").unwrap());
}

#[tokio::test]
async fn memory_store_lists_by_prefix_with_cap() {
    let store = MemoryObjectStore::with_max_list_keys(2);
    store.put("bucket", "releases/r1/release.json", Bytes::new()).unwrap();
    store.put("bucket", "releases/r2/release.json", Bytes::new()).unwrap();
    store.put("bucket", "other/r3/release.json", Bytes::new()).unwrap();

    let keys = store.list_keys("bucket", "releases").await.unwrap();
    assert_eq!(keys, ["releases/r1/release.json", "releases/r2/release.json"]);
    assert!(store.list_keys("missing", "").await.unwrap().is_empty());
    assert!(matches!(
        store.list_keys("bucket", "").await,
        Err(ObjectStoreError::TooManyKeys { max_keys: 2, .. })
    ));
}

#[test]
fn memory_store_rejects_invalid_keys_on_put() {
    let store = MemoryObjectStore::new();
    assert!(matches!(
        store.put("bucket", "../escape", Bytes::new()),
        Err(ObjectStoreError::Invalid(_))
    ));
}
