// crates/release-evidence-loader/src/events/tests.rs
// ============================================================================
// Module: Load Event Tests
// Description: Unit tests for event serialization and sinks.
// Purpose: Ensure events serialize as labelled JSON lines.
// Dependencies: release-evidence-loader, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Checks the JSON shape of events and that the file sink appends lines.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::path::PathBuf;

use serde_json::Value;

use super::*;

fn location() -> ReleaseLocation {
    ReleaseLocation::new("evidence", "releases", "r1").unwrap()
}

#[test]
fn events_serialize_with_label_and_context() {
    let event = LoadEvent::new(
        &location(),
        LoadEventDetail::ArtifactSkipped {
            path: "sbom.json".to_string(),
            reason: "hash mismatch".to_string(),
        },
    );
    assert_eq!(event.name(), "artifact_skipped");
    let value: Value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["event"], "artifact_skipped");
    assert_eq!(value["bucket"], "evidence");
    assert_eq!(value["release_id"], "r1");
    assert_eq!(value["path"], "sbom.json");
    assert!(value["timestamp_ms"].as_u64().unwrap() > 0);

    let started: Value =
        serde_json::to_value(LoadEvent::new(&location(), LoadEventDetail::LoadStarted)).unwrap();
    assert_eq!(started["event"], "load_started");
}

#[test]
fn file_sink_appends_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let sink = FileLoadEventSink::new(&path).unwrap();
    sink.record(&LoadEvent::new(&location(), LoadEventDetail::LoadStarted));
    sink.record(&LoadEvent::new(
        &location(),
        LoadEventDetail::LoadFailed {
            error_kind: "timeout",
            message: "load timed out".to_string(),
            elapsed_ms: 5,
        },
    ));

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<Value> =
        content.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], "load_started");
    assert_eq!(lines[1]["event"], "load_failed");
    assert_eq!(lines[1]["error_kind"], "timeout");
}

#[test]
fn sink_selection_follows_config() {
    let dir = tempfile::tempdir().unwrap();
    let file = LoggingConfig {
        sink: LogSinkKind::File,
        path: Some(dir.path().join("load.jsonl")),
    };
    sink_from_config(&file).unwrap().record(&LoadEvent::new(&location(), LoadEventDetail::LoadStarted));
    assert!(dir.path().join("load.jsonl").exists());

    let none = LoggingConfig {
        sink: LogSinkKind::None,
        path: None,
    };
    assert!(sink_from_config(&none).is_ok());

    let missing = LoggingConfig {
        sink: LogSinkKind::File,
        path: None::<PathBuf>,
    };
    assert!(sink_from_config(&missing).is_err());
}
