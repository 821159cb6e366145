//! Error handling pipeline tests

use super::fixtures::{data_lines, write_extract, write_snapshot};
use crate::config::{EtlConfig, ErrorPolicy, SnapshotConflictPolicy};
use crate::error::EtlError;
use crate::processor::FlightFactProcessor;
use std::fs;
use tempfile::TempDir;

fn quiet() -> EtlConfig {
    EtlConfig::default().without_progress()
}

fn write_mixed_extracts(raw: &std::path::Path) {
    write_extract(
        raw,
        "ATL.csv",
        "ATL",
        &["DL,03/15/2006,1,N1,BOS,10:30,10:35,5,0,0,5,0,0"],
    );
    // Non-integer delay on a kept row
    write_extract(
        raw,
        "BOS.csv",
        "BOS",
        &[
            "DL,03/15/2006,2,N2,ATL,11:30,11:35,5,0,0,5,0,0",
            "DL,03/15/2006,3,N3,ATL,12:30,12:35,five,0,0,5,0,0",
        ],
    );
    write_extract(
        raw,
        "ORD.csv",
        "ORD",
        &["DL,03/15/2006,4,N4,ATL,13:30,13:35,5,0,0,5,0,0"],
    );
}

#[tokio::test]
async fn test_failing_extract_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let raw = temp_dir.path().join("raw");
    let out = temp_dir.path().join("out");
    write_mixed_extracts(&raw);

    let stats = FlightFactProcessor::new(raw.clone(), Some(out.clone()))
        .with_config(quiet())
        .process()
        .await
        .unwrap();

    assert_eq!(stats.extracts_processed, 2);
    assert_eq!(stats.skipped.len(), 1);
    assert_eq!(stats.skipped[0].path, raw.join("BOS.csv"));
    assert!(stats.skipped[0].reason.contains("Arrival Delay (Minutes)"));

    // No partial rows from the failed extract
    let flights = data_lines(&out.join("flights.csv"));
    assert_eq!(flights.len(), 2);
    assert!(flights.iter().all(|line| !line.contains(",BOS,5")));
}

#[tokio::test]
async fn test_failing_extract_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let raw = temp_dir.path().join("raw");
    let out = temp_dir.path().join("out");
    write_mixed_extracts(&raw);

    let result = FlightFactProcessor::new(raw, Some(out.clone()))
        .with_config(quiet().with_error_policy(ErrorPolicy::AbortRun))
        .process()
        .await;

    assert!(matches!(result, Err(EtlError::MalformedRecord { line: 7, .. })));
    assert!(!out.join("flights.csv").exists());
}

#[tokio::test]
async fn test_bad_destination_line_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let raw = temp_dir.path().join("raw");
    let out = temp_dir.path().join("out");
    fs::create_dir_all(&raw).unwrap();
    fs::write(
        raw.join("bad.csv"),
        "Detailed Statistics\nDestination Airport: nowhere\n\n\nCarrier Code\n",
    )
    .unwrap();

    let stats = FlightFactProcessor::new(raw, Some(out))
        .with_config(quiet())
        .process()
        .await
        .unwrap();

    assert_eq!(stats.skipped.len(), 1);
    assert!(stats.skipped[0].reason.contains("destination"));
}

#[tokio::test]
async fn test_missing_extract_directory() {
    let temp_dir = TempDir::new().unwrap();
    let raw = temp_dir.path().join("missing");

    let result = FlightFactProcessor::new(raw.clone(), None)
        .with_config(quiet())
        .process()
        .await;

    match result {
        Err(EtlError::ExtractDirNotFound { path }) => assert_eq!(path, raw),
        other => panic!("Expected ExtractDirNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_snapshot_errors_are_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let raw = temp_dir.path().join("raw");
    write_extract(
        &raw,
        "ATL.csv",
        "ATL",
        &["DL,03/15/2006,1,N1,BOS,10:30,10:35,5,0,0,5,0,0"],
    );
    let snapshot = write_snapshot(
        temp_dir.path(),
        &["1,2006,march,15,10,30", "2,2006,march,15,10,30"],
    );

    let config = quiet().with_snapshot_conflicts(SnapshotConflictPolicy::Reject);
    let result = FlightFactProcessor::new(raw, Some(temp_dir.path().join("out")))
        .with_snapshot(snapshot)
        .with_config(config)
        .process()
        .await;

    assert!(matches!(result, Err(EtlError::DataIntegrity { .. })));
}
