//! End-to-end pipeline tests

use super::fixtures::{data_lines, write_extract, write_snapshot};
use crate::config::{EtlConfig, OutputFormat};
use crate::processor::FlightFactProcessor;
use tempfile::TempDir;

fn quiet() -> EtlConfig {
    EtlConfig::default().without_progress()
}

#[tokio::test]
async fn test_empty_store_single_extract() {
    let temp_dir = TempDir::new().unwrap();
    let raw = temp_dir.path().join("raw");
    let out = temp_dir.path().join("out");
    write_extract(
        &raw,
        "ATL.csv",
        "ATL",
        &[
            "DL,03/15/2006,100,N100DL,JFK,10:30,10:40,10,0,0,10,0,0",
            "DL,03/15/2006,200,N200DL,BOS,10:30,10:45,15,0,0,15,0,0",
        ],
    );

    let stats = FlightFactProcessor::new(raw, Some(out.clone()))
        .with_config(quiet())
        .process()
        .await
        .unwrap();

    assert_eq!(stats.extracts_processed, 1);
    assert_eq!(stats.fact_rows, 2);
    assert_eq!(stats.new_time_rows, 3);
    assert_eq!(stats.snapshot_rows, 0);

    assert_eq!(
        data_lines(&out.join("flights.csv")),
        vec![
            "DL,100,N100DL,JFK,ATL,10,0,0,10,0,0,1,2",
            "DL,200,N200DL,BOS,ATL,15,0,0,15,0,0,1,3",
        ]
    );
    assert_eq!(
        data_lines(&out.join("new_times.csv")),
        vec![
            "1,2006,march,15,10,30",
            "2,2006,march,15,10,40",
            "3,2006,march,15,10,45",
        ]
    );
}

#[tokio::test]
async fn test_snapshot_ids_are_reused_and_extended() {
    let temp_dir = TempDir::new().unwrap();
    let raw = temp_dir.path().join("raw");
    let out = temp_dir.path().join("out");
    let snapshot = write_snapshot(
        temp_dir.path(),
        &["40,2006,March ,15,10,30", "41,2006,march,15,10,30"],
    );
    write_extract(
        &raw,
        "ATL.csv",
        "ATL",
        &["DL,03/15/2006,100,N100DL,JFK,10:30,10:40,10,0,0,10,0,0"],
    );

    let stats = FlightFactProcessor::new(raw, Some(out.clone()))
        .with_snapshot(snapshot)
        .with_config(quiet())
        .process()
        .await
        .unwrap();

    assert_eq!(stats.snapshot_rows, 1);
    assert_eq!(stats.snapshot_duplicates_dropped, 1);
    assert_eq!(
        data_lines(&out.join("flights.csv")),
        vec!["DL,100,N100DL,JFK,ATL,10,0,0,10,0,0,40,42"]
    );
    assert_eq!(
        data_lines(&out.join("new_times.csv")),
        vec!["42,2006,march,15,10,40"]
    );
}

#[tokio::test]
async fn test_cancelled_flight_output() {
    let temp_dir = TempDir::new().unwrap();
    let raw = temp_dir.path().join("raw");
    let out = temp_dir.path().join("out");
    write_extract(
        &raw,
        "ORD.csv",
        "ORD",
        &[
            "UA,12/24/2005,900,,DEN,24:00,,0,0,0,0,0,0",
            "UA,12/24/2005,901,N901UA,DEN,23:00,24:00,59,0,59,0,0,0",
        ],
    );

    let stats = FlightFactProcessor::new(raw, Some(out.clone()))
        .with_config(quiet())
        .process()
        .await
        .unwrap();

    assert_eq!(stats.cancelled_flights, 1);
    assert_eq!(
        data_lines(&out.join("flights.csv")),
        vec![
            "UA,900,CANCELED,DEN,ORD,0,0,0,0,0,0,1,",
            "UA,901,N901UA,DEN,ORD,59,0,59,0,0,0,2,1",
        ]
    );
    // 24:00 and 23:59 share a key, so only two rows are allocated
    assert_eq!(
        data_lines(&out.join("new_times.csv")),
        vec!["1,2005,december,24,23,59", "2,2005,december,24,23,00"]
    );
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let raw = temp_dir.path().join("raw");
    let out = temp_dir.path().join("out");
    write_extract(
        &raw,
        "ATL.csv",
        "ATL",
        &["DL,03/15/2006,100,N100DL,JFK,10:30,10:40,10,0,0,10,0,0"],
    );

    let stats = FlightFactProcessor::new(raw, Some(out.clone()))
        .with_config(quiet().with_dry_run())
        .process()
        .await
        .unwrap();

    assert_eq!(stats.fact_rows, 1);
    assert!(stats.output_paths.is_empty());
    assert!(!out.exists());
}

#[tokio::test]
async fn test_parquet_output() {
    let temp_dir = TempDir::new().unwrap();
    let raw = temp_dir.path().join("raw");
    let out = temp_dir.path().join("out");
    write_extract(
        &raw,
        "ATL.csv",
        "ATL",
        &["DL,03/15/2006,100,N100DL,JFK,10:30,10:40,10,0,0,10,0,0"],
    );

    let stats = FlightFactProcessor::new(raw, Some(out.clone()))
        .with_config(quiet().with_output_format(OutputFormat::Parquet))
        .process()
        .await
        .unwrap();

    assert_eq!(
        stats.output_paths,
        vec![out.join("flights.parquet"), out.join("new_times.parquet")]
    );
    assert!(out.join("flights.parquet").exists());
}
