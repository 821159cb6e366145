//! Output writing module
//!
//! Converts the assembled fact rows and the time dimension delta into
//! polars DataFrames and writes them as CSV or Parquet files into the
//! output directory.

use crate::config::{CompressionAlgorithm, OutputFormat};
use crate::constants::{FACTS_FILE_STEM, NEW_TIMES_FILE_STEM, fact_columns, time_columns};
use crate::error::{EtlError, Result};
use crate::models::{FactRow, NewTimeRow};

use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Writes the fact table and the new time dimension rows
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
    format: OutputFormat,
    compression: CompressionAlgorithm,
}

impl OutputWriter {
    pub fn new(output_dir: PathBuf, format: OutputFormat, compression: CompressionAlgorithm) -> Self {
        Self {
            output_dir,
            format,
            compression,
        }
    }

    /// Path of the fact table output
    pub fn facts_path(&self) -> PathBuf {
        self.output_path(FACTS_FILE_STEM)
    }

    /// Path of the new time rows output
    pub fn new_times_path(&self) -> PathBuf {
        self.output_path(NEW_TIMES_FILE_STEM)
    }

    /// Write both outputs, returning their paths
    pub async fn write_all(
        &self,
        facts: &[FactRow],
        new_times: &[NewTimeRow],
    ) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let mut facts_df = facts_frame(facts)?;
        let facts_path = self.facts_path();
        self.write_frame(&mut facts_df, &facts_path)?;

        let mut new_times_df = new_times_frame(new_times)?;
        let new_times_path = self.new_times_path();
        self.write_frame(&mut new_times_df, &new_times_path)?;

        info!(
            "Wrote {} fact rows to {} and {} new time rows to {}",
            facts.len(),
            facts_path.display(),
            new_times.len(),
            new_times_path.display()
        );

        Ok(vec![facts_path, new_times_path])
    }

    fn output_path(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", stem, self.format.extension()))
    }

    fn write_frame(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        debug!(
            "Writing {} rows as {:?} to {}",
            df.height(),
            self.format,
            path.display()
        );

        let mut file = File::create(path)?;
        let written = match self.format {
            OutputFormat::Csv => CsvWriter::new(&mut file).include_header(true).finish(df),
            OutputFormat::Parquet => ParquetWriter::new(file)
                .with_compression(self.compression.to_polars_compression())
                .finish(df)
                .map(|_| ()),
        };

        written.map_err(|e| EtlError::ProcessingFailed {
            path: path.to_path_buf(),
            reason: format!("Failed to write output: {}", e),
        })
    }
}

/// Fact table as a DataFrame; cancelled flights carry a null actual id
pub fn facts_frame(facts: &[FactRow]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        text_column(fact_columns::CARRIER, facts, |r| r.carrier.clone()),
        int_column(fact_columns::FLIGHT_NUMBER, facts, |r| r.flight_number),
        text_column(fact_columns::TAIL_NUMBER, facts, |r| r.tail_number.clone()),
        text_column(fact_columns::ORIGIN, facts, |r| r.origin.clone()),
        text_column(fact_columns::DESTINATION, facts, |r| r.destination.clone()),
        int_column(fact_columns::DELAY, facts, |r| r.delays.delay),
        int_column(fact_columns::DELAY_CARRIER, facts, |r| r.delays.carrier),
        int_column(fact_columns::DELAY_WEATHER, facts, |r| r.delays.weather),
        int_column(fact_columns::DELAY_NAS, facts, |r| r.delays.nas),
        int_column(fact_columns::DELAY_SECURITY, facts, |r| r.delays.security),
        int_column(fact_columns::DELAY_LATE_AIRCRAFT, facts, |r| {
            r.delays.late_aircraft
        }),
        Column::new(
            fact_columns::SCHEDULED_TIME_ID.into(),
            facts.iter().map(|r| r.scheduled_time_id).collect::<Vec<u64>>(),
        ),
        Column::new(
            fact_columns::ACTUAL_TIME_ID.into(),
            facts.iter().map(|r| r.actual_time_id).collect::<Vec<Option<u64>>>(),
        ),
    ])?;

    Ok(df)
}

/// New time dimension rows as a DataFrame in warehouse format
pub fn new_times_frame(rows: &[NewTimeRow]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new(
            time_columns::TIME_ID.into(),
            rows.iter().map(|r| r.time_id).collect::<Vec<u64>>(),
        ),
        Column::new(
            time_columns::YEAR.into(),
            rows.iter().map(|r| r.year).collect::<Vec<i32>>(),
        ),
        text_column(time_columns::MONTH, rows, |r| r.month.clone()),
        text_column(time_columns::DAY, rows, |r| r.day.clone()),
        text_column(time_columns::HOUR, rows, |r| r.hour.clone()),
        text_column(time_columns::MINUTE, rows, |r| r.minute.clone()),
    ])?;

    Ok(df)
}

fn text_column<T>(name: &str, rows: &[T], value: impl Fn(&T) -> String) -> Column {
    Column::new(name.into(), rows.iter().map(value).collect::<Vec<String>>())
}

fn int_column<T>(name: &str, rows: &[T], value: impl Fn(&T) -> i64) -> Column {
    Column::new(name.into(), rows.iter().map(value).collect::<Vec<i64>>())
}
