//! Configuration management and validation.
//!
//! Provides the run configuration: the scheduled-arrival date window,
//! failure and snapshot conflict policies, output format settings and
//! concurrency limits for extract normalization.

use crate::constants::{DEFAULT_WINDOW_END, DEFAULT_WINDOW_START, MAX_CONCURRENT_EXTRACTS};
use crate::error::{EtlError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inclusive window on the scheduled-arrival date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EtlError::configuration(format!(
                "date window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Whether the timestamp's calendar date falls inside the window
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let date = timestamp.date();
        date >= self.start && date <= self.end
    }
}

impl Default for DateWindow {
    fn default() -> Self {
        let (sy, sm, sd) = DEFAULT_WINDOW_START;
        let (ey, em, ed) = DEFAULT_WINDOW_END;
        Self {
            start: NaiveDate::from_ymd_opt(sy, sm, sd).expect("default window start is a valid date"),
            end: NaiveDate::from_ymd_opt(ey, em, ed).expect("default window end is a valid date"),
        }
    }
}

/// What to do when a single extract fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Log the failure, record the extract as skipped and continue
    #[default]
    SkipExtract,
    /// Stop the whole run on the first failing extract
    AbortRun,
}

/// How snapshot rows sharing a time key but carrying different ids are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapshotConflictPolicy {
    /// Keep the first row, drop later ones with a warning
    #[default]
    KeepFirst,
    /// Fail the snapshot load
    Reject,
}

/// Output table format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    #[default]
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

/// Global configuration for a fact assembly run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Scheduled-arrival dates kept by the normalizer
    pub date_window: DateWindow,

    /// Failure handling at the extract boundary
    pub error_policy: ErrorPolicy,

    /// Handling of conflicting duplicate rows in the dimension snapshot
    pub snapshot_conflicts: SnapshotConflictPolicy,

    /// Maximum extracts normalized concurrently (resolution stays sequential)
    pub max_concurrent_extracts: usize,

    /// Output table format
    pub output_format: OutputFormat,

    /// Parquet compression, ignored for CSV output
    pub compression: CompressionAlgorithm,

    /// Show progress bars
    pub show_progress: bool,

    /// Process and report without writing outputs
    pub dry_run: bool,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            date_window: DateWindow::default(),
            error_policy: ErrorPolicy::default(),
            snapshot_conflicts: SnapshotConflictPolicy::default(),
            max_concurrent_extracts: num_cpus::get().clamp(1, MAX_CONCURRENT_EXTRACTS),
            output_format: OutputFormat::default(),
            compression: CompressionAlgorithm::default(),
            show_progress: true,
            dry_run: false,
        }
    }
}

impl EtlConfig {
    /// Set the scheduled-arrival date window
    pub fn with_date_window(mut self, date_window: DateWindow) -> Self {
        self.date_window = date_window;
        self
    }

    /// Set the extract failure policy
    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    /// Set the snapshot conflict policy
    pub fn with_snapshot_conflicts(mut self, policy: SnapshotConflictPolicy) -> Self {
        self.snapshot_conflicts = policy;
        self
    }

    /// Set maximum concurrently normalized extracts
    pub fn with_max_concurrent_extracts(mut self, max_extracts: usize) -> Self {
        self.max_concurrent_extracts = max_extracts;
        self
    }

    /// Set the output format
    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    /// Set parquet compression
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Disable progress bars
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Enable dry run mode
    pub fn with_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Check the configuration for inconsistent settings
    pub fn validate(&self) -> Result<()> {
        if self.date_window.start > self.date_window.end {
            return Err(EtlError::configuration(format!(
                "date window start {} is after end {}",
                self.date_window.start, self.date_window.end
            )));
        }

        if self.max_concurrent_extracts == 0 {
            return Err(EtlError::configuration(
                "max_concurrent_extracts must be at least 1",
            ));
        }

        debug!(
            "Configuration validated: window {}..={}, policy {:?}, {} concurrent extracts",
            self.date_window.start,
            self.date_window.end,
            self.error_policy,
            self.max_concurrent_extracts
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_window() {
        let window = DateWindow::default();
        assert_eq!(window.start, date(2005, 9, 1));
        assert_eq!(window.end, date(2006, 5, 31));
    }

    #[test]
    fn test_window_is_inclusive_on_dates() {
        let window = DateWindow::default();
        let at = |y, m, d, h, min| date(y, m, d).and_hms_opt(h, min, 0).unwrap();

        assert!(!window.contains(&at(2005, 8, 31, 23, 59)));
        assert!(window.contains(&at(2005, 9, 1, 0, 0)));
        assert!(window.contains(&at(2006, 5, 31, 23, 59)));
        assert!(!window.contains(&at(2006, 6, 1, 0, 0)));
    }

    #[test]
    fn test_inverted_window_rejected() {
        assert!(DateWindow::new(date(2006, 1, 1), date(2005, 1, 1)).is_err());
    }

    #[test]
    fn test_builders_and_validation() {
        let config = EtlConfig::default()
            .with_error_policy(ErrorPolicy::AbortRun)
            .with_output_format(OutputFormat::Parquet)
            .with_max_concurrent_extracts(2)
            .without_progress();

        assert_eq!(config.error_policy, ErrorPolicy::AbortRun);
        assert_eq!(config.output_format.extension(), "parquet");
        assert!(!config.show_progress);
        assert!(config.validate().is_ok());

        let invalid = EtlConfig::default().with_max_concurrent_extracts(0);
        assert!(matches!(
            invalid.validate(),
            Err(EtlError::Configuration { .. })
        ));
    }
}
