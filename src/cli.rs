//! Command-line interface components.

use crate::config::{
    CompressionAlgorithm, DateWindow, ErrorPolicy, EtlConfig, OutputFormat,
    SnapshotConflictPolicy,
};
use crate::constants::MAX_CONCURRENT_EXTRACTS;
use crate::error::{EtlError, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output table format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Parquet,
}

/// Parquet compression algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompressionArg {
    Snappy,
    Zstd,
    Lz4,
    #[value(name = "none")]
    Uncompressed,
}

/// Build the flight fact table from raw per-airport extracts
#[derive(Parser, Debug, Clone)]
#[command(name = "flight_facts")]
#[command(about = "Build a flight-arrival fact table and time dimension delta from raw delay extracts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Directory containing the raw extracts (*.csv)
    #[arg(value_name = "EXTRACT_DIR")]
    pub extract_dir: PathBuf,

    /// Time dimension snapshot (TIME_ID/ID, year, month, day, hour, minute)
    ///
    /// Without a snapshot the run starts from an empty time dimension.
    #[arg(long = "time-dim", value_name = "FILE")]
    pub time_dim: Option<PathBuf>,

    /// Output directory for flights and new_times files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// First scheduled-arrival date kept (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub window_start: Option<NaiveDate>,

    /// Last scheduled-arrival date kept (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub window_end: Option<NaiveDate>,

    /// Abort the run on the first failing extract instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Fail when the snapshot holds one time key under different ids
    #[arg(long)]
    pub reject_snapshot_conflicts: bool,

    /// Output table format
    #[arg(long, value_enum, default_value = "csv")]
    pub format: FormatArg,

    /// Parquet compression algorithm
    #[arg(long, value_enum, default_value = "snappy")]
    pub compression: CompressionArg,

    /// Extracts normalized concurrently
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Process and report without writing any output
    #[arg(long)]
    pub dry_run: bool,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Determine the log level from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Build the run configuration from the arguments
    pub fn to_config(&self) -> Result<EtlConfig> {
        let default_window = DateWindow::default();
        let window = DateWindow::new(
            self.window_start.unwrap_or(default_window.start),
            self.window_end.unwrap_or(default_window.end),
        )?;

        if let Some(jobs) = self.jobs {
            if jobs == 0 || jobs > MAX_CONCURRENT_EXTRACTS {
                return Err(EtlError::configuration(format!(
                    "--jobs must be between 1 and {}",
                    MAX_CONCURRENT_EXTRACTS
                )));
            }
        }

        let mut config = EtlConfig::default()
            .with_date_window(window)
            .with_output_format(match self.format {
                FormatArg::Csv => OutputFormat::Csv,
                FormatArg::Parquet => OutputFormat::Parquet,
            })
            .with_compression(match self.compression {
                CompressionArg::Snappy => CompressionAlgorithm::Snappy,
                CompressionArg::Zstd => CompressionAlgorithm::Zstd,
                CompressionArg::Lz4 => CompressionAlgorithm::Lz4,
                CompressionArg::Uncompressed => CompressionAlgorithm::Uncompressed,
            });

        if self.strict {
            config = config.with_error_policy(ErrorPolicy::AbortRun);
        }
        if self.reject_snapshot_conflicts {
            config = config.with_snapshot_conflicts(SnapshotConflictPolicy::Reject);
        }
        if let Some(jobs) = self.jobs {
            config = config.with_max_concurrent_extracts(jobs);
        }
        if self.dry_run {
            config = config.with_dry_run();
        }
        if self.quiet {
            config = config.without_progress();
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", value, e))
}
