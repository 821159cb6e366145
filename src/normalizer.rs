//! Raw extract normalization.
//!
//! Turns one raw per-airport extract into typed [`RawFlightRecord`]s:
//! the destination comes from the preamble, the record section is read
//! as an all-string frame, timestamps are parsed and filtered against the
//! configured date window, and numeric columns are cast to integers.

use crate::config::DateWindow;
use crate::constants::extract_columns as cols;
use crate::constants::layout::{
    COLUMN_HEADER_LINE, DATETIME_FORMAT, END_OF_DAY_REPLACEMENT, END_OF_DAY_TIME,
};
use crate::error::{EtlError, Result};
use crate::header::parse_extract_header;
use crate::models::{Arrival, DelayMinutes, RawFlightRecord, TimeKey};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Row counts for a single extract
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Data rows in the record section
    pub rows_read: usize,

    /// Rows dropped by the date window
    pub rows_outside_window: usize,

    /// Kept rows without a tail number
    pub cancelled: usize,
}

/// Records of one extract after normalization
#[derive(Debug, Clone)]
pub struct NormalizedExtract {
    pub path: PathBuf,
    pub destination: String,
    pub records: Vec<RawFlightRecord>,
    pub stats: ExtractStats,
}

/// Parses raw extracts into typed flight records
#[derive(Debug, Clone, Copy, Default)]
pub struct RawExtractNormalizer {
    window: DateWindow,
}

impl RawExtractNormalizer {
    pub fn new(window: DateWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    /// Read and normalize an extract from disk
    pub fn normalize_file(&self, path: &Path) -> Result<NormalizedExtract> {
        let content = std::fs::read_to_string(path)?;
        self.normalize_str(path, &content)
    }

    /// Normalize extract content that has already been read
    pub fn normalize_str(&self, path: &Path, content: &str) -> Result<NormalizedExtract> {
        let header = parse_extract_header(path, content)?;
        let section = &content[header.records_offset..];

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(section.as_bytes().to_vec()))
            .finish()?;

        let columns = RecordColumns::from_frame(path, &df)?;
        let mut stats = ExtractStats::default();
        let mut records = Vec::with_capacity(df.height());

        for index in 0..df.height() {
            if columns.is_blank(index) {
                continue;
            }
            stats.rows_read += 1;

            let row = RowContext {
                path,
                line: COLUMN_HEADER_LINE + 1 + index,
                columns: &columns,
                index,
            };

            let date = row.required(cols::DATE)?;
            let scheduled = row.timestamp(date, cols::SCHEDULED_ARRIVAL)?;
            if !self.window.contains(&scheduled) {
                stats.rows_outside_window += 1;
                continue;
            }

            let flight_number = row.integer(cols::FLIGHT_NUMBER)?;
            let delays = DelayMinutes {
                delay: row.integer(cols::DELAY)?,
                carrier: row.integer(cols::DELAY_CARRIER)?,
                weather: row.integer(cols::DELAY_WEATHER)?,
                nas: row.integer(cols::DELAY_NAS)?,
                security: row.integer(cols::DELAY_SECURITY)?,
                late_aircraft: row.integer(cols::DELAY_LATE_AIRCRAFT)?,
            };

            // Without a tail number the actual arrival column is never read
            let arrival = match row.optional(cols::TAIL_NUMBER) {
                None => {
                    stats.cancelled += 1;
                    Arrival::Cancelled
                }
                Some(tail_number) => {
                    let actual = row.timestamp(date, cols::ACTUAL_ARRIVAL)?;
                    Arrival::Landed {
                        tail_number: tail_number.to_string(),
                        actual_time: TimeKey::from_datetime(&actual),
                    }
                }
            };

            records.push(RawFlightRecord {
                carrier: row.optional(cols::CARRIER).unwrap_or_default().to_string(),
                flight_number,
                origin: row.optional(cols::ORIGIN).unwrap_or_default().to_string(),
                destination: header.destination.clone(),
                scheduled_time: TimeKey::from_datetime(&scheduled),
                arrival,
                delays,
            });
        }

        debug!(
            "Normalized {}: {} rows read, {} kept, {} outside window, {} cancelled",
            path.display(),
            stats.rows_read,
            records.len(),
            stats.rows_outside_window,
            stats.cancelled
        );

        Ok(NormalizedExtract {
            path: path.to_path_buf(),
            destination: header.destination,
            records,
            stats,
        })
    }
}

/// Required columns of the record section, looked up by trimmed name
struct RecordColumns<'a> {
    values: HashMap<&'static str, Vec<Option<&'a str>>>,
}

impl<'a> RecordColumns<'a> {
    fn from_frame(path: &Path, df: &'a DataFrame) -> Result<Self> {
        let mut values = HashMap::with_capacity(cols::REQUIRED.len());

        for &name in cols::REQUIRED {
            let column = df
                .get_columns()
                .iter()
                .find(|column| column.name().as_str().trim() == name)
                .ok_or_else(|| {
                    EtlError::source_parse(path, format!("missing required column '{}'", name))
                })?;
            values.insert(name, column.str()?.into_iter().collect());
        }

        Ok(Self { values })
    }

    fn get(&self, column: &str, index: usize) -> Option<&'a str> {
        self.values
            .get(column)
            .and_then(|values| values.get(index).copied().flatten())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Trailing empty lines come through as rows without any value
    fn is_blank(&self, index: usize) -> bool {
        cols::REQUIRED
            .iter()
            .all(|column| self.get(column, index).is_none())
    }
}

struct RowContext<'r, 'a> {
    path: &'r Path,
    line: usize,
    columns: &'r RecordColumns<'a>,
    index: usize,
}

impl<'a> RowContext<'_, 'a> {
    fn optional(&self, column: &str) -> Option<&'a str> {
        self.columns.get(column, self.index)
    }

    fn required(&self, column: &str) -> Result<&'a str> {
        self.optional(column)
            .ok_or_else(|| self.malformed(column, "value is missing"))
    }

    fn integer(&self, column: &str) -> Result<i64> {
        let value = self.required(column)?;
        value
            .parse::<i64>()
            .map_err(|_| self.malformed(column, format!("'{}' is not an integer", value)))
    }

    fn timestamp(&self, date: &str, column: &str) -> Result<NaiveDateTime> {
        let time = self.required(column)?;
        let time = if time == END_OF_DAY_TIME {
            END_OF_DAY_REPLACEMENT
        } else {
            time
        };

        NaiveDateTime::parse_from_str(&format!("{} {}", date, time), DATETIME_FORMAT).map_err(
            |e| self.malformed(column, format!("cannot parse '{} {}': {}", date, time, e)),
        )
    }

    fn malformed(&self, column: &str, reason: impl Into<String>) -> EtlError {
        EtlError::malformed_record(self.path, self.line, column, reason)
    }
}
