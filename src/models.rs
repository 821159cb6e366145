//! Core data structures and types for fact assembly.
//!
//! Defines the time dimension key and rows, normalized flight records,
//! output rows and the processing statistics reported at run end.

use crate::codec::TimeKeyCodec;
use crate::constants::CANCELED_TAIL_NUMBER;
use crate::error::{EtlError, Result};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Surrogate key of a time dimension row
pub type TimeId = u64;

/// Minute-resolution point in time, the natural key of the time dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeKey {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl TimeKey {
    /// Create a key, validating each component's range
    pub fn new(year: i32, month: u8, day: u8, hour: u8, minute: u8) -> Result<Self> {
        let in_range = (1..=12).contains(&month)
            && (1..=31).contains(&day)
            && hour <= 23
            && minute <= 59;

        if !in_range {
            return Err(EtlError::data_integrity(format!(
                "time components out of range: {}-{}-{} {}:{}",
                year, month, day, hour, minute
            )));
        }

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
        })
    }

    /// Decompose a parsed timestamp into its key
    pub fn from_datetime(datetime: &NaiveDateTime) -> Self {
        Self {
            year: datetime.year(),
            month: datetime.month() as u8,
            day: datetime.day() as u8,
            hour: datetime.hour() as u8,
            minute: datetime.minute() as u8,
        }
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

/// One row of the time dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDimensionRow {
    pub id: TimeId,
    pub key: TimeKey,
}

/// Delay attribution in minutes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayMinutes {
    pub delay: i64,
    pub carrier: i64,
    pub weather: i64,
    pub nas: i64,
    pub security: i64,
    pub late_aircraft: i64,
}

/// Arrival outcome of a flight.
///
/// A flight either landed, in which case both the tail number and the
/// actual arrival time are known, or it was cancelled and neither is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arrival {
    Landed {
        tail_number: String,
        actual_time: TimeKey,
    },
    Cancelled,
}

/// A flight record after extract normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFlightRecord {
    pub carrier: String,
    pub flight_number: i64,
    pub origin: String,
    pub destination: String,
    pub scheduled_time: TimeKey,
    pub arrival: Arrival,
    pub delays: DelayMinutes,
}

impl RawFlightRecord {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.arrival, Arrival::Cancelled)
    }

    pub fn tail_number(&self) -> Option<&str> {
        match &self.arrival {
            Arrival::Landed { tail_number, .. } => Some(tail_number),
            Arrival::Cancelled => None,
        }
    }

    pub fn actual_time(&self) -> Option<TimeKey> {
        match &self.arrival {
            Arrival::Landed { actual_time, .. } => Some(*actual_time),
            Arrival::Cancelled => None,
        }
    }
}

/// One row of the output fact table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRow {
    pub carrier: String,
    pub flight_number: i64,
    pub tail_number: String,
    pub origin: String,
    pub destination: String,
    pub delays: DelayMinutes,
    pub scheduled_time_id: TimeId,
    pub actual_time_id: Option<TimeId>,
}

impl FactRow {
    /// Build a fact row from a normalized record and its resolved keys.
    ///
    /// The actual time id must be present exactly when the flight landed.
    pub fn from_record(
        record: RawFlightRecord,
        scheduled_time_id: TimeId,
        actual_time_id: Option<TimeId>,
    ) -> Result<Self> {
        let tail_number = match (record.arrival, actual_time_id) {
            (Arrival::Landed { tail_number, .. }, Some(_)) => tail_number,
            (Arrival::Cancelled, None) => CANCELED_TAIL_NUMBER.to_string(),
            (Arrival::Landed { .. }, None) => {
                return Err(EtlError::data_integrity(format!(
                    "flight {}{} landed but has no actual time id",
                    record.carrier, record.flight_number
                )));
            }
            (Arrival::Cancelled, Some(id)) => {
                return Err(EtlError::data_integrity(format!(
                    "flight {}{} is cancelled but was given actual time id {}",
                    record.carrier, record.flight_number, id
                )));
            }
        };

        Ok(Self {
            carrier: record.carrier,
            flight_number: record.flight_number,
            tail_number,
            origin: record.origin,
            destination: record.destination,
            delays: record.delays,
            scheduled_time_id,
            actual_time_id,
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.tail_number == CANCELED_TAIL_NUMBER
    }
}

/// A newly allocated time dimension row, rendered for persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTimeRow {
    pub time_id: TimeId,
    pub year: i32,
    pub month: String,
    pub day: String,
    pub hour: String,
    pub minute: String,
}

impl NewTimeRow {
    pub fn render(row: &TimeDimensionRow) -> Result<Self> {
        Ok(Self {
            time_id: row.id,
            year: row.key.year,
            month: TimeKeyCodec::month_name(row.key.month)?.to_string(),
            day: TimeKeyCodec::two_digit(row.key.day),
            hour: TimeKeyCodec::two_digit(row.key.hour),
            minute: TimeKeyCodec::two_digit(row.key.minute),
        })
    }
}

/// Extract that was skipped, with the reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedExtract {
    pub path: PathBuf,
    pub reason: String,
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub extracts_processed: usize,
    pub skipped: Vec<SkippedExtract>,
    pub rows_read: usize,
    pub rows_outside_window: usize,
    pub fact_rows: usize,
    pub cancelled_flights: usize,
    pub snapshot_rows: usize,
    pub snapshot_duplicates_dropped: usize,
    pub new_time_rows: usize,
    pub airports_referenced: usize,
    pub output_paths: Vec<PathBuf>,
    pub processing_time_ms: u128,
}
