//! Time dimension snapshot loading
//!
//! Reads the warehouse export of the time dimension (id, year, month name,
//! day, hour, minute) and converts it into canonical rows with ordinal
//! months before handing them to [`TimeDimensionStore::load`].

use super::{LoadStats, TimeDimensionStore};
use crate::codec::TimeKeyCodec;
use crate::config::SnapshotConflictPolicy;
use crate::constants::time_columns;
use crate::error::{EtlError, Result};
use crate::models::{TimeDimensionRow, TimeId, TimeKey};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Load the time dimension snapshot from a CSV export
pub fn load_snapshot(
    path: &Path,
    policy: SnapshotConflictPolicy,
) -> Result<(TimeDimensionStore, LoadStats)> {
    if !path.exists() {
        return Err(EtlError::SnapshotNotFound {
            path: path.to_path_buf(),
        });
    }

    info!("Loading time dimension snapshot: {}", path.display());

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let rows = snapshot_rows(path, &df)?;
    debug!("Read {} snapshot rows from {}", rows.len(), path.display());

    TimeDimensionStore::load(rows, policy)
}

/// Convert an all-string snapshot frame into dimension rows
pub fn snapshot_rows(path: &Path, df: &DataFrame) -> Result<Vec<TimeDimensionRow>> {
    let id_name = if has_column(df, time_columns::TIME_ID) {
        time_columns::TIME_ID
    } else {
        time_columns::ID_ALIAS
    };

    let ids = string_column(path, df, id_name)?;
    let years = string_column(path, df, time_columns::YEAR)?;
    let months = string_column(path, df, time_columns::MONTH)?;
    let days = string_column(path, df, time_columns::DAY)?;
    let hours = string_column(path, df, time_columns::HOUR)?;
    let minutes = string_column(path, df, time_columns::MINUTE)?;

    let mut rows = Vec::with_capacity(df.height());
    for index in 0..df.height() {
        // Header is line 1
        let line = index + 2;

        let id: TimeId = parse_field(path, line, id_name, ids[index])?;
        let year: i32 = parse_field(path, line, time_columns::YEAR, years[index])?;
        let month_text = required(path, line, time_columns::MONTH, months[index])?;
        let month = TimeKeyCodec::month_ordinal(month_text)?;
        let day: u8 = parse_field(path, line, time_columns::DAY, days[index])?;
        let hour: u8 = parse_field(path, line, time_columns::HOUR, hours[index])?;
        let minute: u8 = parse_field(path, line, time_columns::MINUTE, minutes[index])?;

        let key = TimeKey::new(year, month, day, hour, minute).map_err(|e| {
            EtlError::data_integrity(format!("snapshot line {} of {}: {}", line, path.display(), e))
        })?;
        rows.push(TimeDimensionRow { id, key });
    }

    Ok(rows)
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_columns()
        .iter()
        .any(|column| column.name().as_str().trim() == name)
}

fn string_column<'a>(path: &Path, df: &'a DataFrame, name: &str) -> Result<Vec<Option<&'a str>>> {
    let column = df
        .get_columns()
        .iter()
        .find(|column| column.name().as_str().trim() == name)
        .ok_or_else(|| {
            EtlError::source_parse(path, format!("snapshot is missing column '{}'", name))
        })?;

    Ok(column.str()?.into_iter().collect())
}

fn required<'a>(path: &Path, line: usize, column: &str, value: Option<&'a str>) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| EtlError::malformed_record(path, line, column, "value is missing"))
}

fn parse_field<T: std::str::FromStr>(
    path: &Path,
    line: usize,
    column: &str,
    value: Option<&str>,
) -> Result<T> {
    let value = required(path, line, column, value)?;
    value.parse::<T>().map_err(|_| {
        EtlError::malformed_record(path, line, column, format!("'{}' is not a valid integer", value))
    })
}
