//! Application constants for the flight fact builder
//!
//! This module contains the fixed month table, the raw extract layout,
//! column names on both the input and output side, and default values.

// =============================================================================
// Calendar
// =============================================================================

/// Month names in ordinal order, as stored in the warehouse time dimension
pub const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Default inclusive window on the scheduled-arrival date (year, month, day)
pub const DEFAULT_WINDOW_START: (i32, u32, u32) = (2005, 9, 1);
pub const DEFAULT_WINDOW_END: (i32, u32, u32) = (2006, 5, 31);

// =============================================================================
// Raw Extract Layout
// =============================================================================

/// Raw extract file layout (1-based line numbers)
pub mod layout {
    /// Line carrying the destination airport, e.g. `... (ATL)`
    pub const DESTINATION_LINE: usize = 2;

    /// Line carrying the column header of the record section
    pub const COLUMN_HEADER_LINE: usize = 5;

    /// Upstream encodes end-of-day as 24:00
    pub const END_OF_DAY_TIME: &str = "24:00";

    /// Replacement used before datetime parsing
    pub const END_OF_DAY_REPLACEMENT: &str = "23:59";

    /// Date and time format after joining the date and time columns
    pub const DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M";

    /// File extension of raw extracts
    pub const EXTRACT_EXTENSION: &str = "csv";
}

/// Column names in the raw extract record section
pub mod extract_columns {
    pub const CARRIER: &str = "Carrier Code";
    pub const DATE: &str = "Date (MM/DD/YYYY)";
    pub const FLIGHT_NUMBER: &str = "Flight Number";
    pub const TAIL_NUMBER: &str = "Tail Number";
    pub const ORIGIN: &str = "Origin Airport";
    pub const SCHEDULED_ARRIVAL: &str = "Scheduled Arrival Time";
    pub const ACTUAL_ARRIVAL: &str = "Actual Arrival Time";
    pub const DELAY: &str = "Arrival Delay (Minutes)";
    pub const DELAY_CARRIER: &str = "Delay Carrier (Minutes)";
    pub const DELAY_WEATHER: &str = "Delay Weather (Minutes)";
    pub const DELAY_NAS: &str = "Delay National Aviation System (Minutes)";
    pub const DELAY_SECURITY: &str = "Delay Security (Minutes)";
    pub const DELAY_LATE_AIRCRAFT: &str = "Delay Late Aircraft Arrival (Minutes)";

    /// Every column the normalizer requires
    pub const REQUIRED: &[&str] = &[
        CARRIER,
        DATE,
        FLIGHT_NUMBER,
        TAIL_NUMBER,
        ORIGIN,
        SCHEDULED_ARRIVAL,
        ACTUAL_ARRIVAL,
        DELAY,
        DELAY_CARRIER,
        DELAY_WEATHER,
        DELAY_NAS,
        DELAY_SECURITY,
        DELAY_LATE_AIRCRAFT,
    ];
}

// =============================================================================
// Time Dimension Snapshot
// =============================================================================

/// Column names of the time dimension snapshot and the delta output
pub mod time_columns {
    pub const TIME_ID: &str = "TIME_ID";

    /// Accepted alternative for the id column in snapshot exports
    pub const ID_ALIAS: &str = "ID";

    pub const YEAR: &str = "year";
    pub const MONTH: &str = "month";
    pub const DAY: &str = "day";
    pub const HOUR: &str = "hour";
    pub const MINUTE: &str = "minute";
}

// =============================================================================
// Fact Table Output
// =============================================================================

/// Tail number written for cancelled flights
pub const CANCELED_TAIL_NUMBER: &str = "CANCELED";

/// Column names of the fact table output
pub mod fact_columns {
    pub const CARRIER: &str = "Carrier";
    pub const FLIGHT_NUMBER: &str = "Flight_Number";
    pub const TAIL_NUMBER: &str = "Tail_Number";
    pub const ORIGIN: &str = "Origin";
    pub const DESTINATION: &str = "Destination";
    pub const DELAY: &str = "Delay";
    pub const DELAY_CARRIER: &str = "Delay_Carrier";
    pub const DELAY_WEATHER: &str = "Delay_Weather";
    pub const DELAY_NAS: &str = "Delay_NAS";
    pub const DELAY_SECURITY: &str = "Delay_Security";
    pub const DELAY_LATE_AIRCRAFT: &str = "Delay_Late_Aircraft";
    pub const SCHEDULED_TIME_ID: &str = "Scheduled_Time_ID";
    pub const ACTUAL_TIME_ID: &str = "Actual_Time_ID";
}

/// Output file stems
pub const FACTS_FILE_STEM: &str = "flights";
pub const NEW_TIMES_FILE_STEM: &str = "new_times";

// =============================================================================
// Processing Defaults
// =============================================================================

/// Upper bound on concurrently normalized extracts
pub const MAX_CONCURRENT_EXTRACTS: usize = 16;
