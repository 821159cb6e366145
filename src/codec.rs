//! Month name and time component text encoding.
//!
//! The warehouse stores months as English names and the delta output
//! renders day, hour and minute as two-digit text. Everything inside the
//! crate works with ordinals.

use crate::constants::MONTH_NAMES;
use crate::error::{EtlError, Result};

/// Bidirectional month name ↔ ordinal mapping
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeKeyCodec;

impl TimeKeyCodec {
    /// Map a month name to its ordinal (1-12).
    ///
    /// Surrounding whitespace and letter case are ignored, since warehouse
    /// exports pad the column.
    pub fn month_ordinal(name: &str) -> Result<u8> {
        let normalized = name.trim().to_lowercase();
        MONTH_NAMES
            .iter()
            .position(|candidate| *candidate == normalized)
            .map(|index| index as u8 + 1)
            .ok_or_else(|| EtlError::InvalidMonth {
                value: name.to_string(),
            })
    }

    /// Map an ordinal (1-12) to its lowercase month name
    pub fn month_name(ordinal: u8) -> Result<&'static str> {
        ordinal
            .checked_sub(1)
            .and_then(|index| MONTH_NAMES.get(index as usize))
            .copied()
            .ok_or_else(|| EtlError::InvalidMonth {
                value: ordinal.to_string(),
            })
    }

    /// Render a day, hour or minute as zero-padded two-digit text
    pub fn two_digit(value: u8) -> String {
        format!("{:02}", value)
    }
}
