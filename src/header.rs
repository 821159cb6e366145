//! Raw extract header parsing.
//!
//! Extracts the destination airport code from the preamble of a raw
//! per-airport extract and locates the start of the record section
//! (the column header line) so it can be handed to the CSV reader.

use crate::constants::layout::{COLUMN_HEADER_LINE, DESTINATION_LINE};
use crate::error::{EtlError, Result};
use std::path::Path;
use tracing::debug;

/// Metadata from the preamble of a raw extract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractHeader {
    /// Destination airport of every flight in the extract
    pub destination: String,

    /// Byte offset of the column header line within the file content
    pub records_offset: usize,
}

/// Parse the preamble of an extract's content
pub fn parse_extract_header(path: &Path, content: &str) -> Result<ExtractHeader> {
    let mut destination = None;
    let mut offset = 0usize;

    for (line_num, line) in content.split_inclusive('\n').enumerate() {
        let line_no = line_num + 1;

        if line_no == COLUMN_HEADER_LINE {
            let destination = destination.ok_or_else(|| {
                EtlError::source_parse(path, "destination line missing from preamble")
            })?;

            debug!(
                "Parsed header for {}: destination={}, records at byte {}",
                path.display(),
                destination,
                offset
            );

            return Ok(ExtractHeader {
                destination,
                records_offset: offset,
            });
        }

        if line_no == DESTINATION_LINE {
            destination = Some(parse_destination_code(line).ok_or_else(|| {
                EtlError::source_parse(
                    path,
                    format!(
                        "destination line does not carry an airport code in parentheses: '{}'",
                        strip_line_terminator(line)
                    ),
                )
            })?);
        }

        offset += line.len();
    }

    Err(EtlError::source_parse(
        path,
        format!(
            "extract ends before the column header on line {}",
            COLUMN_HEADER_LINE
        ),
    ))
}

/// Extract the airport code from a destination line.
///
/// Takes the text following the first `(` (up to any further `(`) and
/// drops its final character, the closing parenthesis. The line
/// terminator is not part of the text.
pub fn parse_destination_code(line: &str) -> Option<String> {
    let line = strip_line_terminator(line);
    let segment = line.split('(').nth(1)?;

    let mut chars = segment.chars();
    chars.next_back()?;
    let code = chars.as_str();

    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
