//! Shared helpers for building raw extracts and snapshots

use std::fs;
use std::path::{Path, PathBuf};

pub const COLUMN_HEADER: &str = "Carrier Code,Date (MM/DD/YYYY),Flight Number,Tail Number,Origin Airport,Scheduled Arrival Time,Actual Arrival Time,Arrival Delay (Minutes),Delay Carrier (Minutes),Delay Weather (Minutes),Delay National Aviation System (Minutes),Delay Security (Minutes),Delay Late Aircraft Arrival (Minutes)";

/// Raw extract content for a destination with the given record lines
pub fn extract_content(destination: &str, rows: &[&str]) -> String {
    let mut content = format!(
        "Detailed Statistics\nDestination Airport: Somewhere, XX ({})\nAirline: Delta Air Lines Inc. (DL)\n\n{}\n",
        destination, COLUMN_HEADER
    );
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    content
}

/// Write an extract into `dir` and return its path
pub fn write_extract(dir: &Path, file_name: &str, destination: &str, rows: &[&str]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(file_name);
    fs::write(&path, extract_content(destination, rows)).unwrap();
    path
}

/// Write a time dimension snapshot with the given data lines
pub fn write_snapshot(dir: &Path, lines: &[&str]) -> PathBuf {
    let mut content = String::from("TIME_ID,year,month,day,hour,minute\n");
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    let path = dir.join("time_dim.csv");
    fs::write(&path, content).unwrap();
    path
}

/// Data lines of a CSV output, header excluded
pub fn data_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}
