//! Extract discovery module
//!
//! Finds the raw per-airport extracts in an input directory and fixes the
//! order in which they are processed. The order decides which extract
//! allocates a shared time key first, so it is lexicographic by file name
//! and never depends on directory listing order.

use crate::constants::layout::EXTRACT_EXTENSION;
use crate::error::{EtlError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Extract discovery component
#[derive(Debug)]
pub struct ExtractDiscovery {
    extract_dir: PathBuf,
}

impl ExtractDiscovery {
    pub fn new(extract_dir: PathBuf) -> Self {
        Self { extract_dir }
    }

    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Discover every `*.csv` directly inside the extract directory,
    /// sorted by file name
    pub async fn discover_extracts(&self) -> Result<Vec<PathBuf>> {
        let is_dir = fs::metadata(&self.extract_dir)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);

        if !is_dir {
            return Err(EtlError::ExtractDirNotFound {
                path: self.extract_dir.clone(),
            });
        }

        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&self.extract_dir.to_string_lossy()),
            EXTRACT_EXTENSION
        );
        debug!("Searching for extracts matching: {}", pattern);

        let entries = glob::glob(&pattern).map_err(|e| {
            EtlError::configuration(format!("invalid extract pattern '{}': {}", pattern, e))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => warn!("Unreadable directory entry: {}", e),
            }
        }

        sort_extracts(&mut files);
        debug!(
            "Found {} extracts in {}",
            files.len(),
            self.extract_dir.display()
        );

        Ok(files)
    }
}

/// Sort extracts lexicographically by file name
pub fn sort_extracts(files: &mut [PathBuf]) {
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
}
