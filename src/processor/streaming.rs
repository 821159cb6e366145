//! Ordered concurrent normalization of extracts
//!
//! Normalization reads and parses each extract on tokio's blocking pool
//! with bounded parallelism. Results are yielded strictly in input order
//! so that the sequential resolution consuming them assigns the same ids
//! as a fully sequential run would.

use crate::error::{EtlError, Result};
use crate::normalizer::{NormalizedExtract, RawExtractNormalizer};

use futures::stream::{self, Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tokio::task;
use tracing::debug;

/// Normalization result for one extract
#[derive(Debug)]
pub struct ExtractOutcome {
    pub path: PathBuf,
    pub result: Result<NormalizedExtract>,
}

/// Normalizes extracts concurrently while preserving their order
#[derive(Debug)]
pub struct StreamingNormalizer {
    normalizer: RawExtractNormalizer,
    concurrency: usize,
    progress: Option<ProgressBar>,
}

impl StreamingNormalizer {
    pub fn new(normalizer: RawExtractNormalizer, concurrency: usize) -> Self {
        Self {
            normalizer,
            concurrency: concurrency.max(1),
            progress: None,
        }
    }

    /// Report progress on a bar sized to the number of extracts
    pub fn with_progress(mut self, total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message("Normalizing extracts");
        self.progress = Some(pb);
        self
    }

    /// Finish the progress bar, if any
    pub fn finish(&self) {
        if let Some(pb) = &self.progress {
            pb.finish_with_message("All extracts processed");
        }
    }

    /// Stop the progress bar after an aborted run, leaving it on screen
    pub fn abandon(&self) {
        if let Some(pb) = &self.progress {
            pb.abandon_with_message("Run aborted");
        }
    }

    /// Whether the progress bar has been closed; true without a bar
    pub fn is_finished(&self) -> bool {
        self.progress.as_ref().is_none_or(|pb| pb.is_finished())
    }

    /// Stream normalized extracts in the order of `files`.
    ///
    /// At most `concurrency` extracts are in flight; a slow extract holds
    /// back later results until it completes.
    pub fn normalize_ordered(&self, files: Vec<PathBuf>) -> impl Stream<Item = ExtractOutcome> {
        let normalizer = self.normalizer;
        let progress = self.progress.clone();
        let limit = self.concurrency.min(files.len()).max(1);
        debug!(
            "Normalizing {} extracts with concurrency {}",
            files.len(),
            limit
        );

        stream::iter(files)
            .map(move |path| {
                let progress = progress.clone();
                async move {
                    if let (Some(pb), Some(name)) = (&progress, path.file_name()) {
                        pb.set_message(format!("Normalizing: {}", name.to_string_lossy()));
                    }

                    let result = task::spawn_blocking({
                        let path = path.clone();
                        move || normalizer.normalize_file(&path)
                    })
                    .await
                    .map_err(|e| EtlError::ProcessingFailed {
                        path: path.clone(),
                        reason: format!("normalization task failed: {}", e),
                    })
                    .and_then(|result| result);

                    if let Some(pb) = &progress {
                        pb.inc(1);
                    }

                    ExtractOutcome { path, result }
                }
            })
            .buffered(limit)
    }
}
