//! Fact assembly over a sequence of extracts
//!
//! The assembler owns the time dimension store for the duration of a run.
//! Extracts are resolved one at a time in their fixed order: scheduled
//! keys first, then the actual keys of flights that landed. The fact rows
//! of an extract are appended only once both resolutions have succeeded.

use super::streaming::StreamingNormalizer;
use crate::config::{EtlConfig, ErrorPolicy};
use crate::dimension::{Checkpoint, DimensionResolver, ResolveStats, TimeDimensionStore};
use crate::error::{EtlError, Result};
use crate::models::{FactRow, NewTimeRow, ProcessingStats, SkippedExtract, TimeKey};
use crate::normalizer::{NormalizedExtract, RawExtractNormalizer};

use futures::StreamExt;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::pin::pin;
use tracing::{debug, info, warn};

/// Result of a completed assembly run
#[derive(Debug)]
pub struct AssemblyOutput {
    /// Fact rows in extract order, then in-extract order
    pub facts: Vec<FactRow>,

    /// Time dimension rows allocated during the run, in allocation order
    pub new_time_rows: Vec<NewTimeRow>,

    /// The grown store
    pub store: TimeDimensionStore,

    pub stats: ProcessingStats,
}

/// Drives normalization and dimension resolution for a run
#[derive(Debug)]
pub struct FactAssembler {
    store: TimeDimensionStore,
    resolver: DimensionResolver,
    normalizer: RawExtractNormalizer,
    config: EtlConfig,
    baseline: Checkpoint,
    facts: Vec<FactRow>,
    stats: ProcessingStats,
}

impl FactAssembler {
    /// Take ownership of a loaded store; rows it already holds are not
    /// part of the run's delta
    pub fn new(store: TimeDimensionStore, config: EtlConfig) -> Self {
        let baseline = store.checkpoint();
        Self {
            store,
            resolver: DimensionResolver::new(),
            normalizer: RawExtractNormalizer::new(config.date_window),
            config,
            baseline,
            facts: Vec::new(),
            stats: ProcessingStats::default(),
        }
    }

    pub fn store(&self) -> &TimeDimensionStore {
        &self.store
    }

    pub fn facts(&self) -> &[FactRow] {
        &self.facts
    }

    pub fn resolve_stats(&self) -> ResolveStats {
        self.resolver.stats()
    }

    pub fn skipped(&self) -> &[SkippedExtract] {
        &self.stats.skipped
    }

    /// Resolve one normalized extract and append its fact rows.
    ///
    /// Returns the number of rows appended.
    pub fn assemble_extract(&mut self, extract: NormalizedExtract) -> Result<usize> {
        let NormalizedExtract {
            path,
            destination,
            records,
            stats,
        } = extract;

        let scheduled: Vec<TimeKey> = records.iter().map(|r| r.scheduled_time).collect();
        let scheduled_ids = self.resolver.resolve(&scheduled, &mut self.store)?;

        // Cancelled flights stay absent and never allocate
        let actual: Vec<Option<TimeKey>> = records.iter().map(|r| r.actual_time()).collect();
        let actual_ids = self.resolver.resolve_optional(&actual, &mut self.store)?;

        let mut rows = Vec::with_capacity(records.len());
        for ((record, scheduled_id), actual_id) in
            records.into_iter().zip(scheduled_ids).zip(actual_ids)
        {
            rows.push(FactRow::from_record(record, scheduled_id, actual_id)?);
        }

        let appended = rows.len();
        self.stats.cancelled_flights += rows.iter().filter(|row| row.is_cancelled()).count();
        self.stats.rows_read += stats.rows_read;
        self.stats.rows_outside_window += stats.rows_outside_window;
        self.stats.extracts_processed += 1;
        self.facts.extend(rows);

        debug!(
            "Assembled {} ({}): {} fact rows, store now {} rows",
            path.display(),
            destination,
            appended,
            self.store.len()
        );

        Ok(appended)
    }

    /// Normalize and assemble one extract, applying the error policy
    pub fn process_extract(&mut self, path: &Path) -> Result<()> {
        let result = self
            .normalizer
            .normalize_file(path)
            .and_then(|extract| self.assemble_extract(extract));
        self.settle(path, result)
    }

    /// Process extracts sequentially in the given order
    pub fn run(&mut self, paths: &[PathBuf]) -> Result<()> {
        for path in paths {
            self.process_extract(path)?;
        }
        Ok(())
    }

    /// Normalize extracts concurrently, resolving them sequentially in
    /// the given order
    pub async fn run_concurrent(&mut self, paths: Vec<PathBuf>) -> Result<()> {
        let mut streaming =
            StreamingNormalizer::new(self.normalizer, self.config.max_concurrent_extracts);
        if self.config.show_progress {
            streaming = streaming.with_progress(paths.len());
        }
        self.run_streaming(&streaming, paths).await
    }

    /// Assemble the outcomes of `streaming` in order; the progress bar is
    /// closed whether the run completes or aborts
    pub async fn run_streaming(
        &mut self,
        streaming: &StreamingNormalizer,
        paths: Vec<PathBuf>,
    ) -> Result<()> {
        let mut outcomes = pin!(streaming.normalize_ordered(paths));
        while let Some(outcome) = outcomes.next().await {
            let result = outcome
                .result
                .and_then(|extract| self.assemble_extract(extract));
            if let Err(e) = self.settle(&outcome.path, result) {
                streaming.abandon();
                return Err(e);
            }
        }

        streaming.finish();
        Ok(())
    }

    /// Origin and destination codes referenced by the fact table
    pub fn airport_codes(&self) -> BTreeSet<&str> {
        self.facts
            .iter()
            .flat_map(|row| [row.origin.as_str(), row.destination.as_str()])
            .filter(|code| !code.is_empty())
            .collect()
    }

    /// Close the run and render the time dimension delta
    pub fn finish(self) -> Result<AssemblyOutput> {
        let new_time_rows = self
            .store
            .new_rows_since(self.baseline)
            .iter()
            .map(NewTimeRow::render)
            .collect::<Result<Vec<_>>>()?;

        let airports_referenced = self.airport_codes().len();
        let mut stats = self.stats;
        stats.fact_rows = self.facts.len();
        stats.new_time_rows = new_time_rows.len();
        stats.airports_referenced = airports_referenced;

        info!(
            "Assembly finished: {} fact rows, {} new time rows, {} extracts skipped",
            stats.fact_rows,
            stats.new_time_rows,
            stats.skipped.len()
        );

        Ok(AssemblyOutput {
            facts: self.facts,
            new_time_rows,
            store: self.store,
            stats,
        })
    }

    fn settle(&mut self, path: &Path, result: Result<usize>) -> Result<()> {
        let error = match result {
            Ok(_) => return Ok(()),
            Err(error) => error,
        };

        match self.config.error_policy {
            ErrorPolicy::AbortRun => Err(match error {
                EtlError::Io(e) => EtlError::ProcessingFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                },
                other => other,
            }),
            ErrorPolicy::SkipExtract => {
                warn!("Skipping extract {}: {}", path.display(), error);
                self.stats.skipped.push(SkippedExtract {
                    path: path.to_path_buf(),
                    reason: error.to_string(),
                });
                Ok(())
            }
        }
    }
}
