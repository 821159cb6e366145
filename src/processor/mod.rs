//! Main processing engine.
//!
//! Orchestrates a complete run: load the time dimension snapshot,
//! discover extracts, assemble the fact table against the shared store
//! and write the fact table together with the newly allocated time rows.

pub mod assembler;
pub mod discovery;
pub mod streaming;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{
    assembler::{AssemblyOutput, FactAssembler},
    discovery::ExtractDiscovery,
    writer::OutputWriter,
};

use crate::config::EtlConfig;
use crate::dimension::{TimeDimensionStore, load_snapshot};
use crate::error::Result;
use crate::models::ProcessingStats;

use colored::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// End-to-end processor for a directory of raw extracts
#[derive(Debug)]
pub struct FlightFactProcessor {
    extract_dir: PathBuf,
    snapshot_path: Option<PathBuf>,
    output_dir: PathBuf,
    config: EtlConfig,
}

impl FlightFactProcessor {
    /// Create a processor; outputs default to the extract directory's parent
    pub fn new(extract_dir: PathBuf, output_dir: Option<PathBuf>) -> Self {
        let output_dir = output_dir.unwrap_or_else(|| {
            extract_dir
                .parent()
                .map(|parent| parent.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        });

        Self {
            extract_dir,
            snapshot_path: None,
            output_dir,
            config: EtlConfig::default(),
        }
    }

    /// Start from a time dimension snapshot instead of an empty store
    pub fn with_snapshot(mut self, snapshot_path: PathBuf) -> Self {
        self.snapshot_path = Some(snapshot_path);
        self
    }

    /// Configure the processor
    pub fn with_config(mut self, config: EtlConfig) -> Self {
        self.config = config;
        self
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Run the pipeline and return the run statistics
    pub async fn process(&self) -> Result<ProcessingStats> {
        Ok(self.assemble().await?.stats)
    }

    /// Run the pipeline and return the full assembly output
    pub async fn assemble(&self) -> Result<AssemblyOutput> {
        let start_time = Instant::now();
        self.config.validate()?;

        println!("{}", "Starting flight fact assembly".bright_green().bold());
        println!(
            "  {} {}",
            "Extracts:".bright_cyan(),
            self.extract_dir.display()
        );
        println!("  {} {}", "Output:".bright_cyan(), self.output_dir.display());

        // Step 1: Load the time dimension
        let (store, snapshot_rows, snapshot_duplicates) = match &self.snapshot_path {
            Some(path) => {
                println!("\n{}", "Loading time dimension...".bright_yellow());
                let (store, load_stats) = load_snapshot(path, self.config.snapshot_conflicts)?;
                println!(
                    "  {} {} rows ({} duplicates dropped)",
                    "Loaded".bright_green(),
                    load_stats.rows_loaded.to_string().bright_white().bold(),
                    load_stats.duplicates_dropped
                );
                (store, load_stats.rows_loaded, load_stats.duplicates_dropped)
            }
            None => {
                info!("No time dimension snapshot given, starting from an empty store");
                (TimeDimensionStore::new(), 0, 0)
            }
        };

        // Step 2: Discover extracts
        println!("\n{}", "Discovering extracts...".bright_yellow());
        let extracts = ExtractDiscovery::new(self.extract_dir.clone())
            .discover_extracts()
            .await?;
        println!(
            "  {} {} extracts",
            "Found".bright_green(),
            extracts.len().to_string().bright_white().bold()
        );

        // Step 3: Normalize and resolve
        println!("\n{}", "Processing extracts...".bright_yellow());
        let mut assembler = FactAssembler::new(store, self.config.clone());
        assembler.run_concurrent(extracts).await?;
        let mut output = assembler.finish()?;

        output.stats.snapshot_rows = snapshot_rows;
        output.stats.snapshot_duplicates_dropped = snapshot_duplicates;

        // Step 4: Write outputs
        if self.config.dry_run {
            println!("\n{}", "Dry run - no output written".bright_yellow());
        } else {
            let writer = OutputWriter::new(
                self.output_dir.clone(),
                self.config.output_format,
                self.config.compression,
            );
            output.stats.output_paths = writer
                .write_all(&output.facts, &output.new_time_rows)
                .await?;
        }

        output.stats.processing_time_ms = start_time.elapsed().as_millis();
        print_summary(&output.stats);

        Ok(output)
    }
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Extracts processed:".bright_cyan(),
        stats.extracts_processed.to_string().bright_white()
    );
    if !stats.skipped.is_empty() {
        println!(
            "  {} {}",
            "Extracts skipped:".bright_red(),
            stats.skipped.len().to_string().bright_red().bold()
        );
        for skipped in &stats.skipped {
            println!("    {} {}", skipped.path.display(), skipped.reason.dimmed());
        }
    }
    println!(
        "  {} {} ({} cancelled, {} outside window)",
        "Fact rows:".bright_cyan(),
        stats.fact_rows.to_string().bright_white().bold(),
        stats.cancelled_flights,
        stats.rows_outside_window
    );
    println!(
        "  {} {}",
        "New time rows:".bright_cyan(),
        stats.new_time_rows.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Airports referenced:".bright_cyan(),
        stats.airports_referenced.to_string().bright_white()
    );
    for path in &stats.output_paths {
        println!("  {} {}", "Wrote:".bright_cyan(), path.display());
    }
}
