//! Flight Facts Library
//!
//! Builds a flight-arrival fact table from raw per-airport delay extracts.
//! Every scheduled and actual arrival time is replaced by a surrogate key
//! into a shared time dimension that is loaded from a warehouse snapshot
//! and grown incrementally as new minutes are encountered.
//!
//! This library provides tools for:
//! - Loading the time dimension snapshot into an O(1) key/id index
//! - Resolving batches of time keys, allocating ids for unseen keys
//! - Parsing raw extracts into typed flight records
//! - Assembling fact rows across extracts in a deterministic order
//! - Writing the fact table and the dimension delta as CSV or Parquet

pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod dimension;
pub mod error;
pub mod header;
pub mod models;
pub mod normalizer;
pub mod processor;

pub use config::EtlConfig;
pub use dimension::{DimensionResolver, TimeDimensionStore};
pub use error::{EtlError, Result};
pub use models::{FactRow, NewTimeRow, ProcessingStats, RawFlightRecord, TimeId, TimeKey};
pub use normalizer::RawExtractNormalizer;
pub use processor::{FlightFactProcessor, assembler::FactAssembler};
