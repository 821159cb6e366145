//! Pipeline tests for the processor module
//!
//! Runs the complete pipeline over extract directories written to
//! temporary directories.

pub mod end_to_end;
pub mod error_handling;
pub mod fixtures;
