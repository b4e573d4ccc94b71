//! Command-line surface for the curtailment pipeline.

pub mod cli;
