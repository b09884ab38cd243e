//! CLI command implementations for pv-dashboard.
//!
//! This module provides implementations for all CLI subcommands:
//! - `config`: Configuration file generation
//! - `day`: Print one day's logged samples
//! - `generate-replay`: Synthetic replay data generation

pub mod config;
pub mod day;
pub mod generate;

// Re-export command functions
pub use config::command_config;
pub use day::command_day;
pub use generate::command_generate_replay;
