//! CLI arguments and subcommands for pv-dashboard.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

/// Output format for the `day` subcommand
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DayFormat {
    Text,
    Json,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "pv-dashboard",
    about = "Live inverter power dashboard",
    long_about = "Live inverter power dashboard.\n\n\
                  Polls inverter telemetry (or CPU load as a stand-in) at a fixed interval, \
                  keeps rolling, today and yesterday series, appends every sample to a daily \
                  log file and streams updates to every open browser session.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (YAML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Directory for daily log files (overrides viewer.log_dir)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a commented configuration file
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Print the samples logged for one day
    Day {
        /// Day to print (YYYY-MM-DD)
        date: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: DayFormat,
    },

    /// Generate a synthetic NDJSON replay file of inverter records
    GenerateReplay {
        /// Output file path
        #[arg(short = 'o', long, default_value = "replay.ndjson")]
        output: PathBuf,

        /// Number of records to generate
        #[arg(short = 'n', long, default_value_t = 600)]
        count: usize,

        /// Inverter serial written into every record
        #[arg(long, default_value = "114172220003")]
        serial: String,
    },
}
