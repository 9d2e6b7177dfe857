//! Command-line interface for eegrec
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Record EEG sessions and rebuild labeled datasets from them
#[derive(Parser, Debug)]
#[command(name = "eegrec", version, about = "Record EEG sessions and rebuild labeled datasets")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a recording duration.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`, `2m30s`).
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a session from the synthetic headset
    Record {
        /// How long to record (e.g. 30s, 5m, 1h30m)
        #[arg(long, short = 'd', value_name = "DURATION", value_parser = parse_duration)]
        duration: Duration,

        /// Session directory (default: a timestamped directory under the dataset path)
        #[arg(long, short = 'o', value_name = "DIR")]
        output: Option<PathBuf>,

        /// Number of channels to generate
        #[arg(long, value_name = "N", default_value_t = 8)]
        channels: usize,

        /// Sampling frequency in Hz (default: dataset.fs from config)
        #[arg(long, value_name = "HZ")]
        fs: Option<f64>,
    },

    /// Load a session directory and print a dataset summary as JSON
    Inspect {
        /// Session directory holding data.csv and markers.csv
        dir: PathBuf,

        /// Load as one continuously labeled trial instead of epochs
        #[arg(long)]
        stream: bool,

        /// Sampling frequency in Hz
        #[arg(long, value_name = "HZ")]
        fs: Option<f64>,

        /// Epoch offset after each marker, in seconds
        #[arg(long, value_name = "SECONDS")]
        epoch_start: Option<f64>,

        /// Epoch length in seconds
        #[arg(long, value_name = "SECONDS")]
        epoch_length: Option<f64>,
    },

    /// Load epochs, cut them into sliding windows and print a summary as JSON
    Windows {
        /// Session directory holding data.csv and markers.csv
        dir: PathBuf,

        /// Window width in seconds
        #[arg(long, value_name = "SECONDS")]
        window_size: Option<f64>,

        /// Distance between window starts in seconds
        #[arg(long, value_name = "SECONDS")]
        stride: Option<f64>,
    },

    /// Print the effective configuration as TOML
    Config,
}
