use anyhow::{Context, Result};
use clap::Parser;
use eegrec::cli::{Cli, Commands};
use eegrec::config::Config;
use eegrec::dataset::{DatasetBuilder, DatasetSummary, EpochOptions, chunkify};
use eegrec::device::SyntheticSource;
use eegrec::report::LogReporter;
use eegrec::session::{RecordingSession, session_dir};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(log_level(cli.quiet, cli.verbose))
        .format_timestamp(None)
        .parse_default_env()
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Record {
            duration,
            output,
            channels,
            fs,
        } => record(&config, duration, output, channels, fs),
        Commands::Inspect {
            dir,
            stream,
            fs,
            epoch_start,
            epoch_length,
        } => {
            let defaults = config.epoch_options();
            let options = EpochOptions::new(
                fs.unwrap_or(defaults.fs),
                epoch_start.unwrap_or(defaults.epoch_start),
                epoch_length.unwrap_or(defaults.epoch_length),
            );
            inspect(&dir, stream, &options)
        }
        Commands::Windows {
            dir,
            window_size,
            stride,
        } => windows(
            &dir,
            &config.epoch_options(),
            window_size.unwrap_or(config.windows.window_size),
            stride.unwrap_or(config.windows.stride),
        ),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn log_level(quiet: bool, verbose: u8) -> log::LevelFilter {
    if quiet {
        return log::LevelFilter::Warn;
    }
    match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        // Load from custom path
        Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        // Try default path, fall back to defaults
        Config::load_or_default(&Config::default_path())?
    };

    // Apply environment variable overrides
    Ok(config.with_env_overrides())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Record from the synthetic source for `duration`, then print the session summary.
fn record(
    config: &Config,
    duration: Duration,
    output: Option<PathBuf>,
    channels: usize,
    fs: Option<f64>,
) -> Result<()> {
    let fs = fs.unwrap_or(config.dataset.fs);
    let dir = output.unwrap_or_else(|| {
        session_dir(
            &config.session.dataset_path,
            chrono::Local::now().naive_local(),
        )
    });

    let source = SyntheticSource::new(channels, fs, config.session.stimuli.clone());
    let handle = RecordingSession::start(
        Box::new(source),
        config.session_config(dir.clone()),
        Vec::new(),
        Arc::new(LogReporter),
    )
    .with_context(|| format!("Failed to start session in {}", dir.display()))?;

    std::thread::sleep(duration);

    let summary = handle.stop().context("Recording session failed")?;
    print_json(&summary)
}

fn inspect(dir: &Path, stream: bool, options: &EpochOptions) -> Result<()> {
    let builder = DatasetBuilder::new();
    let loaded = if stream {
        builder.load_stream(dir, options.fs)
    } else {
        builder.load(dir, options)
    }
    .with_context(|| format!("Failed to load {}", dir.display()))?;

    print_json(&DatasetSummary::new(&loaded.eeg, Some(&loaded.report)))
}

fn windows(dir: &Path, options: &EpochOptions, window_size: f64, stride: f64) -> Result<()> {
    let loaded = DatasetBuilder::new()
        .load(dir, options)
        .with_context(|| format!("Failed to load {}", dir.display()))?;
    let windows = chunkify(&loaded.eeg, window_size, stride)?;

    print_json(&DatasetSummary::new(&windows, Some(&loaded.report)))
}
