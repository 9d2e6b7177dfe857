use crate::dataset::builder::EpochOptions;
use crate::defaults;
use crate::session::SessionConfig;
use crate::stream::distributor::DistributorConfig;
use crate::stream::recorder::RecorderConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub session: SessionSection,
    pub distributor: DistributorSection,
    pub recorder: RecorderSection,
    pub dataset: DatasetSection,
    pub windows: WindowSection,
}

/// Where sessions are written and which stimuli they present
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSection {
    pub dataset_path: PathBuf,
    pub stimuli: Vec<f64>,
}

/// Distributor polling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DistributorSection {
    pub poll_interval_ms: u64,
    /// 0 disables stall detection
    pub disconnect_timeout_ms: u64,
}

/// Recorder flush configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecorderSection {
    pub batch_size: usize,
    pub flush_interval_ms: u64,
}

/// Epoch extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatasetSection {
    pub fs: f64,
    pub epoch_start: f64,
    pub epoch_length: f64,
}

/// Sliding window configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowSection {
    pub window_size: f64,
    pub stride: f64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(defaults::DATASET_PATH),
            stimuli: defaults::LEGACY_STIMULI.to_vec(),
        }
    }
}

impl Default for DistributorSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            disconnect_timeout_ms: defaults::DISCONNECT_TIMEOUT_MS,
        }
    }
}

impl Default for RecorderSection {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            flush_interval_ms: defaults::FLUSH_INTERVAL_MS,
        }
    }
}

impl Default for DatasetSection {
    fn default() -> Self {
        Self {
            fs: defaults::SAMPLING_RATE,
            epoch_start: defaults::EPOCH_START,
            epoch_length: defaults::EPOCH_LENGTH,
        }
    }
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            window_size: defaults::WINDOW_SIZE,
            stride: defaults::WINDOW_STRIDE,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - EEGREC_DATASET_PATH → session.dataset_path
    /// - EEGREC_FS → dataset.fs (ignored unless a positive number)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("EEGREC_DATASET_PATH")
            && !path.is_empty()
        {
            self.session.dataset_path = PathBuf::from(path);
        }

        if let Ok(fs) = std::env::var("EEGREC_FS")
            && let Ok(fs) = fs.trim().parse::<f64>()
            && fs > 0.0
        {
            self.dataset.fs = fs;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/eegrec/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eegrec")
            .join("config.toml")
    }

    /// Render as TOML, as `eegrec config` prints it
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn distributor_config(&self) -> DistributorConfig {
        DistributorConfig {
            poll_interval: Duration::from_millis(self.distributor.poll_interval_ms),
            disconnect_timeout: match self.distributor.disconnect_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }

    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            batch_size: self.recorder.batch_size,
            flush_interval: Duration::from_millis(self.recorder.flush_interval_ms),
        }
    }

    pub fn epoch_options(&self) -> EpochOptions {
        EpochOptions::new(
            self.dataset.fs,
            self.dataset.epoch_start,
            self.dataset.epoch_length,
        )
    }

    /// Session settings for a recording written to `dir`
    pub fn session_config(&self, dir: PathBuf) -> SessionConfig {
        SessionConfig {
            dir,
            stimuli: self.session.stimuli.clone(),
            distributor: self.distributor_config(),
            recorder: self.recorder_config(),
        }
    }
}
