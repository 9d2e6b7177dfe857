//! Reconstructs trial-structured datasets from a recorded session directory.
//!
//! Two shapes are supported: fixed-length epochs anchored to each marker
//! ([`DatasetBuilder::load`]) and one continuous trial labeled sample by
//! sample ([`DatasetBuilder::load_stream`]).

use crate::dataset::eeg::{Eeg, Labels};
use crate::dataset::logs::{self, MarkerRow, SampleLog};
use crate::defaults;
use crate::error::{EegError, Result};
use crate::report::{Diagnostic, LogReporter, Reporter};
use ndarray::{Array1, Array2, Array3, s};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

const NAME: &str = "dataset";

/// Epoch geometry, in seconds relative to each marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochOptions {
    /// Sampling frequency in Hz.
    pub fs: f64,
    /// Offset of the first epoch sample after the marker.
    pub epoch_start: f64,
    pub epoch_length: f64,
}

impl Default for EpochOptions {
    fn default() -> Self {
        Self {
            fs: defaults::SAMPLING_RATE,
            epoch_start: defaults::EPOCH_START,
            epoch_length: defaults::EPOCH_LENGTH,
        }
    }
}

impl EpochOptions {
    pub fn new(fs: f64, epoch_start: f64, epoch_length: f64) -> Self {
        Self {
            fs,
            epoch_start,
            epoch_length,
        }
    }

    /// Offset of the epoch in samples, truncated.
    pub fn start_samples(&self) -> usize {
        (self.epoch_start * self.fs) as usize
    }

    /// Length of the epoch in samples, truncated.
    pub fn length_samples(&self) -> usize {
        (self.epoch_length * self.fs) as usize
    }

    pub fn validate(&self) -> Result<()> {
        validate_fs(self.fs)?;
        if !self.epoch_start.is_finite() || self.epoch_start < 0.0 {
            return Err(EegError::InvalidParameter {
                name: "epoch_start",
                message: format!(
                    "must be a non-negative number of seconds, got {}",
                    self.epoch_start
                ),
            });
        }
        if !self.epoch_length.is_finite() || self.length_samples() == 0 {
            return Err(EegError::InvalidParameter {
                name: "epoch_length",
                message: format!(
                    "{}s at {} Hz is less than one sample",
                    self.epoch_length, self.fs
                ),
            });
        }
        Ok(())
    }
}

fn validate_fs(fs: f64) -> Result<()> {
    if fs.is_finite() && fs > 0.0 {
        Ok(())
    } else {
        Err(EegError::InvalidParameter {
            name: "fs",
            message: format!("sampling frequency must be positive, got {fs}"),
        })
    }
}

/// Non-fatal outcomes of a load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Marker indices (file order) whose epoch ran off the end of the log.
    pub skipped: Vec<usize>,
    /// Sample log rows that could not be parsed.
    pub malformed_rows: usize,
    /// Markers that used a legacy string label.
    pub legacy_markers: usize,
    /// Whether `frequencies.txt` was missing.
    pub default_stimuli: bool,
}

/// A dataset together with what happened while building it.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub eeg: Eeg,
    pub report: LoadReport,
}

/// Session directory contents shared by both load modes.
struct Session {
    samples: SampleLog,
    markers: Vec<MarkerRow>,
    stimuli: Vec<f64>,
    report: LoadReport,
}

pub struct DatasetBuilder {
    reporter: Arc<dyn Reporter>,
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self {
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Loads one fixed-length epoch per marker.
    ///
    /// For each marker the epoch starts `epoch_start` seconds after the first
    /// sample at or after the marker timestamp. Markers without enough
    /// trailing samples are skipped and reported.
    pub fn load(&self, dir: &Path, options: &EpochOptions) -> Result<Loaded> {
        options.validate()?;
        let Session {
            samples,
            markers,
            stimuli,
            mut report,
        } = self.read_session(dir)?;

        let start = options.start_samples();
        let length = options.length_samples();
        let width = samples.channels.len();

        let mut flat = Vec::new();
        let mut labels = Vec::new();
        for (index, row) in markers.iter().enumerate() {
            let begin = samples.first_at_or_after(row.timestamp) + start;
            let end = begin + length;
            if end > samples.len() {
                report.skipped.push(index);
                self.reporter.report(
                    NAME,
                    &Diagnostic::TrialSkipped {
                        index,
                        marker: row.marker.to_string(),
                        available: samples.len().saturating_sub(begin),
                        required: length,
                    },
                );
                continue;
            }
            let class = self.class_of(row, dir, &mut report)?;
            flat.extend_from_slice(&samples.values[begin * width..end * width]);
            labels.push(class as f64);
        }

        let n_trials = labels.len();
        let data = Array3::from_shape_vec((n_trials, length, width), flat)?;
        let eeg = Eeg::new(
            data,
            Labels::PerTrial(Array1::from(labels)),
            samples.channels,
            stimuli,
            options.fs,
        )?;
        log::debug!(
            "[{NAME}] loaded {} epochs from {} ({} skipped)",
            n_trials,
            dir.display(),
            report.skipped.len()
        );
        Ok(Loaded { eeg, report })
    }

    /// Loads the whole sample log as a single trial labeled per sample.
    ///
    /// Each marker labels the samples from its timestamp up to the next
    /// marker; the last marker runs to the end of the log. Samples before the
    /// first marker stay NaN.
    pub fn load_stream(&self, dir: &Path, fs: f64) -> Result<Loaded> {
        validate_fs(fs)?;
        let Session {
            samples,
            markers,
            stimuli,
            mut report,
        } = self.read_session(dir)?;

        let n_samples = samples.len();
        let mut labels = Array2::from_elem((1, n_samples), f64::NAN);
        for (i, row) in markers.iter().enumerate() {
            let class = self.class_of(row, dir, &mut report)?;
            let begin = samples.first_at_or_after(row.timestamp);
            let end = markers
                .get(i + 1)
                .map_or(n_samples, |next| samples.first_at_or_after(next.timestamp));
            if begin < end {
                labels.slice_mut(s![0, begin..end]).fill(class as f64);
            }
        }

        let width = samples.channels.len();
        let data = Array3::from_shape_vec((1, n_samples, width), samples.values)?;
        let eeg = Eeg::new(
            data,
            Labels::PerSample(labels),
            samples.channels,
            stimuli,
            fs,
        )?;
        log::debug!(
            "[{NAME}] loaded stream of {} samples and {} markers from {}",
            n_samples,
            markers.len(),
            dir.display()
        );
        Ok(Loaded { eeg, report })
    }

    fn read_session(&self, dir: &Path) -> Result<Session> {
        // Both logs must exist before either is read
        let data_path = logs::require_log(dir, defaults::SAMPLE_LOG)?;
        let markers_path = logs::require_log(dir, defaults::MARKER_LOG)?;

        let samples = logs::read_sample_log(&data_path, self.reporter.as_ref())?;
        let markers = logs::read_marker_log(&markers_path)?;

        let stimulus_path = dir.join(defaults::STIMULUS_FILE);
        let default_stimuli = !stimulus_path.exists();
        let stimuli = logs::read_stimuli(&stimulus_path, self.reporter.as_ref())?;

        let report = LoadReport {
            malformed_rows: samples.malformed_rows,
            default_stimuli,
            ..LoadReport::default()
        };
        Ok(Session {
            samples,
            markers,
            stimuli,
            report,
        })
    }

    fn class_of(&self, row: &MarkerRow, dir: &Path, report: &mut LoadReport) -> Result<i64> {
        let class = row
            .marker
            .class_id()
            .ok_or_else(|| EegError::UnknownMarker {
                label: row.marker.to_string(),
                path: dir.join(defaults::MARKER_LOG),
            })?;
        if row.marker.is_legacy() {
            report.legacy_markers += 1;
            self.reporter.report(
                NAME,
                &Diagnostic::LegacyMarker {
                    label: row.marker.to_string(),
                    class,
                },
            );
        }
        Ok(class)
    }
}

/// [`DatasetBuilder::load`] with diagnostics sent to the log.
pub fn load(dir: &Path, options: &EpochOptions) -> Result<Eeg> {
    DatasetBuilder::new().load(dir, options).map(|l| l.eeg)
}

/// [`DatasetBuilder::load_stream`] with diagnostics sent to the log.
pub fn load_stream(dir: &Path, fs: f64) -> Result<Eeg> {
    DatasetBuilder::new().load_stream(dir, fs).map(|l| l.eeg)
}
