//! In-memory EEG dataset.

use crate::error::{EegError, Result};
use ndarray::{Array1, Array2, Array3, Axis};

/// Ground-truth labels of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Labels {
    /// One class per trial (epoch mode).
    PerTrial(Array1<f64>),
    /// One class per sample of every trial, NaN when unlabeled (stream mode).
    PerSample(Array2<f64>),
}

impl Labels {
    /// Length of the trial axis.
    pub fn n_trials(&self) -> usize {
        match self {
            Labels::PerTrial(y) => y.len(),
            Labels::PerSample(y) => y.nrows(),
        }
    }

    fn select(&self, trials: &[usize]) -> Labels {
        match self {
            Labels::PerTrial(y) => Labels::PerTrial(y.select(Axis(0), trials)),
            Labels::PerSample(y) => Labels::PerSample(y.select(Axis(0), trials)),
        }
    }
}

/// EEG samples with their labels and recording metadata.
///
/// `data` is indexed (trial, sample, channel). Trial, sample and channel
/// counts are read off its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Eeg {
    data: Array3<f64>,
    labels: Labels,
    channels: Vec<String>,
    stimuli: Vec<f64>,
    fs: f64,
}

impl Eeg {
    /// Builds a dataset, checking that labels and channel names fit `data`.
    pub fn new(
        data: Array3<f64>,
        labels: Labels,
        channels: Vec<String>,
        stimuli: Vec<f64>,
        fs: f64,
    ) -> Result<Self> {
        let (n_trials, n_samples, n_channels) = data.dim();
        if labels.n_trials() != n_trials {
            return Err(EegError::InconsistentDataset {
                message: format!(
                    "{} labels for {} trials",
                    labels.n_trials(),
                    n_trials
                ),
            });
        }
        if let Labels::PerSample(y) = &labels
            && y.ncols() != n_samples
        {
            return Err(EegError::InconsistentDataset {
                message: format!("{} sample labels for {} samples", y.ncols(), n_samples),
            });
        }
        if channels.len() != n_channels {
            return Err(EegError::InconsistentDataset {
                message: format!(
                    "{} channel names for {} channels",
                    channels.len(),
                    n_channels
                ),
            });
        }
        if !(fs > 0.0) {
            return Err(EegError::InvalidParameter {
                name: "fs",
                message: format!("sampling frequency must be positive, got {fs}"),
            });
        }
        Ok(Self {
            data,
            labels,
            channels,
            stimuli,
            fs,
        })
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Channel names, in the order of the channel axis.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Stimulus frequencies, indexed by class id.
    pub fn stimuli(&self) -> &[f64] {
        &self.stimuli
    }

    /// Sampling frequency in Hz.
    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn n_trials(&self) -> usize {
        self.data.dim().0
    }

    pub fn n_samples(&self) -> usize {
        self.data.dim().1
    }

    pub fn n_channels(&self) -> usize {
        self.data.dim().2
    }

    /// Class id of a trial in epoch mode; `None` for stream-mode datasets.
    pub fn trial_label(&self, trial: usize) -> Option<i64> {
        match &self.labels {
            Labels::PerTrial(y) => y.get(trial).map(|&v| v as i64),
            Labels::PerSample(_) => None,
        }
    }

    /// A new dataset holding only the given trials, in the given order.
    ///
    /// Channel names, stimuli and sampling frequency are carried over unchanged.
    pub fn select(&self, trials: &[usize]) -> Result<Eeg> {
        let n_trials = self.n_trials();
        if let Some(&index) = trials.iter().find(|&&t| t >= n_trials) {
            return Err(EegError::TrialOutOfRange { index, n_trials });
        }
        Eeg::new(
            self.data.select(Axis(0), trials),
            self.labels.select(trials),
            self.channels.clone(),
            self.stimuli.clone(),
            self.fs,
        )
    }

    /// A new dataset holding the single trial `index`.
    pub fn trial(&self, index: usize) -> Result<Eeg> {
        self.select(&[index])
    }
}
