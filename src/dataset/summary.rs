//! Serializable overview of a dataset, printed by `eegrec inspect`.

use crate::dataset::builder::LoadReport;
use crate::dataset::eeg::{Eeg, Labels};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    /// (trials, samples, channels)
    pub shape: [usize; 3],
    pub channels: Vec<String>,
    pub fs: f64,
    pub stimuli: Vec<f64>,
    /// Trials per class in epoch mode, samples per class in stream mode.
    pub labels: BTreeMap<i64, usize>,
    /// Samples without a label (stream mode only).
    pub unlabeled: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<LoadReport>,
}

impl DatasetSummary {
    pub fn new(eeg: &Eeg, report: Option<&LoadReport>) -> Self {
        let mut labels = BTreeMap::new();
        let mut unlabeled = 0;
        let values: Box<dyn Iterator<Item = &f64>> = match eeg.labels() {
            Labels::PerTrial(y) => Box::new(y.iter()),
            Labels::PerSample(y) => Box::new(y.iter()),
        };
        for &value in values {
            if value.is_nan() {
                unlabeled += 1;
            } else {
                *labels.entry(value as i64).or_insert(0) += 1;
            }
        }

        Self {
            shape: [eeg.n_trials(), eeg.n_samples(), eeg.n_channels()],
            channels: eeg.channels().to_vec(),
            fs: eeg.fs(),
            stimuli: eeg.stimuli().to_vec(),
            labels,
            unlabeled,
            report: report.cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, array};

    #[test]
    fn counts_trials_per_class() {
        let eeg = Eeg::new(
            Array3::zeros((4, 3, 1)),
            Labels::PerTrial(array![0.0, 2.0, 2.0, 1.0]),
            vec!["O1".to_string()],
            vec![12.0],
            300.0,
        )
        .unwrap();

        let summary = DatasetSummary::new(&eeg, None);
        assert_eq!(summary.shape, [4, 3, 1]);
        assert_eq!(summary.labels, BTreeMap::from([(0, 1), (1, 1), (2, 2)]));
        assert_eq!(summary.unlabeled, 0);
    }

    #[test]
    fn counts_unlabeled_samples() {
        let eeg = Eeg::new(
            Array3::zeros((1, 4, 1)),
            Labels::PerSample(array![[f64::NAN, f64::NAN, 3.0, 3.0]]),
            vec!["O1".to_string()],
            vec![],
            100.0,
        )
        .unwrap();

        let report = LoadReport {
            legacy_markers: 1,
            ..LoadReport::default()
        };
        let summary = DatasetSummary::new(&eeg, Some(&report));
        assert_eq!(summary.unlabeled, 2);
        assert_eq!(summary.labels, BTreeMap::from([(3, 2)]));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["shape"], serde_json::json!([1, 4, 1]));
        assert_eq!(json["report"]["legacy_markers"], 1);
    }
}
