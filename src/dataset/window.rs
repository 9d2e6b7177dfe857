//! Sliding-window re-segmentation of trials.

use crate::dataset::eeg::{Eeg, Labels};
use crate::error::{EegError, Result};
use ndarray::{Array1, Array2, Array3, ArrayView1, Axis, s, stack};

fn samples(name: &'static str, seconds: f64, fs: f64) -> Result<usize> {
    let n = if seconds.is_finite() && seconds > 0.0 {
        (seconds * fs) as usize
    } else {
        0
    };
    if n == 0 {
        return Err(EegError::InvalidParameter {
            name,
            message: format!("{seconds}s at {fs} Hz is less than one sample"),
        });
    }
    Ok(n)
}

/// Start offsets of every window of `width` samples that fits in `len`.
///
/// `step` may be fractional; window `k` starts at `trunc(k * step)` so the
/// offsets track `k * stride` seconds instead of accumulating truncation.
fn window_starts(len: usize, width: usize, step: f64) -> impl Iterator<Item = usize> {
    let usable = width > 0 && step >= 1.0 && len >= width;
    (0..)
        .map(move |k: usize| (k as f64 * step) as usize)
        .take_while(move |&start| usable && start + width <= len)
}

/// Cuts every trial into overlapping windows of `window_size` seconds,
/// starting every `stride` seconds.
///
/// Only windows that fit entirely inside their trial are kept. Each window
/// keeps its trial's label (or the matching slice of per-sample labels)
/// along with channel names, stimuli and sampling frequency.
pub fn chunkify(eeg: &Eeg, window_size: f64, stride: f64) -> Result<Eeg> {
    let fs = eeg.fs();
    let width = samples("window_size", window_size, fs)?;
    samples("stride", stride, fs)?;
    let step = stride * fs;
    let data = eeg.data();

    let mut windows = Vec::new();
    let mut origins = Vec::new();
    for trial in 0..eeg.n_trials() {
        for start in window_starts(eeg.n_samples(), width, step) {
            windows.push(data.slice(s![trial, start..start + width, ..]));
            origins.push((trial, start));
        }
    }

    let chunked = if windows.is_empty() {
        Array3::zeros((0, width, eeg.n_channels()))
    } else {
        stack(Axis(0), &windows)?
    };

    let labels = match eeg.labels() {
        Labels::PerTrial(y) => Labels::PerTrial(
            origins
                .iter()
                .map(|&(trial, _)| y[trial])
                .collect::<Array1<f64>>(),
        ),
        Labels::PerSample(y) => {
            let rows: Vec<ArrayView1<f64>> = origins
                .iter()
                .map(|&(trial, start)| y.slice(s![trial, start..start + width]))
                .collect();
            Labels::PerSample(if rows.is_empty() {
                Array2::zeros((0, width))
            } else {
                stack(Axis(0), &rows)?
            })
        }
    };

    log::debug!(
        "chunkify: {} trials -> {} windows of {} samples",
        eeg.n_trials(),
        origins.len(),
        width
    );
    Eeg::new(
        chunked,
        labels,
        eeg.channels().to_vec(),
        eeg.stimuli().to_vec(),
        fs,
    )
}

/// Number of windows [`chunkify`] cuts from one trial of `len` samples,
/// with `step` the stride in (possibly fractional) samples.
pub fn window_count(len: usize, width: usize, step: f64) -> usize {
    window_starts(len, width, step).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn dataset(n_trials: usize, n_samples: usize, fs: f64) -> Eeg {
        let data = Array::from_shape_fn((n_trials, n_samples, 2), |(t, s, c)| {
            (t * 1000 + s) as f64 + c as f64 * 0.5
        });
        let labels = Labels::PerTrial(Array1::from_iter((0..n_trials).map(|t| t as f64)));
        Eeg::new(
            data,
            labels,
            vec!["O1".to_string(), "O2".to_string()],
            vec![12.0, 15.0],
            fs,
        )
        .unwrap()
    }

    #[test]
    fn partial_window_is_dropped() {
        let eeg = dataset(1, 250, 100.0);
        let windows = chunkify(&eeg, 2.0, 1.0).unwrap();
        assert_eq!(windows.data().dim(), (1, 200, 2));
        assert_eq!(windows.data()[[0, 199, 0]], 199.0);
    }

    #[test]
    fn exact_fit_keeps_last_window() {
        let eeg = dataset(1, 300, 100.0);
        let windows = chunkify(&eeg, 2.0, 1.0).unwrap();
        assert_eq!(windows.n_trials(), 2);
        assert_eq!(windows.data()[[1, 0, 0]], 100.0);
        assert_eq!(windows.data()[[1, 199, 1]], 299.5);
    }

    #[test]
    fn windows_inherit_trial_labels_and_metadata() {
        let eeg = dataset(3, 40, 10.0);
        let windows = chunkify(&eeg, 1.0, 0.5).unwrap();

        // (40 - 10) / 5 + 1 = 7 windows per trial
        assert_eq!(windows.n_trials(), 21);
        assert_eq!(windows.n_samples(), 10);
        match windows.labels() {
            Labels::PerTrial(y) => {
                assert!(y.iter().take(7).all(|&l| l == 0.0));
                assert!(y.iter().skip(14).all(|&l| l == 2.0));
            }
            other => panic!("expected per-trial labels, got {other:?}"),
        }
        assert_eq!(windows.data()[[7, 0, 0]], 1000.0);
        assert_eq!(windows.channels(), eeg.channels());
        assert_eq!(windows.stimuli(), eeg.stimuli());
        assert_eq!(windows.fs(), eeg.fs());
    }

    #[test]
    fn per_sample_labels_are_sliced() {
        let data = Array3::<f64>::zeros((1, 6, 1));
        let labels = Labels::PerSample(ndarray::array![[f64::NAN, 1.0, 1.0, 2.0, 2.0, 2.0]]);
        let eeg = Eeg::new(data, labels, vec!["O1".to_string()], vec![], 1.0).unwrap();

        let windows = chunkify(&eeg, 3.0, 2.0).unwrap();
        assert_eq!(windows.n_trials(), 2);
        match windows.labels() {
            Labels::PerSample(y) => {
                assert!(y[[0, 0]].is_nan());
                assert_eq!(y.row(1).to_vec(), vec![1.0, 2.0, 2.0]);
            }
            other => panic!("expected per-sample labels, got {other:?}"),
        }
    }

    #[test]
    fn trials_shorter_than_window_yield_empty_dataset() {
        let eeg = dataset(2, 50, 100.0);
        let windows = chunkify(&eeg, 1.0, 0.25).unwrap();
        assert_eq!(windows.data().dim(), (0, 100, 2));
        assert_eq!(windows.labels().n_trials(), 0);
    }

    #[test]
    fn zero_sample_window_or_stride_is_rejected() {
        let eeg = dataset(1, 100, 100.0);
        assert!(matches!(
            chunkify(&eeg, 0.001, 0.5),
            Err(EegError::InvalidParameter {
                name: "window_size",
                ..
            })
        ));
        assert!(matches!(
            chunkify(&eeg, 0.5, 0.0),
            Err(EegError::InvalidParameter { name: "stride", .. })
        ));
    }

    #[test]
    fn window_count_matches_chunkify() {
        assert_eq!(window_count(250, 200, 100.0), 1);
        assert_eq!(window_count(300, 200, 100.0), 2);
        assert_eq!(window_count(199, 200, 100.0), 0);
        let eeg = dataset(2, 97, 10.0);
        let windows = chunkify(&eeg, 2.0, 0.3).unwrap();
        assert_eq!(windows.n_trials(), 2 * window_count(97, 20, 0.3 * 10.0));
    }

    #[test]
    fn fractional_stride_does_not_drift() {
        // 0.25 s at 250 Hz is 62.5 samples
        let eeg = dataset(1, 500, 250.0);
        let windows = chunkify(&eeg, 0.5, 0.25).unwrap();

        let starts: Vec<f64> = (0..windows.n_trials())
            .map(|w| windows.data()[[w, 0, 0]])
            .collect();
        assert_eq!(starts, vec![0.0, 62.0, 125.0, 187.0, 250.0, 312.0, 375.0]);
        assert_eq!(window_count(500, 125, 0.25 * 250.0), 7);
    }
}
