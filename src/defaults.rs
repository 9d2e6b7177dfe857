//! Default configuration constants for eegrec.
//!
//! Shared by the runtime configs and the TOML config so both agree on
//! the same values.

/// Poll interval of the distributor loop in milliseconds.
pub const POLL_INTERVAL_MS: u64 = 100;

/// Gap without device events after which a stall is reported, in milliseconds.
pub const DISCONNECT_TIMEOUT_MS: u64 = 1000;

/// Number of queued samples that triggers a write to the sample log.
///
/// Markers are written on every pass; samples are batched to bound the
/// number of writes per second at typical EEG rates (300 Hz and up).
pub const BATCH_SIZE: usize = 100;

/// Sleep between recorder flush passes in milliseconds.
pub const FLUSH_INTERVAL_MS: u64 = 100;

/// Default sampling frequency in Hz.
pub const SAMPLING_RATE: f64 = 300.0;

/// Default epoch offset from the marker timestamp, in seconds.
pub const EPOCH_START: f64 = 0.0;

/// Default epoch length in seconds.
pub const EPOCH_LENGTH: f64 = 8.0;

/// Default sliding window width in seconds.
pub const WINDOW_SIZE: f64 = 1.0;

/// Default sliding window stride in seconds.
pub const WINDOW_STRIDE: f64 = 0.25;

/// Stimulus frequencies assumed for recordings that predate `frequencies.txt`.
pub const LEGACY_STIMULI: [f64; 4] = [12.0, 13.0, 14.0, 15.0];

/// Marker labels written by older recordings, in class order.
pub const LEGACY_LABELS: [&str; 4] = ["left", "right", "top", "bottom"];

/// Default root directory for new recording sessions.
pub const DATASET_PATH: &str = "recordings";

/// Session directory file names.
pub const SAMPLE_LOG: &str = "data.csv";
pub const MARKER_LOG: &str = "markers.csv";
pub const STIMULUS_FILE: &str = "frequencies.txt";

/// Sample log columns that never hold channel data.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const TRIGGER_COLUMN: &str = "TRG";
pub const MARKER_COLUMN: &str = "marker";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_tables_line_up() {
        assert_eq!(LEGACY_LABELS.len(), LEGACY_STIMULI.len());
    }

    #[test]
    fn window_stride_fits_inside_window() {
        assert!(WINDOW_STRIDE <= WINDOW_SIZE);
    }
}
