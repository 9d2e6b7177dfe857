//! Advisory diagnostics and how they are reported.
//!
//! Nothing in here is fatal. Fatal conditions travel as [`crate::error::EegError`];
//! a [`Diagnostic`] only tells the caller that processing continued past
//! something worth knowing about.

use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Advisory conditions raised while recording or loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// No device events for longer than the disconnect timeout.
    DeviceStalled { silent_for: Duration },
    /// Events arrived again after a stall.
    DeviceRecovered { silent_for: Duration },
    /// A sample vector did not match the session's channel count and was dropped.
    SampleWidthMismatch { expected: usize, actual: usize },
    /// A legacy string marker was mapped to a class id.
    LegacyMarker { label: String, class: i64 },
    /// `frequencies.txt` was missing; the legacy stimulus set was assumed.
    DefaultStimuli { path: PathBuf, stimuli: Vec<f64> },
    /// A sample log row could not be parsed and was skipped.
    MalformedRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    /// A sample log timestamp went backwards.
    UnsortedSamples { path: PathBuf, line: u64 },
    /// A marker had too few trailing samples for a full epoch.
    TrialSkipped {
        index: usize,
        marker: String,
        available: usize,
        required: usize,
    },
}

impl Diagnostic {
    /// Recoveries are good news; everything else is a warning.
    pub fn is_warning(&self) -> bool {
        !matches!(self, Diagnostic::DeviceRecovered { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DeviceStalled { silent_for } => write!(
                f,
                "Headset connection timed out ({:.1}s without data)",
                silent_for.as_secs_f64()
            ),
            Diagnostic::DeviceRecovered { silent_for } => write!(
                f,
                "Headset data resumed after {:.1}s",
                silent_for.as_secs_f64()
            ),
            Diagnostic::SampleWidthMismatch { expected, actual } => write!(
                f,
                "Dropped sample with {actual} channels (session has {expected})"
            ),
            Diagnostic::LegacyMarker { label, class } => {
                write!(f, "Interpreting legacy marker type {label} as class {class}")
            }
            Diagnostic::DefaultStimuli { path, stimuli } => write!(
                f,
                "Cannot load {}, assuming legacy values of {stimuli:?}",
                path.display()
            ),
            Diagnostic::MalformedRow { path, line, reason } => {
                write!(f, "Skipping row {}:{line}: {reason}", path.display())
            }
            Diagnostic::UnsortedSamples { path, line } => write!(
                f,
                "Timestamp decreases at {}:{line}; epochs may be misaligned",
                path.display()
            ),
            Diagnostic::TrialSkipped {
                index,
                marker,
                available,
                required,
            } => write!(
                f,
                "Skipping marker={marker} (trial {index}): {available} of {required} samples available"
            ),
        }
    }
}

/// Trait for reporting diagnostics.
pub trait Reporter: Send + Sync {
    /// Reports a diagnostic raised by `source` (a component name).
    fn report(&self, source: &str, diagnostic: &Diagnostic);
}

/// Reporter that forwards to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, source: &str, diagnostic: &Diagnostic) {
        if diagnostic.is_warning() {
            log::warn!("[{}] {}", source, diagnostic);
        } else {
            log::info!("[{}] {}", source, diagnostic);
        }
    }
}

/// Reporter that keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    collected: Mutex<Vec<(String, Diagnostic)>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.collected
            .lock()
            .map(|c| c.iter().map(|(_, d)| d.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of diagnostics matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Diagnostic) -> bool) -> usize {
        self.diagnostics().iter().filter(|d| predicate(d)).count()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, source: &str, diagnostic: &Diagnostic) {
        if let Ok(mut collected) = self.collected.lock() {
            collected.push((source.to_string(), diagnostic.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_legacy_marker_display() {
        let diagnostic = Diagnostic::LegacyMarker {
            label: "top".to_string(),
            class: 2,
        };
        assert_eq!(
            diagnostic.to_string(),
            "Interpreting legacy marker type top as class 2"
        );
    }

    #[test]
    fn test_trial_skipped_display() {
        let diagnostic = Diagnostic::TrialSkipped {
            index: 3,
            marker: "1".to_string(),
            available: 120,
            required: 2400,
        };
        assert_eq!(
            diagnostic.to_string(),
            "Skipping marker=1 (trial 3): 120 of 2400 samples available"
        );
    }

    #[test]
    fn test_stall_display_uses_seconds() {
        let diagnostic = Diagnostic::DeviceStalled {
            silent_for: Duration::from_millis(1500),
        };
        assert_eq!(
            diagnostic.to_string(),
            "Headset connection timed out (1.5s without data)"
        );
    }

    #[test]
    fn test_recovery_is_not_a_warning() {
        let recovered = Diagnostic::DeviceRecovered {
            silent_for: Duration::from_secs(2),
        };
        let stalled = Diagnostic::DeviceStalled {
            silent_for: Duration::from_secs(2),
        };
        assert!(!recovered.is_warning());
        assert!(stalled.is_warning());
    }

    #[test]
    fn test_log_reporter() {
        let reporter = LogReporter;
        // Just ensure it doesn't panic without a logger installed
        reporter.report(
            "test",
            &Diagnostic::SampleWidthMismatch {
                expected: 4,
                actual: 3,
            },
        );
    }

    #[test]
    fn test_collecting_reporter_counts() {
        let reporter = CollectingReporter::new();
        reporter.report(
            "builder",
            &Diagnostic::LegacyMarker {
                label: "left".to_string(),
                class: 0,
            },
        );
        reporter.report(
            "builder",
            &Diagnostic::TrialSkipped {
                index: 0,
                marker: "1".to_string(),
                available: 0,
                required: 10,
            },
        );

        assert_eq!(reporter.diagnostics().len(), 2);
        assert_eq!(
            reporter.count(|d| matches!(d, Diagnostic::TrialSkipped { .. })),
            1
        );
    }

    #[test]
    fn test_reporter_is_object_safe() {
        let reporter: Arc<dyn Reporter> = Arc::new(CollectingReporter::new());
        reporter.report(
            "distributor",
            &Diagnostic::DeviceStalled {
                silent_for: Duration::from_secs(1),
            },
        );
    }
}
