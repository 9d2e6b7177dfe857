//! eegrec - EEG session recording and dataset reconstruction
//!
//! A distributor fans headset samples and markers out to listeners, a recorder
//! listener persists them as CSV logs, and the dataset builder turns a session
//! directory back into labeled trials.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dataset;
pub mod defaults;
pub mod device;
pub mod error;
pub mod report;
pub mod session;
pub mod stream;

// Core traits (source → distribute → listen)
pub use device::source::DeviceSource;
pub use stream::clock::Clock;
pub use stream::listener::Listener;

// Recording
pub use session::{RecordingSession, SessionConfig, SessionHandle, SessionSummary};
pub use stream::{Distributor, DistributorConfig, Recorder, RecorderConfig};
pub use stream::types::{Marker, MarkerEvent, SampleEvent};

// Datasets
pub use dataset::{DatasetBuilder, Eeg, EpochOptions, Labels, chunkify, load, load_stream};

// Error handling
pub use error::{EegError, Result};
pub use report::{CollectingReporter, Diagnostic, LogReporter, Reporter};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        // In a git repo build, GIT_HASH is set → expect "0.1.0+<hash>"
        // In CI without git, expect plain "0.1.0"
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
            let hash_part = ver.split('+').nth(1).unwrap_or("");
            assert_eq!(
                hash_part.len(),
                7,
                "Git hash should be 7 chars, got: {}",
                hash_part
            );
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
