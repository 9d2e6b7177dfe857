//! Error types for eegrec.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EegError {
    // Session directory errors
    #[error("Missing {file} in dataset directory {}", dir.display())]
    MissingLog { file: String, dir: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    LogRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    LogWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} has no '{column}' column", path.display())]
    MissingColumn { path: PathBuf, column: String },

    // Marker errors
    #[error("Malformed marker row at {}:{line}: {message}", path.display())]
    MalformedMarker {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("Unknown marker label '{label}' in {}", path.display())]
    UnknownMarker { label: String, path: PathBuf },

    #[error("Malformed stimulus file {}: {message}", path.display())]
    MalformedStimuli { path: PathBuf, message: String },

    // Dataset errors
    #[error("Invalid value for {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("Inconsistent dataset: {message}")]
    InconsistentDataset { message: String },

    #[error("Trial index {index} out of range for {n_trials} trials")]
    TrialOutOfRange { index: usize, n_trials: usize },

    #[error("Dataset shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    // Worker errors
    #[error("{worker} thread panicked: {message}")]
    WorkerPanicked {
        worker: &'static str,
        message: String,
    },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EegError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_missing_log_names_file_and_directory() {
        let error = EegError::MissingLog {
            file: "markers.csv".to_string(),
            dir: PathBuf::from("/data/2024-01-01-10-00-00"),
        };
        assert_eq!(
            error.to_string(),
            "Missing markers.csv in dataset directory /data/2024-01-01-10-00-00"
        );
    }

    #[test]
    fn test_missing_column_display() {
        let error = EegError::MissingColumn {
            path: PathBuf::from("session/data.csv"),
            column: "timestamp".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "session/data.csv has no 'timestamp' column"
        );
    }

    #[test]
    fn test_malformed_marker_display() {
        let error = EegError::MalformedMarker {
            path: PathBuf::from("markers.csv"),
            line: 4,
            message: "invalid timestamp 'abc'".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Malformed marker row at markers.csv:4: invalid timestamp 'abc'"
        );
    }

    #[test]
    fn test_unknown_marker_display() {
        let error = EegError::UnknownMarker {
            label: "middle".to_string(),
            path: PathBuf::from("markers.csv"),
        };
        assert_eq!(
            error.to_string(),
            "Unknown marker label 'middle' in markers.csv"
        );
    }

    #[test]
    fn test_invalid_parameter_display() {
        let error = EegError::InvalidParameter {
            name: "stride",
            message: "resolves to zero samples".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid value for stride: resolves to zero samples"
        );
    }

    #[test]
    fn test_trial_out_of_range_display() {
        let error = EegError::TrialOutOfRange {
            index: 7,
            n_trials: 3,
        };
        assert_eq!(
            error.to_string(),
            "Trial index 7 out of range for 3 trials"
        );
    }

    #[test]
    fn test_worker_panicked_display() {
        let error = EegError::WorkerPanicked {
            worker: "recorder",
            message: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "recorder thread panicked: boom");
    }

    #[test]
    fn test_log_write_keeps_source() {
        let io_error = io::Error::new(io::ErrorKind::StorageFull, "disk full");
        let error = EegError::LogWrite {
            path: PathBuf::from("data.csv"),
            source: csv::Error::from(io_error),
        };
        assert!(error.to_string().starts_with("Failed to write data.csv"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: EegError = io_error.into();
        assert!(matches!(error, EegError::Io(_)));
        assert!(error.to_string().starts_with("I/O error:"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_error() -> Result<()> {
            Err(EegError::InconsistentDataset {
                message: "labels".to_string(),
            })
        }
        assert!(returns_error().is_err());
    }
}
