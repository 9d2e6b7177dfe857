//! Offline reconstruction of labeled EEG datasets from session directories.

pub mod builder;
pub mod eeg;
pub mod logs;
pub mod summary;
pub mod window;

pub use builder::{DatasetBuilder, EpochOptions, LoadReport, Loaded, load, load_stream};
pub use eeg::{Eeg, Labels};
pub use summary::DatasetSummary;
pub use window::chunkify;
