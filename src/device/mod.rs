//! Sources of headset samples and markers.

pub mod source;
pub mod synthetic;

pub use source::{DeviceSource, MockDeviceSource};
pub use synthetic::SyntheticSource;
