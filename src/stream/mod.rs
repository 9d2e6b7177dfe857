//! Live event fan-out and durable recording.
//!
//! The distributor polls a device source on its own thread and hands every
//! sample and marker to each registered listener. The recorder is one such
//! listener; it queues events and appends them to CSV logs from a second
//! thread.

pub mod clock;
pub mod distributor;
pub mod listener;
pub mod recorder;
pub mod types;

pub use clock::{Clock, MockClock, SystemClock};
pub use distributor::{Distributor, DistributorConfig, DistributorControl, DistributorStats};
pub use listener::{CollectorListener, Listener};
pub use recorder::{Recorder, RecorderConfig, RecorderStats};
pub use types::{Marker, MarkerEvent, SampleEvent};
