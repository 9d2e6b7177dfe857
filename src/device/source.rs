use crate::stream::types::{Marker, MarkerEvent, SampleEvent};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Trait for live sensor devices.
///
/// Every call is non-blocking: the pop methods return whatever is queued
/// right now, possibly nothing. Implementations wrap a vendor SDK; this
/// crate only ships the mock and synthetic sources.
pub trait DeviceSource: Send {
    /// Drain all queued samples, oldest first.
    fn pop_all_samples(&mut self) -> Vec<SampleEvent>;

    /// Drain all queued markers, oldest first.
    fn pop_all_markers(&mut self) -> Vec<MarkerEvent>;

    /// Channel names in the order samples carry them.
    fn channel_names(&self) -> Vec<String>;

    /// Sampling rate in Hz.
    fn sampling_rate(&self) -> f64;

    /// Whether the device is attached.
    fn is_attached(&self) -> bool;
}

#[derive(Debug, Default)]
struct MockQueues {
    samples: VecDeque<SampleEvent>,
    markers: VecDeque<MarkerEvent>,
    sample_pops: usize,
}

/// Mock device for testing.
///
/// Clones share their queues, so a test can keep one clone to push events
/// while the distributor owns another.
#[derive(Debug, Clone)]
pub struct MockDeviceSource {
    queues: Arc<Mutex<MockQueues>>,
    channel_names: Vec<String>,
    sampling_rate: f64,
    attached: bool,
}

impl MockDeviceSource {
    /// Create a mock device with the given channel names
    pub fn new(channel_names: &[&str]) -> Self {
        Self {
            queues: Arc::new(Mutex::new(MockQueues::default())),
            channel_names: channel_names.iter().map(|c| c.to_string()).collect(),
            sampling_rate: crate::defaults::SAMPLING_RATE,
            attached: true,
        }
    }

    /// Configure the reported sampling rate
    pub fn with_sampling_rate(mut self, rate: f64) -> Self {
        self.sampling_rate = rate;
        self
    }

    /// Configure the device to report itself detached
    pub fn detached(mut self) -> Self {
        self.attached = false;
        self
    }

    /// Queue one sample
    pub fn push_sample(&self, timestamp: f64, channels: Vec<f64>) {
        if let Ok(mut queues) = self.queues.lock() {
            queues.samples.push_back(SampleEvent::new(timestamp, channels));
        }
    }

    /// Queue one marker
    pub fn push_marker(&self, timestamp: f64, marker: impl Into<Marker>) {
        if let Ok(mut queues) = self.queues.lock() {
            queues
                .markers
                .push_back(MarkerEvent::new(timestamp, marker.into()));
        }
    }

    /// Number of samples still queued
    pub fn pending_samples(&self) -> usize {
        self.queues.lock().map(|q| q.samples.len()).unwrap_or(0)
    }

    /// How many times `pop_all_samples` has been called
    pub fn sample_pops(&self) -> usize {
        self.queues.lock().map(|q| q.sample_pops).unwrap_or(0)
    }
}

impl DeviceSource for MockDeviceSource {
    fn pop_all_samples(&mut self) -> Vec<SampleEvent> {
        match self.queues.lock() {
            Ok(mut queues) => {
                queues.sample_pops += 1;
                queues.samples.drain(..).collect()
            }
            Err(_) => Vec::new(),
        }
    }

    fn pop_all_markers(&mut self) -> Vec<MarkerEvent> {
        self.queues
            .lock()
            .map(|mut q| q.markers.drain(..).collect())
            .unwrap_or_default()
    }

    fn channel_names(&self) -> Vec<String> {
        self.channel_names.clone()
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn is_attached(&self) -> bool {
        self.attached
    }
}
