use crate::stream::types::{Marker, MarkerEvent, SampleEvent};
use std::sync::Mutex;

/// Anything that receives the distributor's sample and marker streams.
///
/// Calls arrive on the distributor thread, so implementations must only do
/// cheap, non-blocking work here (typically: enqueue for another thread).
pub trait Listener: Send + Sync {
    /// Receive one sample. `sample` is in session channel order.
    fn ingest_data(&self, timestamp: f64, sample: &[f64]);

    /// Receive one marker.
    fn ingest_marker(&self, timestamp: f64, marker: &Marker);

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "listener"
    }
}

/// Listener that keeps everything it receives in memory.
///
/// Handy for tests and for embedding consumers that poll (live plots etc.).
#[derive(Debug, Default)]
pub struct CollectorListener {
    samples: Mutex<Vec<SampleEvent>>,
    markers: Mutex<Vec<MarkerEvent>>,
}

impl CollectorListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<SampleEvent> {
        self.samples.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn markers(&self) -> Vec<MarkerEvent> {
        self.markers.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Removes and returns all collected samples.
    pub fn take_samples(&self) -> Vec<SampleEvent> {
        self.samples
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default()
    }
}

impl Listener for CollectorListener {
    fn ingest_data(&self, timestamp: f64, sample: &[f64]) {
        if let Ok(mut samples) = self.samples.lock() {
            samples.push(SampleEvent::new(timestamp, sample.to_vec()));
        }
    }

    fn ingest_marker(&self, timestamp: f64, marker: &Marker) {
        if let Ok(mut markers) = self.markers.lock() {
            markers.push(MarkerEvent::new(timestamp, marker.clone()));
        }
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
