//! Fans device events out to listeners.
//!
//! One thread runs [`Distributor::run`]; another thread (usually the one that
//! spawned it) stops it through the shared [`DistributorControl`].

use crate::defaults;
use crate::device::source::DeviceSource;
use crate::report::{Diagnostic, LogReporter, Reporter};
use crate::stream::clock::{Clock, SystemClock};
use crate::stream::listener::Listener;
use crate::stream::types::SampleEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const NAME: &str = "distributor";

/// Configuration for the distributor loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributorConfig {
    /// Sleep between polls of the device queues.
    pub poll_interval: Duration,
    /// Report a stall after this long without events. `None` disables it.
    pub disconnect_timeout: Option<Duration>,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
            disconnect_timeout: Some(Duration::from_millis(defaults::DISCONNECT_TIMEOUT_MS)),
        }
    }
}

/// Flags shared between the distributor thread and its controller.
#[derive(Debug, Default)]
pub struct DistributorControl {
    stopped: AtomicBool,
    connected: AtomicBool,
}

impl DistributorControl {
    /// Ask the loop to exit after one final drain. Idempotent.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// True once the device has produced its first sample.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Counters returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DistributorStats {
    pub samples: u64,
    pub markers: u64,
    pub stalls: u64,
}

/// Pulls device events on a fixed cadence and hands them to every listener.
pub struct Distributor {
    source: Box<dyn DeviceSource>,
    listeners: Vec<Arc<dyn Listener>>,
    config: DistributorConfig,
    control: Arc<DistributorControl>,
    reporter: Arc<dyn Reporter>,
    clock: Arc<dyn Clock>,
    /// Batch observed while waiting for the connection, delivered on the next poll.
    pending: Vec<SampleEvent>,
    last_event: Option<Instant>,
    stalled: bool,
    stats: DistributorStats,
}

impl Distributor {
    pub fn new(
        source: Box<dyn DeviceSource>,
        listeners: Vec<Arc<dyn Listener>>,
        config: DistributorConfig,
    ) -> Self {
        Self {
            source,
            listeners,
            config,
            control: Arc::new(DistributorControl::default()),
            reporter: Arc::new(LogReporter),
            clock: Arc::new(SystemClock),
            pending: Vec::new(),
            last_event: None,
            stalled: false,
            stats: DistributorStats::default(),
        }
    }

    /// Sets a custom diagnostic reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Sets a custom clock (for deterministic testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Handle used to stop the loop from another thread.
    pub fn control(&self) -> Arc<DistributorControl> {
        self.control.clone()
    }

    /// Channel names reported by the device.
    pub fn channel_names(&self) -> Vec<String> {
        self.source.channel_names()
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    /// Blocks until the device produces its first samples or the distributor
    /// is stopped. Returns whether data was seen.
    ///
    /// The first batch is kept and delivered by the next [`poll_once`](Self::poll_once).
    pub fn wait_for_connection(&mut self) -> bool {
        while !self.control.is_stopped() {
            let batch = self.source.pop_all_samples();
            if !batch.is_empty() {
                self.pending = batch;
                self.control.connected.store(true, Ordering::SeqCst);
                return true;
            }
            thread::sleep(self.config.poll_interval);
        }
        self.control.is_connected()
    }

    /// Runs until stopped, then drains the device one last time.
    pub fn run(mut self) -> DistributorStats {
        if self.wait_for_connection() {
            log::info!(
                "[{NAME}] device connected, distributing to {} listener(s)",
                self.listeners.len()
            );
        }
        self.last_event = Some(self.clock.now());

        loop {
            let stopping = self.control.is_stopped();
            self.poll_once();
            if stopping {
                break;
            }
            thread::sleep(self.config.poll_interval);
        }

        log::debug!(
            "[{NAME}] stopped after {} samples, {} markers",
            self.stats.samples,
            self.stats.markers
        );
        self.stats
    }

    /// One poll tick: drain samples, then markers, deliver them all, and
    /// update stall tracking. Returns the number of events delivered.
    pub fn poll_once(&mut self) -> usize {
        let mut samples = std::mem::take(&mut self.pending);
        samples.extend(self.source.pop_all_samples());
        for event in &samples {
            for listener in &self.listeners {
                listener.ingest_data(event.timestamp, &event.channels);
            }
        }

        let markers = self.source.pop_all_markers();
        for event in &markers {
            for listener in &self.listeners {
                listener.ingest_marker(event.timestamp, &event.marker);
            }
        }

        let delivered = samples.len() + markers.len();
        self.stats.samples += samples.len() as u64;
        self.stats.markers += markers.len() as u64;
        self.track_liveness(delivered > 0);
        delivered
    }

    pub fn stats(&self) -> DistributorStats {
        self.stats
    }

    fn track_liveness(&mut self, received: bool) {
        let now = self.clock.now();
        let last = *self.last_event.get_or_insert(now);
        let silent_for = now.saturating_duration_since(last);

        if received {
            if self.stalled {
                self.stalled = false;
                self.reporter
                    .report(NAME, &Diagnostic::DeviceRecovered { silent_for });
            }
            self.last_event = Some(now);
            return;
        }

        if let Some(timeout) = self.config.disconnect_timeout
            && !self.stalled
            && silent_for > timeout
        {
            self.stalled = true;
            self.stats.stalls += 1;
            self.reporter
                .report(NAME, &Diagnostic::DeviceStalled { silent_for });
        }
    }
}
