//! Listener that persists the session to `data.csv` and `markers.csv`.
//!
//! Three threads are involved: the distributor thread calls the `ingest_*`
//! methods, the recorder thread runs [`Recorder::run`], and the controlling
//! thread eventually calls [`Recorder::stop`]. Each queue has exactly one
//! producer and one consumer.

use crate::defaults;
use crate::error::{EegError, Result};
use crate::report::{Diagnostic, LogReporter, Reporter};
use crate::stream::listener::Listener;
use crate::stream::types::{Marker, MarkerEvent, SampleEvent};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const NAME: &str = "recorder";

/// Configuration for the recorder flush loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Samples are written once more than this many are queued (or on stop).
    pub batch_size: usize,
    /// Sleep between flush passes.
    pub flush_interval: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            flush_interval: Duration::from_millis(defaults::FLUSH_INTERVAL_MS),
        }
    }
}

/// Rows written by the flush loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RecorderStats {
    pub samples_written: u64,
    pub markers_written: u64,
}

/// An append-only CSV log and its path, kept together for error context.
struct LogFile {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl LogFile {
    fn create(path: PathBuf, header: &[&str]) -> Result<Self> {
        let file = File::create(&path)?;
        let mut log = Self {
            writer: csv::WriterBuilder::new().flexible(false).from_writer(file),
            path,
        };
        log.append(header.iter().map(|h| h.to_string()))?;
        log.sync()?;
        Ok(log)
    }

    fn append(&mut self, record: impl IntoIterator<Item = String>) -> Result<()> {
        self.writer
            .write_record(record)
            .map_err(|source| EegError::LogWrite {
                path: self.path.clone(),
                source,
            })
    }

    /// Pushes buffered rows to the OS and asks it to persist them.
    fn sync(&mut self) -> Result<()> {
        let flushed = self
            .writer
            .flush()
            .and_then(|()| self.writer.get_ref().sync_data());
        flushed.map_err(|e| EegError::LogWrite {
            path: self.path.clone(),
            source: csv::Error::from(e),
        })
    }
}

struct SessionLogs {
    samples: LogFile,
    markers: LogFile,
}

/// Buffers incoming events and writes them to disk on its own thread.
pub struct Recorder {
    config: RecorderConfig,
    channel_count: usize,
    samples_tx: Sender<SampleEvent>,
    samples_rx: Receiver<SampleEvent>,
    markers_tx: Sender<MarkerEvent>,
    markers_rx: Receiver<MarkerEvent>,
    stopped: AtomicBool,
    logs: Mutex<SessionLogs>,
    reporter: Arc<dyn Reporter>,
}

impl Recorder {
    /// Creates `data.csv` and `markers.csv` in `dir` and writes their headers.
    ///
    /// # Arguments
    /// * `dir` - Existing session directory
    /// * `channel_names` - Names of the channels the distributor will deliver, in order
    pub fn create(dir: &Path, channel_names: &[String], config: RecorderConfig) -> Result<Self> {
        let mut sample_header = vec![defaults::TIMESTAMP_COLUMN];
        sample_header.extend(channel_names.iter().map(String::as_str));
        let samples = LogFile::create(dir.join(defaults::SAMPLE_LOG), &sample_header)?;
        let markers = LogFile::create(
            dir.join(defaults::MARKER_LOG),
            &[defaults::TIMESTAMP_COLUMN, defaults::MARKER_COLUMN],
        )?;

        let (samples_tx, samples_rx) = unbounded();
        let (markers_tx, markers_rx) = unbounded();
        Ok(Self {
            config,
            channel_count: channel_names.len(),
            samples_tx,
            samples_rx,
            markers_tx,
            markers_rx,
            stopped: AtomicBool::new(false),
            logs: Mutex::new(SessionLogs { samples, markers }),
            reporter: Arc::new(LogReporter),
        })
    }

    /// Sets a custom diagnostic reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Stop accepting events; `run` exits once the queues are drained. Idempotent.
    ///
    /// Stop the producer (the distributor) first. An `ingest_*` call racing
    /// with `stop` can enqueue one event after `run` has already drained and
    /// returned, and that event is never written.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Events queued but not yet written.
    pub fn queued(&self) -> (usize, usize) {
        (self.samples_rx.len(), self.markers_rx.len())
    }

    /// Loops until stopped, writing queued events to disk.
    ///
    /// Samples are written in batches of more than `batch_size`; markers are
    /// written on every pass. Everything queued before `stop()` is written
    /// before this returns.
    ///
    /// # Errors
    /// Any write or sync failure ends the loop; the logs are left as they were
    /// after the last successful sync. The recorder is stopped and its queues
    /// are discarded, so later events are dropped instead of piling up.
    pub fn run(&self) -> Result<RecorderStats> {
        let mut logs = self.logs.lock().map_err(|_| EegError::WorkerPanicked {
            worker: NAME,
            message: "log files poisoned by an earlier panic".to_string(),
        })?;
        let mut stats = RecorderStats::default();

        if let Err(e) = self.flush_loop(&mut logs, &mut stats) {
            self.stop();
            let dropped = self.samples_rx.try_iter().count() + self.markers_rx.try_iter().count();
            log::error!("[{NAME}] recording aborted: {e} ({dropped} queued events dropped)");
            return Err(e);
        }

        log::debug!(
            "[{NAME}] finished: {} samples, {} markers",
            stats.samples_written,
            stats.markers_written
        );
        Ok(stats)
    }

    fn flush_loop(&self, logs: &mut SessionLogs, stats: &mut RecorderStats) -> Result<()> {
        loop {
            let stopping = self.is_stopped();
            if stopping && self.samples_rx.is_empty() && self.markers_rx.is_empty() {
                return Ok(());
            }

            let queued = self.samples_rx.len();
            if queued > self.config.batch_size || (stopping && queued > 0) {
                stats.samples_written += self.write_samples(&mut logs.samples)?;
            }
            stats.markers_written += self.write_markers(&mut logs.markers)?;

            if !stopping {
                thread::sleep(self.config.flush_interval);
            }
        }
    }

    fn write_samples(&self, log: &mut LogFile) -> Result<u64> {
        let mut written = 0;
        for event in self.samples_rx.try_iter() {
            let row = std::iter::once(event.timestamp.to_string())
                .chain(event.channels.iter().map(f64::to_string));
            log.append(row)?;
            written += 1;
        }
        log.sync()?;
        Ok(written)
    }

    fn write_markers(&self, log: &mut LogFile) -> Result<u64> {
        let mut written = 0;
        for event in self.markers_rx.try_iter() {
            log.append([event.timestamp.to_string(), event.marker.to_string()])?;
            written += 1;
        }
        if written > 0 {
            log.sync()?;
        }
        Ok(written)
    }
}

impl Listener for Recorder {
    fn ingest_data(&self, timestamp: f64, sample: &[f64]) {
        if self.is_stopped() {
            return;
        }
        if sample.len() != self.channel_count {
            self.reporter.report(
                NAME,
                &Diagnostic::SampleWidthMismatch {
                    expected: self.channel_count,
                    actual: sample.len(),
                },
            );
            return;
        }
        // Both ends live in `self`, so the channel is never disconnected
        if self
            .samples_tx
            .send(SampleEvent::new(timestamp, sample.to_vec()))
            .is_err()
        {
            log::error!("[{NAME}] sample queue closed");
        }
    }

    fn ingest_marker(&self, timestamp: f64, marker: &Marker) {
        if self.is_stopped() {
            return;
        }
        if self
            .markers_tx
            .send(MarkerEvent::new(timestamp, marker.clone()))
            .is_err()
        {
            log::error!("[{NAME}] marker queue closed");
        }
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
