//! A recording session: one distributor thread feeding one recorder thread.

use crate::dataset::logs;
use crate::defaults;
use crate::device::source::DeviceSource;
use crate::error::{EegError, Result};
use crate::report::Reporter;
use crate::stream::distributor::{
    Distributor, DistributorConfig, DistributorControl, DistributorStats,
};
use crate::stream::listener::Listener;
use crate::stream::recorder::{Recorder, RecorderConfig, RecorderStats};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Configuration for a recording session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session directory; created if missing.
    pub dir: PathBuf,
    /// Stimulus frequencies written to `frequencies.txt`.
    pub stimuli: Vec<f64>,
    pub distributor: DistributorConfig,
    pub recorder: RecorderConfig,
}

impl SessionConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stimuli: defaults::LEGACY_STIMULI.to_vec(),
            distributor: DistributorConfig::default(),
            recorder: RecorderConfig::default(),
        }
    }
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Build that recorded the session, see [`crate::version_string`].
    pub version: String,
    pub dir: PathBuf,
    pub connected: bool,
    pub distributor: DistributorStats,
    pub recorder: RecorderStats,
}

/// Starts recording sessions.
pub struct RecordingSession;

impl RecordingSession {
    /// Prepares the session directory and spawns the distributor and recorder
    /// threads.
    ///
    /// The recorder is always the first listener; `extra_listeners` receive
    /// the same events after it.
    pub fn start(
        source: Box<dyn DeviceSource>,
        config: SessionConfig,
        extra_listeners: Vec<Arc<dyn Listener>>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<SessionHandle> {
        fs::create_dir_all(&config.dir)?;
        logs::write_stimuli(&config.dir.join(defaults::STIMULUS_FILE), &config.stimuli)?;

        let channel_names = source.channel_names();
        let recorder = Arc::new(
            Recorder::create(&config.dir, &channel_names, config.recorder)?
                .with_reporter(reporter.clone()),
        );

        let mut listeners: Vec<Arc<dyn Listener>> = vec![recorder.clone()];
        listeners.extend(extra_listeners);
        let distributor =
            Distributor::new(source, listeners, config.distributor).with_reporter(reporter);
        let control = distributor.control();

        let recorder_thread = {
            let recorder = recorder.clone();
            thread::Builder::new()
                .name("eegrec-recorder".to_string())
                .spawn(move || recorder.run())?
        };
        let distributor_thread = match thread::Builder::new()
            .name("eegrec-distributor".to_string())
            .spawn(move || distributor.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                recorder.stop();
                if recorder_thread.join().is_err() {
                    log::error!("recorder thread panicked during aborted start");
                }
                return Err(e.into());
            }
        };

        log::info!(
            "eegrec {} recording {} channels to {}",
            crate::version_string(),
            channel_names.len(),
            config.dir.display()
        );
        Ok(SessionHandle {
            dir: config.dir,
            control,
            recorder,
            distributor_thread,
            recorder_thread,
        })
    }
}

/// Handle to a running session.
pub struct SessionHandle {
    dir: PathBuf,
    control: Arc<DistributorControl>,
    recorder: Arc<Recorder>,
    distributor_thread: JoinHandle<DistributorStats>,
    recorder_thread: JoinHandle<Result<RecorderStats>>,
}

impl SessionHandle {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the device has produced any samples yet.
    pub fn is_connected(&self) -> bool {
        self.control.is_connected()
    }

    /// Stops the session and waits for both threads.
    ///
    /// The distributor stops first so nothing reaches the recorder after its
    /// final flush.
    pub fn stop(self) -> Result<SessionSummary> {
        self.control.stop();
        let distributor = join(self.distributor_thread, "distributor");

        self.recorder.stop();
        let recorder = join(self.recorder_thread, "recorder");

        let distributor = distributor?;
        let recorder = recorder??;
        log::info!(
            "Session stopped: {} samples, {} markers written to {}",
            recorder.samples_written,
            recorder.markers_written,
            self.dir.display()
        );
        Ok(SessionSummary {
            version: crate::version_string(),
            dir: self.dir,
            connected: self.control.is_connected(),
            distributor,
            recorder,
        })
    }
}

fn join<T>(handle: JoinHandle<T>, worker: &'static str) -> Result<T> {
    handle.join().map_err(|panic_info| EegError::WorkerPanicked {
        worker,
        message: panic_message(panic_info.as_ref()),
    })
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    panic_info
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("unknown panic")
        .to_string()
}

/// Fresh session directory under `root`, named after `now` as
/// `YYYY-MM-DD-HH-MM-SS`.
pub fn session_dir(root: &Path, now: NaiveDateTime) -> PathBuf {
    root.join(now.format("%Y-%m-%d-%H-%M-%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::source::MockDeviceSource;
    use crate::report::CollectingReporter;
    use crate::stream::listener::CollectorListener;
    use chrono::NaiveDate;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn fast_config(dir: &Path) -> SessionConfig {
        let mut config = SessionConfig::new(dir);
        config.distributor.poll_interval = Duration::from_millis(5);
        config.recorder.flush_interval = Duration::from_millis(5);
        config
    }

    fn wait_until(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn session_records_everything_seen_before_stop() {
        let dir = TempDir::new().unwrap();
        let session_dir = dir.path().join("run");
        let device = MockDeviceSource::new(&["O1", "O2"]);
        let collector = Arc::new(CollectorListener::new());
        let reporter = Arc::new(CollectingReporter::new());

        for i in 0..20 {
            device.push_sample(i as f64 * 0.01, vec![i as f64, 0.0]);
        }
        device.push_marker(0.05, 1i64);

        let handle = RecordingSession::start(
            Box::new(device.clone()),
            fast_config(&session_dir),
            vec![collector.clone() as Arc<dyn Listener>],
            reporter,
        )
        .unwrap();
        wait_until(|| collector.samples().len() == 20);
        assert!(handle.is_connected());

        let summary = handle.stop().unwrap();
        assert!(summary.connected);
        assert_eq!(summary.version, crate::version_string());
        assert_eq!(summary.distributor.samples, 20);
        assert_eq!(summary.distributor.markers, 1);
        assert_eq!(summary.recorder.samples_written, 20);
        assert_eq!(summary.recorder.markers_written, 1);

        let data = fs::read_to_string(session_dir.join("data.csv")).unwrap();
        assert_eq!(data.lines().count(), 21);
        assert_eq!(data.lines().next(), Some("timestamp,O1,O2"));
        let markers = fs::read_to_string(session_dir.join("markers.csv")).unwrap();
        assert_eq!(markers, "timestamp,marker\n0.05,1\n");
        let stimuli = fs::read_to_string(session_dir.join("frequencies.txt")).unwrap();
        assert_eq!(stimuli, "12,13,14,15\n");
        assert_eq!(collector.markers().len(), 1);
    }

    #[test]
    fn stop_without_data_leaves_empty_logs() {
        let dir = TempDir::new().unwrap();
        let device = MockDeviceSource::new(&["O1"]);

        let handle = RecordingSession::start(
            Box::new(device),
            fast_config(dir.path()),
            Vec::new(),
            Arc::new(CollectingReporter::new()),
        )
        .unwrap();
        assert!(!handle.is_connected());

        let started = Instant::now();
        let summary = handle.stop().unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!summary.connected);
        assert_eq!(summary.recorder.samples_written, 0);

        let data = fs::read_to_string(dir.path().join("data.csv")).unwrap();
        assert_eq!(data, "timestamp,O1\n");
    }

    #[test]
    fn unwritable_directory_fails_to_start() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, "").unwrap();

        let result = RecordingSession::start(
            Box::new(MockDeviceSource::new(&["O1"])),
            SessionConfig::new(&file),
            Vec::new(),
            Arc::new(CollectingReporter::new()),
        );
        assert!(matches!(result, Err(EegError::Io(_))));
    }

    #[test]
    fn session_dir_uses_timestamp_name() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 30)
            .unwrap();
        assert_eq!(
            session_dir(Path::new("recordings"), now),
            PathBuf::from("recordings/2024-03-07-09-05-30")
        );
    }

    #[test]
    fn panic_message_extracts_text() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
