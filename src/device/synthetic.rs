//! Clock-driven SSVEP-like signal generator.
//!
//! Lets `eegrec record` exercise the whole pipeline without a headset.
//! Every `marker_interval` a new trial starts; its class cycles through the
//! stimulus set and the generated channels oscillate at that class's
//! stimulus frequency.

use crate::device::source::DeviceSource;
use crate::stream::clock::{Clock, SystemClock};
use crate::stream::types::{Marker, MarkerEvent, SampleEvent};
use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Amplitude of the stimulus response in microvolts.
const RESPONSE_UV: f64 = 10.0;
/// Amplitude of the simulated 50 Hz mains interference in microvolts.
const MAINS_UV: f64 = 2.0;
const MAINS_HZ: f64 = 50.0;

pub struct SyntheticSource {
    clock: Arc<dyn Clock>,
    started: Instant,
    channel_names: Vec<String>,
    sampling_rate: f64,
    stimuli: Vec<f64>,
    marker_interval: Duration,
    samples_emitted: u64,
    markers_emitted: u64,
}

impl SyntheticSource {
    /// Creates a generator with `channels` channels named `Ch1..ChN`.
    pub fn new(channels: usize, sampling_rate: f64, stimuli: Vec<f64>) -> Self {
        Self::with_clock(channels, sampling_rate, stimuli, Arc::new(SystemClock))
    }

    pub fn with_clock(
        channels: usize,
        sampling_rate: f64,
        stimuli: Vec<f64>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let started = clock.now();
        Self {
            clock,
            started,
            channel_names: (1..=channels).map(|i| format!("Ch{i}")).collect(),
            sampling_rate,
            stimuli,
            marker_interval: Duration::from_secs(4),
            samples_emitted: 0,
            markers_emitted: 0,
        }
    }

    /// Sets the time between trial onsets.
    pub fn with_marker_interval(mut self, interval: Duration) -> Self {
        self.marker_interval = interval;
        self
    }

    fn elapsed(&self) -> f64 {
        self.clock.now().duration_since(self.started).as_secs_f64()
    }

    fn class_at(&self, t: f64) -> usize {
        let interval = self.marker_interval.as_secs_f64();
        if interval <= 0.0 || self.stimuli.is_empty() {
            return 0;
        }
        (t / interval) as usize % self.stimuli.len()
    }

    fn sample_at(&self, t: f64) -> Vec<f64> {
        let frequency = self.stimuli.get(self.class_at(t)).copied().unwrap_or(0.0);
        (0..self.channel_names.len())
            .map(|c| {
                let phase = c as f64 * 0.3;
                RESPONSE_UV * (TAU * frequency * t + phase).sin()
                    + MAINS_UV * (TAU * MAINS_HZ * t).sin()
            })
            .collect()
    }
}

impl DeviceSource for SyntheticSource {
    fn pop_all_samples(&mut self) -> Vec<SampleEvent> {
        let due = (self.elapsed() * self.sampling_rate) as u64;
        let samples = (self.samples_emitted..due)
            .map(|i| {
                let t = i as f64 / self.sampling_rate;
                SampleEvent::new(t, self.sample_at(t))
            })
            .collect();
        self.samples_emitted = due.max(self.samples_emitted);
        samples
    }

    fn pop_all_markers(&mut self) -> Vec<MarkerEvent> {
        let interval = self.marker_interval.as_secs_f64();
        if interval <= 0.0 || self.stimuli.is_empty() {
            return Vec::new();
        }
        let due = (self.elapsed() / interval) as u64 + 1;
        let markers = (self.markers_emitted..due)
            .map(|k| {
                let t = k as f64 * interval;
                MarkerEvent::new(t, Marker::Class(self.class_at(t) as i64))
            })
            .collect();
        self.markers_emitted = due.max(self.markers_emitted);
        markers
    }

    fn channel_names(&self) -> Vec<String> {
        self.channel_names.clone()
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn is_attached(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::clock::MockClock;

    fn source(clock: &MockClock) -> SyntheticSource {
        SyntheticSource::with_clock(
            2,
            100.0,
            vec![12.0, 15.0],
            Arc::new(clock.clone()),
        )
        .with_marker_interval(Duration::from_secs(1))
    }

    #[test]
    fn emits_samples_as_time_passes() {
        let clock = MockClock::new();
        let mut source = source(&clock);
        assert!(source.pop_all_samples().is_empty());

        clock.advance(Duration::from_millis(500));
        let samples = source.pop_all_samples();
        assert_eq!(samples.len(), 50);
        assert_eq!(samples[0].timestamp, 0.0);
        assert_eq!(samples[0].channels.len(), 2);

        clock.advance(Duration::from_millis(500));
        let samples = source.pop_all_samples();
        assert_eq!(samples.len(), 50);
        assert_eq!(samples[0].timestamp, 0.5);
    }

    #[test]
    fn timestamps_never_decrease() {
        let clock = MockClock::new();
        let mut source = source(&clock);
        let mut all = Vec::new();
        for _ in 0..5 {
            clock.advance(Duration::from_millis(130));
            all.extend(source.pop_all_samples());
        }
        assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn markers_cycle_through_classes() {
        let clock = MockClock::new();
        let mut source = source(&clock);

        let first = source.pop_all_markers();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].timestamp, 0.0);
        assert_eq!(first[0].marker, Marker::Class(0));

        clock.advance(Duration::from_millis(2100));
        let next = source.pop_all_markers();
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].marker, Marker::Class(1));
        assert_eq!(next[1].marker, Marker::Class(0));
    }

    #[test]
    fn channel_names_are_numbered() {
        let clock = MockClock::new();
        let source = source(&clock);
        assert_eq!(source.channel_names(), vec!["Ch1", "Ch2"]);
        assert_eq!(source.sampling_rate(), 100.0);
    }
}
