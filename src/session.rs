//! Streaming replay session
//!
//! Owns the bounded sample window and the per-sample verdict history, and
//! keeps the running counters shown to the user. Detection itself stays in
//! the stateless [`crate::dispatch`] layer: every new sample is judged
//! against a fresh read-only view of the window.

use crate::dispatch::DetectorParams;
use crate::window::{SampleWindow, DEFAULT_CAPACITY};
use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Samples collected before the first verdict is attempted
pub const DEFAULT_WARMUP: usize = 10;

/// Session tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Window capacity (FIFO eviction beyond this)
    pub capacity: usize,
    /// Detection runs only once the window holds more than this many samples
    pub warmup: usize,
    pub params: DetectorParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            warmup: DEFAULT_WARMUP,
            params: DetectorParams::default(),
        }
    }
}

/// One retained sample and its verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
    /// 1-based position in the stream (not in the window)
    pub index: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    pub value: f64,
    pub is_anomaly: bool,
    /// Detector statistic, when one could be computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl SampleRecord {
    /// Local wall-clock time of the sample
    pub fn local_time(&self) -> Option<DateTime<Local>> {
        let millis = i64::try_from(self.timestamp_ms).ok()?;
        Local.timestamp_millis_opt(millis).single()
    }

    /// `HH:MM:SS` in the host's local time zone
    pub fn clock_time(&self) -> String {
        self.local_time()
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string())
    }
}

/// Running counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionStats {
    pub data_points: u64,
    pub anomaly_count: u64,
    /// Percentage of data points flagged, 0 when nothing was streamed
    pub anomaly_rate_pct: f64,
}

/// Replay loop state
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    window: SampleWindow,
    records: VecDeque<SampleRecord>,
    data_points: u64,
    anomaly_count: u64,
    running: bool,
    started_at: SystemTime,
}

fn millis_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            window: SampleWindow::new(config.capacity),
            records: VecDeque::with_capacity(config.capacity),
            config,
            data_points: 0,
            anomaly_count: 0,
            running: false,
            started_at: SystemTime::now(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn params(&self) -> &DetectorParams {
        &self.config.params
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Clear the window, history and counters
    pub fn reset(&mut self) {
        self.window.clear();
        self.records.clear();
        self.data_points = 0;
        self.anomaly_count = 0;
        self.started_at = SystemTime::now();
    }

    /// Append a sample and judge it
    pub fn ingest(&mut self, value: f64, at: SystemTime) -> SampleRecord {
        self.window.push(value);
        self.data_points += 1;

        let (is_anomaly, score) = if self.window.len() > self.config.warmup {
            let params = self.config.params;
            let view = self.window.as_slice();
            (params.detect(view), params.score(view))
        } else {
            (false, None)
        };

        let record = SampleRecord {
            index: self.data_points,
            timestamp_ms: millis_since_epoch(at),
            value,
            is_anomaly,
            score,
        };

        if self.records.len() == self.config.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record.clone());

        debug!(index = record.index, value, is_anomaly, "sample ingested");
        if is_anomaly {
            self.anomaly_count += 1;
            info!(
                "Anomaly detected! Value: {:.2} at {}",
                value,
                record.clock_time()
            );
        }

        record
    }

    /// Stream `points` samples from `source`, pausing `delay` between them
    ///
    /// `on_sample` sees every record as it is produced; returning
    /// `ControlFlow::Break(())` stops the session after that sample. Also
    /// stops early if the source runs dry.
    pub fn run<I, F>(&mut self, source: I, points: usize, delay: Option<Duration>, mut on_sample: F)
    where
        I: IntoIterator<Item = f64>,
        F: FnMut(&SampleRecord) -> ControlFlow<()>,
    {
        self.start();
        for (i, value) in source.into_iter().take(points).enumerate() {
            if i > 0 {
                if let Some(delay) = delay {
                    thread::sleep(delay);
                }
            }
            let record = self.ingest(value, SystemTime::now());
            if on_sample(&record).is_break() {
                debug!(index = record.index, "session stopped");
                break;
            }
        }
        self.stop();
    }

    /// Retained records, oldest first (same length as the window)
    pub fn records(&self) -> impl ExactSizeIterator<Item = &SampleRecord> {
        self.records.iter()
    }

    /// Retained records that were flagged
    pub fn anomalies(&self) -> impl Iterator<Item = &SampleRecord> {
        self.records.iter().filter(|r| r.is_anomaly)
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn stats(&self) -> SessionStats {
        let anomaly_rate_pct = if self.data_points > 0 {
            self.anomaly_count as f64 / self.data_points as f64 * 100.0
        } else {
            0.0
        };
        SessionStats {
            data_points: self.data_points,
            anomaly_count: self.anomaly_count,
            anomaly_rate_pct,
        }
    }
}
