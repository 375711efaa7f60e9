//! JSON output format for replay sessions
//!
//! `--format json` emits one document after the stream ends.

use crate::dispatch::DetectorParams;
use crate::generators::GeneratorSettings;
use crate::session::{SampleRecord, Session, SessionStats};
use serde::{Deserialize, Serialize};

/// A single retained sample
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonSample {
    /// 1-based stream position
    pub index: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    pub value: f64,
    pub is_anomaly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl From<&SampleRecord> for JsonSample {
    fn from(record: &SampleRecord) -> Self {
        Self {
            index: record.index,
            timestamp_ms: record.timestamp_ms,
            value: record.value,
            is_anomaly: record.is_anomaly,
            // serde_json writes non-finite floats as null; drop them instead
            score: record.score.filter(|s| s.is_finite()),
        }
    }
}

/// Summary counters for the run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonSummary {
    pub data_points: u64,
    pub anomaly_count: u64,
    pub anomaly_rate_pct: f64,
}

impl From<SessionStats> for JsonSummary {
    fn from(stats: SessionStats) -> Self {
        Self {
            data_points: stats.data_points,
            anomaly_count: stats.anomaly_count,
            anomaly_rate_pct: stats.anomaly_rate_pct,
        }
    }
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub generator: GeneratorSettings,
    pub detector: DetectorParams,
    pub capacity: usize,
    pub warmup: usize,
    /// Retained window, oldest first
    pub samples: Vec<JsonSample>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Capture a finished session
    pub fn from_session(session: &Session, generator: GeneratorSettings) -> Self {
        let config = session.config();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "spikewatch-json-v1".to_string(),
            generator,
            detector: config.params,
            capacity: config.capacity,
            warmup: config.warmup,
            samples: session.records().map(JsonSample::from).collect(),
            summary: session.stats().into(),
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
