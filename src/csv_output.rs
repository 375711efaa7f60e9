//! CSV output format for replay sessions
//!
//! One row per retained sample, for spreadsheet analysis and machine parsing.

use crate::session::{SampleRecord, Session};

/// CSV output formatter
#[derive(Debug, Default)]
pub struct CsvOutput {
    rows: Vec<SampleRecord>,
    include_score: bool,
}

impl CsvOutput {
    /// Create a new CSV output formatter
    pub fn new(include_score: bool) -> Self {
        Self {
            rows: Vec::new(),
            include_score,
        }
    }

    /// Formatter pre-filled with a session's retained samples
    pub fn from_session(session: &Session, include_score: bool) -> Self {
        let mut output = Self::new(include_score);
        for record in session.records() {
            output.add_sample(record.clone());
        }
        output
    }

    pub fn add_sample(&mut self, record: SampleRecord) {
        self.rows.push(record);
    }

    fn header(&self) -> String {
        let mut headers = vec!["index", "timestamp_ms", "value", "is_anomaly"];
        if self.include_score {
            headers.push("score");
        }
        headers.join(",")
    }

    fn format_row(&self, record: &SampleRecord) -> String {
        let mut fields = vec![
            record.index.to_string(),
            record.timestamp_ms.to_string(),
            record.value.to_string(),
            record.is_anomaly.to_string(),
        ];

        if self.include_score {
            match record.score {
                Some(score) => fields.push(format!("{:.6}", score)),
                None => fields.push(String::new()),
            }
        }

        fields.join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.header());
        output.push('\n');

        for record in &self.rows {
            output.push_str(&self.format_row(record));
            output.push('\n');
        }

        output
    }
}
