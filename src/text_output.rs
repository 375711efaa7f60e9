//! Human-readable output for the default `--format text`
//!
//! Real-time alerts go to stderr as samples arrive; the summary goes to
//! stdout once the stream ends.

use crate::session::{SampleRecord, Session};

/// One-line real-time alert for a flagged sample
pub fn format_alert(record: &SampleRecord) -> String {
    let mut line = format!(
        "⚠️  ANOMALY #{}: value={:.2} at {}",
        record.index,
        record.value,
        record.clock_time()
    );
    if let Some(score) = record.score {
        line.push_str(&format!(" (score {:.2})", score));
    }
    line
}

/// End-of-stream summary report
pub fn format_summary(session: &Session, generator_label: &str) -> String {
    let stats = session.stats();
    let mut out = format!(
        "=== {} Anomaly Detection ===\n\
         Detection method: {}\n\
         Data Points:      {}\n\
         Anomalies:        {}\n\
         Anomaly Rate:     {:.2}%\n",
        generator_label,
        session.params().method(),
        stats.data_points,
        stats.anomaly_count,
        stats.anomaly_rate_pct
    );

    let retained: Vec<&SampleRecord> = session.anomalies().collect();
    if !retained.is_empty() {
        out.push_str("\nFlagged samples in window:\n");
        for record in retained.iter().take(10) {
            out.push_str(&format!(
                "  #{:<6} {:>10.2}  {}\n",
                record.index,
                record.value,
                record.clock_time()
            ));
        }
        if retained.len() > 10 {
            out.push_str(&format!("  ... and {} more\n", retained.len() - 10));
        }
    }

    out
}
