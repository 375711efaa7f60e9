//! HTML chart report for replay sessions
//!
//! Renders the retained series as an inline SVG chart: rising segments in
//! green, falling segments in red, a marker per sample, a red cross per
//! flagged sample, and a 10-point rolling mean overlay. Summary metrics sit
//! above the chart. The document is self-contained (no scripts, no external
//! assets).

use crate::session::{SampleRecord, Session, SessionStats};
use crate::stats;

/// Samples averaged by the rolling mean overlay
pub const ROLLING_MEAN_WINDOW: usize = 10;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 500.0;
const MARGIN: f64 = 50.0;

/// HTML output formatter
#[derive(Debug)]
pub struct HtmlOutput {
    title: String,
    method: String,
    samples: Vec<SampleRecord>,
    stats: SessionStats,
}

/// Maps sample positions and values onto the plot area
struct Plot {
    count: usize,
    min: f64,
    max: f64,
}

impl Plot {
    fn new(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // Pad flat or empty series so the scale never divides by zero
        let (min, max) = if !min.is_finite() || !max.is_finite() {
            (0.0, 1.0)
        } else if Self::half_span(min, max) < f64::EPSILON {
            let pad = (min.abs() * 1e-6).max(1.0);
            (min - pad, max + pad)
        } else {
            (min, max)
        };
        Self {
            count: values.len(),
            min,
            max,
        }
    }

    /// Half of `max - min`; stays finite for any finite bounds
    fn half_span(min: f64, max: f64) -> f64 {
        max * 0.5 - min * 0.5
    }

    fn x(&self, position: usize) -> f64 {
        let span = WIDTH - 2.0 * MARGIN;
        if self.count <= 1 {
            return MARGIN + span / 2.0;
        }
        MARGIN + span * position as f64 / (self.count - 1) as f64
    }

    fn y(&self, value: f64) -> f64 {
        let span = HEIGHT - 2.0 * MARGIN;
        let offset = value * 0.5 - self.min * 0.5;
        HEIGHT - MARGIN - span * offset / Self::half_span(self.min, self.max)
    }
}

impl HtmlOutput {
    /// Build a report from a session
    ///
    /// `title` is typically the generator label, e.g. "Stock Price".
    pub fn from_session(session: &Session, title: &str) -> Self {
        Self {
            title: format!("{} Anomaly Detection", title),
            method: session.params().method().name().to_string(),
            samples: session.records().cloned().collect(),
            stats: session.stats(),
        }
    }

    /// Escape HTML special characters to prevent XSS
    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    /// Generate embedded CSS styles
    fn generate_styles() -> &'static str {
        r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 20px;
            background-color: #0e1117;
            color: #FFFFF0;
        }
        .metrics {
            display: flex;
            gap: 40px;
            margin-bottom: 20px;
        }
        .metric-label {
            font-size: 0.9em;
            color: #AAAAAA;
        }
        .metric-value {
            font-size: 2em;
        }
        svg {
            background-color: #1a1d29;
        }
        .axis {
            stroke: #333333;
        }
        .tick {
            fill: #AAAAAA;
            font-size: 12px;
        }
        .footer {
            margin-top: 20px;
            font-size: 0.8em;
            color: #888;
            text-align: center;
        }
        "#
    }

    fn render_metrics(&self) -> String {
        let metrics = [
            ("Data Points", self.stats.data_points.to_string()),
            ("Anomalies", self.stats.anomaly_count.to_string()),
            ("Anomaly Rate", format!("{:.2}%", self.stats.anomaly_rate_pct)),
            ("Detection Method", Self::escape_html(&self.method)),
        ];

        let cards: Vec<String> = metrics
            .iter()
            .map(|(label, value)| {
                format!(
                    "        <div><div class=\"metric-label\">{}</div><div class=\"metric-value\">{}</div></div>\n",
                    label, value
                )
            })
            .collect();
        format!("    <div class=\"metrics\">\n{}    </div>\n", cards.join(""))
    }

    /// Render the inline SVG chart
    pub fn render_chart(&self) -> String {
        let values: Vec<f64> = self.samples.iter().map(|s| s.value).collect();
        let plot = Plot::new(&values);
        let mut svg: Vec<String> = Vec::new();

        svg.push(format!(
            r#"    <svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = WIDTH,
            h = HEIGHT
        ));

        // Axes and value range labels
        svg.push(format!(
            r#"      <line class="axis" x1="{m}" y1="{b}" x2="{r}" y2="{b}"/>"#,
            m = MARGIN,
            b = HEIGHT - MARGIN,
            r = WIDTH - MARGIN
        ));
        svg.push(format!(
            r#"      <line class="axis" x1="{m}" y1="{m}" x2="{m}" y2="{b}"/>"#,
            m = MARGIN,
            b = HEIGHT - MARGIN
        ));
        svg.push(format!(
            r#"      <text class="tick" x="4" y="{:.1}">{:.2}</text>"#,
            plot.y(plot.max) + 4.0,
            plot.max
        ));
        svg.push(format!(
            r#"      <text class="tick" x="4" y="{:.1}">{:.2}</text>"#,
            plot.y(plot.min) + 4.0,
            plot.min
        ));

        // Segments: green when rising, red when falling
        for (i, pair) in values.windows(2).enumerate() {
            let color = if pair[1] >= pair[0] { "green" } else { "red" };
            svg.push(format!(
                r#"      <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="3"/>"#,
                plot.x(i),
                plot.y(pair[0]),
                plot.x(i + 1),
                plot.y(pair[1]),
                color
            ));
        }

        // Rolling mean overlay, aligned to the end of each window
        let rolling = stats::rolling_mean(&values, ROLLING_MEAN_WINDOW);
        if values.len() > ROLLING_MEAN_WINDOW {
            let points: Vec<String> = rolling
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    format!(
                        "{:.1},{:.1}",
                        plot.x(i + ROLLING_MEAN_WINDOW - 1),
                        plot.y(*v)
                    )
                })
                .collect();
            svg.push(format!(
                r#"      <polyline class="rolling-mean" points="{}" fill="none" stroke="rgba(0, 255, 255, 0.3)" stroke-width="1.2"/>"#,
                points.join(" ")
            ));
        }

        // Markers for every sample
        for (i, v) in values.iter().enumerate() {
            svg.push(format!(
                r##"      <circle cx="{:.1}" cy="{:.1}" r="3" fill="#FFFFF0"/>"##,
                plot.x(i),
                plot.y(*v)
            ));
        }

        // Red crosses for flagged samples
        for (i, sample) in self.samples.iter().enumerate() {
            if !sample.is_anomaly {
                continue;
            }
            let (cx, cy) = (plot.x(i), plot.y(sample.value));
            svg.push(format!(
                r#"      <path class="anomaly" d="M{:.1},{:.1} L{:.1},{:.1} M{:.1},{:.1} L{:.1},{:.1}" stroke="red" stroke-width="3"><title>{:.2}</title></path>"#,
                cx - 6.0,
                cy - 6.0,
                cx + 6.0,
                cy + 6.0,
                cx - 6.0,
                cy + 6.0,
                cx + 6.0,
                cy - 6.0,
                sample.value
            ));
        }

        svg.push("    </svg>".to_string());
        svg.join("\n") + "\n"
    }

    /// Generate complete HTML document
    pub fn to_html(&self) -> String {
        let title = Self::escape_html(&self.title);
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n");
        html.push_str("<html lang=\"en\">\n");

        html.push_str("<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str(
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str(&format!("    <title>{}</title>\n", title));
        html.push_str("    <style>");
        html.push_str(Self::generate_styles());
        html.push_str("</style>\n");
        html.push_str("</head>\n");

        html.push_str("<body>\n");
        html.push_str(&format!("    <h1>{}</h1>\n", title));
        html.push_str(&self.render_metrics());
        html.push_str(&self.render_chart());

        html.push_str("    <div class=\"footer\">\n");
        html.push_str("        Generated by Spikewatch\n");
        html.push_str("    </div>\n");

        html.push_str("</body>\n");
        html.push_str("</html>\n");

        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DetectionMethod;
    use crate::session::SessionConfig;
    use std::time::UNIX_EPOCH;

    fn session_with(values: &[f64]) -> Session {
        let mut session = Session::new(SessionConfig {
            capacity: 200,
            warmup: 0,
            params: DetectionMethod::ZScore.default_params(),
        });
        for v in values {
            session.ingest(*v, UNIX_EPOCH);
        }
        session
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            HtmlOutput::escape_html("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_document_contains_title_and_metrics() {
        let session = session_with(&[1.0, 2.0, 3.0]);
        let html = HtmlOutput::from_session(&session, "Stock Price").to_html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Stock Price Anomaly Detection</h1>"));
        assert!(html.contains("Data Points"));
        assert!(html.contains("0.00%"));
        assert!(html.contains("Z-score"));
    }

    #[test]
    fn test_segment_colors_follow_direction() {
        let session = session_with(&[1.0, 3.0, 2.0]);
        let svg = HtmlOutput::from_session(&session, "T").render_chart();
        assert_eq!(svg.matches("stroke=\"green\"").count(), 1);
        assert_eq!(svg.matches("stroke=\"red\" stroke-width=\"3\"/>").count(), 1);
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn test_anomaly_markers_and_rolling_mean() {
        let mut values = vec![10.0; 20];
        values.push(100.0);
        let session = session_with(&values);
        let svg = HtmlOutput::from_session(&session, "T").render_chart();
        assert_eq!(svg.matches("class=\"anomaly\"").count(), 1);
        assert!(svg.contains("class=\"rolling-mean\""));
    }

    #[test]
    fn test_short_series_has_no_rolling_mean() {
        let session = session_with(&[1.0; 10]);
        let svg = HtmlOutput::from_session(&session, "T").render_chart();
        assert!(!svg.contains("rolling-mean"));
    }

    #[test]
    fn test_empty_session_renders() {
        let session = session_with(&[]);
        let html = HtmlOutput::from_session(&session, "T").to_html();
        assert!(html.contains("</svg>"));
    }

    #[test]
    fn test_extreme_values_stay_on_canvas() {
        let session = session_with(&[-1e308, 0.0, 1e308]);
        let svg = HtmlOutput::from_session(&session, "T").render_chart();
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
        assert!(svg.contains(r#"cy="450.0""#));
        assert!(svg.contains(r#"cy="50.0""#));
    }

    #[test]
    fn test_flat_huge_series_is_padded() {
        let session = session_with(&[1e300; 5]);
        let svg = HtmlOutput::from_session(&session, "T").render_chart();
        assert!(!svg.contains("NaN"));
        assert_eq!(svg.matches(r#"cy="250.0""#).count(), 5);
    }
}
