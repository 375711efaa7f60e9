//! Statistical anomaly detectors
//!
//! Every detector is a pure function of `(samples, parameters)` that judges
//! only the most recently appended sample (`samples.last()`). Too few
//! samples, zero spread, and non-finite input all resolve to "not anomalous"
//! rather than an error.
//!
//! Each verdict function has a companion that exposes the statistic being
//! thresholded, for reporting.

use crate::stats::{self, WindowSummary};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Minimum window length for [`z_score`]
pub const Z_SCORE_MIN_SAMPLES: usize = 3;
/// Minimum window length for [`iqr`]
pub const IQR_MIN_SAMPLES: usize = 4;
/// Minimum window length for [`grubbs_test`]
pub const GRUBBS_MIN_SAMPLES: usize = 3;

pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_ROLLING_WINDOW: usize = 20;
pub const DEFAULT_ROLLING_THRESHOLD: f64 = 2.0;
pub const DEFAULT_GRUBBS_ALPHA: f64 = 0.05;

// ============================================================================
// Z-score
// ============================================================================

/// Absolute z-score of the last sample against the whole window
///
/// `None` below [`Z_SCORE_MIN_SAMPLES`], on zero variance, or on non-finite input.
pub fn z_score_value(samples: &[f64]) -> Option<f64> {
    if samples.len() < Z_SCORE_MIN_SAMPLES || !stats::all_finite(samples) {
        return None;
    }
    let last = *samples.last()?;
    WindowSummary::of(samples)?.z_score(last)
}

/// Z-score detector: `|last - mean| / stddev > threshold` over the full window
pub fn z_score(samples: &[f64], threshold: f64) -> bool {
    z_score_value(samples).is_some_and(|z| z > threshold)
}

// ============================================================================
// Interquartile range
// ============================================================================

/// Tukey fences derived from the window quartiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Strictly outside `[lower, upper]`
    pub fn excludes(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Quartile fences for a window, or `None` below [`IQR_MIN_SAMPLES`]
pub fn iqr_bounds(samples: &[f64], multiplier: f64) -> Option<IqrBounds> {
    if samples.len() < IQR_MIN_SAMPLES || !stats::all_finite(samples) {
        return None;
    }
    let (q1, q3) = stats::quartiles(samples)?;
    let spread = q3 - q1;
    Some(IqrBounds {
        q1,
        q3,
        lower: q1 - multiplier * spread,
        upper: q3 + multiplier * spread,
    })
}

/// Distance of the last sample beyond the nearest quartile, in IQR units
///
/// The IQR detector fires when this exceeds the multiplier. A zero IQR maps
/// any value outside `[Q1, Q3]` to infinity.
pub fn iqr_value(samples: &[f64]) -> Option<f64> {
    let bounds = iqr_bounds(samples, 0.0)?;
    let last = *samples.last()?;
    let excess = if last < bounds.q1 {
        bounds.q1 - last
    } else if last > bounds.q3 {
        last - bounds.q3
    } else {
        return Some(0.0);
    };

    let spread = bounds.iqr();
    if spread == 0.0 {
        Some(f64::INFINITY)
    } else {
        Some(excess / spread)
    }
}

/// IQR detector: last sample strictly outside `[Q1 - m*IQR, Q3 + m*IQR]`
pub fn iqr(samples: &[f64], multiplier: f64) -> bool {
    match (iqr_bounds(samples, multiplier), samples.last()) {
        (Some(bounds), Some(&last)) => bounds.excludes(last),
        _ => false,
    }
}

// ============================================================================
// Rolling z-score
// ============================================================================

/// Absolute z-score of the last sample against the trailing `window` samples
pub fn rolling_z_score_value(samples: &[f64], window: usize) -> Option<f64> {
    if window == 0 || samples.len() < window {
        return None;
    }
    let recent = &samples[samples.len() - window..];
    if !stats::all_finite(recent) {
        return None;
    }
    let last = *recent.last()?;
    WindowSummary::of(recent)?.z_score(last)
}

/// Rolling z-score detector
///
/// Same test as [`z_score`] but restricted to the last `window` samples,
/// which bounds sensitivity to long-run drift.
pub fn rolling_z_score(samples: &[f64], window: usize, threshold: f64) -> bool {
    rolling_z_score_value(samples, window).is_some_and(|z| z > threshold)
}

// ============================================================================
// Grubbs' test
// ============================================================================

/// Intermediate values of a single-outlier Grubbs' test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrubbsOutcome {
    /// `max |x_i - mean| / s`
    pub statistic: f64,
    /// Critical value for the requested significance level
    pub critical: f64,
    /// Index of the most deviant sample
    pub outlier_index: usize,
}

impl GrubbsOutcome {
    /// Whether the most deviant sample is significant
    pub fn rejects(&self) -> bool {
        self.statistic > self.critical
    }
}

/// Grubbs critical value for `n` samples at two-sided significance `alpha`
///
/// `G_crit = ((n-1)/sqrt(n)) * sqrt(t^2 / (n - 2 + t^2))` with `t` the upper
/// `alpha / (2n)` quantile of Student's t with `n - 2` degrees of freedom.
pub fn grubbs_critical_value(n: usize, alpha: f64) -> Option<f64> {
    if n < GRUBBS_MIN_SAMPLES {
        return None;
    }
    let nf = n as f64;
    let df = nf - 2.0;
    let tail = alpha / (2.0 * nf);
    if !(tail > 0.0 && tail < 0.5) {
        return None;
    }
    let t = StudentsT::new(0.0, 1.0, df).ok()?.inverse_cdf(1.0 - tail);
    if !t.is_finite() {
        return None;
    }
    let t2 = t * t;
    Some(((nf - 1.0) / nf.sqrt()) * (t2 / (df + t2)).sqrt())
}

/// Run Grubbs' test over the whole window
///
/// `None` below [`GRUBBS_MIN_SAMPLES`], on zero sample variance, on
/// non-finite input, or when `alpha` admits no critical value.
pub fn grubbs_outcome(samples: &[f64], alpha: f64) -> Option<GrubbsOutcome> {
    if samples.len() < GRUBBS_MIN_SAMPLES || !stats::all_finite(samples) {
        return None;
    }
    let mean = stats::mean(samples)?;
    let stddev = stats::sample_stddev(samples)?;
    if stddev == 0.0 {
        return None;
    }

    let (outlier_index, max_deviation) = stats::max_abs_deviation(samples, mean)?;
    Some(GrubbsOutcome {
        statistic: max_deviation / stddev,
        critical: grubbs_critical_value(samples.len(), alpha)?,
        outlier_index,
    })
}

/// Grubbs' test detector
///
/// Fires only when the most deviant sample is the last one *and* its
/// statistic exceeds the critical value; an earlier outlier never flags the
/// current point.
pub fn grubbs_test(samples: &[f64], alpha: f64) -> bool {
    grubbs_outcome(samples, alpha)
        .is_some_and(|g| g.outlier_index == samples.len() - 1 && g.rejects())
}
