//! Descriptive statistics over sample windows
//!
//! Shared building blocks for the detectors: mean, population and sample
//! standard deviation, and linear-interpolation percentiles. All functions
//! are total: empty input yields `None` rather than a panic.

use std::cmp::Ordering;

/// Summary of a window used by the z-score style detectors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSummary {
    pub len: usize,
    pub mean: f64,
    /// Population standard deviation (divisor `n`)
    pub stddev: f64,
}

impl WindowSummary {
    /// Summarize a window, or `None` if it is empty
    pub fn of(samples: &[f64]) -> Option<Self> {
        let mean = mean(samples)?;
        let stddev = population_stddev(samples)?;
        Some(Self {
            len: samples.len(),
            mean,
            stddev,
        })
    }

    /// Absolute z-score of `value` against this summary
    ///
    /// Returns `None` when the window has zero spread.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        if self.stddev == 0.0 {
            return None;
        }
        Some(((value - self.mean) / self.stddev).abs())
    }
}

/// Arithmetic mean
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

fn sum_squared_deviations(samples: &[f64], mean: f64) -> f64 {
    samples.iter().map(|x| (x - mean).powi(2)).sum()
}

/// Population standard deviation (divisor `n`)
pub fn population_stddev(samples: &[f64]) -> Option<f64> {
    let m = mean(samples)?;
    Some((sum_squared_deviations(samples, m) / samples.len() as f64).sqrt())
}

/// Bessel-corrected sample standard deviation (divisor `n - 1`)
///
/// Needs at least two samples.
pub fn sample_stddev(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let m = mean(samples)?;
    Some((sum_squared_deviations(samples, m) / (samples.len() - 1) as f64).sqrt())
}

/// Calculate percentile from sorted data
///
/// Uses the `(n - 1) * p` rank with linear interpolation between the two
/// neighbouring order statistics.
pub fn percentile_sorted(sorted: &[f64], percentile: f64) -> Option<f64> {
    match sorted.len() {
        0 => None,
        1 => Some(sorted[0]),
        n => {
            let index = (percentile / 100.0) * (n - 1) as f64;
            let lower = index.floor() as usize;
            let upper = index.ceil() as usize;

            if lower == upper {
                Some(sorted[lower])
            } else {
                let weight = index - lower as f64;
                // Exact when both neighbours are equal
                Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
            }
        }
    }
}

/// Copy and sort a window in ascending order
pub fn sorted_copy(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// First and third quartiles of an unsorted window
pub fn quartiles(samples: &[f64]) -> Option<(f64, f64)> {
    let sorted = sorted_copy(samples);
    Some((
        percentile_sorted(&sorted, 25.0)?,
        percentile_sorted(&sorted, 75.0)?,
    ))
}

/// Index and magnitude of the largest absolute deviation from `center`
///
/// Ties resolve to the earliest index.
pub fn max_abs_deviation(samples: &[f64], center: f64) -> Option<(usize, f64)> {
    samples
        .iter()
        .map(|x| (x - center).abs())
        .enumerate()
        .fold(None, |best, (i, d)| match best {
            Some((_, best_d)) if best_d >= d => best,
            _ => Some((i, d)),
        })
}

/// Rolling mean with a trailing window (`valid` mode: one value per full window)
pub fn rolling_mean(samples: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || samples.len() < window {
        return Vec::new();
    }
    samples
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// True when every sample is a finite number
pub fn all_finite(samples: &[f64]) -> bool {
    samples.iter().all(|x| x.is_finite())
}
