//! Detector selection and parameter resolution
//!
//! Two ways in:
//! - typed: build a [`DetectorParams`] and call [`DetectorParams::detect`];
//! - by name: [`dispatch`] takes a method name and a loosely-typed
//!   [`ParamBag`], filling every missing key with the method's default.
//!
//! Unknown method names are a configuration mistake and fail with
//! [`DispatchError::UnknownMethod`] instead of falling back to a default.

use crate::detectors::{
    self, DEFAULT_GRUBBS_ALPHA, DEFAULT_IQR_MULTIPLIER, DEFAULT_ROLLING_THRESHOLD,
    DEFAULT_ROLLING_WINDOW, DEFAULT_Z_THRESHOLD,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::trace;

/// Errors raised while resolving a detector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Unknown detection method: {0}")]
    UnknownMethod(String),

    #[error("Invalid value for {name}: {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Recognized parameter bag keys
pub mod keys {
    pub const THRESHOLD: &str = "threshold";
    pub const MULTIPLIER: &str = "multiplier";
    pub const WINDOW: &str = "window";
    pub const ALPHA: &str = "alpha";
}

/// The fixed set of available detectors
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
pub enum DetectionMethod {
    /// Full-window z-score
    #[serde(rename = "Z-score", alias = "zscore")]
    #[value(name = "zscore")]
    ZScore,
    /// Tukey fences on the interquartile range
    #[serde(rename = "InterQuartile Range", alias = "iqr")]
    #[value(name = "iqr")]
    InterquartileRange,
    /// Z-score over a trailing sub-window
    #[serde(rename = "Rolling Z-score", alias = "rolling")]
    #[value(name = "rolling")]
    RollingZScore,
    /// Grubbs' single-outlier test
    #[serde(rename = "Grubbs' Test", alias = "grubbs")]
    #[value(name = "grubbs")]
    GrubbsTest,
}

impl DetectionMethod {
    pub const ALL: [DetectionMethod; 4] = [
        DetectionMethod::ZScore,
        DetectionMethod::InterquartileRange,
        DetectionMethod::RollingZScore,
        DetectionMethod::GrubbsTest,
    ];

    /// Display name used by the dispatcher
    pub fn name(&self) -> &'static str {
        match self {
            DetectionMethod::ZScore => "Z-score",
            DetectionMethod::InterquartileRange => "InterQuartile Range",
            DetectionMethod::RollingZScore => "Rolling Z-score",
            DetectionMethod::GrubbsTest => "Grubbs' Test",
        }
    }

    /// Short command-line spelling
    pub fn slug(&self) -> &'static str {
        match self {
            DetectionMethod::ZScore => "zscore",
            DetectionMethod::InterquartileRange => "iqr",
            DetectionMethod::RollingZScore => "rolling",
            DetectionMethod::GrubbsTest => "grubbs",
        }
    }

    /// Parameter bag keys this method reads
    pub fn parameter_keys(&self) -> &'static [&'static str] {
        match self {
            DetectionMethod::ZScore => &[keys::THRESHOLD],
            DetectionMethod::InterquartileRange => &[keys::MULTIPLIER],
            DetectionMethod::RollingZScore => &[keys::WINDOW, keys::THRESHOLD],
            DetectionMethod::GrubbsTest => &[keys::ALPHA],
        }
    }

    pub fn default_params(&self) -> DetectorParams {
        match self {
            DetectionMethod::ZScore => DetectorParams::ZScore {
                threshold: DEFAULT_Z_THRESHOLD,
            },
            DetectionMethod::InterquartileRange => DetectorParams::InterquartileRange {
                multiplier: DEFAULT_IQR_MULTIPLIER,
            },
            DetectionMethod::RollingZScore => DetectorParams::RollingZScore {
                window: DEFAULT_ROLLING_WINDOW,
                threshold: DEFAULT_ROLLING_THRESHOLD,
            },
            DetectionMethod::GrubbsTest => DetectorParams::GrubbsTest {
                alpha: DEFAULT_GRUBBS_ALPHA,
            },
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DetectionMethod {
    type Err = DispatchError;

    /// Accepts the display name exactly, or the slug in any case
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name() == trimmed || m.slug().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| DispatchError::UnknownMethod(s.to_string()))
    }
}

/// Loosely-typed `name -> value` parameter bag
///
/// Only used at the string boundary; keys a method does not read are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamBag {
    values: BTreeMap<String, f64>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn get_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).unwrap_or(default)
    }

    fn window_or(&self, default: usize) -> Result<usize> {
        match self.get(keys::WINDOW) {
            None => Ok(default),
            Some(value) if value.is_finite() && value >= 0.0 && value.fract() == 0.0 => {
                Ok(value as usize)
            }
            Some(value) => Err(DispatchError::InvalidParameter {
                name: keys::WINDOW,
                value,
                reason: "must be a non-negative integer",
            }),
        }
    }
}

impl<'a> FromIterator<(&'a str, f64)> for ParamBag {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let mut bag = ParamBag::new();
        for (key, value) in iter {
            bag.set(key, value);
        }
        bag
    }
}

/// Fully-resolved detector configuration, one variant per method
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method")]
pub enum DetectorParams {
    #[serde(rename = "Z-score")]
    ZScore { threshold: f64 },
    #[serde(rename = "InterQuartile Range")]
    InterquartileRange { multiplier: f64 },
    #[serde(rename = "Rolling Z-score")]
    RollingZScore { window: usize, threshold: f64 },
    #[serde(rename = "Grubbs' Test")]
    GrubbsTest { alpha: f64 },
}

impl DetectorParams {
    /// Resolve a bag into typed parameters, defaulting every missing key
    pub fn from_bag(method: DetectionMethod, bag: &ParamBag) -> Result<Self> {
        Ok(match method {
            DetectionMethod::ZScore => DetectorParams::ZScore {
                threshold: bag.get_or(keys::THRESHOLD, DEFAULT_Z_THRESHOLD),
            },
            DetectionMethod::InterquartileRange => DetectorParams::InterquartileRange {
                multiplier: bag.get_or(keys::MULTIPLIER, DEFAULT_IQR_MULTIPLIER),
            },
            DetectionMethod::RollingZScore => DetectorParams::RollingZScore {
                window: bag.window_or(DEFAULT_ROLLING_WINDOW)?,
                threshold: bag.get_or(keys::THRESHOLD, DEFAULT_ROLLING_THRESHOLD),
            },
            DetectionMethod::GrubbsTest => DetectorParams::GrubbsTest {
                alpha: bag.get_or(keys::ALPHA, DEFAULT_GRUBBS_ALPHA),
            },
        })
    }

    pub fn method(&self) -> DetectionMethod {
        match self {
            DetectorParams::ZScore { .. } => DetectionMethod::ZScore,
            DetectorParams::InterquartileRange { .. } => DetectionMethod::InterquartileRange,
            DetectorParams::RollingZScore { .. } => DetectionMethod::RollingZScore,
            DetectorParams::GrubbsTest { .. } => DetectionMethod::GrubbsTest,
        }
    }

    /// Smallest window on which the detector can ever return `true`
    pub fn min_samples(&self) -> usize {
        match self {
            DetectorParams::ZScore { .. } => detectors::Z_SCORE_MIN_SAMPLES,
            DetectorParams::InterquartileRange { .. } => detectors::IQR_MIN_SAMPLES,
            DetectorParams::RollingZScore { window, .. } => *window,
            DetectorParams::GrubbsTest { .. } => detectors::GRUBBS_MIN_SAMPLES,
        }
    }

    /// Reject values for which the detector has no meaningful answer
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &'static str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(DispatchError::InvalidParameter {
                    name,
                    value,
                    reason: "must be a positive number",
                })
            }
        }

        match *self {
            DetectorParams::ZScore { threshold } => positive(keys::THRESHOLD, threshold),
            DetectorParams::InterquartileRange { multiplier } => {
                positive(keys::MULTIPLIER, multiplier)
            }
            DetectorParams::RollingZScore { window, threshold } => {
                if window < 2 {
                    return Err(DispatchError::InvalidParameter {
                        name: keys::WINDOW,
                        value: window as f64,
                        reason: "must be at least 2",
                    });
                }
                positive(keys::THRESHOLD, threshold)
            }
            DetectorParams::GrubbsTest { alpha } => {
                if alpha > 0.0 && alpha < 1.0 {
                    Ok(())
                } else {
                    Err(DispatchError::InvalidParameter {
                        name: keys::ALPHA,
                        value: alpha,
                        reason: "must lie strictly between 0 and 1",
                    })
                }
            }
        }
    }

    /// Verdict for the last sample
    pub fn detect(&self, samples: &[f64]) -> bool {
        match *self {
            DetectorParams::ZScore { threshold } => detectors::z_score(samples, threshold),
            DetectorParams::InterquartileRange { multiplier } => {
                detectors::iqr(samples, multiplier)
            }
            DetectorParams::RollingZScore { window, threshold } => {
                detectors::rolling_z_score(samples, window, threshold)
            }
            DetectorParams::GrubbsTest { alpha } => detectors::grubbs_test(samples, alpha),
        }
    }

    /// The statistic the detector thresholds, for reporting
    ///
    /// z-score for the z-score methods, IQR-units beyond the nearest quartile
    /// for IQR, and the Grubbs `G` statistic for Grubbs' test.
    pub fn score(&self, samples: &[f64]) -> Option<f64> {
        match *self {
            DetectorParams::ZScore { .. } => detectors::z_score_value(samples),
            DetectorParams::InterquartileRange { .. } => detectors::iqr_value(samples),
            DetectorParams::RollingZScore { window, .. } => {
                detectors::rolling_z_score_value(samples, window)
            }
            DetectorParams::GrubbsTest { alpha } => {
                detectors::grubbs_outcome(samples, alpha).map(|g| g.statistic)
            }
        }
    }
}

impl Default for DetectorParams {
    fn default() -> Self {
        DetectionMethod::ZScore.default_params()
    }
}

/// Resolve `method_name` and `params`, then judge the last sample
///
/// # Errors
///
/// [`DispatchError::UnknownMethod`] for an unregistered name and
/// [`DispatchError::InvalidParameter`] for out-of-range parameters.
pub fn dispatch(samples: &[f64], method_name: &str, params: &ParamBag) -> Result<bool> {
    let method: DetectionMethod = method_name.parse()?;
    let resolved = DetectorParams::from_bag(method, params)?;
    resolved.validate()?;

    let verdict = resolved.detect(samples);
    trace!(
        method = method.name(),
        samples = samples.len(),
        verdict,
        "dispatched detector"
    );
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike() -> Vec<f64> {
        let mut data = vec![10.0; 20];
        data.push(50.0);
        data
    }

    #[test]
    fn test_parse_display_names_and_slugs() {
        assert_eq!(
            "Z-score".parse::<DetectionMethod>(),
            Ok(DetectionMethod::ZScore)
        );
        assert_eq!(
            "InterQuartile Range".parse::<DetectionMethod>(),
            Ok(DetectionMethod::InterquartileRange)
        );
        assert_eq!(
            "Rolling Z-score".parse::<DetectionMethod>(),
            Ok(DetectionMethod::RollingZScore)
        );
        assert_eq!(
            "Grubbs' Test".parse::<DetectionMethod>(),
            Ok(DetectionMethod::GrubbsTest)
        );
        assert_eq!("IQR".parse::<DetectionMethod>(), Ok(DetectionMethod::InterquartileRange));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for method in DetectionMethod::ALL {
            assert_eq!(method.to_string().parse::<DetectionMethod>(), Ok(method));
        }
    }

    #[test]
    fn test_unknown_method_is_an_error() {
        let err = dispatch(&spike(), "Isolation Forest", &ParamBag::new()).unwrap_err();
        assert_eq!(err, DispatchError::UnknownMethod("Isolation Forest".to_string()));
        assert_eq!(err.to_string(), "Unknown detection method: Isolation Forest");
    }

    #[test]
    fn test_empty_bag_uses_defaults() {
        for method in DetectionMethod::ALL {
            let resolved = DetectorParams::from_bag(method, &ParamBag::new()).unwrap();
            assert_eq!(resolved, method.default_params());
        }
    }

    #[test]
    fn test_bag_overrides_defaults() {
        let bag = ParamBag::new().with(keys::WINDOW, 5.0).with(keys::THRESHOLD, 1.5);
        let resolved = DetectorParams::from_bag(DetectionMethod::RollingZScore, &bag).unwrap();
        assert_eq!(
            resolved,
            DetectorParams::RollingZScore {
                window: 5,
                threshold: 1.5
            }
        );
    }

    #[test]
    fn test_unrelated_keys_are_ignored() {
        let bag = ParamBag::new().with(keys::ALPHA, 0.01);
        let resolved = DetectorParams::from_bag(DetectionMethod::ZScore, &bag).unwrap();
        assert_eq!(resolved, DetectionMethod::ZScore.default_params());
    }

    #[test]
    fn test_fractional_window_rejected() {
        let bag = ParamBag::new().with(keys::WINDOW, 2.5);
        let err = DetectorParams::from_bag(DetectionMethod::RollingZScore, &bag).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidParameter { name: "window", .. }
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(DetectorParams::ZScore { threshold: 0.0 }.validate().is_err());
        assert!(DetectorParams::ZScore { threshold: f64::NAN }.validate().is_err());
        assert!(DetectorParams::InterquartileRange { multiplier: -1.0 }
            .validate()
            .is_err());
        assert!(DetectorParams::RollingZScore {
            window: 1,
            threshold: 2.0
        }
        .validate()
        .is_err());
        assert!(DetectorParams::GrubbsTest { alpha: 1.0 }.validate().is_err());
        for method in DetectionMethod::ALL {
            assert!(method.default_params().validate().is_ok());
        }
    }

    #[test]
    fn test_dispatch_invokes_selected_detector() {
        let data = spike();
        assert_eq!(dispatch(&data, "Z-score", &ParamBag::new()), Ok(true));
        assert_eq!(dispatch(&data, "InterQuartile Range", &ParamBag::new()), Ok(true));
        assert_eq!(dispatch(&data, "Rolling Z-score", &ParamBag::new()), Ok(true));
        assert_eq!(dispatch(&data, "Grubbs' Test", &ParamBag::new()), Ok(true));

        let calm = [10.0, 11.0, 9.0, 10.0, 10.0];
        assert_eq!(dispatch(&calm, "zscore", &ParamBag::new()), Ok(false));
    }

    #[test]
    fn test_score_matches_detector() {
        let data = spike();
        let params = DetectorParams::ZScore { threshold: 3.0 };
        let z = params.score(&data).unwrap();
        assert!((z - 20f64.sqrt()).abs() < 1e-9);
        assert_eq!(params.detect(&data), z > 3.0);
    }

    #[test]
    fn test_params_serialize_with_method_tag() {
        let json = serde_json::to_string(&DetectionMethod::GrubbsTest.default_params()).unwrap();
        assert_eq!(json, r#"{"method":"Grubbs' Test","alpha":0.05}"#);
    }

    #[test]
    fn test_min_samples() {
        assert_eq!(DetectionMethod::ZScore.default_params().min_samples(), 3);
        assert_eq!(DetectionMethod::InterquartileRange.default_params().min_samples(), 4);
        assert_eq!(DetectionMethod::RollingZScore.default_params().min_samples(), 20);
        assert_eq!(DetectionMethod::GrubbsTest.default_params().min_samples(), 3);
    }
}
