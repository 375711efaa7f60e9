//! Run configuration: `spikewatch.toml` plus command-line overrides
//!
//! Precedence is command line, then file, then built-in defaults.
//!
//! # Example spikewatch.toml
//!
//! ```toml
//! [detector]
//! method = "Grubbs' Test"
//! alpha = 0.01
//!
//! [generator]
//! kind = "temperature"
//! base = 25.0
//! noise = 0.5
//!
//! [stream]
//! capacity = 200
//! speed = 5
//! warmup = 10
//! ```

use crate::dispatch::{keys, DetectionMethod, DetectorParams, ParamBag};
use crate::generators::{GeneratorKind, GeneratorSettings};
use crate::session::{SessionConfig, DEFAULT_WARMUP};
use crate::window::DEFAULT_CAPACITY;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_POINTS: usize = 100;
pub const DEFAULT_SPEED: u32 = 5;
pub const MAX_SPEED: u32 = 10;

/// `[detector]` table
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DetectorSection {
    /// Display name ("Z-score") or slug ("zscore")
    pub method: Option<String>,
    pub threshold: Option<f64>,
    pub multiplier: Option<f64>,
    pub window: Option<usize>,
    pub alpha: Option<f64>,
}

/// `[generator]` table
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSection {
    pub kind: Option<GeneratorKind>,
    pub base: Option<f64>,
    /// Volatility for prices, noise for temperatures
    #[serde(alias = "volatility", alias = "noise")]
    pub spread: Option<f64>,
}

/// `[stream]` table
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StreamSection {
    pub capacity: Option<usize>,
    pub warmup: Option<usize>,
    pub points: Option<usize>,
    pub speed: Option<u32>,
    pub seed: Option<u64>,
}

/// Root configuration for spikewatch.toml
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub detector: DetectorSection,
    #[serde(default)]
    pub generator: GeneratorSection,
    #[serde(default)]
    pub stream: StreamSection,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML in spikewatch config")
    }
}

/// Values supplied on the command line; `None` means "not given"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub method: Option<DetectionMethod>,
    pub threshold: Option<f64>,
    pub multiplier: Option<f64>,
    pub window: Option<usize>,
    pub alpha: Option<f64>,
    pub generator: Option<GeneratorKind>,
    pub base: Option<f64>,
    pub spread: Option<f64>,
    pub capacity: Option<usize>,
    pub warmup: Option<usize>,
    pub points: Option<usize>,
    pub speed: Option<u32>,
    pub seed: Option<u64>,
    pub no_delay: bool,
}

/// Fully-resolved settings for one replay run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub generator: GeneratorSettings,
    pub session: SessionConfig,
    pub points: usize,
    pub speed: u32,
    /// Pause between samples, `None` to stream as fast as possible
    pub delay: Option<Duration>,
    pub seed: Option<u64>,
}

fn insert_param(bag: &mut ParamBag, key: &str, file: Option<f64>, cli: Option<f64>) {
    if let Some(value) = cli.or(file) {
        bag.set(key, value);
    }
}

impl RunConfig {
    /// Merge command-line overrides over an optional file configuration
    pub fn resolve(overrides: &Overrides, file: Option<&FileConfig>) -> Result<Self> {
        let default_file = FileConfig::default();
        let file = file.unwrap_or(&default_file);

        let method = match (overrides.method, file.detector.method.as_deref()) {
            (Some(method), _) => method,
            (None, Some(name)) => name
                .parse::<DetectionMethod>()
                .context("Invalid [detector] method in config")?,
            (None, None) => DetectionMethod::ZScore,
        };

        let mut bag = ParamBag::new();
        insert_param(&mut bag, keys::THRESHOLD, file.detector.threshold, overrides.threshold);
        insert_param(&mut bag, keys::MULTIPLIER, file.detector.multiplier, overrides.multiplier);
        insert_param(
            &mut bag,
            keys::WINDOW,
            file.detector.window.map(|w| w as f64),
            overrides.window.map(|w| w as f64),
        );
        insert_param(&mut bag, keys::ALPHA, file.detector.alpha, overrides.alpha);

        for key in [keys::THRESHOLD, keys::MULTIPLIER, keys::WINDOW, keys::ALPHA] {
            if bag.get(key).is_some() && !method.parameter_keys().contains(&key) {
                warn!("Ignoring parameter '{}': not used by {}", key, method);
            }
        }

        let params = DetectorParams::from_bag(method, &bag)?;
        params.validate()?;

        let kind = overrides
            .generator
            .or(file.generator.kind)
            .unwrap_or(GeneratorKind::StockPrice);
        let generator = GeneratorSettings {
            kind,
            base: overrides
                .base
                .or(file.generator.base)
                .unwrap_or_else(|| kind.default_base()),
            spread: overrides
                .spread
                .or(file.generator.spread)
                .unwrap_or_else(|| kind.default_spread()),
        };

        let capacity = overrides
            .capacity
            .or(file.stream.capacity)
            .unwrap_or(DEFAULT_CAPACITY);
        if capacity == 0 {
            anyhow::bail!("Invalid capacity: must be > 0");
        }

        let speed = overrides
            .speed
            .or(file.stream.speed)
            .unwrap_or(DEFAULT_SPEED);
        if !(1..=MAX_SPEED).contains(&speed) {
            anyhow::bail!(
                "Invalid speed: {} (must be between 1 and {})",
                speed,
                MAX_SPEED
            );
        }

        let delay = if overrides.no_delay {
            None
        } else {
            Some(Duration::from_millis(1000 / u64::from(speed)))
        };

        Ok(Self {
            generator,
            session: SessionConfig {
                capacity,
                warmup: overrides
                    .warmup
                    .or(file.stream.warmup)
                    .unwrap_or(DEFAULT_WARMUP),
                params,
            },
            points: overrides
                .points
                .or(file.stream.points)
                .unwrap_or(DEFAULT_POINTS),
            speed,
            delay,
            seed: overrides.seed.or(file.stream.seed),
        })
    }
}
