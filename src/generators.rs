//! Synthetic signal sources with injected anomalies
//!
//! Two generators feed the replay loop:
//! - stock price: `base + N(0, volatility)`, and with 5% probability the
//!   change is scaled by one of ±3, ±4;
//! - temperature: `base + N(0, noise)`, and with 3% probability one of
//!   +10, -10, +15, -8 is added.

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const STOCK_SPIKE_PROBABILITY: f64 = 0.05;
const STOCK_SPIKE_FACTORS: [f64; 4] = [3.0, -3.0, 4.0, -4.0];
const TEMPERATURE_SPIKE_PROBABILITY: f64 = 0.03;
const TEMPERATURE_SPIKE_OFFSETS: [f64; 4] = [10.0, -10.0, 15.0, -8.0];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneratorError {
    #[error("Invalid spread for {kind} generator: {value} (must be finite and >= 0)")]
    InvalidSpread { kind: GeneratorKind, value: f64 },

    #[error("Invalid base value for {kind} generator: {value}")]
    InvalidBase { kind: GeneratorKind, value: f64 },
}

/// Which synthetic signal to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorKind {
    /// Price jittering around a fixed base
    #[serde(alias = "Stock Price")]
    StockPrice,
    /// Noisy sensor around a fixed temperature
    #[serde(alias = "Temperature Readings")]
    Temperature,
}

impl GeneratorKind {
    /// Human-readable label used in chart titles
    pub fn label(&self) -> &'static str {
        match self {
            GeneratorKind::StockPrice => "Stock Price",
            GeneratorKind::Temperature => "Temperature Readings",
        }
    }

    pub fn default_base(&self) -> f64 {
        match self {
            GeneratorKind::StockPrice => 100.0,
            GeneratorKind::Temperature => 25.0,
        }
    }

    /// Volatility for prices, noise for temperatures
    pub fn default_spread(&self) -> f64 {
        match self {
            GeneratorKind::StockPrice => 2.0,
            GeneratorKind::Temperature => 0.5,
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tuning for a [`SignalGenerator`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    pub kind: GeneratorKind,
    pub base: f64,
    pub spread: f64,
}

impl GeneratorSettings {
    pub fn new(kind: GeneratorKind) -> Self {
        Self {
            kind,
            base: kind.default_base(),
            spread: kind.default_spread(),
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::new(GeneratorKind::StockPrice)
    }
}

/// Endless source of synthetic samples
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    settings: GeneratorSettings,
    normal: Normal<f64>,
    rng: StdRng,
}

impl SignalGenerator {
    /// Create a generator; a `seed` makes the sequence reproducible
    pub fn new(settings: GeneratorSettings, seed: Option<u64>) -> Result<Self, GeneratorError> {
        if !settings.base.is_finite() {
            return Err(GeneratorError::InvalidBase {
                kind: settings.kind,
                value: settings.base,
            });
        }
        let invalid_spread = GeneratorError::InvalidSpread {
            kind: settings.kind,
            value: settings.spread,
        };
        if !settings.spread.is_finite() {
            return Err(invalid_spread);
        }
        let normal = Normal::new(0.0, settings.spread).map_err(|_| invalid_spread)?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            settings,
            normal,
            rng,
        })
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Draw the next sample
    pub fn next_value(&mut self) -> f64 {
        match self.settings.kind {
            GeneratorKind::StockPrice => self.stock_price(),
            GeneratorKind::Temperature => self.temperature(),
        }
    }

    fn stock_price(&mut self) -> f64 {
        let mut change = self.normal.sample(&mut self.rng);
        if self.rng.gen::<f64>() < STOCK_SPIKE_PROBABILITY {
            change *= STOCK_SPIKE_FACTORS[self.rng.gen_range(0..STOCK_SPIKE_FACTORS.len())];
        }
        self.settings.base + change
    }

    fn temperature(&mut self) -> f64 {
        let mut reading = self.settings.base + self.normal.sample(&mut self.rng);
        if self.rng.gen::<f64>() < TEMPERATURE_SPIKE_PROBABILITY {
            reading += TEMPERATURE_SPIKE_OFFSETS[self.rng.gen_range(0..TEMPERATURE_SPIKE_OFFSETS.len())];
        }
        reading
    }
}

impl Iterator for SignalGenerator {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_value())
    }
}
