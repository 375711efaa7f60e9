//! CLI argument parsing for Spikewatch

use crate::config::{Overrides, MAX_SPEED};
use crate::dispatch::DetectionMethod;
use crate::generators::GeneratorKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the replay report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Real-time alerts on stderr and a summary on stdout (default)
    Text,
    /// JSON document for machine parsing
    Json,
    /// CSV rows for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "spikewatch")]
#[command(version)]
#[command(about = "Stream a synthetic signal and flag anomalies in real time", long_about = None)]
pub struct Cli {
    /// Synthetic signal to stream
    #[arg(short = 'g', long = "generator", value_enum)]
    pub generator: Option<GeneratorKind>,

    /// Anomaly detection method
    #[arg(short = 'm', long = "method", value_enum)]
    pub method: Option<DetectionMethod>,

    /// Z-score threshold in standard deviations (zscore: 3.0, rolling: 2.0)
    #[arg(long = "threshold", value_name = "SIGMA")]
    pub threshold: Option<f64>,

    /// IQR fence multiplier (default: 1.5)
    #[arg(long = "multiplier", value_name = "K")]
    pub multiplier: Option<f64>,

    /// Rolling z-score sub-window length (default: 20)
    #[arg(long = "window", value_name = "SIZE")]
    pub window: Option<usize>,

    /// Grubbs' test significance level (default: 0.05)
    #[arg(long = "alpha", value_name = "ALPHA")]
    pub alpha: Option<f64>,

    /// Generator base value (stock: 100, temperature: 25)
    #[arg(long = "base", value_name = "VALUE")]
    pub base: Option<f64>,

    /// Generator volatility / noise (stock: 2.0, temperature: 0.5)
    #[arg(long = "spread", value_name = "SIGMA")]
    pub spread: Option<f64>,

    /// Number of samples to stream (default: 100)
    #[arg(short = 'n', long = "points", value_name = "N")]
    pub points: Option<usize>,

    /// Sample window capacity (default: 200)
    #[arg(long = "capacity", value_name = "N")]
    pub capacity: Option<usize>,

    /// Samples collected before detection starts (default: 10)
    #[arg(long = "warmup", value_name = "N")]
    pub warmup: Option<usize>,

    /// Updates per second (default: 5)
    #[arg(long = "speed", value_name = "HZ", value_parser = clap::value_parser!(u32).range(1..=MAX_SPEED as i64))]
    pub speed: Option<u32>,

    /// Stream without pausing between samples
    #[arg(long = "no-delay")]
    pub no_delay: bool,

    /// Seed the generator for reproducible runs
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write an HTML chart report to this path
    #[arg(long = "html", value_name = "PATH")]
    pub html: Option<PathBuf>,

    /// Load settings from a spikewatch.toml file
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Command-line values that take precedence over the config file
    pub fn overrides(&self) -> Overrides {
        Overrides {
            method: self.method,
            threshold: self.threshold,
            multiplier: self.multiplier,
            window: self.window,
            alpha: self.alpha,
            generator: self.generator,
            base: self.base,
            spread: self.spread,
            capacity: self.capacity,
            warmup: self.warmup,
            points: self.points,
            speed: self.speed,
            seed: self.seed,
            no_delay: self.no_delay,
        }
    }
}
