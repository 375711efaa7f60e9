//! Spikewatch - streaming signal simulator with statistical anomaly detection
//!
//! The core is a set of stateless detectors ([`detectors`]) that judge the
//! most recent sample of a bounded window, and a dispatcher ([`dispatch`])
//! that selects one by name. The remaining modules host the replay loop:
//! synthetic generators, the session state, configuration, and renderers.

pub mod cli;
pub mod config;
pub mod csv_output;
pub mod detectors;
pub mod dispatch;
pub mod generators;
pub mod html_output;
pub mod json_output;
pub mod session;
pub mod stats;
pub mod text_output;
pub mod window;

pub use dispatch::{dispatch, DetectionMethod, DetectorParams, DispatchError, ParamBag};
pub use window::SampleWindow;
