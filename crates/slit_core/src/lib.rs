//! Core double-slit domain logic that stays independent of any plotting or UI shell.
//!
//! The crate hosts:
//! - experiment configuration shared between the CLI and the detector
//! - the wavefunction density model and its seeded sampling
//! - the detector that accumulates detection events
//! - histogram exports consumed by display collaborators

pub mod config;
pub mod detector;
pub mod error;
pub mod metrics;
pub mod quadrature;
pub mod screen;
pub mod wavefunction;

/// Convenience re-export for the scalar type used across the simulator.
pub type Scalar = f64;

pub use config::ExperimentSettings;
pub use detector::Detector;
pub use error::{Result, SlitError};
pub use screen::{ScreenHistogram, XHistogram};
pub use wavefunction::Wavefunction;
