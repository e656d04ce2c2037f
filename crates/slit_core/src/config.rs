//! Shared configuration types for the double-slit experiment.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlitError};
use crate::Scalar;

/// Seed used when the caller does not ask for a specific one.
pub const DEFAULT_SEED: u64 = 0x5EED5EED5EED5EED;

/// Experiment settings mirrored between the CLI and the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentSettings {
    /// Distance between the two slits. Larger values squeeze the fringes together.
    pub slit_separation: Scalar,
    /// Distance between the slits and the screen. Larger values spread the fringes out.
    pub screen_distance: Scalar,
    /// Number of screen bins along x.
    pub screen_width: usize,
    /// Number of screen bins along y.
    pub screen_height: usize,
    /// Whether the slit each electron passes through is measured.
    pub measure_slits: bool,
    pub seed: Option<u64>,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            slit_separation: 1.0,
            screen_distance: 10.0,
            screen_width: 200,
            screen_height: 100,
            measure_slits: false,
            seed: None,
        }
    }
}

impl ExperimentSettings {
    pub fn with_measure_slits(mut self, measure_slits: bool) -> Self {
        self.measure_slits = measure_slits;
        self
    }

    pub fn with_slit_separation(mut self, slit_separation: Scalar) -> Self {
        self.slit_separation = slit_separation;
        self
    }

    pub fn with_screen_distance(mut self, screen_distance: Scalar) -> Self {
        self.screen_distance = screen_distance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Seed the detector should use; falls back to [`DEFAULT_SEED`].
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// Rejects settings the wavefunction or the screen cannot be built from.
    pub fn validate(&self) -> Result<()> {
        validate_physical(self.slit_separation, self.screen_distance)?;
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(SlitError::InvalidConfiguration(format!(
                "screen must have at least one bin per axis (got {}x{})",
                self.screen_width, self.screen_height
            )));
        }
        Ok(())
    }
}

/// Checks the two physical parameters shared by the wavefunction and the detector.
pub(crate) fn validate_physical(slit_separation: Scalar, screen_distance: Scalar) -> Result<()> {
    if !slit_separation.is_finite() || slit_separation <= 0.0 {
        return Err(SlitError::InvalidConfiguration(format!(
            "slit_separation must be finite and positive (got {slit_separation})"
        )));
    }
    if !screen_distance.is_finite() || screen_distance <= 0.0 {
        return Err(SlitError::InvalidConfiguration(format!(
            "screen_distance must be finite and positive (got {screen_distance})"
        )));
    }
    Ok(())
}
