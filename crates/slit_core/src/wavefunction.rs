//! Probability density of an electron's detection position on the screen.
//!
//! Two regimes are modelled:
//! - **wave** (slits not measured): `cos²(π·d·x / L)` over `[-10, 10]`, discretized into
//!   1000 support points whose weights come from trapezoidal integration of the
//!   normalized density over each support interval.
//! - **collapsed** (slits measured): two point masses at `±d/2`, each with weight `0.5`.
//!
//! Sampling draws a support point from the discrete weights and adds jitter: Gaussian
//! (σ = 0.2) for the finite slit aperture when collapsed, uniform within ±0.01 for the
//! finite screen resolution otherwise.

use std::f64::consts::PI;

use rand::distributions::{Distribution, Uniform, WeightedIndex};
use rand::Rng;
use rand_distr::Normal;
use tracing::debug;

use crate::config::{validate_physical, ExperimentSettings};
use crate::error::{Result, SlitError};
use crate::metrics::checksum;
use crate::quadrature::{linspace, trapezoid};
use crate::Scalar;

/// Number of support points across the screen in wave mode.
pub const SUPPORT_POINTS: usize = 1000;
/// Number of samples per support interval used to integrate bin masses.
pub const REFINEMENT_POINTS: usize = 100;
pub const SCREEN_MIN: Scalar = -10.0;
pub const SCREEN_MAX: Scalar = 10.0;
/// Standard deviation of the aperture jitter applied to collapsed samples.
pub const SLIT_APERTURE_STD: Scalar = 0.2;
/// Half-width of the screen resolution jitter applied to wave samples.
pub const SCREEN_RESOLUTION: Scalar = 0.01;
/// Relative tolerance used when matching a coordinate against a slit position.
pub const SLIT_TOLERANCE: Scalar = 1e-9;

#[derive(Debug, Clone)]
enum Jitter {
    Aperture(Normal<Scalar>),
    Resolution(Uniform<Scalar>),
}

impl Jitter {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Scalar {
        match self {
            Jitter::Aperture(normal) => normal.sample(rng),
            Jitter::Resolution(uniform) => uniform.sample(rng),
        }
    }
}

/// Discretized detection-position density for one experimental setup.
///
/// Immutable once built; rebuild a new one to change the setup.
#[derive(Debug, Clone)]
pub struct Wavefunction {
    slit_separation: Scalar,
    screen_distance: Scalar,
    measure_slits: bool,
    support: Vec<Scalar>,
    bin_weights: Vec<Scalar>,
    normalization: Scalar,
    sampler: WeightedIndex<Scalar>,
    jitter: Jitter,
}

impl Wavefunction {
    pub fn new(
        slit_separation: Scalar,
        screen_distance: Scalar,
        measure_slits: bool,
    ) -> Result<Self> {
        validate_physical(slit_separation, screen_distance)?;

        let (support, bin_weights, normalization, jitter) = if measure_slits {
            let half = slit_separation / 2.0;
            let aperture = Normal::new(0.0, SLIT_APERTURE_STD)
                .map_err(|err| SlitError::InvalidConfiguration(err.to_string()))?;
            (vec![-half, half], vec![0.5, 0.5], 1.0, Jitter::Aperture(aperture))
        } else {
            let support = linspace(SCREEN_MIN, SCREEN_MAX, SUPPORT_POINTS);
            let unnormalized: Vec<Scalar> = support
                .iter()
                .map(|&x| fringe_intensity(slit_separation, screen_distance, x))
                .collect();
            let normalization = trapezoid(&unnormalized, &support);
            if !normalization.is_finite() || normalization <= 0.0 {
                return Err(SlitError::InvalidConfiguration(format!(
                    "density cannot be normalized (integral {normalization})"
                )));
            }
            let weights = integrate_bins(&support, |x| {
                fringe_intensity(slit_separation, screen_distance, x) / normalization
            })?;
            let resolution = Uniform::new(-SCREEN_RESOLUTION, SCREEN_RESOLUTION);
            (support, weights, normalization, Jitter::Resolution(resolution))
        };

        let sampler = WeightedIndex::new(&bin_weights)
            .map_err(|err| SlitError::InvalidConfiguration(format!("bin weights: {err}")))?;

        debug!(
            slit_separation,
            screen_distance,
            measure_slits,
            support_len = support.len(),
            normalization,
            "built wavefunction"
        );

        Ok(Self {
            slit_separation,
            screen_distance,
            measure_slits,
            support,
            bin_weights,
            normalization,
            sampler,
            jitter,
        })
    }

    pub fn from_settings(settings: &ExperimentSettings) -> Result<Self> {
        Self::new(
            settings.slit_separation,
            settings.screen_distance,
            settings.measure_slits,
        )
    }

    pub fn slit_separation(&self) -> Scalar {
        self.slit_separation
    }

    pub fn screen_distance(&self) -> Scalar {
        self.screen_distance
    }

    pub fn measure_slits(&self) -> bool {
        self.measure_slits
    }

    pub fn support(&self) -> &[Scalar] {
        &self.support
    }

    pub fn bin_weights(&self) -> &[Scalar] {
        &self.bin_weights
    }

    /// Integral of the unnormalized density over the support (1 when collapsed).
    pub fn normalization(&self) -> Scalar {
        self.normalization
    }

    /// Probability density at `x`.
    ///
    /// Collapsed wavefunctions only carry mass at the two slit positions, so any `x` that
    /// is not within [`SLIT_TOLERANCE`] of a slit evaluates to zero. Prefer
    /// [`Wavefunction::bin_probability`] when the support index is known.
    pub fn evaluate(&self, x: Scalar) -> Scalar {
        if !self.measure_slits {
            return self.evaluate_unnormalized(x) / self.normalization;
        }
        let near = |slit: Scalar| (x - slit).abs() <= SLIT_TOLERANCE * slit.abs().max(1.0);
        if self.support.iter().any(|&slit| near(slit)) {
            0.5
        } else {
            0.0
        }
    }

    /// `cos²(π·d·x / L)` without normalization.
    pub fn evaluate_unnormalized(&self, x: Scalar) -> Scalar {
        fringe_intensity(self.slit_separation, self.screen_distance, x)
    }

    /// Discrete probability mass assigned to the support point at `index`.
    pub fn bin_probability(&self, index: usize) -> Option<Scalar> {
        self.bin_weights.get(index).copied()
    }

    /// Collapses the superposition: returns the detected x coordinate of one electron.
    pub fn measure<R: Rng + ?Sized>(&self, rng: &mut R) -> Scalar {
        let index = self.sampler.sample(rng);
        self.support[index] + self.jitter.sample(rng)
    }

    /// True when `settings` describe the same physical setup this wavefunction was built for.
    pub fn matches(&self, settings: &ExperimentSettings) -> bool {
        self.slit_separation == settings.slit_separation
            && self.screen_distance == settings.screen_distance
            && self.measure_slits == settings.measure_slits
    }
}

fn fringe_intensity(slit_separation: Scalar, screen_distance: Scalar, x: Scalar) -> Scalar {
    (PI * slit_separation * x / screen_distance).cos().powi(2)
}

/// Integrates `density` over every support interval, assigning each interval's mass to
/// its right-hand point. The first point receives zero and the result sums to one.
fn integrate_bins<F>(support: &[Scalar], density: F) -> Result<Vec<Scalar>>
where
    F: Fn(Scalar) -> Scalar,
{
    let mut weights = Vec::with_capacity(support.len());
    weights.push(0.0);
    let mut ys = Vec::with_capacity(REFINEMENT_POINTS);
    for interval in support.windows(2) {
        let xs = linspace(interval[0], interval[1], REFINEMENT_POINTS);
        ys.clear();
        ys.extend(xs.iter().map(|&x| density(x)));
        weights.push(trapezoid(&ys, &xs));
    }

    let total = checksum(&weights);
    if !total.is_finite() || total <= 0.0 {
        return Err(SlitError::InvalidConfiguration(format!("bin weights sum to {total}")));
    }
    let inv_total = 1.0 / total;
    for weight in &mut weights {
        *weight *= inv_total;
    }
    Ok(weights)
}
