//! Histogram exports handed to display collaborators.
//!
//! [`ScreenHistogram`] bins detections over the fixed screen window
//! (`x ∈ [-10, 10]`, `y ∈ [-5, 5]`); [`XHistogram`] bins x alone over the observed range.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::wavefunction::{SCREEN_MAX, SCREEN_MIN};
use crate::Scalar;

/// Horizontal window of the screen; the same span the wavefunction is supported on.
pub const SCREEN_X_RANGE: (Scalar, Scalar) = (SCREEN_MIN, SCREEN_MAX);
pub const SCREEN_Y_RANGE: (Scalar, Scalar) = (-5.0, 5.0);

/// Maps `value` to a bin in `[lo, hi]` split into `bins` equal parts. The right edge is
/// inclusive; values outside the range map to `None`.
fn bin_index(value: Scalar, lo: Scalar, hi: Scalar, bins: usize) -> Option<usize> {
    if bins == 0 || !(lo..=hi).contains(&value) {
        return None;
    }
    let scaled = (value - lo) / (hi - lo) * bins as Scalar;
    Some((scaled as usize).min(bins - 1))
}

fn edges(lo: Scalar, hi: Scalar, bins: usize) -> Vec<Scalar> {
    crate::quadrature::linspace(lo, hi, bins + 1)
}

/// 2D detection counts over the screen, stored row-major with `height` rows of `width` bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenHistogram {
    pub width: usize,
    pub height: usize,
    pub x_range: (Scalar, Scalar),
    pub y_range: (Scalar, Scalar),
    pub counts: Vec<u32>,
}

impl ScreenHistogram {
    pub fn from_detections(detections: &[DVec2], width: usize, height: usize) -> Self {
        let (x_lo, x_hi) = SCREEN_X_RANGE;
        let (y_lo, y_hi) = SCREEN_Y_RANGE;
        let mut counts = vec![0u32; width * height];
        for point in detections {
            let (Some(col), Some(row)) = (
                bin_index(point.x, x_lo, x_hi, width),
                bin_index(point.y, y_lo, y_hi, height),
            ) else {
                continue;
            };
            counts[row * width + col] += 1;
        }
        Self {
            width,
            height,
            x_range: SCREEN_X_RANGE,
            y_range: SCREEN_Y_RANGE,
            counts,
        }
    }

    /// Count in column `col`, row `row` (row 0 is the bottom of the screen).
    pub fn get(&self, col: usize, row: usize) -> Option<u32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.counts.get(row * self.width + col).copied()
    }

    /// Counts of row `row` from left to right; `None` past the top of the screen.
    pub fn row(&self, row: usize) -> Option<&[u32]> {
        if row >= self.height {
            return None;
        }
        let start = row * self.width;
        self.counts.get(start..start + self.width)
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn x_edges(&self) -> Vec<Scalar> {
        edges(self.x_range.0, self.x_range.1, self.width)
    }

    pub fn y_edges(&self) -> Vec<Scalar> {
        edges(self.y_range.0, self.y_range.1, self.height)
    }
}

/// 1D counts of detected x positions, auto-ranged to the observed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XHistogram {
    pub range: (Scalar, Scalar),
    pub counts: Vec<u32>,
}

impl XHistogram {
    pub fn from_values(values: &[Scalar], bins: usize) -> Self {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (lo, hi) = finite.fold((Scalar::INFINITY, Scalar::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let range = if lo > hi {
            (0.0, 1.0)
        } else if lo == hi {
            (lo - 0.5, hi + 0.5)
        } else {
            (lo, hi)
        };

        let mut counts = vec![0u32; bins];
        for &value in values {
            if let Some(idx) = bin_index(value, range.0, range.1, bins) {
                counts[idx] += 1;
            }
        }
        Self { range, counts }
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn edges(&self) -> Vec<Scalar> {
        edges(self.range.0, self.range.1, self.counts.len())
    }

    pub fn centers(&self) -> Vec<Scalar> {
        self.edges().windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}
