//! Summary statistics used for diagnostics and statistical checks on detections.

use crate::Scalar;

pub fn mean(values: &[Scalar]) -> Scalar {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<Scalar>() / values.len() as Scalar
}

/// Population variance.
pub fn variance(values: &[Scalar]) -> Scalar {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    values.iter().map(|v| (v - mu).powi(2)).sum::<Scalar>() / values.len() as Scalar
}

pub fn std_dev(values: &[Scalar]) -> Scalar {
    variance(values).sqrt()
}

/// Total mass of a weight vector; NaN or infinite entries propagate into the result.
pub fn checksum(values: &[Scalar]) -> Scalar {
    values.iter().sum()
}
