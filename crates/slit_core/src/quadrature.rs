//! Sample grids and trapezoidal integration.

use crate::Scalar;

/// Returns `num` evenly spaced samples over `[start, end]`, endpoints included.
pub fn linspace(start: Scalar, end: Scalar, num: usize) -> Vec<Scalar> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (num - 1) as Scalar;
            let mut values: Vec<Scalar> = (0..num).map(|i| start + step * i as Scalar).collect();
            // Pin the last sample so accumulated rounding never overshoots the range.
            values[num - 1] = end;
            values
        }
    }
}

/// Integrates sampled `ys` over the abscissae `xs` with the trapezoidal rule.
///
/// Slices of unequal length are truncated to the shorter one; fewer than two samples
/// integrate to zero.
pub fn trapezoid(ys: &[Scalar], xs: &[Scalar]) -> Scalar {
    let n = ys.len().min(xs.len());
    if n < 2 {
        return 0.0;
    }
    xs[..n]
        .windows(2)
        .zip(ys[..n].windows(2))
        .map(|(x, y)| 0.5 * (x[1] - x[0]) * (y[0] + y[1]))
        .sum()
}

/// Samples `f` over `num` points on `[start, end]` and integrates the result.
pub fn integrate<F>(f: F, start: Scalar, end: Scalar, num: usize) -> Scalar
where
    F: Fn(Scalar) -> Scalar,
{
    let xs = linspace(start, end, num);
    let ys: Vec<Scalar> = xs.iter().map(|&x| f(x)).collect();
    trapezoid(&ys, &xs)
}
