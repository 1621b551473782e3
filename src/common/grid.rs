//! Evenly spaced grids and first-extremum search
//!
//! Grid point `k` is always computed as `start + k * step` (never by repeated
//! addition) so that every candidate threshold is reproducible bit for bit.

use nalgebra::DVector;

/// Evenly spaced values in the half-open interval `[start, stop)`.
///
/// The number of points is `ceil((stop - start) / step)`, clamped at zero.
/// Returns an empty vector when `stop <= start` or `step` is not positive.
pub fn arange(start: f64, stop: f64, step: f64) -> DVector<f64> {
    if step.is_nan() || step <= 0.0 {
        return DVector::zeros(0);
    }
    let count = ((stop - start) / step).ceil();
    let count = if count.is_finite() && count > 0.0 {
        count as usize
    } else {
        0
    };
    DVector::from_fn(count, |k, _| start + k as f64 * step)
}

/// Index of the first minimum. NaN entries are never selected.
pub fn argmin_first(values: &DVector<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first maximum. NaN entries are never selected.
pub fn argmax_first(values: &DVector<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Round to a number of decimals, ties to even (scale, round, unscale).
#[inline]
pub fn round_decimals(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round_ties_even() / scale
}
