//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};
use ordered_float::OrderedFloat;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle into the range `(-pi, pi]`.
///
/// An angle of exactly `-pi` (or any odd multiple of pi) maps to `+pi`.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float + FloatConst
{
    let pi_t = T::PI();
    let tau_t = pi_t + pi_t;

    let r = rem_euclid(angle, tau_t);

    if r > pi_t {
        r - tau_t
    }
    else {
        r
    }
}

/// Mean of a set of angles, computed on the unit circle so that angles either
/// side of the wrap point average correctly.
///
/// Returns `None` if there are no angles.
pub fn circular_mean<I>(angles: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>
{
    let mut sum_sin = 0f64;
    let mut sum_cos = 0f64;
    let mut count = 0usize;

    for a in angles {
        sum_sin += a.sin();
        sum_cos += a.cos();
        count += 1;
    }

    if count == 0 {
        return None;
    }

    Some(sum_sin.atan2(sum_cos))
}

/// Median of a set of values.
///
/// For an even number of values the mean of the two middle values is
/// returned. Returns `None` if there are no values.
pub fn median<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>
{
    let mut sorted: Vec<OrderedFloat<f64>> = values
        .into_iter()
        .map(OrderedFloat)
        .collect();

    if sorted.is_empty() {
        return None;
    }

    sorted.sort();

    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1].0 + sorted[mid].0) / 2.0)
    }
    else {
        Some(sorted[mid].0)
    }
}
