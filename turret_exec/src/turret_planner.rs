//! # Turret planner
//!
//! Resolves turret angle demands against the turret's mechanical range.
//!
//! The turret can travel more than a full rotation in total, but cabling
//! limits it to an asymmetric window (for example -70 to 290 degrees). Any
//! angle has several equivalent mechanism positions and the planner picks the
//! one that is both reachable and closest to where the turret already is.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::f64::consts::TAU;

// Internal
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A closed interval of mechanism relative angles the turret may be
/// commanded to.
///
/// Units: radians
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RangeDeg")]
pub struct AngleRange {
    min_rad: f64,
    max_rad: f64,
}

/// Representation of a range in the parameter files, which are written in
/// degrees.
#[derive(Debug, Clone, Copy, Deserialize)]
struct RangeDeg {
    min_deg: f64,
    max_deg: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PlannerError {
    #[error("Angle range is inverted or empty (min = {0} rad, max = {1} rad)")]
    InvertedRange(f64, f64),

    #[error("Angle range bounds must be finite (min = {0} rad, max = {1} rad)")]
    NonFiniteRange(f64, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AngleRange {
    /// Create a new range from bounds in radians.
    pub fn new(min_rad: f64, max_rad: f64) -> Result<Self, PlannerError> {
        if !min_rad.is_finite() || !max_rad.is_finite() {
            return Err(PlannerError::NonFiniteRange(min_rad, max_rad));
        }

        if min_rad >= max_rad {
            return Err(PlannerError::InvertedRange(min_rad, max_rad));
        }

        Ok(Self { min_rad, max_rad })
    }

    /// Create a new range from bounds in degrees.
    pub fn from_deg(min_deg: f64, max_deg: f64) -> Result<Self, PlannerError> {
        Self::new(min_deg.to_radians(), max_deg.to_radians())
    }

    pub fn min_rad(&self) -> f64 {
        self.min_rad
    }

    pub fn max_rad(&self) -> f64 {
        self.max_rad
    }

    /// True if the angle lies inside the range, bounds included.
    pub fn contains(&self, angle_rad: f64) -> bool {
        angle_rad >= self.min_rad && angle_rad <= self.max_rad
    }
}

impl std::convert::TryFrom<RangeDeg> for AngleRange {
    type Error = PlannerError;

    fn try_from(r: RangeDeg) -> Result<Self, Self::Error> {
        AngleRange::from_deg(r.min_deg, r.max_deg)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Signed shortest angular distance from `from_rad` to `to_rad`.
///
/// The result is in `(-pi, pi]`, so an exact half turn is positive.
pub fn shortest_ang_dist(from_rad: f64, to_rad: f64) -> f64 {
    wrap_pi(to_rad - from_rad)
}

/// Constrain an angle into the range, see [`constrain_with_status`].
pub fn constrain_to_range(angle_rad: f64, range: &AngleRange) -> f64 {
    constrain_with_status(angle_rad, range).0
}

/// Constrain an angle into the range.
///
/// Angles already inside the range are returned unchanged. Otherwise the
/// angle is moved by whole rotations to the lowest equivalent angle above the
/// minimum. If that is still outside the range (the angle points into the
/// turret's dead zone) the result rails to the closer bound, ties going to
/// the minimum, and the returned flag is `true`.
pub fn constrain_with_status(angle_rad: f64, range: &AngleRange) -> (f64, bool) {
    if range.contains(angle_rad) {
        return (angle_rad, false);
    }

    let rotations = ((range.min_rad - angle_rad) / TAU).ceil();
    let shifted = angle_rad + rotations * TAU;

    if range.contains(shifted) {
        return (shifted, false);
    }

    // Round-off can leave the shifted angle a hair under the minimum
    if shifted < range.min_rad {
        return (range.min_rad, false);
    }

    // The dead zone spans (max, min + TAU)
    let to_max = shifted - range.max_rad;
    let to_min = range.min_rad + TAU - shifted;

    if to_max < to_min {
        (range.max_rad, true)
    }
    else {
        (range.min_rad, true)
    }
}

/// Find the mechanism angle equivalent to `desired_rad` which is reached by
/// the smallest rotation from `current_rad`, see [`optimise_with_status`].
pub fn optimise(desired_rad: f64, current_rad: f64, range: &AngleRange) -> f64 {
    optimise_with_status(desired_rad, current_rad, range).0
}

/// Find the mechanism angle equivalent to `desired_rad` which is reached by
/// the smallest rotation from `current_rad`.
///
/// If the shortest rotation would leave the range the result is wrapped back
/// into it by [`constrain_with_status`], the flag is `true` if the result had
/// to be railed to a bound.
pub fn optimise_with_status(
    desired_rad: f64,
    current_rad: f64,
    range: &AngleRange
) -> (f64, bool) {
    let displacement = shortest_ang_dist(current_rad, desired_rad);

    constrain_with_status(current_rad + displacement, range)
}
