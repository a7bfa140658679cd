//! # Localisation module
//!
//! Planar poses and rigid transforms used to move observations between the
//! field, robot, turret and camera frames.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

// Internal
use comms_if::eqpt::odom::OdomData;
use util::{interp::Interpolate, maths::wrap_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The position and heading of a frame within a parent frame.
///
/// Most poses are field relative, the field frame having X+ along the field's
/// length and headings measured counterclockwise from X+.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2 {
    /// Position in the parent frame
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Heading relative to the parent frame's X+ axis, in `(-pi, pi]`.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// A rigid offset expressed in the frame it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2 {
    /// Units: meters
    pub translation_m: Vector2<f64>,

    /// Units: radians
    pub rotation_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose2 {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad: wrap_pi(heading_rad),
        }
    }

    /// Apply a transform expressed in this pose's frame.
    pub fn transform_by(&self, t: &Transform2) -> Self {
        let rot = Rotation2::new(self.heading_rad);

        Self {
            position_m: self.position_m + rot * t.translation_m,
            heading_rad: wrap_pi(self.heading_rad + t.rotation_rad),
        }
    }

    /// Express this pose in the frame of `other`.
    pub fn relative_to(&self, other: &Pose2) -> Self {
        let rot = Rotation2::new(-other.heading_rad);

        Self {
            position_m: rot * (self.position_m - other.position_m),
            heading_rad: wrap_pi(self.heading_rad - other.heading_rad),
        }
    }

    /// Straight line distance between the two poses' positions.
    pub fn distance_to(&self, other: &Pose2) -> f64 {
        (other.position_m - self.position_m).norm()
    }

    /// Direction from this pose's position to the other's, in the parent
    /// frame.
    pub fn bearing_to(&self, other: &Pose2) -> f64 {
        let diff = other.position_m - self.position_m;
        diff.y.atan2(diff.x)
    }

    /// True if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position_m.x.is_finite()
            && self.position_m.y.is_finite()
            && self.heading_rad.is_finite()
    }
}

impl Default for Pose2 {
    fn default() -> Self {
        Self {
            position_m: Vector2::zeros(),
            heading_rad: 0.0,
        }
    }
}

impl From<OdomData> for Pose2 {
    fn from(o: OdomData) -> Self {
        Pose2::new(o.x_m, o.y_m, o.heading_rad)
    }
}

impl Interpolate for Pose2 {
    /// Lerp the position and rotate the heading along the shortest arc.
    fn interpolate(&self, other: &Self, frac: f64) -> Self {
        let dh = wrap_pi(other.heading_rad - self.heading_rad);

        Self {
            position_m: self.position_m + (other.position_m - self.position_m) * frac,
            heading_rad: wrap_pi(self.heading_rad + dh * frac),
        }
    }
}

impl Transform2 {
    pub fn new(x_m: f64, y_m: f64, rotation_rad: f64) -> Self {
        Self {
            translation_m: Vector2::new(x_m, y_m),
            rotation_rad,
        }
    }

    /// A pure rotation.
    pub fn rotation(rotation_rad: f64) -> Self {
        Self::new(0.0, 0.0, rotation_rad)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_transform_by() {
        let robot = Pose2::new(1.0, 2.0, FRAC_PI_2);
        let turret = robot.transform_by(&Transform2::new(-0.5, 0.0, 0.0));

        assert_relative_eq!(turret.position_m.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(turret.position_m.y, 1.5, epsilon = 1e-12);
        assert_relative_eq!(turret.heading_rad, FRAC_PI_2);

        let turned = turret.transform_by(&Transform2::rotation(PI));
        assert_relative_eq!(turned.heading_rad, -FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_relative_to() {
        let robot = Pose2::new(1.0, 1.0, FRAC_PI_2);
        let goal = Pose2::new(1.0, 4.0, 0.0);

        let rel = goal.relative_to(&robot);
        assert_relative_eq!(rel.position_m.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(rel.position_m.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rel.heading_rad, -FRAC_PI_2, epsilon = 1e-12);

        assert_relative_eq!(robot.distance_to(&goal), 3.0);
        assert_relative_eq!(robot.bearing_to(&goal), FRAC_PI_2);
    }

    #[test]
    fn test_interpolate_heading_wrap() {
        let a = Pose2::new(0.0, 0.0, PI - 0.1);
        let b = Pose2::new(2.0, 0.0, -PI + 0.1);

        let mid = a.interpolate(&b, 0.5);
        assert_relative_eq!(mid.position_m.x, 1.0);
        assert_relative_eq!(mid.heading_rad.abs(), PI, epsilon = 1e-9);
    }

    #[test]
    fn test_from_odom() {
        let p: Pose2 = OdomData { x_m: 1.0, y_m: -2.0, heading_rad: 3.0 * PI }.into();
        assert_eq!(p.position_m, Vector2::new(1.0, -2.0));
        assert_relative_eq!(p.heading_rad.abs(), PI, epsilon = 1e-9);
    }
}
