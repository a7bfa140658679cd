//! # Drivetrain odometry data

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pose estimate of the robot centre in the field frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct OdomData {
    pub x_m: f64,
    pub y_m: f64,

    /// Heading in radians, counterclockwise positive
    pub heading_rad: f64,
}
