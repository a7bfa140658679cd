//! # Camera equipment data

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One frame of results from the goal vision camera.
///
/// Angles are measured from the camera's optical axis, bearing positive to
/// the left and pitch positive upwards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct VisionFrame {
    /// True if the camera currently sees the goal
    pub valid: bool,

    /// Horizontal angle to the goal in radians
    pub bearing_rad: f64,

    /// Vertical angle to the goal in radians
    pub pitch_rad: f64,

    /// Time between image capture and the result being available, in
    /// seconds
    pub latency_s: f64,
}
