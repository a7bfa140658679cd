//! Calibration table parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The calibration table as written in `ballistics.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct BallisticsParams {
    /// Calibration entries, sorted by increasing distance.
    pub entries: Vec<CalEntry>,
}

/// One calibration point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalEntry {
    /// Horizontal distance from the turret to the goal.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Flywheel speed.
    ///
    /// Units: radians/second
    pub shooter_speed_rads: f64,

    /// Hood launch angle.
    ///
    /// Units: degrees
    pub hood_angle_deg: f64,
}

impl CalEntry {
    pub fn new(distance_m: f64, shooter_speed_rads: f64, hood_angle_deg: f64) -> Self {
        Self {
            distance_m,
            shooter_speed_rads,
            hood_angle_deg,
        }
    }
}
