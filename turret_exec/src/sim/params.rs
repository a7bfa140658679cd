//! Parameters for the simulated field

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::loc::Pose2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated field and equipment.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {

    // ---- ROBOT ----

    /// Starting field pose of the robot, `[x_m, y_m, heading_deg]`.
    pub robot_start: [f64; 3],

    /// Constant rate the robot spins at.
    ///
    /// Units: degrees/second
    pub robot_yaw_rate_degs: f64,

    // ---- ACTUATORS ----

    /// Time constant of the turret's position response.
    ///
    /// Units: seconds
    pub turret_tau_s: f64,

    /// Units: seconds
    pub shooter_tau_s: f64,

    /// Units: seconds
    pub hood_tau_s: f64,

    /// Speed reached at full open loop output.
    ///
    /// Units: radians/second
    pub max_speed_rads: f64,

    /// True mechanism angle of the turret at power up. The encoder reads
    /// zero here until the turret is zeroed.
    ///
    /// Units: degrees
    pub turret_start_deg: f64,

    /// Units: degrees
    pub hood_start_deg: f64,

    /// The homing sensor reads engaged for this long after start up.
    ///
    /// Units: seconds
    pub homing_engaged_s: f64,

    // ---- CAMERA ----

    /// Units: seconds
    pub camera_latency_s: f64,

    /// Units: degrees
    pub camera_hfov_deg: f64,

    /// Units: degrees
    pub camera_vfov_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimParams {
    pub fn robot_start_pose(&self) -> Pose2 {
        Pose2::new(
            self.robot_start[0],
            self.robot_start[1],
            self.robot_start[2].to_radians()
        )
    }
}
