//! Vision processing parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::loc::{Pose2, Transform2};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for vision processing.
///
/// Lengths are in meters and angles in degrees.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionParams {

    // ---- GEOMETRY ----

    /// Height of the centre of the goal's vision target above the floor.
    pub goal_height_m: f64,

    /// Height of the camera's optical centre above the floor.
    pub camera_height_m: f64,

    /// Angle of the camera's optical axis above the horizontal.
    pub camera_mount_angle_deg: f64,

    /// Position of the turret's rotation axis in the robot frame.
    pub robot_to_turret_m: [f64; 2],

    /// Position of the camera in the turret frame.
    pub turret_to_camera_m: [f64; 2],

    /// Yaw of the camera relative to the turret's zero direction.
    pub turret_to_camera_deg: f64,

    /// Known field pose of the goal, used to estimate the robot's pose from
    /// vision alone. Given as `[x_m, y_m, heading_deg]`.
    pub goal_location: [f64; 3],

    // ---- HISTORY ----

    /// Amount of odometry and turret angle history kept for latency
    /// compensation.
    ///
    /// Units: seconds
    pub history_span_s: f64,

    /// Frames reporting more latency than this are rejected.
    ///
    /// Units: seconds
    pub max_latency_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VisionParams {
    /// Offset of the turret's rotation axis from the robot centre, with no
    /// rotation.
    pub fn robot_to_turret(&self) -> Transform2 {
        Transform2::new(self.robot_to_turret_m[0], self.robot_to_turret_m[1], 0.0)
    }

    /// Transform from the turret frame to the camera frame.
    pub fn turret_to_camera(&self) -> Transform2 {
        Transform2::new(
            self.turret_to_camera_m[0],
            self.turret_to_camera_m[1],
            self.turret_to_camera_deg.to_radians()
        )
    }

    /// Field pose of the camera for a robot pose and turret mechanism angle.
    pub fn camera_pose(&self, robot_pose: &Pose2, turret_angle_rad: f64) -> Pose2 {
        robot_pose
            .transform_by(&self.robot_to_turret())
            .transform_by(&Transform2::rotation(turret_angle_rad))
            .transform_by(&self.turret_to_camera())
    }

    pub fn goal_pose(&self) -> Pose2 {
        Pose2::new(
            self.goal_location[0],
            self.goal_location[1],
            self.goal_location[2].to_radians()
        )
    }
}
