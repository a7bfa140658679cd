//! # Vision processing module
//!
//! Turns the raw bearing and pitch reported by the turret camera into a field
//! relative goal pose for the goal tracker.
//!
//! The camera's results are delayed by its processing latency, so the robot
//! pose and turret angle used to place the goal on the field are looked up at
//! the moment the image was captured rather than the current cycle. This
//! module owns the odometry and turret angle histories used for that lookup.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Rotation2;

// Internal
pub use params::*;
use crate::loc::{Pose2, Transform2};
use comms_if::eqpt::cam::VisionFrame;
use util::{interp::InterpBuffer, maths::wrap_pi, time::Clock};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Vision processor, holds the histories needed to compensate for camera
/// latency.
#[derive(Debug, Clone)]
pub struct VisionProc<C> {
    params: VisionParams,
    clock: C,

    /// Field pose of the robot centre
    odom_history: InterpBuffer<Pose2, C>,

    /// Mechanism angle of the turret
    turret_history: InterpBuffer<f64, C>,
}

/// A goal sample ready to be given to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalSample {
    /// Capture time of the image the goal was seen in.
    pub time_s: f64,

    /// Field relative pose of the goal.
    pub pose: Pose2,

    /// Goal position in the camera frame.
    pub camera_to_goal: Transform2,

    /// Turret angle at the capture time.
    pub turret_angle_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a vision frame could not be turned into a goal sample.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum VisionError {
    #[error("The camera does not see the goal")]
    NoTarget,

    #[error("The frame contains non-finite values")]
    NonFinite,

    #[error("The frame's latency ({0} s) is negative or too large")]
    BadLatency(f64),

    #[error("The goal distance computed from the pitch is invalid ({0} m)")]
    BadDistance(f64),

    #[error("No odometry history is available")]
    NoOdomHistory,

    #[error("No turret angle history is available")]
    NoTurretHistory,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C: Clock + Clone> VisionProc<C> {
    pub fn new(params: VisionParams, clock: C) -> Self {
        Self {
            odom_history: InterpBuffer::new(params.history_span_s, clock.clone()),
            turret_history: InterpBuffer::new(params.history_span_s, clock.clone()),
            params,
            clock,
        }
    }

    /// Record the robot pose and turret angle for this cycle.
    ///
    /// Either can be `None` if the sensor is unavailable this cycle.
    pub fn record(&mut self, robot_pose: Option<Pose2>, turret_angle_rad: Option<f64>) {
        let now_s = self.clock.now_s();

        if let Some(p) = robot_pose {
            self.odom_history.set(now_s, p);
        }
        if let Some(a) = turret_angle_rad {
            self.turret_history.set(now_s, a);
        }
    }

    /// Horizontal distance from the camera to the goal given the pitch at
    /// which the camera sees it.
    pub fn ground_distance_m(&self, pitch_rad: f64) -> Result<f64, VisionError> {
        let delta_height_m = self.params.goal_height_m - self.params.camera_height_m;
        let elevation_rad = pitch_rad + self.params.camera_mount_angle_deg.to_radians();

        let distance_m = delta_height_m / elevation_rad.tan();

        if distance_m.is_finite() && distance_m > 0.0 {
            Ok(distance_m)
        }
        else {
            Err(VisionError::BadDistance(distance_m))
        }
    }

    /// Check a frame before it is used.
    pub fn validate(&self, frame: &VisionFrame) -> Result<(), VisionError> {
        if !frame.valid {
            return Err(VisionError::NoTarget);
        }

        if !(frame.bearing_rad.is_finite()
            && frame.pitch_rad.is_finite()
            && frame.latency_s.is_finite())
        {
            return Err(VisionError::NonFinite);
        }

        if frame.latency_s < 0.0 || frame.latency_s > self.params.max_latency_s {
            return Err(VisionError::BadLatency(frame.latency_s));
        }

        Ok(())
    }

    /// Position of the goal in the camera frame.
    pub fn camera_to_goal(&self, frame: &VisionFrame) -> Result<Transform2, VisionError> {
        self.validate(frame)?;

        let distance_m = self.ground_distance_m(frame.pitch_rad)?;

        Ok(Transform2::new(
            distance_m * frame.bearing_rad.cos(),
            distance_m * frame.bearing_rad.sin(),
            0.0
        ))
    }

    /// Build the field relative goal sample seen in this frame.
    pub fn goal_sample(&mut self, frame: &VisionFrame) -> Result<GoalSample, VisionError> {
        let camera_to_goal = self.camera_to_goal(frame)?;

        let time_s = self.clock.now_s() - frame.latency_s;

        let robot_pose = self.odom_history
            .get(time_s)
            .ok_or(VisionError::NoOdomHistory)?;
        let turret_angle_rad = self.turret_history
            .get(time_s)
            .ok_or(VisionError::NoTurretHistory)?;

        let pose = self.camera_pose(&robot_pose, turret_angle_rad)
            .transform_by(&camera_to_goal);

        trace!(
            "Goal sample at {:.3} s: {:?} (turret {:.2} deg)",
            time_s, pose.position_m, turret_angle_rad.to_degrees()
        );

        Ok(GoalSample {
            time_s,
            pose,
            camera_to_goal,
            turret_angle_rad,
        })
    }

    /// Estimate the robot pose from the goal's known location.
    ///
    /// The translation comes from the camera, the heading is taken from
    /// `robot_heading_rad` as the gyro is much better at it.
    pub fn estimate_robot_pose(
        &self,
        camera_to_goal: &Transform2,
        turret_angle_rad: f64,
        robot_heading_rad: f64
    ) -> Pose2 {
        // Goal position in the robot frame
        let robot_to_goal_m = self
            .camera_pose(&Pose2::default(), turret_angle_rad)
            .transform_by(camera_to_goal)
            .position_m;

        let goal_m = self.params.goal_pose().position_m;
        let robot_m = goal_m - Rotation2::new(robot_heading_rad) * robot_to_goal_m;

        Pose2::new(robot_m.x, robot_m.y, robot_heading_rad)
    }

    /// Predict where the robot will be `ahead_s` from now.
    ///
    /// The robot is assumed to keep the velocity it had over the last
    /// `window_s` of odometry history. Without enough history the current
    /// pose is returned.
    pub fn predict_robot_pose(
        &mut self,
        robot_pose: &Pose2,
        ahead_s: f64,
        window_s: f64
    ) -> Pose2 {
        if ahead_s <= 0.0 || window_s <= 0.0 {
            return *robot_pose;
        }

        let then = match self.odom_history.get(self.clock.now_s() - window_s) {
            Some(p) => p,
            None => return *robot_pose,
        };

        let scale = ahead_s / window_s;
        let delta_m = (robot_pose.position_m - then.position_m) * scale;
        let delta_rad = wrap_pi(robot_pose.heading_rad - then.heading_rad) * scale;

        Pose2::new(
            robot_pose.position_m.x + delta_m.x,
            robot_pose.position_m.y + delta_m.y,
            robot_pose.heading_rad + delta_rad
        )
    }

    /// Field pose of the turret's axis for a given robot pose.
    pub fn turret_pose(&self, robot_pose: &Pose2) -> Pose2 {
        robot_pose.transform_by(&self.params.robot_to_turret())
    }

    pub fn params(&self) -> &VisionParams {
        &self.params
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.odom_history.clear();
        self.turret_history.clear();
    }

    fn camera_pose(&self, robot_pose: &Pose2, turret_angle_rad: f64) -> Pose2 {
        self.params.camera_pose(robot_pose, turret_angle_rad)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use util::time::ManualClock;

    fn params() -> VisionParams {
        util::params::parse(include_str!("../../../params/vision.toml")).unwrap()
    }

    /// Build the frame a perfect camera would report.
    fn frame_for(
        vp: &VisionProc<ManualClock>,
        robot: &Pose2,
        turret_angle_rad: f64,
        goal: &Pose2,
        latency_s: f64
    ) -> VisionFrame {
        let cam = vp.camera_pose(robot, turret_angle_rad);
        let rel = goal.relative_to(&cam);
        let distance_m = rel.position_m.norm();
        let p = vp.params();

        VisionFrame {
            valid: true,
            bearing_rad: rel.position_m.y.atan2(rel.position_m.x),
            pitch_rad: ((p.goal_height_m - p.camera_height_m) / distance_m).atan()
                - p.camera_mount_angle_deg.to_radians(),
            latency_s,
        }
    }

    #[test]
    fn test_ground_distance() {
        let vp = VisionProc::new(params(), ManualClock::new(0.0));
        let p = vp.params().clone();

        // Looking straight along the mount angle
        let d = vp.ground_distance_m(0.0).unwrap();
        assert_relative_eq!(
            d,
            (p.goal_height_m - p.camera_height_m)
                / p.camera_mount_angle_deg.to_radians().tan(),
            epsilon = 1e-12
        );

        // Pointing below the horizon can't see a goal above the camera
        assert!(matches!(
            vp.ground_distance_m(-p.camera_mount_angle_deg.to_radians() - 0.1),
            Err(VisionError::BadDistance(_))
        ));
    }

    #[test]
    fn test_validate() {
        let vp = VisionProc::new(params(), ManualClock::new(0.0));
        let good = VisionFrame {
            valid: true,
            bearing_rad: 0.1,
            pitch_rad: 0.05,
            latency_s: 0.03,
        };

        assert!(vp.validate(&good).is_ok());
        assert_eq!(
            vp.validate(&VisionFrame { valid: false, ..good }),
            Err(VisionError::NoTarget)
        );
        assert_eq!(
            vp.validate(&VisionFrame { bearing_rad: f64::NAN, ..good }),
            Err(VisionError::NonFinite)
        );
        assert_eq!(
            vp.validate(&VisionFrame { latency_s: -0.1, ..good }),
            Err(VisionError::BadLatency(-0.1))
        );

        // Older than the 0.5 s limit
        assert_eq!(
            vp.validate(&VisionFrame { latency_s: 0.6, ..good }),
            Err(VisionError::BadLatency(0.6))
        );
        assert!(vp.validate(&VisionFrame { latency_s: 0.5, ..good }).is_ok());
    }

    #[test]
    fn test_goal_sample_uses_capture_time() {
        let clock = ManualClock::new(0.0);
        let mut vp = VisionProc::new(params(), clock.clone());

        let goal = Pose2::new(6.0, 2.0, 0.0);

        // Robot rotating in place, turret sweeping
        for i in 0..=10 {
            clock.set(i as f64 * 0.02);
            let heading = 0.5 * clock_s(&clock);
            vp.record(Some(Pose2::new(1.0, 0.5, heading)), Some(-heading));
        }

        // The image was captured 0.1 s ago, when the robot and turret were
        // in a different place to now
        let capture_s = clock_s(&clock) - 0.1;
        let robot_then = Pose2::new(1.0, 0.5, 0.5 * capture_s);
        let frame = frame_for(&vp, &robot_then, -0.5 * capture_s, &goal, 0.1);

        let sample = vp.goal_sample(&frame).unwrap();
        assert_relative_eq!(sample.time_s, capture_s, epsilon = 1e-12);
        assert_relative_eq!(sample.pose.position_m.x, 6.0, epsilon = 1e-6);
        assert_relative_eq!(sample.pose.position_m.y, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_goal_sample_without_history() {
        let mut vp = VisionProc::new(params(), ManualClock::new(1.0));
        let frame = VisionFrame {
            valid: true,
            bearing_rad: 0.0,
            pitch_rad: 0.0,
            latency_s: 0.02,
        };

        assert_eq!(vp.goal_sample(&frame), Err(VisionError::NoOdomHistory));

        vp.record(Some(Pose2::default()), None);
        assert_eq!(vp.goal_sample(&frame), Err(VisionError::NoTurretHistory));
    }

    #[test]
    fn test_estimate_robot_pose() {
        let vp = VisionProc::new(params(), ManualClock::new(0.0));
        let goal = vp.params().goal_pose();
        let robot = Pose2::new(goal.position_m.x - 5.0, goal.position_m.y + 1.0, 0.3);

        let frame = frame_for(&vp, &robot, 0.2, &goal, 0.0);
        let c2g = vp.camera_to_goal(&frame).unwrap();

        let est = vp.estimate_robot_pose(&c2g, 0.2, 0.3);
        assert_relative_eq!(est.position_m.x, robot.position_m.x, epsilon = 1e-6);
        assert_relative_eq!(est.position_m.y, robot.position_m.y, epsilon = 1e-6);
        assert_relative_eq!(est.heading_rad, 0.3);
    }

    #[test]
    fn test_predict_robot_pose() {
        let clock = ManualClock::new(0.0);
        let mut vp = VisionProc::new(params(), clock.clone());

        // No history yet
        let here = Pose2::new(1.0, 2.0, 0.0);
        assert_eq!(vp.predict_robot_pose(&here, 0.25, 0.1), here);

        // Driving at 2 m/s along +X while turning at 1 rad/s
        for i in 0..=10 {
            clock.set(i as f64 * 0.02);
            let t = clock_s(&clock);
            vp.record(Some(Pose2::new(2.0 * t, 0.0, t)), None);
        }

        let now = Pose2::new(0.4, 0.0, 0.2);
        let predicted = vp.predict_robot_pose(&now, 0.25, 0.1);
        assert_relative_eq!(predicted.position_m.x, 0.9, epsilon = 1e-9);
        assert_relative_eq!(predicted.position_m.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(predicted.heading_rad, 0.45, epsilon = 1e-9);

        // Standing still predicts no motion
        for i in 11..=20 {
            clock.set(i as f64 * 0.02);
            vp.record(Some(now), None);
        }
        let predicted = vp.predict_robot_pose(&now, 0.25, 0.1);
        assert_relative_eq!(predicted.position_m.x, now.position_m.x, epsilon = 1e-12);
        assert_relative_eq!(predicted.heading_rad, now.heading_rad, epsilon = 1e-12);
    }

    fn clock_s(clock: &ManualClock) -> f64 {
        clock.now_s()
    }
}
