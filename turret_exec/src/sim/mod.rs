//! # Simulated field
//!
//! A stand in for the robot's hardware so the executable can run on a
//! desk. The field contains a single static goal and a robot which spins at
//! a constant rate. The actuators respond to their demands with a first order
//! lag, and the camera is ideal apart from a fixed latency and a limited
//! field of view.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use std::collections::VecDeque;

// Internal
pub use params::*;
use crate::{
    eqpt::{Actuator, HomingSensor, OdomSource, VisionSource},
    loc::Pose2,
    vision_proc::VisionParams,
};
use comms_if::eqpt::{
    cam::VisionFrame,
    mech::{ActDem, ActSensData},
    odom::OdomData,
};
use util::{maths::wrap_pi, time::Clock};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Supply voltage used to estimate actuator voltage.
const SUPPLY_VOLTAGE_V: f64 = 12.0;

/// Slack on frame release times so cycle aligned frames aren't held back an
/// extra cycle by round-off.
const FRAME_TIME_EPSILON_S: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An actuator whose closed loop is modelled as a first order lag.
#[derive(Debug, Clone)]
pub struct SimActuator {
    tau_s: f64,
    max_speed_rads: f64,

    /// True mechanism position
    pos_rad: f64,
    speed_rads: f64,

    /// Difference between the encoder reading and the true position
    offset_rad: f64,

    dem: ActDem,
}

/// The simulated field, robot and equipment.
pub struct SimField<C> {
    params: SimParams,
    vision: VisionParams,
    clock: C,

    start_s: f64,
    last_step_s: f64,

    robot: Pose2,

    pub turret: SimActuator,
    pub shooter: SimActuator,
    pub hood: SimActuator,

    /// Captured frames waiting out the camera latency, with their capture
    /// times
    pending_frames: VecDeque<(f64, VisionFrame)>,

    /// The frame currently reported by the camera
    frame: VisionFrame,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimActuator {
    /// Create an actuator with an absolute encoder at `pos_rad`.
    pub fn new(tau_s: f64, max_speed_rads: f64, pos_rad: f64) -> Self {
        Self {
            tau_s,
            max_speed_rads,
            pos_rad,
            speed_rads: 0.0,
            offset_rad: 0.0,
            dem: ActDem::Neutral,
        }
    }

    /// Make the encoder read zero at the current position, as a relative
    /// encoder does at power up.
    pub fn relative_encoder(mut self) -> Self {
        self.offset_rad = -self.pos_rad;
        self
    }

    pub fn true_pos_rad(&self) -> f64 {
        self.pos_rad
    }

    /// Advance the actuator by `dt_s` seconds.
    pub fn step(&mut self, dt_s: f64) {
        if dt_s <= 0.0 {
            return;
        }

        let alpha = if self.tau_s > 0.0 {
            1.0 - (-dt_s / self.tau_s).exp()
        }
        else {
            1.0
        };

        let target_speed_rads = match self.dem {
            ActDem::Position(p) => {
                let target_rad = p - self.offset_rad;
                let new_pos_rad = self.pos_rad + (target_rad - self.pos_rad) * alpha;
                self.speed_rads = (new_pos_rad - self.pos_rad) / dt_s;
                self.pos_rad = new_pos_rad;
                return;
            },
            ActDem::Velocity(v) => v,
            ActDem::Percent(p) => p.max(-1.0).min(1.0) * self.max_speed_rads,
            ActDem::Neutral => 0.0,
        };

        self.speed_rads += (target_speed_rads - self.speed_rads) * alpha;
        self.pos_rad += self.speed_rads * dt_s;
    }
}

impl Actuator for SimActuator {
    fn set_angle(&mut self, angle_rad: f64) {
        self.dem = ActDem::Position(angle_rad);
    }

    fn set_velocity(&mut self, speed_rads: f64) {
        self.dem = ActDem::Velocity(speed_rads);
    }

    fn set_percent(&mut self, percent: f64) {
        self.dem = ActDem::Percent(percent);
    }

    fn set_neutral(&mut self) {
        self.dem = ActDem::Neutral;
    }

    fn reset_position(&mut self, pos_rad: f64) {
        self.offset_rad = pos_rad - self.pos_rad;
    }

    fn sens_data(&self) -> ActSensData {
        let duty = if self.max_speed_rads > 0.0 {
            (self.speed_rads / self.max_speed_rads).max(-1.0).min(1.0)
        }
        else {
            0.0
        };

        ActSensData {
            pos_rad: self.pos_rad + self.offset_rad,
            speed_rads: self.speed_rads,
            voltage_v: duty * SUPPLY_VOLTAGE_V,
            current_a: 0.0,
        }
    }
}

impl<C: Clock> SimField<C> {
    pub fn new(params: SimParams, vision: VisionParams, clock: C) -> Self {
        let now_s = clock.now_s();

        Self {
            robot: params.robot_start_pose(),
            turret: SimActuator::new(
                params.turret_tau_s,
                params.max_speed_rads,
                params.turret_start_deg.to_radians()
            ).relative_encoder(),
            shooter: SimActuator::new(params.shooter_tau_s, params.max_speed_rads, 0.0),
            hood: SimActuator::new(
                params.hood_tau_s,
                params.max_speed_rads,
                params.hood_start_deg.to_radians()
            ),
            pending_frames: VecDeque::new(),
            frame: VisionFrame::default(),
            start_s: now_s,
            last_step_s: now_s,
            params,
            vision,
            clock,
        }
    }

    /// Advance the simulation to the clock's current time.
    pub fn step(&mut self) {
        let now_s = self.clock.now_s();
        let dt_s = now_s - self.last_step_s;

        if dt_s <= 0.0 {
            return;
        }
        self.last_step_s = now_s;

        self.robot = Pose2 {
            heading_rad: wrap_pi(
                self.robot.heading_rad + self.params.robot_yaw_rate_degs.to_radians() * dt_s
            ),
            ..self.robot
        };

        self.turret.step(dt_s);
        self.shooter.step(dt_s);
        self.hood.step(dt_s);

        self.pending_frames.push_back((now_s, self.capture()));

        let latency_s = self.params.camera_latency_s;
        while let Some((capture_s, _)) = self.pending_frames.front() {
            if capture_s + latency_s > now_s + FRAME_TIME_EPSILON_S {
                break;
            }

            if let Some((_, frame)) = self.pending_frames.pop_front() {
                self.frame = frame;
            }
        }

        trace!("Sim robot {:?}, camera {:?}", self.robot, self.frame);
    }

    pub fn robot_pose(&self) -> Pose2 {
        self.robot
    }

    /// The frame an ideal camera sees right now.
    fn capture(&self) -> VisionFrame {
        let camera = self.vision.camera_pose(&self.robot, self.turret.true_pos_rad());
        let rel = self.vision.goal_pose().relative_to(&camera);

        let distance_m = rel.position_m.norm();
        let bearing_rad = rel.position_m.y.atan2(rel.position_m.x);
        let pitch_rad = ((self.vision.goal_height_m - self.vision.camera_height_m) / distance_m)
            .atan()
            - self.vision.camera_mount_angle_deg.to_radians();

        let valid = distance_m > 0.0
            && bearing_rad.abs() <= 0.5 * self.params.camera_hfov_deg.to_radians()
            && pitch_rad.abs() <= 0.5 * self.params.camera_vfov_deg.to_radians();

        if valid {
            VisionFrame {
                valid,
                bearing_rad,
                pitch_rad,
                latency_s: self.params.camera_latency_s,
            }
        }
        else {
            VisionFrame::default()
        }
    }
}

impl<C> OdomSource for SimField<C> {
    fn odom(&self) -> Option<OdomData> {
        Some(OdomData {
            x_m: self.robot.position_m.x,
            y_m: self.robot.position_m.y,
            heading_rad: self.robot.heading_rad,
        })
    }
}

impl<C> VisionSource for SimField<C> {
    fn is_valid(&self) -> bool {
        self.frame.valid
    }

    fn bearing_rad(&self) -> f64 {
        self.frame.bearing_rad
    }

    fn pitch_rad(&self) -> f64 {
        self.frame.pitch_rad
    }

    fn latency_s(&self) -> f64 {
        self.frame.latency_s
    }
}

impl<C: Clock> HomingSensor for SimField<C> {
    fn is_engaged(&self) -> bool {
        self.clock.now_s() - self.start_s < self.params.homing_engaged_s
    }
}
