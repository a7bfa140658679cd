//! # Equipment interfaces
//!
//! Traits describing the hardware the aim controller talks to. The actuators
//! are assumed to run their own closed loop, the controller only issues
//! setpoints.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{
    cam::VisionFrame,
    mech::{ActDem, ActSensData},
    odom::OdomData,
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A motor controller with an internal position and velocity loop.
pub trait Actuator {
    /// Units: radians
    fn set_angle(&mut self, angle_rad: f64);

    /// Units: radians/second
    fn set_velocity(&mut self, speed_rads: f64);

    /// Open loop output in `[-1, 1]`.
    fn set_percent(&mut self, percent: f64);

    fn set_neutral(&mut self);

    /// Overwrite the encoder so that it currently reads `pos_rad`.
    fn reset_position(&mut self, pos_rad: f64);

    fn sens_data(&self) -> ActSensData;
}

/// Source of the robot's field pose.
pub trait OdomSource {
    /// Current pose, `None` if the estimate is unavailable.
    fn odom(&self) -> Option<OdomData>;
}

/// The goal vision camera.
pub trait VisionSource {
    fn is_valid(&self) -> bool;

    /// Units: radians
    fn bearing_rad(&self) -> f64;

    /// Units: radians
    fn pitch_rad(&self) -> f64;

    /// Units: seconds
    fn latency_s(&self) -> f64;

    /// Snapshot of the latest results.
    fn frame(&self) -> VisionFrame {
        VisionFrame {
            valid: self.is_valid(),
            bearing_rad: self.bearing_rad(),
            pitch_rad: self.pitch_rad(),
            latency_s: self.latency_s(),
        }
    }
}

/// The turret's homing switch.
pub trait HomingSensor {
    fn is_engaged(&self) -> bool;
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Send a demand to an actuator.
pub fn apply_dem(act: &mut dyn Actuator, dem: ActDem) {
    match dem {
        ActDem::Neutral => act.set_neutral(),
        ActDem::Percent(p) => act.set_percent(p),
        ActDem::Position(p) => act.set_angle(p),
        ActDem::Velocity(v) => act.set_velocity(v),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        last: Option<ActDem>,
        offset_rad: f64,
    }

    impl Actuator for Recorder {
        fn set_angle(&mut self, angle_rad: f64) {
            self.last = Some(ActDem::Position(angle_rad));
        }

        fn set_velocity(&mut self, speed_rads: f64) {
            self.last = Some(ActDem::Velocity(speed_rads));
        }

        fn set_percent(&mut self, percent: f64) {
            self.last = Some(ActDem::Percent(percent));
        }

        fn set_neutral(&mut self) {
            self.last = Some(ActDem::Neutral);
        }

        fn reset_position(&mut self, pos_rad: f64) {
            self.offset_rad = pos_rad;
        }

        fn sens_data(&self) -> ActSensData {
            ActSensData {
                pos_rad: self.offset_rad,
                ..Default::default()
            }
        }
    }

    struct Cam;

    impl VisionSource for Cam {
        fn is_valid(&self) -> bool { true }
        fn bearing_rad(&self) -> f64 { 0.1 }
        fn pitch_rad(&self) -> f64 { -0.2 }
        fn latency_s(&self) -> f64 { 0.03 }
    }

    #[test]
    fn test_apply_dem() {
        let mut act = Recorder::default();

        for dem in [
            ActDem::Position(1.5),
            ActDem::Velocity(-3.0),
            ActDem::Percent(0.25),
            ActDem::Neutral,
        ].iter() {
            apply_dem(&mut act, *dem);
            assert_eq!(act.last, Some(*dem));
        }

        act.reset_position(0.7);
        assert_eq!(act.sens_data().pos_rad, 0.7);
    }

    #[test]
    fn test_vision_frame() {
        assert_eq!(
            Cam.frame(),
            VisionFrame {
                valid: true,
                bearing_rad: 0.1,
                pitch_rad: -0.2,
                latency_s: 0.03,
            }
        );
    }
}
