//! # Aim control module
//!
//! Aim control points the turret at the goal and sets the shooter and hood
//! for the goal's distance. It combines odometry, the goal tracker, the
//! ballistic table and the turret planner into actuator demands every cycle.
//!
//! The controller is gated by the turret's zeroing state: until the turret
//! has been zeroed every demand is neutral. Once zeroed it runs in one of
//! the following modes:
//!
//! - `Off` - All actuators neutral.
//! - `Track` - Track the closest goal, setting shooter speed and hood angle
//!   from the ballistic table.
//! - `FieldRelative` - Hold a field relative turret angle while the robot
//!   rotates underneath it.
//! - `Hold` - Hold the last demands.
//! - `Stow` - Park the turret and lower the hood.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod settle;
mod state;
mod zero;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use params::*;
pub use settle::*;
pub use state::*;
pub use zero::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during AimCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum AimCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid ballistic table: {0}")]
    BallisticsError(#[from] crate::ballistics::BallisticsError),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] util::archive::ArchiveError),
}

/// Operating mode of the aim controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AimMode {
    Off,
    Track,
    FieldRelative {
        /// Units: radians
        angle_rad: f64
    },
    Hold,
    Stow,
}

impl AimMode {
    pub fn name(&self) -> &'static str {
        match self {
            AimMode::Off => "Off",
            AimMode::Track => "Track",
            AimMode::FieldRelative { .. } => "FieldRelative",
            AimMode::Hold => "Hold",
            AimMode::Stow => "Stow",
        }
    }
}

impl Default for AimMode {
    fn default() -> Self {
        AimMode::Off
    }
}
