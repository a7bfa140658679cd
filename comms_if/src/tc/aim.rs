//! # Aim control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command for the aim controller.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum AimCmd {
    /// Start the zeroing sequence.
    ///
    /// The turret will not move under closed loop control until zeroing has
    /// completed.
    #[structopt(name = "zero")]
    Zero,

    /// Track the closest goal seen by the vision camera, spinning up the
    /// shooter and setting the hood for the goal's distance.
    #[structopt(name = "track")]
    Track,

    /// Hold a fixed angle in the field frame, compensating for the robot's
    /// rotation.
    #[structopt(name = "field")]
    FieldRelative {
        /// The field relative angle in radians.
        ///
        /// Counterclockwise positive, zero along the field's X+ axis.
        angle_rad: f64
    },

    /// Hold the last turret demand and ballistic setpoints.
    #[structopt(name = "hold")]
    Hold,

    /// Park the turret at its stow angle, stop the shooter and lower the
    /// hood.
    #[structopt(name = "stow")]
    Stow,

    /// Disable all outputs.
    #[structopt(name = "off")]
    Off,
}
