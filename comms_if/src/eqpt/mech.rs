//! # Mechanisms Equipment Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands sent to the turret mechanisms each cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MechDems {
    pub turret: ActDem,
    pub shooter: ActDem,
    pub hood: ActDem,
}

/// Sensor data read back from a single actuator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct ActSensData {
    /// Position of the actuator output in radians, relative to its zero.
    pub pos_rad: f64,

    /// Speed of the actuator output in radians/second.
    pub speed_rads: f64,

    /// Applied voltage in volts.
    pub voltage_v: f64,

    /// Supply current in amps.
    pub current_a: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A single demand for an actuator.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum ActDem {
    /// Output disabled, the actuator coasts or brakes as configured
    Neutral,

    /// Open loop output in the range `[-1, 1]`
    Percent(f64),

    /// Closed loop position in radians
    Position(f64),

    /// Closed loop velocity in radians/second
    Velocity(f64),
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl Default for ActDem {
    fn default() -> Self {
        ActDem::Neutral
    }
}

impl Default for MechDems {
    fn default() -> Self {
        Self {
            turret: ActDem::Neutral,
            shooter: ActDem::Neutral,
            hood: ActDem::Neutral,
        }
    }
}
