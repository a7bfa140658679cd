//! # Communications interface crate.
//!
//! Provides all common interface types for the turret software: the
//! telecommands accepted by the executable and the data exchanged with the
//! turret's equipment (actuators, vision camera, odometry).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Demand and sensor data definitions for equipment
pub mod eqpt;
