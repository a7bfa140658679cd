//! # Turret library.
//!
//! This library allows other crates in the workspace to access items defined inside the turret
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Aim control module - points the turret at the goal and sets the shooter and hood
pub mod aim_ctrl;

/// Ballistics module - maps goal distance onto shooter speed and hood angle
pub mod ballistics;

/// Global data store for the executable
pub mod data_store;

/// Equipment interfaces - traits for the actuators and sensors
pub mod eqpt;

/// Goal tracker - keeps a smoothed estimate of each goal seen by the camera
pub mod goal_tracker;

/// Localisation - planar poses and transforms
pub mod loc;

/// Simulation - simulated field and equipment for running without hardware
pub mod sim;

/// Turret planner - resolves turret angles against the turret's range
pub mod turret_planner;

/// Vision processing - turns camera results into field relative goal samples
pub mod vision_proc;
