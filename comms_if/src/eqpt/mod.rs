//! # Equipment Interface
//!
//! This module defines the structures exchanged with the turret's equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod mech;
pub mod odom;
