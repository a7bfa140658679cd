//! Parameters structure for AimCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::turret_planner::AngleRange;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for aim control.
#[derive(Debug, Clone, Deserialize)]
pub struct AimCtrlParams {

    // ---- CAPABILITIES ----

    /// Mechanism angles the turret can reach, written in degrees.
    pub turret_range: AngleRange,

    /// Angles the hood can reach, written in degrees.
    pub hood_range: AngleRange,

    /// Mechanism angle the turret is parked at in stow mode.
    ///
    /// Units: degrees
    pub turret_stow_angle_deg: f64,

    // ---- AIMING ----

    /// The robot pose used for aiming is predicted this far ahead to cover
    /// the time the turret takes to align.
    ///
    /// Units: seconds
    pub align_delay_s: f64,

    /// Span of odometry history the robot velocity is measured over for the
    /// prediction.
    ///
    /// Units: seconds
    pub velocity_window_s: f64,

    /// Distance from the outer goal to the inner goal behind it, along the
    /// goal's facing direction. Ballistics use the distance to the inner
    /// goal while the turret points at the outer one.
    ///
    /// Units: meters
    pub outer_to_inner_goal_m: f64,

    // ---- ZEROING ----

    /// Time the homing sensor must be continuously engaged before the
    /// turret is considered zeroed.
    ///
    /// Units: seconds
    pub zero_debounce_s: f64,

    /// Mechanism angle of the turret when the homing sensor is engaged.
    ///
    /// Units: degrees
    pub turret_zero_location_deg: f64,

    // ---- LATENCY COMPENSATION ----

    /// Amount of desired field angle history kept.
    ///
    /// Units: seconds
    pub field_angle_history_span_s: f64,

    /// A valid vision frame older than this no longer triggers latency
    /// compensation.
    ///
    /// Units: seconds
    pub latency_comp_max_age_s: f64,

    // ---- SETTLING ----

    /// Units: degrees
    pub settle_turret_tol_deg: f64,

    /// Units: radians/second
    pub settle_shooter_tol_rads: f64,

    /// Units: degrees
    pub settle_hood_tol_deg: f64,

    /// Time all errors must stay inside tolerance for the aim to be settled.
    ///
    /// Units: seconds
    pub settle_time_s: f64,
}
