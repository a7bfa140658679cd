//! Goal tracker parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the goal tracker.
#[derive(Debug, Clone, Deserialize)]
pub struct GoalTrackerParams {
    /// Samples older than this are forgotten, and a target with no samples
    /// left is evicted.
    ///
    /// Units: seconds
    pub max_target_lifetime_s: f64,

    /// A new sample further than this from every tracked target starts a new
    /// target.
    ///
    /// Units: meters
    pub distance_tolerance_m: f64,

    /// Number of most recent samples the smoothed pose is computed from.
    pub median_window_size: usize,

    /// Expected frame rate of the vision camera, used to compute how stable
    /// a target's track is.
    ///
    /// Units: frames/second
    pub camera_fps: f64,
}
