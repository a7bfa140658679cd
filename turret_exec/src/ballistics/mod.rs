//! # Ballistics module
//!
//! Maps the distance to the goal onto the shooter flywheel speed and hood
//! angle needed to score from that distance. The mapping is an empirical
//! calibration table, built from test firing, which is linearly interpolated
//! between entries.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod table;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use table::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised while building a [`BallisticTable`].
///
/// All of these are configuration errors and should stop the executable from
/// starting.
#[derive(Debug, thiserror::Error)]
pub enum BallisticsError {
    #[error("Could not load the calibration table: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("The calibration table contains no entries")]
    EmptyTable,

    #[error("Calibration entry {0} contains a non-finite value")]
    NonFiniteEntry(usize),

    #[error(
        "Calibration entry {0} is at {1} m which is not greater than the \
        previous entry's distance, entries must be strictly increasing")]
    NotIncreasing(usize, f64),
}
