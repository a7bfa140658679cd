//! Interpolating calibration table

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Serialize;

// Internal
use super::{BallisticsError, BallisticsParams, CalEntry};
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An immutable, validated calibration table.
#[derive(Debug, Clone)]
pub struct BallisticTable {
    /// Entries sorted by strictly increasing distance, never empty.
    entries: Vec<TableEntry>,
}

/// Shooter setpoints for a particular distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ShotParams {
    /// Units: radians/second
    pub shooter_speed_rads: f64,

    /// Units: radians
    pub hood_angle_rad: f64,
}

#[derive(Debug, Clone, Copy)]
struct TableEntry {
    distance_m: f64,
    shot: ShotParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl BallisticTable {
    /// Build a table from a list of entries.
    ///
    /// The entries must be sorted by strictly increasing distance and contain
    /// only finite values.
    pub fn new(entries: Vec<CalEntry>) -> Result<Self, BallisticsError> {
        if entries.is_empty() {
            return Err(BallisticsError::EmptyTable);
        }

        let mut table = Vec::with_capacity(entries.len());

        for (i, e) in entries.iter().enumerate() {
            if !(e.distance_m.is_finite()
                && e.shooter_speed_rads.is_finite()
                && e.hood_angle_deg.is_finite())
            {
                return Err(BallisticsError::NonFiniteEntry(i));
            }

            if i > 0 && e.distance_m <= entries[i - 1].distance_m {
                return Err(BallisticsError::NotIncreasing(i, e.distance_m));
            }

            table.push(TableEntry {
                distance_m: e.distance_m,
                shot: ShotParams {
                    shooter_speed_rads: e.shooter_speed_rads,
                    hood_angle_rad: e.hood_angle_deg.to_radians(),
                },
            });
        }

        debug!(
            "Ballistic table built with {} entries covering {:.2} to {:.2} m",
            table.len(),
            entries[0].distance_m,
            entries[entries.len() - 1].distance_m
        );

        Ok(Self { entries: table })
    }

    /// Load and build the table from a parameter file.
    pub fn load(params_path: &str) -> Result<Self, BallisticsError> {
        let params: BallisticsParams = util::params::load(params_path)
            .map_err(BallisticsError::ParamLoadError)?;

        Self::new(params.entries)
    }

    /// Get the shot parameters for the given distance.
    ///
    /// Distances outside the table return the nearest end entry, distances
    /// between entries interpolate speed and angle independently. A
    /// non-finite distance returns the first entry.
    pub fn lookup(&self, distance_m: f64) -> ShotParams {
        let first = &self.entries[0];
        let last = &self.entries[self.entries.len() - 1];

        if !distance_m.is_finite() {
            debug!("Non-finite ballistic lookup distance, using the first entry");
            return first.shot;
        }

        if distance_m <= first.distance_m {
            return first.shot;
        }
        if distance_m >= last.distance_m {
            return last.shot;
        }

        // Index of the first entry beyond the distance, which can't be the
        // first entry given the checks above.
        let upper = self.entries
            .iter()
            .position(|e| e.distance_m >= distance_m)
            .unwrap_or(self.entries.len() - 1);

        let top = &self.entries[upper];
        if top.distance_m == distance_m {
            return top.shot;
        }

        let bottom = &self.entries[upper - 1];
        let span = (bottom.distance_m, top.distance_m);

        ShotParams {
            shooter_speed_rads: lin_map(
                span,
                (bottom.shot.shooter_speed_rads, top.shot.shooter_speed_rads),
                distance_m
            ),
            hood_angle_rad: lin_map(
                span,
                (bottom.shot.hood_angle_rad, top.shot.hood_angle_rad),
                distance_m
            ),
        }
    }

    /// Shortest distance in the table.
    pub fn min_distance_m(&self) -> f64 {
        self.entries[0].distance_m
    }

    /// Longest distance in the table.
    pub fn max_distance_m(&self) -> f64 {
        self.entries[self.entries.len() - 1].distance_m
    }

    /// Number of entries in the table, always at least one.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
