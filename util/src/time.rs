//! General time utility functions
//!
//! Anything that needs to know the current time for bookkeeping (buffer
//! eviction, target staleness, debounce windows) takes a [`Clock`] rather than
//! reading the wall clock directly, so that tests can drive time by hand.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of the current time.
pub trait Clock {
    /// Current time in seconds. Only differences between values are
    /// meaningful.
    fn now_s(&self) -> f64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Clock reading the number of seconds elapsed since the session epoch.
///
/// The session must have been created before this clock is read.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionClock;

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a single `ManualClock` can be
/// handed to several components and advanced from one place.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Clock for SessionClock {
    fn now_s(&self) -> f64 {
        crate::session::get_elapsed_seconds()
    }
}

impl ManualClock {
    /// Create a new clock reading `time_s`.
    pub fn new(time_s: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(time_s.to_bits())),
        }
    }

    /// Set the current time.
    pub fn set(&self, time_s: f64) {
        self.bits.store(time_s.to_bits(), Ordering::Relaxed);
    }

    /// Move the clock forward by `dt_s`.
    pub fn advance(&self, dt_s: f64) {
        self.set(self.now_s() + dt_s);
    }
}

impl Clock for ManualClock {
    fn now_s(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    if let Some(ns) = duration.num_nanoseconds() {
        Some(ns as f64 / NANOS_PER_SECOND as f64)
    }
    else {
        None
    }
}
