//! # Interpolating time-series buffer
//!
//! Stores timestamped samples over a bounded history span and answers queries
//! for arbitrary times by linear interpolation between the neighbouring
//! samples. Used to look up where a mechanism (or the robot) was at the moment
//! a delayed measurement was taken.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use ordered_float::OrderedFloat;

use crate::time::Clock;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A value which can be linearly interpolated towards another value.
pub trait Interpolate: Sized {
    /// Return the value `frac` of the way from `self` to `other`.
    ///
    /// `frac` is expected to be in `[0, 1]`.
    fn interpolate(&self, other: &Self, frac: f64) -> Self;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A time-indexed buffer of samples with linear interpolation.
///
/// Every mutation and every read first evicts samples older than the history
/// span, measured against the buffer's clock.
#[derive(Debug, Clone)]
pub struct InterpBuffer<V, C> {
    history_span_s: f64,
    clock: C,
    samples: BTreeMap<OrderedFloat<f64>, V>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Interpolate for f64 {
    fn interpolate(&self, other: &Self, frac: f64) -> Self {
        self + (other - self) * frac
    }
}

impl<V, C> InterpBuffer<V, C>
where
    V: Interpolate + Clone,
    C: Clock,
{
    /// Create a new empty buffer keeping `history_span_s` seconds of samples.
    pub fn new(history_span_s: f64, clock: C) -> Self {
        Self {
            history_span_s,
            clock,
            samples: BTreeMap::new(),
        }
    }

    /// Insert a sample, returning the sample previously stored at the same
    /// timestamp if there was one.
    pub fn set(&mut self, time_s: f64, value: V) -> Option<V> {
        self.clean();

        self.samples.insert(OrderedFloat(time_s), value)
    }

    /// Get the value at the given time.
    ///
    /// Returns the exact sample if one exists, otherwise interpolates between
    /// the samples either side. If the time lies outside the stored samples
    /// the nearest sample is returned. `None` is only returned if the buffer
    /// is empty.
    pub fn get(&mut self, time_s: f64) -> Option<V> {
        self.clean();

        let key = OrderedFloat(time_s);

        if let Some(v) = self.samples.get(&key) {
            return Some(v.clone());
        }

        let bottom = self.samples.range(..key).next_back();
        let top = self.samples.range((Excluded(key), Unbounded)).next();

        match (bottom, top) {
            (Some((bt, bv)), Some((tt, tv))) => {
                let frac = (time_s - bt.0) / (tt.0 - bt.0);
                Some(bv.interpolate(tv, frac))
            }
            (Some((_, bv)), None) => Some(bv.clone()),
            (None, Some((_, tv))) => Some(tv.clone()),
            (None, None) => None,
        }
    }

    /// Get the most recent sample, if any.
    pub fn latest(&mut self) -> Option<(f64, V)> {
        self.clean();

        self.samples
            .iter()
            .next_back()
            .map(|(t, v)| (t.0, v.clone()))
    }

    /// Remove all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The history span in seconds.
    pub fn history_span_s(&self) -> f64 {
        self.history_span_s
    }

    /// Evict samples older than the history span, oldest first.
    fn clean(&mut self) {
        let now_s = self.clock.now_s();

        while let Some(oldest) = self.samples.keys().next().copied() {
            if now_s - oldest.0 >= self.history_span_s {
                self.samples.remove(&oldest);
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::time::ManualClock;
    use approx::assert_relative_eq;

    fn deg(d: f64) -> f64 {
        d.to_radians()
    }

    #[test]
    fn test_exact_interpolant() {
        let mut buffer = InterpBuffer::new(2.0, ManualClock::new(2.0));
        buffer.set(0.5, deg(7.0));
        buffer.set(1.5, deg(9.0));

        assert_relative_eq!(buffer.get(0.5).unwrap(), deg(7.0));
        assert_relative_eq!(buffer.get(1.5).unwrap(), deg(9.0));
    }

    #[test]
    fn test_interpolation() {
        let mut buffer = InterpBuffer::new(2.0, ManualClock::new(2.0));
        buffer.set(0.5, deg(7.0));
        buffer.set(1.5, deg(11.0));

        assert_relative_eq!(buffer.get(1.0).unwrap(), deg(9.0), epsilon = 1e-12);
        assert_relative_eq!(buffer.get(0.75).unwrap(), deg(8.0), epsilon = 1e-12);
        assert_relative_eq!(buffer.get(1.25).unwrap(), deg(10.0), epsilon = 1e-12);
    }

    #[test]
    fn test_one_sided_and_empty() {
        let mut buffer: InterpBuffer<f64, _> = InterpBuffer::new(2.0, ManualClock::new(2.0));
        assert!(buffer.get(1.0).is_none());

        buffer.set(1.0, 3.0);
        buffer.set(1.5, 4.0);

        // Before the first sample and after the last sample
        assert_eq!(buffer.get(0.2), Some(3.0));
        assert_eq!(buffer.get(1.9), Some(4.0));
    }

    #[test]
    fn test_overwrite_returns_previous() {
        let mut buffer = InterpBuffer::new(2.0, ManualClock::new(1.0));
        assert_eq!(buffer.set(0.5, 1.0), None);
        assert_eq!(buffer.set(0.5, 2.0), Some(1.0));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.get(0.5), Some(2.0));
    }

    #[test]
    fn test_eviction() {
        let clock = ManualClock::new(1.0);
        let mut buffer = InterpBuffer::new(1.0, clock.clone());

        buffer.set(0.25, 1.0);
        buffer.set(0.5, 2.0);
        buffer.set(0.75, 3.0);
        assert_eq!(buffer.len(), 3);

        // The oldest sample is now exactly one span old and must go, the
        // newer ones must stay.
        clock.set(1.25);
        assert_eq!(buffer.get(0.5), Some(2.0));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.latest(), Some((0.75, 3.0)));

        clock.set(5.0);
        assert_eq!(buffer.get(0.75), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut buffer = InterpBuffer::new(1.0, ManualClock::new(0.0));
        buffer.set(0.0, 1.0);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.get(0.0), None);
    }
}
