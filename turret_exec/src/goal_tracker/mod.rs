//! # Goal tracker module
//!
//! Keeps the set of goals the vision system has seen recently. Each vision
//! sample is a field relative goal pose, samples close to an existing target
//! refine that target and samples far from every target start a new one.
//! Targets which have not been seen for longer than their lifetime are
//! dropped and never come back, a later sample makes a new target.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod target;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};

// Internal
pub use params::*;
pub use target::*;
use crate::loc::Pose2;
use util::time::Clock;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The goal tracker.
///
/// The tracker is the only owner of the targets, users read them through
/// the query functions.
#[derive(Debug, Clone)]
pub struct GoalTracker<C> {
    params: GoalTrackerParams,
    clock: C,
    targets: Vec<TrackedTarget>,
    next_id: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C: Clock> GoalTracker<C> {
    pub fn new(params: GoalTrackerParams, clock: C) -> Self {
        Self {
            params,
            clock,
            targets: Vec::new(),
            next_id: 0,
        }
    }

    /// Add a field relative goal sample captured at `time_s`.
    ///
    /// Returns the identity of the target the sample was assigned to, or
    /// `None` if the sample was rejected.
    pub fn add_sample(&mut self, time_s: f64, sample: Pose2) -> Option<TargetId> {
        let now_s = self.clock.now_s();

        if time_s > now_s {
            warn!(
                "Rejecting goal sample from the future ({:.3} s, now {:.3} s)",
                time_s, now_s
            );
            return None;
        }

        if !time_s.is_finite() || !sample.is_finite() {
            warn!("Rejecting non-finite goal sample: {:?} at {} s", sample, time_s);
            return None;
        }

        let live = self.live_index_iter(now_s);
        let closest = live
            .map(|i| {
                let d = self.targets[i].smoothed_pose().distance_to(&sample);
                (i, d)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match closest {
            Some((i, d)) if d <= self.params.distance_tolerance_m => {
                self.targets[i].add_sample(time_s, sample, &self.params);
                trace!("Goal sample added to target {:?} ({:.3} m away)", self.targets[i].id(), d);
                Some(self.targets[i].id())
            },
            _ => {
                let id = TargetId(self.next_id);
                self.next_id += 1;

                self.targets.push(TrackedTarget::new(id, time_s, sample, &self.params));
                debug!("New goal target {:?} at {:?}", id, sample.position_m);
                Some(id)
            }
        }
    }

    /// Drop stale samples and evict targets which have no samples left.
    pub fn update(&mut self) {
        let now_s = self.clock.now_s();
        let mut alive = Vec::with_capacity(self.targets.len());

        for mut t in self.targets.drain(..) {
            if t.update(now_s, &self.params) {
                alive.push(t);
            }
            else {
                debug!("Goal target {:?} evicted", t.id());
            }
        }

        self.targets = alive;
    }

    /// Get the live target closest to the reference pose.
    pub fn closest_target(&self, reference: &Pose2) -> Option<&TrackedTarget> {
        let now_s = self.clock.now_s();

        self.live_index_iter(now_s)
            .map(|i| &self.targets[i])
            .min_by(|a, b| {
                let da = a.smoothed_pose().distance_to(reference);
                let db = b.smoothed_pose().distance_to(reference);
                da.total_cmp(&db)
            })
    }

    /// Number of targets currently tracked.
    pub fn num_targets(&self) -> usize {
        let now_s = self.clock.now_s();
        self.live_index_iter(now_s).count()
    }

    pub fn is_tracking(&self) -> bool {
        self.num_targets() > 0
    }

    /// Iterator over the live targets.
    pub fn targets(&self) -> impl Iterator<Item = &TrackedTarget> {
        let now_s = self.clock.now_s();
        let lifetime = self.params.max_target_lifetime_s;

        self.targets
            .iter()
            .filter(move |t| now_s - t.last_seen_s() <= lifetime)
    }

    /// Forget every target.
    pub fn clear(&mut self) {
        self.targets.clear();
    }

    pub fn params(&self) -> &GoalTrackerParams {
        &self.params
    }

    /// Indices of the targets seen within their lifetime. Targets are only
    /// removed by `update`, so this also hides stale ones between updates.
    fn live_index_iter(&self, now_s: f64) -> impl Iterator<Item = usize> + '_ {
        let lifetime = self.params.max_target_lifetime_s;

        self.targets
            .iter()
            .enumerate()
            .filter(move |(_, t)| now_s - t.last_seen_s() <= lifetime)
            .map(|(i, _)| i)
    }
}
