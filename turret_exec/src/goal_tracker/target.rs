//! A single tracked goal

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Serialize;
use std::collections::VecDeque;

// Internal
use super::GoalTrackerParams;
use crate::loc::Pose2;
use util::maths::{circular_mean, median};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Identity of a tracked target. Identities are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TargetId(pub u64);

/// A goal observed one or more times by the vision system.
#[derive(Debug, Clone)]
pub struct TrackedTarget {
    id: TargetId,

    /// Field relative samples ordered by time, oldest first.
    samples: VecDeque<(f64, Pose2)>,

    smoothed_pose: Pose2,
    last_seen_s: f64,
    is_real: bool,
    stability: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrackedTarget {
    pub(super) fn new(
        id: TargetId, time_s: f64, sample: Pose2, params: &GoalTrackerParams
    ) -> Self {
        let mut target = Self {
            id,
            samples: VecDeque::new(),
            smoothed_pose: sample,
            last_seen_s: time_s,
            is_real: false,
            stability: 0.0,
        };

        target.add_sample(time_s, sample, params);

        target
    }

    /// Add a sample, keeping the samples in time order.
    pub(super) fn add_sample(
        &mut self, time_s: f64, sample: Pose2, params: &GoalTrackerParams
    ) {
        let idx = self.samples
            .iter()
            .rposition(|(t, _)| *t <= time_s)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.samples.insert(idx, (time_s, sample));

        if time_s > self.last_seen_s {
            self.last_seen_s = time_s;
        }

        self.recompute(params);
    }

    /// Drop samples older than the lifetime and recompute the smoothed pose.
    ///
    /// Returns `false` if no samples remain and the target should be evicted.
    pub(super) fn update(&mut self, now_s: f64, params: &GoalTrackerParams) -> bool {
        while let Some((t, _)) = self.samples.front() {
            if now_s - t > params.max_target_lifetime_s {
                self.samples.pop_front();
            }
            else {
                break;
            }
        }

        if self.samples.is_empty() {
            return false;
        }

        self.recompute(params);

        true
    }

    fn recompute(&mut self, params: &GoalTrackerParams) {
        let window = params.median_window_size.max(1);
        let start = self.samples.len().saturating_sub(window);
        let samples = &self.samples;
        let recent = || samples.iter().skip(start).map(|(_, p)| p);

        let x = median(recent().map(|p| p.position_m.x));
        let y = median(recent().map(|p| p.position_m.y));
        let h = circular_mean(recent().map(|p| p.heading_rad));

        if let (Some(x), Some(y), Some(h)) = (x, y, h) {
            self.smoothed_pose = Pose2 {
                position_m: Vector2::new(x, y),
                heading_rad: h,
            };
        }

        if self.samples.len() >= 2 {
            self.is_real = true;
        }

        let expected = params.camera_fps * params.max_target_lifetime_s;
        self.stability = if expected > 0.0 {
            (self.samples.len() as f64 / expected).min(1.0)
        }
        else {
            1.0
        };
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    /// The smoothed field relative pose of the target.
    pub fn smoothed_pose(&self) -> Pose2 {
        self.smoothed_pose
    }

    /// Timestamp of the newest sample.
    pub fn last_seen_s(&self) -> f64 {
        self.last_seen_s
    }

    /// True once the target has been seen at least twice.
    pub fn is_real(&self) -> bool {
        self.is_real
    }

    /// Fraction of the frames in the lifetime window in which the target was
    /// seen, between 0 and 1.
    pub fn stability(&self) -> f64 {
        self.stability
    }

    /// Number of samples currently held.
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }
}
