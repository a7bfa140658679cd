//! Aim settle monitoring

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Reports when a condition has held continuously for a minimum time.
#[derive(Debug, Clone)]
pub struct SettleMonitor {
    settle_time_s: f64,
    within_since_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SettleMonitor {
    pub fn new(settle_time_s: f64) -> Self {
        Self {
            settle_time_s,
            within_since_s: None,
        }
    }

    /// Update with whether the errors are within tolerance this cycle,
    /// returning `true` if they have been for at least the settle time.
    pub fn update(&mut self, now_s: f64, within: bool) -> bool {
        if !within {
            self.within_since_s = None;
            return false;
        }

        let since_s = *self.within_since_s.get_or_insert(now_s);

        now_s - since_s >= self.settle_time_s
    }

    pub fn reset(&mut self) {
        self.within_since_s = None;
    }
}
