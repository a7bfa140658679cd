//! Turret zeroing gate
//!
//! The turret's encoder is relative, so on power up the controller doesn't
//! know where the turret is pointing. Until the turret has been zeroed
//! against the homing sensor no motion demands may be issued.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracks the zeroing state of the turret.
#[derive(Debug, Clone)]
pub struct ZeroGate {
    state: ZeroState,
    debounce_s: f64,

    /// Start of the current continuous engagement of the homing sensor.
    engaged_since_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZeroState {
    /// The turret position is unknown
    NotZeroed,

    /// Waiting for the homing sensor to be held
    Zeroing,

    /// The turret position is known and motion is allowed
    Ready,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ZeroState {
    fn default() -> Self {
        ZeroState::NotZeroed
    }
}

impl ZeroGate {
    pub fn new(debounce_s: f64) -> Self {
        Self {
            state: ZeroState::NotZeroed,
            debounce_s,
            engaged_since_s: None,
        }
    }

    pub fn state(&self) -> ZeroState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ZeroState::Ready
    }

    /// Begin zeroing, from any state.
    pub fn start(&mut self) {
        info!("Turret zeroing started, waiting for the homing sensor");
        self.state = ZeroState::Zeroing;
        self.engaged_since_s = None;
    }

    /// Update the gate with the homing sensor state.
    ///
    /// Returns `true` on the cycle that zeroing completes.
    pub fn update(&mut self, now_s: f64, engaged: bool) -> bool {
        if self.state != ZeroState::Zeroing {
            return false;
        }

        if !engaged {
            self.engaged_since_s = None;
            return false;
        }

        let since_s = *self.engaged_since_s.get_or_insert(now_s);

        if now_s - since_s >= self.debounce_s {
            info!("Turret zeroed after {:.2} s on the homing sensor", now_s - since_s);
            self.state = ZeroState::Ready;
            self.engaged_since_s = None;
            true
        }
        else {
            false
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_debounce() {
        let mut gate = ZeroGate::new(3.0);

        // Nothing happens until zeroing is started
        assert!(!gate.update(0.0, true));
        assert!(!gate.update(5.0, true));
        assert_eq!(gate.state(), ZeroState::NotZeroed);

        gate.start();
        assert!(!gate.update(10.0, true));
        assert!(!gate.update(12.0, true));

        // Dropping out resets the window
        assert!(!gate.update(12.5, false));
        assert!(!gate.update(13.0, true));
        assert!(!gate.update(15.9, true));
        assert_eq!(gate.state(), ZeroState::Zeroing);

        assert!(gate.update(16.0, true));
        assert!(gate.is_ready());

        // Only reported once
        assert!(!gate.update(17.0, true));
    }
}
