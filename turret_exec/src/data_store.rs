//! # Data Store

use log::{info, warn};

use crate::aim_ctrl;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive overruns above which safe mode is entered.
pub const MAX_CONSEC_CYCLE_OVERRUNS: u64 = 10;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the turret has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    MakeSafeTc,
    CycleOverruns,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time at the start of the cycle
    pub sim_time_s: f64,

    // Safe mode variables
    /// Determines if the turret is in safe mode.
    pub safe: bool,

    /// Gives the reason for the turret being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    /// Set when safe mode is entered, cleared once the aim controller has
    /// been made safe.
    pub make_safe_pending: bool,

    // AimCtrl
    pub aim_ctrl_input: aim_ctrl::InputData,
    pub aim_ctrl_output: aim_ctrl::OutputData,
    pub aim_ctrl_status_rpt: aim_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the turret into safe mode with the given cause.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);
            self.make_safe_pending = true;
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled, or `Err(())`
    /// otherwise. To remove safe mode the provided cause must match the initial reason for safe
    /// mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) => {
                if cause == root_cause {
                    self.safe = false;
                    self.safe_cause = None;
                    info!("Make unsafe requested, root cause match, safe mode disabled");
                    Ok(())
                } else {
                    // Called every cycle by self clearing causes, so don't log here
                    Err(())
                }
            }
            None => Ok(()),
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64, elapsed_s: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.aim_ctrl_input = aim_ctrl::InputData::default();
        self.aim_ctrl_output = aim_ctrl::OutputData::default();
        self.aim_ctrl_status_rpt = aim_ctrl::StatusReport::default();

        self.sim_time_s = elapsed_s;
    }

    /// Perform actions required at the end of a cycle.
    ///
    /// Counts consecutive overruns, entering safe mode once there are more
    /// than `MAX_CONSEC_CYCLE_OVERRUNS` of them. A cycle which meets its
    /// deadline clears the count and any safe mode caused by overruns.
    pub fn cycle_end(&mut self, overran: bool) {
        if overran {
            self.num_consec_cycle_overruns += 1;

            if self.num_consec_cycle_overruns > MAX_CONSEC_CYCLE_OVERRUNS {
                self.make_safe(SafeModeCause::CycleOverruns);
            }
        }
        else {
            self.num_consec_cycle_overruns = 0;
            self.make_unsafe(SafeModeCause::CycleOverruns).ok();
        }

        self.num_cycles += 1;
    }
}
