//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use comms_if::tc::Tc;
use turret_lib::data_store::{DataStore, SafeModeCause};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules. While in safe mode only
/// `MakeUnsafe` is executed.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) {

    if ds.safe {
        match tc {
            Tc::MakeUnsafe => (),
            _ => {
                warn!("Cannot execute {:?} while in safe mode", tc);
                return;
            }
        }
    }

    // Handle different Tcs
    match tc {
        Tc::MakeSafe => {
            debug!("Recieved MakeSafe command");
            ds.make_safe(SafeModeCause::MakeSafeTc);
        },
        Tc::MakeUnsafe => {
            debug!("Recieved MakeUnsafe command");
            ds.make_unsafe(SafeModeCause::MakeSafeTc).ok();
        },
        Tc::Aim(cmd) => {
            ds.aim_ctrl_input.cmd = Some(*cmd)
        }
    }

}
