//! Main turret executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - System input acquisition:
//!             - Odometry
//!             - Vision camera
//!             - Actuator sensing and homing sensor
//!         - Telecommand processing and handling
//!         - Aim control processing
//!         - Actuator demands
//!         - Archiving
//!
//! # Modules
//!
//! All modules (e.g. `aim_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::MechDems;
use turret_lib::{
    aim_ctrl::{AimCtrl, AimCtrlInit},
    data_store::DataStore,
    eqpt::{apply_dem, Actuator, HomingSensor, OdomSource, VisionSource},
    sim::{SimField, SimParams},
    vision_proc::VisionParams,
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{self, Session},
    time::SessionClock,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

/// Time to keep running after the last TC in the script.
const END_OF_SCRIPT_GRACE_S: f64 = 2.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Turret executable, runs the aim controller against the simulated field.
#[derive(Debug, StructOpt)]
#[structopt(name = "turret_exec")]
struct Args {
    /// Path to the TC script to run
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Stop after this many cycles
    #[structopt(long)]
    max_cycles: Option<u128>,

    /// Log at trace level
    #[structopt(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "turret_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    let log_level = if args.verbose {
        LevelFilter::Trace
    }
    else {
        LevelFilter::Info
    };
    logger_init(log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Turret Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let sim_params: SimParams = util::params::load("sim.toml")
        .wrap_err("Could not load sim params")?;
    let vision_params: VisionParams = util::params::load("vision.toml")
        .wrap_err("Could not load vision params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    info!("Loading script from {:?}", &args.script);

    let mut script = ScriptInterpreter::new(&args.script)
        .wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        script.get_duration(),
        script.get_num_tcs()
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    let mut aim_ctrl: AimCtrl<SessionClock> = AimCtrl::init(AimCtrlInit::default(), &session)
        .wrap_err("Failed to initialise AimCtrl")?;
    info!("AimCtrl init complete");

    let mut field = SimField::new(sim_params, vision_params, SessionClock);
    info!("Simulated field init complete");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut end_of_script_s: Option<f64> = None;

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ, session::get_elapsed_seconds());

        // ---- DATA INPUT ----

        field.step();

        ds.aim_ctrl_input.odom = field.odom();
        ds.aim_ctrl_input.vision = field.frame();
        ds.aim_ctrl_input.turret = field.turret.sens_data();
        ds.aim_ctrl_input.shooter = field.shooter.sens_data();
        ds.aim_ctrl_input.hood = field.hood.sens_data();
        ds.aim_ctrl_input.homing_engaged = field.is_engaged();

        // ---- TELECOMMAND PROCESSING ----

        match script.get_pending_tcs(ds.sim_time_s) {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    tc_processor::exec(&mut ds, tc);
                }
            },
            // Exit once the grace period after the last TC is over
            PendingTcs::EndOfScript => match end_of_script_s {
                None => {
                    info!(
                        "End of TC script reached, stopping in {:.1} s",
                        END_OF_SCRIPT_GRACE_S
                    );
                    end_of_script_s = Some(ds.sim_time_s);
                },
                Some(t) if ds.sim_time_s - t >= END_OF_SCRIPT_GRACE_S => {
                    info!("End of TC script grace period, stopping");
                    break
                },
                Some(_) => ()
            }
        }

        if ds.make_safe_pending {
            aim_ctrl.make_safe();
            ds.make_safe_pending = false;
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        match aim_ctrl.proc(&ds.aim_ctrl_input) {
            Ok((o, r)) => {
                ds.aim_ctrl_output = o;
                ds.aim_ctrl_status_rpt = r;
            },
            Err(e) => {
                warn!("Error during AimCtrl processing: {}", e)
            }
        };

        if let Some(z) = ds.aim_ctrl_output.turret_zero_rad {
            info!("Turret zeroed at {:.2} deg", z.to_degrees());
            field.turret.reset_position(z);
        }

        // ---- ACTUATOR DEMANDS ----

        let dems = if ds.safe {
            MechDems::default()
        }
        else {
            ds.aim_ctrl_output.dems
        };

        apply_dem(&mut field.turret, dems.turret);
        apply_dem(&mut field.shooter, dems.shooter);
        apply_dem(&mut field.hood, dems.hood);

        if ds.is_1_hz_cycle {
            let rpt = &ds.aim_ctrl_status_rpt;
            info!(
                "AimCtrl: {:?} {}, targets: {}, settled: {}, rails: {}/{}",
                rpt.zero_state,
                aim_ctrl.mode().name(),
                rpt.num_targets,
                rpt.aim_settled,
                rpt.turret_rail_count,
                rpt.hood_rail_count
            );

            match serde_json::to_string(&ds.aim_ctrl_output) {
                Ok(s) => debug!("AimCtrl output: {}", s),
                Err(e) => warn!("Could not serialise the AimCtrl output: {}", e)
            }
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = aim_ctrl.write() {
            warn!("Could not write the AimCtrl archive: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.cycle_end(false);
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.cycle_end(true);
            }
        }

        if let Some(max_cycles) = args.max_cycles {
            if ds.num_cycles >= max_cycles {
                info!("Maximum number of cycles ({}) reached, stopping", max_cycles);
                break;
            }
        }
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}
