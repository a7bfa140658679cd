//! Implementations for the AimCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::{
    AimCtrlError, AimCtrlParams, AimMode,
    SettleMonitor, ZeroGate, ZeroState
};
use crate::{
    ballistics::{BallisticTable, ShotParams},
    goal_tracker::{GoalTracker, GoalTrackerParams},
    loc::{Pose2, Transform2},
    turret_planner::{constrain_with_status, optimise_with_status, shortest_ang_dist},
    vision_proc::{VisionParams, VisionProc},
};
use comms_if::{
    eqpt::{
        cam::VisionFrame,
        mech::{ActDem, ActSensData, MechDems},
        odom::OdomData,
    },
    tc::aim::AimCmd,
};
use util::{
    archive::{Archived, Archiver, ArchiveError},
    interp::InterpBuffer,
    module::State,
    params,
    session::Session,
    time::Clock,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Aim control module state
pub struct AimCtrl<C> {
    params: AimCtrlParams,
    clock: C,

    table: BallisticTable,
    tracker: GoalTracker<C>,
    vision: VisionProc<C>,

    /// Desired field relative turret angle, unwrapped so it can be
    /// interpolated.
    field_angle_history: InterpBuffer<f64, C>,
    last_field_angle_rad: Option<f64>,

    zero: ZeroGate,
    settle: SettleMonitor,
    mode: AimMode,

    /// Last turret position demand
    turret_dem_rad: Option<f64>,

    /// Last ballistic setpoints
    shot: Option<ShotParams>,

    last_valid_frame_s: Option<f64>,
    last_latency_s: f64,

    turret_rail_count: u64,
    hood_rail_count: u64,

    report: StatusReport,

    arch_record: Option<ArchRecord>,
    arch: Archiver,
}

/// Paths to the parameter files needed by AimCtrl, relative to the params
/// directory.
#[derive(Debug, Clone, Copy)]
pub struct AimCtrlInit {
    pub aim_ctrl: &'static str,
    pub ballistics: &'static str,
    pub goal_tracker: &'static str,
    pub vision: &'static str,
}

/// Input data to aim control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Field pose of the robot, or `None` if odometry is unavailable.
    pub odom: Option<OdomData>,

    /// Latest frame from the vision camera.
    pub vision: VisionFrame,

    pub turret: ActSensData,
    pub shooter: ActSensData,
    pub hood: ActSensData,

    /// True if the turret's homing sensor is engaged
    pub homing_engaged: bool,

    /// A new command, or `None` if there is no command on this cycle.
    pub cmd: Option<AimCmd>,
}

/// Output of aim control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutputData {
    /// Demands for the turret, shooter and hood.
    pub dems: MechDems,

    /// The aim solution computed this cycle, only present while tracking a
    /// goal.
    pub solution: Option<AimSolution>,

    /// Set on the cycle zeroing completes, the value to write into the
    /// turret's encoder.
    ///
    /// Units: radians
    pub turret_zero_rad: Option<f64>,

    /// True if the demands have been met for the settle time.
    pub aim_settled: bool,

    /// Robot pose estimated from the goal's known position, when the goal
    /// was seen this cycle.
    pub robot_pose_estimate: Option<Pose2>,
}

/// The aim computed for the tracked goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AimSolution {
    /// Units: radians
    pub turret_angle_rad: f64,

    /// Units: radians/second
    pub shooter_speed_rads: f64,

    /// Units: radians
    pub hood_angle_rad: f64,

    /// Horizontal distance from the turret axis to the goal.
    ///
    /// Units: meters
    pub distance_m: f64,
}

/// Status report for AimCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub zero_state: ZeroState,

    /// A goal is being tracked and aimed at
    pub has_target: bool,

    pub num_targets: usize,

    /// No valid odometry this cycle
    pub odom_unavailable: bool,

    /// A frame was reported valid but couldn't be used
    pub vision_rejected: bool,

    /// The aim used the latency compensated field angle
    pub latency_compensated: bool,

    /// The turret demand was railed to a limit this cycle
    pub turret_railed: bool,

    /// The hood demand was clamped to a limit this cycle
    pub hood_railed: bool,

    /// Total number of turret demands railed since start up
    pub turret_rail_count: u64,

    /// Total number of hood demands clamped since start up
    pub hood_rail_count: u64,

    pub aim_settled: bool,
}

/// Flat record written to the archive each cycle.
#[derive(Debug, Clone, Copy, Serialize)]
struct ArchRecord {
    time_s: f64,
    zero_state: ZeroState,
    mode: &'static str,
    turret_pos_rad: f64,
    turret_dem_rad: Option<f64>,
    shooter_dem_rads: Option<f64>,
    hood_dem_rad: Option<f64>,
    distance_m: Option<f64>,
    has_target: bool,
    num_targets: usize,
    odom_unavailable: bool,
    vision_rejected: bool,
    latency_compensated: bool,
    turret_rail_count: u64,
    hood_rail_count: u64,
    aim_settled: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for AimCtrlInit {
    fn default() -> Self {
        Self {
            aim_ctrl: "aim_ctrl.toml",
            ballistics: "ballistics.toml",
            goal_tracker: "goal_tracker.toml",
            vision: "vision.toml",
        }
    }
}

impl<C: Clock + Clone + Default> State for AimCtrl<C> {
    type InitData = AimCtrlInit;
    type InitError = AimCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = AimCtrlError;

    /// Initialise the AimCtrl module.
    ///
    /// Loads all parameter files and opens the archive.
    fn init(init_data: Self::InitData, session: &Session)
        -> Result<Self, Self::InitError>
    {
        let params: AimCtrlParams = params::load(init_data.aim_ctrl)
            .map_err(AimCtrlError::ParamLoadError)?;
        let tracker_params: GoalTrackerParams = params::load(init_data.goal_tracker)
            .map_err(AimCtrlError::ParamLoadError)?;
        let vision_params: VisionParams = params::load(init_data.vision)
            .map_err(AimCtrlError::ParamLoadError)?;

        let table = BallisticTable::load(init_data.ballistics)?;

        let mut aim_ctrl = Self::new(
            params, table, tracker_params, vision_params, C::default()
        );

        aim_ctrl.arch = Archiver::from_path(session, "aim_ctrl/aim_ctrl.csv")?;

        Ok(aim_ctrl)
    }

    /// Perform cyclic processing of aim control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        self.report = StatusReport::default();
        let now_s = self.clock.now_s();
        let mut output = OutputData::default();

        if let Some(cmd) = input_data.cmd {
            self.handle_cmd(cmd);
        }

        if self.zero.update(now_s, input_data.homing_engaged) {
            // The encoder is written by the caller, so the sensor data this
            // cycle is still relative to the old zero.
            output.turret_zero_rad = Some(self.params.turret_zero_location_deg.to_radians());
            self.reset_aim();
        }

        self.report.zero_state = self.zero.state();

        if self.zero.is_ready() && output.turret_zero_rad.is_none() {
            self.proc_ready(now_s, input_data, &mut output);
        }
        else {
            self.settle.reset();
        }

        self.report.turret_rail_count = self.turret_rail_count;
        self.report.hood_rail_count = self.hood_rail_count;
        self.report.aim_settled = output.aim_settled;

        trace!("AimCtrl output: {:?}", output.dems);

        self.arch_record = Some(ArchRecord {
            time_s: now_s,
            zero_state: self.report.zero_state,
            mode: self.mode.name(),
            turret_pos_rad: input_data.turret.pos_rad,
            turret_dem_rad: position_of(output.dems.turret),
            shooter_dem_rads: velocity_of(output.dems.shooter),
            hood_dem_rad: position_of(output.dems.hood),
            distance_m: output.solution.map(|s| s.distance_m),
            has_target: self.report.has_target,
            num_targets: self.report.num_targets,
            odom_unavailable: self.report.odom_unavailable,
            vision_rejected: self.report.vision_rejected,
            latency_compensated: self.report.latency_compensated,
            turret_rail_count: self.turret_rail_count,
            hood_rail_count: self.hood_rail_count,
            aim_settled: output.aim_settled,
        });

        Ok((output, self.report))
    }
}

impl<C> Archived for AimCtrl<C> {
    fn write(&mut self) -> Result<(), ArchiveError> {
        if let Some(record) = self.arch_record.take() {
            self.arch.serialise(record)?;
        }

        Ok(())
    }
}

impl<C: Clock + Clone> AimCtrl<C> {

    /// Create a new controller from already loaded parameters.
    ///
    /// The controller starts not zeroed and in `Off` mode, without an
    /// archive.
    pub fn new(
        params: AimCtrlParams,
        table: BallisticTable,
        tracker_params: GoalTrackerParams,
        vision_params: VisionParams,
        clock: C
    ) -> Self {
        Self {
            tracker: GoalTracker::new(tracker_params, clock.clone()),
            vision: VisionProc::new(vision_params, clock.clone()),
            field_angle_history: InterpBuffer::new(
                params.field_angle_history_span_s, clock.clone()
            ),
            last_field_angle_rad: None,
            zero: ZeroGate::new(params.zero_debounce_s),
            settle: SettleMonitor::new(params.settle_time_s),
            mode: AimMode::Off,
            turret_dem_rad: None,
            shot: None,
            last_valid_frame_s: None,
            last_latency_s: 0.0,
            turret_rail_count: 0,
            hood_rail_count: 0,
            report: StatusReport::default(),
            arch_record: None,
            arch: Archiver::default(),
            table,
            params,
            clock,
        }
    }

    /// Disable all outputs.
    pub fn make_safe(&mut self) {
        self.set_mode(AimMode::Off);
    }

    pub fn mode(&self) -> AimMode {
        self.mode
    }

    pub fn zero_state(&self) -> ZeroState {
        self.zero.state()
    }

    pub fn tracker(&self) -> &GoalTracker<C> {
        &self.tracker
    }

    #[cfg(test)]
    pub(crate) fn tracker_mut(&mut self) -> &mut GoalTracker<C> {
        &mut self.tracker
    }

    fn handle_cmd(&mut self, cmd: AimCmd) {
        debug!("AimCtrl command: {:?}", cmd);

        match cmd {
            AimCmd::Zero => self.zero.start(),
            AimCmd::Track => self.set_mode(AimMode::Track),
            AimCmd::FieldRelative { angle_rad } => {
                self.set_mode(AimMode::FieldRelative { angle_rad })
            },
            AimCmd::Hold => self.set_mode(AimMode::Hold),
            AimCmd::Stow => self.set_mode(AimMode::Stow),
            AimCmd::Off => self.set_mode(AimMode::Off),
        }
    }

    fn set_mode(&mut self, mode: AimMode) {
        if mode == self.mode {
            return;
        }

        info!("AimCtrl mode change: {} -> {}", self.mode.name(), mode.name());

        self.field_angle_history.clear();
        self.last_field_angle_rad = None;
        self.settle.reset();

        if mode == AimMode::Off {
            self.turret_dem_rad = None;
            self.shot = None;
        }

        self.mode = mode;
    }

    /// Forget all aim state, used when the turret's zero changes.
    fn reset_aim(&mut self) {
        self.field_angle_history.clear();
        self.last_field_angle_rad = None;
        self.vision.clear();
        self.tracker.clear();
        self.settle.reset();
        self.turret_dem_rad = None;
        self.shot = None;
    }

    fn proc_ready(&mut self, now_s: f64, input: &InputData, output: &mut OutputData) {
        let robot_pose = input.odom
            .map(Pose2::from)
            .filter(|p| p.is_finite());
        self.report.odom_unavailable = robot_pose.is_none();

        let turret_pos_rad = input.turret.pos_rad;

        self.proc_vision(now_s, robot_pose, turret_pos_rad, &input.vision, output);

        output.dems = match self.mode {
            AimMode::Off => MechDems::default(),
            AimMode::Track => self.mode_track(
                now_s, robot_pose, turret_pos_rad, &input.vision, output
            ),
            AimMode::FieldRelative { angle_rad } => {
                self.mode_field_relative(angle_rad, robot_pose, turret_pos_rad)
            },
            AimMode::Hold => self.hold_dems(turret_pos_rad),
            AimMode::Stow => self.mode_stow(),
        };

        output.aim_settled = self.check_settled(now_s, input, &output.dems);
    }

    /// Feed the vision frame to the tracker and update it.
    fn proc_vision(
        &mut self,
        now_s: f64,
        robot_pose: Option<Pose2>,
        turret_pos_rad: f64,
        frame: &VisionFrame,
        output: &mut OutputData
    ) {
        self.vision.record(robot_pose, Some(turret_pos_rad));

        if frame.valid {
            match self.vision.goal_sample(frame) {
                Ok(sample) => {
                    self.tracker.add_sample(sample.time_s, sample.pose);
                    self.last_valid_frame_s = Some(now_s);
                    self.last_latency_s = frame.latency_s;

                    output.robot_pose_estimate = robot_pose.map(|p| {
                        self.vision.estimate_robot_pose(
                            &sample.camera_to_goal,
                            sample.turret_angle_rad,
                            p.heading_rad
                        )
                    });
                },
                Err(e) => {
                    warn!("Vision frame rejected: {}", e);
                    self.report.vision_rejected = true;
                }
            }
        }

        self.tracker.update();
        self.report.num_targets = self.tracker.num_targets();
    }

    /// Aim at the closest tracked goal.
    fn mode_track(
        &mut self,
        now_s: f64,
        robot_pose: Option<Pose2>,
        turret_pos_rad: f64,
        frame: &VisionFrame,
        output: &mut OutputData
    ) -> MechDems {
        let robot = match robot_pose {
            Some(p) => self.vision.predict_robot_pose(
                &p,
                self.params.align_delay_s,
                self.params.velocity_window_s
            ),
            None => return self.hold_dems(turret_pos_rad),
        };

        let turret_pose = self.vision.turret_pose(&robot);

        let goal = match self.tracker.closest_target(&turret_pose) {
            Some(t) => t.smoothed_pose(),
            None => return self.hold_dems(turret_pos_rad),
        };

        self.report.has_target = true;

        let field_angle_rad = self.unwrap_field_angle(turret_pose.bearing_to(&goal));
        self.field_angle_history.set(now_s, field_angle_rad);

        // Between fresh frames use where the goal was when the last image
        // was captured.
        let recent_frame = match self.last_valid_frame_s {
            Some(t) => now_s - t <= self.params.latency_comp_max_age_s,
            None => false,
        };

        let field_angle_rad = if !frame.valid && recent_frame {
            match self.field_angle_history.get(now_s - self.last_latency_s) {
                Some(a) => {
                    self.report.latency_compensated = true;
                    a
                },
                None => field_angle_rad
            }
        }
        else {
            field_angle_rad
        };

        let turret_dem_rad = self.command_turret(
            field_angle_rad - robot.heading_rad,
            turret_pos_rad
        );

        let distance_m = turret_pose.distance_to(&self.inner_goal(&goal));
        let shot = self.clamp_hood(self.table.lookup(distance_m));
        self.shot = Some(shot);

        output.solution = Some(AimSolution {
            turret_angle_rad: turret_dem_rad,
            shooter_speed_rads: shot.shooter_speed_rads,
            hood_angle_rad: shot.hood_angle_rad,
            distance_m,
        });

        MechDems {
            turret: ActDem::Position(turret_dem_rad),
            shooter: ActDem::Velocity(shot.shooter_speed_rads),
            hood: ActDem::Position(shot.hood_angle_rad),
        }
    }

    /// The inner goal sits behind the tracked outer goal, along the goal's
    /// known facing direction.
    fn inner_goal(&self, outer: &Pose2) -> Pose2 {
        let facing_rad = self.vision.params().goal_pose().heading_rad;

        Pose2::new(outer.position_m.x, outer.position_m.y, facing_rad)
            .transform_by(&Transform2::new(self.params.outer_to_inner_goal_m, 0.0, 0.0))
    }

    /// Keep the turret at a field relative angle.
    fn mode_field_relative(
        &mut self,
        angle_rad: f64,
        robot_pose: Option<Pose2>,
        turret_pos_rad: f64
    ) -> MechDems {
        let robot = match robot_pose {
            Some(p) => p,
            None => {
                let mut dems = self.hold_dems(turret_pos_rad);
                dems.shooter = ActDem::Neutral;
                dems.hood = ActDem::Neutral;
                return dems;
            }
        };

        let turret_dem_rad = self.command_turret(angle_rad - robot.heading_rad, turret_pos_rad);

        MechDems {
            turret: ActDem::Position(turret_dem_rad),
            shooter: ActDem::Neutral,
            hood: ActDem::Neutral,
        }
    }

    fn mode_stow(&mut self) -> MechDems {
        let (stow_rad, railed) = constrain_with_status(
            self.params.turret_stow_angle_deg.to_radians(),
            &self.params.turret_range
        );
        if railed {
            self.count_turret_rail(stow_rad);
        }

        self.turret_dem_rad = Some(stow_rad);
        self.shot = None;

        MechDems {
            turret: ActDem::Position(stow_rad),
            shooter: ActDem::Neutral,
            hood: ActDem::Position(self.params.hood_range.min_rad()),
        }
    }

    /// Hold the last commanded turret angle, or the current angle if there
    /// hasn't been one, and the last ballistic setpoints.
    fn hold_dems(&mut self, turret_pos_rad: f64) -> MechDems {
        let turret_dem_rad = *self.turret_dem_rad.get_or_insert(turret_pos_rad);

        MechDems {
            turret: ActDem::Position(turret_dem_rad),
            shooter: self.shot
                .map(|s| ActDem::Velocity(s.shooter_speed_rads))
                .unwrap_or(ActDem::Neutral),
            hood: self.shot
                .map(|s| ActDem::Position(s.hood_angle_rad))
                .unwrap_or(ActDem::Neutral),
        }
    }

    /// Resolve a desired mechanism angle against the turret range.
    fn command_turret(&mut self, desired_rad: f64, turret_pos_rad: f64) -> f64 {
        let (dem_rad, railed) = optimise_with_status(
            desired_rad,
            turret_pos_rad,
            &self.params.turret_range
        );

        if railed {
            self.count_turret_rail(desired_rad);
        }

        self.turret_dem_rad = Some(dem_rad);

        dem_rad
    }

    fn count_turret_rail(&mut self, desired_rad: f64) {
        self.report.turret_railed = true;
        self.turret_rail_count += 1;
        warn!(
            "Turret demand {:.2} deg is outside the turret range, railed ({} so far)",
            desired_rad.to_degrees(),
            self.turret_rail_count
        );
    }

    fn clamp_hood(&mut self, shot: ShotParams) -> ShotParams {
        let range = &self.params.hood_range;

        if range.contains(shot.hood_angle_rad) {
            return shot;
        }

        self.report.hood_railed = true;
        self.hood_rail_count += 1;
        warn!(
            "Hood demand {:.2} deg is outside the hood range, clamped ({} so far)",
            shot.hood_angle_rad.to_degrees(),
            self.hood_rail_count
        );

        ShotParams {
            hood_angle_rad: shot.hood_angle_rad.max(range.min_rad()).min(range.max_rad()),
            ..shot
        }
    }

    /// Unwrap a field angle against the previous one so the history is
    /// continuous.
    fn unwrap_field_angle(&mut self, angle_rad: f64) -> f64 {
        let unwrapped = match self.last_field_angle_rad {
            Some(prev) => prev + shortest_ang_dist(prev, angle_rad),
            None => angle_rad,
        };

        self.last_field_angle_rad = Some(unwrapped);

        unwrapped
    }

    /// The aim is settled once every actuator is within tolerance of its
    /// closed loop demand for the settle time.
    fn check_settled(&mut self, now_s: f64, input: &InputData, dems: &MechDems) -> bool {
        let within = match (dems.turret, dems.shooter, dems.hood) {
            (
                ActDem::Position(turret),
                ActDem::Velocity(shooter),
                ActDem::Position(hood)
            ) => {
                (input.turret.pos_rad - turret).abs()
                    <= self.params.settle_turret_tol_deg.to_radians()
                && (input.shooter.speed_rads - shooter).abs()
                    <= self.params.settle_shooter_tol_rads
                && (input.hood.pos_rad - hood).abs()
                    <= self.params.settle_hood_tol_deg.to_radians()
            },
            _ => false
        };

        self.settle.update(now_s, within)
    }
}

fn position_of(dem: ActDem) -> Option<f64> {
    match dem {
        ActDem::Position(p) => Some(p),
        _ => None,
    }
}

fn velocity_of(dem: ActDem) -> Option<f64> {
    match dem {
        ActDem::Velocity(v) => Some(v),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use crate::ballistics::BallisticsParams;
    use util::time::ManualClock;

    const TURRET_OFFSET_M: f64 = -0.2032;

    fn new_ctrl(clock: ManualClock) -> AimCtrl<ManualClock> {
        let params: AimCtrlParams = params::parse(
            include_str!("../../../params/aim_ctrl.toml")
        ).unwrap();
        let table: BallisticsParams = params::parse(
            include_str!("../../../params/ballistics.toml")
        ).unwrap();
        let tracker: GoalTrackerParams = params::parse(
            include_str!("../../../params/goal_tracker.toml")
        ).unwrap();
        let vision: VisionParams = params::parse(
            include_str!("../../../params/vision.toml")
        ).unwrap();

        AimCtrl::new(
            params,
            BallisticTable::new(table.entries).unwrap(),
            tracker,
            vision,
            clock
        )
    }

    /// A controller which has been zeroed, the clock ends at 3.0 s.
    fn ready_ctrl(clock: &ManualClock) -> AimCtrl<ManualClock> {
        let mut ctrl = new_ctrl(clock.clone());

        clock.set(0.0);
        ctrl.proc(&InputData {
            cmd: Some(AimCmd::Zero),
            homing_engaged: true,
            ..Default::default()
        }).unwrap();

        clock.set(3.0);
        let (out, rpt) = ctrl.proc(&InputData {
            homing_engaged: true,
            ..Default::default()
        }).unwrap();

        assert!(out.turret_zero_rad.is_some());
        assert_eq!(rpt.zero_state, ZeroState::Ready);

        ctrl
    }

    fn odom(x_m: f64, y_m: f64, heading_deg: f64) -> Option<OdomData> {
        Some(OdomData {
            x_m,
            y_m,
            heading_rad: heading_deg.to_radians(),
        })
    }

    #[test]
    fn test_not_zeroed_is_neutral() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = new_ctrl(clock.clone());

        let (out, rpt) = ctrl.proc(&InputData {
            cmd: Some(AimCmd::Track),
            odom: odom(0.0, 0.0, 0.0),
            ..Default::default()
        }).unwrap();

        assert_eq!(rpt.zero_state, ZeroState::NotZeroed);
        assert_eq!(out.dems, MechDems::default());
        assert_eq!(ctrl.mode(), AimMode::Track);
    }

    #[test]
    fn test_zeroing() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = new_ctrl(clock.clone());

        let zeroing = |engaged| InputData {
            homing_engaged: engaged,
            ..Default::default()
        };

        ctrl.proc(&InputData {
            cmd: Some(AimCmd::Zero),
            homing_engaged: true,
            ..Default::default()
        }).unwrap();
        assert_eq!(ctrl.zero_state(), ZeroState::Zeroing);

        // Sensor drops out after 2 s
        clock.set(2.0);
        ctrl.proc(&zeroing(true)).unwrap();
        clock.set(2.1);
        let (out, _) = ctrl.proc(&zeroing(false)).unwrap();
        assert_eq!(out.dems, MechDems::default());

        clock.set(2.2);
        ctrl.proc(&zeroing(true)).unwrap();
        clock.set(5.0);
        let (out, _) = ctrl.proc(&zeroing(true)).unwrap();
        assert!(out.turret_zero_rad.is_none());
        assert_eq!(ctrl.zero_state(), ZeroState::Zeroing);

        clock.set(5.3);
        let (out, rpt) = ctrl.proc(&zeroing(true)).unwrap();
        assert_relative_eq!(out.turret_zero_rad.unwrap(), 81.78f64.to_radians());
        assert_eq!(rpt.zero_state, ZeroState::Ready);
        assert_eq!(out.dems, MechDems::default());
    }

    #[test]
    fn test_track_end_to_end() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);
        ctrl.params.outer_to_inner_goal_m = 0.0;

        clock.set(3.02);
        ctrl.tracker_mut().add_sample(3.02, Pose2::new(TURRET_OFFSET_M + 3.0, 4.0, 0.0));

        let input = InputData {
            cmd: Some(AimCmd::Track),
            odom: odom(0.0, 0.0, 0.0),
            ..Default::default()
        };
        let (out, rpt) = ctrl.proc(&input).unwrap();

        assert!(rpt.has_target);
        let expected = ctrl.table.lookup(5.0);
        let solution = out.solution.unwrap();
        assert_relative_eq!(solution.distance_m, 5.0, epsilon = 1e-9);
        assert_relative_eq!(
            solution.turret_angle_rad.to_degrees(), 53.130102, epsilon = 1e-5
        );

        match out.dems.turret {
            ActDem::Position(p) => assert_relative_eq!(p, solution.turret_angle_rad),
            d => panic!("Unexpected turret demand {:?}", d),
        }
        assert_eq!(out.dems.shooter, ActDem::Velocity(expected.shooter_speed_rads));
        assert_eq!(out.dems.hood, ActDem::Position(expected.hood_angle_rad));

        // Unchanged inputs give unchanged outputs
        let input = InputData { cmd: None, ..input };
        for _ in 0..5 {
            let (again, _) = ctrl.proc(&input).unwrap();
            assert_eq!(again.dems, out.dems);
        }
    }

    #[test]
    fn test_track_compensates_heading() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);
        ctrl.params.outer_to_inner_goal_m = 0.0;

        // Robot facing +Y, so the turret axis sits 0.2032 m towards -Y
        clock.set(3.02);
        ctrl.tracker_mut().add_sample(3.02, Pose2::new(3.0, 4.0 + TURRET_OFFSET_M, 0.0));

        let (out, _) = ctrl.proc(&InputData {
            cmd: Some(AimCmd::Track),
            odom: odom(0.0, 0.0, 90.0),
            ..Default::default()
        }).unwrap();

        let solution = out.solution.unwrap();
        assert_relative_eq!(solution.distance_m, 5.0, epsilon = 1e-9);
        assert_relative_eq!(
            solution.turret_angle_rad.to_degrees(), -36.869898, epsilon = 1e-5
        );
    }

    #[test]
    fn test_track_uses_inner_goal_distance() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);

        clock.set(3.02);
        ctrl.tracker_mut().add_sample(3.02, Pose2::new(TURRET_OFFSET_M + 3.0, 4.0, 0.0));

        let (out, _) = ctrl.proc(&InputData {
            cmd: Some(AimCmd::Track),
            odom: odom(0.0, 0.0, 0.0),
            ..Default::default()
        }).unwrap();

        // The turret still points at the outer goal
        let solution = out.solution.unwrap();
        assert_relative_eq!(
            solution.turret_angle_rad.to_degrees(), 53.130102, epsilon = 1e-5
        );

        // Ballistics use the inner goal, 0.6858 m further down the field
        let inner_m = (3.6858f64.powi(2) + 4.0f64.powi(2)).sqrt();
        assert_relative_eq!(solution.distance_m, inner_m, epsilon = 1e-9);

        let expected = ctrl.table.lookup(inner_m);
        assert_relative_eq!(solution.shooter_speed_rads, expected.shooter_speed_rads);
        assert_relative_eq!(solution.hood_angle_rad, expected.hood_angle_rad);
    }

    #[test]
    fn test_track_predicts_robot_motion() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);
        ctrl.params.outer_to_inner_goal_m = 0.0;

        clock.set(3.02);
        ctrl.tracker_mut().add_sample(3.02, Pose2::new(TURRET_OFFSET_M + 3.0, 4.0, 0.0));
        ctrl.proc(&InputData {
            cmd: Some(AimCmd::Track),
            odom: odom(0.0, 0.0, 0.0),
            ..Default::default()
        }).unwrap();

        // Driving along +Y at 1 m/s, in 0.25 s the robot will be at 0.35 m
        clock.set(3.12);
        let (out, _) = ctrl.proc(&InputData {
            odom: odom(0.0, 0.1, 0.0),
            ..Default::default()
        }).unwrap();

        let solution = out.solution.unwrap();
        assert_relative_eq!(
            solution.turret_angle_rad, 3.65f64.atan2(3.0), epsilon = 1e-9
        );
        assert_relative_eq!(
            solution.distance_m, (3.0f64.powi(2) + 3.65f64.powi(2)).sqrt(), epsilon = 1e-9
        );
    }

    #[test]
    fn test_hood_clamped_to_range() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);

        // A calibration asking for more hood than the mechanism has
        ctrl.table = BallisticTable::new(vec![
            crate::ballistics::CalEntry::new(2.0, 300.0, 50.0),
            crate::ballistics::CalEntry::new(8.0, 600.0, 45.0),
        ]).unwrap();

        clock.set(3.02);
        ctrl.tracker_mut().add_sample(3.02, Pose2::new(5.0, 0.0, 0.0));

        let (out, rpt) = ctrl.proc(&InputData {
            cmd: Some(AimCmd::Track),
            odom: odom(0.0, 0.0, 0.0),
            ..Default::default()
        }).unwrap();

        let max_rad = ctrl.params.hood_range.max_rad();
        assert_eq!(out.dems.hood, ActDem::Position(max_rad));
        assert_relative_eq!(out.solution.unwrap().hood_angle_rad, max_rad);
        assert!(rpt.hood_railed);
        assert_eq!(rpt.hood_rail_count, 1);
        assert!(!rpt.turret_railed);
    }

    #[test]
    fn test_over_latency_frame_rejected() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);

        let frame = VisionFrame {
            valid: true,
            bearing_rad: 0.0,
            pitch_rad: 0.0,
            latency_s: 0.6,
        };

        clock.set(3.7);
        let (out, rpt) = ctrl.proc(&InputData {
            cmd: Some(AimCmd::Track),
            odom: odom(0.0, 0.0, 0.0),
            vision: frame,
            turret: ActSensData { pos_rad: 0.4, ..Default::default() },
            ..Default::default()
        }).unwrap();

        assert!(rpt.vision_rejected);
        assert_eq!(rpt.num_targets, 0);
        assert_eq!(ctrl.tracker().num_targets(), 0);
        assert!(out.robot_pose_estimate.is_none());
        assert!(out.solution.is_none());
        assert_eq!(out.dems.turret, ActDem::Position(0.4));
        assert_eq!(out.dems.shooter, ActDem::Neutral);
    }

    #[test]
    fn test_track_without_target_holds() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);

        // No target at all, hold the current angle with no ballistics
        clock.set(3.02);
        let (out, rpt) = ctrl.proc(&InputData {
            cmd: Some(AimCmd::Track),
            odom: odom(0.0, 0.0, 0.0),
            turret: ActSensData { pos_rad: 0.4, ..Default::default() },
            ..Default::default()
        }).unwrap();

        assert!(!rpt.has_target);
        assert!(out.solution.is_none());
        assert_eq!(out.dems.turret, ActDem::Position(0.4));
        assert_eq!(out.dems.shooter, ActDem::Neutral);

        // Acquire a target
        clock.set(3.04);
        ctrl.tracker_mut().add_sample(3.04, Pose2::new(5.0, 0.0, 0.0));
        let input = InputData {
            odom: odom(0.0, 0.0, 0.0),
            ..Default::default()
        };
        let (tracking, _) = ctrl.proc(&input).unwrap();
        assert!(tracking.solution.is_some());

        // Target goes stale, the last demands are held
        clock.set(6.0);
        let (held, rpt) = ctrl.proc(&input).unwrap();
        assert!(!rpt.has_target);
        assert_eq!(rpt.num_targets, 0);
        assert!(held.solution.is_none());
        assert_eq!(held.dems, tracking.dems);

        // Losing odometry also holds
        let (held, rpt) = ctrl.proc(&InputData { odom: None, ..input }).unwrap();
        assert!(rpt.odom_unavailable);
        assert_eq!(held.dems, tracking.dems);
    }

    #[test]
    fn test_latency_compensation() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);

        let p = ctrl.vision.params().clone();

        // Robot at the origin facing +X with the turret at zero. The camera
        // is yawed by its mount angle so the goal straight ahead of it
        // appears at the opposite bearing.
        let distance_m = 5.0;
        let frame = VisionFrame {
            valid: true,
            bearing_rad: -p.turret_to_camera_deg.to_radians(),
            pitch_rad: ((p.goal_height_m - p.camera_height_m) / distance_m).atan()
                - p.camera_mount_angle_deg.to_radians(),
            latency_s: 0.1,
        };

        clock.set(3.1);
        let (out, rpt) = ctrl.proc(&InputData {
            cmd: Some(AimCmd::Track),
            odom: odom(0.0, 0.0, 0.0),
            vision: frame,
            ..Default::default()
        }).unwrap();
        assert!(!rpt.vision_rejected);
        assert!(rpt.has_target);
        assert!(!rpt.latency_compensated);
        assert!(out.robot_pose_estimate.is_some());
        assert_relative_eq!(out.solution.unwrap().turret_angle_rad, 0.0, epsilon = 1e-9);

        // The robot has moved sideways and no fresh frame is available, the
        // angle from when the last image was captured is used.
        clock.set(3.2);
        let (out, rpt) = ctrl.proc(&InputData {
            odom: odom(0.0, 1.0, 0.0),
            ..Default::default()
        }).unwrap();
        assert!(rpt.latency_compensated);
        assert_relative_eq!(out.solution.unwrap().turret_angle_rad, 0.0, epsilon = 1e-9);

        // Once the last valid frame is too old the live angle is used
        clock.set(3.5);
        let (out, rpt) = ctrl.proc(&InputData {
            odom: odom(0.0, 1.0, 0.0),
            ..Default::default()
        }).unwrap();
        assert!(!rpt.latency_compensated);
        assert!(out.solution.unwrap().turret_angle_rad < -0.1);
    }

    #[test]
    fn test_aim_settled() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);

        clock.set(3.02);
        ctrl.tracker_mut().add_sample(3.02, Pose2::new(4.0, 0.0, 0.0));

        let (out, _) = ctrl.proc(&InputData {
            cmd: Some(AimCmd::Track),
            odom: odom(0.0, 0.0, 0.0),
            ..Default::default()
        }).unwrap();
        assert!(!out.aim_settled);

        let s = out.solution.unwrap();
        let on_target = InputData {
            odom: odom(0.0, 0.0, 0.0),
            turret: ActSensData { pos_rad: s.turret_angle_rad, ..Default::default() },
            shooter: ActSensData { speed_rads: s.shooter_speed_rads - 1.0, ..Default::default() },
            hood: ActSensData { pos_rad: s.hood_angle_rad, ..Default::default() },
            ..Default::default()
        };

        clock.set(3.04);
        let (out, _) = ctrl.proc(&on_target).unwrap();
        assert!(!out.aim_settled);

        clock.set(3.30);
        let (out, rpt) = ctrl.proc(&on_target).unwrap();
        assert!(out.aim_settled);
        assert!(rpt.aim_settled);

        // Shooter drops out of tolerance
        clock.set(3.32);
        let (out, _) = ctrl.proc(&InputData {
            shooter: ActSensData { speed_rads: 0.0, ..Default::default() },
            ..on_target
        }).unwrap();
        assert!(!out.aim_settled);
    }

    #[test]
    fn test_field_relative_and_stow() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);

        clock.set(3.02);
        let (out, _) = ctrl.proc(&InputData {
            cmd: Some(AimCmd::FieldRelative { angle_rad: 0.0 }),
            odom: odom(0.0, 0.0, 30.0),
            ..Default::default()
        }).unwrap();
        match out.dems.turret {
            ActDem::Position(p) => assert_relative_eq!(p, (-30f64).to_radians(), epsilon = 1e-12),
            d => panic!("Unexpected turret demand {:?}", d),
        }
        assert_eq!(out.dems.shooter, ActDem::Neutral);

        clock.set(3.04);
        let (out, _) = ctrl.proc(&InputData {
            cmd: Some(AimCmd::Stow),
            ..Default::default()
        }).unwrap();
        assert_eq!(out.dems.turret, ActDem::Position(90f64.to_radians()));
        assert_eq!(out.dems.hood, ActDem::Position(10f64.to_radians()));
    }

    #[test]
    fn test_turret_railing_counted() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);

        // Narrow the range so there is a dead zone behind the robot
        ctrl.params.turret_range = crate::turret_planner::AngleRange::from_deg(-90.0, 90.0)
            .unwrap();

        clock.set(3.02);
        let (out, rpt) = ctrl.proc(&InputData {
            cmd: Some(AimCmd::FieldRelative { angle_rad: 170f64.to_radians() }),
            odom: odom(0.0, 0.0, 0.0),
            ..Default::default()
        }).unwrap();

        assert!(rpt.turret_railed);
        assert_eq!(rpt.turret_rail_count, 1);
        assert_eq!(out.dems.turret, ActDem::Position(90f64.to_radians()));
    }

    #[test]
    fn test_make_safe() {
        let clock = ManualClock::new(0.0);
        let mut ctrl = ready_ctrl(&clock);

        clock.set(3.02);
        ctrl.proc(&InputData {
            cmd: Some(AimCmd::Hold),
            turret: ActSensData { pos_rad: 1.0, ..Default::default() },
            ..Default::default()
        }).unwrap();

        ctrl.make_safe();
        assert_eq!(ctrl.mode(), AimMode::Off);

        let (out, _) = ctrl.proc(&InputData::default()).unwrap();
        assert_eq!(out.dems, MechDems::default());

        // The archive record is consumed by the write
        assert!(ctrl.write().is_ok());
        assert!(ctrl.arch_record.is_none());
    }
}
