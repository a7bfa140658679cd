//! # Aim Control Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use comms_if::{
    eqpt::{cam::VisionFrame, odom::OdomData},
    tc::aim::AimCmd,
};
use turret_lib::{
    aim_ctrl::{AimCtrl, AimCtrlParams, InputData},
    ballistics::{BallisticTable, BallisticsParams},
    goal_tracker::GoalTrackerParams,
    vision_proc::VisionParams,
};
use util::{module::State, params, time::ManualClock};

fn aim_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build the controller from the shipped parameters ----

    let aim_params: AimCtrlParams = params::parse(
        include_str!("../../params/aim_ctrl.toml")
    ).unwrap();
    let table: BallisticsParams = params::parse(
        include_str!("../../params/ballistics.toml")
    ).unwrap();
    let tracker: GoalTrackerParams = params::parse(
        include_str!("../../params/goal_tracker.toml")
    ).unwrap();
    let vision: VisionParams = params::parse(
        include_str!("../../params/vision.toml")
    ).unwrap();

    let clock = ManualClock::new(0.0);
    let mut ctrl = AimCtrl::new(
        aim_params,
        BallisticTable::new(table.entries).unwrap(),
        tracker,
        vision.clone(),
        clock.clone()
    );

    // Zero the turret
    ctrl.proc(&InputData {
        cmd: Some(AimCmd::Zero),
        homing_engaged: true,
        ..Default::default()
    }).unwrap();
    clock.set(3.0);
    ctrl.proc(&InputData {
        homing_engaged: true,
        ..Default::default()
    }).unwrap();

    // A goal 5 m ahead of the camera, seen every cycle
    let distance_m = 5.0;
    let input = InputData {
        odom: Some(OdomData::default()),
        vision: VisionFrame {
            valid: true,
            bearing_rad: -vision.turret_to_camera_deg.to_radians(),
            pitch_rad: ((vision.goal_height_m - vision.camera_height_m) / distance_m).atan()
                - vision.camera_mount_angle_deg.to_radians(),
            latency_s: 0.03,
        },
        ..Default::default()
    };

    ctrl.proc(&InputData {
        cmd: Some(AimCmd::Track),
        ..input
    }).unwrap();

    // ---- Run the benchmark ----

    c.bench_function("aim_ctrl_track_cycle", |b| {
        b.iter(|| {
            clock.advance(0.02);
            ctrl.proc(&input).unwrap()
        })
    });
}

criterion_group!(benches, aim_ctrl_benchmark);
criterion_main!(benches);
