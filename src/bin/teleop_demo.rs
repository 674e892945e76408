//! Offline teleoperation session
//!
//! Runs a scripted mix of operator stick input and remote gesture commands
//! through the control loop without any network, logging the state as it goes.

use anyhow::Result;
use r4_core::operator::{gesture_command, Gesture, Sensitivity, StickVector};
use r4_core::{CameraPose, CommandChannel, ControlLoop, PoseStateStore, R4Config, R4Core};
use std::sync::Arc;
use tracing::info;

const DT: f64 = 1.0 / 60.0;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("r4_core=info".parse()?),
        )
        .init();

    let config = R4Config::default();
    let sensitivity = Sensitivity::from_config(&config.sensitivity);
    let channel = Arc::new(CommandChannel::detached());
    let store = Arc::new(PoseStateStore::default());

    let mut core = R4Core::new();
    core.register(ControlLoop::from_config(
        &config,
        Arc::clone(&channel),
        Arc::clone(&store),
    )?);
    core.init()?;

    let Some(control) = core.control_loop_mut() else {
        anyhow::bail!("Control loop was not registered");
    };

    info!("Operator drives forward for 2s");
    control.drive(sensitivity.drive(StickVector::new(0.0, 0.8)));
    run(control, 120);

    info!("Operator turns while looking left");
    control.drive(sensitivity.drive(StickVector::new(0.6, 0.5)));
    control.look(sensitivity.look(StickVector::new(-0.5, 0.2)));
    run(control, 90);

    info!("Remote fist gesture takes over the base");
    let fist = gesture_command(
        Some((Gesture::Fist, StickVector::new(-0.3, 0.9))),
        &sensitivity,
    );
    if let Some(msg) = fist {
        channel.deliver(&msg.encode())?;
    }
    run(control, 180);

    info!("Garbage on the wire is ignored");
    let _ = channel.deliver("{\"type\":\"control\",\"move\":\"fast\"}");
    run(control, 30);

    info!("Operator releases everything");
    control.release_drive();
    control.release_look();
    run(control, 30);

    info!(
        "Wheels turned {:?} over {} ticks",
        control.wheel_state(),
        control.ticks()
    );

    core.shutdown()?;
    Ok(())
}

fn run(control: &mut ControlLoop, ticks: usize) {
    for _ in 0..ticks {
        control.tick(DT);
    }
    let snapshot = control.snapshot();
    let camera = CameraPose::from_snapshot(&snapshot);
    info!(
        "pose=({:.1}, {:.1}) heading={:.1} head=({:.1}, {:.1}) camera yaw={:.1} via {:?}",
        snapshot.pose.x,
        snapshot.pose.z,
        snapshot.pose.theta,
        snapshot.pan,
        snapshot.tilt,
        camera.yaw,
        control.fusion().drive_source()
    );
}
