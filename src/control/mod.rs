//! Control module for the R4 robot
pub mod fusion;
pub mod gimbal;
pub mod kinematics;
pub mod workspace;

use self::fusion::CommandFusion;
use self::gimbal::GimbalController;
use self::kinematics::{DriveGeometry, KinematicsIntegrator};
use self::workspace::WorkspaceBounds;
use crate::channel::{CommandChannel, ControlMessage};
use crate::common::{DriveCommand, LookCommand, RobotSnapshot, WheelState};
use crate::config::R4Config;
use crate::error::{ConfigError, R4Error, Result};
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use crate::state::PoseStateStore;
use std::any::Any;
use std::sync::Arc;
use tracing::{info, trace};

/// The per-tick control loop.
///
/// Each tick drains remote commands, fuses them with the operator's, points
/// the gimbal, integrates the base pose and publishes one snapshot. Manual
/// input is applied immediately and echoed outward over the channel.
pub struct ControlLoop {
    base: LifecycleNodeBase,
    channel: Arc<CommandChannel>,
    fusion: CommandFusion,
    kinematics: KinematicsIntegrator,
    gimbal: GimbalController,
    store: Arc<PoseStateStore>,
    ticks: u64,
}

impl ControlLoop {
    /// Create a control loop and publish its starting snapshot
    pub fn new(
        kinematics: KinematicsIntegrator,
        channel: Arc<CommandChannel>,
        store: Arc<PoseStateStore>,
    ) -> Self {
        let gimbal = GimbalController::new();
        store.publish(RobotSnapshot {
            pose: kinematics.pose(),
            pan: gimbal.pan(),
            tilt: gimbal.tilt(),
        });

        ControlLoop {
            base: LifecycleNodeBase::new("control_loop"),
            channel,
            fusion: CommandFusion::new(),
            kinematics,
            gimbal,
            store,
            ticks: 0,
        }
    }

    /// Build from configuration
    pub fn from_config(
        config: &R4Config,
        channel: Arc<CommandChannel>,
        store: Arc<PoseStateStore>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let kinematics = KinematicsIntegrator::new(
            DriveGeometry::from_config(&config.robot),
            WorkspaceBounds::from_config(&config.workspace)?,
            config.initial_pose.pose(),
        );
        Ok(Self::new(kinematics, channel, store))
    }

    /// Operator drive input
    pub fn drive(&mut self, cmd: DriveCommand) {
        self.pull_external();
        self.fusion.set_manual_drive(cmd);
        self.channel.send(&ControlMessage::drive(cmd));
    }

    /// Operator look input
    pub fn look(&mut self, cmd: LookCommand) {
        self.pull_external();
        self.fusion.set_manual_look(cmd);
        self.channel.send(&ControlMessage::look(cmd));
    }

    /// Operator released the drive control
    pub fn release_drive(&mut self) {
        self.pull_external();
        self.fusion.release_drive();
        self.channel.send(&ControlMessage::drive(DriveCommand::zero()));
    }

    /// Operator released the look control
    pub fn release_look(&mut self) {
        self.pull_external();
        self.fusion.release_look();
        self.channel.send(&ControlMessage::look(LookCommand::zero()));
    }

    /// Advance the loop by `dt` seconds.
    ///
    /// While inactive, or for a non-positive `dt`, nothing moves and the last
    /// published snapshot is returned.
    pub fn tick(&mut self, dt: f64) -> RobotSnapshot {
        if !self.base.is_active() {
            return self.store.read();
        }
        if !dt.is_finite() || dt <= 0.0 {
            trace!("Skipping tick with dt={}", dt);
            return self.store.read();
        }

        self.pull_external();
        let (drive, look) = self.fusion.fused();

        let (pan, tilt) = self.gimbal.apply(look);
        let pose = self.kinematics.step(drive, dt);

        let snapshot = RobotSnapshot { pose, pan, tilt };
        self.store.publish(snapshot);
        self.ticks += 1;
        snapshot
    }

    pub fn snapshot(&self) -> RobotSnapshot {
        self.store.read()
    }

    pub fn wheel_state(&self) -> WheelState {
        self.kinematics.wheels()
    }

    pub fn fusion(&self) -> &CommandFusion {
        &self.fusion
    }

    /// Handle for observers of the published state
    pub fn store(&self) -> Arc<PoseStateStore> {
        Arc::clone(&self.store)
    }

    pub fn channel(&self) -> Arc<CommandChannel> {
        Arc::clone(&self.channel)
    }

    /// Number of ticks that advanced state
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn state(&self) -> State {
        self.base.get_state()
    }

    fn pull_external(&mut self) {
        let pending = self.channel.receive();
        if !pending.is_empty() {
            self.fusion.apply_external(pending);
        }
    }
}

impl LifecycleNode for ControlLoop {
    fn on_configure(&mut self) -> Result<()> {
        info!("Configuring control loop at {:?}", self.kinematics.pose());
        self.base.set_state(State::Inactive);
        Ok(())
    }

    fn on_activate(&mut self) -> Result<()> {
        if self.base.get_state() != State::Inactive {
            return Err(R4Error::Lifecycle(format!(
                "cannot activate {} from {:?}",
                self.base.name,
                self.base.get_state()
            )));
        }
        info!("Activating control loop");
        self.base.set_state(State::Active);
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<()> {
        info!("Deactivating control loop after {} ticks", self.ticks);
        self.release_drive();
        self.release_look();
        self.base.set_state(State::Inactive);
        Ok(())
    }

    /// The channel belongs to whoever built the loop and stays open, so
    /// the loop can be configured and activated again.
    fn on_cleanup(&mut self) -> Result<()> {
        info!("Cleaning up control loop");
        self.base.set_state(State::Unconfigured);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.base.name
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Pose2D;
    use crate::control::fusion::CommandSource;
    use approx::assert_relative_eq;

    fn active_loop() -> ControlLoop {
        let kinematics = KinematicsIntegrator::new(
            DriveGeometry::default(),
            WorkspaceBounds::default(),
            Pose2D::new(0.0, 0.0, 0.0),
        );
        let mut control = ControlLoop::new(
            kinematics,
            Arc::new(CommandChannel::detached()),
            Arc::new(PoseStateStore::default()),
        );
        control.on_configure().unwrap();
        control.on_activate().unwrap();
        control
    }

    #[test]
    fn test_new_publishes_initial_snapshot() {
        let store = Arc::new(PoseStateStore::default());
        let kinematics = KinematicsIntegrator::new(
            DriveGeometry::default(),
            WorkspaceBounds::default(),
            Pose2D::new(400.0, -200.0, 180.0),
        );
        let _control = ControlLoop::new(
            kinematics,
            Arc::new(CommandChannel::detached()),
            Arc::clone(&store),
        );
        assert_eq!(store.read().pose, Pose2D::new(400.0, -200.0, 180.0));
    }

    #[test]
    fn test_inactive_loop_is_frozen() {
        let mut control = active_loop();
        control.drive(DriveCommand::new(200.0, 0.0));
        control.base.set_state(State::Inactive);

        let before = control.snapshot();
        assert_eq!(control.tick(0.1), before);
        assert_eq!(control.ticks(), 0);
    }

    #[test]
    fn test_tick_moves_and_points_head() {
        let mut control = active_loop();
        control.drive(DriveCommand::new(100.0, 0.0));
        control.look(LookCommand::new(-45.0, 20.0));

        let snapshot = control.tick(0.5);
        assert_relative_eq!(snapshot.pose.z, -50.0);
        assert_eq!(snapshot.pan, -45.0);
        assert_eq!(snapshot.tilt, 20.0);
        assert_eq!(control.store().read(), snapshot);
    }

    #[test]
    fn test_release_gives_exact_zero_next_tick() {
        let mut control = active_loop();
        control.drive(DriveCommand::new(350.0, 1.2));
        control.tick(0.1);
        control.release_drive();

        assert_eq!(control.fusion().fused().0, DriveCommand::zero());
        let before = control.snapshot();
        let after = control.tick(0.1);
        assert_eq!(after.pose, before.pose);
    }

    #[test]
    fn test_external_then_manual_ordering() {
        let mut control = active_loop();
        let channel = control.channel();

        // Remote arrives first, operator acts afterwards: operator wins
        channel
            .deliver(r#"{"type":"control","move":{"v":-300,"w":0}}"#)
            .unwrap();
        control.drive(DriveCommand::new(100.0, 0.0));
        control.tick(0.1);
        assert_eq!(control.fusion().fused().0, DriveCommand::new(100.0, 0.0));

        // Remote arrives after the operator: remote wins
        channel
            .deliver(r#"{"type":"control","move":{"v":-300,"w":0}}"#)
            .unwrap();
        control.tick(0.1);
        assert_eq!(control.fusion().fused().0, DriveCommand::new(-300.0, 0.0));
        assert_eq!(control.fusion().drive_source(), CommandSource::External);
    }

    #[test]
    fn test_malformed_packets_leave_command_unchanged() {
        let mut control = active_loop();
        control.drive(DriveCommand::new(120.0, 0.3));
        let channel = control.channel();

        assert!(channel.deliver("definitely not json").is_err());
        assert!(channel
            .deliver(r#"{"type":"selfdestruct","move":{"v":9999,"w":9}}"#)
            .is_err());
        control.tick(0.05);

        assert_eq!(control.fusion().fused().0, DriveCommand::new(120.0, 0.3));
        assert_eq!(control.fusion().drive_source(), CommandSource::Manual);
    }

    #[test]
    fn test_huge_remote_turn_rate_cannot_corrupt_pose() {
        let mut control = active_loop();
        let channel = control.channel();
        let start = control.snapshot();

        channel
            .deliver(r#"{"type":"control","move":{"v":0,"w":1e308}}"#)
            .unwrap();
        assert_eq!(control.tick(0.1).pose, start.pose);

        channel
            .deliver(r#"{"type":"control","move":{"v":200,"w":0}}"#)
            .unwrap();
        let pose = control.tick(0.1).pose;
        assert!(pose.x.is_finite() && pose.z.is_finite() && pose.theta.is_finite());
        assert!(pose.x.abs() <= 520.0 && pose.z.abs() <= 320.0);
        assert_relative_eq!(pose.z, -20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_dt_does_not_consume_remote_commands() {
        let mut control = active_loop();
        let channel = control.channel();
        channel
            .deliver(r#"{"type":"control","look":{"pan":15,"tilt":5}}"#)
            .unwrap();

        control.tick(0.0);
        assert_eq!(control.snapshot().pan, 0.0);

        control.tick(0.02);
        assert_eq!(control.snapshot().pan, 15.0);
    }

    #[test]
    fn test_activate_requires_configure() {
        let kinematics = KinematicsIntegrator::new(
            DriveGeometry::default(),
            WorkspaceBounds::default(),
            Pose2D::new(0.0, 0.0, 0.0),
        );
        let mut control = ControlLoop::new(
            kinematics,
            Arc::new(CommandChannel::detached()),
            Arc::new(PoseStateStore::default()),
        );
        assert!(matches!(control.on_activate(), Err(R4Error::Lifecycle(_))));
        assert_eq!(control.state(), State::Unconfigured);
    }

    #[test]
    fn test_deactivate_releases_both_axes() {
        let mut control = active_loop();
        control.drive(DriveCommand::new(200.0, 0.5));
        control.look(LookCommand::new(30.0, 30.0));

        control.on_deactivate().unwrap();
        assert_eq!(
            control.fusion().fused(),
            (DriveCommand::zero(), LookCommand::zero())
        );
        assert_eq!(control.state(), State::Inactive);
    }
}
