//! Differential drive kinematics for the robot base
//!
//! Open-loop dead reckoning with a forward-Euler step per tick. Wheel angles
//! are bookkeeping for display and never feed back into the pose.

use super::workspace::WorkspaceBounds;
use crate::common::{normalize_angle, DriveCommand, Pose2D, WheelState};
use crate::config::RobotConfig;
use nalgebra::Vector2;
use tracing::{trace, warn};

/// Static robot constants, both in mm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveGeometry {
    pub wheel_separation: f64,
    pub wheel_radius: f64,
}

impl DriveGeometry {
    pub fn from_config(config: &RobotConfig) -> Self {
        DriveGeometry {
            wheel_separation: config.wheel_separation,
            wheel_radius: config.wheel_radius,
        }
    }
}

impl Default for DriveGeometry {
    fn default() -> Self {
        DriveGeometry {
            wheel_separation: 140.0,
            wheel_radius: 32.5,
        }
    }
}

/// Integrates drive commands into a bounded pose
#[derive(Debug, Clone)]
pub struct KinematicsIntegrator {
    geometry: DriveGeometry,
    bounds: WorkspaceBounds,
    pose: Pose2D,
    wheels: WheelState,
}

impl KinematicsIntegrator {
    /// Create an integrator at `initial`, normalized and clamped into the workspace
    pub fn new(geometry: DriveGeometry, bounds: WorkspaceBounds, initial: Pose2D) -> Self {
        let mut integrator = KinematicsIntegrator {
            geometry,
            bounds,
            pose: Pose2D::default(),
            wheels: WheelState::default(),
        };
        integrator.reset(initial);
        integrator
    }

    /// Jump to a new pose, keeping the accumulated wheel angles
    pub fn reset(&mut self, pose: Pose2D) {
        let position = self.bounds.clamp(Vector2::new(pose.x, pose.z));
        self.pose = Pose2D::new(position.x, position.y, normalize_angle(pose.theta));
    }

    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    pub fn wheels(&self) -> WheelState {
        self.wheels
    }

    pub fn bounds(&self) -> &WorkspaceBounds {
        &self.bounds
    }

    /// Per-wheel linear speed (left, right) in mm/s
    pub fn wheel_speeds(&self, cmd: DriveCommand) -> (f64, f64) {
        let half_track = cmd.w * self.geometry.wheel_separation / 2.0;
        (cmd.v - half_track, cmd.v + half_track)
    }

    /// Advance by `dt` seconds. A non-positive or non-finite `dt` is a no-op.
    pub fn step(&mut self, cmd: DriveCommand, dt: f64) -> Pose2D {
        if !dt.is_finite() || dt <= 0.0 {
            trace!("Skipping integration for dt={}", dt);
            return self.pose;
        }

        let (v_left, v_right) = self.wheel_speeds(cmd);
        let wheels = WheelState {
            angle_left: self.wheels.angle_left + v_left / self.geometry.wheel_radius * dt,
            angle_right: self.wheels.angle_right + v_right / self.geometry.wheel_radius * dt,
        };

        // Heading first; the translation uses the updated heading
        let theta = normalize_angle(self.pose.theta + cmd.w.to_degrees() * dt);
        let heading = theta.to_radians();

        // Heading 0 drives toward -Z
        let velocity = Vector2::new(-heading.sin(), -heading.cos()) * cmd.v;
        let proposed = Vector2::new(self.pose.x, self.pose.z) + velocity * dt;

        // Finite but huge commands can overflow; keep the last good state
        if !theta.is_finite()
            || !proposed.iter().all(|c| c.is_finite())
            || !wheels.angle_left.is_finite()
            || !wheels.angle_right.is_finite()
        {
            warn!("Dropping step for {:?} over dt={}: state would overflow", cmd, dt);
            return self.pose;
        }

        self.wheels = wheels;
        let position = self.bounds.clamp(proposed);
        self.pose = Pose2D::new(position.x, position.y, theta);
        self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn integrator_at(pose: Pose2D) -> KinematicsIntegrator {
        KinematicsIntegrator::new(DriveGeometry::default(), WorkspaceBounds::default(), pose)
    }

    #[test]
    fn test_zero_command_keeps_pose() {
        for &start in &[
            Pose2D::new(0.0, 0.0, 0.0),
            Pose2D::new(123.456, -78.9, -37.123),
            Pose2D::new(-500.0, 300.0, 180.0),
        ] {
            let mut integrator = integrator_at(start);
            for &dt in &[0.001, 0.016, 0.1, 1.0] {
                assert_eq!(integrator.step(DriveCommand::zero(), dt), start);
            }
        }
    }

    #[test]
    fn test_straight_line_scenario() {
        let mut integrator = integrator_at(Pose2D::new(0.0, 0.0, 0.0));
        let cmd = DriveCommand::new(100.0, 0.0);

        let (v_left, v_right) = integrator.wheel_speeds(cmd);
        assert_eq!(v_left, 100.0);
        assert_eq!(v_right, 100.0);

        let pose = integrator.step(cmd, 1.0);
        assert_relative_eq!(pose.theta, 0.0);
        assert_relative_eq!(pose.x, 0.0);
        assert_relative_eq!(pose.z, -100.0);

        let wheels = integrator.wheels();
        assert_relative_eq!(wheels.angle_left, 100.0 / 32.5);
        assert_relative_eq!(wheels.angle_right, 100.0 / 32.5);
        assert_relative_eq!(wheels.angle_left, 3.077, epsilon = 1e-3);
    }

    #[test]
    fn test_forward_follows_heading() {
        let mut integrator = integrator_at(Pose2D::new(0.0, 0.0, 90.0));
        let pose = integrator.step(DriveCommand::new(100.0, 0.0), 1.0);
        // Facing +90 deg (CCW from -Z) drives toward -X
        assert_relative_eq!(pose.x, -100.0, epsilon = 1e-9);
        assert_relative_eq!(pose.z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pure_rotation_scenario() {
        let mut integrator = integrator_at(Pose2D::new(10.0, 20.0, 0.0));
        let pose = integrator.step(DriveCommand::new(0.0, FRAC_PI_2), 1.0);
        assert_relative_eq!(pose.theta, 90.0, epsilon = 1e-9);
        assert_eq!(pose.x, 10.0);
        assert_eq!(pose.z, 20.0);

        // Wheels counter-rotate
        let wheels = integrator.wheels();
        assert_relative_eq!(wheels.angle_left, -wheels.angle_right);
        assert!(wheels.angle_right > 0.0);
    }

    #[test]
    fn test_heading_wraps() {
        let mut integrator = integrator_at(Pose2D::new(0.0, 0.0, 0.0));
        let cmd = DriveCommand::new(0.0, 2.0);
        let mut unwrapped = 0.0;
        for _ in 0..100 {
            integrator.step(cmd, 0.1);
            unwrapped += 2.0_f64.to_degrees() * 0.1;
        }

        let theta = integrator.pose().theta;
        assert!(unwrapped > 360.0);
        assert!(theta > -180.0 && theta <= 180.0);
        assert_relative_eq!(theta, normalize_angle(unwrapped), epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_dt_is_noop() {
        let start = Pose2D::new(50.0, 50.0, 45.0);
        let mut integrator = integrator_at(start);
        let cmd = DriveCommand::new(300.0, 1.0);

        assert_eq!(integrator.step(cmd, 0.0), start);
        assert_eq!(integrator.step(cmd, -0.5), start);
        assert_eq!(integrator.step(cmd, f64::NAN), start);
        assert_eq!(integrator.step(cmd, f64::INFINITY), start);
        assert_eq!(integrator.wheels(), WheelState::default());
    }

    #[test]
    fn test_overflowing_command_keeps_last_pose() {
        let start = Pose2D::new(100.0, -50.0, 30.0);
        let mut integrator = integrator_at(start);

        assert_eq!(integrator.step(DriveCommand::new(0.0, 1e308), 0.1), start);
        assert_eq!(integrator.step(DriveCommand::new(f64::MAX, 0.0), 2.0), start);
        assert_eq!(integrator.wheels(), WheelState::default());

        // Recovers on the next sane command
        let pose = integrator.step(DriveCommand::new(100.0, 0.0), 0.1);
        assert!(pose.x.is_finite() && pose.z.is_finite());
        assert_ne!(pose, start);
    }

    #[test]
    fn test_pushing_against_wall_stays_clamped() {
        // Facing -Z at the far wall, still driving forward
        let mut integrator = integrator_at(Pose2D::new(0.0, -310.0, 0.0));
        for _ in 0..50 {
            let pose = integrator.step(DriveCommand::new(500.0, 0.0), 0.1);
            assert_eq!(pose.z, -320.0);
        }
        // Wheels keep turning even though the base is stopped
        assert!(integrator.wheels().angle_left > 0.0);
    }

    #[test]
    fn test_initial_pose_is_clamped_and_normalized() {
        let integrator = integrator_at(Pose2D::new(900.0, -900.0, 540.0));
        let pose = integrator.pose();
        assert_eq!(pose.x, 520.0);
        assert_eq!(pose.z, -320.0);
        assert_relative_eq!(pose.theta, 180.0);
    }

    #[test]
    fn test_bounded_under_aggressive_commands() {
        let mut integrator = integrator_at(Pose2D::new(0.0, 0.0, 0.0));
        let bounds = *integrator.bounds();
        let commands = [
            DriveCommand::new(500.0, 2.0),
            DriveCommand::new(-500.0, -1.3),
            DriveCommand::new(500.0, 0.0),
            DriveCommand::new(250.0, -2.0),
        ];

        for i in 0..2000 {
            let cmd = commands[i % commands.len()];
            let dt = 0.01 + (i % 10) as f64 * 0.01;
            let pose = integrator.step(cmd, dt);

            assert!(pose.x.is_finite() && pose.z.is_finite() && pose.theta.is_finite());
            assert!(pose.x.abs() <= bounds.x_limit());
            assert!(pose.z.abs() <= bounds.z_limit());
            assert!(pose.theta > -180.0 && pose.theta <= 180.0);
        }
    }
}
