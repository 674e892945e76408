//! Common types shared across the R4 control core

use serde::{Deserialize, Serialize};

/// Linear (mm/s) and angular (rad/s) velocity of the robot base
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DriveCommand {
    pub v: f64,
    pub w: f64,
}

impl DriveCommand {
    pub fn new(v: f64, w: f64) -> Self {
        DriveCommand { v, w }
    }

    /// The neutral command, robot at rest
    pub fn zero() -> Self {
        DriveCommand { v: 0.0, w: 0.0 }
    }

    pub fn is_finite(&self) -> bool {
        self.v.is_finite() && self.w.is_finite()
    }
}

/// Absolute gimbal target angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LookCommand {
    pub pan: f64,
    pub tilt: f64,
}

impl LookCommand {
    pub fn new(pan: f64, tilt: f64) -> Self {
        LookCommand { pan, tilt }
    }

    /// Head centered
    pub fn zero() -> Self {
        LookCommand {
            pan: 0.0,
            tilt: 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pan.is_finite() && self.tilt.is_finite()
    }
}

/// World-frame position (mm) and heading (deg) of the robot base.
///
/// Heading 0 faces -Z and grows counter-clockwise. It is kept in `(-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub z: f64,
    pub theta: f64,
}

impl Pose2D {
    pub fn new(x: f64, z: f64, theta: f64) -> Self {
        Pose2D { x, z, theta }
    }
}

/// Accumulated wheel rotation in radians, for display only
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelState {
    pub angle_left: f64,
    pub angle_right: f64,
}

/// Pose and gimbal angles published once per tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RobotSnapshot {
    pub pose: Pose2D,
    pub pan: f64,
    pub tilt: f64,
}

/// Wrap an angle in degrees into `(-180, 180]`
pub fn normalize_angle(theta: f64) -> f64 {
    // In-range values pass through untouched so a zero rotation is exact
    if theta > -180.0 && theta <= 180.0 {
        return theta;
    }
    let wrapped = theta.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
