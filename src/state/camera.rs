//! First-person camera pose derived from the published snapshot
//!
//! Feeds a secondary virtual camera that looks out from the robot's head.

use crate::common::{normalize_angle, RobotSnapshot};
use nalgebra::Point3;

/// Height of the tilt axis above the desk in mm
pub const CAMERA_HEIGHT: f64 = 155.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// World position in mm, Y up
    pub position: Point3<f64>,
    /// Base heading plus head pan, degrees in `(-180, 180]`
    pub yaw: f64,
    /// Head tilt in degrees
    pub pitch: f64,
}

impl CameraPose {
    pub fn from_snapshot(snapshot: &RobotSnapshot) -> Self {
        CameraPose {
            position: Point3::new(snapshot.pose.x, CAMERA_HEIGHT, snapshot.pose.z),
            yaw: normalize_angle(snapshot.pose.theta + snapshot.pan),
            pitch: snapshot.tilt,
        }
    }
}
