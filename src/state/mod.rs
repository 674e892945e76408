//! Published robot state
//!
//! The control loop is the only writer. Observers (telemetry, the
//! first-person camera) get copies and never hold a reference into the
//! loop's own state.

pub mod camera;

pub use camera::CameraPose;

use crate::common::RobotSnapshot;
use std::sync::RwLock;

/// Latest [`RobotSnapshot`], replaced whole once per tick
#[derive(Debug, Default)]
pub struct PoseStateStore {
    snapshot: RwLock<RobotSnapshot>,
}

impl PoseStateStore {
    pub fn new(initial: RobotSnapshot) -> Self {
        PoseStateStore {
            snapshot: RwLock::new(initial),
        }
    }

    /// Replace the snapshot. Readers see either the old or the new one, never a mix.
    pub fn publish(&self, snapshot: RobotSnapshot) {
        // The guarded value is plain data, so a poisoned lock is still usable
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
    }

    /// Copy out the latest snapshot
    pub fn read(&self) -> RobotSnapshot {
        *self.snapshot.read().unwrap_or_else(|e| e.into_inner())
    }
}
