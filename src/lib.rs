//! Control core for the R4 teleoperated robot.
//!
//! Operator sticks, gestures and a remote peer all command the same two
//! axes: base motion and head pointing. Each tick the [`control::ControlLoop`]
//! fuses the latest command per axis, integrates differential-drive
//! kinematics inside the workspace walls, points the gimbal and publishes one
//! consistent snapshot to the [`state::PoseStateStore`].
pub mod channel;
pub mod common;
pub mod config;
pub mod control;
pub mod error;
pub mod lifecycle;
pub mod operator;
pub mod state;

pub use crate::channel::{CommandChannel, ControlMessage};
pub use crate::common::{DriveCommand, LookCommand, Pose2D, RobotSnapshot, WheelState};
pub use crate::config::R4Config;
pub use crate::control::ControlLoop;
pub use crate::error::{R4Error, Result};
pub use crate::state::{CameraPose, PoseStateStore};

use crate::lifecycle::LifecycleNode;
use tracing::info;

/// Owns the robot's lifecycle components
pub struct R4Core {
    components: Vec<Box<dyn LifecycleNode>>,
}

impl R4Core {
    pub fn new() -> Self {
        R4Core {
            components: Vec::new(),
        }
    }

    /// Register a component with the core
    pub fn register<T: LifecycleNode + 'static>(&mut self, component: T) {
        self.components.push(Box::new(component));
    }

    /// Configure and activate every component in registration order
    pub fn init(&mut self) -> Result<()> {
        for component in &mut self.components {
            component.on_configure()?;
            component.on_activate()?;
            info!("{} is up", component.name());
        }
        Ok(())
    }

    /// Deactivate and clean up every component in reverse order
    pub fn shutdown(&mut self) -> Result<()> {
        for component in self.components.iter_mut().rev() {
            component.on_deactivate()?;
            component.on_cleanup()?;
            info!("{} is down", component.name());
        }
        Ok(())
    }

    pub fn control_loop_mut(&mut self) -> Option<&mut ControlLoop> {
        self.components
            .iter_mut()
            .find_map(|component| component.as_any_mut().downcast_mut::<ControlLoop>())
    }
}

impl Default for R4Core {
    fn default() -> Self {
        Self::new()
    }
}
