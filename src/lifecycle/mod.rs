//! Lifecycle management for R4 components

use crate::error::Result;
use std::any::Any;
use tracing::info;

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode: Send + Sync {
    /// Configure the node
    fn on_configure(&mut self) -> Result<()>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<()>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<()>;

    /// Clean up the node
    fn on_cleanup(&mut self) -> Result<()>;

    /// Name used in logs
    fn name(&self) -> &str;

    /// Convert to Any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Base implementation for lifecycle nodes
#[derive(Debug)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

impl LifecycleNodeBase {
    /// Create a new lifecycle node base
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    /// Get the current state
    pub fn get_state(&self) -> State {
        self.state
    }

    /// Set the state
    pub fn set_state(&mut self, state: State) {
        if state != self.state {
            info!("{}: {:?} -> {:?}", self.name, self.state, state);
        }
        self.state = state;
    }

    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }
}
