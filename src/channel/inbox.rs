//! Latest-value mailbox between the transport and the tick loop
//!
//! Only the newest unconsumed command per axis is kept. Older values are
//! overwritten, never queued, so there is nothing to backpressure.

use super::wire::ControlMessage;
use crate::common::{DriveCommand, LookCommand};
use std::sync::Mutex;

/// Commands received since the tick loop last looked
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PendingCommands {
    pub drive: Option<DriveCommand>,
    pub look: Option<LookCommand>,
}

impl PendingCommands {
    pub fn is_empty(&self) -> bool {
        self.drive.is_none() && self.look.is_none()
    }
}

#[derive(Debug, Default)]
pub struct CommandInbox {
    pending: Mutex<PendingCommands>,
}

impl CommandInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a received message; present axes replace whatever is pending
    pub fn post(&self, msg: &ControlMessage) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(drive) = msg.drive {
            pending.drive = Some(drive);
        }
        if let Some(look) = msg.look {
            pending.look = Some(look);
        }
    }

    /// Remove and return everything pending
    pub fn take(&self) -> PendingCommands {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *pending)
    }
}
