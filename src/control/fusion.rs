//! Fusion of manual and remote commands
//!
//! Each axis (drive, look) holds the last command written to it, whichever
//! source wrote it. Releasing an axis resets it to neutral instead of
//! holding the last value. Commands with NaN or infinite fields are dropped
//! and the axis keeps its previous value.

use crate::channel::PendingCommands;
use crate::common::{DriveCommand, LookCommand};
use tracing::{debug, warn};

/// Who last wrote an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    /// Never written, or released by the operator
    Neutral,
    Manual,
    External,
}

/// Last-writer-wins command state per axis
#[derive(Debug, Clone)]
pub struct CommandFusion {
    drive: DriveCommand,
    drive_source: CommandSource,
    look: LookCommand,
    look_source: CommandSource,
}

impl Default for CommandFusion {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandFusion {
    pub fn new() -> Self {
        CommandFusion {
            drive: DriveCommand::zero(),
            drive_source: CommandSource::Neutral,
            look: LookCommand::zero(),
            look_source: CommandSource::Neutral,
        }
    }

    pub fn set_manual_drive(&mut self, cmd: DriveCommand) {
        self.write_drive(cmd, CommandSource::Manual);
    }

    pub fn set_manual_look(&mut self, cmd: LookCommand) {
        self.write_look(cmd, CommandSource::Manual);
    }

    /// Operator let go of the drive stick
    pub fn release_drive(&mut self) {
        self.write_drive(DriveCommand::zero(), CommandSource::Neutral);
    }

    /// Operator let go of the look stick
    pub fn release_look(&mut self) {
        self.write_look(LookCommand::zero(), CommandSource::Neutral);
    }

    /// Apply remote commands; absent axes are left alone
    pub fn apply_external(&mut self, pending: PendingCommands) {
        if let Some(drive) = pending.drive {
            self.write_drive(drive, CommandSource::External);
        }
        if let Some(look) = pending.look {
            self.write_look(look, CommandSource::External);
        }
    }

    /// The authoritative command pair for this tick
    pub fn fused(&self) -> (DriveCommand, LookCommand) {
        (self.drive, self.look)
    }

    pub fn drive_source(&self) -> CommandSource {
        self.drive_source
    }

    pub fn look_source(&self) -> CommandSource {
        self.look_source
    }

    fn write_drive(&mut self, cmd: DriveCommand, source: CommandSource) {
        if !cmd.is_finite() {
            warn!("Ignoring non-finite {:?} drive command {:?}", source, cmd);
            return;
        }
        if source != self.drive_source {
            debug!("Drive axis: {:?} -> {:?}", self.drive_source, source);
        }
        self.drive = cmd;
        self.drive_source = source;
    }

    fn write_look(&mut self, cmd: LookCommand, source: CommandSource) {
        if !cmd.is_finite() {
            warn!("Ignoring non-finite {:?} look command {:?}", source, cmd);
            return;
        }
        if source != self.look_source {
            debug!("Look axis: {:?} -> {:?}", self.look_source, source);
        }
        self.look = cmd;
        self.look_source = source;
    }
}
