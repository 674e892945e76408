//! Hand-gesture commands from the computer-vision source
//!
//! A closed fist steers the base and an open palm aims the head, with the
//! hand's offset from frame center acting as the stick vector. The vision
//! source sends whole numbers for speed and head angles, so those are
//! truncated here too.

use super::joystick::{Sensitivity, StickVector};
use crate::channel::ControlMessage;
use crate::common::{DriveCommand, LookCommand};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Fist,
    Palm,
}

impl Gesture {
    /// The control message this gesture produces for a hand offset
    pub fn command(&self, hand: StickVector, sensitivity: &Sensitivity) -> ControlMessage {
        match self {
            Gesture::Fist => {
                let drive = sensitivity.drive(hand);
                ControlMessage::drive(DriveCommand::new(drive.v.trunc(), drive.w))
            }
            Gesture::Palm => {
                let look = sensitivity.look(hand);
                ControlMessage::look(LookCommand::new(look.pan.trunc(), look.tilt.trunc()))
            }
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Gesture::Fist => write!(f, "FIST"),
            Gesture::Palm => write!(f, "PALM"),
        }
    }
}

impl FromStr for Gesture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FIST" => Ok(Gesture::Fist),
            "PALM" => Ok(Gesture::Palm),
            other => Err(format!("unknown gesture '{}'", other)),
        }
    }
}

/// Message for an optional detection; no hand means no message
pub fn gesture_command(
    detection: Option<(Gesture, StickVector)>,
    sensitivity: &Sensitivity,
) -> Option<ControlMessage> {
    detection.map(|(gesture, hand)| gesture.command(hand, sensitivity))
}
