//! JSON wire format for control messages
//!
//! One message per line, identical in both directions:
//!
//! ```text
//! {"type": "control", "move": {"v": 120.0, "w": 0.5}, "look": {"pan": -30.0, "tilt": 10.0}}
//! ```
//!
//! `move` and `look` are optional; an absent (or null) axis means "no change".
//! There are no acknowledgements, sequence numbers or version fields, and
//! unknown fields are ignored.

use crate::common::{DriveCommand, LookCommand};
use crate::error::ChannelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminant carried by every control message
pub const CONTROL_TYPE: &str = "control";

/// A control update for zero, one or both axes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub drive: Option<DriveCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub look: Option<LookCommand>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Envelope {
    Control(ControlMessage),
}

impl ControlMessage {
    pub fn drive(cmd: DriveCommand) -> Self {
        ControlMessage {
            drive: Some(cmd),
            look: None,
        }
    }

    pub fn look(cmd: LookCommand) -> Self {
        ControlMessage {
            drive: None,
            look: Some(cmd),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.drive.is_none() && self.look.is_none()
    }

    /// Encode as a single JSON line, without the trailing newline
    pub fn encode(&self) -> String {
        // Plain structs of finite floats always serialize; non-finite values become null
        serde_json::to_string(&Envelope::Control(*self)).unwrap_or_default()
    }

    /// Decode one inbound payload
    pub fn decode(payload: &str) -> Result<Self, ChannelError> {
        let value: Value = serde_json::from_str(payload.trim())
            .map_err(|e| ChannelError::MalformedPayload(e.to_string()))?;

        let Value::Object(ref fields) = value else {
            return Err(ChannelError::MalformedPayload(
                "expected a JSON object".to_string(),
            ));
        };

        match fields.get("type") {
            Some(Value::String(kind)) if kind == CONTROL_TYPE => {}
            Some(Value::String(kind)) => return Err(ChannelError::UnknownType(kind.clone())),
            Some(other) => return Err(ChannelError::UnknownType(other.to_string())),
            None => return Err(ChannelError::UnknownType("<missing>".to_string())),
        }

        serde_json::from_value(value).map_err(|e| ChannelError::MalformedPayload(e.to_string()))
    }
}
