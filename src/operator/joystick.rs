//! Joystick vector scaling
//!
//! Sticks report a normalized vector with `x` to the right and `y` up, each
//! in `[-1, 1]`. Scaling maps full deflection to the configured maximum.

use crate::common::{DriveCommand, LookCommand};
use crate::config::SensitivityConfig;

/// A normalized stick deflection
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickVector {
    pub x: f64,
    pub y: f64,
}

impl StickVector {
    pub fn new(x: f64, y: f64) -> Self {
        StickVector { x, y }
    }

    /// Components limited to `[-1, 1]`; NaN reads as centered
    pub fn clamped(&self) -> Self {
        let limit = |c: f64| if c.is_nan() { 0.0 } else { c.clamp(-1.0, 1.0) };
        StickVector {
            x: limit(self.x),
            y: limit(self.y),
        }
    }
}

/// Per-axis scale factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    pub max_linear_speed: f64,
    pub max_turn_rate: f64,
    pub max_pan: f64,
    pub max_tilt: f64,
}

impl Sensitivity {
    pub fn from_config(config: &SensitivityConfig) -> Self {
        Sensitivity {
            max_linear_speed: config.max_linear_speed,
            max_turn_rate: config.max_turn_rate,
            max_pan: config.max_pan,
            max_tilt: config.max_tilt,
        }
    }

    /// Stick up drives forward; stick right turns clockwise
    pub fn drive(&self, stick: StickVector) -> DriveCommand {
        let s = stick.clamped();
        DriveCommand::new(s.y * self.max_linear_speed, -s.x * self.max_turn_rate)
    }

    /// Stick right pans clockwise; stick up tilts up
    pub fn look(&self, stick: StickVector) -> LookCommand {
        let s = stick.clamped();
        LookCommand::new(-s.x * self.max_pan, s.y * self.max_tilt)
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self::from_config(&SensitivityConfig::default())
    }
}
