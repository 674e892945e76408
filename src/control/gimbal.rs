//! Pan/tilt camera head
//!
//! Direct positional control: the commanded angles are applied as-is on the
//! next tick, with no rate limiting and no range checks. Range limiting
//! happens upstream in the operator sensitivity scaling.

use crate::common::LookCommand;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GimbalController {
    pan: f64,
    tilt: f64,
}

impl GimbalController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the head to the commanded angles, returning (pan, tilt) in degrees
    pub fn apply(&mut self, look: LookCommand) -> (f64, f64) {
        self.pan = look.pan;
        self.tilt = look.tilt;
        (self.pan, self.tilt)
    }

    pub fn pan(&self) -> f64 {
        self.pan
    }

    pub fn tilt(&self) -> f64 {
        self.tilt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applies_immediately() {
        let mut gimbal = GimbalController::new();
        assert_eq!(gimbal.apply(LookCommand::new(-90.0, 45.0)), (-90.0, 45.0));
        assert_eq!(gimbal.apply(LookCommand::new(10.0, -5.0)), (10.0, -5.0));
        assert_eq!(gimbal.pan(), 10.0);
        assert_eq!(gimbal.tilt(), -5.0);
    }

    #[test]
    fn test_not_revalidated() {
        let mut gimbal = GimbalController::new();
        assert_eq!(gimbal.apply(LookCommand::new(400.0, -200.0)), (400.0, -200.0));
    }
}
