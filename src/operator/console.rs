//! Line-oriented operator console
//!
//! Stands in for the on-screen joysticks when running headless:
//!
//! ```text
//! drive <x> <y>     drive stick deflection, each in [-1, 1]
//! look <x> <y>      look stick deflection
//! end drive         release the drive stick
//! end look          release the look stick
//! stop              release both
//! quit              shut down
//! ```

use super::joystick::StickVector;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatorEvent {
    Drive(StickVector),
    Look(StickVector),
    EndDrive,
    EndLook,
    Stop,
    Quit,
}

impl FromStr for OperatorEvent {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["drive", x, y] => Ok(OperatorEvent::Drive(parse_stick(x, y)?)),
            ["look", x, y] => Ok(OperatorEvent::Look(parse_stick(x, y)?)),
            ["end", "drive"] => Ok(OperatorEvent::EndDrive),
            ["end", "look"] => Ok(OperatorEvent::EndLook),
            ["stop"] => Ok(OperatorEvent::Stop),
            ["quit"] | ["exit"] => Ok(OperatorEvent::Quit),
            [] => Err("empty command".to_string()),
            [verb, ..] => Err(format!("unrecognized command '{}'", verb)),
        }
    }
}

fn parse_stick(x: &str, y: &str) -> Result<StickVector, String> {
    let parse = |s: &str| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{}' is not a number", s))
    };
    Ok(StickVector::new(parse(x)?, parse(y)?))
}
