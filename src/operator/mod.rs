//! Operator input: stick scaling, gesture commands and the console
pub mod console;
pub mod gesture;
pub mod joystick;

pub use console::OperatorEvent;
pub use gesture::{gesture_command, Gesture};
pub use joystick::{Sensitivity, StickVector};

use crate::control::ControlLoop;

/// Route one operator event into the control loop. Returns false on quit.
pub fn dispatch(
    event: OperatorEvent,
    sensitivity: &Sensitivity,
    control: &mut ControlLoop,
) -> bool {
    match event {
        OperatorEvent::Drive(stick) => control.drive(sensitivity.drive(stick)),
        OperatorEvent::Look(stick) => control.look(sensitivity.look(stick)),
        OperatorEvent::EndDrive => control.release_drive(),
        OperatorEvent::EndLook => control.release_look(),
        OperatorEvent::Stop => {
            control.release_drive();
            control.release_look();
        }
        OperatorEvent::Quit => return false,
    }
    true
}
