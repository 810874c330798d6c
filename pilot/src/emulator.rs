//! The boundary between the decision loop and whatever is actually running the game. The loop
//! never looks inside the emulator; it only advances it, looks at its screen, presses its buttons,
//! and asks it for save states.

use derive_more::{Display, Error};

use crate::action::Button;
use crate::frame::Frame;

/// A running game session. The decision loop owns its emulator for the whole session and calls
/// `shutdown` exactly once when it is done with it.
pub trait Emulator {
    /// Advances the emulation by one step (typically one frame). Returns `false` once the session
    /// has ended, e.g. because the emulator window was closed.
    fn advance(&mut self) -> Result<bool, EmulatorError>;

    /// Captures what is currently on the screen.
    fn capture_frame(&mut self) -> Result<Frame, EmulatorError>;

    /// Taps a button.
    fn apply_input(&mut self, button: Button) -> Result<(), EmulatorError>;

    /// Serializes the full emulator state. The loop treats this as an opaque blob.
    fn save_state(&mut self) -> Result<Vec<u8>, EmulatorError>;

    /// Restores a state previously produced by `save_state`.
    fn load_state(&mut self, state: &[u8]) -> Result<(), EmulatorError>;

    /// Stops the emulator and releases whatever it holds.
    fn shutdown(&mut self);
}

impl<E: Emulator + ?Sized> Emulator for Box<E> {
    fn advance(&mut self) -> Result<bool, EmulatorError> {
        (**self).advance()
    }

    fn capture_frame(&mut self) -> Result<Frame, EmulatorError> {
        (**self).capture_frame()
    }

    fn apply_input(&mut self, button: Button) -> Result<(), EmulatorError> {
        (**self).apply_input(button)
    }

    fn save_state(&mut self) -> Result<Vec<u8>, EmulatorError> {
        (**self).save_state()
    }

    fn load_state(&mut self, state: &[u8]) -> Result<(), EmulatorError> {
        (**self).load_state(state)
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }
}

/// An error reported by an emulator implementation.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("{message}")]
pub struct EmulatorError {
    message: String,
}

impl EmulatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for EmulatorError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<crate::frame::FrameError> for EmulatorError {
    fn from(err: crate::frame::FrameError) -> Self {
        Self::new(err.to_string())
    }
}
