use std::path::PathBuf;

use derive_more::{Display, Error};

use crate::emulator::EmulatorError;
use crate::frame::FrameError;

#[derive(Debug, Display, Error)]
pub enum PilotError {
    #[display("emulator fault: {source}")]
    Emulator { source: EmulatorError },
    #[display("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[display("could not parse the config at {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[display("invalid config: {reason}")]
    InvalidConfig { reason: String },
    #[display("{source}")]
    Frame { source: FrameError },
    #[display("could not install the tracing subscriber: {source}")]
    Logging {
        source: tracing::subscriber::SetGlobalDefaultError,
    },
    #[display("the decision loop panicked: {message}")]
    Panicked { message: String },
}

impl From<EmulatorError> for PilotError {
    fn from(source: EmulatorError) -> Self {
        Self::Emulator { source }
    }
}

impl From<FrameError> for PilotError {
    fn from(source: FrameError) -> Self {
        Self::Frame { source }
    }
}
