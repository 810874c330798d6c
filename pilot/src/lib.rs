//! Pilot plays a Gameboy game by asking a vision model what to do.
//!
//! Every so often, the [`DecisionLoop`] captures the emulator's screen and sends it, along with a
//! short history of past decisions, to an [`Oracle`]. When the oracle's free-text reply comes back,
//! it is [`translate`]d into a button press and applied. The loop keeps going in between; at most
//! one request is ever in flight (see [`InferenceGate`]).
//!
//! The emulator and the model are both external to this crate. They are reached through the
//! [`Emulator`] and [`Oracle`] traits.
//!
//! An embedder loads the config, installs logging, and hands its emulator and a vision client
//! (such as `seer::VisionClient`) to the loop:
//!
//! ```ignore
//! let config = PilotConfig::load("pilot.toml")?;
//! pilot::logging::init(config.log_level()?)?;
//! let oracle = Arc::new(seer::VisionClient::new(SeerConfig::load("seer.toml")?)?);
//! let summary = DecisionLoop::new(&config, my_emulator, oracle)?.run().await?;
//! ```

pub mod action;
pub mod config;
pub mod driver;
pub mod emulator;
pub mod error;
pub mod frame;
pub mod gate;
pub mod history;
pub mod journal;
pub mod logging;
pub mod snapshot;

pub use action::{translate, Action, Button};
pub use config::{PilotConfig, MAX_FRAME_SCALE};
pub use driver::{DecisionLoop, LoopState, RunSummary, StopReason};
pub use emulator::{Emulator, EmulatorError};
pub use error::PilotError;
pub use frame::{Frame, FrameError, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use gate::{
    BoxError, Decision, DecisionRequest, InferenceGate, Mailbox, Oracle, OracleFuture,
    PendingInference,
};
pub use history::{HistoryEntry, RollingHistory};
pub use journal::DecisionJournal;
pub use snapshot::{SaveSlot, SnapshotPolicy};
