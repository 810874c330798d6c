use std::path::{Path, PathBuf};

use crate::error::PilotError;
use crate::frame::Frame;

/// An on-disk record of every turn: the screen that was sent to the model (`turn_NNN.png`) and
/// the reply that came back (`turn_NNN.txt`). Useful for looking back at why a run went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionJournal {
    dir: PathBuf,
}

impl DecisionJournal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_frame(&self, turn: u64, frame: &Frame) -> Result<PathBuf, PilotError> {
        let data = frame.to_png()?;
        self.write(self.turn_path(turn, "png"), &data)
    }

    pub fn record_decision(&self, turn: u64, reply: &str) -> Result<PathBuf, PilotError> {
        self.write(self.turn_path(turn, "txt"), reply.as_bytes())
    }

    fn turn_path(&self, turn: u64, ext: &str) -> PathBuf {
        self.dir.join(format!("turn_{turn:03}.{ext}"))
    }

    fn write(&self, path: PathBuf, data: &[u8]) -> Result<PathBuf, PilotError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| PilotError::Io {
            path: self.dir.clone(),
            source,
        })?;
        std::fs::write(&path, data).map_err(|source| PilotError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
