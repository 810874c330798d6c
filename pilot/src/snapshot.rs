//! Decides when the emulator's state gets saved and where it goes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::emulator::Emulator;
use crate::error::PilotError;

/// Tracks when the last periodic snapshot was taken. An interval of zero turns periodic snapshots
/// off; the decision loop still takes one on shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    interval: u64,
    last_snapshot: u64,
}

impl SnapshotPolicy {
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            last_snapshot: 0,
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.interval > 0
    }

    pub fn last_snapshot(&self) -> u64 {
        self.last_snapshot
    }

    pub fn is_due(&self, tick: u64) -> bool {
        self.is_enabled() && tick.saturating_sub(self.last_snapshot) >= self.interval
    }

    /// Records that a snapshot was attempted on the given tick. This is called whether or not the
    /// write succeeded, so a failing disk is retried once per interval rather than every tick.
    pub fn record(&mut self, tick: u64) {
        self.last_snapshot = tick;
    }
}

/// The on-disk home of a session's save state: a single opaque blob at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSlot {
    path: PathBuf,
}

impl SaveSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the emulator's current state into the slot, creating the parent directory if
    /// needed. Returns the number of bytes written.
    pub fn persist<E: Emulator + ?Sized>(&self, emulator: &mut E) -> Result<usize, PilotError> {
        let state = emulator.save_state()?;
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| PilotError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, &state).map_err(|source| PilotError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(state.len())
    }

    /// Loads the slot into the emulator. Returns `false` if there is nothing saved yet.
    pub fn restore<E: Emulator + ?Sized>(&self, emulator: &mut E) -> Result<bool, PilotError> {
        let state = match std::fs::read(&self.path) {
            Ok(state) => state,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
            Err(source) => {
                return Err(PilotError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        emulator.load_state(&state)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_interval_crossing() {
        let mut policy = SnapshotPolicy::new(100);
        let mut fired = Vec::new();
        for tick in 1..=250 {
            if policy.is_due(tick) {
                fired.push(tick);
                policy.record(tick);
            }
        }
        assert_eq!(fired, [100, 200]);
        assert_eq!(policy.last_snapshot(), 200);
    }

    #[test]
    fn zero_interval_never_fires() {
        let policy = SnapshotPolicy::new(0);
        assert!(!policy.is_enabled());
        assert!((0..10_000).all(|tick| !policy.is_due(tick)));
    }

    #[test]
    fn interval_is_measured_from_the_last_snapshot() {
        let mut policy = SnapshotPolicy::new(10);
        policy.record(15);
        assert!(!policy.is_due(24));
        assert!(policy.is_due(25));
        // A tick counter that somehow goes backwards never underflows
        assert!(!policy.is_due(3));
    }
}
