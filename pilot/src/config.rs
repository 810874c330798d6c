//! The settings for a single autopilot session. Every field has a default, so an empty file is a
//! valid config.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::error::PilotError;

/// The largest factor frames may be scaled up by.
pub const MAX_FRAME_SCALE: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PilotConfig {
    /// Where the session's save state lives. Loaded on start, written periodically and on exit.
    pub save_state_path: PathBuf,
    /// A decision is requested every this many ticks (if none is already in flight).
    pub decision_interval: u64,
    /// The state is saved every this many ticks. Zero only saves on exit.
    pub snapshot_interval: u64,
    /// How many past decisions are sent along with each frame.
    pub history_capacity: usize,
    /// The pause between ticks, in milliseconds.
    pub pace_ms: u64,
    /// How long the model gets to answer before the request is given up on. Zero waits forever.
    pub inference_timeout_secs: u64,
    /// The factor frames are scaled up by before they are sent to the model. At most
    /// [`MAX_FRAME_SCALE`].
    pub frame_scale: usize,
    /// If set, each turn's frame and reply are written here.
    pub journal_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            save_state_path: PathBuf::from("saves/pokemon_blue.state"),
            decision_interval: 300,
            snapshot_interval: 18_000,
            history_capacity: 10,
            pace_ms: 5,
            inference_timeout_secs: 60,
            frame_scale: 1,
            journal_dir: None,
            log_level: "info".to_owned(),
        }
    }
}

impl PilotConfig {
    /// Reads and validates the config at the given path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PilotError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| PilotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&data).map_err(|source| PilotError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }

    pub fn validate(&self) -> Result<(), PilotError> {
        let reason = if self.decision_interval == 0 {
            "decision_interval must be at least 1"
        } else if self.history_capacity == 0 {
            "history_capacity must be at least 1"
        } else if self.frame_scale == 0 {
            "frame_scale must be at least 1"
        } else if self.frame_scale > MAX_FRAME_SCALE {
            "frame_scale must be at most 8"
        } else {
            return self.log_level().map(drop);
        };
        Err(PilotError::InvalidConfig {
            reason: reason.to_owned(),
        })
    }

    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        (self.inference_timeout_secs > 0).then(|| Duration::from_secs(self.inference_timeout_secs))
    }

    pub fn log_level(&self) -> Result<LevelFilter, PilotError> {
        LevelFilter::from_str(&self.log_level).map_err(|_| PilotError::InvalidConfig {
            reason: format!("unknown log level {:?}", self.log_level),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_all_defaults() {
        let config = PilotConfig::from_toml_str("").unwrap();
        assert_eq!(config, PilotConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.pace(), Duration::from_millis(5));
        assert_eq!(config.inference_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.log_level().unwrap(), LevelFilter::INFO);
    }

    #[test]
    fn fields_can_be_overridden() {
        let config = PilotConfig::from_toml_str(
            r#"
            save_state_path = "runs/red.state"
            decision_interval = 120
            snapshot_interval = 0
            inference_timeout_secs = 0
            journal_dir = "logs"
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.save_state_path, Path::new("runs/red.state"));
        assert_eq!(config.decision_interval, 120);
        assert_eq!(config.snapshot_interval, 0);
        assert_eq!(config.inference_timeout(), None);
        assert_eq!(config.journal_dir.as_deref(), Some(Path::new("logs")));
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.log_level().unwrap(), LevelFilter::DEBUG);
    }

    #[test]
    fn typos_are_rejected() {
        assert!(PilotConfig::from_toml_str("decison_interval = 5").is_err());
    }

    #[test]
    fn degenerate_values_fail_validation() {
        for config in [
            PilotConfig {
                decision_interval: 0,
                ..Default::default()
            },
            PilotConfig {
                history_capacity: 0,
                ..Default::default()
            },
            PilotConfig {
                frame_scale: 0,
                ..Default::default()
            },
            PilotConfig {
                frame_scale: MAX_FRAME_SCALE + 1,
                ..Default::default()
            },
            PilotConfig {
                frame_scale: usize::MAX,
                ..Default::default()
            },
            PilotConfig {
                log_level: "chatty".into(),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                config.validate(),
                Err(PilotError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn largest_frame_scale_is_accepted() {
        let config = PilotConfig {
            frame_scale: MAX_FRAME_SCALE,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pilot.toml");
        std::fs::write(&path, "decision_interval = \"often\"").unwrap();
        let err = PilotConfig::load(&path).unwrap_err();
        assert!(matches!(err, PilotError::Config { .. }));
        assert!(err.to_string().contains("pilot.toml"));

        let err = PilotConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, PilotError::Io { .. }));
    }
}
