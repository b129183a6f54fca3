//! Game configuration.

use crate::error::ConfigError;
use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Longest time control a game may be configured with.
pub const MAX_TIME_CONTROL: Duration = Duration::from_secs(60 * 60);

/// Time allowed before the first move, after which the game is aborted.
pub const DEFAULT_FIRST_MOVE_TIMEOUT: Duration = Duration::from_secs(60);

/// Red marbles a player must push off to win.
pub const DEFAULT_WIN_THRESHOLD: u32 = 7;

/// Settings shared by a game and every rematch that follows it.
///
/// ```toml
/// time_control_ms = 300000
/// first_move_timeout_ms = 60000
/// win_threshold = 7
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct GameConfig {
    /// Thinking time each player starts with.
    #[serde(rename = "time_control_ms", with = "duration_ms")]
    time_control: Duration,

    /// Time allowed for White's first move.
    #[serde(
        rename = "first_move_timeout_ms",
        with = "duration_ms",
        default = "default_first_move_timeout"
    )]
    first_move_timeout: Duration,

    /// Score needed to win.
    #[serde(default = "default_win_threshold")]
    win_threshold: u32,
}

fn default_first_move_timeout() -> Duration {
    DEFAULT_FIRST_MOVE_TIMEOUT
}

fn default_win_threshold() -> u32 {
    DEFAULT_WIN_THRESHOLD
}

impl GameConfig {
    /// Creates a configuration with the given time control and default
    /// first-move timeout and win threshold.
    pub fn new(time_control: Duration) -> Self {
        Self {
            time_control,
            first_move_timeout: DEFAULT_FIRST_MOVE_TIMEOUT,
            win_threshold: DEFAULT_WIN_THRESHOLD,
        }
    }

    /// Checks that the settings describe a playable game.
    #[instrument(skip(self), fields(time_control = ?self.time_control))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_control.is_zero() || self.time_control > MAX_TIME_CONTROL {
            return Err(ConfigError::new("time control should be > 0s and <= 1hr"));
        }
        if self.first_move_timeout.is_zero() {
            return Err(ConfigError::new("first move timeout should be > 0s"));
        }
        if self.win_threshold == 0 {
            return Err(ConfigError::new("win threshold should be at least 1"));
        }
        Ok(())
    }

    /// Loads and validates configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;

        info!(
            time_control = ?config.time_control,
            win_threshold = config.win_threshold,
            "Config loaded successfully"
        );
        Ok(config)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(5 * 60))
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
