//! Playback configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which players the controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivePlayers {
    Particles,
    Mesh,
    Both,
}

impl ActivePlayers {
    pub fn particles(&self) -> bool {
        matches!(self, ActivePlayers::Particles | ActivePlayers::Both)
    }

    pub fn mesh(&self) -> bool {
        matches!(self, ActivePlayers::Mesh | ActivePlayers::Both)
    }
}

impl std::str::FromStr for ActivePlayers {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "particles" | "particle" => Ok(ActivePlayers::Particles),
            "mesh" | "terrain" => Ok(ActivePlayers::Mesh),
            "both" | "all" => Ok(ActivePlayers::Both),
            _ => Err(format!("Unknown player set: {}", s)),
        }
    }
}

/// What happens when the frame index reaches the total frame count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EndBehavior {
    /// Jump back to `restart_index` and keep playing
    Loop { restart_index: u32 },

    /// Hold the last frame and stop advancing
    Stop,
}

impl Default for EndBehavior {
    fn default() -> Self {
        EndBehavior::Loop { restart_index: 1 }
    }
}

/// Startup configuration for a playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Number of particle entities (must match every particle frame)
    pub pool_size: usize,

    /// Number of frames on disk; playback index stays in 0..total_frames
    pub total_frames: u32,

    /// Seconds between frame advances
    pub tick_interval_secs: f64,

    /// Directory holding the frame files
    pub base_path: PathBuf,

    /// Players to drive
    pub players: ActivePlayers,

    /// Behavior at the frame bound
    pub end_behavior: EndBehavior,

    /// Read each frame one ahead on a worker thread
    pub prefetch: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            pool_size: 400,
            total_frames: 100,
            tick_interval_secs: 1.0 / 60.0,
            base_path: PathBuf::from("Assets/Positions"),
            players: ActivePlayers::Particles,
            end_behavior: EndBehavior::default(),
            prefetch: false,
        }
    }
}

impl PlaybackConfig {
    /// Parses a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_total_frames(mut self, total_frames: u32) -> Self {
        self.total_frames = total_frames;
        self
    }

    pub fn with_tick_interval(mut self, secs: f64) -> Self {
        self.tick_interval_secs = secs;
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_players(mut self, players: ActivePlayers) -> Self {
        self.players = players;
        self
    }

    pub fn with_end_behavior(mut self, end_behavior: EndBehavior) -> Self {
        self.end_behavior = end_behavior;
        self
    }

    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Checks every option; runs before any player is created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.players.particles() && self.pool_size == 0 {
            return Err(ConfigError::ZeroPoolSize);
        }
        if self.total_frames == 0 {
            return Err(ConfigError::ZeroFrames);
        }
        self.tick_interval()?;
        if let EndBehavior::Loop { restart_index } = self.end_behavior {
            if restart_index >= self.total_frames {
                return Err(ConfigError::RestartOutOfRange {
                    restart: restart_index,
                    total: self.total_frames,
                });
            }
        }
        Ok(())
    }

    /// Tick interval as a `Duration`.
    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        let secs = self.tick_interval_secs;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ConfigError::InvalidInterval(secs));
        }
        match Duration::try_from_secs_f64(secs) {
            Ok(d) if !d.is_zero() => Ok(d),
            _ => Err(ConfigError::InvalidInterval(secs)),
        }
    }
}
