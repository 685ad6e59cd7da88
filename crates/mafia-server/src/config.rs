//! Server configuration: the TOML file and the settings derived from it.
//!
//! ```toml
//! [server]
//! port = 5000
//! max_workers = 10
//! update_interval_secs = 1.0
//!
//! [roles]
//! mafia = 1
//! sheriff = 1
//! civilian = 2
//! ```
//!
//! Every key is optional; missing keys take the defaults above. A missing
//! file is not an error either: the server starts with defaults.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mafia_session::RoleCounts;
use serde::{Deserialize, Serialize};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "mafia.toml";

/// Interval between chat heartbeat messages.
pub const DEFAULT_CHAT_INTERVAL: Duration = Duration::from_secs(5);

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML or has wrongly typed values.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

/// The `[server]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Port to listen on (all interfaces).
    pub port: u16,

    /// Number of Tokio worker threads.
    pub max_workers: usize,

    /// Seconds between snapshot pushes. Fractions allowed.
    pub update_interval_secs: f64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: 5000,
            max_workers: 10,
            update_interval_secs: 1.0,
        }
    }
}

/// The whole config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub roles: RoleCounts,
}

impl ServerConfig {
    /// Loads and validates the config at `path`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_toml_str(&text)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges the type system can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let interval = self.server.update_interval_secs;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "update_interval_secs must be a positive number, got {interval}"
            )));
        }
        if let Err(e) = Duration::try_from_secs_f64(interval) {
            return Err(ConfigError::Invalid(format!(
                "update_interval_secs {interval} is out of range: {e}"
            )));
        }
        if self.server.max_workers == 0 {
            return Err(ConfigError::Invalid("max_workers must be at least 1".into()));
        }
        if self.roles.capacity() == 0 {
            return Err(ConfigError::Invalid("a game needs at least one seat".into()));
        }
        Ok(())
    }

    /// `0.0.0.0:{port}`.
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.server.port)
    }

    /// The runtime settings handed to the server builder. Intended for a
    /// validated config; an unusable interval falls back to 1 s.
    pub fn game_settings(&self) -> GameSettings {
        let secs = self.server.update_interval_secs;
        let update_interval = Duration::try_from_secs_f64(secs).unwrap_or_else(|_| {
            tracing::warn!(secs, "unusable update interval, falling back to 1s");
            Duration::from_secs(1)
        });
        GameSettings {
            roles: self.roles,
            update_interval,
            chat_interval: DEFAULT_CHAT_INTERVAL,
        }
    }
}

// ---------------------------------------------------------------------------
// GameSettings
// ---------------------------------------------------------------------------

/// Settings every connection handler reads.
#[derive(Debug, Clone)]
pub struct GameSettings {
    /// Seat counts for newly created games.
    pub roles: RoleCounts,

    /// Pause between two snapshot pushes on a join stream.
    pub update_interval: Duration,

    /// Pause between two chat heartbeat messages.
    pub chat_interval: Duration,
}

impl Default for GameSettings {
    fn default() -> Self {
        ServerConfig::default().game_settings()
    }
}
