//! Client configuration.

use crate::difficulty::Difficulty;
use connect_four::Dimensions;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable that overrides [`ClientConfig::base_url`].
pub const SERVER_URL_ENV: &str = "CONNECT_FOUR_SERVER_URL";

/// Smallest board on which four-in-a-row is possible in every direction.
const MIN_SIDE: usize = 4;

/// Endpoint paths, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Endpoints {
    /// Creates a session.
    #[serde(default = "default_new_session_path")]
    new_session: String,

    /// Applies the player's move.
    #[serde(default = "default_move_path")]
    move_path: String,

    /// Requests the opponent's reply when the service left it pending.
    #[serde(default = "default_opponent_reply_path")]
    opponent_reply: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            new_session: default_new_session_path(),
            move_path: default_move_path(),
            opponent_reply: default_opponent_reply_path(),
        }
    }
}

/// Configuration for the resolution client and session controller.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the resolution service.
    #[serde(default = "default_base_url")]
    base_url: String,

    /// Board rows.
    #[serde(default = "default_rows")]
    rows: usize,

    /// Board columns.
    #[serde(default = "default_columns")]
    columns: usize,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    request_timeout_ms: u64,

    /// Attempts per request when the service is unavailable (1 = no retry).
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,

    /// Pause between attempts in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    retry_backoff_ms: u64,

    /// Difficulty used when none is given on the command line.
    #[serde(default)]
    difficulty: Difficulty,

    /// Key of the opener flag in the new-session body (`aiStarts` for the
    /// reference service).
    #[serde(default = "default_opener_field")]
    opener_field: String,

    /// Endpoint paths.
    #[serde(default)]
    endpoints: Endpoints,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_rows() -> usize {
    Dimensions::STANDARD.rows
}

fn default_columns() -> usize {
    Dimensions::STANDARD.columns
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_opener_field() -> String {
    "opponentStartsFirst".to_string()
}

fn default_new_session_path() -> String {
    "new-session".to_string()
}

fn default_move_path() -> String {
    "move".to_string()
}

fn default_opponent_reply_path() -> String {
    "opponent-move".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            rows: default_rows(),
            columns: default_columns(),
            request_timeout_ms: default_request_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            difficulty: Difficulty::default(),
            endpoints: Endpoints::default(),
            opener_field: default_opener_field(),
        }
    }
}

impl ClientConfig {
    /// Creates a default configuration pointing at `base_url`.
    #[instrument(skip(base_url), fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: base_url.as_ref().to_string(),
            ..Self::default()
        }
    }

    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(base_url = %config.base_url, "Config loaded successfully");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, defaults otherwise, then applies
    /// environment overrides.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = if path.as_ref().exists() {
            Self::from_file(path)?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Applies [`SERVER_URL_ENV`] when set.
    #[instrument(skip(self))]
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(SERVER_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => {
                info!(base_url = %url, "Overriding base URL from environment");
                self.with_base_url(url)
            }
            _ => self,
        }
    }

    /// Replaces the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replaces the retry settings.
    pub fn with_retry(mut self, max_attempts: u32, backoff_ms: u64) -> Self {
        self.max_attempts = max_attempts;
        self.retry_backoff_ms = backoff_ms;
        self
    }

    /// Checks value ranges.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows < MIN_SIDE || self.columns < MIN_SIDE {
            return Err(ConfigError::new(format!(
                "Board must be at least {MIN_SIDE}x{MIN_SIDE}, got {}x{}",
                self.rows, self.columns
            )));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::new("max_attempts must be at least 1".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::new("base_url must not be empty".to_string()));
        }
        if self.opener_field.trim().is_empty() {
            return Err(ConfigError::new("opener_field must not be empty".to_string()));
        }
        Ok(())
    }

    /// Board size for every session created with this configuration.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.rows, self.columns)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Retry policy for the session controller.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_backoff_ms))
    }
}

/// How the controller retries a request the service could not serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause between attempts.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
