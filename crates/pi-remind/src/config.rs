use remind_core::{ReminderPolicy, Thresholds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Calendar to watch
    pub calendar_id: String,

    /// How far ahead to ask the calendar for events (minutes)
    pub lookahead_minutes: u32,

    /// Whether events need a reminder set before they light the panel
    pub reminder_policy: ReminderPolicy,

    /// How often the loop checks for a minute rollover (milliseconds)
    pub tick_interval_ms: u64,

    /// Upper bound on a single calendar query (seconds)
    pub query_timeout_secs: u64,

    /// Global LED brightness, 0.0 to 1.0
    pub brightness: f32,

    /// Minute thresholds between the white, yellow and swirl alerts
    pub thresholds: Thresholds,

    pub auth: AuthConfig,

    pub reboot: RebootConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Path to Google OAuth client credentials JSON file
    pub client_secret_path: String,

    /// Path to store the OAuth token cache. A leading `~` is expanded.
    pub token_cache_path: String,
}

/// Restart the device after repeated query failures. Off by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebootConfig {
    pub enabled: bool,

    /// Consecutive failures that trigger the restart
    pub max_retries: u32,

    /// Seconds to count down before restarting
    pub countdown_secs: u64,

    /// Program and arguments run to restart
    pub command: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calendar_id: "primary".to_string(),
            lookahead_minutes: 10,
            reminder_policy: ReminderPolicy::Required,
            tick_interval_ms: 1000,
            query_timeout_secs: 10,
            brightness: 0.75,
            thresholds: Thresholds::default(),
            auth: AuthConfig::default(),
            reboot: RebootConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_secret_path: "client_secret.json".to_string(),
            token_cache_path: "~/.credentials/pi_remind.json".to_string(),
        }
    }
}

impl Default for RebootConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: 10,
            countdown_secs: 9,
            command: vec!["sudo".to_string(), "reboot".to_string()],
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|err| match err {
            ParseFailure::Toml(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ParseFailure::Invalid(err) => err,
        })?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file means "use the defaults".
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn parse(content: &str) -> Result<Self, ParseFailure> {
        let config: Config = toml::from_str(content).map_err(ParseFailure::Toml)?;
        config.validate().map_err(ParseFailure::Invalid)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calendar_id.trim().is_empty() {
            return Err(ConfigError::invalid("calendar_id must not be empty"));
        }
        if self.lookahead_minutes == 0 {
            return Err(ConfigError::invalid("lookahead_minutes must be at least 1"));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("tick_interval_ms must be at least 1"));
        }
        if self.query_timeout_secs == 0 {
            return Err(ConfigError::invalid("query_timeout_secs must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.brightness) {
            return Err(ConfigError::invalid(format!(
                "brightness must be between 0.0 and 1.0, got {}",
                self.brightness
            )));
        }
        if !self.thresholds.is_valid() {
            return Err(ConfigError::invalid(format!(
                "thresholds.second ({}) must be below thresholds.first ({})",
                self.thresholds.second, self.thresholds.first
            )));
        }
        if self.reboot.max_retries == 0 {
            return Err(ConfigError::invalid("reboot.max_retries must be at least 1"));
        }
        if self.reboot.command.is_empty() {
            return Err(ConfigError::invalid("reboot.command must not be empty"));
        }
        Ok(())
    }

    pub fn lookahead(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.lookahead_minutes))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Ceiling for consecutive failures, or `None` when restarts are off
    pub fn escalation_ceiling(&self) -> Option<u32> {
        self.reboot.enabled.then_some(self.reboot.max_retries)
    }

    pub fn example() -> Self {
        Config {
            reboot: RebootConfig {
                enabled: true,
                ..RebootConfig::default()
            },
            ..Config::default()
        }
    }
}

impl AuthConfig {
    pub fn token_cache_path(&self) -> PathBuf {
        expand_home(&self.token_cache_path)
    }
}

#[derive(Debug)]
enum ParseFailure {
    Toml(toml::de::Error),
    Invalid(ConfigError),
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}
