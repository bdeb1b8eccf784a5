//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `stovepanel.toml` in the working directory unless another path
//! is given on the command line. Every field has a sensible default so the
//! file is optional. Environment variables take precedence over file values.

use std::path::Path;

use serde::Deserialize;
use stovepanel_adapter_virtual::Seed;
use stovepanel_app::settings::EngineSettings;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Cycle tunables.
    pub engine: EngineConfig,
    /// Initial state of the simulated stove and thermostats.
    pub simulation: Seed,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Engine cycle tunables, in whole minutes and seconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_reapply_interval_minutes: i64,
    pub pause_duration_minutes: i64,
    pub boost_max_duration_minutes: i64,
    pub cycle_timeout_seconds: u64,
    pub control_interval_minutes: i64,
    pub integral_limit: f64,
    pub stale_intervals: i32,
    /// Run the three cycles every control interval while serving, instead
    /// of waiting for external triggers.
    pub autorun: bool,
}

impl Config {
    /// Load configuration from `path` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value is out of range.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("STOVEPANEL_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("STOVEPANEL_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("STOVEPANEL_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("STOVEPANEL_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("STOVEPANEL_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        self.engine.validate()
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let minutes = [
            ("min_reapply_interval_minutes", self.min_reapply_interval_minutes),
            ("pause_duration_minutes", self.pause_duration_minutes),
            ("boost_max_duration_minutes", self.boost_max_duration_minutes),
            ("control_interval_minutes", self.control_interval_minutes),
        ];
        for (name, value) in minutes {
            if value <= 0 {
                return Err(ConfigError::Validation(format!("{name} must be positive")));
            }
        }
        if self.cycle_timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "cycle_timeout_seconds must be positive".to_string(),
            ));
        }
        if !self.integral_limit.is_finite() || self.integral_limit <= 0.0 {
            return Err(ConfigError::Validation(
                "integral_limit must be a positive number".to_string(),
            ));
        }
        if self.stale_intervals < 1 {
            return Err(ConfigError::Validation(
                "stale_intervals must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert to the settings consumed by the cycles.
    #[must_use]
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            min_reapply_interval: chrono::Duration::minutes(self.min_reapply_interval_minutes),
            pause_duration: chrono::Duration::minutes(self.pause_duration_minutes),
            boost_max_duration: chrono::Duration::minutes(self.boost_max_duration_minutes),
            cycle_timeout: std::time::Duration::from_secs(self.cycle_timeout_seconds),
            control_interval: chrono::Duration::minutes(self.control_interval_minutes),
            integral_limit: self.integral_limit,
            stale_intervals: self.stale_intervals,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:stovepanel.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "stovepaneld=info,stovepanel=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let defaults = EngineSettings::default();
        Self {
            min_reapply_interval_minutes: defaults.min_reapply_interval.num_minutes(),
            pause_duration_minutes: defaults.pause_duration.num_minutes(),
            boost_max_duration_minutes: defaults.boost_max_duration.num_minutes(),
            cycle_timeout_seconds: defaults.cycle_timeout.as_secs(),
            control_interval_minutes: defaults.control_interval.num_minutes(),
            integral_limit: defaults.integral_limit,
            stale_intervals: defaults.stale_intervals,
            autorun: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
