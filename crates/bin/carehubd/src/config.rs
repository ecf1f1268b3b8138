//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `carehub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Shift compliance settings.
    pub compliance: ComplianceConfig,
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

/// Shift compliance configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Maximum scheduled hours per staff member and calendar day.
    pub max_daily_hours: u32,
}

impl Config {
    /// Load configuration from `carehub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting values fail validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("carehub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("CAREHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("CAREHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("CAREHUB_MAX_DAILY_HOURS")
            && let Ok(hours) = val.parse()
        {
            self.compliance.max_daily_hours = hours;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.compliance.max_daily_hours == 0 || self.compliance.max_daily_hours > 24 {
            return Err(ConfigError::Validation(format!(
                "max_daily_hours must be between 1 and 24, got {}",
                self.compliance.max_daily_hours
            )));
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:carehub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "carehubd=info,carehub_app=info,carehub_adapter_storage_sqlite_sqlx=info"
                .to_string(),
        }
    }
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self { max_daily_hours: 8 }
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
