//! Process-level settings
//!
//! Settings load from a YAML file, then environment variables with the
//! `CAPSTAN_` prefix override individual fields. All sections have working
//! defaults so a bare `capstan run ...` works without any settings file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Top-level settings document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapstanSettings {
    pub logging: LoggingSettings,
    pub http: HttpSettings,
    pub execution: ExecutionSettings,
}

impl CapstanSettings {
    fn validate(&self) -> ConfigResult<()> {
        self.http.validate()?;
        self.execution.validate()?;
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default tracing filter, overridable via `CAPSTAN_LOG`
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// User-Agent header for outbound requests
    pub user_agent: String,

    /// Maximum attempts for transient upstream failures
    pub max_retry_attempts: u32,

    /// Delay added per retry attempt (linear backoff)
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("capstan/{}", env!("CARGO_PKG_VERSION")),
            max_retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl HttpSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "http.timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_retry_attempts == 0 {
            return Err(ConfigError::Validation(
                "http.max_retry_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Job execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    /// Wall-clock budget for a single job run
    #[serde(with = "humantime_serde")]
    pub max_execution_duration: Duration,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            max_execution_duration: Duration::from_secs(300),
        }
    }
}

impl ExecutionSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_execution_duration.is_zero() {
            return Err(ConfigError::Validation(
                "execution.max_execution_duration must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings loader with environment variable support
pub struct SettingsLoader {
    prefix: String,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            prefix: "CAPSTAN".to_string(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load from a YAML file, then apply environment overrides.
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<CapstanSettings> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings: CapstanSettings = serde_yaml::from_str(&content)?;
        self.apply_env_overrides(&mut settings)?;
        settings.validate()?;
        debug!(path = %path.as_ref().display(), "loaded settings file");
        Ok(settings)
    }

    /// Defaults plus environment overrides only.
    pub fn from_env(&self) -> ConfigResult<CapstanSettings> {
        let mut settings = CapstanSettings::default();
        self.apply_env_overrides(&mut settings)?;
        settings.validate()?;
        Ok(settings)
    }

    /// File when given, environment-only otherwise.
    pub fn load(&self, path: Option<impl AsRef<Path>>) -> ConfigResult<CapstanSettings> {
        match path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, settings: &mut CapstanSettings) -> ConfigResult<()> {
        if let Ok(level) = self.get_env_var("LOG") {
            settings.logging.level = level;
        }
        if let Ok(timeout) = self.get_env_var("HTTP_TIMEOUT_SECONDS") {
            settings.http.timeout = Duration::from_secs(parse_env("HTTP_TIMEOUT_SECONDS", &timeout)?);
        }
        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            settings.http.user_agent = user_agent;
        }
        if let Ok(attempts) = self.get_env_var("HTTP_MAX_RETRY_ATTEMPTS") {
            settings.http.max_retry_attempts = parse_env("HTTP_MAX_RETRY_ATTEMPTS", &attempts)?;
        }
        if let Ok(budget) = self.get_env_var("MAX_EXECUTION_SECONDS") {
            settings.execution.max_execution_duration =
                Duration::from_secs(parse_env("MAX_EXECUTION_SECONDS", &budget)?);
        }
        Ok(())
    }

    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ConfigError::Env(format!("invalid {name}: {e}")))
}
