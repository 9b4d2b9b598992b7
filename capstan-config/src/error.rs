//! Configuration pipeline error types

use thiserror::Error;

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from the configuration-resolution pipeline and settings loader
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The encoded override could not be decoded by any supported scheme
    #[error("Decode error: {0}")]
    Decode(String),

    /// Malformed JSON or a structurally invalid document
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The run-command grammar was violated
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Missing, unreadable or empty configuration file
    #[error("File access error: {0}")]
    FileAccess(String),

    /// Decode/merge failure surfaced through the run-command entry point
    #[error("Run command processing failed: {source}")]
    RunCommand {
        #[source]
        source: Box<ConfigError>,
    },

    /// IO error reading a settings file
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error in the settings document
    #[error("Failed to parse settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Environment variable override error
    #[error("Environment variable error: {0}")]
    Env(String),

    /// Settings failed validation after load
    #[error("Invalid settings: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Wrap a decode/merge failure in the run-command context.
    pub(crate) fn run_command(source: ConfigError) -> Self {
        ConfigError::RunCommand {
            source: Box::new(source),
        }
    }
}
