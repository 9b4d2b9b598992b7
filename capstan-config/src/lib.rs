//! Configuration resolution for Capstan
//!
//! Assembles one canonical [`capstan_core::JobConfiguration`] from a JSON
//! file, an optional base64/URL-encoded override blob, and trailing CLI
//! flags, with deterministic deep-merge precedence. Also hosts the local
//! settings document used in STANDALONE mode.

pub mod encoding;
pub mod error;
pub mod merge;
pub mod run_command;
pub mod settings;

// Re-export main types
pub use encoding::EncodingDetector;
pub use error::{ConfigError, ConfigResult};
pub use merge::ConfigurationMerger;
pub use run_command::{RunCommandProcessor, SCRIPT_RUNNER_JOB};
pub use settings::{CapstanSettings, ExecutionSettings, HttpSettings, LoggingSettings, SettingsLoader};
