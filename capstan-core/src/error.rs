//! Core error types for Capstan

use thiserror::Error;

/// Result type alias for job-level operations
pub type Result<T> = std::result::Result<T, JobError>;

/// Errors raised while resolving, binding and executing jobs
#[derive(Debug, Error)]
pub enum JobError {
    /// No job is registered under the requested name
    #[error("Unknown job: '{0}'")]
    UnknownJob(String),

    /// The canonical configuration document is structurally invalid
    #[error("Invalid job configuration: {0}")]
    InvalidConfiguration(String),

    /// The `params` subtree could not be deserialized into the job's
    /// declared parameter type
    #[error("Failed to bind parameters for job '{job}': {source}")]
    ParameterBinding {
        job: String,
        #[source]
        source: serde_json::Error,
    },

    /// The initialization hook rejected the requested execution mode
    #[error("Job initialization failed: {0}")]
    Initialization(String),

    /// The job ran and failed; the underlying error is preserved verbatim
    #[error("Job execution failed: {0}")]
    ExecutionFailed(#[source] anyhow::Error),

    /// The job exceeded the wall-clock budget of the surrounding run
    #[error("Job execution timed out after {0} seconds")]
    Timeout(u64),
}
