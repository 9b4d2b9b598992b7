//! Sandboxed JavaScript bridge
//!
//! Scripts run in an isolated boa interpreter with no ambient filesystem,
//! network or process access. The only way out of the sandbox is the set of
//! generated tool functions, which funnel every call through one narrow
//! native bridge into a host-side [`capstan_core::ToolExecutor`].
//!
//! A script must define a callable named `action` taking one parameter
//! object; its return value is coerced to a primitive (complex values are
//! stringified).

pub mod bridge;
pub mod conversion;
pub mod loader;

use thiserror::Error;

pub use bridge::ScriptBridge;
pub use loader::ScriptLoader;

/// Errors from script loading and execution
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script does not satisfy the entry-point contract
    #[error("Script contract violation: {0}")]
    ScriptContract(String),

    /// Remote or local source could not be loaded
    #[error("Failed to load script source '{origin}': {reason}")]
    SourceFetch { origin: String, reason: String },

    /// The interpreter rejected or aborted the script
    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    /// A value could not cross the host/interpreter boundary
    #[error("Value conversion failed: {0}")]
    ValueConversion(String),

    /// A tool name cannot be exposed as a JavaScript function
    #[error("Cannot register tool '{0}': not a valid identifier")]
    ToolRegistration(String),

    /// The bridge was used after close()
    #[error("Script bridge is closed")]
    Closed,
}

pub type ScriptResult<T> = Result<T, ScriptError>;
