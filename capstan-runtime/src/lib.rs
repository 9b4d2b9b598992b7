//! Job runtime for Capstan
//!
//! A registry maps case-insensitive job names to factories, the dispatcher
//! constructs one fresh instance per run, initializes it for the selected
//! execution mode and runs it exactly once under a wall-clock budget.

pub mod dispatcher;
pub mod environment;
pub mod jobs;
pub mod registry;

pub use dispatcher::Dispatcher;
pub use environment::Environment;
pub use registry::JobRegistry;
