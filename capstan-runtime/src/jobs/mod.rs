//! Built-in jobs

pub mod echo;
pub mod script_runner;

pub use echo::EchoJob;
pub use script_runner::ScriptRunnerJob;
