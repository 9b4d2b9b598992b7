//! Core job model for Capstan
//!
//! This crate defines the canonical job configuration document, the job
//! trait hierarchy with type-witness parameter binding, and the interface
//! traits behind which integration clients live.

pub mod config;
pub mod error;
pub mod job;
pub mod tools;

// Re-export main types for convenience
pub use config::{ExecutionMode, JobConfiguration};
pub use error::{JobError, Result};
pub use job::{CommonParams, DynJob, HasCommonParams, Job, Metadata, MetadataSink};
pub use tools::{
    SourceFetcher, StaticCatalog, ToolCatalog, ToolDescriptor, ToolError, ToolExecutor,
    ToolParameter,
};
