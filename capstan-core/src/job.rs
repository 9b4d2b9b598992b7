//! Job trait hierarchy and parameter binding
//!
//! A job declares its parameter type through the `Params` associated type;
//! the object-safe [`DynJob`] wrapper erases it so the registry can hold
//! heterogeneous factories. This replaces the reflection-over-generics trick
//! the platform previously relied on.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::ExecutionMode;
use crate::error::JobError;

/// Optional request metadata carried inside job parameters.
///
/// When present, the dispatcher initializes it against the job and hands it
/// to the job's AI-metadata sink before execution starts, never after.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Correlates the run with an upstream request or execution record
    pub id: Option<String>,

    /// Free-form annotation propagated to downstream calls
    pub comment: Option<String>,

    /// Filled in by the dispatcher before the job runs
    #[serde(skip)]
    pub job_name: Option<String>,
}

impl Metadata {
    /// Bind this metadata record to the job that is about to execute.
    pub fn initialized_for(mut self, job_name: &str) -> Self {
        self.job_name = Some(job_name.to_string());
        self
    }
}

/// Receiver for initialized metadata, typically an AI client wrapper.
pub trait MetadataSink {
    fn set_metadata(&mut self, metadata: Metadata);
}

/// Parameter fields shared by every job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonParams {
    pub metadata: Option<Metadata>,
    pub initiator: Option<String>,
}

/// Access to the shared parameter envelope from a typed parameter struct
pub trait HasCommonParams {
    fn common(&self) -> &CommonParams;
}

/// A job implementation with a strongly-typed parameter tree.
///
/// Implementations are constructed fresh for every dispatch; they must not
/// assume any state survives between runs.
#[async_trait]
pub trait Job: Send {
    /// Type witness for parameter binding
    type Params: DeserializeOwned + HasCommonParams + Send;

    /// Registered job name (lookup against it is case-insensitive)
    fn name(&self) -> &'static str;

    /// Initialization hook, called once before parameter binding.
    ///
    /// STANDALONE builds integration clients from local configuration;
    /// SERVER_MANAGED builds them from the pre-resolved blob. Must be
    /// idempotent.
    async fn initialize(
        &mut self,
        mode: ExecutionMode,
        resolved_integrations: Option<&JsonValue>,
    ) -> Result<(), JobError>;

    /// The AI-metadata sink this job exposes, if any.
    fn metadata_sink(&mut self) -> Option<&mut dyn MetadataSink> {
        None
    }

    /// Execute the job exactly once.
    async fn run(&mut self, params: Self::Params) -> anyhow::Result<JsonValue>;
}

/// Object-safe erasure of [`Job`] used by the registry and dispatcher.
#[async_trait]
pub trait DynJob: Send {
    fn name(&self) -> &'static str;

    async fn initialize(
        &mut self,
        mode: ExecutionMode,
        resolved_integrations: Option<&JsonValue>,
    ) -> Result<(), JobError>;

    /// Bind the raw `params` subtree, wire metadata, and run the job.
    async fn run_with_value(&mut self, params: JsonValue) -> Result<JsonValue, JobError>;
}

impl std::fmt::Debug for dyn DynJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynJob").field("name", &self.name()).finish()
    }
}

#[async_trait]
impl<J: Job> DynJob for J {
    fn name(&self) -> &'static str {
        Job::name(self)
    }

    async fn initialize(
        &mut self,
        mode: ExecutionMode,
        resolved_integrations: Option<&JsonValue>,
    ) -> Result<(), JobError> {
        Job::initialize(self, mode, resolved_integrations).await
    }

    async fn run_with_value(&mut self, params: JsonValue) -> Result<JsonValue, JobError> {
        let job_name = Job::name(self);
        let typed: J::Params =
            serde_json::from_value(params).map_err(|source| JobError::ParameterBinding {
                job: job_name.to_string(),
                source,
            })?;

        // Metadata must reach the sink before run is invoked, never after.
        if let Some(metadata) = typed.common().metadata.clone() {
            let metadata = metadata.initialized_for(job_name);
            if let Some(sink) = self.metadata_sink() {
                debug!(job = job_name, "attaching metadata to job sink");
                sink.set_metadata(metadata);
            }
        }

        self.run(typed).await.map_err(JobError::ExecutionFailed)
    }
}
