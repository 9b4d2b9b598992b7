//! Job dispatch
//!
//! One run: construct a fresh instance, call the initialization hook with
//! the execution mode and any pre-resolved integrations, then bind
//! parameters and run under the configured wall-clock budget. Exceeding the
//! budget cancels the whole run.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use capstan_core::{JobConfiguration, JobError};

use crate::environment::Environment;
use crate::registry::JobRegistry;

/// Maps configurations to job runs
pub struct Dispatcher {
    registry: JobRegistry,
    env: Arc<Environment>,
}

impl Dispatcher {
    pub fn new(registry: JobRegistry, env: Arc<Environment>) -> Self {
        Self { registry, env }
    }

    /// Dispatcher with the built-in jobs.
    pub fn with_builtins(env: Arc<Environment>) -> Self {
        Self::new(JobRegistry::with_builtins(), env)
    }

    pub fn job_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Run the configured job exactly once and return its opaque result.
    pub async fn run(&self, config: &JobConfiguration) -> Result<JsonValue, JobError> {
        let mut job = self.registry.create(&config.name, Arc::clone(&self.env))?;
        info!(job = %config.name, mode = ?config.execution_mode, "dispatching job");

        job.initialize(config.execution_mode, config.resolved_integrations())
            .await?;

        let budget = self.env.settings.execution.max_execution_duration;
        match tokio::time::timeout(budget, job.run_with_value(config.params.clone())).await {
            Ok(result) => result,
            Err(_) => {
                warn!(job = %config.name, budget_secs = budget.as_secs(), "job exceeded budget");
                Err(JobError::Timeout(budget.as_secs()))
            }
        }
    }
}
