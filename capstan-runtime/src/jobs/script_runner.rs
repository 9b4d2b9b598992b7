//! Script-runner job
//!
//! Hosts one sandboxed bridge for the lifetime of a single run. Script and
//! tool failures never fail the job: they come back to the caller as the
//! structured error value, matching what scripts themselves observe when a
//! tool call fails.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::warn;

use capstan_core::{CommonParams, ExecutionMode, HasCommonParams, Job, JobError};
use capstan_js::{ScriptBridge, ScriptError, ScriptLoader};

use crate::environment::Environment;

fn empty_object() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRunnerParams {
    /// Script origin: URL, file path or inline code
    pub script_path: String,

    /// Arbitrary parameter tree handed to the script's `action`
    #[serde(default = "empty_object")]
    pub job_params: JsonValue,

    /// Optional ticket context forwarded verbatim
    #[serde(default)]
    pub ticket: Option<JsonValue>,

    /// Optional prior response forwarded verbatim
    #[serde(default)]
    pub response: Option<JsonValue>,

    #[serde(flatten)]
    pub common: CommonParams,
}

impl HasCommonParams for ScriptRunnerParams {
    fn common(&self) -> &CommonParams {
        &self.common
    }
}

/// Runs one script inside a fresh sandbox
pub struct ScriptRunnerJob {
    env: Arc<Environment>,
}

impl ScriptRunnerJob {
    pub fn new(env: Arc<Environment>) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Job for ScriptRunnerJob {
    type Params = ScriptRunnerParams;

    fn name(&self) -> &'static str {
        "ScriptRunner"
    }

    async fn initialize(
        &mut self,
        mode: ExecutionMode,
        _resolved_integrations: Option<&JsonValue>,
    ) -> Result<(), JobError> {
        match mode {
            ExecutionMode::Standalone => Ok(()),
            ExecutionMode::ServerManaged => Err(JobError::Initialization(
                "ScriptRunner does not support SERVER_MANAGED mode".to_string(),
            )),
        }
    }

    async fn run(&mut self, params: ScriptRunnerParams) -> anyhow::Result<JsonValue> {
        let loader = ScriptLoader::new(
            Arc::clone(&self.env.sources),
            Arc::clone(&self.env.fetcher),
        );

        // Resolve before the bridge exists; the interpreter is not Send and
        // must not be held across an await.
        let code = match loader.resolve(&params.script_path).await {
            Ok(code) => code,
            Err(e) => return Ok(script_failure(&params.script_path, e)),
        };

        let action_params = json!({
            "jobParams": params.job_params,
            "ticket": params.ticket,
            "response": params.response,
            "initiator": params.common.initiator,
        });

        let outcome = ScriptBridge::new(
            self.env.catalog.as_ref(),
            Arc::clone(&self.env.executor),
            loader,
        )
        .and_then(|mut bridge| {
            let result = bridge.execute_source(&code, &action_params);
            bridge.close();
            result
        });

        match outcome {
            Ok(value) => Ok(value),
            Err(e) => Ok(script_failure(&params.script_path, e)),
        }
    }
}

fn script_failure(script: &str, error: ScriptError) -> JsonValue {
    warn!(script = %script, error = %error, "script execution failed");
    json!({
        "success": false,
        "error": error.to_string(),
        "action": "error",
    })
}
