//! Echo job, mainly useful for wiring checks

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use capstan_core::{CommonParams, ExecutionMode, HasCommonParams, Job, JobError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EchoParams {
    pub msg: Option<String>,
    #[serde(flatten)]
    pub common: CommonParams,
}

impl HasCommonParams for EchoParams {
    fn common(&self) -> &CommonParams {
        &self.common
    }
}

/// Returns its parameters unchanged
#[derive(Debug, Default)]
pub struct EchoJob;

#[async_trait]
impl Job for EchoJob {
    type Params = EchoParams;

    fn name(&self) -> &'static str {
        "Echo"
    }

    async fn initialize(
        &mut self,
        _mode: ExecutionMode,
        _resolved_integrations: Option<&JsonValue>,
    ) -> Result<(), JobError> {
        Ok(())
    }

    async fn run(&mut self, params: EchoParams) -> anyhow::Result<JsonValue> {
        Ok(json!({
            "msg": params.msg,
            "initiator": params.common.initiator,
        }))
    }
}
