//! Canonical job configuration document
//!
//! The configuration-resolution pipeline produces exactly one of these per
//! run; it is immutable once parsed and is the only artifact the dispatcher
//! consumes.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::JobError;

/// How a job resolves its integration credentials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Credentials come from local configuration
    #[default]
    #[serde(rename = "STANDALONE")]
    Standalone,

    /// Credentials are supplied pre-resolved by a trusted caller
    #[serde(rename = "SERVER_MANAGED")]
    ServerManaged,
}

/// The canonical configuration document consumed by the dispatcher
///
/// ```json
/// { "name": "Echo",
///   "params": { "msg": "hi" },
///   "executionMode": "STANDALONE" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfiguration {
    /// Selects the job implementation; lookup is case-insensitive
    pub name: String,

    /// Job-specific parameter tree
    #[serde(default = "empty_params")]
    pub params: JsonValue,

    /// Defaults to STANDALONE when absent (backward compatibility)
    #[serde(default)]
    pub execution_mode: ExecutionMode,

    /// Integration name -> pre-resolved credential/config blob;
    /// required in SERVER_MANAGED mode, ignored otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_integrations: Option<JsonValue>,
}

fn empty_params() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}

impl JobConfiguration {
    /// Parse and validate a canonical configuration document.
    pub fn from_json_text(text: &str) -> Result<Self, JobError> {
        let config: JobConfiguration = serde_json::from_str(text)
            .map_err(|e| JobError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), JobError> {
        if self.name.trim().is_empty() {
            return Err(JobError::InvalidConfiguration(
                "configuration must have a non-empty 'name'".to_string(),
            ));
        }
        if !self.params.is_object() {
            return Err(JobError::InvalidConfiguration(
                "'params' must be a JSON object".to_string(),
            ));
        }
        if self.execution_mode == ExecutionMode::ServerManaged && self.resolved_integrations.is_none() {
            return Err(JobError::InvalidConfiguration(
                "'resolvedIntegrations' is required in SERVER_MANAGED mode".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved integrations, visible only in SERVER_MANAGED mode.
    pub fn resolved_integrations(&self) -> Option<&JsonValue> {
        match self.execution_mode {
            ExecutionMode::ServerManaged => self.resolved_integrations.as_ref(),
            ExecutionMode::Standalone => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_document() {
        let config = JobConfiguration::from_json_text(r#"{"name":"Echo"}"#).unwrap();
        assert_eq!(config.name, "Echo");
        assert_eq!(config.execution_mode, ExecutionMode::Standalone);
        assert!(config.params.as_object().unwrap().is_empty());
        assert!(config.resolved_integrations.is_none());
    }

    #[test]
    fn defaults_to_standalone_when_mode_absent() {
        let config =
            JobConfiguration::from_json_text(r#"{"name":"Echo","params":{"msg":"hi"}}"#).unwrap();
        assert_eq!(config.execution_mode, ExecutionMode::Standalone);
        assert_eq!(config.params, json!({"msg":"hi"}));
    }

    #[test]
    fn server_managed_requires_resolved_integrations() {
        let err = JobConfiguration::from_json_text(
            r#"{"name":"Echo","executionMode":"SERVER_MANAGED"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, JobError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("resolvedIntegrations"));
    }

    #[test]
    fn server_managed_with_integrations_is_valid() {
        let config = JobConfiguration::from_json_text(
            r#"{"name":"Echo","executionMode":"SERVER_MANAGED","resolvedIntegrations":{"tracker":{"token":"t"}}}"#,
        )
        .unwrap();
        assert_eq!(config.execution_mode, ExecutionMode::ServerManaged);
        assert!(config.resolved_integrations().is_some());
    }

    #[test]
    fn resolved_integrations_ignored_in_standalone() {
        let config = JobConfiguration::from_json_text(
            r#"{"name":"Echo","resolvedIntegrations":{"tracker":{}}}"#,
        )
        .unwrap();
        assert!(config.resolved_integrations().is_none());
    }

    #[test]
    fn missing_name_is_rejected() {
        assert!(JobConfiguration::from_json_text(r#"{"params":{}}"#).is_err());
        assert!(JobConfiguration::from_json_text(r#"{"name":"  "}"#).is_err());
    }

    #[test]
    fn malformed_text_is_rejected() {
        let err = JobConfiguration::from_json_text("{not json").unwrap_err();
        assert!(matches!(err, JobError::InvalidConfiguration(_)));
    }
}
