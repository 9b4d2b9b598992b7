//! Deterministic deep merge of JSON configuration trees
//!
//! Matching object keys merge recursively; every other value kind — arrays
//! included — is replaced wholesale by the override. Inputs are never
//! mutated.

use serde_json::{Map, Value as JsonValue};

use crate::error::{ConfigError, ConfigResult};

/// Merges an override document over a base document
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigurationMerger;

impl ConfigurationMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge two JSON texts, returning the merged text.
    ///
    /// A missing or blank override returns a structural copy of the base.
    /// Malformed JSON on either side fails before any merging happens.
    pub fn merge_configurations(
        &self,
        file_json: &str,
        override_json: Option<&str>,
    ) -> ConfigResult<String> {
        if file_json.trim().is_empty() {
            return Err(ConfigError::InvalidConfiguration(
                "base configuration cannot be null or empty".to_string(),
            ));
        }

        let base = parse_object(file_json, "base configuration")?;

        let merged = match override_json {
            Some(text) if !text.trim().is_empty() => {
                let overlay = parse_object(text, "override configuration")?;
                self.deep_merge(&base, &overlay)
            }
            _ => base,
        };

        serde_json::to_string(&JsonValue::Object(merged))
            .map_err(|e| ConfigError::InvalidConfiguration(e.to_string()))
    }

    /// Recursive merge of two parsed object trees.
    pub fn deep_merge(
        &self,
        base: &Map<String, JsonValue>,
        overlay: &Map<String, JsonValue>,
    ) -> Map<String, JsonValue> {
        let mut merged = base.clone();
        for (key, overlay_value) in overlay {
            match (merged.get(key), overlay_value) {
                (Some(JsonValue::Object(base_obj)), JsonValue::Object(overlay_obj)) => {
                    let nested = self.deep_merge(base_obj, overlay_obj);
                    merged.insert(key.clone(), JsonValue::Object(nested));
                }
                _ => {
                    merged.insert(key.clone(), overlay_value.clone());
                }
            }
        }
        merged
    }
}

fn parse_object(text: &str, what: &str) -> ConfigResult<Map<String, JsonValue>> {
    let value: JsonValue = serde_json::from_str(text)
        .map_err(|e| ConfigError::InvalidConfiguration(format!("{what} is not valid JSON: {e}")))?;
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(ConfigError::InvalidConfiguration(format!(
            "{what} must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
