//! `run` command resolution
//!
//! Turns `run <file> [<encoded-override>] [--key value]...` into a single
//! canonical [`JobConfiguration`]. Precedence, lowest to highest: file
//! configuration < encoded override < CLI flags.

use std::path::Path;

use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use capstan_core::JobConfiguration;

use crate::encoding::EncodingDetector;
use crate::error::{ConfigError, ConfigResult};
use crate::merge::ConfigurationMerger;

/// Job synthesized for bare script paths passed to `run`.
pub const SCRIPT_RUNNER_JOB: &str = "ScriptRunner";

/// Resolves `run` command arguments into a job configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCommandProcessor {
    detector: EncodingDetector,
    merger: ConfigurationMerger,
}

impl RunCommandProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the full argument vector (including the leading `run`).
    pub fn process(&self, args: &[String]) -> ConfigResult<JobConfiguration> {
        if args.first().map(String::as_str) != Some("run") {
            return Err(ConfigError::InvalidArguments(
                "expected 'run' as the first argument".to_string(),
            ));
        }
        let file_path = args.get(1).ok_or_else(|| {
            ConfigError::InvalidArguments(
                "usage: run <file> [<encoded-override>] [--key value]...".to_string(),
            )
        })?;

        // Second positional is an encoded override unless it is a flag.
        let mut rest = &args[2..];
        let mut encoded_override: Option<&str> = None;
        if let Some(second) = rest.first() {
            if !second.starts_with("--") {
                if !second.trim().is_empty() {
                    encoded_override = Some(second.as_str());
                }
                rest = &rest[1..];
            }
        }
        let flags = parse_flags(rest)?;

        let mut config_text = if file_path.ends_with(".js") {
            self.synthesize_script_config(file_path, encoded_override)?
        } else {
            let file_json = read_config_file(file_path)?;
            let decoded = match encoded_override {
                Some(encoded) => Some(
                    self.detector
                        .auto_detect_and_decode(encoded)
                        .map_err(ConfigError::run_command)?,
                ),
                None => None,
            };
            self.merger
                .merge_configurations(&file_json, decoded.as_deref())
                .map_err(ConfigError::run_command)?
        };

        if !flags.is_empty() {
            config_text = apply_flags(&config_text, &flags)?;
        }

        debug!(file = %file_path, "resolved run configuration");
        JobConfiguration::from_json_text(&config_text)
            .map_err(|e| ConfigError::InvalidConfiguration(e.to_string()))
    }

    /// A bare `.js` path bypasses file-based configuration entirely: the
    /// script path and its parameters become the payload of a synthesized
    /// script-runner job. The file is not checked for existence here; the
    /// job loads it.
    fn synthesize_script_config(
        &self,
        script_path: &str,
        encoded_override: Option<&str>,
    ) -> ConfigResult<String> {
        let job_params: JsonValue = match encoded_override {
            None => json!({}),
            Some(raw) => {
                let trimmed = raw.trim();
                // Raw JSON is accepted as-is; anything else must decode.
                if trimmed.starts_with('{') {
                    serde_json::from_str(trimmed).map_err(|e| {
                        ConfigError::run_command(ConfigError::InvalidConfiguration(format!(
                            "script parameters are not valid JSON: {e}"
                        )))
                    })?
                } else {
                    let decoded = self
                        .detector
                        .auto_detect_and_decode(raw)
                        .map_err(ConfigError::run_command)?;
                    serde_json::from_str(&decoded).map_err(|e| {
                        ConfigError::run_command(ConfigError::InvalidConfiguration(format!(
                            "decoded script parameters are not valid JSON: {e}"
                        )))
                    })?
                }
            }
        };

        Ok(json!({
            "name": SCRIPT_RUNNER_JOB,
            "params": {
                "scriptPath": script_path,
                "jobParams": job_params,
            }
        })
        .to_string())
    }
}

fn read_config_file(path: &str) -> ConfigResult<String> {
    let file = Path::new(path);
    if !file.exists() {
        return Err(ConfigError::FileAccess(format!(
            "configuration file does not exist: {path}"
        )));
    }
    let text = std::fs::read_to_string(file)
        .map_err(|e| ConfigError::FileAccess(format!("cannot read {path}: {e}")))?;
    if text.trim().is_empty() {
        return Err(ConfigError::FileAccess(format!(
            "configuration file is empty: {path}"
        )));
    }
    Ok(text)
}

/// Parse trailing `--key value` pairs; later flags win for the same key.
fn parse_flags(tokens: &[String]) -> ConfigResult<Vec<(String, String)>> {
    let mut flags = Vec::new();
    let mut iter = tokens.iter();
    while let Some(token) = iter.next() {
        let key = token.strip_prefix("--").ok_or_else(|| {
            ConfigError::InvalidArguments(format!("expected a --key flag, got '{token}'"))
        })?;
        if key.is_empty() {
            return Err(ConfigError::InvalidArguments(
                "flag name cannot be empty".to_string(),
            ));
        }
        let value = iter.next().ok_or_else(|| {
            ConfigError::InvalidArguments(format!("flag '--{key}' is missing a value"))
        })?;
        flags.push((key.to_string(), value.clone()));
    }
    Ok(flags)
}

/// Apply flag overrides into the `params` subtree, creating it if absent.
fn apply_flags(config_text: &str, flags: &[(String, String)]) -> ConfigResult<String> {
    let mut document: JsonValue = serde_json::from_str(config_text)
        .map_err(|e| ConfigError::InvalidConfiguration(e.to_string()))?;
    let root = document.as_object_mut().ok_or_else(|| {
        ConfigError::InvalidConfiguration("resolved configuration must be a JSON object".to_string())
    })?;
    let params = root
        .entry("params")
        .or_insert_with(|| JsonValue::Object(Map::new()));
    let params = params.as_object_mut().ok_or_else(|| {
        ConfigError::InvalidConfiguration("'params' must be a JSON object".to_string())
    })?;
    for (key, value) in flags {
        params.insert(key.clone(), JsonValue::String(value.clone()));
    }
    serde_json::to_string(&document).map_err(|e| ConfigError::InvalidConfiguration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use capstan_core::ExecutionMode;
    use std::io::Write;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn resolves_plain_file_configuration() {
        let file = config_file(r#"{"name":"Echo","params":{"msg":"hi"}}"#);
        let processor = RunCommandProcessor::new();
        let config = processor
            .process(&args(&["run", file.path().to_str().unwrap()]))
            .unwrap();
        assert_eq!(config.name, "Echo");
        assert_eq!(config.params["msg"], "hi");
        assert_eq!(config.execution_mode, ExecutionMode::Standalone);
    }

    #[test]
    fn missing_run_keyword_is_rejected() {
        let processor = RunCommandProcessor::new();
        let err = processor.process(&args(&["walk", "config.json"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidArguments(_)));
    }

    #[test]
    fn missing_file_argument_is_rejected() {
        let processor = RunCommandProcessor::new();
        assert!(matches!(
            processor.process(&args(&["run"])),
            Err(ConfigError::InvalidArguments(_))
        ));
    }

    #[test]
    fn nonexistent_file_reports_path() {
        let processor = RunCommandProcessor::new();
        let err = processor
            .process(&args(&["run", "/no/such/config.json"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileAccess(_)));
        assert!(err.to_string().contains("/no/such/config.json"));
    }

    #[test]
    fn empty_file_is_rejected() {
        let file = config_file("   ");
        let processor = RunCommandProcessor::new();
        let err = processor
            .process(&args(&["run", file.path().to_str().unwrap()]))
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn encoded_override_is_merged_over_file() {
        let file = config_file(r#"{"name":"Echo","params":{"timeout":30,"retries":3}}"#);
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(r#"{"params":{"timeout":60}}"#);
        let processor = RunCommandProcessor::new();
        let config = processor
            .process(&args(&["run", file.path().to_str().unwrap(), &encoded]))
            .unwrap();
        assert_eq!(config.params["timeout"], 60);
        assert_eq!(config.params["retries"], 3);
    }

    #[test]
    fn cli_flags_win_over_override_and_file() {
        let file = config_file(r#"{"name":"Echo","params":{"x":1}}"#);
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(r#"{"params":{"x":2}}"#);
        let processor = RunCommandProcessor::new();
        let config = processor
            .process(&args(&[
                "run",
                file.path().to_str().unwrap(),
                &encoded,
                "--x",
                "3",
            ]))
            .unwrap();
        assert_eq!(config.params["x"], "3");
    }

    #[test]
    fn later_flags_override_earlier_ones() {
        let file = config_file(r#"{"name":"Echo"}"#);
        let processor = RunCommandProcessor::new();
        let config = processor
            .process(&args(&[
                "run",
                file.path().to_str().unwrap(),
                "--mode",
                "fast",
                "--mode",
                "slow",
            ]))
            .unwrap();
        assert_eq!(config.params["mode"], "slow");
    }

    #[test]
    fn flags_create_params_when_absent() {
        let file = config_file(r#"{"name":"Echo"}"#);
        let processor = RunCommandProcessor::new();
        let config = processor
            .process(&args(&["run", file.path().to_str().unwrap(), "--msg", "hi"]))
            .unwrap();
        assert_eq!(config.params["msg"], "hi");
    }

    #[test]
    fn flag_missing_value_is_rejected() {
        let file = config_file(r#"{"name":"Echo"}"#);
        let processor = RunCommandProcessor::new();
        let err = processor
            .process(&args(&["run", file.path().to_str().unwrap(), "--msg"]))
            .unwrap_err();
        assert!(err.to_string().contains("--msg"));
    }

    #[test]
    fn script_path_synthesizes_script_runner_config() {
        let processor = RunCommandProcessor::new();
        let config = processor
            .process(&args(&["run", "scripts/report.js"]))
            .unwrap();
        assert_eq!(config.name, SCRIPT_RUNNER_JOB);
        assert_eq!(config.params["scriptPath"], "scripts/report.js");
        assert_eq!(config.params["jobParams"], serde_json::json!({}));
    }

    #[test]
    fn script_path_accepts_raw_json_params() {
        let processor = RunCommandProcessor::new();
        let config = processor
            .process(&args(&["run", "report.js", r#"{"ticket":"DEV-1"}"#]))
            .unwrap();
        assert_eq!(config.params["jobParams"]["ticket"], "DEV-1");
    }

    #[test]
    fn script_path_accepts_encoded_params() {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(r#"{"ticket":"DEV-2"}"#);
        let processor = RunCommandProcessor::new();
        let config = processor
            .process(&args(&["run", "report.js", &encoded]))
            .unwrap();
        assert_eq!(config.params["jobParams"]["ticket"], "DEV-2");
    }

    #[test]
    fn script_path_flags_land_in_params() {
        let processor = RunCommandProcessor::new();
        let config = processor
            .process(&args(&["run", "report.js", "--initiator", "ci"]))
            .unwrap();
        assert_eq!(config.params["initiator"], "ci");
        assert_eq!(config.params["scriptPath"], "report.js");
    }

    #[test]
    fn decode_failure_is_wrapped_as_run_command_error() {
        let file = config_file(r#"{"name":"Echo"}"#);
        let processor = RunCommandProcessor::new();
        let err = processor
            .process(&args(&[
                "run",
                file.path().to_str().unwrap(),
                "!!!not an encoding!!!",
            ]))
            .unwrap_err();
        assert!(err.to_string().starts_with("Run command processing failed"));
    }
}
