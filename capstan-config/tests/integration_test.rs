//! Integration tests exercising the public configuration surface

use std::io::Write;

use capstan_config::{CapstanSettings, RunCommandProcessor, SCRIPT_RUNNER_JOB};
use capstan_core::ExecutionMode;
use serde_json::json;

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn base64(text: &str) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(text)
}

#[test]
fn file_override_and_flags_compose_in_precedence_order() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "name": "ScriptRunner",
            "params": {{
                "scriptPath": "jobs/triage.js",
                "jobParams": {{ "project": "DEV", "dryRun": true }}
            }}
        }}"#
    )
    .unwrap();

    // Override arrives base64-encoded, as a server hand-off would send it.
    let encoded = base64(r#"{"params":{"jobParams":{"dryRun":false}}}"#);

    let config = RunCommandProcessor::new()
        .process(&args(&[
            "run",
            file.path().to_str().unwrap(),
            &encoded,
            "--ticket",
            "DEV-42",
        ]))
        .unwrap();

    assert_eq!(config.name, SCRIPT_RUNNER_JOB);
    assert_eq!(config.execution_mode, ExecutionMode::Standalone);
    // File value survives where the override is silent.
    assert_eq!(config.params["scriptPath"], json!("jobs/triage.js"));
    assert_eq!(config.params["jobParams"]["project"], json!("DEV"));
    // Override wins over the file, flags win over both.
    assert_eq!(config.params["jobParams"]["dryRun"], json!(false));
    assert_eq!(config.params["ticket"], json!("DEV-42"));
}

#[test]
fn js_path_synthesizes_a_script_runner_configuration() {
    let config = RunCommandProcessor::new()
        .process(&args(&["run", "scripts/report.js", r#"{"week": 35}"#]))
        .unwrap();

    assert_eq!(config.name, SCRIPT_RUNNER_JOB);
    assert_eq!(config.params["scriptPath"], json!("scripts/report.js"));
    assert_eq!(config.params["jobParams"], json!({ "week": 35 }));
}

#[test]
fn settings_survive_a_yaml_round_trip() {
    let settings = CapstanSettings::default();
    let yaml = serde_yaml::to_string(&settings).unwrap();
    let back: CapstanSettings = serde_yaml::from_str(&yaml).unwrap();

    assert_eq!(back.http.timeout, settings.http.timeout);
    assert_eq!(back.http.max_retry_attempts, settings.http.max_retry_attempts);
    assert_eq!(
        back.execution.max_execution_duration,
        settings.execution.max_execution_duration
    );
    assert_eq!(back.logging.level, settings.logging.level);
}
