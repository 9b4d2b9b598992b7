use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value as JsonValue;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use capstan_config::{CapstanSettings, RunCommandProcessor, SettingsLoader};
use capstan_http::{FetchOptions, HttpFetcher};
use capstan_runtime::{Dispatcher, Environment};

mod cli;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = SettingsLoader::new()
        .load(cli.config.as_deref())
        .context("failed to load settings")?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.logging.level.clone());
    init_tracing(&level);

    match cli.command {
        Commands::Run { args } => run_command(settings, args).await,
        Commands::ListJobs => {
            let dispatcher = build_dispatcher(settings)?;
            for name in dispatcher.job_names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

async fn run_command(settings: CapstanSettings, args: Vec<String>) -> Result<()> {
    let mut argv = vec!["run".to_string()];
    argv.extend(args);

    let config = RunCommandProcessor::new().process(&argv)?;
    debug!(job = %config.name, "resolved configuration");

    let dispatcher = build_dispatcher(settings)?;
    let result = dispatcher.run(&config).await?;

    let output = serde_json::to_string_pretty(&result)?;
    println!("{output}");

    if run_failed(&result) {
        error!(job = %config.name, "job reported failure");
        eprintln!("Job '{}' did not produce a successful result", config.name);
        std::process::exit(1);
    }
    Ok(())
}

fn build_dispatcher(settings: CapstanSettings) -> Result<Dispatcher> {
    let fetcher = HttpFetcher::new(FetchOptions {
        timeout: settings.http.timeout,
        user_agent: settings.http.user_agent.clone(),
        max_retry_attempts: settings.http.max_retry_attempts,
        retry_delay: settings.http.retry_delay,
    })
    .context("failed to build HTTP client")?;

    let env = Arc::new(Environment::without_integrations(settings, Arc::new(fetcher)));
    Ok(Dispatcher::with_builtins(env))
}

/// A run fails when the job returned nothing or a structured error value.
fn run_failed(result: &JsonValue) -> bool {
    if result.is_null() {
        return true;
    }
    result
        .get("success")
        .map(|s| s == &JsonValue::Bool(false))
        .unwrap_or(false)
}

fn init_tracing(level: &str) {
    let filter =
        EnvFilter::try_from_env("CAPSTAN_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
