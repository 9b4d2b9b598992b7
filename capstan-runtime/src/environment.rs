//! Shared collaborators handed to job factories

use std::sync::Arc;

use capstan_caching::SourceCache;
use capstan_config::CapstanSettings;
use capstan_core::{SourceFetcher, StaticCatalog, ToolCatalog, ToolExecutor, ToolError};
use serde_json::{Map, Value as JsonValue};

/// Everything a job may need beyond its own parameters.
///
/// One environment is built at startup and shared by every run; per-run
/// state (the script bridge in particular) is never stored here.
pub struct Environment {
    pub settings: CapstanSettings,
    pub catalog: Arc<dyn ToolCatalog>,
    pub executor: Arc<dyn ToolExecutor>,
    pub fetcher: Arc<dyn SourceFetcher>,
    pub sources: Arc<SourceCache>,
}

impl Environment {
    pub fn new(
        settings: CapstanSettings,
        catalog: Arc<dyn ToolCatalog>,
        executor: Arc<dyn ToolExecutor>,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> Self {
        Self {
            settings,
            catalog,
            executor,
            fetcher,
            sources: Arc::new(SourceCache::new()),
        }
    }

    /// Environment with no integrations wired in: scripts run, tool calls
    /// fail with a structured error.
    pub fn without_integrations(settings: CapstanSettings, fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self::new(
            settings,
            Arc::new(StaticCatalog::empty()),
            Arc::new(UnconfiguredExecutor),
            fetcher,
        )
    }
}

/// Executor used when no integrations are configured
struct UnconfiguredExecutor;

impl ToolExecutor for UnconfiguredExecutor {
    fn execute(&self, tool: &str, _args: &Map<String, JsonValue>) -> Result<JsonValue, ToolError> {
        Err(ToolError::new(tool, "no integrations are configured"))
    }
}
