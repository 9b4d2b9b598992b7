//! Interfaces to the integration layer
//!
//! Concrete trackers, wikis and AI providers live outside this workspace.
//! The script bridge and jobs see them only through these traits: a catalog
//! of tool descriptors, an executor resolving named invocations, and a
//! fetcher for remote script sources.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// One declared parameter of a tool, in call-order position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

impl ToolParameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

/// Schema metadata for one callable capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, e.g. `tracker_post_comment`; must be a valid identifier
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Declared parameters in positional order
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
}

/// Provider of the tool descriptors a sandbox is allowed to expose
pub trait ToolCatalog: Send + Sync {
    fn tools(&self) -> Vec<ToolDescriptor>;
}

/// Resolves `(tool name, arguments)` against live integration clients.
///
/// Implementations hold the client instances and credentials; sandboxed
/// code never sees them directly.
pub trait ToolExecutor: Send + Sync {
    fn execute(&self, tool: &str, args: &Map<String, JsonValue>) -> Result<JsonValue, ToolError>;
}

/// A failed tool invocation; contained by the bridge, not fatal to the job
#[derive(Debug, Clone, Error)]
#[error("Tool '{tool}' failed: {message}")]
pub struct ToolError {
    pub tool: String,
    pub message: String,
}

impl ToolError {
    pub fn new(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Fetches script content from a remote origin
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<String>;
}

/// An immutable catalog backed by a fixed descriptor list.
///
/// Embedders with generated tool schemas typically implement [`ToolCatalog`]
/// themselves; this covers tests and deployments without integrations.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tools: Vec<ToolDescriptor>,
}

impl StaticCatalog {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl ToolCatalog for StaticCatalog {
    fn tools(&self) -> Vec<ToolDescriptor> {
        self.tools.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_round_trips_through_json() {
        let descriptor = ToolDescriptor {
            name: "tracker_get_ticket".to_string(),
            description: "Fetch one ticket".to_string(),
            parameters: vec![
                ToolParameter::required("key"),
                ToolParameter::optional("fields"),
            ],
        };
        let text = serde_json::to_string(&descriptor).unwrap();
        let back: ToolDescriptor = serde_json::from_str(&text).unwrap();
        assert_eq!(back, descriptor);
    }

    #[test]
    fn static_catalog_returns_registered_tools() {
        let catalog = StaticCatalog::new(vec![ToolDescriptor {
            name: "file_read".to_string(),
            description: String::new(),
            parameters: vec![ToolParameter::required("path")],
        }]);
        assert_eq!(catalog.tools().len(), 1);
        assert!(StaticCatalog::empty().tools().is_empty());
    }
}
