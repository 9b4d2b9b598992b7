//! Case-insensitive job registry
//!
//! One map serves both discovery (`names`) and dispatch (`create`). Entries
//! are factories, never instances: every lookup constructs a fresh job so
//! no state leaks between runs.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use capstan_core::{DynJob, JobError};

use crate::environment::Environment;
use crate::jobs::{echo::EchoJob, script_runner::ScriptRunnerJob};

type JobFactory = Box<dyn Fn(Arc<Environment>) -> Box<dyn DynJob> + Send + Sync>;

struct Entry {
    display_name: String,
    factory: JobFactory,
}

/// Registry of job factories keyed by lowercased name
#[derive(Default)]
pub struct JobRegistry {
    entries: HashMap<String, Entry>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in jobs.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("ScriptRunner", |env| Box::new(ScriptRunnerJob::new(env)));
        registry.register("Echo", |_env| Box::<EchoJob>::default());
        registry
    }

    /// Register a factory under `name`; replaces any previous registration
    /// for the same name regardless of case.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(Arc<Environment>) -> Box<dyn DynJob> + Send + Sync + 'static,
    {
        debug!(job = name, "registering job factory");
        self.entries.insert(
            name.to_lowercase(),
            Entry {
                display_name: name.to_string(),
                factory: Box::new(factory),
            },
        );
    }

    /// Construct a fresh instance of the named job.
    pub fn create(&self, name: &str, env: Arc<Environment>) -> Result<Box<dyn DynJob>, JobError> {
        let entry = self
            .entries
            .get(&name.to_lowercase())
            .ok_or_else(|| JobError::UnknownJob(name.to_string()))?;
        Ok((entry.factory)(env))
    }

    /// Registered job names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .values()
            .map(|e| e.display_name.clone())
            .collect();
        names.sort();
        names
    }
}
