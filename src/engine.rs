//! The engine: settings and session resolution wired to the three host-facing
//! operations.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::artifacts::SessionLocator;
use crate::completion::{Completion, CompletionReducer};
use crate::config::Settings;
use crate::gates::{DelegationGate, GateDecision, WriteGate};

pub struct Engine {
    settings: Settings,
    locator: SessionLocator,
}

impl Engine {
    /// Build an engine searching the given session roots, in order.
    pub fn new(settings: Settings, roots: Vec<PathBuf>) -> Result<Self> {
        let locator = SessionLocator::new(&settings.sessions.threads_dir, roots).with_context(
            || {
                format!(
                    "Invalid sessions.threads_dir '{}'",
                    settings.sessions.threads_dir
                )
            },
        )?;
        Ok(Self { settings, locator })
    }

    /// Build an engine with the standard root order for `project_dir`.
    pub fn for_project(settings: Settings, project_dir: &Path) -> Result<Self> {
        let roots = settings.session_roots(project_dir);
        Self::new(settings, roots)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn locator(&self) -> &SessionLocator {
        &self.locator
    }

    /// Before a file write.
    pub fn evaluate_write(&self, path: &str) -> GateDecision {
        WriteGate::new(&self.settings.agents, &self.locator).evaluate(path)
    }

    /// Before a delegation.
    pub fn evaluate_delegation(&self, role: &str, prompt: &str) -> GateDecision {
        DelegationGate::new(&self.settings.agents, &self.locator).evaluate(role, prompt)
    }

    /// After a delegation completes.
    pub fn reduce_completion(&self, role: &str, prompt: &str, result: &str) -> Completion {
        CompletionReducer::new(&self.settings.agents, &self.locator).reduce(role, prompt, result)
    }
}
