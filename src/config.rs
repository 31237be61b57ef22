//! Settings loaded from `heddle.toml`.
//!
//! Lookup order: explicit `--config` path, then
//! `<project>/.claude/heddle/heddle.toml`, then `~/.claude/heddle/heddle.toml`,
//! then built-in defaults. Every field has a default, so an empty file is a
//! valid configuration.
//!
//! ```toml
//! [agents]
//! namespace = "heddle"
//! reviewer = "code-reviewer"
//!
//! [sessions]
//! threads_dir = ".claude/heddle/threads"
//! search_roots = ["/srv/shared"]
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name of the settings file inside a config directory.
pub const CONFIG_FILE_NAME: &str = "heddle.toml";

/// Directory (relative to a root) that holds `heddle.toml`.
pub const CONFIG_DIR: &str = ".claude/heddle";

/// Environment variable naming an extra session root, searched first.
pub const SESSION_ROOT_ENV: &str = "HEDDLE_SESSION_ROOT";

/// Role identifiers governed by this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Own namespace; roles are addressed as `<namespace>:<name>`
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_coordinator")]
    pub coordinator: String,
    #[serde(default = "default_planner")]
    pub planner: String,
    #[serde(default = "default_implementer")]
    pub implementer: String,
    #[serde(default = "default_reviewer")]
    pub reviewer: String,
    #[serde(default = "default_explorer")]
    pub explorer: String,
    /// Host-builtin helper roles that are always allowed
    #[serde(default = "default_builtin")]
    pub builtin: Vec<String>,
}

fn default_namespace() -> String {
    "heddle".to_string()
}

fn default_coordinator() -> String {
    "coordinator".to_string()
}

fn default_planner() -> String {
    "planner".to_string()
}

fn default_implementer() -> String {
    "implementer".to_string()
}

fn default_reviewer() -> String {
    "code-reviewer".to_string()
}

fn default_explorer() -> String {
    "explorer".to_string()
}

fn default_builtin() -> Vec<String> {
    [
        "Explore",
        "Plan",
        "Bash",
        "general-purpose",
        "statusline-setup",
        "claude-code-guide",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            coordinator: default_coordinator(),
            planner: default_planner(),
            implementer: default_implementer(),
            reviewer: default_reviewer(),
            explorer: default_explorer(),
            builtin: default_builtin(),
        }
    }
}

impl AgentsConfig {
    /// Strip our namespace prefix, or `None` if `raw` is not in our namespace.
    pub fn local_name<'a>(&self, raw: &'a str) -> Option<&'a str> {
        raw.strip_prefix(self.namespace.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
    }

    /// Fully qualified id for a local role name.
    pub fn qualified(&self, local: &str) -> String {
        format!("{}:{}", self.namespace, local)
    }

    pub fn reviewer_id(&self) -> String {
        self.qualified(&self.reviewer)
    }

    pub fn implementer_id(&self) -> String {
        self.qualified(&self.implementer)
    }

    pub fn planner_id(&self) -> String {
        self.qualified(&self.planner)
    }

    pub fn coordinator_id(&self) -> String {
        self.qualified(&self.coordinator)
    }

    /// Slash command a human uses to drive an escalated task, e.g. `/heddle-skip`.
    pub fn human_command(&self, action: &str) -> String {
        format!("/{}-{}", self.namespace, action)
    }
}

/// Where sessions live and how they are found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Path segment, relative to a root, under which session directories live
    #[serde(default = "default_threads_dir")]
    pub threads_dir: String,
    /// Extra roots searched after the project directory and the home directory
    #[serde(default)]
    pub search_roots: Vec<PathBuf>,
}

fn default_threads_dir() -> String {
    ".claude/heddle/threads".to_string()
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            threads_dir: default_threads_dir(),
            search_roots: Vec::new(),
        }
    }
}

/// Logging output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when neither `HEDDLE_LOG` nor `RUST_LOG` is set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file; stderr when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// The complete `heddle.toml` structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse settings from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse heddle.toml")
    }

    /// Resolve settings the way the CLI does: explicit path, project, home, defaults.
    pub fn discover(explicit: Option<&Path>, project_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::find_config_file(project_dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// First existing config file among the project and home locations.
    pub fn find_config_file(project_dir: &Path) -> Option<PathBuf> {
        let mut candidates = vec![project_dir.join(CONFIG_DIR).join(CONFIG_FILE_NAME)];
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(CONFIG_DIR).join(CONFIG_FILE_NAME));
        }
        candidates.into_iter().find(|p| p.is_file())
    }

    /// Save settings to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize heddle.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Session roots in search order: env override, project dir, home, configured extras.
    pub fn session_roots(&self, project_dir: &Path) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        if let Ok(extra) = std::env::var(SESSION_ROOT_ENV)
            && !extra.trim().is_empty()
        {
            roots.push(PathBuf::from(extra));
        }
        roots.push(project_dir.to_path_buf());
        if let Some(home) = dirs::home_dir() {
            roots.push(home);
        }
        roots.extend(self.sessions.search_roots.iter().cloned());
        roots
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let agents = &self.agents;

        if agents.namespace.trim().is_empty() {
            warnings.push("agents.namespace is empty: own roles cannot be recognized".to_string());
        }
        if agents.namespace.contains(':') {
            warnings.push(format!(
                "agents.namespace '{}' must not contain ':'",
                agents.namespace
            ));
        }

        let names = [
            ("coordinator", &agents.coordinator),
            ("planner", &agents.planner),
            ("implementer", &agents.implementer),
            ("reviewer", &agents.reviewer),
            ("explorer", &agents.explorer),
        ];
        let mut seen = HashSet::new();
        for (label, name) in names {
            if name.trim().is_empty() {
                warnings.push(format!("agents.{} is empty", label));
            } else if !seen.insert(name.as_str()) {
                warnings.push(format!(
                    "agents.{} reuses the role name '{}'",
                    label, name
                ));
            }
        }

        if Path::new(&self.sessions.threads_dir).is_absolute() {
            warnings.push(format!(
                "sessions.threads_dir '{}' should be relative to a session root",
                self.sessions.threads_dir
            ));
        }
        if self.sessions.threads_dir.trim().is_empty() {
            warnings.push("sessions.threads_dir is empty".to_string());
        }

        warnings
    }
}
