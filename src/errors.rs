//! Typed error hierarchy for heddle.
//!
//! Two enums cover the two fallible boundaries:
//! - `StateError`: state document persistence
//! - `HookError`: decoding the host's hook payload
//!
//! Gate decisions are not errors: a denied write or delegation is a normal
//! `GateDecision`, never an `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the state store.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("No state.json found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse state document at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid state update: {0}")]
    Invalid(String),

    #[error("Failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StateError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from decoding a hook invocation.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Error parsing input: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    #[error(
        "Invalid hook event '{0}'. Valid values: pre-write, pre-task, post-task"
    )]
    UnknownEvent(String),
}
