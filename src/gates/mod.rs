//! Admission control run before a mutating action.
//!
//! - [`write`]: before an artifact file is written
//! - [`delegation`]: before work is delegated to a worker role
//!
//! Both return a [`GateDecision`] and never fail: a denial is an ordinary,
//! recoverable outcome carrying a reason that names the missing precondition
//! and the remedy.

pub mod delegation;
pub mod write;

pub use delegation::DelegationGate;
pub use write::WriteGate;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum GateDecision {
    Allow,
    Deny { reason: String },
}

impl GateDecision {
    pub fn deny(reason: impl Into<String>) -> Self {
        GateDecision::Deny {
            reason: reason.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            GateDecision::Allow => None,
            GateDecision::Deny { reason } => Some(reason),
        }
    }
}
