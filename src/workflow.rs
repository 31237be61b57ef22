//! Workflow vocabulary shared by the gates, the store and the reducer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::AgentsConfig;

/// Revision rounds allowed on a single task before a human has to step in.
pub const MAX_REVISION_CYCLES: u32 = 3;

/// Coarse workflow stage. Ordered: `Context < Planning < Execution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Context,
    Planning,
    Execution,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Context => "context",
            Phase::Planning => "planning",
            Phase::Execution => "execution",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "context" => Ok(Phase::Context),
            "planning" => Ok(Phase::Planning),
            "execution" => Ok(Phase::Execution),
            _ => anyhow::bail!(
                "Invalid phase '{}'. Valid values: context, planning, execution",
                s
            ),
        }
    }
}

/// Execution sub-state of the current task. `None` in the state document
/// (`null` on disk) means no task is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    AwaitingReview,
    AwaitingApproval,
    AddressingFeedback,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::AwaitingReview => "awaiting_review",
            TaskStatus::AwaitingApproval => "awaiting_approval",
            TaskStatus::AddressingFeedback => "addressing_feedback",
            TaskStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome a reviewer reports in free text.
///
/// `Unknown` is a first-class result: the reducer branches on it rather than
/// treating a missing verdict as an absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Approved,
    NeedsRevision,
    Rejected,
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Approved => "APPROVED",
            Verdict::NeedsRevision => "NEEDS_REVISION",
            Verdict::Rejected => "REJECTED",
            Verdict::Unknown => "UNKNOWN",
        }
    }

    /// Map a matched keyword (any case) to a verdict.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "APPROVED" => Verdict::Approved,
            "NEEDS_REVISION" => Verdict::NeedsRevision,
            "REJECTED" => Verdict::Rejected,
            _ => Verdict::Unknown,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Worker roles this engine governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedRole {
    Planner,
    Implementer,
    Reviewer,
}

/// A delegation target, classified once from the host's raw role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// The coordinating process itself. Never a valid delegation target.
    Coordinator,
    Planner,
    Implementer,
    Reviewer,
    /// Read-only reconnaissance.
    Explorer,
    /// A host-builtin helper role.
    Builtin(String),
    /// A role namespaced to some other plugin.
    Foreign(String),
    /// A role in our namespace (or unqualified) that has no special rules.
    Other(String),
    /// No role supplied.
    Missing,
}

impl Role {
    /// Classify a raw role identifier against the configured agent names.
    pub fn parse(raw: &str, agents: &AgentsConfig) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Role::Missing;
        }

        if let Some(local) = agents.local_name(raw) {
            if local == agents.coordinator {
                return Role::Coordinator;
            }
            if local == agents.planner {
                return Role::Planner;
            }
            if local == agents.implementer {
                return Role::Implementer;
            }
            if local == agents.reviewer {
                return Role::Reviewer;
            }
            if local == agents.explorer {
                return Role::Explorer;
            }
        }

        if agents.builtin.iter().any(|b| b == raw) {
            return Role::Builtin(raw.to_string());
        }

        if raw.contains(':') && agents.local_name(raw).is_none() {
            return Role::Foreign(raw.to_string());
        }

        Role::Other(raw.to_string())
    }

    /// The tracked counterpart of this role, if the reducer follows it.
    pub fn tracked(&self) -> Option<TrackedRole> {
        match self {
            Role::Planner => Some(TrackedRole::Planner),
            Role::Implementer => Some(TrackedRole::Implementer),
            Role::Reviewer => Some(TrackedRole::Reviewer),
            _ => None,
        }
    }
}

/// Which review a planning-stage reviewer completion stands for.
///
/// Derived once from the phase and the artifacts on disk; the reviewer never
/// self-reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningSubPhase {
    ContextReview,
    PlanReview,
    TasksReview,
}

/// What a reviewer completion is reviewing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStage {
    Planning(PlanningSubPhase),
    Task,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_ordering_is_forward() {
        assert!(Phase::Context < Phase::Planning);
        assert!(Phase::Planning < Phase::Execution);
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!("planning".parse::<Phase>().unwrap(), Phase::Planning);
        assert_eq!("EXECUTION".parse::<Phase>().unwrap(), Phase::Execution);
        assert!("review".parse::<Phase>().is_err());
    }

    #[test]
    fn test_task_status_wire_names() {
        let json = serde_json::to_string(&TaskStatus::AddressingFeedback).unwrap();
        assert_eq!(json, "\"addressing_feedback\"");
        let parsed: TaskStatus = serde_json::from_str("\"awaiting_approval\"").unwrap();
        assert_eq!(parsed, TaskStatus::AwaitingApproval);
    }

    #[test]
    fn test_verdict_from_keyword_is_case_insensitive() {
        assert_eq!(Verdict::from_keyword("approved"), Verdict::Approved);
        assert_eq!(Verdict::from_keyword("Needs_Revision"), Verdict::NeedsRevision);
        assert_eq!(Verdict::from_keyword("REJECTED"), Verdict::Rejected);
        assert_eq!(Verdict::from_keyword("maybe"), Verdict::Unknown);
    }

    #[test]
    fn test_role_parse_own_namespace() {
        let agents = AgentsConfig::default();
        assert_eq!(Role::parse("heddle:coordinator", &agents), Role::Coordinator);
        assert_eq!(Role::parse("heddle:planner", &agents), Role::Planner);
        assert_eq!(Role::parse("heddle:implementer", &agents), Role::Implementer);
        assert_eq!(Role::parse("heddle:code-reviewer", &agents), Role::Reviewer);
        assert_eq!(Role::parse("heddle:explorer", &agents), Role::Explorer);
        assert_eq!(
            Role::parse("heddle:archivist", &agents),
            Role::Other("heddle:archivist".to_string())
        );
    }

    #[test]
    fn test_role_parse_builtin_foreign_and_missing() {
        let agents = AgentsConfig::default();
        assert_eq!(
            Role::parse("Explore", &agents),
            Role::Builtin("Explore".to_string())
        );
        assert_eq!(
            Role::parse("superpowers:code-reviewer", &agents),
            Role::Foreign("superpowers:code-reviewer".to_string())
        );
        assert_eq!(Role::parse("", &agents), Role::Missing);
        assert_eq!(Role::parse("   ", &agents), Role::Missing);
    }

    #[test]
    fn test_role_tracked() {
        assert_eq!(Role::Reviewer.tracked(), Some(TrackedRole::Reviewer));
        assert_eq!(Role::Explorer.tracked(), None);
        assert_eq!(Role::Coordinator.tracked(), None);
    }
}
