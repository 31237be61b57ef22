//! Delegation admission.
//!
//! Rules, in order:
//! 1. the coordinator is never a delegation target
//! 2. builtin, foreign and missing roles pass
//! 3. no resolvable session: pass
//! 4. before execution: the implementer needs an approved `review-tasks.md`
//! 5. in execution: the per-role task state machine in [`check_execution`]

use super::GateDecision;
use crate::artifacts::{ArtifactGraph, SessionLocator};
use crate::config::AgentsConfig;
use crate::state::{StateStore, WorkflowState};
use crate::workflow::{MAX_REVISION_CYCLES, Phase, Role, TaskStatus};

pub struct DelegationGate<'a> {
    agents: &'a AgentsConfig,
    locator: &'a SessionLocator,
}

impl<'a> DelegationGate<'a> {
    pub fn new(agents: &'a AgentsConfig, locator: &'a SessionLocator) -> Self {
        Self { agents, locator }
    }

    /// Decide whether `raw_role` may be started with `prompt`.
    pub fn evaluate(&self, raw_role: &str, prompt: &str) -> GateDecision {
        let role = Role::parse(raw_role, self.agents);
        let decision = self.decide(&role, prompt);
        if let GateDecision::Deny { reason } = &decision {
            tracing::info!(
                role = raw_role,
                reason = %reason.lines().next().unwrap_or(""),
                "delegation denied"
            );
        }
        decision
    }

    fn decide(&self, role: &Role, prompt: &str) -> GateDecision {
        match role {
            Role::Coordinator => return deny_coordinator(self.agents),
            Role::Builtin(_) | Role::Foreign(_) | Role::Missing => return GateDecision::Allow,
            _ => {}
        }

        let Some(session) = self.locator.session_dir_for(prompt) else {
            return GateDecision::Allow;
        };

        match self.read_state(&StateStore::new(&session.path)) {
            Some(state) if state.phase == Phase::Execution => {
                check_execution(role, &state, self.agents)
            }
            _ => check_before_execution(role, &ArtifactGraph::new(&session.path), self.agents),
        }
    }

    fn read_state(&self, store: &StateStore) -> Option<WorkflowState> {
        if !store.exists() {
            return None;
        }
        match store.read() {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable session state, applying artifact checks only");
                None
            }
        }
    }
}

/// Checks applied while the session has not reached execution, or has no
/// readable state at all.
pub fn check_before_execution(
    role: &Role,
    graph: &ArtifactGraph,
    agents: &AgentsConfig,
) -> GateDecision {
    if *role == Role::Implementer && !graph.tasks_review_approved() {
        return GateDecision::deny(format!(
            "BLOCKED: Cannot delegate to implementer before tasks.md is reviewed and APPROVED\n\
             Delegate to {} to review tasks.md first.",
            agents.reviewer_id()
        ));
    }
    GateDecision::Allow
}

/// The execution-phase state machine, as a pure function of the role and
/// the session state.
pub fn check_execution(role: &Role, state: &WorkflowState, agents: &AgentsConfig) -> GateDecision {
    let approve = agents.human_command("approve");
    let reject = agents.human_command("reject");

    match role {
        Role::Coordinator => return deny_coordinator(agents),
        Role::Builtin(_) | Role::Foreign(_) | Role::Missing | Role::Explorer => {
            return GateDecision::Allow;
        }
        Role::Planner => {
            return GateDecision::deny(format!(
                "BLOCKED: Cannot delegate to planner during execution phase\n\
                 Tasks are already defined in tasks.md. Delegate to {} to execute them.",
                agents.implementer_id()
            ));
        }
        Role::Implementer => match state.task_status {
            Some(TaskStatus::AwaitingReview) => {
                return GateDecision::deny(format!(
                    "BLOCKED: Cannot delegate to implementer - task is awaiting code review\n\
                     Delegate to {} to review the implementation first.",
                    agents.reviewer_id()
                ));
            }
            Some(TaskStatus::AwaitingApproval) => {
                return GateDecision::deny(format!(
                    "BLOCKED: Cannot delegate to implementer - task is awaiting human approval\n\
                     Use {} to approve the task, or {} to reject it with feedback.",
                    approve, reject
                ));
            }
            _ => {}
        },
        Role::Reviewer => {
            if state.task_status == Some(TaskStatus::AwaitingApproval) {
                return GateDecision::deny(format!(
                    "BLOCKED: Cannot delegate to reviewer - task was already reviewed and is awaiting human approval\n\
                     Use {} to approve the task, or {} to reject it with feedback.",
                    approve, reject
                ));
            }
        }
        Role::Other(_) => {}
    }

    if state.cycle_count >= MAX_REVISION_CYCLES {
        return GateDecision::deny(format!(
            "BLOCKED: Maximum revision cycles ({}) reached for the current task\n\
             Human intervention required. Use {} to accept as-is, {} with guidance, or {} to move past this task.",
            MAX_REVISION_CYCLES,
            approve,
            reject,
            agents.human_command("skip")
        ));
    }

    GateDecision::Allow
}

fn deny_coordinator(agents: &AgentsConfig) -> GateDecision {
    GateDecision::deny(format!(
        "BLOCKED: Cannot delegate to {} - it is the coordinator, not a worker agent",
        agents.coordinator_id()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::REVIEW_TASKS;
    use crate::state::StateUpdate;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const THREADS: &str = ".claude/heddle/threads";
    const PROMPT: &str = "Work on .claude/heddle/threads/TEST-123/tasks.md";

    fn agents() -> AgentsConfig {
        AgentsConfig::default()
    }

    fn role(raw: &str) -> Role {
        Role::parse(raw, &agents())
    }

    fn execution_state(status: Option<TaskStatus>, cycles: u32) -> WorkflowState {
        WorkflowState::new("TEST-123").apply(
            &StateUpdate::new()
                .phase(Phase::Execution)
                .task_status(status)
                .cycle_count(cycles),
        )
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        session: PathBuf,
        agents: AgentsConfig,
        locator: SessionLocator,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let session = dir.path().join(THREADS).join("TEST-123");
            fs::create_dir_all(&session).unwrap();
            let locator = SessionLocator::new(THREADS, vec![dir.path().to_path_buf()]).unwrap();
            Self {
                _dir: dir,
                session,
                agents: agents(),
                locator,
            }
        }

        fn store(&self) -> StateStore {
            StateStore::new(&self.session)
        }

        fn evaluate(&self, role: &str, prompt: &str) -> GateDecision {
            DelegationGate::new(&self.agents, &self.locator).evaluate(role, prompt)
        }
    }

    #[test]
    fn test_coordinator_always_denied() {
        let f = Fixture::new();
        let decision = f.evaluate("heddle:coordinator", "anything");
        assert!(decision.reason().unwrap().contains("coordinator, not a worker"));

        for status in [
            None,
            Some(TaskStatus::AwaitingReview),
            Some(TaskStatus::AwaitingApproval),
            Some(TaskStatus::AddressingFeedback),
            Some(TaskStatus::Blocked),
        ] {
            let state = execution_state(status, 0);
            assert!(!check_execution(&role("heddle:coordinator"), &state, &agents()).is_allowed());
        }
    }

    #[test]
    fn test_builtin_foreign_and_missing_roles_pass() {
        let f = Fixture::new();
        f.store().initialize("TEST-123").unwrap();
        f.store()
            .apply(&StateUpdate::new().phase(Phase::Execution).cycle_count(5))
            .unwrap();

        assert!(f.evaluate("Explore", PROMPT).is_allowed());
        assert!(f.evaluate("general-purpose", PROMPT).is_allowed());
        assert!(f.evaluate("other-plugin:helper", PROMPT).is_allowed());
        assert!(f.evaluate("", PROMPT).is_allowed());
    }

    #[test]
    fn test_no_session_allows_everything_but_coordinator() {
        let f = Fixture::new();
        assert!(f.evaluate("heddle:implementer", "do the thing").is_allowed());
        assert!(
            f.evaluate("heddle:implementer", ".claude/heddle/threads/GHOST-9/tasks.md")
                .is_allowed()
        );
    }

    #[test]
    fn test_implementer_needs_approved_tasks_before_execution() {
        let f = Fixture::new();
        let decision = f.evaluate("heddle:implementer", PROMPT);
        assert!(decision.reason().unwrap().contains("tasks.md is reviewed and APPROVED"));

        f.store().initialize("TEST-123").unwrap();
        assert!(!f.evaluate("heddle:implementer", PROMPT).is_allowed());

        fs::write(f.session.join(REVIEW_TASKS), "**Verdict:** APPROVED").unwrap();
        assert!(f.evaluate("heddle:implementer", PROMPT).is_allowed());
    }

    #[test]
    fn test_other_roles_pass_before_execution() {
        let f = Fixture::new();
        f.store().initialize("TEST-123").unwrap();
        assert!(f.evaluate("heddle:planner", PROMPT).is_allowed());
        assert!(f.evaluate("heddle:code-reviewer", PROMPT).is_allowed());
        assert!(f.evaluate("heddle:explorer", PROMPT).is_allowed());
    }

    #[test]
    fn test_corrupt_state_falls_back_to_artifact_checks() {
        let f = Fixture::new();
        fs::write(f.session.join("state.json"), "{ not json").unwrap();
        assert!(!f.evaluate("heddle:implementer", PROMPT).is_allowed());
        assert!(f.evaluate("heddle:planner", PROMPT).is_allowed());
    }

    #[test]
    fn test_execution_implementer_statuses() {
        let implementer = role("heddle:implementer");
        let a = agents();

        let decision = check_execution(
            &implementer,
            &execution_state(Some(TaskStatus::AwaitingReview), 0),
            &a,
        );
        assert!(decision.reason().unwrap().contains("awaiting code review"));

        let decision = check_execution(
            &implementer,
            &execution_state(Some(TaskStatus::AwaitingApproval), 0),
            &a,
        );
        let reason = decision.reason().unwrap();
        assert!(reason.contains("awaiting human approval"));
        assert!(reason.contains("/heddle-approve"));

        assert!(check_execution(&implementer, &execution_state(None, 0), &a).is_allowed());
        assert!(
            check_execution(
                &implementer,
                &execution_state(Some(TaskStatus::AddressingFeedback), 2),
                &a
            )
            .is_allowed()
        );
    }

    #[test]
    fn test_execution_reviewer_statuses() {
        let reviewer = role("heddle:code-reviewer");
        let a = agents();
        assert!(
            check_execution(
                &reviewer,
                &execution_state(Some(TaskStatus::AwaitingReview), 0),
                &a
            )
            .is_allowed()
        );
        assert!(
            !check_execution(
                &reviewer,
                &execution_state(Some(TaskStatus::AwaitingApproval), 0),
                &a
            )
            .is_allowed()
        );
    }

    #[test]
    fn test_execution_planner_denied() {
        let decision = check_execution(&role("heddle:planner"), &execution_state(None, 0), &agents());
        assert!(decision.reason().unwrap().contains("Tasks are already defined"));
    }

    #[test]
    fn test_execution_explorer_always_allowed() {
        let explorer = role("heddle:explorer");
        let state = execution_state(Some(TaskStatus::Blocked), 3);
        assert!(check_execution(&explorer, &state, &agents()).is_allowed());
    }

    #[test]
    fn test_cycle_limit_blocks_workers() {
        let a = agents();
        let state = execution_state(Some(TaskStatus::Blocked), MAX_REVISION_CYCLES);

        for raw in ["heddle:implementer", "heddle:code-reviewer", "heddle:docs-writer"] {
            let decision = check_execution(&role(raw), &state, &a);
            let reason = decision.reason().unwrap();
            assert!(reason.contains("Maximum revision cycles (3)"), "{raw}: {reason}");
            assert!(reason.contains("/heddle-skip"));
        }

        let below = execution_state(Some(TaskStatus::AddressingFeedback), 2);
        assert!(check_execution(&role("heddle:docs-writer"), &below, &a).is_allowed());
    }

    #[test]
    fn test_execution_state_read_from_disk() {
        let f = Fixture::new();
        f.store().initialize("TEST-123").unwrap();
        f.store()
            .apply(
                &StateUpdate::new()
                    .phase(Phase::Execution)
                    .task_status(Some(TaskStatus::AwaitingReview)),
            )
            .unwrap();

        assert!(!f.evaluate("heddle:implementer", PROMPT).is_allowed());
        assert!(f.evaluate("heddle:code-reviewer", PROMPT).is_allowed());
        assert!(!f.evaluate("heddle:planner", PROMPT).is_allowed());
    }
}
