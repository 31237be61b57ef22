//! Write admission: the artifact dependency graph.
//!
//! ```text
//! context.md              (none; initializes session state)
//! research.md             context.md
//! implementation-plan.md  context.md + review-context.md APPROVED
//! tasks.md                context.md + implementation-plan.md + plan review APPROVED
//! review-context.md       context.md
//! review-plan.md          implementation-plan.md   (also review-implementation.md)
//! review-tasks.md         tasks.md
//! review-task-<id>.md     review-tasks.md APPROVED
//! review-<other>.md       implementation-plan.md
//! anything else           allowed
//! ```
//!
//! Paths outside the artifact namespace always pass.

use super::GateDecision;
use crate::artifacts::{
    ArtifactGraph, ArtifactName, CONTEXT, IMPLEMENTATION_PLAN, SessionLocator, TASKS,
};
use crate::config::AgentsConfig;
use crate::state::{InitOutcome, StateStore};

pub struct WriteGate<'a> {
    agents: &'a AgentsConfig,
    locator: &'a SessionLocator,
}

impl<'a> WriteGate<'a> {
    pub fn new(agents: &'a AgentsConfig, locator: &'a SessionLocator) -> Self {
        Self { agents, locator }
    }

    /// Decide whether `path` may be written.
    ///
    /// Writing `context.md` initializes the session's state document when
    /// none exists; that is the only side effect of this gate.
    pub fn evaluate(&self, path: &str) -> GateDecision {
        let Some(target) = self.locator.split_artifact_path(path) else {
            return GateDecision::Allow;
        };

        let graph = ArtifactGraph::new(&target.session_dir);
        let name = ArtifactName::classify(&target.file_name);

        if name == ArtifactName::Context {
            self.initialize_session(&StateStore::new(&target.session_dir), &target.ticket);
            return GateDecision::Allow;
        }

        let decision = self.check_preconditions(&name, &graph);
        if let GateDecision::Deny { reason } = &decision {
            tracing::info!(path, reason = %reason.lines().next().unwrap_or(""), "write denied");
        }
        decision
    }

    fn check_preconditions(&self, name: &ArtifactName, graph: &ArtifactGraph) -> GateDecision {
        let reviewer = self.agents.reviewer_id();

        match name {
            ArtifactName::Context | ArtifactName::Other(_) => GateDecision::Allow,

            ArtifactName::Research => {
                require_exists(graph, CONTEXT, "research.md", "Create context.md first.")
            }

            ArtifactName::ImplementationPlan => {
                if !graph.exists(CONTEXT) {
                    return GateDecision::deny(
                        "BLOCKED: context.md must exist before creating implementation-plan.md\n\
                         Create context.md first and settle it with the user.",
                    );
                }
                if !graph.context_review_approved() {
                    return GateDecision::deny(format!(
                        "BLOCKED: context.md must be reviewed and APPROVED before creating implementation-plan.md\n\
                         Delegate to {} to review context.md first.",
                        reviewer
                    ));
                }
                GateDecision::Allow
            }

            ArtifactName::Tasks => {
                if !graph.exists(CONTEXT) {
                    return GateDecision::deny(
                        "BLOCKED: context.md must exist before creating tasks.md\n\
                         Create context.md first.",
                    );
                }
                if !graph.exists(IMPLEMENTATION_PLAN) {
                    return GateDecision::deny(format!(
                        "BLOCKED: implementation-plan.md must exist before creating tasks.md\n\
                         Delegate to {} to write the plan first.",
                        self.agents.planner_id()
                    ));
                }
                if !graph.plan_review_approved() {
                    return GateDecision::deny(format!(
                        "BLOCKED: implementation-plan.md must be reviewed and APPROVED before creating tasks.md\n\
                         Delegate to {} to review implementation-plan.md first.",
                        reviewer
                    ));
                }
                GateDecision::Allow
            }

            ArtifactName::ContextReview => {
                if graph.exists(CONTEXT) {
                    GateDecision::Allow
                } else {
                    GateDecision::deny("BLOCKED: context.md must exist before reviewing it")
                }
            }

            ArtifactName::PlanReview => {
                if graph.exists(IMPLEMENTATION_PLAN) {
                    GateDecision::Allow
                } else {
                    GateDecision::deny(
                        "BLOCKED: implementation-plan.md must exist before reviewing it",
                    )
                }
            }

            ArtifactName::TasksReview => {
                if graph.exists(TASKS) {
                    GateDecision::Allow
                } else {
                    GateDecision::deny("BLOCKED: tasks.md must exist before reviewing it")
                }
            }

            ArtifactName::TaskReview(_) => {
                if graph.tasks_review_approved() {
                    GateDecision::Allow
                } else {
                    GateDecision::deny(format!(
                        "BLOCKED: tasks.md must be reviewed and APPROVED before entering execution phase\n\
                         Delegate to {} to review tasks.md first.",
                        reviewer
                    ))
                }
            }

            ArtifactName::OtherReview(_) => {
                if graph.exists(IMPLEMENTATION_PLAN) {
                    GateDecision::Allow
                } else {
                    GateDecision::deny(
                        "BLOCKED: implementation-plan.md must exist before creating reviews\n\
                         The planning phase must complete before reviews can begin.",
                    )
                }
            }
        }
    }

    fn initialize_session(&self, store: &StateStore, ticket: &str) {
        match store.initialize(ticket) {
            Ok(InitOutcome::Created(_)) => {}
            Ok(InitOutcome::AlreadyExists(_)) => {
                tracing::debug!(ticket, "session state already present");
            }
            Err(e) => {
                tracing::warn!(ticket, error = %e, "could not initialize session state");
            }
        }
    }
}

fn require_exists(graph: &ArtifactGraph, needed: &str, target: &str, remedy: &str) -> GateDecision {
    if graph.exists(needed) {
        GateDecision::Allow
    } else {
        GateDecision::deny(format!(
            "BLOCKED: {} must exist before creating {}\n{}",
            needed, target, remedy
        ))
    }
}
