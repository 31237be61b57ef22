//! Pure completion transitions: (role, state, verdict, review stage) to a
//! state update plus guidance text. Nothing here touches the disk.

use crate::config::AgentsConfig;
use crate::state::{StateUpdate, WorkflowState};
use crate::workflow::{
    MAX_REVISION_CYCLES, Phase, PlanningSubPhase, ReviewStage, TaskStatus, TrackedRole, Verdict,
};

const GUIDANCE_OPEN: &str = "<post-task-guidance>";
const GUIDANCE_CLOSE: &str = "</post-task-guidance>";

/// The outcome of one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub update: StateUpdate,
    pub guidance: String,
}

impl Transition {
    fn advice(body: String) -> Self {
        Self {
            update: StateUpdate::new(),
            guidance: wrap(&body),
        }
    }

    fn with_update(update: StateUpdate, body: String) -> Self {
        Self {
            update,
            guidance: wrap(&body),
        }
    }
}

fn wrap(body: &str) -> String {
    format!("{}\n{}\n{}", GUIDANCE_OPEN, body.trim_end(), GUIDANCE_CLOSE)
}

/// Compute the transition for a tracked role finishing against `state`.
///
/// `verdict` is only consulted for the reviewer; `stage` says what the
/// reviewer was reviewing.
pub fn transition(
    role: TrackedRole,
    state: &WorkflowState,
    verdict: Verdict,
    stage: ReviewStage,
    agents: &AgentsConfig,
) -> Transition {
    match role {
        TrackedRole::Implementer => implementer_done(state, agents),
        TrackedRole::Planner => Transition::advice(planner_body(agents)),
        TrackedRole::Reviewer => match stage {
            ReviewStage::Task => task_review_done(state, verdict, agents),
            ReviewStage::Planning(sub) => planning_review_done(sub, verdict, agents),
        },
    }
}

/// Advice given when no session state is available. Never mutates anything.
pub fn stateless_guidance(role: TrackedRole, agents: &AgentsConfig) -> String {
    let body = match role {
        TrackedRole::Implementer => format!(
            "Implementer completed. Next: Delegate to {} for task review.",
            agents.reviewer_id()
        ),
        TrackedRole::Reviewer => {
            "Code reviewer completed. Check the review verdict and proceed accordingly.".to_string()
        }
        TrackedRole::Planner => planner_body(agents),
    };
    wrap(&body)
}

fn task_label(state: &WorkflowState) -> &str {
    state.current_task_id.as_deref().unwrap_or("(unknown)")
}

fn implementer_done(state: &WorkflowState, agents: &AgentsConfig) -> Transition {
    let update = StateUpdate::new().task_status(Some(TaskStatus::AwaitingReview));
    let body = format!(
        "Implementer completed task {}.\n\
         State updated: {}\n\n\
         REQUIRED NEXT STEP: Delegate to {} to review this task implementation.\n\
         The reviewer writes review-task-<id>.md with its verdict.",
        task_label(state),
        update.describe(),
        agents.reviewer_id()
    );
    Transition::with_update(update, body)
}

fn planner_body(agents: &AgentsConfig) -> String {
    format!(
        "Planner completed. Plan and tasks now exist.\n\n\
         AUTO-PROCEEDING: Delegate to {} in BACKGROUND mode.\n\
         Use: run_in_background=true\n\
         Inform user: 'Plan review running in background. You can continue working.'\n\n\
         The reviewer will validate:\n\
         - Plan aligns with context.md acceptance criteria\n\
         - Every acceptance criterion has at least one task\n\
         - Tasks are properly scoped and ordered",
        agents.reviewer_id()
    )
}

fn task_review_done(state: &WorkflowState, verdict: Verdict, agents: &AgentsConfig) -> Transition {
    match verdict {
        Verdict::Approved => {
            let update = StateUpdate::new().task_status(Some(TaskStatus::AwaitingApproval));
            let body = format!(
                "Code reviewer APPROVED task {}.\n\
                 State updated: {}\n\n\
                 AUTO-PROCEED: Mark task complete and proceed to the next task.\n\
                 - Edit tasks.md: change [~] to [x] for this task\n\
                 - Update the Progress line\n\
                 - Find the next pending task [ ] and continue",
                task_label(state),
                update.describe()
            );
            Transition::with_update(update, body)
        }

        Verdict::NeedsRevision => {
            let cycle = state.cycle_count.saturating_add(1).min(MAX_REVISION_CYCLES);
            if cycle >= MAX_REVISION_CYCLES {
                let update = StateUpdate::new()
                    .task_status(Some(TaskStatus::Blocked))
                    .cycle_count(cycle);
                let body = format!(
                    "Code reviewer requested REVISION (cycle {} of {}).\n\
                     MAXIMUM CYCLES REACHED - Human intervention required.\n\n\
                     State updated: {}\n\n\
                     STOP AND INFORM USER:\n\
                     - {} : Accept current implementation as-is\n\
                     - {} \"specific guidance\" : Provide detailed guidance for a final attempt\n\
                     - {} : Mark task as blocked and move to the next task",
                    cycle,
                    MAX_REVISION_CYCLES,
                    update.describe(),
                    agents.human_command("approve"),
                    agents.human_command("reject"),
                    agents.human_command("skip")
                );
                Transition::with_update(update, body)
            } else {
                let update = StateUpdate::new()
                    .task_status(Some(TaskStatus::AddressingFeedback))
                    .cycle_count(cycle);
                let body = format!(
                    "Code reviewer requested REVISION (cycle {} of {}).\n\
                     State updated: {}\n\n\
                     NEXT STEP: Delegate back to {} with the reviewer's feedback.\n\
                     Include the specific issues from the review in your delegation prompt.",
                    cycle,
                    MAX_REVISION_CYCLES,
                    update.describe(),
                    agents.implementer_id()
                );
                Transition::with_update(update, body)
            }
        }

        Verdict::Rejected => {
            let update = StateUpdate::new().task_status(Some(TaskStatus::Blocked));
            let body = format!(
                "Code reviewer REJECTED the implementation.\n\
                 State updated: {}\n\n\
                 This typically means the approach is fundamentally flawed.\n\
                 STOP AND INFORM USER - Human intervention required to decide next steps.\n\n\
                 OPTIONS:\n\
                 - {} : Mark task as blocked and move to the next task\n\
                 - Revisit the task definition in tasks.md",
                update.describe(),
                agents.human_command("skip")
            );
            Transition::with_update(update, body)
        }

        Verdict::Unknown => Transition::advice(
            "Code reviewer completed but the verdict is unclear.\n\
             Check the review file for the verdict (APPROVED/NEEDS_REVISION/REJECTED)."
                .to_string(),
        ),
    }
}

fn planning_review_done(
    sub: PlanningSubPhase,
    verdict: Verdict,
    agents: &AgentsConfig,
) -> Transition {
    match verdict {
        Verdict::Approved => match sub {
            PlanningSubPhase::ContextReview => {
                let update = StateUpdate::new()
                    .context_reviewed(true)
                    .phase(Phase::Planning);
                let body = format!(
                    "Context review APPROVED. Moving to planning phase.\n\
                     State updated: {}\n\n\
                     AUTO-PROCEED: Delegate to {} to create implementation-plan.md and tasks.md",
                    update.describe(),
                    agents.planner_id()
                );
                Transition::with_update(update, body)
            }
            PlanningSubPhase::TasksReview => {
                let update = StateUpdate::new()
                    .tasks_reviewed(true)
                    .phase(Phase::Execution)
                    .task_status(None)
                    .cycle_count(0);
                let body = format!(
                    "Tasks review APPROVED. Moving to execution phase.\n\
                     State updated: {}\n\n\
                     AUTO-PROCEED: Read tasks.md to find the first pending task, then delegate to {}",
                    update.describe(),
                    agents.implementer_id()
                );
                Transition::with_update(update, body)
            }
            PlanningSubPhase::PlanReview => {
                let update = StateUpdate::new().plan_reviewed(true);
                let body = format!(
                    "Plan review APPROVED.\n\
                     State updated: {}\n\n\
                     AUTO-PROCEED: Delegate to {} to review tasks.md",
                    update.describe(),
                    agents.reviewer_id()
                );
                Transition::with_update(update, body)
            }
        },

        Verdict::NeedsRevision => Transition::advice(format!(
            "Review verdict: NEEDS_REVISION\n\n\
             STOP AND INFORM USER: The review found issues that need to be addressed.\n\n\
             AVAILABLE COMMANDS:\n\
             - {} : Accept current state despite feedback\n\
             - {} \"feedback\" : Provide specific guidance for revision\n\
             - {} : Mark as blocked and move on\n\n\
             Wait for user guidance on how to proceed.",
            agents.human_command("approve"),
            agents.human_command("reject"),
            agents.human_command("skip")
        )),

        Verdict::Rejected => Transition::advice(format!(
            "Review verdict: REJECTED\n\n\
             STOP AND INFORM USER: The plan has fundamental issues that revision cannot address.\n\n\
             AVAILABLE COMMANDS:\n\
             - {} \"feedback\" : Send the work back with specific guidance\n\
             - {} : Skip this phase and move on\n\
             - Revisit context.md to clarify requirements\n\n\
             Wait for user guidance on how to proceed.",
            agents.human_command("reject"),
            agents.human_command("skip")
        )),

        Verdict::Unknown => Transition::advice(
            "Code reviewer completed. Check the review file for the verdict.".to_string(),
        ),
    }
}
