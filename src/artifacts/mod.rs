//! The session artifact namespace.
//!
//! Artifacts are authored by workers; this module only observes them:
//! whether a file exists, and whether a review file carries an APPROVED
//! verdict. It also resolves session directories from free text.

pub mod session;
pub mod verdict;

pub use session::{ArtifactPath, SessionDir, SessionLocator};
pub use verdict::{parse_verdict, review_approved};

use std::path::{Path, PathBuf};

use crate::workflow::{Phase, PlanningSubPhase, ReviewStage};

pub const CONTEXT: &str = "context.md";
pub const RESEARCH: &str = "research.md";
pub const IMPLEMENTATION_PLAN: &str = "implementation-plan.md";
pub const TASKS: &str = "tasks.md";
pub const REVIEW_CONTEXT: &str = "review-context.md";
pub const REVIEW_PLAN: &str = "review-plan.md";
/// Alternate name for the plan review.
pub const REVIEW_IMPLEMENTATION: &str = "review-implementation.md";
pub const REVIEW_TASKS: &str = "review-tasks.md";

const TASK_REVIEW_PREFIX: &str = "review-task-";
const REVIEW_PREFIX: &str = "review-";
const MARKDOWN_SUFFIX: &str = ".md";

/// A recognized artifact file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactName {
    Context,
    Research,
    ImplementationPlan,
    Tasks,
    ContextReview,
    PlanReview,
    TasksReview,
    /// `review-task-<id>.md`
    TaskReview(String),
    /// Any other `review-*.md`
    OtherReview(String),
    /// Not part of the gated graph
    Other(String),
}

impl ArtifactName {
    pub fn classify(file_name: &str) -> Self {
        match file_name {
            CONTEXT => ArtifactName::Context,
            RESEARCH => ArtifactName::Research,
            IMPLEMENTATION_PLAN => ArtifactName::ImplementationPlan,
            TASKS => ArtifactName::Tasks,
            REVIEW_CONTEXT => ArtifactName::ContextReview,
            REVIEW_PLAN | REVIEW_IMPLEMENTATION => ArtifactName::PlanReview,
            REVIEW_TASKS => ArtifactName::TasksReview,
            _ => {
                if let Some(id) = file_name
                    .strip_prefix(TASK_REVIEW_PREFIX)
                    .and_then(|rest| rest.strip_suffix(MARKDOWN_SUFFIX))
                {
                    ArtifactName::TaskReview(id.to_string())
                } else if file_name.starts_with(REVIEW_PREFIX)
                    && file_name.ends_with(MARKDOWN_SUFFIX)
                {
                    ArtifactName::OtherReview(file_name.to_string())
                } else {
                    ArtifactName::Other(file_name.to_string())
                }
            }
        }
    }
}

/// Read-only view of one session directory's artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactGraph {
    session_dir: PathBuf,
}

impl ArtifactGraph {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.into(),
        }
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.session_dir.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    pub fn approved(&self, review_name: &str) -> bool {
        review_approved(&self.path(review_name))
    }

    pub fn context_review_approved(&self) -> bool {
        self.approved(REVIEW_CONTEXT)
    }

    /// Plan review under either naming variant.
    pub fn plan_review_approved(&self) -> bool {
        self.approved(REVIEW_PLAN) || self.approved(REVIEW_IMPLEMENTATION)
    }

    pub fn tasks_review_approved(&self) -> bool {
        self.approved(REVIEW_TASKS)
    }

    /// Which planning-stage review a reviewer completion stands for.
    ///
    /// In the planning phase, an existing `tasks.md` plus an approved plan
    /// review means the plan is settled and the review must be of the tasks.
    pub fn planning_sub_phase(&self, phase: Phase) -> Option<PlanningSubPhase> {
        match phase {
            Phase::Context => Some(PlanningSubPhase::ContextReview),
            Phase::Planning => {
                if self.exists(TASKS) && self.plan_review_approved() {
                    Some(PlanningSubPhase::TasksReview)
                } else {
                    Some(PlanningSubPhase::PlanReview)
                }
            }
            Phase::Execution => None,
        }
    }

    /// What a reviewer finishing now is reviewing.
    pub fn review_stage(&self, phase: Phase) -> ReviewStage {
        match self.planning_sub_phase(phase) {
            Some(sub) => ReviewStage::Planning(sub),
            None => ReviewStage::Task,
        }
    }
}
