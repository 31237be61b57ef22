//! The completion reducer.
//!
//! Runs after a delegated worker finishes: resolves the session, extracts a
//! verdict for reviewers, computes the transition, persists it, and returns
//! guidance for the coordinator. It never fails; anything it cannot resolve
//! degrades to advice without a state change.

pub mod transition;

pub use transition::{Transition, stateless_guidance, transition};

use crate::artifacts::{ArtifactGraph, SessionLocator, parse_verdict};
use crate::config::AgentsConfig;
use crate::state::{StateStore, StateUpdate};
use crate::workflow::{Role, TrackedRole, Verdict};

/// What a completion produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Empty when the role is not tracked.
    pub guidance: String,
    /// The fields that were persisted, if any.
    pub state_updates: Option<StateUpdate>,
}

impl Completion {
    fn advice(guidance: String) -> Self {
        Self {
            guidance,
            state_updates: None,
        }
    }
}

pub struct CompletionReducer<'a> {
    agents: &'a AgentsConfig,
    locator: &'a SessionLocator,
}

impl<'a> CompletionReducer<'a> {
    pub fn new(agents: &'a AgentsConfig, locator: &'a SessionLocator) -> Self {
        Self { agents, locator }
    }

    pub fn reduce(&self, raw_role: &str, prompt: &str, result: &str) -> Completion {
        let Some(role) = Role::parse(raw_role, self.agents).tracked() else {
            return Completion::default();
        };

        let Some(session) = self.locator.session_dir_for(prompt) else {
            return Completion::advice(stateless_guidance(role, self.agents));
        };
        let store = StateStore::new(&session.path);
        if !store.exists() {
            tracing::debug!(dir = %store.session_dir().display(), "session has no state document");
            return Completion::advice(stateless_guidance(role, self.agents));
        }

        let verdict = match role {
            TrackedRole::Reviewer => parse_verdict(result),
            _ => Verdict::Unknown,
        };
        let graph = ArtifactGraph::new(&session.path);

        // Decided under the store's lock so racing completions see each other.
        let mut decided: Option<Transition> = None;
        let outcome = store.transact(|state| {
            let stage = graph.review_stage(state.phase);
            let next = transition(role, state, verdict, stage, self.agents);
            let update = next.update.clone();
            decided = Some(next);
            update
        });

        match (outcome, decided) {
            (Ok(Some(_)), Some(Transition { update, guidance })) => {
                tracing::info!(
                    ticket = %session.ticket,
                    role = raw_role,
                    verdict = %verdict,
                    changes = %update.describe(),
                    "state transition"
                );
                Completion {
                    guidance,
                    state_updates: Some(update),
                }
            }
            (Ok(_), Some(Transition { guidance, .. })) => Completion::advice(guidance),
            (Err(e), Some(Transition { guidance, .. })) => {
                tracing::error!(ticket = %session.ticket, error = %e, "failed to persist state transition");
                Completion::advice(guidance)
            }
            (Err(e), None) => {
                tracing::warn!(error = %e, "unreadable session state, giving advice only");
                Completion::advice(stateless_guidance(role, self.agents))
            }
            (Ok(_), None) => Completion::advice(stateless_guidance(role, self.agents)),
        }
    }
}
