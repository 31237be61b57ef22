use super::types::{HookEvent, HookOutcome, HookPayload};
use crate::engine::Engine;
use crate::errors::HookError;
use crate::gates::GateDecision;

/// Dispatches decoded hook payloads to the engine.
pub struct HookRunner<'a> {
    engine: &'a Engine,
}

impl<'a> HookRunner<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Decode `input` and run `event` against it.
    ///
    /// Only a payload that is not valid JSON is an error; every decision,
    /// including a denial, is an `Ok` outcome.
    pub fn run(&self, event: HookEvent, input: &str) -> Result<HookOutcome, HookError> {
        let payload = HookPayload::parse(input)?;
        Ok(self.dispatch(event, &payload))
    }

    pub fn dispatch(&self, event: HookEvent, payload: &HookPayload) -> HookOutcome {
        tracing::debug!(event = %event, role = payload.subagent_type(), "hook invoked");
        match event {
            HookEvent::PreWrite => gate_outcome(self.engine.evaluate_write(payload.file_path())),
            HookEvent::PreTask => gate_outcome(
                self.engine
                    .evaluate_delegation(payload.subagent_type(), payload.prompt()),
            ),
            HookEvent::PostTask => {
                let completion = self.engine.reduce_completion(
                    payload.subagent_type(),
                    payload.prompt(),
                    &payload.result_text(),
                );
                if completion.guidance.is_empty() {
                    HookOutcome::Allow
                } else {
                    HookOutcome::Context(completion.guidance)
                }
            }
        }
    }
}

fn gate_outcome(decision: GateDecision) -> HookOutcome {
    match decision {
        GateDecision::Allow => HookOutcome::Allow,
        GateDecision::Deny { reason } => HookOutcome::Block(reason),
    }
}
