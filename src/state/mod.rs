//! The per-session state document and typed partial updates to it.
//!
//! `WorkflowState` is an owned value: transitions take one by reference and
//! describe their changes as a `StateUpdate`. Only [`store::StateStore`]
//! touches the disk.

pub mod store;

pub use store::{InitOutcome, STATE_FILE_NAME, StateStore};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::StateError;
use crate::workflow::{Phase, TaskStatus};

/// The flat state record persisted as `state.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub ticket: String,
    pub phase: Phase,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context_reviewed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub plan_reviewed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks_reviewed: bool,
    #[serde(default)]
    pub current_task_id: Option<String>,
    #[serde(default)]
    pub task_status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cycle_count: u32,
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Fields written by other tooling; carried through updates untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Read an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl WorkflowState {
    /// Default document for a freshly initialized session.
    pub fn new(ticket: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            ticket: ticket.into(),
            phase: Phase::Context,
            context_reviewed: false,
            plan_reviewed: false,
            tasks_reviewed: false,
            current_task_id: None,
            task_status: None,
            cycle_count: 0,
            started_at: now,
            last_updated: now,
            extra: Map::new(),
        }
    }

    /// Copy of this state with `update` applied. Does not touch timestamps.
    pub fn apply(&self, update: &StateUpdate) -> Self {
        let mut next = self.clone();
        if let Some(phase) = update.phase {
            next.phase = phase;
        }
        if let Some(v) = update.context_reviewed {
            next.context_reviewed = v;
        }
        if let Some(v) = update.plan_reviewed {
            next.plan_reviewed = v;
        }
        if let Some(v) = update.tasks_reviewed {
            next.tasks_reviewed = v;
        }
        if let Some(status) = update.task_status {
            next.task_status = status;
        }
        if let Some(count) = update.cycle_count {
            next.cycle_count = count;
        }
        next
    }

    /// Copy of this state with raw fields replaced one by one (no deep merge).
    ///
    /// Fails if the result is no longer a valid state document.
    pub fn merged(&self, fields: &Map<String, Value>) -> Result<Self, StateError> {
        let mut doc = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(StateError::Invalid("state is not an object".to_string())),
            Err(e) => return Err(StateError::Invalid(e.to_string())),
        };
        for (key, value) in fields {
            doc.insert(key.clone(), value.clone());
        }
        let next: WorkflowState = serde_json::from_value(Value::Object(doc))
            .map_err(|e| StateError::Invalid(e.to_string()))?;
        next.check_invariants()?;
        Ok(next)
    }

    /// `awaiting_approval` and `blocked` only exist during execution.
    pub fn check_invariants(&self) -> Result<(), StateError> {
        if matches!(
            self.task_status,
            Some(TaskStatus::AwaitingApproval) | Some(TaskStatus::Blocked)
        ) && self.phase != Phase::Execution
        {
            return Err(StateError::Invalid(format!(
                "task_status '{}' requires phase 'execution' (phase is '{}')",
                self.task_status.map(|s| s.as_str()).unwrap_or("null"),
                self.phase
            )));
        }
        Ok(())
    }

    /// Refresh `last_updated`, keeping it strictly after `previous`.
    pub fn touch_after(&mut self, previous: DateTime<Utc>) {
        let now = Utc::now();
        self.last_updated = if now > previous {
            now
        } else {
            previous + TimeDelta::microseconds(1)
        };
    }

    /// Raw value of a single field, `Null` when unknown or unset.
    pub fn field(&self, name: &str) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.get(name).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}

/// A set of field replacements produced by a transition.
///
/// `task_status` is doubly optional: `Some(None)` resets it to `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_reviewed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_reviewed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks_reviewed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_status: Option<Option<TaskStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_count: Option<u32>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn context_reviewed(mut self, value: bool) -> Self {
        self.context_reviewed = Some(value);
        self
    }

    pub fn plan_reviewed(mut self, value: bool) -> Self {
        self.plan_reviewed = Some(value);
        self
    }

    pub fn tasks_reviewed(mut self, value: bool) -> Self {
        self.tasks_reviewed = Some(value);
        self
    }

    pub fn task_status(mut self, status: Option<TaskStatus>) -> Self {
        self.task_status = Some(status);
        self
    }

    pub fn cycle_count(mut self, count: u32) -> Self {
        self.cycle_count = Some(count);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The update as raw JSON fields.
    pub fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// `field=value` pairs for guidance text, e.g. `task_status=blocked, cycle_count=3`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(v) = self.context_reviewed {
            parts.push(format!("context_reviewed={}", v));
        }
        if let Some(v) = self.plan_reviewed {
            parts.push(format!("plan_reviewed={}", v));
        }
        if let Some(v) = self.tasks_reviewed {
            parts.push(format!("tasks_reviewed={}", v));
        }
        if let Some(phase) = self.phase {
            parts.push(format!("phase={}", phase));
        }
        if let Some(status) = self.task_status {
            parts.push(format!(
                "task_status={}",
                status.map(|s| s.as_str()).unwrap_or("null")
            ));
        }
        if let Some(count) = self.cycle_count {
            parts.push(format!("cycle_count={}", count));
        }
        parts.join(", ")
    }
}
