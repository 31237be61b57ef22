//! File-backed repository for one session's `state.json`.
//!
//! Writers take an exclusive advisory lock on `state.lock` for the whole
//! read-modify-write and persist through a temporary sibling plus rename.
//! Updates that depend on the current document go through
//! [`StateStore::transact`], which decides them under the same lock, so two
//! racing completions for the same session serialize instead of losing an
//! update. Readers do not lock.

use fs2::FileExt;
use serde_json::{Map, Value};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use super::WorkflowState;
use super::StateUpdate;
use crate::errors::StateError;

pub const STATE_FILE_NAME: &str = "state.json";
const LOCK_FILE_NAME: &str = "state.lock";
const TEMP_FILE_NAME: &str = "state.json.tmp";

/// Result of [`StateStore::initialize`].
#[derive(Debug, Clone, PartialEq)]
pub enum InitOutcome {
    Created(WorkflowState),
    AlreadyExists(PathBuf),
}

impl fmt::Display for InitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitOutcome::Created(state) => {
                write!(f, "Initialized {} for {}", STATE_FILE_NAME, state.ticket)
            }
            InitOutcome::AlreadyExists(path) => {
                write!(f, "State file already exists at {}", path.display())
            }
        }
    }
}

pub struct StateStore {
    session_dir: PathBuf,
    state_file: PathBuf,
}

impl StateStore {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        let session_dir = session_dir.into();
        let state_file = session_dir.join(STATE_FILE_NAME);
        Self {
            session_dir,
            state_file,
        }
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    pub fn exists(&self) -> bool {
        self.state_file.is_file()
    }

    /// Create the default document unless one already exists.
    ///
    /// Idempotent: an existing document is left untouched.
    pub fn initialize(&self, ticket: &str) -> Result<InitOutcome, StateError> {
        if self.session_dir.as_os_str().is_empty() {
            return Err(StateError::MissingArgument("session directory"));
        }
        if ticket.trim().is_empty() {
            return Err(StateError::MissingArgument("ticket id"));
        }

        if self.exists() {
            return Ok(InitOutcome::AlreadyExists(self.state_file.clone()));
        }

        fs::create_dir_all(&self.session_dir)
            .map_err(|e| StateError::io(&self.session_dir, e))?;

        let _lock = self.lock()?;
        // Another writer may have won the race while we waited for the lock.
        if self.exists() {
            return Ok(InitOutcome::AlreadyExists(self.state_file.clone()));
        }

        let state = WorkflowState::new(ticket);
        self.write_document(&state)?;
        tracing::info!(ticket, path = %self.state_file.display(), "initialized session state");
        Ok(InitOutcome::Created(state))
    }

    /// Read the whole document.
    pub fn read(&self) -> Result<WorkflowState, StateError> {
        let content = self.read_raw()?;
        serde_json::from_str(&content).map_err(|source| StateError::Parse {
            path: self.state_file.clone(),
            source,
        })
    }

    /// Read one field; `Null` for unknown or unset fields.
    pub fn read_field(&self, field: &str) -> Result<Value, StateError> {
        let content = self.read_raw()?;
        let doc: Map<String, Value> =
            serde_json::from_str(&content).map_err(|source| StateError::Parse {
                path: self.state_file.clone(),
                source,
            })?;
        Ok(doc.get(field).cloned().unwrap_or(Value::Null))
    }

    /// Like [`read_field`](Self::read_field) but collapses any failure to `Null`.
    pub fn field_or_null(&self, field: &str) -> Value {
        self.read_field(field).unwrap_or(Value::Null)
    }

    /// Replace the given raw fields and persist. Never creates a document.
    pub fn update(&self, fields: &Map<String, Value>) -> Result<WorkflowState, StateError> {
        self.read_modify_write(|current| current.merged(fields))
    }

    /// Apply a typed update and persist. Never creates a document.
    pub fn apply(&self, update: &StateUpdate) -> Result<WorkflowState, StateError> {
        self.read_modify_write(|current| Ok(current.apply(update)))
    }

    /// Decide an update from the current document and persist it, all under
    /// the writer lock.
    ///
    /// Returns `None` without writing when `decide` yields an empty update.
    pub fn transact<F>(&self, decide: F) -> Result<Option<WorkflowState>, StateError>
    where
        F: FnOnce(&WorkflowState) -> StateUpdate,
    {
        let (_lock, current) = self.read_locked()?;
        let update = decide(&current);
        if update.is_empty() {
            return Ok(None);
        }
        let next = current.apply(&update);
        self.commit(&current, next).map(Some)
    }

    fn read_modify_write<F>(&self, change: F) -> Result<WorkflowState, StateError>
    where
        F: FnOnce(&WorkflowState) -> Result<WorkflowState, StateError>,
    {
        let (_lock, current) = self.read_locked()?;
        let next = change(&current)?;
        self.commit(&current, next)
    }

    /// Take the writer lock and read the document it guards.
    fn read_locked(&self) -> Result<(File, WorkflowState), StateError> {
        if !self.exists() {
            return Err(StateError::NotFound {
                path: self.state_file.clone(),
            });
        }
        let lock = self.lock()?;
        let current = self.read()?;
        Ok((lock, current))
    }

    fn commit(
        &self,
        current: &WorkflowState,
        mut next: WorkflowState,
    ) -> Result<WorkflowState, StateError> {
        next.touch_after(current.last_updated);
        self.write_document(&next)?;
        Ok(next)
    }

    fn read_raw(&self) -> Result<String, StateError> {
        if !self.exists() {
            return Err(StateError::NotFound {
                path: self.state_file.clone(),
            });
        }
        fs::read_to_string(&self.state_file).map_err(|e| StateError::io(&self.state_file, e))
    }

    fn write_document(&self, state: &WorkflowState) -> Result<(), StateError> {
        let mut content = serde_json::to_string_pretty(state)
            .map_err(|e| StateError::Invalid(e.to_string()))?;
        content.push('\n');

        let temp = self.session_dir.join(TEMP_FILE_NAME);
        fs::write(&temp, content).map_err(|e| StateError::io(&temp, e))?;
        fs::rename(&temp, &self.state_file).map_err(|e| StateError::io(&self.state_file, e))
    }

    fn lock(&self) -> Result<File, StateError> {
        let path = self.session_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| StateError::Lock {
                path: path.clone(),
                source,
            })?;
        file.lock_exclusive()
            .map_err(|source| StateError::Lock { path, source })?;
        Ok(file)
    }
}
