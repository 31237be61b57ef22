//! Session resolution.
//!
//! A session lives at `<root>/<threads_dir>/<ticket>`. Delegation prompts
//! mention it as a path fragment; artifact writes name it as the parent of
//! the target file.

use regex::Regex;
use std::path::{Path, PathBuf};

/// A session directory that exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDir {
    pub path: PathBuf,
    pub ticket: String,
}

/// An artifact write target split into session directory and file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPath {
    pub session_dir: PathBuf,
    pub file_name: String,
    /// Session directory relative to the threads directory, `/`-separated
    pub ticket: String,
}

/// Finds session directories under a fixed set of roots.
#[derive(Debug, Clone)]
pub struct SessionLocator {
    threads_dir: String,
    roots: Vec<PathBuf>,
    fragment: Regex,
}

impl SessionLocator {
    /// `threads_dir` is the segment under each root that holds sessions,
    /// e.g. `.claude/heddle/threads`. Roots are searched in order.
    pub fn new(threads_dir: &str, roots: Vec<PathBuf>) -> Result<Self, regex::Error> {
        let threads_dir = threads_dir.trim_end_matches('/').to_string();
        // The ticket is captured lazily so that a trailing `/<name>.md`
        // is not swallowed into it.
        let pattern = format!(
            r#"{}/([\w\-/]+?)(?:/[\w\-]+\.md|$|\s|['"`])"#,
            regex::escape(&threads_dir)
        );
        let fragment = Regex::new(&pattern)?;
        Ok(Self {
            threads_dir,
            roots,
            fragment,
        })
    }

    pub fn threads_dir(&self) -> &str {
        &self.threads_dir
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Ticket ids mentioned in `text`, in order of appearance.
    pub fn ticket_ids<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.fragment
            .captures_iter(text)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str().trim_end_matches('/'))
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Resolve the first mentioned session that exists under some root.
    ///
    /// Never guesses: returns `None` unless the directory is on disk.
    pub fn session_dir_for(&self, text: &str) -> Option<SessionDir> {
        for ticket in self.ticket_ids(text) {
            for root in &self.roots {
                let candidate = root.join(&self.threads_dir).join(ticket);
                if candidate.is_dir() {
                    tracing::debug!(ticket, path = %candidate.display(), "resolved session");
                    return Some(SessionDir {
                        path: candidate,
                        ticket: ticket.to_string(),
                    });
                }
            }
            tracing::debug!(ticket, "ticket mentioned but no session directory found");
        }
        None
    }

    /// Whether `path` lies in the artifact namespace.
    pub fn is_artifact_path(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        normalized.contains(&format!("{}/", self.threads_dir))
    }

    /// Split an artifact path into its session directory and file name.
    pub fn split_artifact_path(&self, path: &str) -> Option<ArtifactPath> {
        if !self.is_artifact_path(path) {
            return None;
        }
        let path = Path::new(path);
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let session_dir = path.parent()?.to_path_buf();
        if session_dir.as_os_str().is_empty() {
            return None;
        }
        let ticket = self.ticket_of(&session_dir)?;
        Some(ArtifactPath {
            session_dir,
            file_name,
            ticket,
        })
    }

    /// The part of `session_dir` after the last threads-directory segment.
    fn ticket_of(&self, session_dir: &Path) -> Option<String> {
        let normalized = session_dir.to_string_lossy().replace('\\', "/");
        let marker = format!("{}/", self.threads_dir);
        let start = normalized.rfind(&marker)? + marker.len();
        let ticket = normalized[start..].trim_matches('/');
        (!ticket.is_empty()).then(|| ticket.to_string())
    }
}
