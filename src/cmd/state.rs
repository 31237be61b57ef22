//! Session state commands - `heddle state`.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;
use std::process::ExitCode;

use heddle::state::{InitOutcome, StateStore};

use super::super::StateCommands;

pub fn cmd_state(command: StateCommands) -> Result<ExitCode> {
    match command {
        StateCommands::Init {
            session_dir,
            ticket,
        } => {
            let ticket = match ticket {
                Some(ticket) => ticket,
                None => default_ticket(&session_dir)?,
            };
            let store = StateStore::new(&session_dir);
            match store.initialize(&ticket)? {
                outcome @ InitOutcome::Created(_) => {
                    println!("{} {}", console::style("✓").green(), outcome);
                }
                outcome @ InitOutcome::AlreadyExists(_) => {
                    println!("{}", console::style(outcome).dim());
                }
            }
        }
        StateCommands::Show { session_dir, field } => {
            let store = StateStore::new(&session_dir);
            match field {
                Some(field) => match store.read_field(&field)? {
                    Value::String(s) => println!("{}", s),
                    other => println!("{}", other),
                },
                None => {
                    let state = store.read()?;
                    println!("{}", serde_json::to_string_pretty(&state)?);
                }
            }
        }
        StateCommands::Set {
            session_dir,
            assignments,
        } => {
            let fields = parse_assignments(&assignments)?;
            let store = StateStore::new(&session_dir);
            let state = store.update(&fields)?;
            println!(
                "{} Updated {} ({} field{})",
                console::style("✓").green(),
                state.ticket,
                fields.len(),
                if fields.len() == 1 { "" } else { "s" }
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn default_ticket(session_dir: &Path) -> Result<String> {
    session_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| {
            format!(
                "Cannot derive a ticket id from '{}'; pass --ticket",
                session_dir.display()
            )
        })
}

/// Parse `field=value` pairs. Values are JSON when they parse as JSON,
/// otherwise plain strings.
pub(crate) fn parse_assignments(assignments: &[String]) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    for assignment in assignments {
        let (key, raw) = assignment
            .split_once('=')
            .with_context(|| format!("Expected field=value, got '{}'", assignment))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("Empty field name in '{}'", assignment);
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(key.to_string(), value);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_assignments_json_and_strings() {
        let fields = parse_assignments(&[
            "phase=execution".to_string(),
            "cycle_count=2".to_string(),
            "task_status=null".to_string(),
            "tasks_reviewed=true".to_string(),
            "note=a=b".to_string(),
        ])
        .unwrap();
        assert_eq!(fields["phase"], json!("execution"));
        assert_eq!(fields["cycle_count"], json!(2));
        assert_eq!(fields["task_status"], Value::Null);
        assert_eq!(fields["tasks_reviewed"], json!(true));
        assert_eq!(fields["note"], json!("a=b"));
    }

    #[test]
    fn test_parse_assignments_rejects_bad_pairs() {
        assert!(parse_assignments(&["phase".to_string()]).is_err());
        assert!(parse_assignments(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_default_ticket_from_directory() {
        assert_eq!(
            default_ticket(Path::new("/p/.claude/heddle/threads/PROJ-9")).unwrap(),
            "PROJ-9"
        );
        assert!(default_ticket(Path::new("/")).is_err());
    }
}
