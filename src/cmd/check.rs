//! Dry-run gate evaluation - `heddle check`.

use anyhow::Result;
use std::process::ExitCode;

use heddle::Engine;
use heddle::gates::GateDecision;

use super::super::CheckCommands;

pub fn cmd_check(engine: &Engine, command: CheckCommands) -> Result<ExitCode> {
    let decision = match command {
        CheckCommands::Write { path } => engine.evaluate_write(&path),
        CheckCommands::Delegation { role, prompt } => engine.evaluate_delegation(&role, &prompt),
    };

    match decision {
        GateDecision::Allow => {
            println!("{} Allowed", console::style("✓").green());
            Ok(ExitCode::SUCCESS)
        }
        GateDecision::Deny { reason } => {
            println!("{} {}", console::style("✗").red(), reason);
            Ok(ExitCode::from(2))
        }
    }
}
