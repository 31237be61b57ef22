//! Host hook entry point: `heddle hook <event>`.

use anyhow::{Context, Result};
use std::io::Read;
use std::process::ExitCode;

use heddle::Engine;
use heddle::hooks::{HookEvent, HookRunner};

pub fn cmd_hook(engine: &Engine, event: &str) -> Result<ExitCode> {
    let event: HookEvent = match event.parse() {
        Ok(event) => event,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read hook payload from stdin")?;

    let outcome = match HookRunner::new(engine).run(event, &input) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Some(output) = outcome.stdout_json(event) {
        println!("{}", output);
    }
    if let Some(reason) = outcome.stderr_text() {
        eprintln!("{}", reason);
    }
    Ok(ExitCode::from(outcome.exit_code()))
}
