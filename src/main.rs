use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use heddle::Engine;
use heddle::config::Settings;

mod cmd;

#[derive(Parser)]
#[command(name = "heddle")]
#[command(version, about = "Phase gates and review state for multi-agent coding workflows")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to heddle.toml. Defaults to .claude/heddle/heddle.toml in the project, then home
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory searched for sessions in place of the current directory
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Handle one host hook invocation; the JSON payload is read from stdin
    Hook {
        /// pre-write, pre-task or post-task
        event: String,
    },
    /// Inspect or edit a session's state.json
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
    /// Run an admission gate and print its decision
    Check {
        #[command(subcommand)]
        command: CheckCommands,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum StateCommands {
    /// Create state.json for a session (no-op if it exists)
    Init {
        session_dir: PathBuf,
        /// Ticket id (defaults to the directory name)
        #[arg(long)]
        ticket: Option<String>,
    },
    /// Print the state document, or one field of it
    Show {
        session_dir: PathBuf,
        field: Option<String>,
    },
    /// Replace fields: `heddle state set <dir> phase=execution cycle_count=0`
    Set {
        session_dir: PathBuf,
        /// field=value pairs; values are parsed as JSON, falling back to strings
        #[arg(required = true)]
        assignments: Vec<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum CheckCommands {
    /// Would writing this path be allowed?
    Write { path: String },
    /// Would delegating to this role be allowed?
    Delegation {
        role: String,
        /// The delegation prompt (used to locate the session)
        #[arg(long, default_value = "")]
        prompt: String,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default heddle.toml file
    Init,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", console::style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    if let Commands::Config { command } = &cli.command {
        cmd::cmd_config(&project_dir, cli.config.as_deref(), command.clone())?;
        return Ok(ExitCode::SUCCESS);
    }

    let settings = Settings::discover(cli.config.as_deref(), &project_dir)?;
    let _log_guard = match heddle::logging::init(&settings.logging, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        }
    };

    match &cli.command {
        Commands::Hook { event } => {
            let engine = Engine::for_project(settings, &project_dir)?;
            cmd::cmd_hook(&engine, event)
        }
        Commands::State { command } => cmd::cmd_state(command.clone()),
        Commands::Check { command } => {
            let engine = Engine::for_project(settings, &project_dir)?;
            cmd::cmd_check(&engine, command.clone())
        }
        Commands::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}
