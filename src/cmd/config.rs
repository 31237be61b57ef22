//! Configuration view and validation commands - `heddle config`.

use anyhow::Result;
use std::path::{Path, PathBuf};

use heddle::config::{CONFIG_DIR, CONFIG_FILE_NAME, Settings};

use super::super::ConfigCommands;

pub fn cmd_config(
    project_dir: &Path,
    explicit: Option<&Path>,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let found = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Settings::find_config_file(project_dir),
    };

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("{}", console::style("Heddle Configuration").bold().cyan());
            println!("====================");
            println!();

            let settings = match &found {
                Some(path) => {
                    println!("Config file: {}", path.display());
                    Settings::load(path)?
                }
                None => {
                    println!("No heddle.toml found. Using default configuration.");
                    Settings::default()
                }
            };
            println!();
            print!("{}", toml::to_string_pretty(&settings)?);
            println!();

            println!("Effective values:");
            println!("  coordinator = \"{}\"", settings.agents.coordinator_id());
            println!("  reviewer = \"{}\"", settings.agents.reviewer_id());
            println!("  implementer = \"{}\"", settings.agents.implementer_id());
            println!("  session roots:");
            for root in settings.session_roots(project_dir) {
                println!(
                    "    {}",
                    root.join(&settings.sessions.threads_dir).display()
                );
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let Some(path) = found else {
                println!("No heddle.toml found. Using defaults (valid).");
                return Ok(());
            };

            let settings = Settings::load(&path)?;
            let warnings = settings.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("{}", console::style("Configuration warnings:").yellow());
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            let config_path = match explicit {
                Some(path) => path.to_path_buf(),
                None => default_config_path(project_dir),
            };
            if config_path.exists() {
                println!("heddle.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if let Some(parent) = config_path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }

            Settings::default().save(&config_path)?;

            println!("Created heddle.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [agents] namespace and role names");
            println!("  - [sessions] threads_dir, search_roots");
            println!("  - [logging] level, file");
            println!();
        }
    }

    Ok(())
}

fn default_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(CONFIG_DIR).join(CONFIG_FILE_NAME)
}
