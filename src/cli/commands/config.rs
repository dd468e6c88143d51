use crate::cli::parser::Commands;
use crate::config::Config;
use crate::config::migrate::{migrate_file, missing_keys};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, info, success, warning};
use std::process::Command;

fn open_editor(editor: &str, path: &std::path::Path) -> bool {
    matches!(Command::new(editor).arg(path).status(), Ok(s) if s.success())
}

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Config {
        print_config,
        check,
        migrate,
        edit_config,
        editor,
    } = cmd
    else {
        return Ok(());
    };

    let path = Config::config_file();

    // ---- PRINT CONFIG ----
    if *print_config {
        let yaml = serde_yaml::to_string(cfg).map_err(|e| AppError::Config(e.to_string()))?;
        println!("📄 Current configuration:\n");
        println!("{}", yaml);
    }

    // ---- CHECK ----
    if *check {
        if !path.exists() {
            warning(format!(
                "No configuration file at {}; defaults are in use.",
                path.display()
            ));
        } else {
            let missing = missing_keys(&path)?;
            if missing.is_empty() {
                success("Configuration file is complete.");
            } else {
                warning(format!(
                    "Missing keys (defaults apply): {}. Run `fieldcheck config --migrate` to add them.",
                    missing.join(", ")
                ));
            }
        }
    }

    // ---- MIGRATE ----
    if *migrate {
        if !path.exists() {
            warning(format!(
                "No configuration file at {}; run `fieldcheck init` first.",
                path.display()
            ));
        } else {
            let added = migrate_file(&path)?;
            if added.is_empty() {
                info("Configuration file already up to date.");
            } else {
                success(format!("Added to configuration: {}", added.join(", ")));
            }
        }
    }

    // ---- EDIT CONFIG ----
    if *edit_config {
        let default_editor = std::env::var("EDITOR")
            .or_else(|_| std::env::var("VISUAL"))
            .unwrap_or_else(|_| {
                if cfg!(target_os = "windows") {
                    "notepad".to_string()
                } else {
                    "nano".to_string()
                }
            });
        let editor_to_use = editor.clone().unwrap_or_else(|| default_editor.clone());

        if open_editor(&editor_to_use, &path) {
            success(format!(
                "Configuration file edited successfully using '{}'",
                editor_to_use
            ));
        } else {
            warning(format!(
                "Editor '{}' not available, falling back to '{}'",
                editor_to_use, default_editor
            ));
            if open_editor(&default_editor, &path) {
                success(format!(
                    "Configuration file edited successfully using fallback '{}'",
                    default_editor
                ));
            } else {
                error(format!(
                    "Failed to edit configuration file using fallback '{}'",
                    default_editor
                ));
            }
        }
    }

    Ok(())
}
