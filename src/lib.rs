//! fieldcheck library root.
//! Exposes the CLI parser, the command dispatcher, and the workflow
//! modules (geofencing, attendance, tasks, appeals) for direct use.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::Checkin { .. } | Commands::Checkout { .. } => {
            cli::commands::checkin::handle(&cli.command, cfg)
        }
        Commands::Attendance { .. } => cli::commands::attendance::handle(&cli.command, cfg),
        Commands::Task { .. } => cli::commands::task::handle(&cli.command, cfg),
        Commands::Appeal { .. } => cli::commands::appeal::handle(&cli.command, cfg),
        Commands::History { .. } => cli::commands::history::handle(&cli.command, cfg),
    }
}

/// Load the configuration and apply command-line overrides.
pub fn effective_config(cli: &Cli) -> AppResult<Config> {
    let mut cfg = Config::load()?;

    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    if let Some(zones) = &cli.zones {
        cfg.zones_file = zones.clone();
    }

    Ok(cfg)
}

/// Parse arguments from the process environment.
pub fn parse_args() -> Cli {
    Cli::parse()
}
