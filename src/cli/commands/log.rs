use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::log::LogLogic;
use crate::db::pool::DbPool;
use crate::errors::AppResult;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if matches!(cmd, Commands::Log { print: true }) {
        let mut pool = DbPool::with_busy_timeout(&cfg.database, cfg.busy_timeout_ms)?;
        LogLogic::print_log(&mut pool)?;
    }

    Ok(())
}
