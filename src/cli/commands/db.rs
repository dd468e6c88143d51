use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::record_admin_event;
use crate::db::migrate::{pending_migrations, run_pending_migrations};
use crate::db::pool::DbPool;
use crate::db::stats;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, RED, RESET, YELLOW};
use tracing::warn;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Db {
        migrate,
        check,
        vacuum,
        info,
    } = cmd
    else {
        return Ok(());
    };

    let mut pool = DbPool::with_busy_timeout(&cfg.database, cfg.busy_timeout_ms)?;

    //
    // 1) MIGRATE
    //
    if *migrate {
        println!("{}▶ Running migrations…{}", CYAN, RESET);
        let applied = run_pending_migrations(&pool.conn)?;
        println!(
            "{}✔ Migration completed ({} applied).{}\n",
            GREEN, applied, RESET
        );
    }

    //
    // 2) INFO
    //
    if *info {
        stats::print_db_info(&mut pool, &cfg.database)?;
    }

    //
    // 3) CHECK
    //
    if *check {
        println!("{}▶ Running integrity check…{}", CYAN, RESET);

        let integrity: String = pool
            .conn
            .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;

        if integrity == "ok" {
            println!("{}✔ Integrity check passed.{}", GREEN, RESET);
        } else {
            println!("{}✘ Integrity check failed:{} {}", RED, RESET, integrity);
        }

        let pending = pending_migrations(&pool.conn)?;
        if pending.is_empty() {
            println!("{}✔ Schema is up to date.{}\n", GREEN, RESET);
        } else {
            println!(
                "{}⚠ Pending migrations:{} {}\n",
                YELLOW,
                RESET,
                pending.join(", ")
            );
        }
    }

    //
    // 4) VACUUM
    //
    if *vacuum {
        println!("{}▶ Running VACUUM…{}", CYAN, RESET);
        pool.conn.execute_batch("VACUUM;")?;
        if let Err(e) =
            record_admin_event(&pool.conn, "vacuum", &cfg.database, "Database vacuumed")
        {
            warn!(error = %e, "failed to write internal log");
        }
        println!("{}✔ Vacuum completed.{}\n", GREEN, RESET);
    }

    Ok(())
}
