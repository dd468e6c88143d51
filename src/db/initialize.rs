use crate::db::migrate::run_pending_migrations;
use crate::errors::AppResult;
use rusqlite::Connection;
use tracing::{debug, info};

/// Bring a workflow database up to the current schema.
/// Returns the number of migrations applied by this call.
pub fn init_db(conn: &Connection) -> AppResult<usize> {
    let applied = run_pending_migrations(conn)?;
    if applied > 0 {
        info!(applied, "workflow schema upgraded");
    } else {
        debug!("workflow schema up to date");
    }
    Ok(applied)
}
