//! Administrative event log (`log` table): init, vacuum, applied migrations.
//!
//! Workflow transitions go to the `audit` table instead.

use crate::errors::AppResult;
use chrono::Utc;
use rusqlite::{Connection, params};

/// One row of the administrative log.
#[derive(Debug, Clone)]
pub struct AdminEvent {
    pub id: i64,
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

pub fn record_admin_event(
    conn: &Connection,
    operation: &str,
    target: &str,
    message: &str,
) -> AppResult<()> {
    conn.prepare_cached(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(params![Utc::now().to_rfc3339(), operation, target, message])?;
    Ok(())
}

/// Every administrative event, oldest first.
pub fn list_admin_events(conn: &Connection) -> AppResult<Vec<AdminEvent>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, date, operation, COALESCE(target, ''), COALESCE(message, '')
         FROM log ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(AdminEvent {
            id: row.get(0)?,
            date: row.get(1)?,
            operation: row.get(2)?,
            target: row.get(3)?,
            message: row.get(4)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
