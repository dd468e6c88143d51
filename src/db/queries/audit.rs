use super::{conversion_error, get_ts, ts_to_db};
use crate::errors::{AppError, AppResult};
use crate::models::appeal::{EntityKind, EntityRef};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use serde::Serialize;

/// One state transition, as seen by the audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub actor_id: i64,
    pub entity: EntityRef,
    pub operation: &'static str,
    pub old_state: Option<String>,
    pub new_state: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: i64,
    pub recorded_at: DateTime<Utc>,
    pub actor_id: i64,
    pub entity: EntityRef,
    pub operation: String,
    pub old_state: Option<String>,
    pub new_state: String,
    pub message: String,
}

fn map_audit(row: &Row) -> rusqlite::Result<AuditRecord> {
    let kind_str: String = row.get("entity_type")?;
    let kind = EntityKind::from_db_str(&kind_str).ok_or_else(|| {
        conversion_error(0, AppError::Other(format!("Invalid entity type: {}", kind_str)))
    })?;

    Ok(AuditRecord {
        id: row.get("id")?,
        recorded_at: get_ts(row, "recorded_at")?,
        actor_id: row.get("actor_id")?,
        entity: EntityRef::new(kind, row.get("entity_id")?),
        operation: row.get("operation")?,
        old_state: row.get("old_state")?,
        new_state: row.get("new_state")?,
        message: row.get::<_, Option<String>>("message")?.unwrap_or_default(),
    })
}

pub fn insert_audit(conn: &Connection, entry: &AuditEntry) -> AppResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO audit (
            recorded_at, actor_id, entity_type, entity_id,
            operation, old_state, new_state, message
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    stmt.execute(params![
        ts_to_db(&Utc::now()),
        entry.actor_id,
        entry.entity.kind().to_db_str(),
        entry.entity.id(),
        entry.operation,
        entry.old_state,
        entry.new_state,
        entry.message,
    ])?;
    Ok(())
}

pub fn list_audit_for_entity(conn: &Connection, entity: &EntityRef) -> AppResult<Vec<AuditRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM audit WHERE entity_type = ?1 AND entity_id = ?2 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![entity.kind().to_db_str(), entity.id()], map_audit)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
