use super::{conversion_error, ts_to_db};
use crate::errors::{AppError, AppResult};
use crate::models::appeal::{EntityKind, EntityRef};
use crate::models::notification::{Notification, NotificationKind};
use chrono::Utc;
use rusqlite::{Connection, Row, params};

fn map_notification(row: &Row) -> rusqlite::Result<Notification> {
    let kind_str: String = row.get("kind")?;
    let kind = NotificationKind::from_db_str(&kind_str).ok_or_else(|| {
        conversion_error(0, AppError::Other(format!("Invalid notification kind: {}", kind_str)))
    })?;
    let entity_str: String = row.get("entity_type")?;
    let entity_kind = EntityKind::from_db_str(&entity_str).ok_or_else(|| {
        conversion_error(0, AppError::Other(format!("Invalid entity type: {}", entity_str)))
    })?;

    Ok(Notification {
        recipient_id: row.get("recipient_id")?,
        kind,
        entity: EntityRef::new(entity_kind, row.get("entity_id")?),
        message: row.get("message")?,
    })
}

pub fn insert_notification(conn: &Connection, n: &Notification) -> AppResult<()> {
    conn.execute(
        "INSERT INTO notifications (recipient_id, kind, entity_type, entity_id, message, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            n.recipient_id,
            n.kind.to_db_str(),
            n.entity.kind().to_db_str(),
            n.entity.id(),
            n.message,
            ts_to_db(&Utc::now()),
        ],
    )?;
    Ok(())
}

/// Outbox rows for one entity, oldest first.
pub fn list_notifications_for_entity(
    conn: &Connection,
    entity: &EntityRef,
) -> AppResult<Vec<Notification>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM notifications WHERE entity_type = ?1 AND entity_id = ?2 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(
        params![entity.kind().to_db_str(), entity.id()],
        map_notification,
    )?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
