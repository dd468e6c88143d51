use super::{
    conversion_error, expect_one, get_latlng, get_opt_ts, get_ts, opt_ts_to_db, ts_to_db,
};
use crate::errors::{AppError, AppResult};
use crate::models::appeal::{Appeal, AppealStatus, EntityKind, EntityRef};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn map_appeal(row: &Row) -> rusqlite::Result<Appeal> {
    let kind_str: String = row.get("entity_type")?;
    let kind = EntityKind::from_db_str(&kind_str).ok_or_else(|| {
        conversion_error(0, AppError::Other(format!("Invalid entity type: {}", kind_str)))
    })?;

    let status_str: String = row.get("status")?;
    let status = AppealStatus::from_db_str(&status_str).ok_or_else(|| {
        conversion_error(0, AppError::Other(format!("Invalid appeal status: {}", status_str)))
    })?;

    Ok(Appeal {
        id: row.get("id")?,
        entity: EntityRef::new(kind, row.get("entity_id")?),
        worker_id: row.get("worker_id")?,
        distance_meters: row.get("distance_meters")?,
        worker_explanation: row.get("worker_explanation")?,
        evidence_photo_ref: row.get("evidence_photo_ref")?,
        original_rejection_reason: row.get("original_rejection_reason")?,
        worker_position: get_latlng(row, "worker")?,
        expected_position: get_latlng(row, "expected")?,
        status,
        reviewer_id: row.get("reviewer_id")?,
        review_notes: row.get("review_notes")?,
        submitted_at: get_ts(row, "submitted_at")?,
        resolved_at: get_opt_ts(row, "resolved_at")?,
        version: row.get("version")?,
    })
}

fn collect(rows: impl Iterator<Item = rusqlite::Result<Appeal>>) -> AppResult<Vec<Appeal>> {
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn insert_appeal(conn: &Connection, appeal: &Appeal) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO appeals (
            entity_type, entity_id, worker_id, distance_meters, worker_explanation,
            evidence_photo_ref, original_rejection_reason, status, submitted_at,
            worker_lat, worker_lng, expected_lat, expected_lng, version
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 1)",
        params![
            appeal.entity.kind().to_db_str(),
            appeal.entity.id(),
            appeal.worker_id,
            appeal.distance_meters,
            appeal.worker_explanation,
            appeal.evidence_photo_ref,
            appeal.original_rejection_reason,
            appeal.status.to_db_str(),
            ts_to_db(&appeal.submitted_at),
            appeal.worker_position.map(|p| p.lat),
            appeal.worker_position.map(|p| p.lng),
            appeal.expected_position.map(|p| p.lat),
            appeal.expected_position.map(|p| p.lng),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_appeal(conn: &Connection, id: i64) -> AppResult<Option<Appeal>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM appeals WHERE id = ?1")?;
    Ok(stmt.query_row([id], map_appeal).optional()?)
}

pub fn get_appeal(conn: &Connection, id: i64) -> AppResult<Appeal> {
    find_appeal(conn, id)?.ok_or_else(|| AppError::NotFound(format!("appeal {}", id)))
}

/// All appeals ever filed against `entity`, oldest first.
pub fn list_appeals_for_entity(conn: &Connection, entity: &EntityRef) -> AppResult<Vec<Appeal>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM appeals WHERE entity_type = ?1 AND entity_id = ?2 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![entity.kind().to_db_str(), entity.id()], map_appeal)?;
    collect(rows)
}

/// Reviewer queue: pending appeals, oldest submission first.
pub fn list_pending_appeals(conn: &Connection) -> AppResult<Vec<Appeal>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM appeals WHERE status = 'pending' ORDER BY submitted_at ASC, id ASC",
    )?;
    let rows = stmt.query_map([], map_appeal)?;
    collect(rows)
}

pub fn list_appeals_for_worker(conn: &Connection, worker_id: i64) -> AppResult<Vec<Appeal>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM appeals WHERE worker_id = ?1 ORDER BY submitted_at DESC, id DESC",
    )?;
    let rows = stmt.query_map([worker_id], map_appeal)?;
    collect(rows)
}

/// Record the terminal review of an appeal, guarded by its version.
pub fn update_appeal(conn: &Connection, appeal: &Appeal) -> AppResult<Appeal> {
    let changed = conn.execute(
        "UPDATE appeals SET
            status = ?1,
            reviewer_id = ?2,
            review_notes = ?3,
            resolved_at = ?4,
            version = version + 1
         WHERE id = ?5 AND version = ?6",
        params![
            appeal.status.to_db_str(),
            appeal.reviewer_id,
            appeal.review_notes,
            opt_ts_to_db(&appeal.resolved_at),
            appeal.id,
            appeal.version,
        ],
    )?;
    expect_one(changed, format!("appeal {}", appeal.id))?;

    Ok(Appeal {
        version: appeal.version + 1,
        ..appeal.clone()
    })
}
