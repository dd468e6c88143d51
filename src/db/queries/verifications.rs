use super::{conversion_error, get_ts, ts_to_db};
use crate::core::verification::Assessment;
use crate::errors::{AppError, AppResult};
use crate::models::appeal::{EntityKind, EntityRef};
use crate::models::position::Position;
use crate::models::verdict::Verdict;
use crate::models::verification::{Phase, VerificationEntry};
use chrono::Utc;
use rusqlite::{Connection, Row, params};

fn map_entry(row: &Row) -> rusqlite::Result<VerificationEntry> {
    let kind_str: String = row.get("entity_type")?;
    let kind = EntityKind::from_db_str(&kind_str).ok_or_else(|| {
        conversion_error(0, AppError::Other(format!("Invalid entity type: {}", kind_str)))
    })?;
    let phase_str: String = row.get("phase")?;
    let phase = Phase::from_db_str(&phase_str).ok_or_else(|| {
        conversion_error(0, AppError::Other(format!("Invalid phase: {}", phase_str)))
    })?;
    let verdict_str: String = row.get("verdict")?;
    let verdict = Verdict::from_db_str(&verdict_str).ok_or_else(|| {
        conversion_error(0, AppError::Other(format!("Invalid verdict: {}", verdict_str)))
    })?;

    Ok(VerificationEntry {
        id: row.get("id")?,
        entity: EntityRef::new(kind, row.get("entity_id")?),
        phase,
        verdict,
        distance_meters: row.get("distance_meters")?,
        accuracy_meters: row.get("accuracy_meters")?,
        lat: row.get("lat")?,
        lng: row.get("lng")?,
        actor_id: row.get("actor_id")?,
        note: row.get("note")?,
        recorded_at: get_ts(row, "recorded_at")?,
    })
}

/// Append an automatic check result to the record's history.
pub fn record_assessment(
    conn: &Connection,
    entity: &EntityRef,
    phase: Phase,
    assessment: &Assessment,
    position: &Position,
    actor_id: i64,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO verifications (
            entity_type, entity_id, phase, verdict, distance_meters,
            accuracy_meters, lat, lng, actor_id, note, recorded_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            entity.kind().to_db_str(),
            entity.id(),
            phase.to_db_str(),
            assessment.verdict.to_db_str(),
            assessment.distance_meters,
            position.accuracy,
            position.lat,
            position.lng,
            actor_id,
            assessment.note,
            ts_to_db(&Utc::now()),
        ],
    )?;
    Ok(())
}

/// Append a human decision (manual review, appeal cascade) to the history.
pub fn record_decision(
    conn: &Connection,
    entity: &EntityRef,
    phase: Phase,
    verdict: Verdict,
    actor_id: i64,
    note: Option<&str>,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO verifications (
            entity_type, entity_id, phase, verdict, actor_id, note, recorded_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entity.kind().to_db_str(),
            entity.id(),
            phase.to_db_str(),
            verdict.to_db_str(),
            actor_id,
            note,
            ts_to_db(&Utc::now()),
        ],
    )?;
    Ok(())
}

pub fn list_history(conn: &Connection, entity: &EntityRef) -> AppResult<Vec<VerificationEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM verifications
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![entity.kind().to_db_str(), entity.id()], map_entry)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
