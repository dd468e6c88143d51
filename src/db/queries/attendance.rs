use super::{
    conversion_error, expect_one, get_date, get_opt_ts, get_position, get_ts, opt_ts_to_db,
    ts_to_db,
};
use crate::errors::{AppError, AppResult};
use crate::models::attendance::AttendanceRecord;
use crate::models::verdict::Verdict;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};

fn verdict_col(row: &Row, col: &str) -> rusqlite::Result<Verdict> {
    let raw: String = row.get(col)?;
    Verdict::from_db_str(&raw)
        .ok_or_else(|| conversion_error(0, AppError::Other(format!("Invalid verdict: {}", raw))))
}

fn opt_verdict_col(row: &Row, col: &str) -> rusqlite::Result<Option<Verdict>> {
    let raw: Option<String> = row.get(col)?;
    match raw {
        None => Ok(None),
        Some(s) => Verdict::from_db_str(&s).map(Some).ok_or_else(|| {
            conversion_error(0, AppError::Other(format!("Invalid verdict: {}", s)))
        }),
    }
}

pub fn map_attendance(row: &Row) -> rusqlite::Result<AttendanceRecord> {
    Ok(AttendanceRecord {
        id: row.get("id")?,
        worker_id: row.get("worker_id")?,
        zone_id: row.get("zone_id")?,
        check_in_date: get_date(row, "check_in_date")?,
        check_in_time: get_ts(row, "check_in_time")?,
        check_out_time: get_opt_ts(row, "check_out_time")?,
        reported_position: get_position(row, "check_in")?,
        check_out_position: get_position(row, "check_out")?,
        check_in_verdict: verdict_col(row, "check_in_verdict")?,
        check_in_distance: row.get("check_in_distance")?,
        check_out_verdict: opt_verdict_col(row, "check_out_verdict")?,
        check_out_distance: row.get("check_out_distance")?,
        work_duration_minutes: row.get("work_duration_minutes")?,
        verification_status: verdict_col(row, "verification_status")?,
        is_manual_entry: row.get::<_, i32>("is_manual")? == 1,
        manual_reason: row.get("manual_reason")?,
        reviewer_id: row.get("reviewer_id")?,
        review_note: row.get("review_note")?,
        version: row.get("version")?,
    })
}

/// Insert a new record; `id` and `version` of the argument are ignored.
pub fn insert_attendance(conn: &Connection, rec: &AttendanceRecord) -> AppResult<i64> {
    let pos = rec.reported_position;
    conn.execute(
        "INSERT INTO attendance (
            worker_id, zone_id, check_in_date, check_in_time,
            check_in_lat, check_in_lng, check_in_accuracy,
            check_in_verdict, check_in_distance, verification_status,
            is_manual, manual_reason, reviewer_id, version
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 1)",
        params![
            rec.worker_id,
            rec.zone_id,
            rec.check_in_date.format("%Y-%m-%d").to_string(),
            ts_to_db(&rec.check_in_time),
            pos.map(|p| p.lat),
            pos.map(|p| p.lng),
            pos.map(|p| p.accuracy),
            rec.check_in_verdict.to_db_str(),
            rec.check_in_distance,
            rec.verification_status.to_db_str(),
            if rec.is_manual_entry { 1 } else { 0 },
            rec.manual_reason,
            rec.reviewer_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_attendance(conn: &Connection, id: i64) -> AppResult<Option<AttendanceRecord>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM attendance WHERE id = ?1")?;
    Ok(stmt.query_row([id], map_attendance).optional()?)
}

pub fn get_attendance(conn: &Connection, id: i64) -> AppResult<AttendanceRecord> {
    find_attendance(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("attendance record {}", id)))
}

/// The worker's record for `date` that has no check-out yet.
pub fn find_open_for_day(
    conn: &Connection,
    worker_id: i64,
    date: &NaiveDate,
) -> AppResult<Option<AttendanceRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM attendance
         WHERE worker_id = ?1 AND check_in_date = ?2 AND check_out_time IS NULL
         LIMIT 1",
    )?;
    Ok(stmt
        .query_row(
            params![worker_id, date.format("%Y-%m-%d").to_string()],
            map_attendance,
        )
        .optional()?)
}

pub fn list_attendance_for_worker(
    conn: &Connection,
    worker_id: i64,
) -> AppResult<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM attendance WHERE worker_id = ?1 ORDER BY check_in_time DESC, id DESC",
    )?;
    let rows = stmt.query_map([worker_id], map_attendance)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Persist every mutable column of `rec`, guarded by its version.
/// Returns the record as stored (with the bumped version).
pub fn update_attendance(conn: &Connection, rec: &AttendanceRecord) -> AppResult<AttendanceRecord> {
    let out_pos = rec.check_out_position;
    let changed = conn.execute(
        "UPDATE attendance SET
            check_out_time = ?1,
            check_out_lat = ?2,
            check_out_lng = ?3,
            check_out_accuracy = ?4,
            check_in_verdict = ?5,
            check_out_verdict = ?6,
            check_out_distance = ?7,
            verification_status = ?8,
            reviewer_id = ?9,
            work_duration_minutes = ?10,
            review_note = ?11,
            version = version + 1
         WHERE id = ?12 AND version = ?13",
        params![
            opt_ts_to_db(&rec.check_out_time),
            out_pos.map(|p| p.lat),
            out_pos.map(|p| p.lng),
            out_pos.map(|p| p.accuracy),
            rec.check_in_verdict.to_db_str(),
            rec.check_out_verdict.map(|v| v.to_db_str()),
            rec.check_out_distance,
            rec.verification_status.to_db_str(),
            rec.reviewer_id,
            rec.work_duration_minutes,
            rec.review_note,
            rec.id,
            rec.version,
        ],
    )?;
    expect_one(changed, format!("attendance record {}", rec.id))?;

    Ok(AttendanceRecord {
        version: rec.version + 1,
        ..rec.clone()
    })
}
