use super::{
    conversion_error, expect_one, get_latlng, get_opt_ts, get_position, get_ts, opt_ts_to_db,
    ts_to_db,
};
use crate::errors::{AppError, AppResult};
use crate::models::task::{Task, TaskStatus};
use crate::models::verdict::Verdict;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn map_task(row: &Row) -> rusqlite::Result<Task> {
    let status_str: String = row.get("status")?;
    let status = TaskStatus::from_db_str(&status_str).ok_or_else(|| {
        conversion_error(0, AppError::Other(format!("Invalid task status: {}", status_str)))
    })?;

    let verdict_str: Option<String> = row.get("completion_verdict")?;
    let completion_verdict = match verdict_str {
        None => None,
        Some(s) => Some(Verdict::from_db_str(&s).ok_or_else(|| {
            conversion_error(0, AppError::Other(format!("Invalid verdict: {}", s)))
        })?),
    };

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        assigned_worker_id: row.get("assigned_worker_id")?,
        zone_id: row.get("zone_id")?,
        target: get_latlng(row, "target")?,
        status,
        completion_position: get_position(row, "completion")?,
        completion_verdict,
        completion_distance: row.get("completion_distance")?,
        distance_warning: row.get::<_, i32>("distance_warning")? == 1,
        rejection_reason: row.get("rejection_reason")?,
        reviewer_id: row.get("reviewer_id")?,
        created_at: get_ts(row, "created_at")?,
        started_at: get_opt_ts(row, "started_at")?,
        completed_at: get_opt_ts(row, "completed_at")?,
        resolved_at: get_opt_ts(row, "resolved_at")?,
        version: row.get("version")?,
    })
}

pub fn insert_task(conn: &Connection, task: &Task) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO tasks (
            title, assigned_worker_id, zone_id, target_lat, target_lng,
            status, created_at, version
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1)",
        params![
            task.title,
            task.assigned_worker_id,
            task.zone_id,
            task.target.map(|t| t.lat),
            task.target.map(|t| t.lng),
            task.status.to_db_str(),
            ts_to_db(&task.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_task(conn: &Connection, id: i64) -> AppResult<Option<Task>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM tasks WHERE id = ?1")?;
    Ok(stmt.query_row([id], map_task).optional()?)
}

pub fn get_task(conn: &Connection, id: i64) -> AppResult<Task> {
    find_task(conn, id)?.ok_or_else(|| AppError::NotFound(format!("task {}", id)))
}

pub fn list_tasks_for_worker(conn: &Connection, worker_id: i64) -> AppResult<Vec<Task>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM tasks WHERE assigned_worker_id = ?1 ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map([worker_id], map_task)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Persist every mutable column of `task`, guarded by its version.
pub fn update_task(conn: &Connection, task: &Task) -> AppResult<Task> {
    let pos = task.completion_position;
    let changed = conn.execute(
        "UPDATE tasks SET
            assigned_worker_id = ?1,
            status = ?2,
            completion_lat = ?3,
            completion_lng = ?4,
            completion_accuracy = ?5,
            completion_verdict = ?6,
            completion_distance = ?7,
            distance_warning = ?8,
            rejection_reason = ?9,
            reviewer_id = ?10,
            started_at = ?11,
            completed_at = ?12,
            resolved_at = ?13,
            version = version + 1
         WHERE id = ?14 AND version = ?15",
        params![
            task.assigned_worker_id,
            task.status.to_db_str(),
            pos.map(|p| p.lat),
            pos.map(|p| p.lng),
            pos.map(|p| p.accuracy),
            task.completion_verdict.map(|v| v.to_db_str()),
            task.completion_distance,
            if task.distance_warning { 1 } else { 0 },
            task.rejection_reason,
            task.reviewer_id,
            opt_ts_to_db(&task.started_at),
            opt_ts_to_db(&task.completed_at),
            opt_ts_to_db(&task.resolved_at),
            task.id,
            task.version,
        ],
    )?;
    expect_one(changed, format!("task {}", task.id))?;

    Ok(Task {
        version: task.version + 1,
        ..task.clone()
    })
}
