//! Schema migrations.
//!
//! Every migration is identified by a version string. Applied versions are
//! recorded in the `log` table as `migration_applied` rows, so running the
//! engine again is a no-op.

use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20250301_0001_attendance",
        description: "Create attendance table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            worker_id            INTEGER NOT NULL,
            zone_id              INTEGER NOT NULL,
            check_in_date        TEXT NOT NULL,
            check_in_time        TEXT NOT NULL,
            check_out_time       TEXT,
            check_in_lat         REAL,
            check_in_lng         REAL,
            check_in_accuracy    REAL,
            check_out_lat        REAL,
            check_out_lng        REAL,
            check_out_accuracy   REAL,
            check_in_verdict     TEXT NOT NULL
                CHECK(check_in_verdict IN ('verified','rejected','pending_review')),
            check_in_distance    REAL,
            check_out_verdict    TEXT
                CHECK(check_out_verdict IS NULL OR check_out_verdict IN ('verified','rejected','pending_review')),
            check_out_distance   REAL,
            verification_status  TEXT NOT NULL
                CHECK(verification_status IN ('verified','rejected','pending_review')),
            is_manual            INTEGER NOT NULL DEFAULT 0,
            manual_reason        TEXT,
            reviewer_id          INTEGER,
            version              INTEGER NOT NULL DEFAULT 1
        );

        CREATE UNIQUE INDEX IF NOT EXISTS ux_attendance_open_per_day
            ON attendance(worker_id, check_in_date) WHERE check_out_time IS NULL;
        CREATE INDEX IF NOT EXISTS idx_attendance_worker_date
            ON attendance(worker_id, check_in_date);
        "#,
    },
    Migration {
        version: "20250301_0002_tasks",
        description: "Create tasks table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            title                 TEXT NOT NULL,
            assigned_worker_id    INTEGER NOT NULL,
            zone_id               INTEGER,
            target_lat            REAL,
            target_lng            REAL,
            status                TEXT NOT NULL DEFAULT 'pending'
                CHECK(status IN ('pending','in_progress','completed','approved','rejected','cancelled')),
            completion_lat        REAL,
            completion_lng        REAL,
            completion_accuracy   REAL,
            completion_verdict    TEXT
                CHECK(completion_verdict IS NULL OR completion_verdict IN ('verified','rejected','pending_review')),
            completion_distance   REAL,
            distance_warning      INTEGER NOT NULL DEFAULT 0,
            rejection_reason      TEXT,
            reviewer_id           INTEGER,
            created_at            TEXT NOT NULL,
            started_at            TEXT,
            completed_at          TEXT,
            resolved_at           TEXT,
            version               INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_worker_status ON tasks(assigned_worker_id, status);
        "#,
    },
    Migration {
        version: "20250301_0003_appeals",
        description: "Create appeals table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS appeals (
            id                         INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_type                TEXT NOT NULL CHECK(entity_type IN ('attendance','task')),
            entity_id                  INTEGER NOT NULL,
            worker_id                  INTEGER NOT NULL,
            distance_meters            REAL CHECK(distance_meters IS NULL OR distance_meters >= 0),
            worker_explanation         TEXT NOT NULL CHECK(length(trim(worker_explanation)) > 0),
            evidence_photo_ref         TEXT,
            original_rejection_reason  TEXT,
            status                     TEXT NOT NULL DEFAULT 'pending'
                CHECK(status IN ('pending','approved','rejected')),
            reviewer_id                INTEGER,
            review_notes               TEXT,
            submitted_at               TEXT NOT NULL,
            resolved_at                TEXT,
            version                    INTEGER NOT NULL DEFAULT 1
        );

        CREATE UNIQUE INDEX IF NOT EXISTS ux_appeals_one_pending
            ON appeals(entity_type, entity_id) WHERE status = 'pending';
        CREATE INDEX IF NOT EXISTS idx_appeals_status ON appeals(status, submitted_at);
        CREATE INDEX IF NOT EXISTS idx_appeals_worker ON appeals(worker_id);
        "#,
    },
    Migration {
        version: "20250301_0004_verifications",
        description: "Create verification history table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS verifications (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_type      TEXT NOT NULL,
            entity_id        INTEGER NOT NULL,
            phase            TEXT NOT NULL,
            verdict          TEXT NOT NULL,
            distance_meters  REAL,
            accuracy_meters  REAL,
            lat              REAL,
            lng              REAL,
            actor_id         INTEGER NOT NULL,
            note             TEXT,
            recorded_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_verifications_entity
            ON verifications(entity_type, entity_id, id);
        "#,
    },
    Migration {
        version: "20250301_0005_audit_and_outbox",
        description: "Create audit and notification outbox tables",
        sql: r#"
        CREATE TABLE IF NOT EXISTS audit (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            recorded_at  TEXT NOT NULL,
            actor_id     INTEGER NOT NULL,
            entity_type  TEXT NOT NULL,
            entity_id    INTEGER NOT NULL,
            operation    TEXT NOT NULL,
            old_state    TEXT,
            new_state    TEXT NOT NULL,
            message      TEXT DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_audit_entity ON audit(entity_type, entity_id, id);

        CREATE TABLE IF NOT EXISTS notifications (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            recipient_id  INTEGER,
            kind          TEXT NOT NULL,
            entity_type   TEXT NOT NULL,
            entity_id     INTEGER NOT NULL,
            message       TEXT NOT NULL,
            created_at    TEXT NOT NULL
        );
        "#,
    },
    Migration {
        version: "20250315_0006_review_and_snapshots",
        description: "Add work duration, review note and appeal coordinates",
        sql: r#"
        ALTER TABLE attendance ADD COLUMN work_duration_minutes INTEGER;
        ALTER TABLE attendance ADD COLUMN review_note TEXT;

        ALTER TABLE appeals ADD COLUMN worker_lat REAL;
        ALTER TABLE appeals ADD COLUMN worker_lng REAL;
        ALTER TABLE appeals ADD COLUMN expected_lat REAL;
        ALTER TABLE appeals ADD COLUMN expected_lng REAL;
        "#,
    },
];

/// Ensure that the `log` table exists.
fn ensure_log_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> rusqlite::Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(m.sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;

    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, 'migration_applied', ?2, ?3)",
        params![chrono::Utc::now().to_rfc3339(), m.version, m.description],
    )?;

    tx.commit()?;
    Ok(())
}

/// Versions that have not been applied yet, in order.
pub fn pending_migrations(conn: &Connection) -> AppResult<Vec<&'static str>> {
    ensure_log_table(conn)?;

    let mut out = Vec::new();
    for m in MIGRATIONS {
        if !is_applied(conn, m.version)? {
            out.push(m.version);
        }
    }
    Ok(out)
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<usize> {
    ensure_log_table(conn)?;

    let mut applied = 0;
    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            debug!(version = m.version, "migration already applied");
            continue;
        }

        apply(conn, m)?;
        info!(version = m.version, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let first = run_pending_migrations(&conn).unwrap();
        assert_eq!(first, MIGRATIONS.len());
        assert_eq!(run_pending_migrations(&conn).unwrap(), 0);
        assert!(pending_migrations(&conn).unwrap().is_empty());
    }
}
