use crate::core::context::FieldContext;
use crate::core::verification::{Assessment, Target, evaluate};
use crate::db::queries::appeals::list_appeals_for_entity;
use crate::db::queries::attendance::{
    find_open_for_day, get_attendance, insert_attendance, list_attendance_for_worker,
    update_attendance,
};
use crate::db::queries::audit::AuditEntry;
use crate::db::queries::verifications::{record_assessment, record_decision};
use crate::errors::{AppError, AppResult};
use crate::models::appeal::EntityRef;
use crate::models::attendance::{AttendanceRecord, work_minutes};
use crate::models::notification::{Notification, NotificationKind};
use crate::models::position::Position;
use crate::models::verdict::Verdict;
use crate::models::verification::Phase;
use chrono::Utc;
use rusqlite::{Connection, ErrorCode};
use tracing::info;

/// Daily presence records: check-in, check-out and manual review.
pub struct AttendanceLogic;

fn is_unique_violation(err: &AppError) -> bool {
    matches!(
        err,
        AppError::Db(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation
    )
}

fn review_notice(rec: &AttendanceRecord, what: &str) -> Notification {
    Notification {
        recipient_id: None,
        kind: NotificationKind::ReviewRequired,
        entity: EntityRef::Attendance(rec.id),
        message: format!(
            "{} of worker {} needs manual review (low geolocation confidence)",
            what, rec.worker_id
        ),
    }
}

impl AttendanceLogic {
    pub fn check_in(
        ctx: &mut FieldContext<'_>,
        worker_id: i64,
        zone_id: i64,
        position: Position,
    ) -> AppResult<AttendanceRecord> {
        let zone = ctx.zones.zone(zone_id)?;
        let assessment = evaluate(&position, Target::Zone(&zone), ctx.thresholds());
        let now = Utc::now();
        let today = now.date_naive();

        let rec = ctx.transact(|tx, fx| {
            if let Some(open) = find_open_for_day(tx, worker_id, &today)? {
                return Err(AppError::DuplicateOpenRecord {
                    worker_id,
                    record_id: open.id,
                });
            }

            let draft = AttendanceRecord {
                id: 0,
                worker_id,
                zone_id,
                check_in_date: today,
                check_in_time: now,
                check_out_time: None,
                reported_position: Some(position),
                check_out_position: None,
                check_in_verdict: assessment.verdict,
                check_in_distance: assessment.distance_meters,
                check_out_verdict: None,
                check_out_distance: None,
                work_duration_minutes: None,
                verification_status: assessment.verdict,
                is_manual_entry: false,
                manual_reason: None,
                reviewer_id: None,
                review_note: None,
                version: 1,
            };

            // A racing check-in from another connection trips the partial unique index.
            let id = match insert_attendance(tx, &draft) {
                Ok(id) => id,
                Err(e) if is_unique_violation(&e) => {
                    let record_id = find_open_for_day(tx, worker_id, &today)?
                        .map(|r| r.id)
                        .unwrap_or_default();
                    return Err(AppError::DuplicateOpenRecord {
                        worker_id,
                        record_id,
                    });
                }
                Err(e) => return Err(e),
            };

            let rec = AttendanceRecord { id, ..draft };
            record_assessment(
                tx,
                &EntityRef::Attendance(id),
                Phase::CheckIn,
                &assessment,
                &position,
                worker_id,
            )?;

            fx.audit(AuditEntry {
                actor_id: worker_id,
                entity: EntityRef::Attendance(id),
                operation: "check_in",
                old_state: None,
                new_state: format!("open/{}", rec.verification_status.to_db_str()),
                message: assessment.summary(),
            });
            if rec.verification_status == Verdict::PendingManualReview {
                fx.notify(review_notice(&rec, "Check-in"));
            }
            Ok(rec)
        })?;

        info!(
            record = rec.id,
            worker = worker_id,
            zone = zone_id,
            verdict = rec.check_in_verdict.to_db_str(),
            "check-in recorded"
        );
        Ok(rec)
    }

    /// Close the record. Closing is never refused because of the verdict.
    pub fn check_out(
        ctx: &mut FieldContext<'_>,
        record_id: i64,
        position: Position,
    ) -> AppResult<AttendanceRecord> {
        let current = get_attendance(&ctx.pool.conn, record_id)?;
        if !current.is_open() {
            return Err(AppError::RecordNotOpen(record_id));
        }

        let assessment = match ctx.zones.zone(current.zone_id) {
            Ok(zone) => evaluate(&position, Target::Zone(&zone), ctx.thresholds()),
            Err(AppError::NotFound(what)) => Assessment::unverifiable(format!("{what} is gone")),
            Err(e) => return Err(e),
        };

        let rec = ctx.transact(|tx, fx| {
            let fresh = get_attendance(tx, record_id)?;
            if !fresh.is_open() {
                return Err(AppError::RecordNotOpen(record_id));
            }

            let old_status = fresh.verification_status;
            let now = Utc::now();
            let closed = AttendanceRecord {
                check_out_time: Some(now),
                work_duration_minutes: Some(work_minutes(fresh.check_in_time, now)),
                check_out_position: Some(position),
                check_out_verdict: Some(assessment.verdict),
                check_out_distance: assessment.distance_meters,
                verification_status: fresh.check_in_verdict.worst(assessment.verdict),
                ..fresh
            };
            let saved = update_attendance(tx, &closed)?;
            record_assessment(
                tx,
                &EntityRef::Attendance(record_id),
                Phase::CheckOut,
                &assessment,
                &position,
                saved.worker_id,
            )?;

            fx.audit(AuditEntry {
                actor_id: saved.worker_id,
                entity: EntityRef::Attendance(record_id),
                operation: "check_out",
                old_state: Some(format!("open/{}", old_status.to_db_str())),
                new_state: format!("closed/{}", saved.verification_status.to_db_str()),
                message: assessment.summary(),
            });
            if assessment.verdict == Verdict::PendingManualReview {
                fx.notify(review_notice(&saved, "Check-out"));
            }
            Ok(saved)
        })?;

        info!(
            record = rec.id,
            verdict = assessment.verdict.to_db_str(),
            status = rec.verification_status.to_db_str(),
            minutes = ?rec.work_duration_minutes,
            "check-out recorded"
        );
        Ok(rec)
    }

    /// Reviewer confirmation. Allowed while the record awaits review, or when
    /// it was rejected and an appeal on it has already been decided.
    pub fn manual_approve(
        ctx: &mut FieldContext<'_>,
        record_id: i64,
        reviewer_id: i64,
        note: Option<&str>,
    ) -> AppResult<AttendanceRecord> {
        let rec = ctx.transact(|tx, fx| {
            let current = get_attendance(tx, record_id)?;
            let entity = EntityRef::Attendance(record_id);

            match current.verification_status {
                Verdict::PendingManualReview => {}
                Verdict::Rejected => {
                    if !has_resolved_appeal(tx, &entity)? {
                        return Err(AppError::InvalidTransition(format!(
                            "{} is rejected; it can only be approved after its appeal is resolved",
                            entity
                        )));
                    }
                }
                Verdict::Verified => {
                    return Err(AppError::InvalidTransition(format!(
                        "{} is already verified",
                        entity
                    )));
                }
            }

            let old_status = current.verification_status;
            let approved = mark_verified(current, reviewer_id);
            let saved = update_attendance(tx, &approved)?;
            record_decision(
                tx,
                &entity,
                Phase::ManualReview,
                Verdict::Verified,
                reviewer_id,
                note,
            )?;

            fx.audit(AuditEntry {
                actor_id: reviewer_id,
                entity,
                operation: "manual_approve",
                old_state: Some(old_status.to_db_str().to_string()),
                new_state: Verdict::Verified.to_db_str().to_string(),
                message: note.unwrap_or("approved by reviewer").to_string(),
            });
            Ok(saved)
        })?;

        info!(record = record_id, reviewer = reviewer_id, "attendance approved manually");
        Ok(rec)
    }

    /// Reviewer refusal of a record awaiting review. The worker is told and
    /// may appeal it like any other rejection.
    pub fn manual_reject(
        ctx: &mut FieldContext<'_>,
        record_id: i64,
        reviewer_id: i64,
        reason: &str,
    ) -> AppResult<AttendanceRecord> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation(
                "rejecting an attendance record requires a reason".into(),
            ));
        }

        let rec = ctx.transact(|tx, fx| {
            let current = get_attendance(tx, record_id)?;
            let entity = EntityRef::Attendance(record_id);
            if current.verification_status != Verdict::PendingManualReview {
                return Err(AppError::InvalidTransition(format!(
                    "{} is {}; only records awaiting review can be rejected",
                    entity,
                    current.verification_status.to_db_str()
                )));
            }

            let refuse = |v: Verdict| match v {
                Verdict::PendingManualReview => Verdict::Rejected,
                other => other,
            };
            let rejected = AttendanceRecord {
                check_in_verdict: refuse(current.check_in_verdict),
                check_out_verdict: current.check_out_verdict.map(refuse),
                verification_status: Verdict::Rejected,
                reviewer_id: Some(reviewer_id),
                review_note: Some(reason.to_string()),
                ..current
            };
            let saved = update_attendance(tx, &rejected)?;
            record_decision(
                tx,
                &entity,
                Phase::ManualReview,
                Verdict::Rejected,
                reviewer_id,
                Some(reason),
            )?;

            fx.audit(AuditEntry {
                actor_id: reviewer_id,
                entity,
                operation: "manual_reject",
                old_state: Some(Verdict::PendingManualReview.to_db_str().to_string()),
                new_state: Verdict::Rejected.to_db_str().to_string(),
                message: reason.to_string(),
            });
            fx.notify(Notification {
                recipient_id: Some(saved.worker_id),
                kind: NotificationKind::AttendanceRejected,
                entity,
                message: format!(
                    "Your attendance on {} was rejected: {}",
                    saved.check_in_date, reason
                ),
            });
            Ok(saved)
        })?;

        info!(record = record_id, reviewer = reviewer_id, "attendance rejected manually");
        Ok(rec)
    }

    /// Back-office entry for a worker who could not check in from the field.
    pub fn record_manual(
        ctx: &mut FieldContext<'_>,
        worker_id: i64,
        zone_id: i64,
        reviewer_id: i64,
        reason: &str,
    ) -> AppResult<AttendanceRecord> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation(
                "a manual attendance entry needs a reason".into(),
            ));
        }
        ctx.zones.zone(zone_id)?;

        let now = Utc::now();
        let today = now.date_naive();

        ctx.transact(|tx, fx| {
            if let Some(open) = find_open_for_day(tx, worker_id, &today)? {
                return Err(AppError::DuplicateOpenRecord {
                    worker_id,
                    record_id: open.id,
                });
            }

            let draft = AttendanceRecord {
                id: 0,
                worker_id,
                zone_id,
                check_in_date: today,
                check_in_time: now,
                check_out_time: None,
                reported_position: None,
                check_out_position: None,
                check_in_verdict: Verdict::PendingManualReview,
                check_in_distance: None,
                check_out_verdict: None,
                check_out_distance: None,
                work_duration_minutes: None,
                verification_status: Verdict::PendingManualReview,
                is_manual_entry: true,
                manual_reason: Some(reason.to_string()),
                reviewer_id: Some(reviewer_id),
                review_note: None,
                version: 1,
            };
            let id = insert_attendance(tx, &draft)?;
            let entity = EntityRef::Attendance(id);
            record_decision(
                tx,
                &entity,
                Phase::CheckIn,
                Verdict::PendingManualReview,
                reviewer_id,
                Some(reason),
            )?;

            fx.audit(AuditEntry {
                actor_id: reviewer_id,
                entity,
                operation: "manual_entry",
                old_state: None,
                new_state: "open/pending_review".into(),
                message: reason.to_string(),
            });
            Ok(AttendanceRecord { id, ..draft })
        })
    }

    pub fn get(conn: &Connection, record_id: i64) -> AppResult<AttendanceRecord> {
        get_attendance(conn, record_id)
    }

    pub fn list_for_worker(conn: &Connection, worker_id: i64) -> AppResult<Vec<AttendanceRecord>> {
        list_attendance_for_worker(conn, worker_id)
    }
}

/// Every phase that was not verified becomes verified; the aggregate follows.
pub(crate) fn mark_verified(rec: AttendanceRecord, reviewer_id: i64) -> AttendanceRecord {
    let check_out_verdict = rec.check_out_verdict.map(|_| Verdict::Verified);
    AttendanceRecord {
        check_in_verdict: Verdict::Verified,
        check_out_verdict,
        verification_status: Verdict::Verified,
        reviewer_id: Some(reviewer_id),
        ..rec
    }
}

fn has_resolved_appeal(conn: &Connection, entity: &EntityRef) -> AppResult<bool> {
    Ok(list_appeals_for_entity(conn, entity)?
        .iter()
        .any(|a| !a.is_pending()))
}
