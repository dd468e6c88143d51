//! Worker appeals against automatic rejections.
//!
//! An appeal is opened against either an attendance record or a task and is
//! resolved exactly once. Approval reinstates the contested record in the
//! same transaction as the appeal update, so neither write can land alone.

use crate::core::attendance::mark_verified;
use crate::core::context::FieldContext;
use crate::core::zones::ZoneSource;
use crate::db::queries::appeals::{
    get_appeal, insert_appeal, list_appeals_for_entity, list_appeals_for_worker,
    list_pending_appeals, update_appeal,
};
use crate::db::queries::attendance::{get_attendance, update_attendance};
use crate::db::queries::audit::AuditEntry;
use crate::db::queries::tasks::{get_task, update_task};
use crate::db::queries::verifications::record_decision;
use crate::errors::{AppError, AppResult};
use crate::models::appeal::{Appeal, AppealStatus, EntityRef};
use crate::models::attendance::AttendanceRecord;
use crate::models::notification::{Notification, NotificationKind};
use crate::models::position::LatLng;
use crate::models::task::{Task, TaskStatus};
use crate::models::verdict::Verdict;
use crate::models::verification::Phase;
use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

/// What the worker supplies when contesting a rejection.
#[derive(Debug, Clone)]
pub struct AppealRequest {
    pub entity: EntityRef,
    pub worker_id: i64,
    pub explanation: String,
    pub distance_meters: Option<f64>,
    pub evidence_photo_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Approved,
    Rejected,
}

/// A record an appeal can be filed against, loaded inside the transaction.
#[derive(Debug, Clone)]
pub enum Contested {
    Attendance(AttendanceRecord),
    Task(Task),
}

impl Contested {
    pub fn load(conn: &Connection, entity: &EntityRef) -> AppResult<Self> {
        Ok(match entity {
            EntityRef::Attendance(id) => Contested::Attendance(get_attendance(conn, *id)?),
            EntityRef::Task(id) => Contested::Task(get_task(conn, *id)?),
        })
    }

    pub fn entity(&self) -> EntityRef {
        match self {
            Contested::Attendance(r) => EntityRef::Attendance(r.id),
            Contested::Task(t) => EntityRef::Task(t.id),
        }
    }

    pub fn owner_id(&self) -> i64 {
        match self {
            Contested::Attendance(r) => r.worker_id,
            Contested::Task(t) => t.assigned_worker_id,
        }
    }

    /// Verdict for attendance, status for tasks.
    pub fn current_state(&self) -> &'static str {
        match self {
            Contested::Attendance(r) => r.verification_status.to_db_str(),
            Contested::Task(t) => t.status.to_db_str(),
        }
    }

    pub fn is_appealable(&self) -> bool {
        match self {
            Contested::Attendance(r) => r.verification_status == Verdict::Rejected,
            Contested::Task(t) => t.is_appealable(),
        }
    }

    pub fn recorded_distance(&self) -> Option<f64> {
        match self {
            Contested::Attendance(r) => r.rejection_distance(),
            Contested::Task(t) => match t.completion_verdict {
                Some(Verdict::Rejected) => t.completion_distance,
                _ => None,
            },
        }
    }

    /// Coordinates of the rejected report, if one was taken.
    pub fn reported_position(&self) -> Option<LatLng> {
        match self {
            Contested::Attendance(r) => r.rejected_position().map(LatLng::from),
            Contested::Task(t) => t.completion_position.map(LatLng::from),
        }
    }

    /// The task's own target wins over its zone's reference point.
    pub fn expected_position(&self, zones: &dyn ZoneSource) -> Option<LatLng> {
        let zone_id = match self {
            Contested::Attendance(r) => Some(r.zone_id),
            Contested::Task(t) => {
                if t.target.is_some() {
                    return t.target;
                }
                t.zone_id
            }
        };
        zone_id
            .and_then(|id| zones.zone(id).ok())
            .and_then(|z| z.reference)
    }

    pub fn rejection_reason(&self) -> Option<String> {
        match self {
            Contested::Attendance(r) => r.rejection_reason(),
            Contested::Task(t) => t.rejection_reason.clone(),
        }
    }

    /// Persist the effect of a resolved appeal on the contested record.
    /// A rejected appeal leaves the record untouched.
    pub fn apply_outcome(
        self,
        conn: &Connection,
        outcome: Outcome,
        reviewer_id: i64,
    ) -> AppResult<Contested> {
        if outcome == Outcome::Rejected {
            return Ok(self);
        }

        Ok(match self {
            Contested::Attendance(r) => {
                Contested::Attendance(update_attendance(conn, &mark_verified(r, reviewer_id))?)
            }
            // Single-step reinstatement: straight to Approved.
            Contested::Task(t) => Contested::Task(update_task(
                conn,
                &Task {
                    status: TaskStatus::Approved,
                    rejection_reason: None,
                    reviewer_id: Some(reviewer_id),
                    resolved_at: Some(Utc::now()),
                    ..t
                },
            )?),
        })
    }
}

pub struct AppealLogic;

impl AppealLogic {
    pub fn open(ctx: &mut FieldContext<'_>, req: AppealRequest) -> AppResult<Appeal> {
        let explanation = req.explanation.trim().to_string();
        if explanation.is_empty() {
            return Err(AppError::Validation(
                "an appeal needs an explanation".into(),
            ));
        }
        if let Some(d) = req.distance_meters
            && (!d.is_finite() || d < 0.0)
        {
            return Err(AppError::Validation(format!(
                "distance must be a non-negative number, got {}",
                d
            )));
        }
        let min_distance = ctx.settings.appeal_min_distance();
        let zones = ctx.zones;

        let appeal = ctx.transact(|tx, fx| {
            let contested = Contested::load(tx, &req.entity)?;

            if contested.owner_id() != req.worker_id {
                return Err(AppError::NotEligibleForAppeal(format!(
                    "{} does not belong to worker {}",
                    req.entity, req.worker_id
                )));
            }
            if !contested.is_appealable() {
                return Err(AppError::NotEligibleForAppeal(format!(
                    "{} is {}, not rejected",
                    req.entity,
                    contested.current_state()
                )));
            }

            let earlier = list_appeals_for_entity(tx, &req.entity)?;
            if let Some(blocking) = earlier.iter().find(|a| a.status != AppealStatus::Approved) {
                return Err(AppError::DuplicateAppeal(format!(
                    "{} (appeal {} is {})",
                    req.entity,
                    blocking.id,
                    blocking.status.to_db_str()
                )));
            }

            let recorded = contested.recorded_distance();
            if let Some(d) = recorded
                && d <= min_distance
            {
                return Err(AppError::NotEligibleForAppeal(format!(
                    "recorded distance {}m does not exceed {}m",
                    d, min_distance
                )));
            }

            let draft = Appeal {
                id: 0,
                entity: req.entity,
                worker_id: req.worker_id,
                distance_meters: req.distance_meters.or(recorded),
                worker_explanation: explanation.clone(),
                evidence_photo_ref: req.evidence_photo_ref.clone(),
                original_rejection_reason: contested.rejection_reason(),
                worker_position: contested.reported_position(),
                expected_position: contested.expected_position(zones),
                status: AppealStatus::Pending,
                reviewer_id: None,
                review_notes: None,
                submitted_at: Utc::now(),
                resolved_at: None,
                version: 1,
            };
            let id = insert_appeal(tx, &draft)?;

            fx.audit(AuditEntry {
                actor_id: req.worker_id,
                entity: req.entity,
                operation: "appeal_open",
                old_state: Some(contested.current_state().to_string()),
                new_state: format!("appeal {} pending", id),
                message: explanation.clone(),
            });
            Ok(Appeal { id, ..draft })
        })?;

        info!(appeal = appeal.id, entity = %appeal.entity, "appeal opened");
        Ok(appeal)
    }

    pub fn approve(
        ctx: &mut FieldContext<'_>,
        appeal_id: i64,
        reviewer_id: i64,
        notes: Option<&str>,
    ) -> AppResult<Appeal> {
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        Self::resolve(ctx, appeal_id, reviewer_id, Outcome::Approved, notes)
    }

    pub fn reject(
        ctx: &mut FieldContext<'_>,
        appeal_id: i64,
        reviewer_id: i64,
        notes: &str,
    ) -> AppResult<Appeal> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(AppError::Validation(
                "rejecting an appeal requires review notes".into(),
            ));
        }
        Self::resolve(ctx, appeal_id, reviewer_id, Outcome::Rejected, Some(notes))
    }

    fn resolve(
        ctx: &mut FieldContext<'_>,
        appeal_id: i64,
        reviewer_id: i64,
        outcome: Outcome,
        notes: Option<&str>,
    ) -> AppResult<Appeal> {
        let appeal = ctx.transact(|tx, fx| {
            let appeal = get_appeal(tx, appeal_id)?;
            if !appeal.is_pending() {
                return Err(AppError::AlreadyResolved(appeal_id));
            }

            let contested = Contested::load(tx, &appeal.entity)?;
            let before = contested.current_state();
            if outcome == Outcome::Approved && !contested.is_appealable() {
                return Err(AppError::InvalidTransition(format!(
                    "{} is {} and can no longer be reinstated",
                    appeal.entity, before
                )));
            }
            let after = contested.apply_outcome(tx, outcome, reviewer_id)?;

            let status = match outcome {
                Outcome::Approved => AppealStatus::Approved,
                Outcome::Rejected => AppealStatus::Rejected,
            };
            let resolved = update_appeal(
                tx,
                &Appeal {
                    status,
                    reviewer_id: Some(reviewer_id),
                    review_notes: notes.map(str::to_string),
                    resolved_at: Some(Utc::now()),
                    ..appeal
                },
            )?;

            if outcome == Outcome::Approved {
                record_decision(
                    tx,
                    &resolved.entity,
                    Phase::Appeal,
                    Verdict::Verified,
                    reviewer_id,
                    notes,
                )?;
                fx.audit(AuditEntry {
                    actor_id: reviewer_id,
                    entity: resolved.entity,
                    operation: "appeal_cascade",
                    old_state: Some(before.to_string()),
                    new_state: after.current_state().to_string(),
                    message: format!("reinstated by appeal {}", resolved.id),
                });
            }
            fx.audit(AuditEntry {
                actor_id: reviewer_id,
                entity: resolved.entity,
                operation: "appeal_resolve",
                old_state: Some(format!("appeal {} pending", resolved.id)),
                new_state: format!("appeal {} {}", resolved.id, status.to_db_str()),
                message: notes.unwrap_or_default().to_string(),
            });
            fx.notify(Notification {
                recipient_id: Some(resolved.worker_id),
                kind: NotificationKind::AppealResolved,
                entity: resolved.entity,
                message: format!(
                    "Your appeal on {} was {}",
                    resolved.entity,
                    status.to_db_str()
                ),
            });
            Ok(resolved)
        })?;

        info!(
            appeal = appeal_id,
            reviewer = reviewer_id,
            status = appeal.status.to_db_str(),
            "appeal resolved"
        );
        Ok(appeal)
    }

    pub fn get(conn: &Connection, appeal_id: i64) -> AppResult<Appeal> {
        get_appeal(conn, appeal_id)
    }

    /// Reviewer queue, oldest first.
    pub fn pending(conn: &Connection) -> AppResult<Vec<Appeal>> {
        list_pending_appeals(conn)
    }

    pub fn for_worker(conn: &Connection, worker_id: i64) -> AppResult<Vec<Appeal>> {
        list_appeals_for_worker(conn, worker_id)
    }

    pub fn for_entity(conn: &Connection, entity: &EntityRef) -> AppResult<Vec<Appeal>> {
        list_appeals_for_entity(conn, entity)
    }
}
