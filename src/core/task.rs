use crate::core::context::{Effects, FieldContext};
use crate::core::verification::{Assessment, Target, evaluate};
use crate::db::queries::appeals::list_appeals_for_entity;
use crate::db::queries::audit::AuditEntry;
use crate::db::queries::tasks::{get_task, insert_task, list_tasks_for_worker, update_task};
use crate::db::queries::verifications::{record_assessment, record_decision};
use crate::errors::{AppError, AppResult};
use crate::models::appeal::EntityRef;
use crate::models::notification::{Notification, NotificationKind};
use crate::models::position::{LatLng, Position};
use crate::models::task::{Task, TaskStatus};
use crate::models::verdict::Verdict;
use crate::models::verification::Phase;
use chrono::Utc;
use rusqlite::{Connection, Transaction};
use tracing::info;

/// Task lifecycle:
///
/// ```text
/// Pending --start--> InProgress --complete--> Completed --approve--> Approved
///                                                       \--reject--> Rejected
/// Pending|InProgress --cancel--> Cancelled
/// Pending|InProgress --reassign--> Pending
/// ```
pub struct TaskLogic;

fn invalid(task: &Task, action: &str) -> AppError {
    AppError::InvalidTransition(format!(
        "cannot {} task {} while it is {}",
        action,
        task.id,
        task.status.to_db_str()
    ))
}

fn audit_move(
    fx: &mut Effects,
    actor_id: i64,
    before: &Task,
    after: &Task,
    op: &'static str,
    msg: String,
) {
    fx.audit(AuditEntry {
        actor_id,
        entity: EntityRef::Task(after.id),
        operation: op,
        old_state: Some(before.status.to_db_str().to_string()),
        new_state: after.status.to_db_str().to_string(),
        message: msg,
    });
}

/// Load, check the state guard, apply `change`, persist, audit.
fn transition<F>(
    tx: &Transaction<'_>,
    fx: &mut Effects,
    task_id: i64,
    actor_id: i64,
    op: &'static str,
    allowed: &[TaskStatus],
    change: F,
) -> AppResult<Task>
where
    F: FnOnce(Task) -> AppResult<Task>,
{
    let before = get_task(tx, task_id)?;
    if !allowed.contains(&before.status) {
        return Err(invalid(&before, op));
    }
    let after = update_task(tx, &change(before.clone())?)?;
    audit_move(fx, actor_id, &before, &after, op, format!("task '{}'", after.title));
    Ok(after)
}

impl TaskLogic {
    /// Dispatcher creates a task for a worker, optionally tied to a zone
    /// and/or a reference point used for completion checks.
    pub fn create(
        ctx: &mut FieldContext<'_>,
        title: &str,
        worker_id: i64,
        zone_id: Option<i64>,
        target: Option<LatLng>,
        dispatcher_id: i64,
    ) -> AppResult<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("task title cannot be empty".into()));
        }
        if let Some(t) = target
            && !t.is_valid()
        {
            return Err(AppError::Validation(format!(
                "target ({}, {}) is not a valid coordinate",
                t.lat, t.lng
            )));
        }
        if let Some(z) = zone_id {
            ctx.zones.zone(z)?;
        }

        let task = ctx.transact(|tx, fx| {
            let draft = Task {
                id: 0,
                title: title.to_string(),
                assigned_worker_id: worker_id,
                zone_id,
                target,
                status: TaskStatus::Pending,
                completion_position: None,
                completion_verdict: None,
                completion_distance: None,
                distance_warning: false,
                rejection_reason: None,
                reviewer_id: None,
                created_at: Utc::now(),
                started_at: None,
                completed_at: None,
                resolved_at: None,
                version: 1,
            };
            let id = insert_task(tx, &draft)?;
            fx.audit(AuditEntry {
                actor_id: dispatcher_id,
                entity: EntityRef::Task(id),
                operation: "create",
                old_state: None,
                new_state: TaskStatus::Pending.to_db_str().to_string(),
                message: format!("assigned to worker {}", worker_id),
            });
            Ok(Task { id, ..draft })
        })?;

        info!(task = task.id, worker = worker_id, "task created");
        Ok(task)
    }

    pub fn start(ctx: &mut FieldContext<'_>, task_id: i64, worker_id: i64) -> AppResult<Task> {
        ctx.transact(|tx, fx| {
            transition(
                tx,
                fx,
                task_id,
                worker_id,
                "start",
                &[TaskStatus::Pending],
                |t| {
                    ensure_assignee(&t, worker_id)?;
                    Ok(Task {
                        status: TaskStatus::InProgress,
                        started_at: Some(Utc::now()),
                        ..t
                    })
                },
            )
        })
    }

    /// Record completion at `position`. The geolocation verdict never blocks
    /// the move to `Completed`; a rejection is kept as `rejection_reason` so
    /// the reviewer and the appeal path can see it.
    pub fn complete(
        ctx: &mut FieldContext<'_>,
        task_id: i64,
        worker_id: i64,
        position: Position,
    ) -> AppResult<Task> {
        let current = get_task(&ctx.pool.conn, task_id)?;
        let assessment = assess_completion(ctx, &current, &position)?;
        let thresholds = *ctx.thresholds();

        let task = ctx.transact(|tx, fx| {
            let task = transition(
                tx,
                fx,
                task_id,
                worker_id,
                "complete",
                &[TaskStatus::InProgress],
                |t| {
                    ensure_assignee(&t, worker_id)?;
                    Ok(Task {
                        status: TaskStatus::Completed,
                        completion_position: Some(position),
                        completion_verdict: Some(assessment.verdict),
                        completion_distance: assessment.distance_meters,
                        distance_warning: assessment.is_distance_warning(&thresholds),
                        rejection_reason: assessment.rejection_reason(),
                        completed_at: Some(Utc::now()),
                        ..t
                    })
                },
            )?;
            record_assessment(
                tx,
                &EntityRef::Task(task_id),
                Phase::Completion,
                &assessment,
                &position,
                worker_id,
            )?;

            if assessment.verdict == Verdict::PendingManualReview {
                fx.notify(Notification {
                    recipient_id: None,
                    kind: NotificationKind::ReviewRequired,
                    entity: EntityRef::Task(task_id),
                    message: format!(
                        "Task '{}' was completed with low geolocation confidence: {}",
                        task.title,
                        assessment.summary()
                    ),
                });
            }
            Ok(task)
        })?;

        info!(
            task = task_id,
            verdict = assessment.verdict.to_db_str(),
            distance = ?assessment.distance_meters,
            "task completed"
        );
        Ok(task)
    }

    pub fn approve(
        ctx: &mut FieldContext<'_>,
        task_id: i64,
        reviewer_id: i64,
        notes: Option<&str>,
    ) -> AppResult<Task> {
        ctx.transact(|tx, fx| {
            ensure_no_pending_appeal(tx, task_id, "approve")?;
            let task = transition(
                tx,
                fx,
                task_id,
                reviewer_id,
                "approve",
                &[TaskStatus::Completed],
                |t| {
                    Ok(Task {
                        status: TaskStatus::Approved,
                        rejection_reason: None,
                        reviewer_id: Some(reviewer_id),
                        resolved_at: Some(Utc::now()),
                        ..t
                    })
                },
            )?;
            record_decision(
                tx,
                &EntityRef::Task(task_id),
                Phase::ManualReview,
                Verdict::Verified,
                reviewer_id,
                notes,
            )?;
            fx.notify(Notification {
                recipient_id: Some(task.assigned_worker_id),
                kind: NotificationKind::TaskApproved,
                entity: EntityRef::Task(task_id),
                message: format!("Task '{}' was approved", task.title),
            });
            Ok(task)
        })
    }

    pub fn reject(
        ctx: &mut FieldContext<'_>,
        task_id: i64,
        reviewer_id: i64,
        reason: &str,
    ) -> AppResult<Task> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation(
                "rejecting a task requires a reason".into(),
            ));
        }

        ctx.transact(|tx, fx| {
            ensure_no_pending_appeal(tx, task_id, "reject")?;
            let task = transition(
                tx,
                fx,
                task_id,
                reviewer_id,
                "reject",
                &[TaskStatus::Completed],
                |t| {
                    Ok(Task {
                        status: TaskStatus::Rejected,
                        rejection_reason: Some(reason.to_string()),
                        reviewer_id: Some(reviewer_id),
                        resolved_at: Some(Utc::now()),
                        ..t
                    })
                },
            )?;
            record_decision(
                tx,
                &EntityRef::Task(task_id),
                Phase::ManualReview,
                Verdict::Rejected,
                reviewer_id,
                Some(reason),
            )?;
            fx.notify(Notification {
                recipient_id: Some(task.assigned_worker_id),
                kind: NotificationKind::TaskRejected,
                entity: EntityRef::Task(task_id),
                message: format!("Task '{}' was rejected: {}", task.title, reason),
            });
            Ok(task)
        })
    }

    pub fn cancel(ctx: &mut FieldContext<'_>, task_id: i64, actor_id: i64) -> AppResult<Task> {
        ctx.transact(|tx, fx| {
            transition(
                tx,
                fx,
                task_id,
                actor_id,
                "cancel",
                &[TaskStatus::Pending, TaskStatus::InProgress],
                |t| {
                    Ok(Task {
                        status: TaskStatus::Cancelled,
                        resolved_at: Some(Utc::now()),
                        ..t
                    })
                },
            )
        })
    }

    /// Hand the task to another worker. Progress is reset; id and history stay.
    pub fn reassign(
        ctx: &mut FieldContext<'_>,
        task_id: i64,
        new_worker_id: i64,
        actor_id: i64,
    ) -> AppResult<Task> {
        ctx.transact(|tx, fx| {
            let mut previous = 0;
            let task = transition(
                tx,
                fx,
                task_id,
                actor_id,
                "reassign",
                &[TaskStatus::Pending, TaskStatus::InProgress],
                |t| {
                    previous = t.assigned_worker_id;
                    Ok(Task {
                        assigned_worker_id: new_worker_id,
                        status: TaskStatus::Pending,
                        started_at: None,
                        ..t
                    })
                },
            )?;
            info!(task = task_id, from = previous, to = new_worker_id, "task reassigned");
            Ok(task)
        })
    }

    pub fn get(conn: &Connection, task_id: i64) -> AppResult<Task> {
        get_task(conn, task_id)
    }

    pub fn list_for_worker(conn: &Connection, worker_id: i64) -> AppResult<Vec<Task>> {
        list_tasks_for_worker(conn, worker_id)
    }
}

fn ensure_assignee(task: &Task, worker_id: i64) -> AppResult<()> {
    if task.assigned_worker_id != worker_id {
        return Err(AppError::Validation(format!(
            "task {} is assigned to worker {}, not {}",
            task.id, task.assigned_worker_id, worker_id
        )));
    }
    Ok(())
}

/// A contested completion is decided through its appeal only.
fn ensure_no_pending_appeal(conn: &Connection, task_id: i64, action: &str) -> AppResult<()> {
    let entity = EntityRef::Task(task_id);
    if let Some(open) = list_appeals_for_entity(conn, &entity)?
        .iter()
        .find(|a| a.is_pending())
    {
        return Err(AppError::InvalidTransition(format!(
            "cannot {} {} while appeal {} on it is pending",
            action, entity, open.id
        )));
    }
    Ok(())
}

/// Zone boundary first, then the task's own reference point.
fn assess_completion(
    ctx: &FieldContext<'_>,
    task: &Task,
    position: &Position,
) -> AppResult<Assessment> {
    if let Some(zone_id) = task.zone_id {
        return match ctx.zones.zone(zone_id) {
            Ok(zone) => Ok(evaluate(position, Target::Zone(&zone), ctx.thresholds())),
            Err(AppError::NotFound(what)) => {
                Ok(Assessment::unverifiable(format!("{what} is gone")))
            }
            Err(e) => Err(e),
        };
    }

    Ok(match task.target {
        Some(point) => evaluate(position, Target::Point(point), ctx.thresholds()),
        None => Assessment::unverifiable(format!("task {} has no zone or target point", task.id)),
    })
}
