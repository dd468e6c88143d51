mod common;
use common::{Harness, Recorder, north_of_depot};

use fieldcheck::core::history::HistoryLogic;
use fieldcheck::core::task::TaskLogic;
use fieldcheck::errors::AppError;
use fieldcheck::models::appeal::EntityRef;
use fieldcheck::models::notification::NotificationKind;
use fieldcheck::models::position::LatLng;
use fieldcheck::models::task::{Task, TaskStatus};
use fieldcheck::models::verdict::Verdict;

const WORKER: i64 = 11;
const DISPATCHER: i64 = 500;
const REVIEWER: i64 = 900;

fn started_task(h: &mut Harness, n: &Recorder, zone: Option<i64>, target: Option<LatLng>) -> Task {
    let t = TaskLogic::create(&mut h.ctx(n), "Repair streetlight", WORKER, zone, target, DISPATCHER)
        .unwrap();
    assert_eq!(t.status, TaskStatus::Pending);
    TaskLogic::start(&mut h.ctx(n), t.id, WORKER).unwrap()
}

#[test]
fn far_completion_is_kept_with_a_rejection_reason() {
    let mut h = Harness::new("task_far_completion");
    let n = Recorder::default();
    let t = started_task(&mut h, &n, Some(1), None);

    let done = TaskLogic::complete(&mut h.ctx(&n), t.id, WORKER, north_of_depot(650.0, 10.0))
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.completion_verdict, Some(Verdict::Rejected));
    assert_eq!(done.completion_distance, Some(650.0));
    assert_eq!(
        done.rejection_reason.as_deref(),
        Some("Geolocation mismatch: distance=650m")
    );
    assert!(done.is_appealable());
}

#[test]
fn near_completion_flags_distance_warning() {
    let mut h = Harness::new("task_warning");
    let n = Recorder::default();
    let t = started_task(&mut h, &n, None, Some(LatLng::new(31.9, 35.2)));

    let done = TaskLogic::complete(&mut h.ctx(&n), t.id, WORKER, north_of_depot(250.0, 10.0))
        .unwrap();
    assert_eq!(done.completion_verdict, Some(Verdict::Verified));
    assert!(done.distance_warning);
    assert_eq!(done.rejection_reason, None);
    assert!(!done.is_appealable());
}

#[test]
fn low_confidence_completion_notifies_reviewer() {
    let mut h = Harness::new("task_low_confidence");
    let n = Recorder::default();
    let t = started_task(&mut h, &n, Some(1), None);

    let done = TaskLogic::complete(&mut h.ctx(&n), t.id, WORKER, north_of_depot(0.0, 500.0))
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.completion_verdict, Some(Verdict::PendingManualReview));

    let sent = n.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::ReviewRequired);
    assert_eq!(sent[0].recipient_id, None);
}

#[test]
fn task_without_zone_or_target_is_left_to_the_reviewer() {
    let mut h = Harness::new("task_no_target");
    let n = Recorder::default();
    let t = started_task(&mut h, &n, None, None);

    let done = TaskLogic::complete(&mut h.ctx(&n), t.id, WORKER, north_of_depot(0.0, 5.0)).unwrap();
    assert_eq!(done.completion_verdict, Some(Verdict::PendingManualReview));
}

#[test]
fn approve_and_reject_only_from_completed() {
    let mut h = Harness::new("task_review_guard");
    let n = Recorder::default();
    let t = started_task(&mut h, &n, Some(1), None);

    let err = TaskLogic::approve(&mut h.ctx(&n), t.id, REVIEWER, None).unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    let err = TaskLogic::reject(&mut h.ctx(&n), t.id, REVIEWER, "wrong pole").unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    TaskLogic::complete(&mut h.ctx(&n), t.id, WORKER, north_of_depot(650.0, 10.0)).unwrap();
    let approved = TaskLogic::approve(&mut h.ctx(&n), t.id, REVIEWER, Some("photo checks out"))
        .unwrap();
    assert_eq!(approved.status, TaskStatus::Approved);
    assert_eq!(approved.rejection_reason, None);
    assert_eq!(approved.reviewer_id, Some(REVIEWER));
    assert!(approved.resolved_at.is_some());

    // terminal for the normal flow
    let err = TaskLogic::approve(&mut h.ctx(&n), t.id, REVIEWER, None).unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let sent = n.sent.borrow();
    let last = sent.last().unwrap();
    assert_eq!(last.kind, NotificationKind::TaskApproved);
    assert_eq!(last.recipient_id, Some(WORKER));
}

#[test]
fn reject_requires_a_reason() {
    let mut h = Harness::new("task_reject_reason");
    let n = Recorder::default();
    let t = started_task(&mut h, &n, Some(1), None);
    TaskLogic::complete(&mut h.ctx(&n), t.id, WORKER, north_of_depot(10.0, 10.0)).unwrap();

    let err = TaskLogic::reject(&mut h.ctx(&n), t.id, REVIEWER, "").unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(TaskLogic::get(&h.pool.conn, t.id).unwrap().status, TaskStatus::Completed);

    let rejected = TaskLogic::reject(&mut h.ctx(&n), t.id, REVIEWER, "Lamp still off").unwrap();
    assert_eq!(rejected.status, TaskStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Lamp still off"));
    assert_eq!(
        n.sent.borrow().last().map(|s| s.kind),
        Some(NotificationKind::TaskRejected)
    );
}

#[test]
fn only_the_assignee_can_start_and_complete() {
    let mut h = Harness::new("task_assignee");
    let n = Recorder::default();
    let t = TaskLogic::create(&mut h.ctx(&n), "Clear drain", WORKER, Some(1), None, DISPATCHER)
        .unwrap();

    let err = TaskLogic::start(&mut h.ctx(&n), t.id, 99).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    TaskLogic::start(&mut h.ctx(&n), t.id, WORKER).unwrap();
    let err = TaskLogic::complete(&mut h.ctx(&n), t.id, 99, north_of_depot(0.0, 5.0)).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // completing twice is an invalid transition
    TaskLogic::complete(&mut h.ctx(&n), t.id, WORKER, north_of_depot(0.0, 5.0)).unwrap();
    let err = TaskLogic::complete(&mut h.ctx(&n), t.id, WORKER, north_of_depot(0.0, 5.0))
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[test]
fn reassign_resets_progress_but_keeps_identity() {
    let mut h = Harness::new("task_reassign");
    let n = Recorder::default();
    let t = started_task(&mut h, &n, Some(1), None);
    assert!(t.started_at.is_some());

    let moved = TaskLogic::reassign(&mut h.ctx(&n), t.id, 12, DISPATCHER).unwrap();
    assert_eq!(moved.id, t.id);
    assert_eq!(moved.assigned_worker_id, 12);
    assert_eq!(moved.status, TaskStatus::Pending);
    assert_eq!(moved.started_at, None);
    assert_eq!(moved.created_at, t.created_at);

    assert!(TaskLogic::list_for_worker(&h.pool.conn, WORKER).unwrap().is_empty());
    assert_eq!(TaskLogic::list_for_worker(&h.pool.conn, 12).unwrap().len(), 1);

    let history = HistoryLogic::load(&h.pool.conn, EntityRef::Task(t.id)).unwrap();
    let ops: Vec<&str> = history.audit.iter().map(|a| a.operation.as_str()).collect();
    assert_eq!(ops, vec!["create", "start", "reassign"]);
}

#[test]
fn cancel_only_while_active() {
    let mut h = Harness::new("task_cancel");
    let n = Recorder::default();
    let t = started_task(&mut h, &n, Some(1), None);

    let cancelled = TaskLogic::cancel(&mut h.ctx(&n), t.id, DISPATCHER).unwrap();
    assert_eq!(cancelled.status, TaskStatus::Cancelled);

    let err = TaskLogic::cancel(&mut h.ctx(&n), t.id, DISPATCHER).unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    let err = TaskLogic::reassign(&mut h.ctx(&n), t.id, 12, DISPATCHER).unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[test]
fn create_validates_input() {
    let mut h = Harness::new("task_create_validation");
    let n = Recorder::default();

    let err = TaskLogic::create(&mut h.ctx(&n), "  ", WORKER, None, None, DISPATCHER).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = TaskLogic::create(&mut h.ctx(&n), "Paint", WORKER, Some(42), None, DISPATCHER)
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = TaskLogic::create(
        &mut h.ctx(&n),
        "Paint",
        WORKER,
        None,
        Some(LatLng::new(123.0, 0.0)),
        DISPATCHER,
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.count("SELECT COUNT(*) FROM tasks"), 0);
}

#[test]
fn stale_version_is_a_concurrent_modification() {
    let mut h = Harness::new("task_stale_version");
    let n = Recorder::default();
    let t = TaskLogic::create(&mut h.ctx(&n), "Fix bench", WORKER, Some(1), None, DISPATCHER)
        .unwrap();

    let stale = TaskLogic::get(&h.pool.conn, t.id).unwrap();
    TaskLogic::start(&mut h.ctx(&n), t.id, WORKER).unwrap();

    let err = fieldcheck::db::queries::tasks::update_task(&h.pool.conn, &stale).unwrap_err();
    assert!(matches!(err, AppError::ConcurrentModification(_)));
    assert!(err.is_retryable());
}
