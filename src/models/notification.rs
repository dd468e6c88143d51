use super::appeal::EntityRef;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum NotificationKind {
    AppealResolved,
    TaskApproved,
    TaskRejected,
    AttendanceRejected,
    /// Geolocation confidence too low to auto-decide; a reviewer must look.
    ReviewRequired,
}

impl NotificationKind {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            NotificationKind::AppealResolved => "appeal_resolved",
            NotificationKind::TaskApproved => "task_approved",
            NotificationKind::TaskRejected => "task_rejected",
            NotificationKind::AttendanceRejected => "attendance_rejected",
            NotificationKind::ReviewRequired => "review_required",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "appeal_resolved" => Some(NotificationKind::AppealResolved),
            "task_approved" => Some(NotificationKind::TaskApproved),
            "task_rejected" => Some(NotificationKind::TaskRejected),
            "attendance_rejected" => Some(NotificationKind::AttendanceRejected),
            "review_required" => Some(NotificationKind::ReviewRequired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// `None` addresses the reviewer pool rather than one person.
    pub recipient_id: Option<i64>,
    pub kind: NotificationKind,
    pub entity: EntityRef,
    pub message: String,
}
