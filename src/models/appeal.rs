use super::position::LatLng;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum AppealStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppealStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AppealStatus::Pending => "pending",
            AppealStatus::Approved => "approved",
            AppealStatus::Rejected => "rejected",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AppealStatus::Pending),
            "approved" => Some(AppealStatus::Approved),
            "rejected" => Some(AppealStatus::Rejected),
            _ => None,
        }
    }
}

/// Kind of record an appeal can contest.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Attendance,
    Task,
}

impl EntityKind {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EntityKind::Attendance => "attendance",
            EntityKind::Task => "task",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "attendance" => Some(EntityKind::Attendance),
            "task" => Some(EntityKind::Task),
            _ => None,
        }
    }

    /// Helper: parse user input (case-insensitive)
    pub fn from_code(code: &str) -> Option<Self> {
        Self::from_db_str(&code.to_lowercase())
    }
}

/// Typed reference to the record an appeal contests.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Attendance(i64),
    Task(i64),
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        match kind {
            EntityKind::Attendance => EntityRef::Attendance(id),
            EntityKind::Task => EntityRef::Task(id),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Attendance(_) => EntityKind::Attendance,
            EntityRef::Task(_) => EntityKind::Task,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            EntityRef::Attendance(id) | EntityRef::Task(id) => *id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind().to_db_str(), self.id())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Appeal {
    pub id: i64,
    pub entity: EntityRef,
    pub worker_id: i64,
    pub distance_meters: Option<f64>,
    pub worker_explanation: String,
    pub evidence_photo_ref: Option<String>,
    pub original_rejection_reason: Option<String>,
    /// Where the worker was when the contested phase was rejected.
    pub worker_position: Option<LatLng>,
    /// Task target or zone reference point at the time of the appeal.
    pub expected_position: Option<LatLng>,
    pub status: AppealStatus,
    pub reviewer_id: Option<i64>,
    pub review_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Appeal {
    pub fn is_pending(&self) -> bool {
        self.status == AppealStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ref_keeps_kind_and_id() {
        let r = EntityRef::new(EntityKind::Task, 42);
        assert_eq!(r, EntityRef::Task(42));
        assert_eq!(r.kind(), EntityKind::Task);
        assert_eq!(r.id(), 42);
        assert_eq!(r.to_string(), "task #42");
    }

    #[test]
    fn entity_kind_from_user_code() {
        assert_eq!(EntityKind::from_code("Attendance"), Some(EntityKind::Attendance));
        assert_eq!(EntityKind::from_code("TASK"), Some(EntityKind::Task));
        assert_eq!(EntityKind::from_code("issue"), None);
    }
}
