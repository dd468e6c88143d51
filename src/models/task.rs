use super::position::{LatLng, Position};
use super::verdict::Verdict;
use chrono::{DateTime, Utc};
use serde::Serialize;

// Pending → InProgress → Completed → Approved | Rejected
// Pending | InProgress → Cancelled
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Approved,
    Rejected,
    Cancelled,
}

impl TaskStatus {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Approved => "approved",
            TaskStatus::Rejected => "rejected",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "approved" => Some(TaskStatus::Approved),
            "rejected" => Some(TaskStatus::Rejected),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub assigned_worker_id: i64,
    pub zone_id: Option<i64>,
    /// Optional reference point, used when no zone polygon applies.
    pub target: Option<LatLng>,
    pub status: TaskStatus,
    pub completion_position: Option<Position>,
    pub completion_verdict: Option<Verdict>,
    pub completion_distance: Option<f64>,
    pub distance_warning: bool,
    pub rejection_reason: Option<String>,
    pub reviewer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Task {
    /// Rejected outright, or completed with a geolocation flag still attached.
    pub fn is_appealable(&self) -> bool {
        match self.status {
            TaskStatus::Rejected => true,
            TaskStatus::Completed => self.rejection_reason.is_some(),
            _ => false,
        }
    }
}
