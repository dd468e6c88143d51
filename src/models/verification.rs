use super::appeal::EntityRef;
use super::verdict::Verdict;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which action produced a verdict.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Phase {
    CheckIn,
    CheckOut,
    Completion,
    ManualReview,
    Appeal,
}

impl Phase {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Phase::CheckIn => "check_in",
            Phase::CheckOut => "check_out",
            Phase::Completion => "completion",
            Phase::ManualReview => "manual_review",
            Phase::Appeal => "appeal",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "check_in" => Some(Phase::CheckIn),
            "check_out" => Some(Phase::CheckOut),
            "completion" => Some(Phase::Completion),
            "manual_review" => Some(Phase::ManualReview),
            "appeal" => Some(Phase::Appeal),
            _ => None,
        }
    }
}

/// One row of a record's verdict history.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationEntry {
    pub id: i64,
    pub entity: EntityRef,
    pub phase: Phase,
    pub verdict: Verdict,
    pub distance_meters: Option<f64>,
    pub accuracy_meters: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub actor_id: i64,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
