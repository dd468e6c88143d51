use super::position::Position;
use super::verdict::Verdict;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum AttendanceState {
    Open,
    Closed,
}

/// One worker's presence record for one day.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub worker_id: i64,
    pub zone_id: i64,
    pub check_in_date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    /// Check-in position; absent for manual entries.
    pub reported_position: Option<Position>,
    pub check_out_position: Option<Position>,
    pub check_in_verdict: Verdict,
    pub check_in_distance: Option<f64>,
    pub check_out_verdict: Option<Verdict>,
    pub check_out_distance: Option<f64>,
    /// Whole minutes between check-in and check-out, set when the record closes.
    pub work_duration_minutes: Option<i64>,
    /// Aggregate of the check-in and check-out verdicts, overridable by review.
    pub verification_status: Verdict,
    pub is_manual_entry: bool,
    pub manual_reason: Option<String>,
    pub reviewer_id: Option<i64>,
    /// Reason given by a reviewer who rejected the record.
    pub review_note: Option<String>,
    pub version: i64,
}

/// Whole minutes worked, never negative.
pub fn work_minutes(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> i64 {
    (check_out - check_in).max(TimeDelta::zero()).num_minutes()
}

impl AttendanceRecord {
    pub fn state(&self) -> AttendanceState {
        if self.check_out_time.is_some() {
            AttendanceState::Closed
        } else {
            AttendanceState::Open
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == AttendanceState::Open
    }

    /// Position of the phase that caused the rejection, check-out first.
    pub fn rejected_position(&self) -> Option<Position> {
        if self.check_out_verdict == Some(Verdict::Rejected) {
            return self.check_out_position;
        }
        if self.check_in_verdict == Verdict::Rejected {
            return self.reported_position;
        }
        None
    }

    /// Largest distance recorded by a rejected phase, if any.
    pub fn rejection_distance(&self) -> Option<f64> {
        let mut out: Option<f64> = None;
        if self.check_in_verdict == Verdict::Rejected {
            out = self.check_in_distance;
        }
        if self.check_out_verdict == Some(Verdict::Rejected)
            && let Some(d) = self.check_out_distance
        {
            out = Some(out.map_or(d, |o| o.max(d)));
        }
        out
    }

    /// Human-readable reason for a rejected status, used as the appeal snapshot.
    pub fn rejection_reason(&self) -> Option<String> {
        if self.verification_status != Verdict::Rejected {
            return None;
        }
        if let Some(note) = &self.review_note {
            return Some(format!("Rejected by reviewer: {}", note));
        }
        Some(match self.rejection_distance() {
            Some(d) => format!("Geolocation mismatch: distance={}m", d),
            None => "Attendance rejected".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_minutes_truncates_and_clamps() {
        let t0 = DateTime::parse_from_rfc3339("2025-03-01T07:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(work_minutes(t0, t0 + TimeDelta::seconds(8 * 3600 + 59)), 480);
        assert_eq!(work_minutes(t0, t0 - TimeDelta::minutes(5)), 0);
    }
}
