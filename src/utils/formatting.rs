//! Formatting utilities used for CLI outputs.

use crate::models::appeal::AppealStatus;
use crate::models::task::TaskStatus;
use crate::models::verdict::Verdict;
use crate::utils::colors::{GREEN, GREY, RED, RESET, YELLOW, missing};
use chrono::{DateTime, Utc};

pub fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

/// "650 m", or a grey placeholder when no distance was computed.
pub fn fmt_distance(d: Option<f64>) -> String {
    match d {
        Some(m) => format!("{:.0} m", m),
        None => missing(),
    }
}

pub fn fmt_ts(ts: Option<&DateTime<Utc>>) -> String {
    match ts {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => missing(),
    }
}

pub fn fmt_opt<T: ToString>(v: Option<T>) -> String {
    match v {
        Some(x) => x.to_string(),
        None => missing(),
    }
}

pub fn verdict_label(v: Verdict) -> String {
    let color = match v {
        Verdict::Verified => GREEN,
        Verdict::Rejected => RED,
        Verdict::PendingManualReview => YELLOW,
    };
    format!("{}{}{}", color, v.label(), RESET)
}

pub fn task_status_label(s: TaskStatus) -> String {
    let color = match s {
        TaskStatus::Approved => GREEN,
        TaskStatus::Rejected => RED,
        TaskStatus::Completed => YELLOW,
        TaskStatus::Cancelled => GREY,
        TaskStatus::Pending | TaskStatus::InProgress => RESET,
    };
    format!("{}{}{}", color, s.to_db_str(), RESET)
}

pub fn appeal_status_label(s: AppealStatus) -> String {
    let color = match s {
        AppealStatus::Approved => GREEN,
        AppealStatus::Rejected => RED,
        AppealStatus::Pending => YELLOW,
    };
    format!("{}{}{}", color, s.to_db_str(), RESET)
}

/// Cut `s` to `width` visible characters, marking the cut with "...".
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_whole_meters() {
        assert_eq!(fmt_distance(Some(650.0)), "650 m");
        assert!(fmt_distance(None).contains("--"));
    }

    #[test]
    fn truncate_marks_the_cut() {
        assert_eq!(truncate("GPS drift", 20), "GPS drift");
        assert_eq!(truncate("GPS drift near building", 10), "GPS dri...");
    }
}
