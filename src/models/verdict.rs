use serde::Serialize;

/// Outcome of a geolocation check.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    Rejected,
    PendingManualReview,
}

impl Verdict {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Verdict::Verified => "verified",
            Verdict::Rejected => "rejected",
            Verdict::PendingManualReview => "pending_review",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "verified" => Some(Verdict::Verified),
            "rejected" => Some(Verdict::Rejected),
            "pending_review" => Some(Verdict::PendingManualReview),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Verified => "Verified",
            Verdict::Rejected => "Rejected",
            Verdict::PendingManualReview => "Needs review",
        }
    }

    /// Combine two phase verdicts: a rejection dominates, then a pending review.
    pub fn worst(self, other: Verdict) -> Verdict {
        match (self, other) {
            (Verdict::Rejected, _) | (_, Verdict::Rejected) => Verdict::Rejected,
            (Verdict::PendingManualReview, _) | (_, Verdict::PendingManualReview) => {
                Verdict::PendingManualReview
            }
            _ => Verdict::Verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_prefers_rejection_then_review() {
        assert_eq!(
            Verdict::Verified.worst(Verdict::Rejected),
            Verdict::Rejected
        );
        assert_eq!(
            Verdict::PendingManualReview.worst(Verdict::Verified),
            Verdict::PendingManualReview
        );
        assert_eq!(
            Verdict::PendingManualReview.worst(Verdict::Rejected),
            Verdict::Rejected
        );
        assert_eq!(Verdict::Verified.worst(Verdict::Verified), Verdict::Verified);
    }

    #[test]
    fn db_strings_are_stable() {
        for v in [
            Verdict::Verified,
            Verdict::Rejected,
            Verdict::PendingManualReview,
        ] {
            assert_eq!(Verdict::from_db_str(v.to_db_str()), Some(v));
        }
        assert_eq!(Verdict::from_db_str("ok"), None);
    }
}
