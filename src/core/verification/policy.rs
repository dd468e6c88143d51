//! Accept/reject decision for a reported position.
//!
//! `evaluate` is a pure function of its inputs: the same position, target and
//! thresholds always produce the same verdict and the same distance.

use super::geo;
use crate::errors::AppError;
use crate::models::position::{LatLng, Position};
use crate::models::verdict::Verdict;
use crate::models::zone::Zone;
use serde::{Deserialize, Serialize};

/// Municipality-level limits, passed in explicitly by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub max_acceptable_accuracy_meters: f64,
    pub max_acceptable_distance_meters: f64,
    /// A verified report farther than this is flagged for the reviewer.
    pub warning_distance_meters: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_acceptable_accuracy_meters: 150.0,
            max_acceptable_distance_meters: 500.0,
            warning_distance_meters: 100.0,
        }
    }
}

/// What a report is checked against.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Zone(&'a Zone),
    Point(LatLng),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub verdict: Verdict,
    /// Meters to the zone edge or reference point, to the centimeter.
    pub distance_meters: Option<f64>,
    pub note: Option<String>,
}

impl Assessment {
    fn review(note: String) -> Self {
        Self {
            verdict: Verdict::PendingManualReview,
            distance_meters: None,
            note: Some(note),
        }
    }

    /// A check that could not be run at all, e.g. the target disappeared.
    pub fn unverifiable(note: impl Into<String>) -> Self {
        Self::review(format!("cannot verify: {}", note.into()))
    }

    /// Reason stored on a record whose check was rejected.
    pub fn rejection_reason(&self) -> Option<String> {
        if self.verdict != Verdict::Rejected {
            return None;
        }
        Some(match self.distance_meters {
            Some(d) => format!("Geolocation mismatch: distance={}m", d),
            None => "Geolocation mismatch".to_string(),
        })
    }

    /// One-line description for audit and history output.
    pub fn summary(&self) -> String {
        match (&self.note, self.distance_meters) {
            (Some(note), _) => note.clone(),
            (None, Some(d)) => format!("{} at {}m", self.verdict.label(), d),
            (None, None) => self.verdict.label().to_string(),
        }
    }

    pub fn is_distance_warning(&self, t: &Thresholds) -> bool {
        self.verdict == Verdict::Verified
            && self
                .distance_meters
                .is_some_and(|d| d > t.warning_distance_meters)
    }
}

/// Stored distances keep two decimals so a value just past the ceiling
/// never reads as the ceiling itself.
fn round_centimeters(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}

fn distance_to_target(p: LatLng, target: Target<'_>) -> Result<f64, AppError> {
    match target {
        Target::Zone(zone) if zone.has_polygon() => geo::distance_to_zone(p, zone),
        Target::Zone(zone) => match zone.reference {
            Some(r) => geo::distance_meters(p, r),
            None => Err(AppError::Geometry(format!(
                "zone {} ('{}') has neither a boundary nor a reference point",
                zone.id, zone.name
            ))),
        },
        Target::Point(r) => geo::distance_meters(p, r),
    }
}

/// Decide whether `reported` is plausible for `target`.
///
/// 1. accuracy worse than the ceiling → `PendingManualReview`
/// 2. inside the zone, or within the distance ceiling → `Verified`
/// 3. otherwise → `Rejected`, carrying the distance
///
/// Geometry problems never auto-decide: they yield `PendingManualReview`.
pub fn evaluate(reported: &Position, target: Target<'_>, t: &Thresholds) -> Assessment {
    if !reported.accuracy.is_finite() || reported.accuracy < 0.0 {
        return Assessment::review(format!(
            "reported accuracy {} is not usable",
            reported.accuracy
        ));
    }

    if reported.accuracy > t.max_acceptable_accuracy_meters {
        return Assessment::review(format!(
            "accuracy {}m exceeds {}m",
            reported.accuracy, t.max_acceptable_accuracy_meters
        ));
    }

    let distance = match distance_to_target(reported.coords(), target) {
        Ok(d) => d,
        Err(e) => return Assessment::review(format!("cannot verify: {}", e)),
    };

    // the raw distance decides; only the stored value is rounded
    let verdict = if distance <= t.max_acceptable_distance_meters {
        Verdict::Verified
    } else {
        Verdict::Rejected
    };

    Assessment {
        verdict,
        distance_meters: Some(round_centimeters(distance)),
        note: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::verification::geo::EARTH_RADIUS_METERS;
    use std::f64::consts::PI;

    const M_PER_DEG: f64 = EARTH_RADIUS_METERS * PI / 180.0;

    fn thresholds() -> Thresholds {
        Thresholds {
            max_acceptable_accuracy_meters: 50.0,
            max_acceptable_distance_meters: 500.0,
            warning_distance_meters: 100.0,
        }
    }

    fn depot() -> Zone {
        Zone {
            id: 7,
            name: "Depot".into(),
            boundary: vec![],
            reference: Some(LatLng::new(31.9, 35.2)),
        }
    }

    fn park() -> Zone {
        Zone {
            id: 8,
            name: "Park".into(),
            boundary: vec![
                LatLng::new(31.89, 35.19),
                LatLng::new(31.89, 35.21),
                LatLng::new(31.91, 35.21),
                LatLng::new(31.91, 35.19),
            ],
            reference: None,
        }
    }

    fn north_of(base: LatLng, meters: f64, accuracy: f64) -> Position {
        Position::new(base.lat + meters / M_PER_DEG, base.lng, accuracy)
    }

    #[test]
    fn noisy_fix_always_needs_review() {
        let t = thresholds();
        let base = LatLng::new(31.9, 35.2);
        for meters in [0.0, 10.0, 499.0, 650.0, 10_000.0] {
            for acc in [50.1, 80.0, 1_000.0] {
                let a = evaluate(&north_of(base, meters, acc), Target::Zone(&depot()), &t);
                assert_eq!(a.verdict, Verdict::PendingManualReview);
                assert_eq!(a.distance_meters, None);
            }
        }
    }

    #[test]
    fn far_report_is_rejected_with_distance() {
        let a = evaluate(
            &north_of(LatLng::new(31.9, 35.2), 650.0, 10.0),
            Target::Zone(&depot()),
            &thresholds(),
        );
        assert_eq!(a.verdict, Verdict::Rejected);
        assert_eq!(a.distance_meters, Some(650.0));
        assert_eq!(
            a.rejection_reason().as_deref(),
            Some("Geolocation mismatch: distance=650m")
        );
    }

    #[test]
    fn near_report_is_verified_and_flags_warning() {
        let t = thresholds();
        let a = evaluate(
            &north_of(LatLng::new(31.9, 35.2), 300.0, 10.0),
            Target::Point(LatLng::new(31.9, 35.2)),
            &t,
        );
        assert_eq!(a.verdict, Verdict::Verified);
        assert_eq!(a.distance_meters, Some(300.0));
        assert!(a.is_distance_warning(&t));
        assert_eq!(a.rejection_reason(), None);
    }

    #[test]
    fn distance_equal_to_ceiling_is_verified() {
        let a = evaluate(
            &north_of(LatLng::new(31.9, 35.2), 500.0, 5.0),
            Target::Zone(&depot()),
            &thresholds(),
        );
        assert_eq!(a.verdict, Verdict::Verified);
    }

    #[test]
    fn just_past_ceiling_is_rejected() {
        let a = evaluate(
            &north_of(LatLng::new(31.9, 35.2), 500.4, 5.0),
            Target::Point(LatLng::new(31.9, 35.2)),
            &thresholds(),
        );
        assert_eq!(a.verdict, Verdict::Rejected);
        assert_eq!(a.distance_meters, Some(500.4));
        assert_eq!(
            a.rejection_reason().as_deref(),
            Some("Geolocation mismatch: distance=500.4m")
        );
    }

    #[test]
    fn inside_polygon_is_verified_at_zero() {
        let a = evaluate(
            &Position::new(31.90, 35.20, 5.0),
            Target::Zone(&park()),
            &thresholds(),
        );
        assert_eq!(a.verdict, Verdict::Verified);
        assert_eq!(a.distance_meters, Some(0.0));
    }

    #[test]
    fn outside_polygon_uses_edge_distance() {
        // 0.01° ≈ 1112 m north of the northern edge
        let a = evaluate(
            &Position::new(31.92, 35.20, 5.0),
            Target::Zone(&park()),
            &thresholds(),
        );
        assert_eq!(a.verdict, Verdict::Rejected);
        assert_eq!(a.distance_meters, Some(round_centimeters(0.01 * M_PER_DEG)));
    }

    #[test]
    fn degenerate_zone_needs_review() {
        let mut z = park();
        z.boundary.truncate(2);
        let a = evaluate(&Position::new(31.90, 35.20, 5.0), Target::Zone(&z), &thresholds());
        assert_eq!(a.verdict, Verdict::PendingManualReview);
        assert!(a.note.unwrap().contains("cannot verify"));

        let empty = Zone {
            reference: None,
            ..depot()
        };
        let a = evaluate(&Position::new(31.90, 35.20, 5.0), Target::Zone(&empty), &thresholds());
        assert_eq!(a.verdict, Verdict::PendingManualReview);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let p = north_of(LatLng::new(31.9, 35.2), 733.3, 12.0);
        let first = evaluate(&p, Target::Zone(&depot()), &thresholds());
        for _ in 0..5 {
            assert_eq!(evaluate(&p, Target::Zone(&depot()), &thresholds()), first);
        }
    }
}
