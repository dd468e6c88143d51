//! Geometry primitives: great-circle distance and zone membership.
//!
//! Coordinates are WGS84 degrees. Zone-scale computations (distance to a
//! polygon edge) use a local equirectangular projection centred on the
//! reported point, which is accurate to well under a meter at municipal scale.

use crate::errors::{AppError, AppResult};
use crate::models::position::LatLng;
use crate::models::zone::Zone;
use std::f64::consts::PI;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

const EPSILON: f64 = 1e-12;

fn to_radians(deg: f64) -> f64 {
    deg * PI / 180.0
}

fn check_point(p: &LatLng, what: &str) -> AppResult<()> {
    if p.is_valid() {
        Ok(())
    } else {
        Err(AppError::Geometry(format!(
            "{} is not a valid coordinate ({}, {})",
            what, p.lat, p.lng
        )))
    }
}

/// Haversine distance in meters. Always ≥ 0.
pub fn distance_meters(a: LatLng, b: LatLng) -> AppResult<f64> {
    check_point(&a, "first position")?;
    check_point(&b, "second position")?;

    let d_lat = to_radians(b.lat - a.lat);
    let d_lng = to_radians(b.lng - a.lng);

    let h = (d_lat / 2.0).sin().powi(2)
        + to_radians(a.lat).cos() * to_radians(b.lat).cos() * (d_lng / 2.0).sin().powi(2);

    // clamp against rounding pushing h past 1.0
    let c = 2.0 * h.sqrt().min(1.0).asin();

    Ok((EARTH_RADIUS_METERS * c).max(0.0))
}

/// Polygon vertices with a repeated closing vertex dropped.
fn ring(zone: &Zone) -> AppResult<&[LatLng]> {
    let mut v = zone.boundary.as_slice();
    if v.len() > 1 && v.first() == v.last() {
        v = &v[..v.len() - 1];
    }

    if v.len() < 3 {
        return Err(AppError::Geometry(format!(
            "zone {} ('{}') has {} distinct vertices, at least 3 are required",
            zone.id,
            zone.name,
            v.len()
        )));
    }

    for vertex in v {
        check_point(vertex, "zone vertex")?;
    }

    Ok(v)
}

fn on_segment(p: &LatLng, a: &LatLng, b: &LatLng) -> bool {
    let cross = (b.lng - a.lng) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lng - a.lng);
    if cross.abs() > EPSILON {
        return false;
    }

    p.lng >= a.lng.min(b.lng) - EPSILON
        && p.lng <= a.lng.max(b.lng) + EPSILON
        && p.lat >= a.lat.min(b.lat) - EPSILON
        && p.lat <= a.lat.max(b.lat) + EPSILON
}

/// Ray-casting point-in-polygon test. Points on an edge or vertex count as inside.
pub fn is_inside_zone(p: LatLng, zone: &Zone) -> AppResult<bool> {
    check_point(&p, "position")?;
    let v = ring(zone)?;

    let n = v.len();
    let mut j = n - 1;
    for i in 0..n {
        if on_segment(&p, &v[j], &v[i]) {
            return Ok(true);
        }
        j = i;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (v[i].lng, v[i].lat);
        let (xj, yj) = (v[j].lng, v[j].lat);

        if (yi > p.lat) != (yj > p.lat) {
            let x_cross = (xj - xi) * (p.lat - yi) / (yj - yi) + xi;
            if p.lng < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    Ok(inside)
}

/// Distance in meters from `p` to the nearest edge of the zone polygon,
/// or 0 when `p` is inside it.
pub fn distance_to_zone(p: LatLng, zone: &Zone) -> AppResult<f64> {
    if is_inside_zone(p, zone)? {
        return Ok(0.0);
    }

    let v = ring(zone)?;
    let k = EARTH_RADIUS_METERS * PI / 180.0;
    let cos_lat = to_radians(p.lat).cos();

    let project = |q: &LatLng| ((q.lng - p.lng) * k * cos_lat, (q.lat - p.lat) * k);

    let mut best = f64::INFINITY;
    let n = v.len();
    let mut j = n - 1;
    for i in 0..n {
        let (ax, ay) = project(&v[j]);
        let (bx, by) = project(&v[i]);
        best = best.min(origin_to_segment(ax, ay, bx, by));
        j = i;
    }

    Ok(best)
}

fn origin_to_segment(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 <= EPSILON {
        0.0
    } else {
        (-(ax * dx + ay * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    (cx * cx + cy * cy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Meters per degree of latitude on the model sphere.
    const M_PER_DEG: f64 = EARTH_RADIUS_METERS * PI / 180.0;

    fn square() -> Zone {
        Zone {
            id: 1,
            name: "Old Town".into(),
            boundary: vec![
                LatLng::new(31.89, 35.19),
                LatLng::new(31.89, 35.21),
                LatLng::new(31.91, 35.21),
                LatLng::new(31.91, 35.19),
            ],
            reference: None,
        }
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let d = distance_meters(LatLng::new(31.0, 35.0), LatLng::new(32.0, 35.0)).unwrap();
        assert!((d - M_PER_DEG).abs() < 1e-6);
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_same_point() {
        let a = LatLng::new(31.9, 35.2);
        let b = LatLng::new(31.95, 35.27);
        let ab = distance_meters(a, b).unwrap();
        let ba = distance_meters(b, a).unwrap();
        assert!((ab - ba).abs() < 1e-9);
        assert_eq!(distance_meters(a, a).unwrap(), 0.0);
    }

    #[test]
    fn invalid_position_is_geometry_error() {
        let err = distance_meters(LatLng::new(f64::NAN, 35.0), LatLng::new(31.0, 35.0));
        assert!(matches!(err, Err(AppError::Geometry(_))));
        let err = is_inside_zone(LatLng::new(95.0, 35.0), &square());
        assert!(matches!(err, Err(AppError::Geometry(_))));
    }

    #[test]
    fn interior_points_are_inside() {
        let z = square();
        assert!(is_inside_zone(LatLng::new(31.90, 35.20), &z).unwrap());
        assert!(is_inside_zone(LatLng::new(31.8901, 35.2099), &z).unwrap());
    }

    #[test]
    fn vertices_and_edges_are_inside() {
        let z = square();
        for v in &z.boundary {
            assert!(is_inside_zone(*v, &z).unwrap(), "vertex {:?}", v);
        }
        assert!(is_inside_zone(LatLng::new(31.89, 35.20), &z).unwrap());
        assert!(is_inside_zone(LatLng::new(31.90, 35.21), &z).unwrap());
    }

    #[test]
    fn exterior_points_are_outside() {
        let z = square();
        assert!(!is_inside_zone(LatLng::new(31.92, 35.20), &z).unwrap());
        assert!(!is_inside_zone(LatLng::new(31.90, 35.18), &z).unwrap());
    }

    #[test]
    fn concave_polygon_notch_is_outside() {
        // U shape open to the north
        let z = Zone {
            id: 2,
            name: "Market".into(),
            boundary: vec![
                LatLng::new(0.0, 0.0),
                LatLng::new(0.0, 3.0),
                LatLng::new(3.0, 3.0),
                LatLng::new(3.0, 2.0),
                LatLng::new(1.0, 2.0),
                LatLng::new(1.0, 1.0),
                LatLng::new(3.0, 1.0),
                LatLng::new(3.0, 0.0),
            ],
            reference: None,
        };
        assert!(!is_inside_zone(LatLng::new(2.0, 1.5), &z).unwrap());
        assert!(is_inside_zone(LatLng::new(2.0, 0.5), &z).unwrap());
        assert!(is_inside_zone(LatLng::new(0.5, 1.5), &z).unwrap());
    }

    #[test]
    fn closed_ring_is_accepted() {
        let mut z = square();
        let first = z.boundary[0];
        z.boundary.push(first);
        assert!(is_inside_zone(LatLng::new(31.90, 35.20), &z).unwrap());
    }

    #[test]
    fn fewer_than_three_vertices_is_geometry_error() {
        let mut z = square();
        z.boundary.truncate(2);
        assert!(matches!(
            is_inside_zone(LatLng::new(31.90, 35.20), &z),
            Err(AppError::Geometry(_))
        ));

        // a closed "triangle" with only two distinct points
        z.boundary = vec![
            LatLng::new(31.89, 35.19),
            LatLng::new(31.91, 35.21),
            LatLng::new(31.89, 35.19),
        ];
        assert!(matches!(
            distance_to_zone(LatLng::new(31.90, 35.20), &z),
            Err(AppError::Geometry(_))
        ));
    }

    #[test]
    fn distance_to_zone_is_zero_inside_and_edge_distance_outside() {
        let z = square();
        assert_eq!(distance_to_zone(LatLng::new(31.90, 35.20), &z).unwrap(), 0.0);

        // 0.01° north of the northern edge
        let d = distance_to_zone(LatLng::new(31.92, 35.20), &z).unwrap();
        assert!((d - 0.01 * M_PER_DEG).abs() < 0.5, "got {}", d);
    }
}
