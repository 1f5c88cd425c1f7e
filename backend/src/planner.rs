use crate::{
    geometry::{
        distance_point_to_segment, haversine_km, perpendicular_unit, KM_PER_DEGREE,
    },
    models::Coordinate,
    zones::BufferZone,
};

/// Extra clearance, in degrees, added on top of the widest conflicting zone.
pub const SAFETY_MARGIN_DEG: f64 = 0.002;

/// Intermediate coordinate inserted between origin and destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub coordinate: Coordinate,
    pub order: usize,
}

impl Waypoint {
    pub fn to_lng_lat(self) -> [f64; 2] {
        self.coordinate.to_lng_lat()
    }
}

/// Zones whose center lies within their own radius of the direct segment.
pub fn conflicting_zones<'a>(
    origin: Coordinate,
    destination: Coordinate,
    zones: &'a [BufferZone],
) -> Vec<&'a BufferZone> {
    zones
        .iter()
        .filter(|zone| {
            let distance_deg = distance_point_to_segment(zone.center, origin, destination);
            distance_deg < zone.radius_km / KM_PER_DEGREE
        })
        .collect()
}

/// Plan at most one detour waypoint around the zones the direct path crosses.
///
/// # Algorithm
///
/// 1. Keep the zones whose center is closer to the direct segment than the
///    zone's radius. No conflicts means no waypoint.
/// 2. From the segment midpoint, offset perpendicular to the direction of
///    travel by `max(conflicting radius) + SAFETY_MARGIN_DEG` on both sides.
/// 3. Keep the candidate whose nearest conflicting zone center is farthest
///    away (haversine). Ties go to the left-hand candidate.
///
/// Multiple disjoint conflicts still produce a single waypoint.
pub fn plan(origin: Coordinate, destination: Coordinate, zones: &[BufferZone]) -> Vec<Waypoint> {
    let conflicts = conflicting_zones(origin, destination, zones);
    if conflicts.is_empty() {
        tracing::debug!("direct path clears all {} zone(s)", zones.len());
        return Vec::new();
    }

    let max_radius_deg = conflicts
        .iter()
        .map(|zone| zone.radius_km / KM_PER_DEGREE)
        .fold(0.0, f64::max);
    let offset = max_radius_deg + SAFETY_MARGIN_DEG;

    let midpoint = origin.midpoint(destination);
    // Coincident endpoints have no direction of travel; detour due north/south.
    let (perp_lng, perp_lat) = perpendicular_unit(origin, destination).unwrap_or((0.0, 1.0));

    let left = Coordinate {
        lat: midpoint.lat + perp_lat * offset,
        lng: midpoint.lng + perp_lng * offset,
    };
    let right = Coordinate {
        lat: midpoint.lat - perp_lat * offset,
        lng: midpoint.lng - perp_lng * offset,
    };

    let clearance = |candidate: Coordinate| {
        conflicts
            .iter()
            .map(|zone| haversine_km(candidate, zone.center))
            .fold(f64::INFINITY, f64::min)
    };
    let left_clearance = clearance(left);
    let right_clearance = clearance(right);

    let chosen = if left_clearance >= right_clearance {
        left
    } else {
        right
    };

    tracing::debug!(
        "{} conflicting zone(s); detour via ({:.6}, {:.6}) clears by {:.3} km",
        conflicts.len(),
        chosen.lat,
        chosen.lng,
        left_clearance.max(right_clearance)
    );

    vec![Waypoint {
        coordinate: chosen,
        order: 0,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncidentCategory, Severity};

    fn origin() -> Coordinate {
        Coordinate::new(-37.8136, 144.9631)
    }

    fn destination() -> Coordinate {
        Coordinate::new(-37.8150, 144.9650)
    }

    fn zone(center: Coordinate, severity: Severity) -> BufferZone {
        BufferZone {
            center,
            radius_km: severity.profile().buffer_radius_km,
            severity,
            category: IncidentCategory::CrimeHotspot,
        }
    }

    fn planar_offset(a: Coordinate, b: Coordinate) -> f64 {
        ((a.lat - b.lat).powi(2) + (a.lng - b.lng).powi(2)).sqrt()
    }

    #[test]
    fn no_zones_means_no_detour() {
        assert!(plan(origin(), destination(), &[]).is_empty());
    }

    #[test]
    fn distant_zone_does_not_conflict() {
        let far = Coordinate::new(-37.80, 144.99);
        assert!(plan(origin(), destination(), &[zone(far, Severity::Critical)]).is_empty());
    }

    #[test]
    fn zone_just_outside_its_radius_does_not_conflict() {
        let radius_deg = 0.10 / KM_PER_DEGREE;
        let beside = Coordinate::new(origin().lat + radius_deg * 1.5, origin().lng);
        assert!(conflicting_zones(origin(), destination(), &[zone(beside, Severity::Low)]).is_empty());
    }

    #[test]
    fn critical_zone_at_midpoint_yields_offset_waypoint() {
        let mid = origin().midpoint(destination());
        let waypoints = plan(origin(), destination(), &[zone(mid, Severity::Critical)]);
        assert_eq!(waypoints.len(), 1);

        let wp = waypoints[0].coordinate;
        assert_ne!(wp, mid);

        let expected = 0.5 / KM_PER_DEGREE + SAFETY_MARGIN_DEG;
        assert!((planar_offset(wp, mid) - expected).abs() < 1e-12);

        // perpendicular to the direction of travel
        let dir_lng = destination().lng - origin().lng;
        let dir_lat = destination().lat - origin().lat;
        let dot = (wp.lng - mid.lng) * dir_lng + (wp.lat - mid.lat) * dir_lat;
        assert!(dot.abs() < 1e-12);
    }

    #[test]
    fn picks_the_side_away_from_the_hazard() {
        let mid = origin().midpoint(destination());
        let (perp_lng, perp_lat) = perpendicular_unit(origin(), destination()).unwrap();
        let hazard = Coordinate::new(mid.lat + perp_lat * 0.0005, mid.lng + perp_lng * 0.0005);

        let wp = plan(origin(), destination(), &[zone(hazard, Severity::High)])[0].coordinate;
        let side = (wp.lng - mid.lng) * perp_lng + (wp.lat - mid.lat) * perp_lat;
        assert!(side < 0.0, "waypoint should be on the opposite side of the hazard");
    }

    #[test]
    fn chosen_side_has_the_larger_great_circle_clearance() {
        let mid = origin().midpoint(destination());
        let (perp_lng, perp_lat) = perpendicular_unit(origin(), destination()).unwrap();
        let hazard = Coordinate::new(mid.lat - perp_lat * 0.0008, mid.lng - perp_lng * 0.0008);

        let wp = plan(origin(), destination(), &[zone(hazard, Severity::Critical)])[0].coordinate;
        let mirrored = Coordinate::new(2.0 * mid.lat - wp.lat, 2.0 * mid.lng - wp.lng);
        assert!(haversine_km(wp, hazard) > haversine_km(mirrored, hazard));
    }

    #[test]
    fn offset_uses_widest_conflicting_zone() {
        let mid = origin().midpoint(destination());
        let zones = [
            zone(origin(), Severity::Low),
            zone(mid, Severity::High),
            zone(Coordinate::new(-37.0, 145.5), Severity::Critical),
        ];
        let wp = plan(origin(), destination(), &zones)[0].coordinate;
        let expected = 0.30 / KM_PER_DEGREE + SAFETY_MARGIN_DEG;
        assert!((planar_offset(wp, mid) - expected).abs() < 1e-12);
    }

    #[test]
    fn coincident_endpoints_still_detour() {
        let point = origin();
        let wp = plan(point, point, &[zone(point, Severity::Medium)]);
        assert_eq!(wp.len(), 1);
        assert!(wp[0].coordinate.lat > point.lat);
        assert_eq!(wp[0].coordinate.lng, point.lng);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn local_coord() -> impl Strategy<Value = Coordinate> {
            (-37.83..-37.80, 144.95..144.98).prop_map(|(lat, lng)| Coordinate { lat, lng })
        }

        fn severity() -> impl Strategy<Value = Severity> {
            prop::sample::select(vec![
                Severity::Low,
                Severity::Medium,
                Severity::High,
                Severity::Critical,
            ])
        }

        proptest! {
            #[test]
            fn prop_at_most_one_waypoint_and_only_on_conflict(
                a in local_coord(),
                b in local_coord(),
                zones in prop::collection::vec((local_coord(), severity()), 0..6)
            ) {
                let zones: Vec<_> = zones.into_iter().map(|(c, s)| zone(c, s)).collect();
                let waypoints = plan(a, b, &zones);
                let conflicts = conflicting_zones(a, b, &zones);

                if conflicts.is_empty() {
                    prop_assert!(waypoints.is_empty());
                } else {
                    prop_assert_eq!(waypoints.len(), 1);
                    prop_assert!(planar_offset(waypoints[0].coordinate, a.midpoint(b)) > SAFETY_MARGIN_DEG / 2.0);
                }
            }
        }
    }
}
