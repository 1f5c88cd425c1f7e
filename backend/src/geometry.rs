use crate::models::Coordinate;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Kilometers per degree, used wherever a kilometer radius has to be compared
/// with a planar distance measured in degrees.
pub const KM_PER_DEGREE: f64 = 111.32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Smallest box containing both points.
    pub fn covering(a: Coordinate, b: Coordinate) -> Self {
        Self {
            north: a.lat.max(b.lat),
            south: a.lat.min(b.lat),
            east: a.lng.max(b.lng),
            west: a.lng.min(b.lng),
        }
    }

    /// Grow every side by `buffer_deg` degrees.
    pub fn expanded(self, buffer_deg: f64) -> Self {
        Self {
            north: self.north + buffer_deg,
            south: self.south - buffer_deg,
            east: self.east + buffer_deg,
            west: self.west - buffer_deg,
        }
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.lat >= self.south
            && coord.lat <= self.north
            && coord.lng >= self.west
            && coord.lng <= self.east
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }
}

/// Planar distance from `point` to the segment `start`→`end`, treating
/// longitude as x and latitude as y. The result is in degrees.
///
/// A degenerate segment collapses to the distance to `start`.
pub fn distance_point_to_segment(point: Coordinate, start: Coordinate, end: Coordinate) -> f64 {
    let dx = end.lng - start.lng;
    let dy = end.lat - start.lat;
    let length_sq = dx * dx + dy * dy;

    if length_sq == 0.0 {
        return planar_distance(point, start);
    }

    let t = (((point.lng - start.lng) * dx + (point.lat - start.lat) * dy) / length_sq).clamp(0.0, 1.0);
    let closest = Coordinate {
        lng: start.lng + t * dx,
        lat: start.lat + t * dy,
    };
    planar_distance(point, closest)
}

/// Minimum planar distance from `point` to any segment of `polyline`.
///
/// Returns `f64::INFINITY` for polylines with fewer than two points so that
/// callers treat the point as out of range.
pub fn min_distance_to_polyline(point: Coordinate, polyline: &[Coordinate]) -> f64 {
    polyline
        .windows(2)
        .map(|w| distance_point_to_segment(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

pub fn bounding_box(polyline: &[Coordinate]) -> Option<BoundingBox> {
    let first = polyline.first()?;
    let seed = BoundingBox {
        north: first.lat,
        south: first.lat,
        east: first.lng,
        west: first.lng,
    };
    Some(polyline.iter().skip(1).fold(seed, |bbox, c| BoundingBox {
        north: bbox.north.max(c.lat),
        south: bbox.south.min(c.lat),
        east: bbox.east.max(c.lng),
        west: bbox.west.min(c.lng),
    }))
}

/// Great-circle distance in kilometers.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();

    let h = sin_dlat * sin_dlat + phi1.cos() * phi2.cos() * sin_dlng * sin_dlng;
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    distance_km(a.lat, a.lng, b.lat, b.lng)
}

/// Unit vector perpendicular to `start`→`end` in planar (lng, lat) space,
/// returned as `(d_lng, d_lat)`. `None` when the two points coincide.
pub fn perpendicular_unit(start: Coordinate, end: Coordinate) -> Option<(f64, f64)> {
    let dx = end.lng - start.lng;
    let dy = end.lat - start.lat;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 || !len.is_finite() {
        return None;
    }
    Some((-dy / len, dx / len))
}

fn planar_distance(a: Coordinate, b: Coordinate) -> f64 {
    let dx = a.lng - b.lng;
    let dy = a.lat - b.lat;
    (dx * dx + dy * dy).sqrt()
}
