//! Great-circle distance from item locations to candidate geometries.
//!
//! Distances are measured on the sphere (haversine) from a query point
//! to the nearest point of the geometry: zero inside a polygon, the
//! nearest segment point for lines, the nearest member for multi
//! geometries.

use conflate_core::item::Coordinate;
use geo::{BoundingRect, Contains};
use geo_types::{Geometry, LineString, Point};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two points in metres.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Minimum distance from a location to a geometry, in metres.
pub fn min_distance(location: Coordinate, geometry: &Geometry<f64>) -> f64 {
    let (lat, lng) = (location.latitude, location.longitude);
    match geometry {
        Geometry::Point(p) => haversine_distance(lat, lng, p.y(), p.x()),
        Geometry::MultiPoint(mp) => mp
            .iter()
            .map(|p| haversine_distance(lat, lng, p.y(), p.x()))
            .fold(f64::INFINITY, f64::min),
        Geometry::Line(line) => min_distance_to_segment(
            lat, lng, line.start.y, line.start.x, line.end.y, line.end.x,
        ),
        Geometry::LineString(ls) => min_distance_to_linestring(lat, lng, ls),
        Geometry::MultiLineString(mls) => mls
            .iter()
            .map(|ls| min_distance_to_linestring(lat, lng, ls))
            .fold(f64::INFINITY, f64::min),
        Geometry::Polygon(poly) => {
            let point = Point::new(lng, lat);
            if poly.contains(&point) {
                return 0.0;
            }
            // Outside the polygon or inside a hole: the nearest ring
            // wins, interior rings included.
            let mut min_dist = min_distance_to_linestring(lat, lng, poly.exterior());
            for interior in poly.interiors() {
                min_dist = min_dist.min(min_distance_to_linestring(lat, lng, interior));
            }
            min_dist
        }
        Geometry::MultiPolygon(mp) => mp
            .iter()
            .map(|poly| min_distance(location, &Geometry::Polygon(poly.clone())))
            .fold(f64::INFINITY, f64::min),
        Geometry::GeometryCollection(gc) => gc
            .iter()
            .map(|g| min_distance(location, g))
            .fold(f64::INFINITY, f64::min),
        // Rect/Triangle don't occur in store rows; the bbox distance is
        // a conservative lower bound.
        other => match other.bounding_rect() {
            Some(rect) => min_distance_to_bbox(
                lat,
                lng,
                rect.min().y,
                rect.max().y,
                rect.min().x,
                rect.max().x,
            ),
            None => 0.0,
        },
    }
}

/// Minimum distance from a point to a bounding box. Zero inside.
fn min_distance_to_bbox(
    lat: f64,
    lng: f64,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
) -> f64 {
    let closest_lat = lat.clamp(min_lat, max_lat);
    let closest_lng = lng.clamp(min_lng, max_lng);
    if closest_lat == lat && closest_lng == lng {
        return 0.0;
    }
    haversine_distance(lat, lng, closest_lat, closest_lng)
}

fn min_distance_to_linestring(lat: f64, lng: f64, ls: &LineString<f64>) -> f64 {
    if ls.0.is_empty() {
        return f64::INFINITY;
    }

    let mut min_dist = f64::INFINITY;
    for window in ls.0.windows(2) {
        let (p1, p2) = (&window[0], &window[1]);
        min_dist = min_dist.min(min_distance_to_segment(lat, lng, p1.y, p1.x, p2.y, p2.x));
    }
    min_dist
}

/// Planar projection onto the segment, haversine to the closest point.
/// Accurate for the segment lengths map data carries.
fn min_distance_to_segment(lat: f64, lng: f64, lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dx = lng2 - lng1;
    let dy = lat2 - lat1;

    if dx == 0.0 && dy == 0.0 {
        return haversine_distance(lat, lng, lat1, lng1);
    }

    let t = ((lng - lng1) * dx + (lat - lat1) * dy) / (dx * dx + dy * dy);
    let t = t.clamp(0.0, 1.0);

    let closest_lng = lng1 + t * dx;
    let closest_lat = lat1 + t * dy;
    haversine_distance(lat, lng, closest_lat, closest_lng)
}
