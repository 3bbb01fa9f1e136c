//! Bounding envelopes around item locations.
//!
//! An envelope is computed by projecting the location outward along the
//! four cardinal bearings on the spheroid and taking the bounding
//! rectangle of the projected points. This is not a planar buffer: the
//! east/west extent grows with latitude, matching a real-world radius in
//! metres.

use conflate_core::item::Coordinate;
use geo::{Destination, Geodesic, GeodesicArea, Intersects};
use geo_types::{coord, Geometry, Point, Polygon, Rect};

/// A geodesic bounding envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    rect: Rect<f64>,
}

impl Envelope {
    /// Envelope of `radius_meters` around a location.
    pub fn around(center: Coordinate, radius_meters: f64) -> Self {
        let origin = Point::new(center.longitude, center.latitude);

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for bearing in [0.0, 90.0, 180.0, 270.0] {
            let p = Geodesic::destination(origin, bearing, radius_meters);
            min_x = min_x.min(p.x());
            min_y = min_y.min(p.y());
            max_x = max_x.max(p.x());
            max_y = max_y.max(p.y());
        }

        Envelope {
            rect: Rect::new(coord! { x: min_x, y: min_y }, coord! { x: max_x, y: max_y }),
        }
    }

    /// Envelope from explicit bounds (west, south, east, north).
    pub fn from_bounds(west: f64, south: f64, east: f64, north: f64) -> Self {
        Envelope {
            rect: Rect::new(coord! { x: west, y: south }, coord! { x: east, y: north }),
        }
    }

    pub fn rect(&self) -> Rect<f64> {
        self.rect
    }

    /// The envelope as a closed polygon ring.
    pub fn to_polygon(&self) -> Polygon<f64> {
        self.rect.to_polygon()
    }

    /// Geodesic area of the envelope in square metres.
    pub fn area(&self) -> f64 {
        self.to_polygon().geodesic_area_unsigned()
    }

    /// True if the envelope intersects a geometry.
    pub fn intersects(&self, geometry: &Geometry<f64>) -> bool {
        self.rect.intersects(geometry)
    }
}
