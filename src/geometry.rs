//! Toolkit-free geometric primitives shared by the layout engines.
//!
//! The rendering layer converts these into its native drawing types;
//! nothing here knows about screens or pixels beyond plain `f64`
//! coordinates.

use serde::{Deserialize, Serialize};

use crate::model::GeoPoint;

/// Mean earth radius in meters (spherical approximation).
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle, origin at top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap test; rectangles that merely touch edges do not
    /// count as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// One cubic Bézier segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicSegment {
    pub from: Point,
    pub c1: Point,
    pub c2: Point,
    pub to: Point,
}

impl CubicSegment {
    /// Straight line expressed as a degenerate cubic, so a curve stays a
    /// homogeneous list of segments.
    pub fn line(from: Point, to: Point) -> Self {
        let c1 = Point::new(
            from.x + (to.x - from.x) / 3.0,
            from.y + (to.y - from.y) / 3.0,
        );
        let c2 = Point::new(
            from.x + (to.x - from.x) * 2.0 / 3.0,
            from.y + (to.y - from.y) * 2.0 / 3.0,
        );
        Self { from, c1, c2, to }
    }
}

/// Ordered list of cubic segments forming one continuous path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Curve {
    pub segments: Vec<CubicSegment>,
}

impl Curve {
    pub fn push(&mut self, segment: CubicSegment) {
        self.segments.push(segment);
    }

    pub fn start(&self) -> Option<Point> {
        self.segments.first().map(|s| s.from)
    }

    pub fn end(&self) -> Option<Point> {
        self.segments.last().map(|s| s.to)
    }
}

/// Great-circle distance in meters between two coordinates on a
/// spherical earth. Sub-percent error against a proper geodesic, which
/// is fine for the tens-to-hundreds of meters this engine compares
/// against.
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}
