//! Pure geometry primitives used by anchor resolution, path synthesis and hit-testing.
//!
//! Everything here is stateless. Degenerate inputs (coincident points,
//! zero-length segments) produce well-defined results instead of `NaN`.

use serde::{Deserialize, Serialize};

/// A point in canvas (world) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns this point moved by `(dx, dy)`.
    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Returns this point moved `distance` units along `side`'s outward normal.
    pub fn project(self, side: Side, distance: f32) -> Self {
        let (nx, ny) = side.normal();
        self.translate(nx * distance, ny * distance)
    }

    pub fn lerp(self, other: Point, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Width and height of a node's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Side of a node's bounding box a port sits on and faces out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// Outward unit normal. Canvas y grows downwards, so `Top` is `(0, -1)`.
    pub fn normal(self) -> (f32, f32) {
        match self {
            Side::Left => (-1.0, 0.0),
            Side::Right => (1.0, 0.0),
            Side::Top => (0.0, -1.0),
            Side::Bottom => (0.0, 1.0),
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }
}

/// Axis-aligned unit direction with components in `{-1, 0, 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Direction {
    pub dx: i8,
    pub dy: i8,
}

impl Direction {
    /// The side a curve exits through when heading in this direction.
    ///
    /// Returns `None` for the zero direction (coincident endpoints).
    pub fn side(self) -> Option<Side> {
        match (self.dx, self.dy) {
            (1, _) => Some(Side::Right),
            (-1, _) => Some(Side::Left),
            (_, 1) => Some(Side::Bottom),
            (_, -1) => Some(Side::Top),
            _ => None,
        }
    }
}

pub fn distance(a: Point, b: Point) -> f32 {
    distance_sq(a, b).sqrt()
}

pub fn distance_sq(a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dx * dx + dy * dy
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}

/// Dominant axis direction from `from` towards `to`.
///
/// Ties between the axes resolve to the horizontal axis. Coincident points
/// give the zero direction.
pub fn direction_vector(from: Point, to: Point) -> Direction {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() >= dy.abs() {
        Direction { dx: sign(dx), dy: 0 }
    } else {
        Direction { dx: 0, dy: sign(dy) }
    }
}

fn sign(v: f32) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Squared distance from `point` to the segment `[a, b]`.
pub fn distance_to_segment_sq(point: Point, a: Point, b: Point) -> f32 {
    let ab = (b.x - a.x, b.y - a.y);
    let ap = (point.x - a.x, point.y - a.y);

    let ab_len_sq = ab.0 * ab.0 + ab.1 * ab.1;

    if ab_len_sq < f32::EPSILON {
        // Degenerate segment (a == b)
        return ap.0 * ap.0 + ap.1 * ap.1;
    }

    // Project point onto line, clamped to segment
    let t = ((ap.0 * ab.0 + ap.1 * ab.1) / ab_len_sq).clamp(0.0, 1.0);
    let closest = Point::new(a.x + t * ab.0, a.y + t * ab.1);

    distance_sq(point, closest)
}

/// Whether `point` lies within `threshold` of the segment `[a, b]`.
///
/// A negative or NaN threshold matches nothing.
pub fn is_near_segment(point: Point, a: Point, b: Point, threshold: f32) -> bool {
    if threshold.is_nan() || threshold < 0.0 {
        return false;
    }
    distance_to_segment_sq(point, a, b) <= threshold * threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // distance() / midpoint()
    // ========================================================================

    #[test]
    fn test_distance_pythagorean() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_distance_coincident_is_zero() {
        let p = Point::new(12.5, -3.0);
        assert_eq!(distance(p, p), 0.0);
    }

    #[test]
    fn test_midpoint() {
        let m = midpoint(Point::new(-10.0, 0.0), Point::new(10.0, 20.0));
        assert_eq!(m, Point::new(0.0, 10.0));
    }

    // ========================================================================
    // direction_vector()
    // ========================================================================

    #[test]
    fn test_direction_horizontal_dominant() {
        let d = direction_vector(Point::new(0.0, 0.0), Point::new(100.0, 20.0));
        assert_eq!(d, Direction { dx: 1, dy: 0 });
        assert_eq!(d.side(), Some(Side::Right));

        let d = direction_vector(Point::new(0.0, 0.0), Point::new(-100.0, 20.0));
        assert_eq!(d, Direction { dx: -1, dy: 0 });
        assert_eq!(d.side(), Some(Side::Left));
    }

    #[test]
    fn test_direction_vertical_dominant() {
        let d = direction_vector(Point::new(0.0, 0.0), Point::new(10.0, 50.0));
        assert_eq!(d, Direction { dx: 0, dy: 1 });
        assert_eq!(d.side(), Some(Side::Bottom));

        let d = direction_vector(Point::new(0.0, 0.0), Point::new(10.0, -50.0));
        assert_eq!(d.side(), Some(Side::Top));
    }

    #[test]
    fn test_direction_tie_prefers_horizontal() {
        let d = direction_vector(Point::new(0.0, 0.0), Point::new(-30.0, 30.0));
        assert_eq!(d, Direction { dx: -1, dy: 0 });
    }

    #[test]
    fn test_direction_coincident_is_zero() {
        let p = Point::new(5.0, 5.0);
        let d = direction_vector(p, p);
        assert_eq!(d, Direction::default());
        assert_eq!(d.side(), None);
    }

    // ========================================================================
    // Side
    // ========================================================================

    #[test]
    fn test_side_opposites_have_negated_normals() {
        for side in [Side::Left, Side::Right, Side::Top, Side::Bottom] {
            let (nx, ny) = side.normal();
            let (ox, oy) = side.opposite().normal();
            assert_eq!((nx, ny), (-ox, -oy));
        }
    }

    #[test]
    fn test_project_along_side() {
        let p = Point::new(10.0, 10.0);
        assert_eq!(p.project(Side::Right, 5.0), Point::new(15.0, 10.0));
        assert_eq!(p.project(Side::Top, 5.0), Point::new(10.0, 5.0));
    }

    // ========================================================================
    // is_near_segment()
    // ========================================================================

    #[test]
    fn test_near_segment_perpendicular() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        assert!(is_near_segment(Point::new(50.0, 4.0), a, b, 5.0));
        assert!(!is_near_segment(Point::new(50.0, 6.0), a, b, 5.0));
    }

    #[test]
    fn test_near_segment_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        // Beyond b along the line: distance measured to b, not to the infinite line
        assert!(!is_near_segment(Point::new(110.0, 0.0), a, b, 5.0));
        assert!(is_near_segment(Point::new(103.0, 0.0), a, b, 5.0));
    }

    #[test]
    fn test_near_segment_degenerate() {
        let a = Point::new(20.0, 20.0);
        assert!(is_near_segment(Point::new(23.0, 24.0), a, a, 5.0));
        assert!(!is_near_segment(Point::new(30.0, 30.0), a, a, 5.0));
        assert!(distance_to_segment_sq(Point::new(23.0, 24.0), a, a).is_finite());
    }

    #[test]
    fn test_near_segment_negative_threshold_matches_nothing() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        assert!(!is_near_segment(Point::new(50.0, 3.0), a, b, -5.0));
        // Even a point on the segment
        assert!(!is_near_segment(Point::new(50.0, 0.0), a, b, -5.0));
        assert!(!is_near_segment(Point::new(50.0, 0.0), a, b, f32::NAN));
        assert!(is_near_segment(Point::new(50.0, 0.0), a, b, 0.0));
    }
}
