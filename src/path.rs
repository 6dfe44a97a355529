//! Directional cubic bezier links between two anchors.
//!
//! Control points are projected out of each endpoint along the outward normal
//! of the side the endpoint faces. When no side is supplied it is inferred from
//! the dominant axis between the endpoints (see [`direction_vector`]).

use crate::geometry::{direction_vector, distance, distance_to_segment_sq, Point, Side};

/// Lower clamp for the control point offset of non-degenerate links.
pub const MIN_CONTROL_OFFSET: f32 = 40.0;
/// Upper clamp for the control point offset (before the facing boost).
pub const MAX_CONTROL_OFFSET: f32 = 120.0;

const OFFSET_FACTOR: f32 = 0.5;
const FACING_OFFSET_FACTOR: f32 = 0.4;
const DEFAULT_SAMPLES: usize = 20;

/// Control point offset for a link spanning `distance`.
///
/// `clamp(distance * 0.5, 40, 120)`, raised to at least `distance * 0.4` when
/// the two endpoint sides face each other. Zero (or non-finite) distance gives
/// an offset of zero so coincident endpoints yield a degenerate, renderable curve.
pub fn control_point_offset(distance: f32, facing: bool) -> f32 {
    if !distance.is_finite() || distance <= 0.0 {
        return 0.0;
    }
    let offset = (distance * OFFSET_FACTOR).clamp(MIN_CONTROL_OFFSET, MAX_CONTROL_OFFSET);
    if facing {
        offset.max(distance * FACING_OFFSET_FACTOR)
    } else {
        offset
    }
}

/// Resolve the exit sides of both endpoints, inferring missing ones.
fn resolve_sides(
    from: Point,
    to: Point,
    from_side: Option<Side>,
    to_side: Option<Side>,
) -> (Option<Side>, Option<Side>) {
    (
        from_side.or_else(|| direction_vector(from, to).side()),
        to_side.or_else(|| direction_vector(to, from).side()),
    )
}

/// Compute both control points of the link `from -> to`.
pub fn control_points(
    from: Point,
    to: Point,
    from_side: Option<Side>,
    to_side: Option<Side>,
) -> (Point, Point) {
    let (from_side, to_side) = resolve_sides(from, to, from_side, to_side);
    let facing = matches!((from_side, to_side), (Some(a), Some(b)) if a.opposite() == b);
    let offset = control_point_offset(distance(from, to), facing);

    let cp1 = match from_side {
        Some(side) => from.project(side, offset),
        None => from,
    };
    let cp2 = match to_side {
        Some(side) => to.project(side, offset),
        None => to,
    };
    (cp1, cp2)
}

/// Generate the path command for a link between two anchors.
///
/// Always a single cubic segment, e.g. `"M 0 0 C 40 0, 60 100, 100 100"`.
pub fn bezier_path(from: Point, to: Point, from_side: Option<Side>, to_side: Option<Side>) -> String {
    CubicBezier::between(from, to, from_side, to_side).to_path_commands()
}

/// Position and heading of the arrow drawn halfway along a link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionIndicator {
    pub position: Point,
    /// Tangent angle in degrees, `atan2(dy, dx)`.
    pub angle_degrees: f32,
}

/// Cubic bezier curve for evaluation and distance calculations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p0: Point, // Start point
    pub p1: Point, // Control point 1
    pub p2: Point, // Control point 2
    pub p3: Point, // End point
}

impl CubicBezier {
    /// Build the link curve between two anchors using [`control_points`].
    pub fn between(from: Point, to: Point, from_side: Option<Side>, to_side: Option<Side>) -> Self {
        let (p1, p2) = control_points(from, to, from_side, to_side);
        Self { p0: from, p1, p2, p3: to }
    }

    /// Evaluate the curve at `t` with de Casteljau's algorithm.
    pub fn eval(&self, t: f32) -> Point {
        let q0 = self.p0.lerp(self.p1, t);
        let q1 = self.p1.lerp(self.p2, t);
        let q2 = self.p2.lerp(self.p3, t);

        let r0 = q0.lerp(q1, t);
        let r1 = q1.lerp(q2, t);

        r0.lerp(r1, t)
    }

    /// First derivative at `t`.
    ///
    /// Falls back to the chord direction where the derivative vanishes
    /// (control points coinciding with their endpoints).
    pub fn tangent(&self, t: f32) -> (f32, f32) {
        let mt = 1.0 - t;
        let a = 3.0 * mt * mt;
        let b = 6.0 * mt * t;
        let c = 3.0 * t * t;

        let dx = a * (self.p1.x - self.p0.x) + b * (self.p2.x - self.p1.x) + c * (self.p3.x - self.p2.x);
        let dy = a * (self.p1.y - self.p0.y) + b * (self.p2.y - self.p1.y) + c * (self.p3.y - self.p2.y);

        if dx * dx + dy * dy < f32::EPSILON {
            (self.p3.x - self.p0.x, self.p3.y - self.p0.y)
        } else {
            (dx, dy)
        }
    }

    /// Tangent angle at `t` in degrees.
    pub fn tangent_angle(&self, t: f32) -> f32 {
        let (dx, dy) = self.tangent(t);
        dy.atan2(dx).to_degrees()
    }

    /// Direction indicator at the curve's parametric midpoint.
    pub fn indicator(&self) -> DirectionIndicator {
        DirectionIndicator {
            position: self.eval(0.5),
            angle_degrees: self.tangent_angle(0.5),
        }
    }

    /// The same curve traversed from end to start.
    pub fn reversed(&self) -> Self {
        Self { p0: self.p3, p1: self.p2, p2: self.p1, p3: self.p0 }
    }

    /// Polyline through the curve: `samples + 1` points from `p0` to `p3`.
    ///
    /// A sample count of zero falls back to 20.
    pub fn flatten(&self, samples: usize) -> Vec<Point> {
        let samples = if samples == 0 { DEFAULT_SAMPLES } else { samples };
        (0..=samples)
            .map(|i| self.eval(i as f32 / samples as f32))
            .collect()
    }

    pub fn to_path_commands(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.p0.x, self.p0.y, self.p1.x, self.p1.y, self.p2.x, self.p2.y, self.p3.x, self.p3.y
        )
    }
}

/// Calculate the minimum distance from a point to a cubic bezier curve
///
/// Uses subdivision approach: sample curve at regular intervals and find closest point.
pub fn distance_to_bezier(point: Point, bezier: &CubicBezier, num_samples: usize) -> f32 {
    bezier
        .flatten(num_samples)
        .windows(2)
        .map(|seg| distance_to_segment_sq(point, seg[0], seg[1]))
        .fold(f32::MAX, f32::min)
        .sqrt()
}
