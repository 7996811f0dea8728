//! Planar geometry helpers.
//!
//! Network and schedule coordinates are expected to be in a projected,
//! metric coordinate system, so every measure here is [`Euclidean`].

use geo::{Distance, Euclidean, Line, Point};

/// The minimum distance from `point` to the line segment `from -> to`.
///
/// A degenerate segment (`from == to`), such as a loop link, measures
/// the plain point-to-point distance.
#[inline]
pub fn segment_distance(point: &Point, from: &Point, to: &Point) -> f64 {
    let line = Line::new(from.0, to.0);
    Euclidean.distance(point, &line)
}

/// The straight-line distance between two points.
#[inline]
pub fn beeline(a: &Point, b: &Point) -> f64 {
    Euclidean.distance(*a, *b)
}

/// Determines whether `point` lies on the right-hand side of the directed
/// line `from -> to`.
///
/// Uses the sign of the 2D cross product of `(to - from)` and
/// `(point - from)`. A negative product is a clockwise turn, which puts the
/// point on the right. Points exactly on the line are not on the right.
///
/// ```text
///            point (left, cross > 0)
///              +
///     from +---------> to
///              +
///            point (right, cross < 0)
/// ```
#[inline]
pub fn is_right_of_line(point: &Point, from: &Point, to: &Point) -> bool {
    cross(point, from, to) < 0.0
}

#[inline]
fn cross(point: &Point, from: &Point, to: &Point) -> f64 {
    let direction = to.0 - from.0;
    let offset = point.0 - from.0;

    direction.x * offset.y - direction.y * offset.x
}
