//! The real-world geometry of a route, as given by a GTFS shape.

use crate::util::geometry::beeline;

use geo::{coord, BoundingRect, Distance, Euclidean, LineString, Point, Rect};
use std::collections::BTreeMap;

/// Interval, in network units, at which a link is sampled when
/// measuring its distance to a shape.
pub const SHAPE_SAMPLE_INTERVAL: f64 = 5.0;

/// The polyline a route follows, used only as a reference to bias routing.
///
/// A shape is immutable once built. Its points are ordered by their
/// sequence index, regardless of the order they were supplied in.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteShape {
    id: String,
    line: LineString,
}

impl RouteShape {
    /// Builds a shape from `(sequence, position)` pairs.
    /// Should a sequence index repeat, the last position supplied wins.
    pub fn new(id: impl Into<String>, points: impl IntoIterator<Item = (u32, Point)>) -> Self {
        let ordered = points.into_iter().collect::<BTreeMap<_, _>>();

        Self {
            id: id.into(),
            line: ordered.into_values().map(|point| point.0).collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn line_string(&self) -> &LineString {
        &self.line
    }

    pub fn is_empty(&self) -> bool {
        self.line.0.is_empty()
    }

    pub fn bounding_rect(&self) -> Option<Rect> {
        self.line.bounding_rect()
    }

    /// The bounding box expanded on every side by its own width (horizontally)
    /// and height (vertically).
    pub fn buffered_rect(&self) -> Option<Rect> {
        self.bounding_rect().map(|rect| {
            let (width, height) = (rect.width(), rect.height());

            Rect::new(
                coord! { x: rect.min().x - width, y: rect.min().y - height },
                coord! { x: rect.max().x + width, y: rect.max().y + height },
            )
        })
    }

    /// The minimum distance from `point` to any segment of the shape.
    /// An empty shape is infinitely far away.
    pub fn distance_to(&self, point: &Point) -> f64 {
        match self.line.0.as_slice() {
            [] => f64::INFINITY,
            [only] => beeline(point, &Point(*only)),
            _ => Euclidean.distance(point, &self.line),
        }
    }

    /// The distance of the segment `from -> to` to the shape, taken as the
    /// minimum over samples placed every [`SHAPE_SAMPLE_INTERVAL`] units
    /// along the segment, both end points included.
    pub fn segment_distance(&self, from: &Point, to: &Point) -> f64 {
        let length = beeline(from, to);
        let steps = (length / SHAPE_SAMPLE_INTERVAL).ceil().max(1.0) as usize;

        (0..=steps)
            .map(|step| {
                let ratio = (step as f64 * SHAPE_SAMPLE_INTERVAL / length).min(1.0);
                let ratio = if ratio.is_finite() { ratio } else { 0.0 };

                Point::new(
                    from.x() + (to.x() - from.x()) * ratio,
                    from.y() + (to.y() - from.y()) * ratio,
                )
            })
            .map(|sample| self.distance_to(&sample))
            .fold(f64::INFINITY, f64::min)
    }
}
