use crate::util::geometry::{beeline, is_right_of_line, segment_distance};

use approx::assert_relative_eq;
use geo::Point;

#[test]
fn segment_distance_projects_inside_segment() {
    let from = Point::new(0.0, 0.0);
    let to = Point::new(100.0, 0.0);

    assert_relative_eq!(segment_distance(&Point::new(50.0, 5.0), &from, &to), 5.0);
    assert_relative_eq!(segment_distance(&Point::new(50.0, -7.5), &from, &to), 7.5);
}

#[test]
fn segment_distance_clamps_to_endpoints() {
    let from = Point::new(0.0, 0.0);
    let to = Point::new(100.0, 0.0);

    // Beyond the target, the nearest point is the target itself.
    assert_relative_eq!(segment_distance(&Point::new(103.0, 4.0), &from, &to), 5.0);
    assert_relative_eq!(segment_distance(&Point::new(-3.0, -4.0), &from, &to), 5.0);
}

#[test]
fn segment_distance_of_degenerate_segment() {
    let anchor = Point::new(10.0, 10.0);
    assert_relative_eq!(segment_distance(&Point::new(13.0, 14.0), &anchor, &anchor), 5.0);
    assert_relative_eq!(segment_distance(&anchor, &anchor, &anchor), 0.0);
}

#[test]
fn right_hand_side_follows_direction() {
    let west = Point::new(0.0, 0.0);
    let east = Point::new(100.0, 0.0);
    let above = Point::new(50.0, 5.0);
    let below = Point::new(50.0, -5.0);

    assert!(!is_right_of_line(&above, &west, &east));
    assert!(is_right_of_line(&below, &west, &east));

    // Reversing the direction swaps the sides.
    assert!(is_right_of_line(&above, &east, &west));
    assert!(!is_right_of_line(&below, &east, &west));

    // Collinear points are not on the right.
    assert!(!is_right_of_line(&Point::new(200.0, 0.0), &west, &east));
}

#[test]
fn beeline_is_symmetric() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(30.0, 40.0);

    assert_relative_eq!(beeline(&a, &b), 50.0);
    assert_relative_eq!(beeline(&b, &a), 50.0);
}

#[cfg(feature = "tracing")]
#[test]
fn tracer_initializes_once() {
    crate::util::trace::initialize_tracer();
    crate::util::trace::initialize_tracer();
}
