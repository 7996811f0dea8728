//! Synthetic networks and schedules shared by the unit tests.

use crate::network::{LinkSpec, Network, Node};
use crate::schedule::{RouteStop, Schedule, StopFacility, TransitLine, TransitRoute};
use crate::{Mode, ModeSet};

use geo::Point;
use std::sync::Arc;

pub(crate) fn node(id: &str, x: f64, y: f64) -> Node {
    Node::new(id, Point::new(x, y))
}

pub(crate) fn link(id: &str, from: &str, to: &str) -> LinkSpec {
    LinkSpec::new(id, from, to).modes(["car", "bus"])
}

pub(crate) fn network(nodes: Vec<Node>, links: Vec<LinkSpec>) -> Network {
    Network::from_parts(nodes, links).expect("fixture network must assemble")
}

/// A straight, two-way street along `y = 0`, split into 100 unit blocks.
///
///     a ===== b ===== c ===== d ===== e
///   (0,0)  (100,0) (200,0) (300,0) (400,0)
///
/// Links are named `ab`, `ba`, `bc`, `cb`, and so on.
pub(crate) fn street() -> Network {
    let names = ["a", "b", "c", "d", "e"];
    let nodes = names
        .iter()
        .enumerate()
        .map(|(i, name)| node(name, i as f64 * 100.0, 0.0))
        .collect();

    let links = names
        .windows(2)
        .flat_map(|pair| {
            let (from, to) = (pair[0], pair[1]);
            [
                link(&format!("{from}{to}"), from, to),
                link(&format!("{to}{from}"), to, from),
            ]
        })
        .collect();

    network(nodes, links)
}

/// A 5x5 grid of two-way links spaced 100 units apart. Nodes are named
/// `n{x}_{y}`, links `{from}-{to}`. The bottom row (`y = 0`) is rail-only,
/// every other link allows `car` and `bus`.
pub(crate) fn grid() -> Network {
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    let name = |x: usize, y: usize| format!("n{x}_{y}");

    for x in 0..5 {
        for y in 0..5 {
            nodes.push(node(&name(x, y), x as f64 * 100.0, y as f64 * 100.0));
        }
    }

    let mut connect = |a: String, b: String, rail: bool| {
        for (from, to) in [(&a, &b), (&b, &a)] {
            let spec = LinkSpec::new(format!("{from}-{to}"), from.as_str(), to.as_str());
            links.push(if rail {
                spec.modes(["rail"])
            } else {
                spec.modes(["car", "bus"])
            });
        }
    };

    for x in 0..5 {
        for y in 0..5 {
            if x < 4 {
                connect(name(x, y), name(x + 1, y), y == 0);
            }
            if y < 4 {
                connect(name(x, y), name(x, y + 1), false);
            }
        }
    }

    network(nodes, links)
}

pub(crate) fn facility(id: &str, x: f64, y: f64) -> Arc<StopFacility> {
    Arc::new(StopFacility::new(id, Some(Point::new(x, y))))
}

pub(crate) fn stop(facility: &Arc<StopFacility>, arrival: f64, departure: f64) -> RouteStop {
    RouteStop::new(Arc::clone(facility), Some(arrival), Some(departure))
}

pub(crate) fn route(id: &str, mode: &str, stops: Vec<RouteStop>) -> TransitRoute {
    TransitRoute::new(id, Mode::from(mode), stops)
}

pub(crate) fn schedule(lines: Vec<(&str, Vec<TransitRoute>)>) -> Schedule {
    let mut schedule = Schedule::default();
    for (id, routes) in lines {
        schedule.add_line(TransitLine::new(id, routes));
    }
    schedule
}

pub(crate) fn mode_set(values: &[&str]) -> ModeSet {
    crate::network::modes(values.iter().copied())
}

/// A single two-way link on a diagonal, where floating point distances
/// are sensitive to the direction a segment is measured in.
///
///                     b (74.4,39.93)
///                   /
///     a (0.37,1.13)
///
/// Links are named `ab` and `ba`.
pub(crate) fn diagonal() -> Network {
    network(
        vec![node("a", 0.37, 1.13), node("b", 74.4, 39.93)],
        vec![link("ab", "a", "b"), link("ba", "b", "a")],
    )
}
