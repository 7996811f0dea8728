use crate::network::{LinkIx, Network};
use crate::schedule::{StopKey, StopOccurrence};
use crate::util::geometry::is_right_of_line;

use geo::Point;
use std::cmp::Ordering;
use std::sync::Arc;

/// A link which may serve a stop occurrence.
///
/// Candidates are ordered best-first. That is, by descending
/// [priority](LinkCandidate::priority), then with candidates whose stop lies
/// on the right-hand side of the link ahead of those whose stop does not,
/// and finally by link index. Two candidates are equal if they associate
/// the same link and stop at the same priority.
#[derive(Clone, Debug)]
pub struct LinkCandidate {
    link: LinkIx,
    stop: StopKey,

    /// Distance from the stop to the link's from-to segment.
    distance: f64,

    from_position: Point,
    to_position: Point,

    loop_link: bool,
    stop_on_right: bool,

    priority: f64,
}

impl LinkCandidate {
    /// Associates `link` with the stop occurrence, placed at `position`.
    pub fn new(network: &Network, link: LinkIx, stop: &StopOccurrence, position: Point) -> Self {
        let attributes = network.link(link);
        let from_position = network.node(attributes.from).position;
        let to_position = network.node(attributes.to).position;

        Self {
            link,
            stop: Arc::clone(stop.key()),
            distance: network.link_distance(link, &position),
            from_position,
            to_position,
            loop_link: attributes.is_loop(),
            stop_on_right: is_right_of_line(&position, &from_position, &to_position),
            priority: 1.0,
        }
    }

    pub fn with_priority(self, priority: f64) -> Self {
        Self { priority, ..self }
    }

    #[inline]
    pub fn link(&self) -> LinkIx {
        self.link
    }

    /// The key of the stop occurrence served.
    #[inline]
    pub fn stop(&self) -> &StopKey {
        &self.stop
    }

    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    #[inline]
    pub fn from_position(&self) -> Point {
        self.from_position
    }

    #[inline]
    pub fn to_position(&self) -> Point {
        self.to_position
    }

    #[inline]
    pub fn is_loop_link(&self) -> bool {
        self.loop_link
    }

    #[inline]
    pub fn stop_on_right(&self) -> bool {
        self.stop_on_right
    }

    /// The score of the candidate, within `[0, 1]`. The closest
    /// candidates of a stop score `1`, the furthest score `0`.
    #[inline]
    pub fn priority(&self) -> f64 {
        self.priority
    }
}

impl PartialEq for LinkCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link
            && self.stop == other.stop
            && self.priority.total_cmp(&other.priority) == Ordering::Equal
    }
}

impl Eq for LinkCandidate {}

impl PartialOrd for LinkCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LinkCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.stop_on_right.cmp(&self.stop_on_right))
            .then_with(|| self.link.cmp(&other.link))
            .then_with(|| self.stop.cmp(&other.stop))
    }
}

/// Scores candidates by their distance relative to the closest and
/// furthest candidates of the set.
///
/// Should every candidate share the same distance (including
/// a set of one), they all score `1`.
pub fn assign_priorities(candidates: &mut [LinkCandidate]) {
    let (min, max) = candidates
        .iter()
        .map(|candidate| candidate.distance)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), distance| {
            (min.min(distance), max.max(distance))
        });

    let span = max - min;

    for candidate in candidates.iter_mut() {
        candidate.priority = if span > 0.0 {
            1.0 - (candidate.distance - min) / span
        } else {
            1.0
        };
    }
}

/// The candidates of a stop occurrence, best first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkCandidates(Vec<LinkCandidate>);

impl LinkCandidates {
    pub fn new(mut candidates: Vec<LinkCandidate>) -> Self {
        candidates.sort();
        Self(candidates)
    }

    /// The highest ranked candidate.
    pub fn best(&self) -> Option<&LinkCandidate> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkCandidate> {
        self.0.iter()
    }

    pub fn links(&self) -> impl Iterator<Item = LinkIx> + '_ {
        self.0.iter().map(LinkCandidate::link)
    }

    pub fn contains_link(&self, link: LinkIx) -> bool {
        self.0.iter().any(|candidate| candidate.link == link)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[LinkCandidate] {
        &self.0
    }

    /// Merges manually assigned candidates into the set. When replacing,
    /// the existing candidates are discarded. Otherwise a manual candidate
    /// supersedes an existing candidate of the same link.
    pub fn merge(self, manual: Vec<LinkCandidate>, replace: bool) -> Self {
        if replace {
            return Self::new(manual);
        }

        let mut candidates = self.0;
        candidates.retain(|existing| !manual.iter().any(|other| other.link == existing.link));
        candidates.extend(manual);

        Self::new(candidates)
    }
}

impl<'a> IntoIterator for &'a LinkCandidates {
    type Item = &'a LinkCandidate;
    type IntoIter = std::slice::Iter<'a, LinkCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
