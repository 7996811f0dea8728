use crate::network::{LinkIx, ModeSet, Network, NodeIx};

use geo::Point;
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::BTreeMap;
#[cfg(feature = "tracing")]
use tracing::Level;

/// A totally ordered distance, used to key the buckets
/// of links returned by [`Scan::find_closest_links`].
///
/// Two links only share a bucket if their distances are exactly equal,
/// such as a link and its opposite-direction sibling.
#[derive(Clone, Copy, Debug)]
pub struct LinkDistance(pub f64);

impl LinkDistance {
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialEq for LinkDistance {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LinkDistance {}

impl PartialOrd for LinkDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LinkDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Links grouped by their exact distance to a query point, ascending.
/// Within a bucket, links are ordered by index.
pub type ClosestLinks = BTreeMap<LinkDistance, Vec<LinkIx>>;

/// Limits applied to [`Scan::find_closest_links_bounded`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchBounds {
    /// Radius around the query point in which nodes are collected.
    pub search_radius: f64,

    /// The number of links after which the soft cutoff applies.
    pub max_count: usize,

    /// Slack applied to the distance of the `max_count`-th link.
    /// Values below `1` are treated as `0`, meaning no slack.
    pub tolerance_factor: f64,

    /// Links further than this are never admitted.
    pub max_distance: f64,
}

/// Trait containing utility functions to find nodes and links near a position.
pub trait Scan {
    /// Returns the nodes within `radius` of the `point`, in no particular order.
    fn nodes_within(&self, point: &Point, radius: f64) -> Vec<NodeIx>;

    /// Finds every link incident to a node within `search_radius` of `point`.
    ///
    /// Links are kept only if they share a mode with `allowed_modes`, should it be
    /// given. An empty mode set therefore keeps nothing, whilst `None` keeps everything.
    /// Each link is measured by its minimum distance to `point` along its from-to segment.
    fn find_closest_links(
        &self,
        point: &Point,
        search_radius: f64,
        allowed_modes: Option<&ModeSet>,
    ) -> ClosestLinks;

    /// Consumes the buckets of [`Scan::find_closest_links`] in ascending order,
    /// admitting links until either cutoff is reached.
    ///
    /// ### Cutoffs
    /// - Hard: a bucket further than `max_distance` is rejected, with all that follow.
    /// - Soft: once `max_count` links are admitted, a bucket is rejected if its distance
    ///   exceeds `distance_of_nth * tolerance_factor`.
    ///
    /// Buckets are admitted whole. Hence, a link tied with the `max_count`-th link
    /// (typically its opposite-direction sibling) is always admitted alongside it.
    fn find_closest_links_bounded(
        &self,
        point: &Point,
        bounds: SearchBounds,
        allowed_modes: Option<&ModeSet>,
    ) -> Vec<(LinkIx, f64)> {
        let buckets = self.find_closest_links(point, bounds.search_radius, allowed_modes);
        admit_bounded(buckets, bounds)
    }
}

/// Applies the hard and soft cutoffs of [`SearchBounds`] to a set of sorted buckets.
pub fn admit_bounded(buckets: ClosestLinks, bounds: SearchBounds) -> Vec<(LinkIx, f64)> {
    let tolerance = if bounds.tolerance_factor < 1.0 {
        0.0
    } else {
        bounds.tolerance_factor
    };

    let mut admitted = Vec::new();
    let mut threshold: Option<f64> = None;

    for (distance, links) in buckets {
        let distance = distance.value();

        if distance > bounds.max_distance {
            break;
        }

        if let Some(threshold) = threshold {
            if distance > threshold {
                break;
            }
        }

        admitted.extend(links.into_iter().map(|link| (link, distance)));

        if threshold.is_none() && admitted.len() >= bounds.max_count {
            threshold = Some(distance * tolerance);
        }
    }

    admitted
}

impl Scan for Network {
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip(self)))]
    #[inline]
    fn nodes_within(&self, point: &Point, radius: f64) -> Vec<NodeIx> {
        self.index
            .locate_within_distance(*point, radius * radius)
            .map(|node| node.ix)
            .collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip(self)))]
    fn find_closest_links(
        &self,
        point: &Point,
        search_radius: f64,
        allowed_modes: Option<&ModeSet>,
    ) -> ClosestLinks {
        let mut buckets = ClosestLinks::new();

        self.nodes_within(point, search_radius)
            .into_iter()
            .flat_map(|node| self.incident_links(node))
            .unique()
            .filter(|link| allowed_modes.is_none_or(|modes| self.link(*link).allows_any(modes)))
            .for_each(|link| {
                let distance = self.link_distance(link, point);
                buckets.entry(LinkDistance(distance)).or_default().push(link);
            });

        buckets.values_mut().for_each(|links| links.sort_unstable());
        buckets
    }
}
