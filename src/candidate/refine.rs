use crate::candidate::CandidateError;
use crate::network::{LinkIx, Network, NodeIx};

use geo::Point;
use itertools::Itertools;
use rustc_hash::FxHashSet;

/// A link found near a stop, before any scoring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawCandidate {
    pub link: LinkIx,

    /// The from-node of the link, as seen when it was found.
    pub from: NodeIx,

    pub distance: f64,
}

/// The links found for one stop occurrence, closest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSet {
    pub entries: Vec<RawCandidate>,

    /// Set if the stop facility names its link. Such a set is never
    /// reduced, and wins every link it shares with a neighbouring stop.
    pub preassigned: bool,
}

impl RawSet {
    /// Wraps the links admitted by a bounded search.
    pub fn searched(network: &Network, hits: Vec<(LinkIx, f64)>) -> Self {
        let entries = hits
            .into_iter()
            .map(|(link, distance)| RawCandidate {
                link,
                from: network.link(link).from,
                distance,
            })
            .collect();

        Self {
            entries,
            preassigned: false,
        }
    }

    pub fn preassigned(network: &Network, link: LinkIx, position: &Point) -> Self {
        Self {
            entries: vec![RawCandidate {
                link,
                from: network.link(link).from,
                distance: network.link_distance(link, position),
            }],
            preassigned: true,
        }
    }

    pub fn get(&self, link: LinkIx) -> Option<&RawCandidate> {
        self.entries.iter().find(|entry| entry.link == link)
    }

    pub fn links(&self) -> impl Iterator<Item = LinkIx> + '_ {
        self.entries.iter().map(|entry| entry.link)
    }

    pub fn remove(&mut self, link: LinkIx) {
        self.entries.retain(|entry| entry.link != link);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ensures consecutive stops do not share a link.
///
/// A shared link stays with the stop it is closer to. Should both stops be
/// equally close, it stays with `previous`. A pre-assigned set always keeps
/// its link, unless both sets are pre-assigned, in which case neither changes.
///
/// A second pass over the same sets changes nothing.
pub fn separate(
    network: &Network,
    previous: &mut RawSet,
    current: &mut RawSet,
) -> Result<(), CandidateError> {
    let shared = previous
        .entries
        .iter()
        .filter_map(|before| current.get(before.link).map(|after| (*before, *after)))
        .collect::<Vec<_>>();

    for (before, after) in shared {
        if before.from != after.from {
            return Err(CandidateError::SeparationMismatch {
                link: network.link(before.link).id.clone(),
                previous: network.node(before.from).id.clone(),
                current: network.node(after.from).id.clone(),
            });
        }

        match (previous.preassigned, current.preassigned) {
            (true, true) => {}
            (true, false) => current.remove(after.link),
            (false, true) => previous.remove(before.link),
            (false, false) if before.distance > after.distance => previous.remove(before.link),
            (false, false) => current.remove(after.link),
        }
    }

    Ok(())
}

/// The link following `link` in a single-file chain.
///
/// That is, the only link leaving the to-node of `link` (other than its
/// opposite), provided `link` is in turn the only link entering that node
/// (other than the opposite of the follower).
fn successor(network: &Network, link: LinkIx) -> Option<LinkIx> {
    let attributes = network.link(link);
    if attributes.is_loop() {
        return None;
    }

    let node = attributes.to;
    let opposite = network.opposite_link(link);

    let next = network
        .out_links(node)
        .iter()
        .copied()
        .filter(|out| Some(*out) != opposite)
        .exactly_one()
        .ok()?;

    if network.link(next).is_loop() {
        return None;
    }

    let next_opposite = network.opposite_link(next);
    let entering = network
        .in_links(node)
        .iter()
        .copied()
        .filter(|into| Some(*into) != next_opposite)
        .exactly_one()
        .ok()?;

    (entering == link).then_some(next)
}

/// The link preceding `link` in a single-file chain, mirroring [`successor`].
fn predecessor(network: &Network, link: LinkIx) -> Option<LinkIx> {
    let attributes = network.link(link);
    if attributes.is_loop() {
        return None;
    }

    let node = attributes.from;
    let opposite = network.opposite_link(link);

    let previous = network
        .in_links(node)
        .iter()
        .copied()
        .filter(|into| Some(*into) != opposite)
        .exactly_one()
        .ok()?;

    if network.link(previous).is_loop() {
        return None;
    }

    let previous_opposite = network.opposite_link(previous);
    let leaving = network
        .out_links(node)
        .iter()
        .copied()
        .filter(|out| Some(*out) != previous_opposite)
        .exactly_one()
        .ok()?;

    (leaving == link).then_some(previous)
}

/// The maximal single-file chain containing `link`.
///
/// Walks forwards then backwards from `link`, stopping a walk as soon as it
/// reaches a link it has already visited, so closed rings terminate.
pub fn single_file_chain(network: &Network, link: LinkIx) -> FxHashSet<LinkIx> {
    let mut visited = FxHashSet::default();
    visited.insert(link);

    let walks: [fn(&Network, LinkIx) -> Option<LinkIx>; 2] = [successor, predecessor];

    for step in walks {
        let mut current = link;
        while let Some(next) = step(network, current) {
            if !visited.insert(next) {
                break;
            }
            current = next;
        }
    }

    visited
}

/// Reduces every single-file chain in the set to its member closest to
/// the stop. Ties go to the lower link index. Pre-assigned sets are kept.
pub fn reduce_single_file(network: &Network, set: &mut RawSet) {
    if set.preassigned || set.entries.len() < 2 {
        return;
    }

    let mut settled = FxHashSet::default();
    let mut dropped = FxHashSet::default();

    for entry in &set.entries {
        if settled.contains(&entry.link) {
            continue;
        }

        let chain = single_file_chain(network, entry.link);
        let members = set
            .entries
            .iter()
            .filter(|member| chain.contains(&member.link))
            .collect::<Vec<_>>();

        let keep = members
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance).then(a.link.cmp(&b.link)))
            .map(|member| member.link);

        for member in members {
            settled.insert(member.link);
            if Some(member.link) != keep {
                dropped.insert(member.link);
            }
        }
    }

    set.entries.retain(|entry| !dropped.contains(&entry.link));
}
