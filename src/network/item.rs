use geo::{Distance, Euclidean, Point};
use rstar::{Envelope, AABB};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};

/// The arena index of a [`Node`] within a [`Network`](crate::Network).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIx(pub u32);

/// The arena index of a [`Link`] within a [`Network`](crate::Network).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkIx(pub u32);

impl NodeIx {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl LinkIx {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A transport mode, either a schedule mode attached to a transit route
/// (such as `bus`), or a network mode tagged upon a link (such as `car`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mode(String);

impl Mode {
    /// The mode given to fabricated links which have no counterpart in
    /// the source network.
    pub const ARTIFICIAL: &'static str = "artificial";

    pub fn new(mode: impl Into<String>) -> Self {
        Self(mode.into())
    }

    pub fn artificial() -> Self {
        Self::new(Self::ARTIFICIAL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mode({})", self.0)
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Mode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An ordered set of modes, ordered so that iteration
/// (and therefore any derived output) is deterministic.
pub type ModeSet = BTreeSet<Mode>;

/// Builds a [`ModeSet`] from string slices.
pub fn modes<'a>(values: impl IntoIterator<Item = &'a str>) -> ModeSet {
    values.into_iter().map(Mode::from).collect()
}

/// The standardised node primitive, containing the external
/// identifier and the (projected) position of the node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub position: Point,
}

impl Node {
    pub fn new(id: impl Into<String>, position: Point) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }
}

/// A directed link between two nodes.
///
/// Every link has a [from](#field.from) and [to](#field.to) node, given by
/// their index in the owning network. The [modes](#field.modes) are the
/// network modes allowed to traverse it.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: String,
    pub from: NodeIx,
    pub to: NodeIx,

    pub length: f64,
    pub freespeed: f64,
    pub capacity: f64,

    pub modes: ModeSet,

    /// Schedule modes of the OSM route relations (and route masters)
    /// this link was imported as a member of.
    pub osm_route_modes: ModeSet,

    /// Set for links fabricated by the mapper, such as stop loop links.
    pub artificial: bool,
}

impl Link {
    /// A loop link starts and ends on the same node.
    #[inline]
    pub fn is_loop(&self) -> bool {
        self.from == self.to
    }

    /// Whether the link shares at least one mode with `modes`.
    #[inline]
    pub fn allows_any(&self, modes: &ModeSet) -> bool {
        self.modes.iter().any(|mode| modes.contains(mode))
    }

    /// Free-flow travel time of the link.
    #[inline]
    pub fn travel_time(&self) -> f64 {
        self.length / self.freespeed
    }
}

/// Attributes used to insert a [`Link`] into a network.
/// The end nodes are referenced by their external identifiers.
#[derive(Debug, Clone)]
pub struct LinkSpec {
    pub id: String,
    pub from: String,
    pub to: String,

    /// The length of the link. If absent, the straight-line
    /// distance between its nodes is used.
    pub length: Option<f64>,
    pub freespeed: f64,
    pub capacity: f64,

    pub modes: ModeSet,
    pub osm_route_modes: ModeSet,
}

impl LinkSpec {
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            length: None,
            freespeed: DEFAULT_FREESPEED,
            capacity: DEFAULT_CAPACITY,
            modes: ModeSet::new(),
            osm_route_modes: ModeSet::new(),
        }
    }

    pub fn length(self, length: f64) -> Self {
        Self {
            length: Some(length),
            ..self
        }
    }

    pub fn freespeed(self, freespeed: f64) -> Self {
        Self { freespeed, ..self }
    }

    pub fn modes<'a>(self, values: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            modes: modes(values),
            ..self
        }
    }

    pub fn osm_route_modes<'a>(self, values: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            osm_route_modes: modes(values),
            ..self
        }
    }
}

/// 50 km/h, in metres per second.
pub(crate) const DEFAULT_FREESPEED: f64 = 13.89;
pub(crate) const DEFAULT_CAPACITY: f64 = 9_999.0;

/// Links incident to a node, rarely more than a handful in either direction.
pub(crate) type Incident = SmallVec<[LinkIx; 4]>;

/// The spatially indexed representation of a node.
///
/// Holds only the index and position so the tree stays compact,
/// the remaining node information is looked up in the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IndexedNode {
    pub ix: NodeIx,
    pub position: Point,
}

impl rstar::RTreeObject for IndexedNode {
    type Envelope = AABB<Point>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl rstar::PointDistance for IndexedNode {
    fn distance_2(
        &self,
        point: &<Self::Envelope as Envelope>::Point,
    ) -> <<Self::Envelope as Envelope>::Point as rstar::Point>::Scalar {
        Euclidean.distance(self.position, *point).powi(2)
    }
}
