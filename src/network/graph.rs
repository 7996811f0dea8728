use crate::network::item::{IndexedNode, Incident, Link, LinkIx, LinkSpec, ModeSet, Node, NodeIx};
use crate::network::{Mode, NetworkError};
use crate::util::geometry::{beeline, segment_distance};

use geo::{Line, Point};
use log::{debug, info};
use rstar::RTree;
use rustc_hash::FxHashMap;
use std::fmt::{Debug, Formatter};

/// Prefix given to the identifiers of fabricated stop loop links and their nodes.
pub const LOOP_LINK_PREFIX: &str = "pt_";

/// Length of a fabricated loop link.
pub const LOOP_LINK_LENGTH: f64 = 1.0;

/// Nominal freespeed of fabricated links.
pub const ARTIFICIAL_FREESPEED: f64 = 1.0;

/// The network the schedule is mapped upon.
///
/// Nodes and links live in a single owned arena and reference each other
/// by index ([`NodeIx`], [`LinkIx`]), never by pointer. Incident links are
/// kept per node so that the in- and out-links of any node can be resolved
/// without scanning the link list.
///
/// Every node is also kept in an [`RTree`] for radius searches,
/// see [`Scan`](crate::Scan).
pub struct Network {
    nodes: Vec<Node>,
    links: Vec<Link>,

    outgoing: Vec<Incident>,
    incoming: Vec<Incident>,

    node_lookup: FxHashMap<String, NodeIx>,
    link_lookup: FxHashMap<String, LinkIx>,

    /// Stop facility identifier to the loop link fabricated for it.
    loop_links: FxHashMap<String, LinkIx>,

    pub(crate) index: RTree<IndexedNode>,
}

impl Debug for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Network with Nodes: {}, Links: {}",
            self.nodes.len(),
            self.links.len()
        )
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        Network {
            nodes: Vec::new(),
            links: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            node_lookup: FxHashMap::default(),
            link_lookup: FxHashMap::default(),
            loop_links: FxHashMap::default(),
            index: RTree::new(),
        }
    }

    /// Assembles a network from nodes and links in one pass,
    /// bulk-loading the spatial index.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        links: impl IntoIterator<Item = LinkSpec>,
    ) -> Result<Self, NetworkError> {
        let mut network = Network::new();

        for node in nodes {
            network.push_node(node)?;
        }

        let indexed = network
            .nodes
            .iter()
            .enumerate()
            .map(|(ix, node)| IndexedNode {
                ix: NodeIx(ix as u32),
                position: node.position,
            })
            .collect::<Vec<_>>();

        network.index = RTree::bulk_load(indexed);

        for link in links {
            network.add_link(link)?;
        }

        info!("Assembled {network:?}");
        Ok(network)
    }

    fn push_node(&mut self, node: Node) -> Result<NodeIx, NetworkError> {
        if self.node_lookup.contains_key(&node.id) {
            return Err(NetworkError::DuplicateNode(node.id));
        }

        let ix = NodeIx(u32::try_from(self.nodes.len()).map_err(|_| NetworkError::Overflow)?);

        self.node_lookup.insert(node.id.clone(), ix);
        self.nodes.push(node);
        self.outgoing.push(Incident::new());
        self.incoming.push(Incident::new());

        Ok(ix)
    }

    /// Inserts a node, returning its index.
    pub fn add_node(&mut self, id: impl Into<String>, position: Point) -> Result<NodeIx, NetworkError> {
        let ix = self.push_node(Node::new(id, position))?;
        self.index.insert(IndexedNode { ix, position });
        Ok(ix)
    }

    /// Inserts a link between two existing nodes, returning its index.
    pub fn add_link(&mut self, spec: LinkSpec) -> Result<LinkIx, NetworkError> {
        if self.link_lookup.contains_key(&spec.id) {
            return Err(NetworkError::DuplicateLink(spec.id));
        }

        if spec.freespeed <= 0.0 {
            return Err(NetworkError::InvalidFreespeed {
                link: spec.id,
                freespeed: spec.freespeed,
            });
        }

        let resolve = |node: &String| {
            self.node_ix(node).ok_or_else(|| NetworkError::UnknownNode {
                link: spec.id.clone(),
                node: node.clone(),
            })
        };

        let from = resolve(&spec.from)?;
        let to = resolve(&spec.to)?;

        let length = spec
            .length
            .unwrap_or_else(|| beeline(&self.nodes[from.index()].position, &self.nodes[to.index()].position));

        self.push_link(Link {
            id: spec.id,
            from,
            to,
            length,
            freespeed: spec.freespeed,
            capacity: spec.capacity,
            modes: spec.modes,
            osm_route_modes: spec.osm_route_modes,
            artificial: false,
        })
    }

    fn push_link(&mut self, link: Link) -> Result<LinkIx, NetworkError> {
        let ix = LinkIx(u32::try_from(self.links.len()).map_err(|_| NetworkError::Overflow)?);

        self.outgoing[link.from.index()].push(ix);
        self.incoming[link.to.index()].push(ix);
        self.link_lookup.insert(link.id.clone(), ix);
        self.links.push(link);

        Ok(ix)
    }

    /// Returns the loop link fabricated for the stop facility `facility`,
    /// creating it (and its node, placed at `position`) on first request.
    ///
    /// Subsequent requests for the same facility return the existing link
    /// unchanged, regardless of the position or modes supplied.
    pub fn loop_link(
        &mut self,
        facility: &str,
        position: Point,
        modes: &ModeSet,
    ) -> Result<LinkIx, NetworkError> {
        if let Some(existing) = self.loop_links.get(facility) {
            return Ok(*existing);
        }

        let id = format!("{LOOP_LINK_PREFIX}{facility}");
        let node = self.add_node(id.clone(), position)?;

        let mut loop_modes = modes.clone();
        loop_modes.insert(Mode::artificial());

        let ix = self.push_link(Link {
            id,
            from: node,
            to: node,
            length: LOOP_LINK_LENGTH,
            freespeed: ARTIFICIAL_FREESPEED,
            capacity: super::item::DEFAULT_CAPACITY,
            modes: loop_modes,
            osm_route_modes: ModeSet::new(),
            artificial: true,
        })?;

        debug!("Created loop link {ix:?} for stop facility {facility}");
        self.loop_links.insert(facility.to_string(), ix);

        Ok(ix)
    }

    /// The loop link previously fabricated for a stop facility, if any.
    pub fn existing_loop_link(&self, facility: &str) -> Option<LinkIx> {
        self.loop_links.get(facility).copied()
    }

    #[inline]
    pub fn node(&self, ix: NodeIx) -> &Node {
        &self.nodes[ix.index()]
    }

    #[inline]
    pub fn link(&self, ix: LinkIx) -> &Link {
        &self.links[ix.index()]
    }

    #[inline]
    pub fn get_node(&self, ix: NodeIx) -> Option<&Node> {
        self.nodes.get(ix.index())
    }

    #[inline]
    pub fn get_link(&self, ix: LinkIx) -> Option<&Link> {
        self.links.get(ix.index())
    }

    pub fn node_ix(&self, id: &str) -> Option<NodeIx> {
        self.node_lookup.get(id).copied()
    }

    pub fn link_ix(&self, id: &str) -> Option<LinkIx> {
        self.link_lookup.get(id).copied()
    }

    #[inline]
    pub fn get_position(&self, ix: NodeIx) -> Option<Point> {
        self.get_node(ix).map(|node| node.position)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIx, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(ix, node)| (NodeIx(ix as u32), node))
    }

    pub fn links(&self) -> impl Iterator<Item = (LinkIx, &Link)> {
        self.links
            .iter()
            .enumerate()
            .map(|(ix, link)| (LinkIx(ix as u32), link))
    }

    #[inline]
    pub fn out_links(&self, node: NodeIx) -> &[LinkIx] {
        &self.outgoing[node.index()]
    }

    #[inline]
    pub fn in_links(&self, node: NodeIx) -> &[LinkIx] {
        &self.incoming[node.index()]
    }

    /// Every link entering or leaving `node`. A self-loop appears twice.
    pub fn incident_links(&self, node: NodeIx) -> impl Iterator<Item = LinkIx> + '_ {
        self.in_links(node)
            .iter()
            .chain(self.out_links(node))
            .copied()
    }

    /// Looks up the link travelling the opposite direction between the same
    /// pair of nodes. A loop link has no opposite.
    ///
    /// Should the network hold multiple such links, the first inserted is returned.
    pub fn opposite_link(&self, ix: LinkIx) -> Option<LinkIx> {
        let link = self.link(ix);
        if link.is_loop() {
            return None;
        }

        self.out_links(link.to)
            .iter()
            .copied()
            .find(|candidate| *candidate != ix && self.link(*candidate).to == link.from)
    }

    /// The straight line between the link's from and to nodes.
    #[inline]
    pub fn link_line(&self, ix: LinkIx) -> Line {
        let link = self.link(ix);
        Line::new(self.node(link.from).position.0, self.node(link.to).position.0)
    }

    /// The minimum distance from `point` to the link's from-to segment.
    ///
    /// The segment is always measured from its lower node index, so a link
    /// and its opposite yield bit-identical distances.
    #[inline]
    pub fn link_distance(&self, ix: LinkIx, point: &Point) -> f64 {
        let link = self.link(ix);
        let (first, second) = if link.from <= link.to {
            (link.from, link.to)
        } else {
            (link.to, link.from)
        };

        segment_distance(
            point,
            &self.node(first).position,
            &self.node(second).position,
        )
    }
}
