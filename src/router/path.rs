use crate::network::{LinkIx, Network, NodeIx};

use geo::LineString;

/// A least-cost path through the network.
#[derive(Clone, Debug, PartialEq)]
pub struct LeastCostPath {
    /// The nodes visited, from the origin to the destination inclusive.
    pub nodes: Vec<NodeIx>,

    /// The links traversed, one fewer than the nodes.
    pub links: Vec<LinkIx>,

    /// The decorated cost of traversing every link.
    pub travel_cost: f64,

    /// The free-flow travel time of traversing every link.
    pub travel_time: f64,
}

impl LeastCostPath {
    /// A path which starts and ends on the same node.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn origin(&self) -> Option<NodeIx> {
        self.nodes.first().copied()
    }

    pub fn destination(&self) -> Option<NodeIx> {
        self.nodes.last().copied()
    }

    /// The geometry of the path, through the positions of its nodes.
    pub fn line_string(&self, network: &Network) -> LineString {
        self.nodes
            .iter()
            .map(|node| network.node(*node).position)
            .collect()
    }
}
