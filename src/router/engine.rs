use crate::costing::{CostModel, LinkContext};
use crate::network::{LinkIx, Mode, ModeSet, Network, NodeIx};
use crate::router::LeastCostPath;

use geo::{Intersects, Rect};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

/// The part of the network a router searches, as its own graph.
///
/// Graph nodes are weighted by their network node, edges by their link.
/// Parallel links between a pair of nodes are kept as parallel edges.
#[derive(Debug)]
pub(crate) struct PathEngine {
    graph: DiGraph<NodeIx, LinkIx>,
    nodes: FxHashMap<NodeIx, NodeIndex>,
    searches: usize,
}

impl PathEngine {
    /// Keeps the links sharing a mode with `modes` whose ends both lie
    /// within `bounds`, should any be given. Nodes left without a link
    /// are not part of the graph.
    pub fn build(network: &Network, modes: &ModeSet, bounds: Option<Rect>) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = FxHashMap::default();

        let within = |node: NodeIx| {
            bounds.is_none_or(|rect| rect.intersects(&network.node(node).position))
        };

        for (ix, link) in network.links() {
            if !link.allows_any(modes) || !within(link.from) || !within(link.to) {
                continue;
            }

            let mut index_of = |node: NodeIx| *nodes.entry(node).or_insert_with(|| graph.add_node(node));

            let from = index_of(link.from);
            let to = index_of(link.to);
            graph.add_edge(from, to, ix);
        }

        Self {
            graph,
            nodes,
            searches: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The number of searches run, excluding those with an absent endpoint.
    pub fn searches(&self) -> usize {
        self.searches
    }

    pub fn contains(&self, node: NodeIx) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Finds the least-cost path between two nodes. Returns `None` if either
    /// node is absent from the graph, or if no path connects them.
    pub fn search(
        &mut self,
        network: &Network,
        model: &CostModel,
        schedule_mode: &Mode,
        (from, to): (NodeIx, NodeIx),
        departure: Option<LinkIx>,
    ) -> Option<LeastCostPath> {
        let start = *self.nodes.get(&from)?;
        let goal = *self.nodes.get(&to)?;

        self.searches += 1;

        let cost = |link: LinkIx| {
            model.link_cost(LinkContext::new(network, link, schedule_mode).departing(departure))
        };

        let (travel_cost, path) = petgraph::algo::astar(
            &self.graph,
            start,
            |node| node == goal,
            |edge| cost(*edge.weight()),
            |_| 0.0,
        )?;

        let links = path
            .windows(2)
            .map(|pair| {
                self.graph
                    .edges_connecting(pair[0], pair[1])
                    .map(|edge| *edge.weight())
                    .min_by(|a, b| cost(*a).total_cmp(&cost(*b)).then(a.cmp(b)))
            })
            .collect::<Option<Vec<_>>>()?;

        let travel_time = links
            .iter()
            .map(|link| model.link_time(network.link(*link)))
            .sum();

        Some(LeastCostPath {
            nodes: path.into_iter().map(|node| self.graph[node]).collect(),
            links,
            travel_cost,
            travel_time,
        })
    }
}
