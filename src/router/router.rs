use crate::candidate::LinkCandidate;
use crate::config::MapperConfig;
use crate::costing::CostModel;
use crate::diagnostics::{Counter, Diagnostics};
use crate::network::{LinkIx, Mode, ModeSet, Network, NodeIx};
use crate::router::engine::PathEngine;
use crate::router::{LeastCostPath, RouterKey};
use crate::shape::RouteShape;

use log::debug;
use measure_time::debug_time;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
#[cfg(feature = "tracing")]
use tracing::Level;

/// A memoised path, where `None` records the destination as unreachable.
type Memo<K> = scc::HashMap<K, Option<Arc<LeastCostPath>>>;

/// Describes a [`Router`] yet to be built.
#[derive(Debug, Clone)]
pub struct RouterBuilder {
    key: RouterKey,
    network_modes: ModeSet,
    shape: Option<Arc<RouteShape>>,
}

impl RouterBuilder {
    /// A router travelling the given network modes. Fabricated
    /// (artificial) links are always travelled.
    pub fn new(key: RouterKey, network_modes: ModeSet) -> Self {
        let mut network_modes = network_modes;
        network_modes.insert(Mode::artificial());

        Self {
            key,
            network_modes,
            shape: None,
        }
    }

    /// Bounds the router to the buffered extent of `shape`,
    /// biasing its costs towards it.
    pub fn with_shape(self, shape: Arc<RouteShape>) -> Self {
        Self {
            shape: Some(shape),
            ..self
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::INFO, skip_all, fields(key = %self.key)))]
    pub fn build(self, network: Arc<Network>, config: &MapperConfig, diagnostics: Arc<Diagnostics>) -> Router {
        debug_time!("router build");

        let bounds = self.shape.as_ref().and_then(|shape| shape.buffered_rect());
        let engine = PathEngine::build(&network, &self.network_modes, bounds);

        debug!(
            "Built router {} over {} nodes and {} links",
            self.key,
            engine.node_count(),
            engine.link_count()
        );

        Router {
            schedule_mode: self.key.schedule_mode().clone(),
            model: CostModel::from_config(config, self.shape),
            key: self.key,
            network,
            engine: Mutex::new(engine),
            paths: Memo::new(),
            between: Memo::new(),
            diagnostics,
        }
    }
}

/// Sizes of a router's graph and memo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouterStats {
    pub nodes: usize,
    pub links: usize,
    pub memoized_paths: usize,
    pub searches: usize,
}

/// Computes least-cost paths over the part of the network
/// its key may travel on.
///
/// Every result, including an unreachable destination, is memoised.
/// Searches are serialised through the router's engine, whilst memoised
/// results are read concurrently.
pub struct Router {
    key: RouterKey,
    schedule_mode: Mode,
    network: Arc<Network>,
    model: CostModel,

    engine: Mutex<PathEngine>,
    paths: Memo<(NodeIx, NodeIx)>,
    between: Memo<(LinkIx, LinkIx)>,

    diagnostics: Arc<Diagnostics>,
}

impl Debug for Router {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Router({}) {:?}", self.key, self.stats())
    }
}

impl Router {
    pub fn key(&self) -> &RouterKey {
        &self.key
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.model
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Whether the node is part of the router's graph.
    pub fn contains(&self, node: NodeIx) -> bool {
        self.engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(node)
    }

    pub fn stats(&self) -> RouterStats {
        let engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);

        RouterStats {
            nodes: engine.node_count(),
            links: engine.link_count(),
            memoized_paths: self.paths.len() + self.between.len(),
            searches: engine.searches(),
        }
    }

    /// The least-cost path from one node to another, or `None` if either
    /// node is not part of the router's graph or no path connects them.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip(self)))]
    pub fn least_cost_path(&self, from: NodeIx, to: NodeIx) -> Option<Arc<LeastCostPath>> {
        self.memoized(&self.paths, (from, to), |engine| {
            engine.search(&self.network, &self.model, &self.schedule_mode, (from, to), None)
        })
    }

    /// The least-cost path connecting two candidates, from the to-node of
    /// `from` to the from-node of `to`. Costs account for departing
    /// the `from` link, such as penalising an immediate u-turn.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip_all))]
    pub fn least_cost_path_between(
        &self,
        from: &LinkCandidate,
        to: &LinkCandidate,
    ) -> Option<Arc<LeastCostPath>> {
        let origin = self.network.link(from.link()).to;
        let destination = self.network.link(to.link()).from;

        self.memoized(&self.between, (from.link(), to.link()), |engine| {
            engine.search(
                &self.network,
                &self.model,
                &self.schedule_mode,
                (origin, destination),
                Some(from.link()),
            )
        })
    }

    /// Sizes a synthetic link bridging two candidates no path connects,
    /// returning its `(freespeed, length)`.
    pub fn artificial_link_params(
        &self,
        from: &LinkCandidate,
        to: &LinkCandidate,
        max_allowed_cost: f64,
    ) -> (f64, f64) {
        self.model
            .artificial_link_params(&self.network, from, to, max_allowed_cost)
    }

    fn memoized<K>(
        &self,
        memo: &Memo<K>,
        key: K,
        search: impl FnOnce(&mut PathEngine) -> Option<LeastCostPath>,
    ) -> Option<Arc<LeastCostPath>>
    where
        K: Eq + Hash + Copy,
    {
        self.diagnostics.increment(Counter::PathQueries);

        if let Some(path) = memo.read(&key, |_, path| path.clone()) {
            self.diagnostics.increment(Counter::PathCacheHits);
            return path;
        }

        let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);

        // Another thread may have searched whilst we waited on the engine.
        if let Some(path) = memo.read(&key, |_, path| path.clone()) {
            self.diagnostics.increment(Counter::PathCacheHits);
            return path;
        }

        let path = search(&mut engine).map(Arc::new);
        if path.is_none() {
            self.diagnostics.increment(Counter::UnreachablePaths);
        }

        let _ = memo.insert(key, path.clone());
        path
    }
}
