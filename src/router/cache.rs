use crate::config::MapperConfig;
use crate::diagnostics::{Counter, Diagnostics};
use crate::network::{Mode, ModeSet, Network};
use crate::router::{Router, RouterBuilder};
use crate::schedule::TransitRoute;
use crate::shape::RouteShape;

use log::info;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

/// The identity a router is built and shared by.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouterKey {
    /// Shared by every route of a schedule mode.
    Mode(Mode),

    /// Shared by every route following a shape. The schedule mode
    /// of the routes decides the network modes travelled.
    Shape { shape: String, mode: Mode },
}

impl RouterKey {
    pub fn schedule_mode(&self) -> &Mode {
        match self {
            RouterKey::Mode(mode) | RouterKey::Shape { mode, .. } => mode,
        }
    }
}

impl Display for RouterKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterKey::Mode(mode) => write!(f, "mode:{mode}"),
            RouterKey::Shape { shape, mode } => write!(f, "shape:{shape}:{mode}"),
        }
    }
}

/// Builds routers on first request, sharing them thereafter.
///
/// Should two threads request the same key at once, both may build a
/// router, but only the first to finish is kept and handed to both.
#[derive(Debug)]
pub struct RouterCache {
    network: Arc<Network>,
    config: MapperConfig,
    shapes: FxHashMap<String, Arc<RouteShape>>,

    routers: RwLock<FxHashMap<RouterKey, Arc<Router>>>,
    diagnostics: Arc<Diagnostics>,
}

impl RouterCache {
    /// Routers are built from `config` as is. It is expected to have been
    /// checked through [`MapperConfig::validate`], as candidate building does.
    pub fn new(network: Arc<Network>, config: MapperConfig, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            network,
            config,
            shapes: FxHashMap::default(),
            routers: RwLock::new(FxHashMap::default()),
            diagnostics,
        }
    }

    pub fn with_shapes(mut self, shapes: impl IntoIterator<Item = RouteShape>) -> Self {
        self.shapes.extend(
            shapes
                .into_iter()
                .map(|shape| (shape.id().to_string(), Arc::new(shape))),
        );
        self
    }

    pub fn shape(&self, id: &str) -> Option<&Arc<RouteShape>> {
        self.shapes.get(id)
    }

    /// The key a route is routed by. Routes are keyed by their shape if
    /// routing by shape is enabled and the shape is known, and by their
    /// schedule mode otherwise.
    pub fn key_for(&self, route: &TransitRoute) -> RouterKey {
        let mode = route.transport_mode.clone();

        match (&route.shape_id, self.config.route_by_shape) {
            (Some(shape), true) if self.shapes.contains_key(shape) => RouterKey::Shape {
                shape: shape.clone(),
                mode,
            },
            (Some(shape), true) => {
                self.diagnostics.warn(format!(
                    "Shape {shape} of route {} is unknown, routing by mode {mode}",
                    route.id
                ));
                RouterKey::Mode(mode)
            }
            _ => RouterKey::Mode(mode),
        }
    }

    pub fn router_for_route(&self, route: &TransitRoute) -> Arc<Router> {
        self.router_for(&self.key_for(route))
    }

    /// The router of a key, building it if no router exists yet.
    pub fn router_for(&self, key: &RouterKey) -> Arc<Router> {
        if let Some(router) = self
            .routers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Arc::clone(router);
        }

        let router = self.build(key);

        let mut routers = self.routers.write().unwrap_or_else(PoisonError::into_inner);
        match routers.entry(key.clone()) {
            Entry::Occupied(existing) => Arc::clone(existing.get()),
            Entry::Vacant(vacant) => {
                self.diagnostics.increment(Counter::RouterBuilds);
                info!("Cached router {key}");
                Arc::clone(vacant.insert(Arc::new(router)))
            }
        }
    }

    fn build(&self, key: &RouterKey) -> Router {
        let mode = key.schedule_mode();

        let network_modes = match self.config.params(mode) {
            Some(params) => params.network_modes.clone(),
            None => {
                self.diagnostics.warn(format!(
                    "No network modes assigned to schedule mode {mode}, \
                    its router only travels artificial links"
                ));
                ModeSet::new()
            }
        };

        let mut builder = RouterBuilder::new(key.clone(), network_modes);

        if let RouterKey::Shape { shape, .. } = key {
            match self.shapes.get(shape) {
                Some(shape) => builder = builder.with_shape(Arc::clone(shape)),
                None => self
                    .diagnostics
                    .warn(format!("Shape {shape} is unknown, its router is unbounded")),
            }
        }

        builder.build(
            Arc::clone(&self.network),
            &self.config,
            Arc::clone(&self.diagnostics),
        )
    }

    /// The keys of every router built so far, in order.
    pub fn keys(&self) -> Vec<RouterKey> {
        let mut keys = self
            .routers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect::<Vec<_>>();

        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.routers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
