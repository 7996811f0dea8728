use crate::candidate::LinkCandidate;
use crate::config::MapperConfig;
use crate::costing::{Adjustment, LinkContext, LinkStrategy, OsmRouteBonus, ShapeBias, UTurnPenalty};
use crate::network::{Link, Network, ARTIFICIAL_FREESPEED};
use crate::schedule::StopOccurrence;
use crate::shape::RouteShape;
use crate::util::geometry::beeline;

use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The measure links are costed by.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TravelCostType {
    /// The length of the link.
    #[default]
    Length,

    /// The free-flow travel time of the link, `length / freespeed`.
    Time,
}

/// Factor applied to a candidate's distance to its stop,
/// accounting for the walk there and back.
const CANDIDATE_DISTANCE_FACTOR: f64 = 2.0;

/// Costs links by a base measure, decorated by a set of strategies.
#[derive(Debug)]
pub struct CostModel {
    cost_type: TravelCostType,
    strategies: Vec<Box<dyn LinkStrategy>>,
    candidate_distance_weight: f64,
}

impl CostModel {
    pub fn new(cost_type: TravelCostType) -> Self {
        Self {
            cost_type,
            strategies: Vec::new(),
            candidate_distance_weight: 0.0,
        }
    }

    /// Assembles the model configured for a router, biased
    /// towards `shape` should one be given.
    pub fn from_config(config: &MapperConfig, shape: Option<Arc<RouteShape>>) -> Self {
        let costing = &config.costing;
        let mut model = CostModel::new(config.travel_cost_type)
            .with_candidate_distance_weight(costing.candidate_distance_weight);

        if let (Some(shape), Some(profile)) = (shape, costing.shape_bias) {
            debug!("Biasing costs towards shape {}", shape.id());
            model = model.with_strategy(ShapeBias::new(shape, profile));
        }

        if costing.osm_route_bonus != 1.0 {
            model = model.with_strategy(OsmRouteBonus(costing.osm_route_bonus));
        }

        if costing.u_turn_penalty > 0.0 {
            model = model.with_strategy(UTurnPenalty(costing.u_turn_penalty));
        }

        model
    }

    pub fn with_strategy(mut self, strategy: impl LinkStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn with_candidate_distance_weight(self, candidate_distance_weight: f64) -> Self {
        Self {
            candidate_distance_weight,
            ..self
        }
    }

    #[inline]
    pub fn cost_type(&self) -> TravelCostType {
        self.cost_type
    }

    /// The undecorated cost of a link.
    #[inline]
    pub fn base_cost(&self, link: &Link) -> f64 {
        match self.cost_type {
            TravelCostType::Length => link.length,
            TravelCostType::Time => link.travel_time(),
        }
    }

    /// The free-flow travel time of a link, regardless of the cost type.
    #[inline]
    pub fn link_time(&self, link: &Link) -> f64 {
        link.travel_time()
    }

    /// The decorated cost (disutility) of traversing a link.
    pub fn link_cost(&self, context: LinkContext) -> f64 {
        let base = self.base_cost(context.attributes());

        let (factor, penalty) = self
            .strategies
            .iter()
            .filter_map(|strategy| strategy.calculate(context))
            .fold((1.0, 0.0), |(factor, penalty), adjustment| match adjustment {
                Adjustment::Factor(value) => (factor * value, penalty),
                Adjustment::Penalty(value) => (factor, penalty + value),
            });

        base * factor + penalty
    }

    /// The cost of a candidate link itself, including the bias
    /// for its distance from the stop it serves.
    pub fn candidate_cost(&self, context: LinkContext, candidate: &LinkCandidate) -> f64 {
        self.link_cost(context) + self.candidate_distance_cost(context.attributes(), candidate)
    }

    /// The bias for the distance between a candidate and its stop,
    /// in the unit of the cost type.
    pub fn candidate_distance_cost(&self, link: &Link, candidate: &LinkCandidate) -> f64 {
        let distance = self.candidate_distance_weight * CANDIDATE_DISTANCE_FACTOR * candidate.distance();

        match self.cost_type {
            TravelCostType::Length => distance,
            TravelCostType::Time => distance / link.freespeed,
        }
    }

    /// A lower bound of the cost between two stops of a route.
    ///
    /// By time, the scheduled gap between departing the first and reaching
    /// the second. By length, the beeline between the two. Where the
    /// schedule lacks the offsets or positions required, the bound is `0`.
    pub fn min_travel_cost(&self, from: &StopOccurrence, to: &StopOccurrence) -> f64 {
        match self.cost_type {
            TravelCostType::Time => match (from.departure(), to.arrival()) {
                (Some(departure), Some(arrival)) => (arrival - departure).max(0.0),
                _ => 0.0,
            },
            TravelCostType::Length => match (from.position(), to.position()) {
                (Some(a), Some(b)) => beeline(&a, &b),
                _ => 0.0,
            },
        }
    }

    /// Sizes a synthetic link connecting two points which no path connects.
    /// Returns the `(freespeed, length)` of the link.
    ///
    /// By time, the link is as long as the maximum cost allowed, such that
    /// traversing it at its nominal freespeed takes exactly that long.
    /// By length, it spans the beeline between the two points.
    pub fn artificial_link_params(
        &self,
        network: &Network,
        from: &LinkCandidate,
        to: &LinkCandidate,
        max_allowed_cost: f64,
    ) -> (f64, f64) {
        let length = match self.cost_type {
            TravelCostType::Time => max_allowed_cost,
            TravelCostType::Length => {
                let start = network.node(network.link(from.link()).to).position;
                let end = network.node(network.link(to.link()).from).position;
                beeline(&start, &end)
            }
        };

        (ARTIFICIAL_FREESPEED, length)
    }
}
