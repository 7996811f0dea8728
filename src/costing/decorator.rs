use crate::config::ShapeBiasConfig;
use crate::costing::{Adjustment, LinkContext, Strategy};
use crate::network::LinkIx;
use crate::shape::RouteShape;

use std::sync::Arc;

/// Scales links by their distance to the shape of the route, rewarding
/// links along it and penalising links which stray from it.
///
/// The distance of each link is computed on first use and kept
/// for the lifetime of the decorator.
#[derive(Debug)]
pub struct ShapeBias {
    shape: Arc<RouteShape>,
    profile: ShapeBiasConfig,
    distances: scc::HashMap<LinkIx, f64>,
}

impl ShapeBias {
    pub fn new(shape: Arc<RouteShape>, profile: ShapeBiasConfig) -> Self {
        Self {
            shape,
            profile,
            distances: scc::HashMap::new(),
        }
    }

    pub fn shape(&self) -> &RouteShape {
        &self.shape
    }

    /// The sampled distance of the link to the shape.
    pub fn distance(&self, context: &LinkContext) -> f64 {
        if let Some(distance) = self.distances.read(&context.link, |_, distance| *distance) {
            return distance;
        }

        let link = context.attributes();
        let distance = self.shape.segment_distance(
            &context.network.node(link.from).position,
            &context.network.node(link.to).position,
        );

        // Racing writers compute the same value.
        let _ = self.distances.insert(context.link, distance);
        distance
    }
}

impl<'a> Strategy<LinkContext<'a>> for ShapeBias {
    fn calculate(&self, context: LinkContext<'a>) -> Option<Adjustment> {
        let distance = self.distance(&context);
        Some(Adjustment::Factor(self.profile.multiplier(distance)))
    }
}

/// Penalises immediately reversing onto the opposite of the link
/// a path query departs from.
#[derive(Debug, Clone, Copy)]
pub struct UTurnPenalty(pub f64);

impl<'a> Strategy<LinkContext<'a>> for UTurnPenalty {
    fn calculate(&self, context: LinkContext<'a>) -> Option<Adjustment> {
        let departure = context.departure?;

        (context.network.opposite_link(departure) == Some(context.link))
            .then_some(Adjustment::Penalty(self.0))
    }
}

/// Discounts links which are members of a route relation of the
/// schedule mode being mapped.
#[derive(Debug, Clone, Copy)]
pub struct OsmRouteBonus(pub f64);

impl<'a> Strategy<LinkContext<'a>> for OsmRouteBonus {
    fn calculate(&self, context: LinkContext<'a>) -> Option<Adjustment> {
        context
            .attributes()
            .osm_route_modes
            .contains(context.schedule_mode)
            .then_some(Adjustment::Factor(self.0))
    }
}
