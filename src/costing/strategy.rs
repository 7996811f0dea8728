use crate::network::{Link, LinkIx, Mode, Network};

use std::fmt::Debug;

/// The effect a decoration has upon the base cost of a link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Adjustment {
    /// Multiplies the base cost.
    Factor(f64),

    /// Added after all factors are applied.
    Penalty(f64),
}

/// The context a link is costed within.
#[derive(Clone, Copy, Debug)]
pub struct LinkContext<'a> {
    pub network: &'a Network,

    /// The link being costed.
    pub link: LinkIx,

    /// The link the current path query departs from, if any.
    pub departure: Option<LinkIx>,

    /// The transport mode of the route being mapped.
    pub schedule_mode: &'a Mode,
}

impl<'a> LinkContext<'a> {
    pub fn new(network: &'a Network, link: LinkIx, schedule_mode: &'a Mode) -> Self {
        Self {
            network,
            link,
            departure: None,
            schedule_mode,
        }
    }

    pub fn departing(self, departure: Option<LinkIx>) -> Self {
        Self { departure, ..self }
    }

    #[inline]
    pub fn attributes(&self) -> &'a Link {
        self.network.link(self.link)
    }
}

pub trait Strategy<Ctx> {
    /// The adjustment to apply, or `None` if the strategy does not
    /// concern itself with the given context.
    fn calculate(&self, context: Ctx) -> Option<Adjustment>;
}

/// A [`Strategy`] over links, shareable between the threads of a run.
pub trait LinkStrategy: for<'a> Strategy<LinkContext<'a>> + Debug + Send + Sync {}
impl<T> LinkStrategy for T where T: for<'a> Strategy<LinkContext<'a>> + Debug + Send + Sync {}
