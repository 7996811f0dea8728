//! Per-link costs used by the routers.
//!
//! A [`CostModel`] measures a link by its length or its free-flow travel
//! time ([`TravelCostType`]), then applies any number of [`LinkStrategy`]
//! decorations on top. Decorations either scale the base cost
//! ([`Adjustment::Factor`]) or add to it ([`Adjustment::Penalty`]).
//! Every factor is applied before any penalty.

#[doc(hidden)]
pub mod decorator;
#[doc(hidden)]
pub mod model;
#[doc(hidden)]
pub mod strategy;


#[doc(inline)]
pub use decorator::*;
#[doc(inline)]
pub use model::*;
#[doc(inline)]
pub use strategy::*;
