#![doc = include_str!("../readme.md")]

#[cfg(feature = "mimalloc")]
use mimalloc::MiMalloc;
#[cfg_attr(feature = "mimalloc", global_allocator)]
#[cfg(feature = "mimalloc")]
static GLOBAL: MiMalloc = MiMalloc;

pub mod candidate;
pub mod config;
pub mod costing;
pub mod diagnostics;
pub mod error;
pub mod network;
pub mod router;
pub mod schedule;
pub mod shape;
pub mod util;

#[cfg(test)]
pub(crate) mod test_util;

#[doc(inline)]
pub use candidate::{CandidateBuilder, CandidateStore, LinkCandidate, LinkCandidateBuilder};
#[doc(inline)]
pub use config::{MapperConfig, ModeParams};
#[doc(inline)]
pub use costing::TravelCostType;
#[doc(inline)]
pub use diagnostics::Diagnostics;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use network::{LinkIx, Mode, ModeSet, Network, NodeIx, Scan};
#[doc(inline)]
pub use router::{LeastCostPath, Router, RouterCache, RouterKey};
#[doc(inline)]
pub use schedule::{Schedule, StopFacility, StopOccurrence, TransitLine, TransitRoute};
#[doc(inline)]
pub use shape::RouteShape;
