//! Least-cost routing between network nodes and link candidates.
//!
//! A [`Router`] is built for a [`RouterKey`], over the part of the network
//! the key's modes may travel on. Routers are built lazily and shared
//! through a [`RouterCache`], and every path a router computes is kept
//! for the remainder of the run.

#[doc(hidden)]
pub mod cache;
#[doc(hidden)]
pub mod engine;
#[doc(hidden)]
pub mod path;
#[doc(hidden)]
pub mod router;


#[doc(inline)]
pub use cache::*;
#[doc(inline)]
pub use path::*;
#[doc(inline)]
pub use router::*;
