//! Link candidates for every stop of a schedule.
//!
//! Candidates are generated per route, in stop-sequence order. Each stop
//! searches for nearby links which its route's mode may travel on, the
//! raw sets of consecutive stops are separated from one another, and each
//! set is reduced to the closest member of every single-file chain. Stops
//! left without a candidate are served by a loop link. Finally, the
//! remaining candidates are scored, and the manual candidates of the
//! configuration are merged in.

#[doc(hidden)]
pub mod builder;
#[doc(hidden)]
pub mod entry;
#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod overrides;
#[doc(hidden)]
pub mod refine;

#[cfg(test)]
mod test;

#[doc(inline)]
pub use builder::*;
#[doc(inline)]
pub use entry::*;
#[doc(inline)]
pub use error::*;
#[doc(inline)]
pub use refine::*;
