//! The network a transit schedule is mapped onto, and the
//! spatial queries run against it.

#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod graph;
#[doc(hidden)]
pub mod item;
#[doc(hidden)]
pub mod scan;


#[doc(inline)]
pub use error::*;
#[doc(inline)]
pub use graph::*;
#[doc(inline)]
pub use item::{modes, Link, LinkIx, LinkSpec, Mode, ModeSet, Node, NodeIx};
#[doc(inline)]
pub use scan::*;
