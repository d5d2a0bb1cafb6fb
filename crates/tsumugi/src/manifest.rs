//! Typed output of the ad manifest parser.
//!
//! Manifests arrive here already parsed. Each element is its own type, so a schema mismatch shows
//! up when the tree is built rather than when the scheduler looks something up.
mod offset;
mod vast;
mod vmap;

pub use offset::{parse_clock, TimeOffset};
pub use vast::*;
pub use vmap::*;
