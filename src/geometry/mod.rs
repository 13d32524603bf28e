//! Geometry module - Structural reconstruction of mechanical systems.
//!
//! A [`Topology`] turns one row of a table into the ordered vertex lists of
//! a structure, prepending the anchors and pivots that the simulator never
//! writes out.

mod bounds;
mod shape;
mod topology;

pub use bounds::*;
pub use shape::*;
pub use topology::*;
