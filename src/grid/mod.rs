//! Component placement and grid adjacency.
//!
//! The [`Grid`] owns the puzzle's cells and enforces the placement rules:
//! only editable cells change during play, and only wires may form
//! junctions of degree greater than two. No solving logic lives here.

mod component;
mod topology;

pub use component::{Component, ComponentKind};
pub use topology::{Cell, CellPos, Grid};
