//! Grid-to-network contraction.
//!
//! Converts the placement grid into the graph the solver works on: wire
//! runs become nodes, resistors and batteries become branches. Rebuilt on
//! every solve and discarded afterwards.

mod build;
mod types;

pub use build::build_network;
pub use types::{Branch, BranchElement, Network, NodeId};

pub(crate) use build::DisjointSet;
