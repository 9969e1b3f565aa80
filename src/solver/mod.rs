//! MNA matrix assembly and numerical solving.
//!
//! [`solve`] is the engine's entry point: it rebuilds the network from the
//! grid, solves every powered subnetwork by Modified Nodal Analysis and
//! writes currents, voltages and fault sentinels back into the components.

mod engine;
mod mna;

pub use engine::solve;
pub use mna::{MnaSystem, MIN_PIVOT};
