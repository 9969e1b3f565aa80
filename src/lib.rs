//! # VoltGrid Core
//!
//! The circuit-solving engine for the VoltGrid puzzle game.
//!
//! The player arranges wires, resistors, lamps and batteries on a grid; this
//! crate turns that grid into an electrical network, solves it, and decides
//! whether the puzzle is complete. Rendering, input and level loading live in
//! the game shell and only consume the solved component state.
//!
//! ## Architecture
//!
//! - [`grid`] - Component placement, adjacency and junction rules
//! - [`network`] - Contraction of the grid into nodes and branches
//! - [`solver`] - MNA matrix assembly, elimination and fault classification
//! - [`goal`] - Active flags and the solved/unsolved verdict
//!
//! ## Usage
//!
//! ```
//! use voltgrid_core::{solve, CellPos, Component, Grid};
//!
//! let mut grid = Grid::new(1, 3, 0);
//! grid.set_fixed(CellPos::new(0, 0), Component::wire());
//! grid.place_component(CellPos::new(0, 1), Component::battery(5.0)).unwrap();
//! grid.place_component(CellPos::new(0, 2), Component::wire()).unwrap();
//! let result = solve(&mut grid);
//! assert!(result.solved);
//! ```
//!
//! ## Solving Method
//!
//! Every player edit triggers one solve:
//!
//! 1. Contract wire runs into nodes with a union-find, one branch per
//!    resistor or battery
//! 2. Assemble the Modified Nodal Analysis system per connected subnetwork
//! 3. Solve by Gaussian elimination with partial pivoting
//! 4. A singular system marks its whole subnetwork with the NaN fault
//!    sentinel; dangling branches are open and carry zero current
//!
//! The engine is synchronous and deterministic: re-solving an unchanged grid
//! yields bit-identical results, and the grid must not be mutated while a
//! solve is in flight.

pub mod error;
pub mod goal;
pub mod grid;
pub mod network;
pub mod solver;

// Re-export main types for convenience
pub use error::{CircuitError, Result};
pub use goal::SolveResult;
pub use grid::{Cell, CellPos, Component, ComponentKind, Grid};
pub use solver::solve;

/// Current and voltage magnitudes below this are treated as exactly zero,
/// so numerical noise never flags a component as active.
pub const CURRENT_EPSILON: f64 = 1e-9;
