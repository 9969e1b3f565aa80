//! Error types for the VoltGrid circuit engine.
//!
//! Placement errors are the only errors surfaced to callers: the grid is
//! left unchanged and play continues. Electrical faults (open and short
//! circuits) are not errors; they are reported through the solved component
//! state instead.

use thiserror::Error;

/// Result type alias using [`CircuitError`].
pub type Result<T> = std::result::Result<T, CircuitError>;

/// Unified error type for all VoltGrid operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircuitError {
    // ============ Placement Errors ============
    /// Cell position lies outside the grid
    #[error("Cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: usize, col: usize },

    /// The player tried to edit a fixed cell
    #[error("Cell ({row}, {col}) is not editable")]
    CellNotEditable { row: usize, col: usize },

    /// Placement would give a non-wire component more than two neighbors
    #[error("Placing at ({row}, {col}) would create an illegal junction")]
    IllegalJunction { row: usize, col: usize },

    // ============ Component Errors ============
    /// Wires carry neither a resistance nor a source voltage
    #[error("Wire has no main value")]
    WireHasNoValue,

    // ============ Solver-Internal Errors ============
    /// Elimination hit a pivot below threshold. Intercepted by the fault
    /// classifier and turned into the NaN short-circuit sentinel; never
    /// returned from [`solve`](crate::solver::solve).
    #[error("Singular matrix - a zero-resistance path crosses a source")]
    SingularMatrix,
}
