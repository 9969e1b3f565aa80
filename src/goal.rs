//! Goal evaluation: active flags and the solved verdict.
//!
//! A pure function of the post-solve component state, recomputed from
//! scratch on every solve. The game shell reads `active` to light sprites,
//! `faulted` to trigger the fire effect, and `solved` to end the puzzle.

use crate::grid::Grid;
use crate::CURRENT_EPSILON;

/// The outcome of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveResult {
    /// True iff nothing is faulted and enough lamps reached their band
    pub solved: bool,
    /// How many lamps currently satisfy their target band
    pub lamps_lit: usize,
    /// True iff any component carries the NaN fault sentinel
    pub faulted: bool,
}

/// Derive every component's `active` flag and the puzzle verdict.
pub fn evaluate(grid: &mut Grid) -> SolveResult {
    let mut lamps_lit = 0;
    let mut faulted = false;

    for (_, comp) in grid.components_mut() {
        // NaN fails the comparison, so a faulted component is never active
        comp.active = comp.current.abs() > CURRENT_EPSILON;
        if comp.current.is_nan() {
            faulted = true;
        }
        if comp.satisfies_target() {
            lamps_lit += 1;
        }
    }

    SolveResult {
        solved: !faulted && lamps_lit >= grid.goal_lamp_count(),
        lamps_lit,
        faulted,
    }
}
