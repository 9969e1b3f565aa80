//! The placement grid: cells, adjacency and junction rules.

use std::fmt;

use crate::error::{CircuitError, Result};

use super::component::{Component, ComponentKind};

/// A cell coordinate on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One grid cell: an optional placed component plus whether the player may
/// edit it. Editable cells start empty.
#[derive(Debug, Clone)]
pub struct Cell {
    pub editable: bool,
    pub component: Option<Component>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            editable: true,
            component: None,
        }
    }
}

/// The puzzle grid: a `rows x cols` field of cells plus the number of lamps
/// that must reach their target band for the puzzle to count as solved.
///
/// A grid is constructed once per puzzle. The level loader installs the
/// fixed layout through [`set_fixed`](Grid::set_fixed); during play only
/// editable cells change, through [`place_component`](Grid::place_component)
/// and [`clear_component`](Grid::clear_component).
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    goal_lamp_count: usize,
}

impl Grid {
    /// Create a grid of empty, editable cells.
    pub fn new(rows: usize, cols: usize, goal_lamp_count: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::default(); rows * cols],
            goal_lamp_count,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn goal_lamp_count(&self) -> usize {
        self.goal_lamp_count
    }

    fn in_bounds(&self, pos: CellPos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn index(&self, pos: CellPos) -> usize {
        pos.row * self.cols + pos.col
    }

    /// Row-major cell index, shared with the network builder's union-find.
    pub(crate) fn cell_index(&self, pos: CellPos) -> usize {
        self.index(pos)
    }

    pub fn cell(&self, pos: CellPos) -> Option<&Cell> {
        if self.in_bounds(pos) {
            Some(&self.cells[self.index(pos)])
        } else {
            None
        }
    }

    /// The component at `pos`, if the cell is filled.
    pub fn component(&self, pos: CellPos) -> Option<&Component> {
        self.cell(pos).and_then(|c| c.component.as_ref())
    }

    pub(crate) fn component_mut(&mut self, pos: CellPos) -> Option<&mut Component> {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.cells[idx].component.as_mut()
        } else {
            None
        }
    }

    /// Install a fixed (non-editable) component, bypassing editability.
    /// Level-loader entry point; positions outside the grid are ignored.
    pub fn set_fixed(&mut self, pos: CellPos, component: Component) {
        if !self.in_bounds(pos) {
            log::warn!("set_fixed outside the grid at {pos}");
            return;
        }
        let idx = self.index(pos);
        self.cells[idx].editable = false;
        self.cells[idx].component = Some(component);
    }

    /// The up-to-4 orthogonal neighbor positions, in row-major order
    /// (up, left, right, down), bounds-checked but not filtered for content.
    fn neighbor_positions(&self, pos: CellPos) -> impl Iterator<Item = CellPos> {
        let CellPos { row, col } = pos;
        let rows = self.rows;
        let cols = self.cols;
        let candidates = [
            (row.checked_sub(1), Some(col)),
            (Some(row), col.checked_sub(1)),
            (Some(row), col.checked_add(1)),
            (row.checked_add(1), Some(col)),
        ];
        candidates.into_iter().filter_map(move |(r, c)| match (r, c) {
            (Some(r), Some(c)) if r < rows && c < cols => Some(CellPos::new(r, c)),
            _ => None,
        })
    }

    /// The electrically adjacent cells of `pos`: orthogonal neighbors that
    /// hold a component, in up/left/right/down order.
    pub fn neighbors(&self, pos: CellPos) -> Vec<CellPos> {
        self.neighbor_positions(pos)
            .filter(|&n| self.component(n).is_some())
            .collect()
    }

    fn neighbor_count(&self, pos: CellPos) -> usize {
        self.neighbor_positions(pos)
            .filter(|&n| self.component(n).is_some())
            .count()
    }

    /// A junction is legal iff the cell is a wire (wires may branch up to
    /// degree 4) or has at most two electrical neighbors. Empty cells are
    /// trivially legal.
    pub fn is_junction_legal(&self, pos: CellPos) -> bool {
        match self.component(pos) {
            Some(c) if c.kind != ComponentKind::Wire => self.neighbor_count(pos) <= 2,
            _ => true,
        }
    }

    /// Place a component into an editable cell.
    ///
    /// Rejected without mutating the grid when the cell is fixed or when the
    /// placement would leave any non-wire component (the placed one or a
    /// neighbor) with more than two electrical neighbors.
    pub fn place_component(&mut self, pos: CellPos, component: Component) -> Result<()> {
        if !self.in_bounds(pos) {
            return Err(CircuitError::OutOfBounds {
                row: pos.row,
                col: pos.col,
            });
        }
        if !self.cells[self.index(pos)].editable {
            return Err(CircuitError::CellNotEditable {
                row: pos.row,
                col: pos.col,
            });
        }

        if component.kind != ComponentKind::Wire && self.neighbor_count(pos) > 2 {
            return Err(CircuitError::IllegalJunction {
                row: pos.row,
                col: pos.col,
            });
        }

        // Filling a previously empty cell raises every neighbor's degree
        let was_empty = self.component(pos).is_none();
        if was_empty {
            for n in self.neighbors(pos) {
                let overloads = self
                    .component(n)
                    .is_some_and(|c| c.kind != ComponentKind::Wire)
                    && self.neighbor_count(n) + 1 > 2;
                if overloads {
                    return Err(CircuitError::IllegalJunction {
                        row: pos.row,
                        col: pos.col,
                    });
                }
            }
        }

        let idx = self.index(pos);
        self.cells[idx].component = Some(component);
        Ok(())
    }

    /// Remove the component from an editable cell, restoring it to empty.
    pub fn clear_component(&mut self, pos: CellPos) -> Result<()> {
        if !self.in_bounds(pos) {
            return Err(CircuitError::OutOfBounds {
                row: pos.row,
                col: pos.col,
            });
        }
        let idx = self.index(pos);
        if !self.cells[idx].editable {
            return Err(CircuitError::CellNotEditable {
                row: pos.row,
                col: pos.col,
            });
        }
        self.cells[idx].component = None;
        Ok(())
    }

    /// All filled cells in row-major order.
    pub fn iter_filled(&self) -> impl Iterator<Item = (CellPos, &Component)> {
        let cols = self.cols;
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.component
                .as_ref()
                .map(|c| (CellPos::new(i / cols, i % cols), c))
        })
    }

    /// Mutable access to every placed component, row-major.
    pub(crate) fn components_mut(&mut self) -> impl Iterator<Item = (CellPos, &mut Component)> {
        let cols = self.cols;
        self.cells
            .iter_mut()
            .enumerate()
            .filter_map(move |(i, cell)| {
                cell.component
                    .as_mut()
                    .map(|c| (CellPos::new(i / cols, i % cols), c))
            })
    }
}
