//! The ephemeral electrical network derived from a grid.

use std::fmt;

use crate::grid::CellPos;

/// A node: one equivalence class of grid cells held at the same potential
/// after wire contraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// The electrical element carried by a branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BranchElement {
    Resistor { ohms: f64 },
    Battery { volts: f64 },
}

/// A two-terminal element connecting two nodes. `cell` maps the branch back
/// to the grid cell its results are written to.
#[derive(Debug, Clone)]
pub struct Branch {
    pub cell: CellPos,
    pub element: BranchElement,
    /// Terminal nodes in neighbor-scan order (up, left, right, down);
    /// solved current is positive when flowing from the first terminal to
    /// the second through the element
    pub terminals: [NodeId; 2],
}

/// A network is rebuilt from the grid on every solve and discarded after:
/// nodes, branches, and the maps needed to write results back. It holds no
/// references into the grid.
#[derive(Debug)]
pub struct Network {
    /// Total node count, synthetic open nodes included
    pub num_nodes: usize,
    /// Per-node flag: synthetic open sentinel, bound to a single dangling
    /// terminal and to nothing else
    open: Vec<bool>,
    pub branches: Vec<Branch>,
    /// Wire cells belonging to each node, for fault writeback
    node_cells: Vec<Vec<CellPos>>,
}

impl Network {
    pub(crate) fn new() -> Self {
        Self {
            num_nodes: 0,
            open: Vec::new(),
            branches: Vec::new(),
            node_cells: Vec::new(),
        }
    }

    /// Allocate the next node id.
    pub(crate) fn alloc_node(&mut self, is_open: bool) -> NodeId {
        let id = self.num_nodes;
        self.num_nodes += 1;
        self.open.push(is_open);
        self.node_cells.push(Vec::new());
        NodeId(id)
    }

    pub(crate) fn add_wire_cell(&mut self, node: NodeId, cell: CellPos) {
        self.node_cells[node.0].push(cell);
    }

    /// Whether `node` is a synthetic open sentinel.
    pub fn is_open(&self, node: NodeId) -> bool {
        self.open[node.0]
    }

    /// Whether both of a branch's terminals are real nodes.
    pub fn is_live(&self, branch: &Branch) -> bool {
        !self.is_open(branch.terminals[0]) && !self.is_open(branch.terminals[1])
    }

    /// The wire cells contracted into `node`.
    pub fn wire_cells(&self, node: NodeId) -> &[CellPos] {
        &self.node_cells[node.0]
    }
}
