//! Contraction of a grid into an electrical network.
//!
//! Wire runs collapse into single nodes through a union-find over grid
//! cells; every resistor or battery becomes a two-terminal branch between
//! the nodes its neighbors belong to. Node ids follow row-major
//! first-observation order, so rebuilding an unchanged grid yields an
//! identical network.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::debug;

use crate::grid::{ComponentKind, Grid};

use super::types::{Branch, BranchElement, Network, NodeId};

/// Union-find over grid cell indices, used to contract wire runs.
pub(crate) struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Build the network for one solve.
pub fn build_network(grid: &Grid) -> Network {
    let mut dset = DisjointSet::new(grid.rows() * grid.cols());

    // Merge adjacent wire cells: a connected run of wires, junctions
    // included, is one potential
    for (pos, comp) in grid.iter_filled() {
        if comp.kind != ComponentKind::Wire {
            continue;
        }
        for n in grid.neighbors(pos) {
            if grid
                .component(n)
                .is_some_and(|c| c.kind == ComponentKind::Wire)
            {
                dset.union(grid.cell_index(pos), grid.cell_index(n));
            }
        }
    }

    let mut network = Network::new();
    // Wire class root -> node id
    let mut wire_nodes: HashMap<usize, NodeId> = HashMap::new();
    // Unordered adjacent non-wire cell pair -> the node at their seam
    let mut junction_nodes: HashMap<(usize, usize), NodeId> = HashMap::new();

    let mut wire_node = |network: &mut Network, root: usize| match wire_nodes.entry(root) {
        Entry::Occupied(e) => *e.get(),
        Entry::Vacant(e) => *e.insert(network.alloc_node(false)),
    };

    for (pos, comp) in grid.iter_filled() {
        match comp.kind {
            ComponentKind::Wire => {
                let root = dset.find(grid.cell_index(pos));
                let node = wire_node(&mut network, root);
                network.add_wire_cell(node, pos);
            }
            ComponentKind::Resistor | ComponentKind::Battery => {
                let mut terminals = [NodeId(0); 2];
                let mut count = 0;
                for n in grid.neighbors(pos) {
                    // Degree > 2 only happens on malformed level data;
                    // extra neighbors are left unconnected
                    if count == 2 {
                        break;
                    }
                    let is_wire = grid
                        .component(n)
                        .is_some_and(|c| c.kind == ComponentKind::Wire);
                    let node = if is_wire {
                        let root = dset.find(grid.cell_index(n));
                        wire_node(&mut network, root)
                    } else {
                        // Two parts abutting directly share the node at
                        // their common edge
                        let a = grid.cell_index(pos);
                        let b = grid.cell_index(n);
                        let key = (a.min(b), a.max(b));
                        match junction_nodes.entry(key) {
                            Entry::Occupied(e) => *e.get(),
                            Entry::Vacant(e) => *e.insert(network.alloc_node(false)),
                        }
                    };
                    terminals[count] = node;
                    count += 1;
                }
                // Dangling terminals bind to fresh open sentinels
                while count < 2 {
                    terminals[count] = network.alloc_node(true);
                    count += 1;
                }

                let element = match comp.kind {
                    ComponentKind::Resistor => BranchElement::Resistor {
                        ohms: comp.resistance,
                    },
                    _ => BranchElement::Battery {
                        volts: comp.source_voltage,
                    },
                };
                network.branches.push(Branch {
                    cell: pos,
                    element,
                    terminals,
                });
            }
        }
    }

    debug!(
        "built network: {} nodes, {} branches",
        network.num_nodes,
        network.branches.len()
    );
    network
}
