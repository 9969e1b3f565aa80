//! Solve orchestration and fault classification.
//!
//! One call to [`solve`] runs the whole pipeline: contract the grid into a
//! network, split it into connected subnetworks, solve each powered
//! subnetwork by MNA, classify faults, write the results back into the
//! grid and evaluate the puzzle goal.
//!
//! Fault policy:
//! - Branches with a dangling terminal, and subnetworks without a battery,
//!   are open: zero current, never an error.
//! - A singular or inconsistent subnetwork (zero-resistance path across a
//!   source, conflicting sources) marks every component it contains,
//!   wires included, with the NaN fault sentinel. Other subnetworks on
//!   the same grid are unaffected.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;

use crate::error::Result;
use crate::goal::{evaluate, SolveResult};
use crate::grid::Grid;
use crate::network::{build_network, BranchElement, DisjointSet, Network, NodeId};
use crate::CURRENT_EPSILON;

use super::mna::MnaSystem;

/// Resistances at or below this stamp as ideal zero-resistance constraints
/// instead of a huge finite conductance.
const ZERO_RESISTANCE: f64 = 1e-9;

/// One connected group of live branches.
struct Subnetwork {
    nodes: BTreeSet<usize>,
    branches: Vec<usize>,
    /// Lowest node id touching a battery; the reference ground when present
    reference: Option<usize>,
}

/// Solve the grid in place.
///
/// Writes `current`, `voltage` and `active` into every placed component and
/// returns the puzzle verdict. Idempotent: re-solving an unchanged grid
/// yields bit-identical values. The grid must not be mutated concurrently;
/// edits and solves belong on the same thread.
pub fn solve(grid: &mut Grid) -> SolveResult {
    let network = build_network(grid);
    for (_, comp) in grid.components_mut() {
        comp.reset_solution();
    }

    // Connectivity over live branches only; open sentinels join nothing
    let mut dset = DisjointSet::new(network.num_nodes.max(1));
    for branch in &network.branches {
        if network.is_live(branch) {
            dset.union(branch.terminals[0].0, branch.terminals[1].0);
        }
    }

    let mut subnets: BTreeMap<usize, Subnetwork> = BTreeMap::new();
    for (i, branch) in network.branches.iter().enumerate() {
        if !network.is_live(branch) {
            continue;
        }
        let root = dset.find(branch.terminals[0].0);
        let subnet = subnets.entry(root).or_insert_with(|| Subnetwork {
            nodes: BTreeSet::new(),
            branches: Vec::new(),
            reference: None,
        });
        subnet.nodes.insert(branch.terminals[0].0);
        subnet.nodes.insert(branch.terminals[1].0);
        subnet.branches.push(i);
        if let BranchElement::Battery { .. } = branch.element {
            let low = branch.terminals[0].0.min(branch.terminals[1].0);
            subnet.reference = Some(subnet.reference.map_or(low, |r| r.min(low)));
        }
    }

    let mut potentials: Vec<Option<f64>> = vec![None; network.num_nodes];
    let mut branch_currents: HashMap<usize, f64> = HashMap::new();
    let mut faulted: BTreeSet<usize> = BTreeSet::new();

    for (&root, subnet) in &subnets {
        // No battery reachable: the whole group is open and stays at zero
        let Some(reference) = subnet.reference else {
            continue;
        };
        debug!(
            "solving subnetwork {}: {} nodes, {} branches",
            root,
            subnet.nodes.len(),
            subnet.branches.len()
        );
        match solve_subnetwork(&network, subnet, reference) {
            Ok((node_potentials, currents)) => {
                for (node, v) in node_potentials {
                    potentials[node] = Some(v);
                }
                branch_currents.extend(currents);
            }
            Err(_) => {
                debug!("subnetwork {root} is singular, marking short circuit");
                faulted.insert(root);
            }
        }
    }

    write_back(grid, &network, &mut dset, &subnets, &potentials, &branch_currents, &faulted);
    evaluate(grid)
}

/// Assemble and solve the MNA system of one powered subnetwork. Returns
/// per-node potentials and the solved currents of its constraint branches.
fn solve_subnetwork(
    network: &Network,
    subnet: &Subnetwork,
    reference: usize,
) -> Result<(Vec<(usize, f64)>, Vec<(usize, f64)>)> {
    // Local unknowns: non-reference node potentials in ascending node-id
    // order, then one current per constraint branch
    let mut node_index: HashMap<usize, usize> = HashMap::new();
    for &node in subnet.nodes.iter().filter(|&&n| n != reference) {
        node_index.insert(node, node_index.len());
    }
    let num_unknown_nodes = node_index.len();

    let is_constraint = |element: &BranchElement| match element {
        BranchElement::Battery { .. } => true,
        BranchElement::Resistor { ohms } => *ohms <= ZERO_RESISTANCE,
    };
    let constraints: Vec<usize> = subnet
        .branches
        .iter()
        .copied()
        .filter(|&bi| is_constraint(&network.branches[bi].element))
        .collect();

    let mut sys = MnaSystem::new(num_unknown_nodes + constraints.len());
    let idx_of = |node: NodeId| node_index.get(&node.0).copied();

    for &bi in &subnet.branches {
        let branch = &network.branches[bi];
        if let BranchElement::Resistor { ohms } = branch.element {
            if ohms > ZERO_RESISTANCE {
                let [a, b] = branch.terminals;
                sys.stamp_conductance(idx_of(a), idx_of(b), 1.0 / ohms);
            }
        }
    }
    for (k, &bi) in constraints.iter().enumerate() {
        let branch = &network.branches[bi];
        let [a, b] = branch.terminals;
        let volts = match branch.element {
            BranchElement::Battery { volts } => volts,
            // Zero-ohm resistor: an ideal short, constrained to 0 V
            BranchElement::Resistor { .. } => 0.0,
        };
        sys.stamp_voltage_source(idx_of(a), idx_of(b), num_unknown_nodes + k, volts);
    }

    let x = sys.solve()?;

    let mut node_potentials = vec![(reference, 0.0)];
    for (&node, &idx) in &node_index {
        node_potentials.push((node, x[idx]));
    }
    let currents = constraints
        .iter()
        .enumerate()
        .map(|(k, &bi)| (bi, x[num_unknown_nodes + k]))
        .collect();
    Ok((node_potentials, currents))
}

#[allow(clippy::too_many_arguments)]
fn write_back(
    grid: &mut Grid,
    network: &Network,
    dset: &mut DisjointSet,
    subnets: &BTreeMap<usize, Subnetwork>,
    potentials: &[Option<f64>],
    branch_currents: &HashMap<usize, f64>,
    faulted: &BTreeSet<usize>,
) {
    for (i, branch) in network.branches.iter().enumerate() {
        let [a, b] = branch.terminals;
        let fault = faulted.contains(&dset.find(a.0)) || faulted.contains(&dset.find(b.0));
        let Some(comp) = grid.component_mut(branch.cell) else {
            continue;
        };

        if fault {
            comp.current = f64::NAN;
            comp.voltage = f64::NAN;
            continue;
        }

        let open_a = network.is_open(a);
        let open_b = network.is_open(b);
        if open_a || open_b {
            // No complete path: zero current; the voltage is the potential
            // of the one real terminal when its region was solved
            comp.current = 0.0;
            let v = if !open_a {
                potentials[a.0]
            } else if !open_b {
                potentials[b.0]
            } else {
                None
            };
            comp.voltage = clamp_noise(v.unwrap_or(0.0));
            continue;
        }

        if let (Some(va), Some(vb)) = (potentials[a.0], potentials[b.0]) {
            let current = match branch.element {
                BranchElement::Resistor { ohms } if ohms > ZERO_RESISTANCE => (va - vb) / ohms,
                _ => branch_currents.get(&i).copied().unwrap_or(0.0),
            };
            comp.current = clamp_noise(current);
            comp.voltage = clamp_noise(va - vb);
        }
        // else: unpowered subnetwork, everything stays at zero
    }

    // Fire marking spreads over the whole shorted subnetwork, wires included
    for root in faulted {
        let Some(subnet) = subnets.get(root) else {
            continue;
        };
        for &node in &subnet.nodes {
            for &cell in network.wire_cells(NodeId(node)) {
                if let Some(comp) = grid.component_mut(cell) {
                    comp.current = f64::NAN;
                    comp.voltage = f64::NAN;
                }
            }
        }
    }
}

fn clamp_noise(v: f64) -> f64 {
    if v.abs() < CURRENT_EPSILON {
        0.0
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellPos, Component};
    use approx::assert_relative_eq;

    /// Build a fixed layout from rows of cell letters:
    /// `W` wire, `B` 5 V battery, `R` 5 ohm resistor,
    /// `L` lamp (5 ohm, 1.0 A +/- 0.1), `.` empty.
    fn grid_from_layout(rows: &[&str], goal: usize) -> Grid {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Grid::new(rows.len(), width, goal);
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let comp = match ch {
                    'W' => Component::wire(),
                    'B' => Component::battery(5.0),
                    'R' => Component::resistor(5.0),
                    'L' => Component::lamp(5.0, 1.0, 0.1),
                    _ => continue,
                };
                grid.set_fixed(CellPos::new(r, c), comp);
            }
        }
        grid
    }

    fn current_at(grid: &Grid, row: usize, col: usize) -> f64 {
        grid.component(CellPos::new(row, col)).unwrap().current
    }

    #[test]
    fn test_all_wire_grid_carries_no_current() {
        let mut grid = grid_from_layout(&["WW", "WW"], 0);
        let result = solve(&mut grid);
        assert!(result.solved);
        assert!(!result.faulted);
        for (_, comp) in grid.iter_filled() {
            assert_eq!(comp.current, 0.0);
            assert!(!comp.active);
        }

        let mut grid = grid_from_layout(&["WW", "WW"], 1);
        assert!(!solve(&mut grid).solved);
    }

    #[test]
    fn test_series_battery_and_resistor() {
        let mut grid = grid_from_layout(&["WWW", "B.R", "WWW"], 0);
        let result = solve(&mut grid);
        assert!(result.solved);

        let resistor = grid.component(CellPos::new(1, 2)).unwrap();
        assert_relative_eq!(resistor.current.abs(), 1.0);
        assert_relative_eq!(resistor.voltage.abs(), 5.0);
        assert!(resistor.active);

        let battery = grid.component(CellPos::new(1, 0)).unwrap();
        assert_relative_eq!(battery.current.abs(), 1.0);
        assert_relative_eq!(battery.voltage.abs(), 5.0);
        assert!(battery.active);
    }

    #[test]
    fn test_lamp_within_margin_solves_the_puzzle() {
        let mut grid = grid_from_layout(&["WWW", "B.L", "WWW"], 1);
        let result = solve(&mut grid);
        assert_eq!(result.lamps_lit, 1);
        assert!(result.solved);

        let lamp = grid.component(CellPos::new(1, 2)).unwrap();
        assert_relative_eq!(lamp.current.abs(), 1.0);
        assert!(lamp.satisfies_target());
    }

    #[test]
    fn test_shorted_battery_marks_whole_loop() {
        // Pure wire loop across the battery
        let mut grid = grid_from_layout(&["WWW", "B.W", "WWW"], 0);
        let result = solve(&mut grid);
        assert!(result.faulted);
        // Never solved while anything burns, whatever the goal says
        assert!(!result.solved);

        for (_, comp) in grid.iter_filled() {
            assert!(comp.current.is_nan());
            assert!(!comp.active);
        }
    }

    #[test]
    fn test_fault_stays_on_its_own_subcircuit() {
        let mut grid = grid_from_layout(&[
            "WWW", "B.R", "WWW", // healthy series circuit
            "...",
            "WWW", "B.W", "WWW", // shorted loop
        ], 0);
        let result = solve(&mut grid);
        assert!(result.faulted);
        assert!(!result.solved);

        // The healthy loop still solves to 1 A
        assert_relative_eq!(current_at(&grid, 1, 2).abs(), 1.0);
        // The shorted loop burns
        assert!(current_at(&grid, 5, 0).is_nan());
        assert!(current_at(&grid, 4, 1).is_nan());
    }

    #[test]
    fn test_broken_loop_is_open_not_faulted() {
        // Bottom-right wire missing: the resistor dangles
        let mut grid = grid_from_layout(&["WWW", "B.R", "WW."], 0);
        let result = solve(&mut grid);
        assert!(!result.faulted);
        for (_, comp) in grid.iter_filled() {
            assert_eq!(comp.current, 0.0);
            assert!(!comp.active);
        }
    }

    #[test]
    fn test_isolated_component_is_open_never_nan() {
        let mut grid = grid_from_layout(&["...", ".R.", "..."], 0);
        solve(&mut grid);
        let resistor = grid.component(CellPos::new(1, 1)).unwrap();
        assert_eq!(resistor.current, 0.0);
        assert_eq!(resistor.voltage, 0.0);
        assert!(!resistor.active);
    }

    #[test]
    fn test_series_batteries_add_up() {
        // Two 5 V batteries in series with one 5 ohm resistor: 2 A
        let mut grid = grid_from_layout(&["WWW", "B.R", "W.W", "B.W", "WWW"], 0);
        let result = solve(&mut grid);
        assert!(!result.faulted);
        assert_relative_eq!(current_at(&grid, 1, 2).abs(), 2.0);
    }

    #[test]
    fn test_parallel_ideal_sources_fault() {
        // Two batteries across the same wire pair: no resistance in the
        // loop between them
        let mut grid = grid_from_layout(&["WWW", "B.B", "WWW"], 0);
        let result = solve(&mut grid);
        assert!(result.faulted);
        assert!(current_at(&grid, 1, 0).is_nan());
        assert!(current_at(&grid, 1, 2).is_nan());
    }

    #[test]
    fn test_zero_ohm_resistor_shorts_exactly() {
        let mut grid = grid_from_layout(&["WWW", "B.R", "WWW"], 0);
        grid.component_mut(CellPos::new(1, 2)).unwrap().resistance = 0.0;
        let result = solve(&mut grid);
        assert!(result.faulted);
        assert!(current_at(&grid, 1, 0).is_nan());
        assert!(current_at(&grid, 1, 2).is_nan());
    }

    #[test]
    fn test_solve_is_bitwise_idempotent() {
        let mut grid = grid_from_layout(&["WWW", "B.L", "WWW"], 1);
        solve(&mut grid);
        let first: Vec<(u64, u64)> = grid
            .iter_filled()
            .map(|(_, c)| (c.current.to_bits(), c.voltage.to_bits()))
            .collect();

        solve(&mut grid);
        let second: Vec<(u64, u64)> = grid
            .iter_filled()
            .map(|(_, c)| (c.current.to_bits(), c.voltage.to_bits()))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_after_clearing_a_component() {
        let mut grid = grid_from_layout(&["WWW", "B.W", "WWW"], 0);
        // Player closes the loop through a resistor instead of the wire
        let pos = CellPos::new(1, 2);
        assert!(solve(&mut grid).faulted);

        // The wire at (1, 2) is fixed in this layout, so rebuild with an
        // editable gap and play the piece in
        let mut grid = grid_from_layout(&["WWW", "B..", "WWW"], 0);
        grid.place_component(pos, Component::resistor(5.0)).unwrap();
        let result = solve(&mut grid);
        assert!(!result.faulted);
        assert_relative_eq!(current_at(&grid, 1, 2).abs(), 1.0);

        grid.clear_component(pos).unwrap();
        assert!(grid.component(pos).is_none());
        let result = solve(&mut grid);
        assert!(!result.faulted);
        // With the loop open again nothing conducts
        assert_eq!(current_at(&grid, 1, 0), 0.0);
    }

    #[test]
    fn test_abutting_battery_and_resistor_conduct() {
        // Direct battery-resistor contact, loop closed around the edge
        let mut grid = grid_from_layout(&["BR", "WW"], 0);
        let result = solve(&mut grid);
        assert!(!result.faulted);
        assert_relative_eq!(current_at(&grid, 0, 1).abs(), 1.0);
    }
}
