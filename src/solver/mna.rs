//! MNA matrix assembly and Gaussian elimination.

use crate::error::{CircuitError, Result};

/// Pivots with a smaller magnitude than this abort elimination as singular.
pub const MIN_PIVOT: f64 = 1e-9;

/// MNA system Ax = z: one KCL row per non-reference node, one constraint
/// row per source branch. Node indices refer to the local subnetwork
/// numbering; `None` is the reference node, fixed at 0 V.
#[derive(Debug)]
pub struct MnaSystem {
    /// System matrix A (row-major)
    a: Vec<f64>,
    /// Source vector z
    z: Vec<f64>,
    /// Matrix dimension
    size: usize,
}

impl MnaSystem {
    pub fn new(size: usize) -> Self {
        Self {
            a: vec![0.0; size * size],
            z: vec![0.0; size],
            size,
        }
    }

    fn add(&mut self, row: usize, col: usize, value: f64) {
        self.a[row * self.size + col] += value;
    }

    /// Stamp a conductance between two nodes:
    ///   A[n1,n1] += G, A[n2,n2] += G, A[n1,n2] -= G, A[n2,n1] -= G
    pub fn stamp_conductance(&mut self, n1: Option<usize>, n2: Option<usize>, g: f64) {
        if let Some(i) = n1 {
            self.add(i, i, g);
        }
        if let Some(j) = n2 {
            self.add(j, j, g);
        }
        if let (Some(i), Some(j)) = (n1, n2) {
            self.add(i, j, -g);
            self.add(j, i, -g);
        }
    }

    /// Stamp a voltage source with constraint row `br`:
    /// V[n+] - V[n-] = E, with the branch current entering both KCL rows.
    pub fn stamp_voltage_source(
        &mut self,
        n_pos: Option<usize>,
        n_neg: Option<usize>,
        br: usize,
        volts: f64,
    ) {
        if let Some(i) = n_pos {
            self.add(br, i, 1.0);
            self.add(i, br, 1.0);
        }
        if let Some(j) = n_neg {
            self.add(br, j, -1.0);
            self.add(j, br, -1.0);
        }
        self.z[br] += volts;
    }

    /// Solve by Gaussian elimination with partial pivoting on the augmented
    /// system. Consumes the assembled matrix; the factorization is never
    /// reused since the network is rebuilt on every edit.
    pub fn solve(mut self) -> Result<Vec<f64>> {
        let n = self.size;

        for k in 0..n {
            // Find pivot
            let mut max_val = self.a[k * n + k].abs();
            let mut max_row = k;
            for i in (k + 1)..n {
                let val = self.a[i * n + k].abs();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }

            // A vanishing pivot means a short circuit or an inconsistent
            // set of sources; the caller classifies it
            if max_val < MIN_PIVOT {
                return Err(CircuitError::SingularMatrix);
            }

            if max_row != k {
                for j in 0..n {
                    self.a.swap(k * n + j, max_row * n + j);
                }
                self.z.swap(k, max_row);
            }

            // Eliminate below the pivot
            let pivot = self.a[k * n + k];
            for i in (k + 1)..n {
                let factor = self.a[i * n + k] / pivot;
                if factor == 0.0 {
                    continue;
                }
                for j in k..n {
                    self.a[i * n + j] -= factor * self.a[k * n + j];
                }
                self.z[i] -= factor * self.z[k];
            }
        }

        // Back substitution
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut acc = self.z[i];
            for j in (i + 1)..n {
                acc -= self.a[i * n + j] * x[j];
            }
            x[i] = acc / self.a[i * n + i];
        }

        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_battery_and_resistor_to_ground() {
        // 5V source and 5 ohm resistor between node 0 and the reference:
        // unknowns are V0 and the source current
        let mut sys = MnaSystem::new(2);
        sys.stamp_conductance(Some(0), None, 1.0 / 5.0);
        sys.stamp_voltage_source(Some(0), None, 1, 5.0);

        let x = sys.solve().unwrap();
        assert_relative_eq!(x[0], 5.0);
        // Branch current flows from + to - through the source
        assert_relative_eq!(x[1], -1.0);
    }

    #[test]
    fn test_voltage_divider() {
        // 6V across two 1k resistors in series; midpoint is node 1
        let mut sys = MnaSystem::new(3);
        sys.stamp_conductance(Some(0), Some(1), 1e-3);
        sys.stamp_conductance(Some(1), None, 1e-3);
        sys.stamp_voltage_source(Some(0), None, 2, 6.0);

        let x = sys.solve().unwrap();
        assert_relative_eq!(x[0], 6.0);
        assert_relative_eq!(x[1], 3.0);
        assert_relative_eq!(x[2], -3.0e-3);
    }

    #[test]
    fn test_source_across_one_node_is_singular() {
        // Both source terminals on the reference node: the constraint row
        // is empty
        let mut sys = MnaSystem::new(1);
        sys.stamp_voltage_source(None, None, 0, 5.0);
        assert_eq!(sys.solve(), Err(CircuitError::SingularMatrix));
    }

    #[test]
    fn test_conflicting_sources_are_singular() {
        // Two ideal sources with different voltages across the same pair
        let mut sys = MnaSystem::new(3);
        sys.stamp_voltage_source(Some(0), None, 1, 5.0);
        sys.stamp_voltage_source(Some(0), None, 2, 3.0);
        assert_eq!(sys.solve(), Err(CircuitError::SingularMatrix));
    }
}
