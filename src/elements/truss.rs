//! Truss element - geometrically nonlinear two-node bar
//!
//! Total-Lagrangian formulation with the Green-Lagrange strain
//! `e = (L^2 - L0^2) / (2 L0^2)`, giving a consistent tangent stiffness with
//! material and geometric contributions. This is what makes limit points and
//! snap-through representable in the first place.

use serde::{Deserialize, Serialize};

use crate::math::{Mat3, Mat6, Vec3, Vec6};

/// A truss (axial-only) element between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Truss {
    /// Name of the start node
    pub node_a: String,
    /// Name of the end node
    pub node_b: String,
    /// Young's modulus
    pub youngs_modulus: f64,
    /// Cross-section area
    pub area: f64,
}

impl Truss {
    /// Create a new truss element
    pub fn new(node_a: &str, node_b: &str, youngs_modulus: f64, area: f64) -> Self {
        Self {
            node_a: node_a.to_string(),
            node_b: node_b.to_string(),
            youngs_modulus,
            area,
        }
    }

    /// Reference (undeformed) length from the endpoint coordinates
    pub fn reference_length(xa: &[f64; 3], xb: &[f64; 3]) -> f64 {
        let a1 = Vec3::new(xb[0] - xa[0], xb[1] - xa[1], xb[2] - xa[2]);
        a1.norm()
    }

    /// Green-Lagrange strain for the given endpoint displacements
    pub fn green_strain(xa: &[f64; 3], xb: &[f64; 3], ua: &[f64; 3], ub: &[f64; 3]) -> f64 {
        let a1 = Vec3::new(xb[0] - xa[0], xb[1] - xa[1], xb[2] - xa[2]);
        let a = actual_vector(xa, xb, ua, ub);
        let l0_sq = a1.norm_squared();
        (a.norm_squared() - l0_sq) / (2.0 * l0_sq)
    }

    /// Internal force vector [fa; fb] in global coordinates
    pub fn internal_forces(
        &self,
        xa: &[f64; 3],
        xb: &[f64; 3],
        ua: &[f64; 3],
        ub: &[f64; 3],
    ) -> Vec6 {
        let a = actual_vector(xa, xb, ua, ub);
        let l0 = Self::reference_length(xa, xb);
        let strain = Self::green_strain(xa, xb, ua, ub);

        // f_b = E A e a / L0, f_a = -f_b
        let fb = a * (self.youngs_modulus * self.area * strain / l0);

        let mut f = Vec6::zeros();
        for i in 0..3 {
            f[i] = -fb[i];
            f[i + 3] = fb[i];
        }
        f
    }

    /// Consistent tangent stiffness (material + geometric part), 6x6 global
    pub fn tangent_stiffness(
        &self,
        xa: &[f64; 3],
        xb: &[f64; 3],
        ua: &[f64; 3],
        ub: &[f64; 3],
    ) -> Mat6 {
        let a = actual_vector(xa, xb, ua, ub);
        let l0 = Self::reference_length(xa, xb);
        let strain = Self::green_strain(xa, xb, ua, ub);
        let ea = self.youngs_modulus * self.area;

        // K = (EA / L0^3) a a^T + (EA e / L0) I
        let material = a * a.transpose() * (ea / l0.powi(3));
        let geometric = Mat3::identity() * (ea * strain / l0);
        expand_blocks(&(material + geometric))
    }

    /// Linear (small-displacement) stiffness from the reference geometry
    pub fn linear_stiffness(&self, xa: &[f64; 3], xb: &[f64; 3]) -> Mat6 {
        let a1 = Vec3::new(xb[0] - xa[0], xb[1] - xa[1], xb[2] - xa[2]);
        let l0 = a1.norm();
        let ea = self.youngs_modulus * self.area;
        let k = a1 * a1.transpose() * (ea / l0.powi(3));
        expand_blocks(&k)
    }
}

/// Actual (deformed) axis vector b - a including displacements
fn actual_vector(xa: &[f64; 3], xb: &[f64; 3], ua: &[f64; 3], ub: &[f64; 3]) -> Vec3 {
    Vec3::new(
        xb[0] + ub[0] - xa[0] - ua[0],
        xb[1] + ub[1] - xa[1] - ua[1],
        xb[2] + ub[2] - xa[2] - ua[2],
    )
}

/// Expand a 3x3 block K into the 6x6 pattern [[K, -K], [-K, K]]
fn expand_blocks(k: &Mat3) -> Mat6 {
    let mut out = Mat6::zeros();
    for i in 0..3 {
        for j in 0..3 {
            out[(i, j)] = k[(i, j)];
            out[(i, j + 3)] = -k[(i, j)];
            out[(i + 3, j)] = -k[(i, j)];
            out[(i + 3, j + 3)] = k[(i, j)];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ZERO: [f64; 3] = [0.0, 0.0, 0.0];

    #[test]
    fn test_green_strain_axial_stretch() {
        // Unit bar along X stretched by 0.1: e = (1.21 - 1) / 2 = 0.105
        let xa = [0.0, 0.0, 0.0];
        let xb = [1.0, 0.0, 0.0];
        let ub = [0.1, 0.0, 0.0];
        let strain = Truss::green_strain(&xa, &xb, &ZERO, &ub);
        assert_relative_eq!(strain, 0.105, epsilon = 1e-12);
    }

    #[test]
    fn test_internal_force_axial() {
        let truss = Truss::new("A", "B", 1.0, 1.0);
        let xa = [0.0, 0.0, 0.0];
        let xb = [1.0, 0.0, 0.0];
        let ub = [0.1, 0.0, 0.0];
        let f = truss.internal_forces(&xa, &xb, &ZERO, &ub);
        // f_b = EA * e * a_x / L0 = 0.105 * 1.1
        assert_relative_eq!(f[3], 0.105 * 1.1, epsilon = 1e-12);
        assert_relative_eq!(f[0], -0.105 * 1.1, epsilon = 1e-12);
        assert_relative_eq!(f[4], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tangent_matches_linear_at_zero_displacement() {
        let truss = Truss::new("A", "B", 2.0, 0.5);
        let xa = [0.0, 0.0, 0.0];
        let xb = [1.0, 1.0, 0.0];
        let kt = truss.tangent_stiffness(&xa, &xb, &ZERO, &ZERO);
        let kl = truss.linear_stiffness(&xa, &xb);
        for i in 0..6 {
            for j in 0..6 {
                assert_relative_eq!(kt[(i, j)], kl[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_tangent_symmetry() {
        let truss = Truss::new("A", "B", 1.0, 1.0);
        let xa = [0.0, 0.0, 0.0];
        let xb = [1.0, 1.0, 0.0];
        let ub = [0.02, -0.3, 0.0];
        let k = truss.tangent_stiffness(&xa, &xb, &ZERO, &ub);
        for i in 0..6 {
            for j in 0..6 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_tangent_consistent_with_forces() {
        // Finite-difference check of the tangent against the internal forces
        let truss = Truss::new("A", "B", 1.0, 1.0);
        let xa = [0.0, 0.0, 0.0];
        let xb = [1.0, 1.0, 0.0];
        let ub = [0.01, -0.25, 0.0];
        let k = truss.tangent_stiffness(&xa, &xb, &ZERO, &ub);
        let h = 1e-7;
        for j in 0..3 {
            let mut ub_plus = ub;
            ub_plus[j] += h;
            let f_plus = truss.internal_forces(&xa, &xb, &ZERO, &ub_plus);
            let f = truss.internal_forces(&xa, &xb, &ZERO, &ub);
            for i in 0..6 {
                let fd = (f_plus[i] - f[i]) / h;
                assert_relative_eq!(k[(i, j + 3)], fd, epsilon = 1e-5);
            }
        }
    }
}
