//! Mathematical utilities shared by the solver

use nalgebra::{DMatrix, DVector, Matrix3, SMatrix, SVector, Vector3};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Vec3 = Vector3<f64>;

/// 6x6 matrix for truss element stiffness
pub type Mat6 = SMatrix<f64, 6, 6>;
/// 6-element vector for truss element forces
pub type Vec6 = SVector<f64, 6>;

/// Solve a linear system using LU decomposition
pub fn solve_linear_system(a: &Mat, b: &Vec) -> Option<Vec> {
    a.clone().lu().solve(b)
}

/// Determinant of a square matrix via LU decomposition
pub fn determinant(a: &Mat) -> f64 {
    a.clone().lu().determinant()
}

/// Eigenvalue of smallest magnitude of a symmetric matrix, with its
/// eigenvector. Returns `None` for an empty matrix.
pub fn smallest_eigenpair(a: &Mat) -> Option<(f64, Vec)> {
    if a.nrows() == 0 {
        return None;
    }
    let eigen = a.clone().symmetric_eigen();
    let mut index = 0;
    for i in 1..eigen.eigenvalues.len() {
        if eigen.eigenvalues[i].abs() < eigen.eigenvalues[index].abs() {
            index = i;
        }
    }
    let value = eigen.eigenvalues[index];
    let vector = eigen.eigenvectors.column(index).into_owned();
    Some((value, vector))
}

/// Extract the sub-matrix of `a` at the given row/column indices
pub fn submatrix(a: &Mat, indices: &[usize]) -> Mat {
    let n = indices.len();
    let mut out = Mat::zeros(n, n);
    for (i, &di) in indices.iter().enumerate() {
        for (j, &dj) in indices.iter().enumerate() {
            out[(i, j)] = a[(di, dj)];
        }
    }
    out
}

/// Extract the sub-vector of `v` at the given indices
pub fn subvector(v: &Vec, indices: &[usize]) -> Vec {
    Vec::from_iterator(indices.len(), indices.iter().map(|&i| v[i]))
}
