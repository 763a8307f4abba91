//! Analysis strategies and options

use serde::{Deserialize, Serialize};

/// Control strategy for a nonlinear solution step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlStrategy {
    /// Load factor held fixed, Newton-Raphson on the displacements
    LoadControl,
    /// Spherical arc-length constraint on the combined displacement /
    /// load-factor increment, solved via the bordered system. Follows the
    /// path past limit points.
    ArcLengthControl,
}

impl Default for ControlStrategy {
    fn default() -> Self {
        Self::LoadControl
    }
}

/// Strategy for the tangential predictor that seeds a solution step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PredictorStrategy {
    /// Scale the tangent so the generalized increment length repeats the
    /// previous increment's length, oriented to continue the path
    ArcLength,
    /// Scale the tangent so the load-factor increment repeats the previous
    /// load-factor increment
    LoadControl,
    /// Scale the tangent so the load factor lands on the given value
    Lambda(f64),
}

/// Options for a nonlinear solution step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveOptions {
    /// Control strategy for the corrector iterations
    pub strategy: ControlStrategy,
    /// Evaluate det(K) after the step converges
    pub solve_determinant: bool,
    /// Evaluate the eigenvalue of smallest magnitude (and its mode) after
    /// the step converges
    pub solve_attendant_eigenvalue: bool,
    /// Maximum corrector iterations
    pub max_iterations: usize,
    /// Residual tolerance for corrector convergence
    pub tolerance: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            strategy: ControlStrategy::LoadControl,
            solve_determinant: false,
            solve_attendant_eigenvalue: false,
            max_iterations: 100,
            tolerance: 1e-8,
        }
    }
}

impl SolveOptions {
    /// Options for a load-control step
    pub fn load_control() -> Self {
        Self::default()
    }

    /// Options for an arc-length-control step
    pub fn arc_length() -> Self {
        Self {
            strategy: ControlStrategy::ArcLengthControl,
            ..Self::default()
        }
    }

    /// Request det(K) evaluation
    pub fn with_determinant(mut self) -> Self {
        self.solve_determinant = true;
        self
    }

    /// Request attendant eigenvalue evaluation
    pub fn with_attendant_eigenvalue(mut self) -> Self {
        self.solve_attendant_eigenvalue = true;
        self
    }

    /// Set maximum corrector iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set corrector residual tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }
}
