//! fea-buckling - critical-point bracketing for nonlinear truss structures
//!
//! This library follows the equilibrium path of a geometrically nonlinear
//! truss model and finds the next critical point - the state where the
//! determinant of the tangent stiffness vanishes (a buckling or limit
//! point). It provides:
//! - Geometrically nonlinear truss elements (Green-Lagrange strain)
//! - Load-control and arc-length-control solution steps with tangential
//!   predictors
//! - det(K) and attendant-eigenvalue evaluation along the path
//! - A bracketing search combining arc-length continuation, bisection and
//!   quadratic extremum estimation
//!
//! ## Example
//! ```rust
//! use fea_buckling::prelude::*;
//!
//! // Shallow two-truss arch with a snap-through limit point
//! let mut model = Model::new();
//! model.add_node("A", Node::new(0.0, 0.0, 0.0)).unwrap();
//! model.add_node("B", Node::new(1.0, 1.0, 0.0)).unwrap();
//! model.add_node("C", Node::new(2.0, 0.0, 0.0)).unwrap();
//! model.add_support("A", Support::xyz()).unwrap();
//! model.add_support("B", Support::z()).unwrap();
//! model.add_support("C", Support::xyz()).unwrap();
//! model.add_node_load("B", [0.0, -1.0, 0.0]).unwrap();
//! model.add_truss("1", Truss::new("A", "B", 1.0, 1.0)).unwrap();
//! model.add_truss("2", Truss::new("B", "C", 1.0, 1.0)).unwrap();
//!
//! let mut path = TrussPath::new(model).unwrap();
//!
//! // First nonlinear steps under load control
//! let mut state = path.root();
//! for lam in [0.05, 0.10, 0.13] {
//!     state = path.duplicate(state);
//!     path.predict_tangential(state, PredictorStrategy::Lambda(lam)).unwrap();
//!     path.solve_equilibrium(state, &SolveOptions::load_control().with_determinant())
//!         .unwrap();
//! }
//!
//! // Bracket the critical point (lam_cr = 1 / (3 sqrt(6)) for this arch)
//! let outcome = bracket(&mut path, state, &BracketingOptions::default()).unwrap();
//! let lam_cr = path.load_factor(outcome.state);
//! assert!((lam_cr - 1.0 / (3.0 * 6.0_f64.sqrt())).abs() < 1e-6);
//! ```

pub mod analysis;
pub mod bracketing;
pub mod elements;
pub mod error;
pub mod math;
pub mod model;
pub mod path;
pub mod solver;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{ControlStrategy, PredictorStrategy, SolveOptions};
    pub use crate::bracketing::{
        bisect, bracket, find_extremum, quadratic_vertex, BracketingOptions, BracketingOutcome,
        Convergence, SearchRegime,
    };
    pub use crate::elements::{Node, Support, Truss};
    pub use crate::error::{BucklingError, BucklingResult};
    pub use crate::model::Model;
    pub use crate::path::{EquilibriumPath, EquilibriumState, StateId, TrussPath};
}
