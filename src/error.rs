//! Error types for the buckling solver

use thiserror::Error;

use crate::path::StateId;

/// Main error type for path continuation and bracketing operations
#[derive(Error, Debug)]
pub enum BucklingError {
    #[error("Node '{0}' not found in model")]
    NodeNotFound(String),

    #[error("Duplicate name '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Singular stiffness matrix - model may be unstable or have insufficient supports")]
    SingularMatrix,

    #[error("Equilibrium iteration failed to converge after {0} iterations")]
    ConvergenceFailed(usize),

    #[error("State {0} has no predecessor on the equilibrium path")]
    MissingPredecessor(StateId),

    #[error("State {0} has no determinant - solve det(K) first")]
    MissingDeterminant(StateId),

    #[error("Bracket endpoints do not share the same set of nodes")]
    NodeSetMismatch,

    #[error("Degenerate bracket: arc-length positions coincide, quadratic fit is singular")]
    DegenerateBracket,

    #[error("Unhandled regime in bracketing search - classification bug")]
    UnhandledRegime,

    #[error("No critical point found within {steps} bracketing steps")]
    NoCriticalPointFound {
        /// Last state computed before the step budget ran out
        last_state: StateId,
        steps: usize,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BucklingError {
    /// The last state the bracketing search produced, if the search ran out
    /// of steps. Callers that want the soft failure mode can fall back to it.
    pub fn last_state(&self) -> Option<StateId> {
        match self {
            Self::NoCriticalPointFound { last_state, .. } => Some(*last_state),
            _ => None,
        }
    }
}

/// Result type for buckling solver operations
pub type BucklingResult<T> = Result<T, BucklingError>;
