//! Critical-point bracketing
//!
//! Finds the next point along an equilibrium path where the determinant of
//! the tangent stiffness vanishes (a buckling or limit point). The search
//! combines three procedures: arc-length continuation to step forward,
//! detection of a sign change or local extremum in the determinant sequence,
//! and refinement by bisection or quadratic-interpolation-guided
//! sub-stepping. Every sample costs a full nonlinear equilibrium solve, so
//! the controller aims each step instead of stepping blindly.

pub mod bisection;
pub mod extremum;

#[cfg(test)]
pub(crate) mod scripted;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::{ControlStrategy, PredictorStrategy, SolveOptions};
use crate::error::{BucklingError, BucklingResult};
use crate::path::{EquilibriumPath, StateId};

pub use bisection::bisect;
pub use extremum::{find_extremum, quadratic_vertex};

/// Options for the bracketing search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketingOptions {
    /// Tolerance for det(K) == 0
    pub tolerance: f64,
    /// Maximum number of search steps
    pub max_steps: usize,
    /// Corrector options forwarded to every nonlinear solve; the search
    /// forces arc-length control and determinant evaluation itself
    pub solver: SolveOptions,
}

impl Default for BracketingOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-7,
            max_steps: 100,
            solver: SolveOptions::arc_length()
                .with_determinant()
                .with_attendant_eigenvalue(),
        }
    }
}

impl BracketingOptions {
    /// Set the det(K) tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set the search step budget
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Which convergence branch ended the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Convergence {
    /// |det| dropped below the tolerance
    Absolute,
    /// |det / det_initial| dropped below the tolerance
    Relative,
    /// The determinant stopped changing between consecutive states -
    /// degenerate convergence at a stationary point, not a true root
    Stationary,
}

/// Result of a successful bracketing search
#[derive(Debug, Clone, Copy)]
pub struct BracketingOutcome {
    /// The converged state
    pub state: StateId,
    /// Which convergence branch fired
    pub convergence: Convergence,
    /// Number of search steps performed
    pub steps: usize,
}

/// Search regime of the bracketing controller
///
/// Transitions are monotone one-way: the continuation regime is never
/// re-entered, and bisection is terminal. A determinant sign change during an
/// extremum search moves the search into bisection for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchRegime {
    /// Default regime: monotone same-signed determinant run, keep stepping
    Continuation,
    /// Slope sign changed: a local extremum lies inside the window
    ExtremumSearch,
    /// Determinant sign changed: a root is bracketed
    Bisection,
}

impl SearchRegime {
    /// Classify the next regime from the current window. `det_0`/`det_1` are
    /// the current and previous determinants, `delta_0`/`delta_1` the two
    /// first differences of the determinant sequence.
    pub fn advance(
        self,
        det_0: f64,
        det_1: f64,
        delta_0: f64,
        delta_1: f64,
    ) -> BucklingResult<SearchRegime> {
        match self {
            SearchRegime::Bisection => Ok(SearchRegime::Bisection),
            SearchRegime::ExtremumSearch => {
                if det_0.signum() != det_1.signum() {
                    Ok(SearchRegime::Bisection)
                } else {
                    Ok(SearchRegime::ExtremumSearch)
                }
            }
            SearchRegime::Continuation => {
                if det_0.signum() == det_1.signum() && delta_0.signum() == delta_1.signum() {
                    Ok(SearchRegime::Continuation)
                } else if det_0.signum() != det_1.signum() {
                    Ok(SearchRegime::Bisection)
                } else if delta_0.signum() != delta_1.signum() {
                    Ok(SearchRegime::ExtremumSearch)
                } else {
                    Err(BucklingError::UnhandledRegime)
                }
            }
        }
    }
}

/// Find the next critical point along the equilibrium path.
///
/// `initial` must be a solved state whose predecessor exists (a first
/// nonlinear step has to be performed by the caller); determinants are
/// evaluated on demand for both.
///
/// On success the converged state is returned together with the convergence
/// branch that fired. If the step budget runs out, the error carries the last
/// computed state so callers can opt into soft handling instead of aborting.
pub fn bracket<P: EquilibriumPath + ?Sized>(
    path: &mut P,
    initial: StateId,
    options: &BracketingOptions,
) -> BucklingResult<BracketingOutcome> {
    info!("starting bracketing search for the next critical point");

    let mut state_0 = initial;
    let mut state_1 = path.previous(state_0)?;

    let mut det_0 = ensure_determinant(path, state_0)?;
    let mut det_1 = ensure_determinant(path, state_1)?;
    let det_initial = det_0;

    let mut delta_0 = det_0 - det_1;
    let mut delta_1 = delta_0;

    let mut regime = SearchRegime::Continuation;
    let mut step = 0;

    let continuation_solver = SolveOptions {
        strategy: ControlStrategy::ArcLengthControl,
        solve_determinant: true,
        ..options.solver.clone()
    };

    loop {
        // convergence checks, in priority order
        if det_0.abs() < options.tolerance {
            info!("converged to det(K) = {det_0}");
            return Ok(BracketingOutcome {
                state: state_0,
                convergence: Convergence::Absolute,
                steps: step,
            });
        }
        if det_initial != 0.0 && (det_0 / det_initial).abs() < options.tolerance {
            info!(
                "converged to relative value det(K) / det(K)_initial = {}",
                det_0 / det_initial
            );
            return Ok(BracketingOutcome {
                state: state_0,
                convergence: Convergence::Relative,
                steps: step,
            });
        }
        if (det_0 - det_1).abs() < options.tolerance {
            warn!("converged at a stationary point of det(K), not a true root");
            return Ok(BracketingOutcome {
                state: state_0,
                convergence: Convergence::Stationary,
                steps: step,
            });
        }

        if step >= options.max_steps {
            break;
        }
        step += 1;
        info!("bracketing step {step}");

        regime = regime.advance(det_0, det_1, delta_0, delta_1)?;
        state_0 = match regime {
            SearchRegime::Continuation => {
                info!("  arc-length continuation step");
                let next = path.duplicate(state_0);
                path.predict_tangential(next, PredictorStrategy::ArcLength)?;
                path.solve_equilibrium(next, &continuation_solver)?;
                next
            }
            SearchRegime::Bisection => {
                info!("  bisecting towards the critical point");
                bisect(path, state_0, &options.solver)?
            }
            SearchRegime::ExtremumSearch => {
                info!("  searching for a local extremum of det(K)");
                find_extremum(path, state_0, &options.solver)?
            }
        };

        // refresh the three-state window from the chain
        state_1 = path.previous(state_0)?;
        let state_2 = path.previous(state_1)?;
        let det_2 = ensure_determinant(path, state_2)?;
        det_1 = ensure_determinant(path, state_1)?;
        det_0 = ensure_determinant(path, state_0)?;
        delta_1 = det_1 - det_2;
        delta_0 = det_0 - det_1;
    }

    warn!("no critical point found within {step} bracketing steps");
    Err(BucklingError::NoCriticalPointFound {
        last_state: state_0,
        steps: step,
    })
}

pub(crate) fn ensure_determinant<P: EquilibriumPath + ?Sized>(
    path: &mut P,
    state: StateId,
) -> BucklingResult<f64> {
    match path.determinant(state) {
        Some(det) => Ok(det),
        None => path.solve_determinant(state),
    }
}
