//! Extremum search on the determinant sequence
//!
//! Three consecutive determinant samples and their cumulative arc-length
//! positions pin down a unique quadratic; its stationary point estimates
//! where the local minimum or maximum of det(K) lies. Scaling the tangential
//! prediction by the estimated fraction aims the next solve directly at that
//! location - each sample costs a full nonlinear solve, so blind stepping is
//! not an option.

use log::warn;

use crate::analysis::{ControlStrategy, PredictorStrategy, SolveOptions};
use crate::error::{BucklingError, BucklingResult};
use crate::path::{EquilibriumPath, StateId};

/// Abscissa of the stationary point of the quadratic through three samples.
///
/// Uses the closed-form Lagrange coefficients; fails with
/// [`BucklingError::DegenerateBracket`] when any two abscissae coincide.
pub fn quadratic_vertex(x: [f64; 3], y: [f64; 3]) -> BucklingResult<f64> {
    let denom = (x[0] - x[1]) * (x[0] - x[2]) * (x[1] - x[2]);
    if denom == 0.0 {
        return Err(BucklingError::DegenerateBracket);
    }
    let a = (x[2] * (y[1] - y[0]) + x[1] * (y[0] - y[2]) + x[0] * (y[2] - y[1])) / denom;
    let b = (x[2] * x[2] * (y[0] - y[1])
        + x[1] * x[1] * (y[2] - y[0])
        + x[0] * x[0] * (y[1] - y[2]))
        / denom;
    Ok(-b / (2.0 * a))
}

/// Three-point search for a local extremum of det(K), with `state` as the
/// middle sample.
///
/// Generates a third sample by a tangential arc-length step, fits the
/// quadratic, and returns a new current state aimed at the estimated
/// stationary point: the fresh sample itself when the extremum is still
/// ahead, a scaled sub-step into whichever sub-interval contains it, or
/// `state` unchanged (with a warning) when the extremum has already been
/// passed.
pub fn find_extremum<P: EquilibriumPath + ?Sized>(
    path: &mut P,
    state: StateId,
    solver: &SolveOptions,
) -> BucklingResult<StateId> {
    let middle = state;
    let previous = path.previous(middle)?;

    let options = SolveOptions {
        strategy: ControlStrategy::ArcLengthControl,
        solve_determinant: true,
        solve_attendant_eigenvalue: true,
        ..solver.clone()
    };

    let probe = path.duplicate(middle);
    path.predict_tangential(probe, PredictorStrategy::ArcLength)?;
    path.solve_equilibrium(probe, &options)?;

    let x1 = 0.0;
    let x2 = path.increment_norm(middle)?;
    let x3 = x2 + path.increment_norm(probe)?;
    let y1 = path
        .determinant(previous)
        .ok_or(BucklingError::MissingDeterminant(previous))?;
    let y2 = path
        .determinant(middle)
        .ok_or(BucklingError::MissingDeterminant(middle))?;
    let y3 = path
        .determinant(probe)
        .ok_or(BucklingError::MissingDeterminant(probe))?;

    let xv = quadratic_vertex([x1, x2, x3], [y1, y2, y3])?;

    if xv >= x3 {
        // extremum not reached yet, continue the search from the new sample
        Ok(probe)
    } else if xv >= x2 {
        // extremum between the middle and the new sample
        let aimed = path.duplicate(middle);
        path.predict_tangential(aimed, PredictorStrategy::ArcLength)?;
        path.scale_prediction(aimed, (xv - x2) / (x3 - x2))?;
        path.solve_equilibrium(aimed, &options)?;
        Ok(aimed)
    } else if xv >= x1 {
        // extremum between the previous and the middle sample
        let aimed = path.duplicate(previous);
        path.predict_tangential(aimed, PredictorStrategy::ArcLength)?;
        path.scale_prediction(aimed, xv / x2)?;
        path.solve_equilibrium(aimed, &options)?;
        Ok(aimed)
    } else {
        warn!("local extremum of det(K) has already been passed");
        Ok(middle)
    }
}
