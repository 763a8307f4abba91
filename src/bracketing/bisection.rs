//! Bisection refinement of a bracketed critical point
//!
//! Bisection works on the *sign* of det(K), not its magnitude: the
//! determinant is neither monotone nor smooth near a critical point. The
//! midpoint state interpolates nodal displacements and load factor linearly
//! and is then re-solved, because the determinant itself is not an
//! interpolable function of the displaced configuration.

use crate::analysis::{ControlStrategy, SolveOptions};
use crate::error::{BucklingError, BucklingResult};
use crate::path::{EquilibriumPath, StateId};

/// Narrow the bracket [predecessor of `state`, `state`], whose endpoint
/// determinants have opposite signs, around the critical point.
///
/// Returns the new current state: either the solved midpoint (when the root
/// lies in the lower half) or `state` itself with its predecessor rewired to
/// the midpoint (root in the upper half). Either way the bracket strictly
/// shrinks.
pub fn bisect<P: EquilibriumPath + ?Sized>(
    path: &mut P,
    state: StateId,
    solver: &SolveOptions,
) -> BucklingResult<StateId> {
    let lower = path.previous(state)?;
    let upper = state;
    let lower_det = path
        .determinant(lower)
        .ok_or(BucklingError::MissingDeterminant(lower))?;

    let mut lower_nodes = path.node_ids(lower);
    let mut upper_nodes = path.node_ids(upper);
    lower_nodes.sort();
    upper_nodes.sort();
    if lower_nodes != upper_nodes {
        return Err(BucklingError::NodeSetMismatch);
    }

    let trial = path.duplicate(lower);
    for node in &lower_nodes {
        let a = path.displacement(lower, node)?;
        let b = path.displacement(upper, node)?;
        path.set_displacement(
            trial,
            node,
            [
                (a[0] + b[0]) / 2.0,
                (a[1] + b[1]) / 2.0,
                (a[2] + b[2]) / 2.0,
            ],
        )?;
    }
    let lam = (path.load_factor(lower) + path.load_factor(upper)) / 2.0;
    path.set_load_factor(trial, lam);

    let options = SolveOptions {
        strategy: ControlStrategy::ArcLengthControl,
        solve_determinant: true,
        solve_attendant_eigenvalue: true,
        ..solver.clone()
    };
    path.solve_equilibrium(trial, &options)?;

    let trial_det = path
        .determinant(trial)
        .ok_or(BucklingError::MissingDeterminant(trial))?;

    if lower_det.signum() == trial_det.signum() {
        // root is in [trial, upper]: shrink the bracket from below
        path.set_predecessor(upper, trial);
        Ok(upper)
    } else {
        // root is in [lower, trial]: the midpoint becomes the new upper end
        Ok(trial)
    }
}
