//! Equilibrium path - solved states and the capability trait
//!
//! States are stored arena-style: a path owns a flat list of
//! [`EquilibriumState`]s and the predecessor link is an index into that list.
//! That keeps the backward-only history a plain singly-linked chain while
//! letting the bisection step rewire a predecessor without fighting over
//! ownership.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{PredictorStrategy, SolveOptions};
use crate::error::{BucklingError, BucklingResult};
use crate::math::Vec as DVec;
use crate::model::Model;

/// Index of a state in its path arena
pub type StateId = usize;

/// One solved configuration of the structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquilibriumState {
    /// Nodal displacements in DOF order (3 per node, fixed DOFs included)
    pub d: DVec,
    /// Load factor
    pub lam: f64,
    /// Determinant of the tangent stiffness on the free DOFs, if evaluated
    pub det_k: Option<f64>,
    /// Eigenvalue of smallest magnitude of the free tangent block, if evaluated
    pub attendant_eigenvalue: Option<f64>,
    /// Mode shape of the attendant eigenvalue (full DOF vector)
    pub attendant_mode: Option<DVec>,
    /// Predecessor state on the path
    pub predecessor: Option<StateId>,
}

/// The capability set the bracketing search needs from an equilibrium path.
///
/// The search itself never assembles matrices or iterates correctors; it
/// drives these operations and inspects their results. [`TrussPath`] is the
/// production implementation; tests may substitute a scripted one.
pub trait EquilibriumPath {
    /// Predecessor of a state, failing if the state is the start of the path
    fn previous(&self, state: StateId) -> BucklingResult<StateId>;

    /// Deep-copy a state; the copy's predecessor is the source state
    fn duplicate(&mut self, state: StateId) -> StateId;

    /// Determinant of the tangent stiffness, if already evaluated
    fn determinant(&self, state: StateId) -> Option<f64>;

    /// Evaluate and store det(K) for the state
    fn solve_determinant(&mut self, state: StateId) -> BucklingResult<f64>;

    /// Load factor of a state
    fn load_factor(&self, state: StateId) -> f64;

    /// Overwrite the load factor of a state
    fn set_load_factor(&mut self, state: StateId, lam: f64);

    /// Node ids present in a state
    fn node_ids(&self, state: StateId) -> Vec<String>;

    /// Displacement components (u, v, w) of a node in a state
    fn displacement(&self, state: StateId, node: &str) -> BucklingResult<[f64; 3]>;

    /// Overwrite the displacement components of a node in a state
    fn set_displacement(
        &mut self,
        state: StateId,
        node: &str,
        value: [f64; 3],
    ) -> BucklingResult<()>;

    /// Advance the state's unknowns by a tangential predictor
    fn predict_tangential(
        &mut self,
        state: StateId,
        strategy: PredictorStrategy,
    ) -> BucklingResult<()>;

    /// Rescale the state's current increment about its predecessor
    fn scale_prediction(&mut self, state: StateId, factor: f64) -> BucklingResult<()>;

    /// Run corrector iterations to equilibrium
    fn solve_equilibrium(&mut self, state: StateId, options: &SolveOptions) -> BucklingResult<()>;

    /// Euclidean norm of the displacement increment from the predecessor
    fn increment_norm(&self, state: StateId) -> BucklingResult<f64>;

    /// Rewire the predecessor link of a state (bracket narrowing)
    fn set_predecessor(&mut self, state: StateId, predecessor: StateId);
}

/// Equilibrium path of a truss model
///
/// Owns the model and the arena of solved states. State 0 is the undeformed
/// configuration at `lam = 0`.
#[derive(Debug, Clone)]
pub struct TrussPath {
    pub(crate) model: Model,
    pub(crate) states: Vec<EquilibriumState>,
    pub(crate) free: Vec<usize>,
    pub(crate) f_hat: DVec,
    node_index: HashMap<String, usize>,
    node_order: Vec<String>,
}

impl TrussPath {
    /// Create a path for the model, with the undeformed state as its root
    pub fn new(model: Model) -> BucklingResult<Self> {
        if model.nodes.is_empty() {
            return Err(BucklingError::InvalidInput(
                "model has no nodes".to_string(),
            ));
        }
        let node_order = model.node_ids();
        let node_index = node_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let free = model.free_dofs();
        let f_hat = model.reference_load_vector();
        let root = EquilibriumState {
            d: DVec::zeros(model.dof_count()),
            lam: 0.0,
            det_k: None,
            attendant_eigenvalue: None,
            attendant_mode: None,
            predecessor: None,
        };
        Ok(Self {
            model,
            states: vec![root],
            free,
            f_hat,
            node_index,
            node_order,
        })
    }

    /// The undeformed root state
    pub fn root(&self) -> StateId {
        0
    }

    /// The most recently created state
    pub fn last(&self) -> StateId {
        self.states.len() - 1
    }

    /// Read access to a state
    pub fn state(&self, state: StateId) -> &EquilibriumState {
        &self.states[state]
    }

    /// The structure definition
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// DOF index of a node component (component 0 = u, 1 = v, 2 = w)
    pub fn dof(&self, node: &str, component: usize) -> BucklingResult<usize> {
        let index = self
            .node_index
            .get(node)
            .ok_or_else(|| BucklingError::NodeNotFound(node.to_string()))?;
        Ok(index * 3 + component)
    }

    /// History of (displacement, load factor) pairs for one node component,
    /// from the root up to and including the given state
    pub fn load_displacement_curve(
        &self,
        state: StateId,
        node: &str,
        component: usize,
    ) -> BucklingResult<Vec<(f64, f64)>> {
        let dof = self.dof(node, component)?;
        let mut curve = Vec::new();
        let mut current = Some(state);
        while let Some(id) = current {
            let s = &self.states[id];
            curve.push((s.d[dof], s.lam));
            current = s.predecessor;
        }
        curve.reverse();
        Ok(curve)
    }

    pub(crate) fn invalidate(&mut self, state: StateId) {
        let s = &mut self.states[state];
        s.det_k = None;
        s.attendant_eigenvalue = None;
        s.attendant_mode = None;
    }
}

impl EquilibriumPath for TrussPath {
    fn previous(&self, state: StateId) -> BucklingResult<StateId> {
        self.states[state]
            .predecessor
            .ok_or(BucklingError::MissingPredecessor(state))
    }

    fn duplicate(&mut self, state: StateId) -> StateId {
        let copy = EquilibriumState {
            d: self.states[state].d.clone(),
            lam: self.states[state].lam,
            det_k: None,
            attendant_eigenvalue: None,
            attendant_mode: None,
            predecessor: Some(state),
        };
        self.states.push(copy);
        self.last()
    }

    fn determinant(&self, state: StateId) -> Option<f64> {
        self.states[state].det_k
    }

    fn solve_determinant(&mut self, state: StateId) -> BucklingResult<f64> {
        self.compute_det_k(state)
    }

    fn load_factor(&self, state: StateId) -> f64 {
        self.states[state].lam
    }

    fn set_load_factor(&mut self, state: StateId, lam: f64) {
        self.states[state].lam = lam;
        self.invalidate(state);
    }

    fn node_ids(&self, _state: StateId) -> Vec<String> {
        self.node_order.clone()
    }

    fn displacement(&self, state: StateId, node: &str) -> BucklingResult<[f64; 3]> {
        let dof = self.dof(node, 0)?;
        let d = &self.states[state].d;
        Ok([d[dof], d[dof + 1], d[dof + 2]])
    }

    fn set_displacement(
        &mut self,
        state: StateId,
        node: &str,
        value: [f64; 3],
    ) -> BucklingResult<()> {
        let dof = self.dof(node, 0)?;
        let d = &mut self.states[state].d;
        d[dof] = value[0];
        d[dof + 1] = value[1];
        d[dof + 2] = value[2];
        self.invalidate(state);
        Ok(())
    }

    fn predict_tangential(
        &mut self,
        state: StateId,
        strategy: PredictorStrategy,
    ) -> BucklingResult<()> {
        self.apply_tangential_prediction(state, strategy)
    }

    fn scale_prediction(&mut self, state: StateId, factor: f64) -> BucklingResult<()> {
        let prev = self.previous(state)?;
        let d_prev = self.states[prev].d.clone();
        let lam_prev = self.states[prev].lam;
        let s = &mut self.states[state];
        s.d = &d_prev + (&s.d - &d_prev) * factor;
        s.lam = lam_prev + (s.lam - lam_prev) * factor;
        self.invalidate(state);
        Ok(())
    }

    fn solve_equilibrium(&mut self, state: StateId, options: &SolveOptions) -> BucklingResult<()> {
        self.run_corrector(state, options)
    }

    fn increment_norm(&self, state: StateId) -> BucklingResult<f64> {
        let prev = self.previous(state)?;
        Ok((&self.states[state].d - &self.states[prev].d).norm())
    }

    fn set_predecessor(&mut self, state: StateId, predecessor: StateId) {
        self.states[state].predecessor = Some(predecessor);
    }
}
