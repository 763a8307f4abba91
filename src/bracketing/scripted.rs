//! Scripted equilibrium path for controller-level tests
//!
//! A one-unknown stand-in for the truss path: states carry a single
//! displacement `u` and a load factor, and "solving" evaluates a prescribed
//! determinant function det = f(u). This keeps the bracketing properties
//! testable without paying for real nonlinear solves.

use crate::analysis::{PredictorStrategy, SolveOptions};
use crate::error::{BucklingError, BucklingResult};
use crate::path::{EquilibriumPath, StateId};

struct ScriptedState {
    u: f64,
    lam: f64,
    det: Option<f64>,
    predecessor: Option<StateId>,
    node_ids: Vec<String>,
}

pub struct ScriptedPath {
    det_fn: Box<dyn Fn(f64) -> f64>,
    states: Vec<ScriptedState>,
}

impl ScriptedPath {
    /// Path with a root state at u = 0, lam = 0
    pub fn new(det_fn: impl Fn(f64) -> f64 + 'static) -> Self {
        Self {
            det_fn: Box::new(det_fn),
            states: vec![ScriptedState {
                u: 0.0,
                lam: 0.0,
                det: None,
                predecessor: None,
                node_ids: vec!["N".to_string()],
            }],
        }
    }

    /// Append a state chained to the most recent one
    pub fn push_state(&mut self, u: f64, lam: f64) -> StateId {
        let predecessor = Some(self.states.len() - 1);
        self.states.push(ScriptedState {
            u,
            lam,
            det: None,
            predecessor,
            node_ids: vec!["N".to_string()],
        });
        self.states.len() - 1
    }

    pub fn u(&self, state: StateId) -> f64 {
        self.states[state].u
    }

    /// Override the node ids of a state (for mismatch tests)
    pub fn set_node_ids(&mut self, state: StateId, ids: Vec<String>) {
        self.states[state].node_ids = ids;
    }

    fn previous_increment(&self, state: StateId) -> BucklingResult<(f64, f64)> {
        let prev = self.previous(state)?;
        let prev2 = self.previous(prev)?;
        Ok((
            self.states[prev].u - self.states[prev2].u,
            self.states[prev].lam - self.states[prev2].lam,
        ))
    }
}

impl EquilibriumPath for ScriptedPath {
    fn previous(&self, state: StateId) -> BucklingResult<StateId> {
        self.states[state]
            .predecessor
            .ok_or(BucklingError::MissingPredecessor(state))
    }

    fn duplicate(&mut self, state: StateId) -> StateId {
        self.states.push(ScriptedState {
            u: self.states[state].u,
            lam: self.states[state].lam,
            det: None,
            predecessor: Some(state),
            node_ids: self.states[state].node_ids.clone(),
        });
        self.states.len() - 1
    }

    fn determinant(&self, state: StateId) -> Option<f64> {
        self.states[state].det
    }

    fn solve_determinant(&mut self, state: StateId) -> BucklingResult<f64> {
        let det = (self.det_fn)(self.states[state].u);
        self.states[state].det = Some(det);
        Ok(det)
    }

    fn load_factor(&self, state: StateId) -> f64 {
        self.states[state].lam
    }

    fn set_load_factor(&mut self, state: StateId, lam: f64) {
        self.states[state].lam = lam;
        self.states[state].det = None;
    }

    fn node_ids(&self, state: StateId) -> Vec<String> {
        self.states[state].node_ids.clone()
    }

    fn displacement(&self, state: StateId, node: &str) -> BucklingResult<[f64; 3]> {
        if !self.states[state].node_ids.iter().any(|id| id == node) {
            return Err(BucklingError::NodeNotFound(node.to_string()));
        }
        Ok([self.states[state].u, 0.0, 0.0])
    }

    fn set_displacement(
        &mut self,
        state: StateId,
        node: &str,
        value: [f64; 3],
    ) -> BucklingResult<()> {
        if !self.states[state].node_ids.iter().any(|id| id == node) {
            return Err(BucklingError::NodeNotFound(node.to_string()));
        }
        self.states[state].u = value[0];
        self.states[state].det = None;
        Ok(())
    }

    fn predict_tangential(
        &mut self,
        state: StateId,
        strategy: PredictorStrategy,
    ) -> BucklingResult<()> {
        match strategy {
            PredictorStrategy::ArcLength => {
                let (du, dlam) = self.previous_increment(state)?;
                self.states[state].u += du;
                self.states[state].lam += dlam;
            }
            PredictorStrategy::LoadControl => {
                let (_, dlam) = self.previous_increment(state)?;
                self.states[state].lam += dlam;
            }
            PredictorStrategy::Lambda(value) => {
                self.states[state].lam = value;
            }
        }
        self.states[state].det = None;
        Ok(())
    }

    fn scale_prediction(&mut self, state: StateId, factor: f64) -> BucklingResult<()> {
        let prev = self.previous(state)?;
        let u_prev = self.states[prev].u;
        let lam_prev = self.states[prev].lam;
        let s = &mut self.states[state];
        s.u = u_prev + (s.u - u_prev) * factor;
        s.lam = lam_prev + (s.lam - lam_prev) * factor;
        s.det = None;
        Ok(())
    }

    fn solve_equilibrium(&mut self, state: StateId, _options: &SolveOptions) -> BucklingResult<()> {
        // the scripted path is always "in equilibrium"; just evaluate det
        self.solve_determinant(state)?;
        Ok(())
    }

    fn increment_norm(&self, state: StateId) -> BucklingResult<f64> {
        let prev = self.previous(state)?;
        Ok((self.states[state].u - self.states[prev].u).abs())
    }

    fn set_predecessor(&mut self, state: StateId, predecessor: StateId) {
        self.states[state].predecessor = Some(predecessor);
    }
}
