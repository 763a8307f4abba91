//! Truss model - structure definition container
//!
//! The model describes the structure only (geometry, supports, reference
//! loads, elements). Solved configurations live on the equilibrium path, see
//! [`crate::path::TrussPath`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::elements::{Node, Support, Truss};
use crate::error::{BucklingError, BucklingResult};

/// A 3D truss model
///
/// Nodes, supports and loads are keyed by string ids. The reference load
/// vector assembled from the node loads is scaled by the load factor of an
/// equilibrium state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    /// Nodes in the model
    pub nodes: BTreeMap<String, Node>,
    /// Support conditions at nodes
    pub supports: BTreeMap<String, Support>,
    /// Reference point loads (fx, fy, fz) at nodes
    pub loads: BTreeMap<String, [f64; 3]>,
    /// Truss elements
    pub trusses: BTreeMap<String, Truss>,
}

impl Model {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a node to the model
    pub fn add_node(&mut self, name: &str, node: Node) -> BucklingResult<()> {
        if self.nodes.contains_key(name) {
            return Err(BucklingError::DuplicateName(name.to_string()));
        }
        self.nodes.insert(name.to_string(), node);
        Ok(())
    }

    /// Add a support condition at a node
    pub fn add_support(&mut self, name: &str, support: Support) -> BucklingResult<()> {
        if !self.nodes.contains_key(name) {
            return Err(BucklingError::NodeNotFound(name.to_string()));
        }
        self.supports.insert(name.to_string(), support);
        Ok(())
    }

    /// Add a reference point load (fx, fy, fz) at a node
    pub fn add_node_load(&mut self, name: &str, load: [f64; 3]) -> BucklingResult<()> {
        if !self.nodes.contains_key(name) {
            return Err(BucklingError::NodeNotFound(name.to_string()));
        }
        let entry = self.loads.entry(name.to_string()).or_insert([0.0; 3]);
        for i in 0..3 {
            entry[i] += load[i];
        }
        Ok(())
    }

    /// Add a truss element to the model
    pub fn add_truss(&mut self, name: &str, truss: Truss) -> BucklingResult<()> {
        if !self.nodes.contains_key(&truss.node_a) {
            return Err(BucklingError::NodeNotFound(truss.node_a.clone()));
        }
        if !self.nodes.contains_key(&truss.node_b) {
            return Err(BucklingError::NodeNotFound(truss.node_b.clone()));
        }
        if self.trusses.contains_key(name) {
            return Err(BucklingError::DuplicateName(name.to_string()));
        }
        if truss.youngs_modulus <= 0.0 || truss.area <= 0.0 {
            return Err(BucklingError::InvalidInput(format!(
                "Truss '{}' needs positive stiffness properties",
                name
            )));
        }
        self.trusses.insert(name.to_string(), truss);
        Ok(())
    }

    // ========================
    // Queries
    // ========================

    /// Number of translational DOFs (3 per node)
    pub fn dof_count(&self) -> usize {
        self.nodes.len() * 3
    }

    /// Node ids in DOF order (sorted, so assembly is deterministic)
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    /// Indices of the free (unrestrained) DOFs
    pub fn free_dofs(&self) -> Vec<usize> {
        let mut free = Vec::with_capacity(self.dof_count());
        for (i, name) in self.nodes.keys().enumerate() {
            let restraints = self
                .supports
                .get(name)
                .map(|s| s.restraints())
                .unwrap_or([false; 3]);
            for (j, restrained) in restraints.iter().enumerate() {
                if !restrained {
                    free.push(i * 3 + j);
                }
            }
        }
        free
    }

    /// Assemble the reference load vector (scaled by lambda during a solve)
    pub fn reference_load_vector(&self) -> crate::math::Vec {
        let mut f = crate::math::Vec::zeros(self.dof_count());
        for (i, name) in self.nodes.keys().enumerate() {
            if let Some(load) = self.loads.get(name) {
                for j in 0..3 {
                    f[i * 3 + j] = load[j];
                }
            }
        }
        f
    }

    // ========================
    // Serialization
    // ========================

    /// Serialize the model to JSON
    pub fn to_json(&self) -> BucklingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a model from JSON
    pub fn from_json(json: &str) -> BucklingResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
