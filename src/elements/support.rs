//! Support conditions

use serde::{Deserialize, Serialize};

/// Support conditions at a node (translational restraints)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Support {
    /// Restrained in X translation
    pub x: bool,
    /// Restrained in Y translation
    pub y: bool,
    /// Restrained in Z translation
    pub z: bool,
}

impl Support {
    /// Create a new support with the given restraint flags
    pub fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }

    /// Fully restrained node
    pub fn xyz() -> Self {
        Self::new(true, true, true)
    }

    /// Restrained in Z only (free to move in the XY plane)
    pub fn z() -> Self {
        Self::new(false, false, true)
    }

    /// Free node
    pub fn free() -> Self {
        Self::default()
    }

    /// The restraint flags in DOF order [x, y, z]
    pub fn restraints(&self) -> [bool; 3] {
        [self.x, self.y, self.z]
    }
}
