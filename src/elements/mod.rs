//! Structural elements

pub mod node;
pub mod support;
pub mod truss;

pub use node::Node;
pub use support::Support;
pub use truss::Truss;
