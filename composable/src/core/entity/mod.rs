//! Scene graph: nodes, components and the scene that owns them
//!
//! Nodes live in an arena owned by [`Scene`] and refer to each other through
//! [`NodeId`] handles. Removing a node removes its whole subtree.

pub mod components;
pub mod hierarchy;
pub mod node;
pub mod scene;

// Re-export commonly used types
pub use components::{Transform, TransformValues};
pub use hierarchy::HierarchyError;
pub use node::{Node, NodeId};
pub use scene::{Scene, SceneLifecycle};
