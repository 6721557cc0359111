//! Scene graph and component composition core
//!
//! This crate provides a tree of nodes, each holding at most one component of
//! each concrete type, with hierarchical transform propagation and JSON scene
//! serialization.

// lets `#[derive(Component)]` expand to `::composable::...` inside this crate too
extern crate self as composable;

pub mod component_system;
pub mod config;
pub mod core;
pub mod io;

pub use composable_derive::Component;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

// Re-export commonly used types
pub mod prelude {
    // Component contract
    pub use crate::component_system::{
        Component, ComponentError, ComponentResult, ComponentType,
    };
    pub use composable_derive::Component;

    // Scene graph types
    pub use crate::core::entity::{
        HierarchyError, Node, NodeId, Scene, SceneLifecycle, Transform, TransformValues,
    };

    // Math types
    pub use glam::Vec3;

    // IO types
    pub use crate::io::{ComponentRegistry, SceneError, SerializedNode, SerializedScene};

    // Config types
    pub use crate::config::SceneConfig;
}

/// Initialize logging for applications built on the scene graph
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
