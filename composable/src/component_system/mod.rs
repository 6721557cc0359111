//! Component contract shared by every per-node component
//!
//! A component is stored on a node as a `Box<dyn Component>` keyed by its
//! concrete [`TypeId`](std::any::TypeId). Its [`Component::type_name`] is the
//! discriminator written into serialized payloads, so it must be stable and
//! unique across every component type an application uses.

use crate::core::entity::NodeId;
use crate::io::component_registry::ComponentRegistry;
use std::any::Any;
use thiserror::Error;

/// Errors produced while a component converts itself to or from its payload
#[derive(Debug, Error)]
pub enum ComponentError {
    /// The payload did not match the component's JSON shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload parsed but carried values the component rejects
    #[error("invalid component data: {0}")]
    Invalid(String),
}

/// Result alias for component (de)serialization
pub type ComponentResult<T> = Result<T, ComponentError>;

/// Polymorphic unit of per-node data and behaviour
///
/// Lifecycle hooks default to no-ops. `on_attach` receives the owning node
/// exactly once per attach; `on_detach` runs when the component is removed
/// through [`Node::remove_component`](crate::core::entity::Node::remove_component).
pub trait Component: Any + Send + Sync {
    /// Stable name used as the serialized `"type"` tag
    fn type_name(&self) -> &'static str;

    /// Called after the component is bound to `owner`
    fn on_attach(&mut self, _owner: NodeId) {}

    /// Called before the component is unbound from its node
    fn on_detach(&mut self) {}

    /// Per-frame hook, dispatched by [`Scene::update`](crate::core::entity::Scene::update)
    fn update(&mut self, _dt: f64) {}

    /// Produce the `"data"` payload for this component
    fn serialize(&self) -> ComponentResult<serde_json::Value>;

    /// Populate this instance from a `"data"` payload
    fn deserialize(&mut self, data: &serde_json::Value) -> ComponentResult<()>;

    /// Upcast for typed access
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Static side of a component type: its name and how it registers itself
///
/// Implemented by `#[derive(Component)]`. The name returned here must match
/// [`Component::type_name`] for every instance.
pub trait ComponentType: Component + Default + Sized {
    /// Get the name of this component type
    fn component_name() -> &'static str;

    /// Register a default-instance factory for this type with the registry
    fn register(registry: &mut ComponentRegistry) {
        registry.register_factory(Self::component_name(), || Box::new(Self::default()));
    }
}

impl dyn Component {
    /// Downcast to a concrete component type
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably downcast to a concrete component type
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Check whether this component is a `T`
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("type_name", &self.type_name())
            .finish_non_exhaustive()
    }
}
