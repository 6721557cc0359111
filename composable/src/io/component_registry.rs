//! Component registry for dynamic component deserialization

use crate::component_system::{Component, ComponentType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A function that builds a default instance of a component type
pub type ComponentFactoryFn = Arc<dyn Fn() -> Box<dyn Component> + Send + Sync>;

/// Registry mapping serialized type names to component factories
///
/// Deserialization only restores components whose type name has a factory
/// here. The core registers `Transform` in [`ComponentRegistry::with_default_components`];
/// every other component type must be registered by the embedding
/// application, otherwise its payload is dropped when a scene is loaded.
#[derive(Default, Clone)]
pub struct ComponentRegistry {
    /// Maps component type names to their factory functions
    factories: HashMap<String, ComponentFactoryFn>,
}

impl ComponentRegistry {
    /// Create a new empty component registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a component type through its [`ComponentType`] impl
    pub fn register<T: ComponentType>(&mut self) {
        T::register(self);
    }

    /// Register a factory under an explicit type name
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register_factory<F>(&mut self, type_name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Component> + Send + Sync + 'static,
    {
        self.factories
            .insert(type_name.to_string(), Arc::new(factory));
        debug!(type_name = type_name, "Registered component factory");
    }

    /// Build a default instance of the named component type
    ///
    /// Returns `None` when no factory is registered under `type_name`.
    pub fn create(&self, type_name: &str) -> Option<Box<dyn Component>> {
        self.factories.get(type_name).map(|factory| factory())
    }

    /// Check if a component type is registered
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Get all registered component type names
    pub fn registered_types(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|s| s.as_str())
    }

    /// Get the number of registered component types
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Create a registry with the built-in components registered
    pub fn with_default_components() -> Self {
        use crate::core::entity::components::Transform;

        let mut registry = Self::new();
        registry.register::<Transform>();

        debug!(
            component_count = registry.len(),
            "Created registry with default components"
        );

        registry
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field(
                "registered_types",
                &self.factories.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
