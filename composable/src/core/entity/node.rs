//! Scene nodes and their per-type component store

use super::components::Transform;
use crate::component_system::Component;
use slotmap::new_key_type;
use std::any::TypeId;
use std::collections::HashMap;
use tracing::debug;

new_key_type! {
    /// Stable handle to a node inside a [`Scene`](super::Scene)
    pub struct NodeId;
}

/// Tree element owning at most one component per concrete type
///
/// Nodes live in the scene's arena. Parent and child links are [`NodeId`]s;
/// operations that walk or rewire the tree (`set_parent`, `set_active`, ...)
/// are on [`Scene`](super::Scene).
pub struct Node {
    id: NodeId,
    name: String,
    active: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    components: HashMap<TypeId, Box<dyn Component>>,
}

impl Node {
    /// Create a bare node with no components
    pub(crate) fn new(id: NodeId, name: String) -> Self {
        Self {
            id,
            name,
            active: true,
            parent: None,
            children: Vec::new(),
            components: HashMap::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Set only this node's flag; [`Scene::set_active`](super::Scene::set_active) propagates
    pub(crate) fn set_active_flag(&mut self, active: bool) {
        self.active = active;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Attach `component`, replacing any existing component of the same type
    ///
    /// The replaced instance is dropped without `on_detach` being called; use
    /// [`Node::remove_component`] first when its detach hook matters.
    pub fn add_component<T: Component>(&mut self, component: T) -> &mut T {
        let type_id = TypeId::of::<T>();
        self.insert_boxed(type_id, Box::new(component));
        self.components
            .get_mut(&type_id)
            .and_then(|component| component.downcast_mut::<T>())
            .expect("component was inserted under its own TypeId")
    }

    /// Attach an already boxed component, returning the instance it replaced
    ///
    /// Used for instances built by a [`ComponentRegistry`](crate::io::ComponentRegistry).
    pub fn add_boxed_component(
        &mut self,
        component: Box<dyn Component>,
    ) -> Option<Box<dyn Component>> {
        let type_id = component.as_any().type_id();
        self.insert_boxed(type_id, component)
    }

    fn insert_boxed(
        &mut self,
        type_id: TypeId,
        mut component: Box<dyn Component>,
    ) -> Option<Box<dyn Component>> {
        component.on_attach(self.id);
        debug!(
            node = ?self.id,
            component = component.type_name(),
            "Attached component"
        );
        self.components.insert(type_id, component)
    }

    /// Detach and return the `T` component, if present
    pub fn remove_component<T: Component>(&mut self) -> Option<Box<dyn Component>> {
        let mut component = self.components.remove(&TypeId::of::<T>())?;
        component.on_detach();
        debug!(
            node = ?self.id,
            component = component.type_name(),
            "Detached component"
        );
        Some(component)
    }

    pub fn has_component<T: Component>(&self) -> bool {
        self.components.contains_key(&TypeId::of::<T>())
    }

    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.components
            .get(&TypeId::of::<T>())
            .and_then(|component| component.downcast_ref::<T>())
    }

    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .get_mut(&TypeId::of::<T>())
            .and_then(|component| component.downcast_mut::<T>())
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.get_component::<Transform>()
    }

    /// Mutable transform access
    ///
    /// Changes made here only dirty this transform. Reads through
    /// [`Scene::world_transform`](super::Scene::world_transform) still see
    /// them on every descendant.
    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        self.get_component_mut::<Transform>()
    }

    /// Attached components, in no particular order
    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.values().map(|component| component.as_ref())
    }

    pub(crate) fn components_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Component>> {
        self.components.values_mut()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Drop every component except the transform, without detach hooks
    pub(crate) fn retain_only_transform(&mut self) {
        let transform_id = TypeId::of::<Transform>();
        self.components.retain(|type_id, _| *type_id == transform_id);
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.active)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field(
                "components",
                &self.components().map(|c| c.type_name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
