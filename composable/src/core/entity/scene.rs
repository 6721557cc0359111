//! Scene container owning the node arena and the root set

use super::components::Transform;
use super::hierarchy::HierarchyError;
use super::node::{Node, NodeId};
use crate::config::SceneConfig;
use slotmap::SlotMap;
use tracing::debug;

/// Hooks fired when a scene's contents are loaded or unloaded
///
/// Both default to no-ops. `on_unload` runs before [`Scene::clear`] and
/// before [`Scene::deserialize_with`](crate::core::entity::Scene::deserialize_with)
/// swaps in new contents; `on_load` runs once the new contents are in place.
pub trait SceneLifecycle: Send + Sync {
    fn on_load(&mut self, _scene: &mut Scene) {}

    fn on_unload(&mut self, _scene: &mut Scene) {}
}

/// Owner of every node and of the ordered set of root nodes
pub struct Scene {
    pub(crate) nodes: SlotMap<NodeId, Node>,
    pub(crate) roots: Vec<NodeId>,
    config: SceneConfig,
    /// Last stamp handed to a transform cache refresh
    pub(crate) last_stamp: u64,
    lifecycle: Option<Box<dyn SceneLifecycle>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a new empty scene with the default configuration
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    pub fn with_config(config: SceneConfig) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            config,
            last_stamp: 0,
            lifecycle: None,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Install the load/unload hooks, returning the previous ones
    pub fn set_lifecycle(
        &mut self,
        lifecycle: impl SceneLifecycle + 'static,
    ) -> Option<Box<dyn SceneLifecycle>> {
        self.lifecycle.replace(Box::new(lifecycle))
    }

    pub fn take_lifecycle(&mut self) -> Option<Box<dyn SceneLifecycle>> {
        self.lifecycle.take()
    }

    /// Run the `on_load` hook, if any
    pub fn notify_loaded(&mut self) {
        if let Some(mut lifecycle) = self.lifecycle.take() {
            debug!(node_count = self.nodes.len(), "Scene loaded");
            lifecycle.on_load(self);
            if self.lifecycle.is_none() {
                self.lifecycle = Some(lifecycle);
            }
        }
    }

    /// Run the `on_unload` hook, if any
    pub fn notify_unloading(&mut self) {
        if let Some(mut lifecycle) = self.lifecycle.take() {
            debug!(node_count = self.nodes.len(), "Scene unloading");
            lifecycle.on_unload(self);
            if self.lifecycle.is_none() {
                self.lifecycle = Some(lifecycle);
            }
        }
    }

    /// Swap in the nodes of `other`, keeping this scene's config and hooks
    pub(crate) fn replace_contents(&mut self, other: Scene) {
        self.nodes = other.nodes;
        self.roots = other.roots;
        self.last_stamp = self.last_stamp.max(other.last_stamp);
    }

    /// Create a new root node
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.spawn(name.into());
        self.roots.push(id);
        debug!(node = ?id, "Created root node");
        id
    }

    /// Create a node parented to `parent`
    ///
    /// # Errors
    /// [`HierarchyError::NodeNotFound`] if `parent` is not in this scene.
    pub fn create_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, HierarchyError> {
        if !self.nodes.contains_key(parent) {
            return Err(HierarchyError::NodeNotFound(parent));
        }
        let id = self.spawn(name.into());
        self.nodes[id].parent = Some(parent);
        self.nodes[parent].children.push(id);
        debug!(node = ?id, parent = ?parent, "Created child node");
        Ok(id)
    }

    /// Node factory: allocate the node, then attach the implicit transform
    fn spawn(&mut self, name: String) -> NodeId {
        let id = self.nodes.insert_with_key(|id| Node::new(id, name));
        if self.config.implicit_transform {
            self.nodes[id].add_component(Transform::default());
        }
        id
    }

    /// Allocate a node that is neither a root nor anyone's child yet
    pub(crate) fn spawn_detached(&mut self, name: String) -> NodeId {
        self.spawn(name)
    }

    /// Remove `id` and its whole subtree from the scene
    ///
    /// Returns the number of nodes removed, 0 if `id` was not in the scene.
    pub fn remove_node(&mut self, id: NodeId) -> usize {
        let Some(node) = self.nodes.get(id) else {
            return 0;
        };
        let parent = node.parent;

        self.roots.retain(|root| *root != id);
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(parent)) {
            parent.children.retain(|child| *child != id);
        }

        let removed = self.remove_subtree(id);
        debug!(node = ?id, removed = removed, "Removed node subtree");
        removed
    }

    /// Remove `id` and its descendants from the arena, descendants first
    pub(crate) fn remove_subtree(&mut self, id: NodeId) -> usize {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                order.push(current);
                stack.extend(node.children.iter().copied());
            }
        }

        // every node comes after its ancestors in `order`
        order
            .into_iter()
            .rev()
            .filter(|node| self.nodes.remove(*node).is_some())
            .count()
    }

    /// Every node reachable from the root set, in pre-order
    ///
    /// Roots are visited in order, each followed depth-first by its
    /// descendants. The list is collected before it is returned, so it does not
    /// reflect later changes to the tree.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut result = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            result.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        result
    }

    /// Call `f` on every node in pre-order
    pub fn for_each_node<F: FnMut(&Node)>(&self, mut f: F) {
        for id in self.node_ids() {
            if let Some(node) = self.nodes.get(id) {
                f(node);
            }
        }
    }

    /// Call `f` on every node in pre-order, with mutable access
    ///
    /// The traversal order is fixed before the first call.
    pub fn for_each_node_mut<F: FnMut(&mut Node)>(&mut self, mut f: F) {
        for id in self.node_ids() {
            if let Some(node) = self.nodes.get_mut(id) {
                f(node);
            }
        }
    }

    /// First node named `name` in traversal order
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.node_ids()
            .into_iter()
            .find(|id| self.nodes[*id].name() == name)
    }

    /// Dispatch `update(dt)` to every component of every active node
    ///
    /// Only the node's own flag is checked; an active node under an inactive
    /// parent is still updated.
    pub fn update(&mut self, dt: f64) {
        for id in self.node_ids() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if !node.is_active() {
                continue;
            }
            for component in node.components_mut() {
                component.update(dt);
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Root nodes in insertion order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.roots.contains(&id)
    }

    /// Number of nodes in the scene
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove every node, running the `on_unload` hook first
    pub fn clear(&mut self) {
        self.notify_unloading();
        self.nodes.clear();
        self.roots.clear();
    }

    pub(crate) fn next_stamp(&mut self) -> u64 {
        self.last_stamp += 1;
        self.last_stamp
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("node_count", &self.nodes.len())
            .field("roots", &self.roots)
            .field("config", &self.config)
            .field("has_lifecycle", &self.lifecycle.is_some())
            .finish()
    }
}
