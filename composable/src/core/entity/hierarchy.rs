//! Hierarchy rewiring, active propagation and world transform resolution

use super::components::{Transform, TransformValues};
use super::node::{Node, NodeId};
use super::scene::Scene;
use glam::Vec3;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors from operations that change the shape of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// The handle does not refer to a node in this scene
    #[error("node {0:?} not found in scene")]
    NodeNotFound(NodeId),
    /// A node was asked to become its own parent
    #[error("node {0:?} cannot be its own parent")]
    SelfParent(NodeId),
    /// The new parent is a descendant of the child
    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    Cycle { child: NodeId, parent: NodeId },
}

impl Scene {
    /// Move `child` under `parent`
    ///
    /// The child leaves its old parent (or the root set) and is appended to
    /// `parent`'s children. Its local transform is then replaced by the world
    /// transform it had before the move. Re-parenting under the current parent
    /// is a no-op.
    ///
    /// # Errors
    /// Fails without changing anything if either node is missing, if
    /// `child == parent`, or if `parent` is a descendant of `child`.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) -> Result<(), HierarchyError> {
        if child == parent {
            return Err(HierarchyError::SelfParent(child));
        }
        let current = self
            .nodes
            .get(child)
            .ok_or(HierarchyError::NodeNotFound(child))?
            .parent;
        if !self.nodes.contains_key(parent) {
            return Err(HierarchyError::NodeNotFound(parent));
        }
        if current == Some(parent) {
            return Ok(());
        }
        if self.is_ancestor(child, parent) {
            return Err(HierarchyError::Cycle { child, parent });
        }

        let world = self.world_transform(child);
        self.unlink(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);

        if let Some(world) = world {
            self.modify_transform(child, |transform| transform.set_local(world));
        }

        debug!(child = ?child, parent = ?parent, "Set parent");
        Ok(())
    }

    /// Detach `child` from its parent and make it a root
    ///
    /// The local transform is kept as is, so the world placement changes to
    /// the local one. A node without a parent is left alone.
    ///
    /// # Errors
    /// [`HierarchyError::NodeNotFound`] if `child` is not in this scene.
    pub fn remove_parent(&mut self, child: NodeId) -> Result<(), HierarchyError> {
        let node = self
            .nodes
            .get(child)
            .ok_or(HierarchyError::NodeNotFound(child))?;
        if node.parent.is_none() {
            return Ok(());
        }

        self.unlink(child);
        self.roots.push(child);
        if let Some(transform) = self.nodes[child].transform_mut() {
            transform.mark_dirty();
        }

        debug!(child = ?child, "Removed parent");
        Ok(())
    }

    /// Detach `id` from its parent's children or from the root set
    fn unlink(&mut self, id: NodeId) {
        match self.nodes[id].parent.take() {
            Some(parent) => {
                if let Some(parent) = self.nodes.get_mut(parent) {
                    parent.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
    }

    /// Whether `ancestor` is `node` or lies on the path from `node` to its root
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(Node::parent);
        }
        false
    }

    /// Set the active flag on `id` and every descendant
    ///
    /// Does nothing when `id` already has that flag. Otherwise every
    /// descendant is forced to `active`, whatever its own flag was.
    ///
    /// # Errors
    /// [`HierarchyError::NodeNotFound`] if `id` is not in this scene.
    pub fn set_active(&mut self, id: NodeId, active: bool) -> Result<(), HierarchyError> {
        let node = self.nodes.get(id).ok_or(HierarchyError::NodeNotFound(id))?;
        if node.is_active() == active {
            return Ok(());
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                node.set_active_flag(active);
                stack.extend(node.children.iter().copied());
            }
        }

        debug!(node = ?id, active = active, "Set active");
        Ok(())
    }

    /// Mutate the transform of `id` and dirty its direct children
    ///
    /// Returns `None` if the node is missing or has no transform.
    pub fn modify_transform<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut Transform) -> R,
    ) -> Option<R> {
        let result = f(self.nodes.get_mut(id)?.transform_mut()?);
        self.mark_children_dirty(id);
        Some(result)
    }

    fn mark_children_dirty(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        for child in node.children.clone() {
            if let Some(transform) = self.nodes.get_mut(child).and_then(Node::transform_mut) {
                transform.mark_dirty();
            }
        }
    }

    /// Returns `false` if the node has no transform
    pub fn set_local_position(&mut self, id: NodeId, position: Vec3) -> bool {
        self.modify_transform(id, |t| t.set_local_position(position))
            .is_some()
    }

    /// Returns `false` if the node has no transform
    pub fn set_local_rotation(&mut self, id: NodeId, rotation: Vec3) -> bool {
        self.modify_transform(id, |t| t.set_local_rotation(rotation))
            .is_some()
    }

    /// Returns `false` if the node has no transform
    pub fn set_local_scale(&mut self, id: NodeId, scale: Vec3) -> bool {
        self.modify_transform(id, |t| t.set_local_scale(scale)).is_some()
    }

    pub fn translate_local(&mut self, id: NodeId, delta: Vec3) -> bool {
        self.modify_transform(id, |t| t.translate_local(delta))
            .is_some()
    }

    pub fn rotate_local(&mut self, id: NodeId, delta: Vec3) -> bool {
        self.modify_transform(id, |t| t.rotate_local(delta)).is_some()
    }

    /// Resolve the world transform of `id`, refreshing stale caches on the way
    ///
    /// Walks up through ancestors carrying a transform, then recomputes top
    /// down every cache that is dirty or was composed against an older parent
    /// cache. Returns `None` if the node is missing or has no transform.
    pub fn world_transform(&mut self, id: NodeId) -> Option<TransformValues> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(node_id) else {
                break;
            };
            if node.transform().is_none() {
                break;
            }
            chain.push(node_id);
            current = node.parent;
        }

        let mut upstream: Option<(u64, TransformValues)> = None;
        for node_id in chain.into_iter().rev() {
            let needs_refresh = self.nodes[node_id]
                .transform()?
                .needs_refresh(upstream.map(|(stamp, _)| stamp));
            if needs_refresh {
                let stamp = self.next_stamp();
                let transform = self.nodes[node_id].transform_mut()?;
                transform.refresh(upstream, stamp);
                trace!(node = ?node_id, stamp = stamp, "Refreshed world transform");
            }
            let transform = self.nodes[node_id].transform()?;
            upstream = Some((transform.stamp(), transform.world_values()));
        }

        upstream.map(|(_, world)| world)
    }

    pub fn world_position(&mut self, id: NodeId) -> Option<Vec3> {
        self.world_transform(id).map(|world| world.position)
    }

    pub fn world_rotation(&mut self, id: NodeId) -> Option<Vec3> {
        self.world_transform(id).map(|world| world.rotation)
    }

    pub fn world_scale(&mut self, id: NodeId) -> Option<Vec3> {
        self.world_transform(id).map(|world| world.scale)
    }
}
