//! Scene serialization and loading

use super::component_registry::ComponentRegistry;
use crate::component_system::{Component, ComponentError, ComponentType};
use crate::core::entity::{HierarchyError, NodeId, Scene, Transform};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Serialized form of a whole scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedScene {
    /// Root nodes in scene order, each carrying its subtree
    #[serde(rename = "rootNodes")]
    pub root_nodes: Vec<SerializedNode>,
}

/// A single serialized node with its components and children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub name: String,
    pub active: bool,
    /// Components tagged with their type names
    pub components: Vec<SerializedComponent>,
    pub children: Vec<SerializedNode>,
}

impl Drop for SerializedNode {
    // unlink descendants first so a deep chain drops without recursion
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// One component payload tagged with its type name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedComponent {
    #[serde(rename = "type")]
    pub type_name: String,
    pub data: serde_json::Value,
}

/// Errors that can occur during scene operations
#[derive(Debug, Error)]
pub enum SceneError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A component failed to convert itself to or from its payload
    #[error("component `{type_name}` failed: {source}")]
    Component {
        type_name: String,
        #[source]
        source: ComponentError,
    },
    /// Tree operation failed
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    /// Node not found in the scene
    #[error("node {0:?} not found in scene")]
    NodeNotFound(NodeId),
}

impl SceneError {
    fn component(type_name: &str, source: ComponentError) -> Self {
        SceneError::Component {
            type_name: type_name.to_string(),
            source,
        }
    }
}

impl Scene {
    /// Serialize `id` and its subtree
    ///
    /// Components are written sorted by type name so the output is stable.
    pub fn serialize_node(&self, id: NodeId) -> Result<SerializedNode, SceneError> {
        if !self.contains(id) {
            return Err(SceneError::NodeNotFound(id));
        }

        // pre-order, each entry paired with the index of its parent entry
        let mut order: Vec<(NodeId, Option<usize>)> = Vec::new();
        let mut stack = vec![(id, None)];
        while let Some((current, parent)) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            let index = order.len();
            order.push((current, parent));
            stack.extend(node.children().iter().rev().map(|child| (*child, Some(index))));
        }

        let mut built = order
            .iter()
            .map(|(node_id, _)| self.serialize_shallow(*node_id).map(Some))
            .collect::<Result<Vec<_>, _>>()?;

        // children are complete before their parent is reached, but arrive
        // last sibling first
        for index in (1..order.len()).rev() {
            let (_, Some(parent)) = order[index] else {
                continue;
            };
            if let Some(mut node) = built[index].take() {
                node.children.reverse();
                if let Some(parent_node) = built[parent].as_mut() {
                    parent_node.children.push(node);
                }
            }
        }

        let mut root = built
            .into_iter()
            .next()
            .flatten()
            .ok_or(SceneError::NodeNotFound(id))?;
        root.children.reverse();
        Ok(root)
    }

    /// Serialize one node without its children
    fn serialize_shallow(&self, id: NodeId) -> Result<SerializedNode, SceneError> {
        let node = self.node(id).ok_or(SceneError::NodeNotFound(id))?;

        let mut components = node
            .components()
            .map(|component| {
                let type_name = component.type_name();
                let data = component
                    .serialize()
                    .map_err(|e| SceneError::component(type_name, e))?;
                Ok(SerializedComponent {
                    type_name: type_name.to_string(),
                    data,
                })
            })
            .collect::<Result<Vec<_>, SceneError>>()?;
        components.sort_by(|a, b| a.type_name.cmp(&b.type_name));

        Ok(SerializedNode {
            name: node.name().to_string(),
            active: node.is_active(),
            components,
            children: Vec::new(),
        })
    }

    /// Serialize every root node and its subtree
    pub fn serialize(&self) -> Result<SerializedScene, SceneError> {
        let root_nodes = self
            .roots()
            .iter()
            .map(|root| self.serialize_node(*root))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            root_count = root_nodes.len(),
            node_count = self.len(),
            "Serialized scene"
        );
        Ok(SerializedScene { root_nodes })
    }

    /// Restore `id` and rebuild its subtree from `data`
    ///
    /// Every component except the transform is discarded first. A `Transform`
    /// entry is loaded into the node's existing transform; other entries are
    /// built through `registry`, and names it does not know are dropped with a
    /// warning. Existing children are removed and replaced by the serialized
    /// ones.
    ///
    /// # Errors
    /// Fails on the first component payload that does not deserialize. The
    /// node may then be partially restored.
    pub fn deserialize_node(
        &mut self,
        id: NodeId,
        data: &SerializedNode,
        registry: &ComponentRegistry,
    ) -> Result<(), SceneError> {
        let node = self.node_mut(id).ok_or(SceneError::NodeNotFound(id))?;
        let old_children = std::mem::take(&mut node.children);
        for child in old_children {
            self.remove_subtree(child);
        }

        let mut pending = vec![(id, data)];
        let mut restored = 0;
        while let Some((node_id, node_data)) = pending.pop() {
            self.restore_node(node_id, node_data, registry)?;
            restored += 1;

            for child_data in &node_data.children {
                let child = self.spawn_detached(child_data.name.clone());
                self.nodes[child].parent = Some(node_id);
                self.nodes[node_id].children.push(child);
                pending.push((child, child_data));
            }
        }

        debug!(node = ?id, restored = restored, "Deserialized node subtree");
        Ok(())
    }

    /// Restore the name, flag and components of a single node
    fn restore_node(
        &mut self,
        id: NodeId,
        data: &SerializedNode,
        registry: &ComponentRegistry,
    ) -> Result<(), SceneError> {
        let node = self.node_mut(id).ok_or(SceneError::NodeNotFound(id))?;
        node.set_name(data.name.clone());
        node.set_active_flag(data.active);
        node.retain_only_transform();

        for entry in &data.components {
            if entry.type_name == Transform::component_name() {
                if let Some(transform) = node.transform_mut() {
                    transform
                        .deserialize(&entry.data)
                        .map_err(|e| SceneError::component(&entry.type_name, e))?;
                    continue;
                }
            }

            let Some(mut component) = registry.create(&entry.type_name) else {
                warn!(
                    node = ?id,
                    component_type = %entry.type_name,
                    "Unknown component type in scene, skipping"
                );
                continue;
            };
            component
                .deserialize(&entry.data)
                .map_err(|e| SceneError::component(&entry.type_name, e))?;
            node.add_boxed_component(component);
        }
        Ok(())
    }

    /// Replace the scene's contents, restoring only built-in components
    pub fn deserialize(&mut self, data: &SerializedScene) -> Result<(), SceneError> {
        self.deserialize_with(data, &ComponentRegistry::with_default_components())
    }

    /// Replace the scene's contents, building components through `registry`
    ///
    /// The new tree is built separately and swapped in only once every node
    /// loaded, so on error the scene is left untouched. The scene's
    /// [`SceneLifecycle`](crate::core::entity::SceneLifecycle) sees
    /// `on_unload` with the old contents and `on_load` with the new ones.
    pub fn deserialize_with(
        &mut self,
        data: &SerializedScene,
        registry: &ComponentRegistry,
    ) -> Result<(), SceneError> {
        info!(root_count = data.root_nodes.len(), "Deserializing scene");

        let mut fresh = Scene::with_config(self.config().clone());
        for node_data in &data.root_nodes {
            let id = fresh.create_node(node_data.name.clone());
            fresh.deserialize_node(id, node_data, registry)?;
        }
        self.notify_unloading();
        self.replace_contents(fresh);
        self.notify_loaded();

        info!(node_count = self.len(), "Scene deserialization complete");
        Ok(())
    }

    /// Serialize to a `{ "rootNodes": [...] }` JSON value
    pub fn to_json(&self) -> Result<serde_json::Value, SceneError> {
        Ok(serde_json::to_value(self.serialize()?)?)
    }

    /// Serialize to a JSON string, pretty printed if the config asks for it
    pub fn to_json_string(&self) -> Result<String, SceneError> {
        let data = self.serialize()?;
        let json = if self.config().pretty_json {
            serde_json::to_string_pretty(&data)?
        } else {
            serde_json::to_string(&data)?
        };
        Ok(json)
    }

    /// Replace the scene's contents from a JSON value
    pub fn from_json(
        &mut self,
        value: &serde_json::Value,
        registry: &ComponentRegistry,
    ) -> Result<(), SceneError> {
        let data = SerializedScene::deserialize(value)?;
        self.deserialize_with(&data, registry)
    }

    /// Replace the scene's contents from a JSON string
    ///
    /// Nesting depth is not limited, so any scene written by
    /// [`Scene::to_json_string`] loads back.
    pub fn from_json_str(
        &mut self,
        json: &str,
        registry: &ComponentRegistry,
    ) -> Result<(), SceneError> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        deserializer.disable_recursion_limit();
        let data =
            SerializedScene::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
        deserializer.end()?;
        self.deserialize_with(&data, registry)
    }
}
