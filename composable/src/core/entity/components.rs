//! Built-in components for scene nodes

use super::node::NodeId;
use crate::component_system::{Component, ComponentResult, ComponentType};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Serializes `Vec3` as `{ "x": .., "y": .., "z": .. }`
mod vec3_xyz {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xyz {
        x: f32,
        y: f32,
        z: f32,
    }

    pub fn serialize<S: Serializer>(v: &Vec3, serializer: S) -> Result<S::Ok, S::Error> {
        Xyz {
            x: v.x,
            y: v.y,
            z: v.z,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec3, D::Error> {
        let Xyz { x, y, z } = Xyz::deserialize(deserializer)?;
        Ok(Vec3::new(x, y, z))
    }
}

/// Position, rotation and scale triple, in either local or world space
///
/// Rotation is a per-axis angle triple; it composes additively rather than as
/// a quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformValues {
    #[serde(with = "vec3_xyz")]
    pub position: Vec3,
    #[serde(with = "vec3_xyz")]
    pub rotation: Vec3,
    #[serde(with = "vec3_xyz")]
    pub scale: Vec3,
}

impl Default for TransformValues {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl TransformValues {
    /// Express `self` (local values) in the space `parent` (world values) lives in
    pub fn compose(&self, parent: &TransformValues) -> TransformValues {
        TransformValues {
            position: parent.position + self.position * parent.scale,
            rotation: parent.rotation + self.rotation,
            scale: parent.scale * self.scale,
        }
    }
}

/// Transform component with a lazily refreshed world-space cache
///
/// Local setters only mark this transform dirty. World values are resolved
/// through [`Scene::world_transform`](super::Scene::world_transform), which
/// needs the hierarchy and therefore lives on the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    owner: Option<NodeId>,
    dirty: bool,
    world: TransformValues,
    /// Scene-unique stamp of the current world cache
    stamp: u64,
    /// Stamp of the parent cache `world` was composed against
    parent_stamp: Option<u64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, Vec3::ONE)
    }
}

impl Transform {
    /// Create a transform from local position, rotation and scale
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            owner: None,
            dirty: true,
            world: TransformValues::default(),
            stamp: 0,
            parent_stamp: None,
        }
    }

    /// Create a new transform with the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Set the rotation of the transform
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.set_local_rotation(rotation);
        self
    }

    /// Set the scale of the transform
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.set_local_scale(scale);
        self
    }

    pub fn local_position(&self) -> Vec3 {
        self.position
    }

    pub fn local_rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn local_scale(&self) -> Vec3 {
        self.scale
    }

    /// Snapshot of the local values
    pub fn local(&self) -> TransformValues {
        TransformValues {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    pub fn set_local_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    pub fn set_local_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.dirty = true;
    }

    pub fn set_local_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    /// Replace all three local values at once
    pub fn set_local(&mut self, values: TransformValues) {
        self.position = values.position;
        self.rotation = values.rotation;
        self.scale = values.scale;
        self.dirty = true;
    }

    pub fn translate_local(&mut self, delta: Vec3) {
        self.set_local_position(self.position + delta);
    }

    pub fn rotate_local(&mut self, delta: Vec3) {
        self.set_local_rotation(self.rotation + delta);
    }

    /// Force the next world read to recompute
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Node this transform is attached to, if any
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// World values from the last resolve, or `None` when this transform is dirty
    ///
    /// A clean cache can still lag behind a changed ancestor; use
    /// [`Scene::world_transform`](super::Scene::world_transform) for a
    /// guaranteed fresh read.
    pub fn cached_world(&self) -> Option<TransformValues> {
        (!self.dirty).then_some(self.world)
    }

    pub(crate) fn stamp(&self) -> u64 {
        self.stamp
    }

    pub(crate) fn world_values(&self) -> TransformValues {
        self.world
    }

    /// Whether the cache must be rebuilt against a parent cache stamped `parent_stamp`
    pub(crate) fn needs_refresh(&self, parent_stamp: Option<u64>) -> bool {
        self.dirty || self.parent_stamp != parent_stamp
    }

    /// Rebuild the world cache from the parent's world values
    pub(crate) fn refresh(&mut self, parent: Option<(u64, TransformValues)>, stamp: u64) {
        let local = self.local();
        self.world = match parent {
            Some((_, parent_world)) => local.compose(&parent_world),
            None => local,
        };
        self.parent_stamp = parent.map(|(parent_stamp, _)| parent_stamp);
        self.stamp = stamp;
        self.dirty = false;
    }
}

impl Component for Transform {
    fn type_name(&self) -> &'static str {
        Self::component_name()
    }

    fn on_attach(&mut self, owner: NodeId) {
        self.owner = Some(owner);
        self.dirty = true;
    }

    fn on_detach(&mut self) {
        // a detached transform keeps its last placement as its local one
        self.world = self.local();
        self.owner = None;
        self.parent_stamp = None;
        self.dirty = false;
    }

    fn serialize(&self) -> ComponentResult<serde_json::Value> {
        Ok(serde_json::to_value(self.local())?)
    }

    fn deserialize(&mut self, data: &serde_json::Value) -> ComponentResult<()> {
        let values: TransformValues = serde_json::from_value(data.clone())?;
        self.set_local(values);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ComponentType for Transform {
    fn component_name() -> &'static str {
        "Transform"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_default() {
        let transform = Transform::default();
        assert_eq!(transform.local_position(), Vec3::ZERO);
        assert_eq!(transform.local_rotation(), Vec3::ZERO);
        assert_eq!(transform.local_scale(), Vec3::ONE);
        assert!(transform.is_dirty());
        assert!(transform.cached_world().is_none());
    }

    #[test]
    fn test_compose_position_rotation_scale() {
        let parent = TransformValues {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.0, 0.5, 0.0),
            scale: Vec3::new(2.0, 2.0, 1.0),
        };
        let local = TransformValues {
            position: Vec3::new(1.0, 1.0, 1.0),
            rotation: Vec3::new(0.0, 0.25, 1.0),
            scale: Vec3::new(0.5, 3.0, 1.0),
        };

        let world = local.compose(&parent);
        assert_eq!(world.position, Vec3::new(3.0, 4.0, 4.0));
        assert_eq!(world.rotation, Vec3::new(0.0, 0.75, 1.0));
        assert_eq!(world.scale, Vec3::new(1.0, 6.0, 1.0));
    }

    #[test]
    fn test_refresh_without_parent_copies_local() {
        let mut transform = Transform::from_position(Vec3::new(4.0, 5.0, 6.0));
        transform.refresh(None, 1);

        assert!(!transform.is_dirty());
        assert_eq!(transform.cached_world(), Some(transform.local()));
        assert!(!transform.needs_refresh(None));
        assert!(transform.needs_refresh(Some(3)));
    }

    #[test]
    fn test_local_mutation_marks_dirty() {
        let mut transform = Transform::default();
        transform.refresh(None, 1);

        transform.translate_local(Vec3::X);
        assert!(transform.is_dirty());
        assert_eq!(transform.local_position(), Vec3::X);

        transform.refresh(None, 2);
        transform.rotate_local(Vec3::Z);
        assert!(transform.is_dirty());
        assert_eq!(transform.local_rotation(), Vec3::Z);
    }

    #[test]
    fn test_on_detach_collapses_world_to_local() {
        let mut transform = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        transform.on_attach(NodeId::default());
        transform.refresh(
            Some((
                7,
                TransformValues {
                    position: Vec3::new(10.0, 0.0, 0.0),
                    ..Default::default()
                },
            )),
            8,
        );
        assert_eq!(transform.world_values().position, Vec3::new(11.0, 0.0, 0.0));

        transform.on_detach();
        assert!(transform.owner().is_none());
        assert_eq!(transform.cached_world(), Some(transform.local()));
    }

    #[test]
    fn test_transform_payload_shape() {
        let transform = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 90.0, 0.0),
            Vec3::splat(2.0),
        );

        let json = Component::serialize(&transform).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "position": { "x": 1.0, "y": 2.0, "z": 3.0 },
                "rotation": { "x": 0.0, "y": 90.0, "z": 0.0 },
                "scale": { "x": 2.0, "y": 2.0, "z": 2.0 },
            })
        );

        let mut restored = Transform::default();
        restored.deserialize(&json).unwrap();
        assert_eq!(restored.local(), transform.local());
        assert!(restored.is_dirty());
    }

    #[test]
    fn test_transform_payload_missing_field_is_error() {
        let mut transform = Transform::default();
        let result = transform.deserialize(&serde_json::json!({
            "position": { "x": 1.0, "y": 2.0, "z": 3.0 },
            "scale": { "x": 1.0, "y": 1.0, "z": 1.0 },
        }));
        assert!(result.is_err());
    }
}
