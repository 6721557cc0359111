//! Scene serialization and the component registry used to load scenes

pub mod component_registry;
mod scene;

pub use component_registry::ComponentRegistry;
pub use scene::{SceneError, SerializedComponent, SerializedNode, SerializedScene};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component_system::{Component, ComponentResult, ComponentType};
    use crate::config::SceneConfig;
    use crate::core::entity::{NodeId, Scene, SceneLifecycle, Transform};
    use glam::Vec3;
    use serde::{Deserialize, Serialize};
    use std::any::Any;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Health {
        current: u32,
        max: u32,
    }

    impl Component for Health {
        fn type_name(&self) -> &'static str {
            "Health"
        }

        fn serialize(&self) -> ComponentResult<serde_json::Value> {
            Ok(serde_json::to_value(self)?)
        }

        fn deserialize(&mut self, data: &serde_json::Value) -> ComponentResult<()> {
            *self = serde_json::from_value(data.clone())?;
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl ComponentType for Health {
        fn component_name() -> &'static str {
            "Health"
        }
    }

    fn two_node_scene() -> Scene {
        let mut scene = Scene::new();
        let parent = scene.create_node("parent");
        let child = scene.create_child(parent, "child").unwrap();
        scene.set_local_position(parent, Vec3::new(1.0, 2.0, 3.0));
        scene.set_local_scale(parent, Vec3::splat(2.0));
        scene.set_local_position(child, Vec3::X);
        scene.set_local_rotation(child, Vec3::new(0.0, 45.0, 0.0));
        scene
    }

    #[test]
    fn test_scene_round_trip() {
        let mut scene = two_node_scene();
        let child = scene.find_node_by_name("child").unwrap();
        scene.set_active(child, false).unwrap();

        let data = scene.serialize().unwrap();
        let mut restored = Scene::new();
        restored.deserialize(&data).unwrap();

        assert_eq!(restored.len(), 2);
        let parent = restored.find_node_by_name("parent").unwrap();
        let child = restored.find_node_by_name("child").unwrap();
        assert_eq!(restored.roots(), &[parent]);
        assert_eq!(restored.node(child).unwrap().parent(), Some(parent));
        assert!(restored.node(parent).unwrap().is_active());
        assert!(!restored.node(child).unwrap().is_active());

        let transform = restored.node(child).unwrap().transform().unwrap();
        assert_eq!(transform.local_position(), Vec3::X);
        assert_eq!(transform.local_rotation(), Vec3::new(0.0, 45.0, 0.0));
        assert_eq!(
            restored.world_position(child),
            Some(Vec3::new(3.0, 2.0, 3.0))
        );

        assert_eq!(restored.serialize().unwrap(), data);
    }

    #[test]
    fn test_payload_shape() {
        let mut scene = Scene::new();
        scene.create_node("solo");

        let json = scene.to_json().unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "rootNodes": [{
                    "name": "solo",
                    "active": true,
                    "components": [{
                        "type": "Transform",
                        "data": {
                            "position": { "x": 0.0, "y": 0.0, "z": 0.0 },
                            "rotation": { "x": 0.0, "y": 0.0, "z": 0.0 },
                            "scale": { "x": 1.0, "y": 1.0, "z": 1.0 },
                        },
                    }],
                    "children": [],
                }]
            })
        );
    }

    #[test]
    fn test_unknown_component_is_dropped() {
        let json = serde_json::json!({
            "rootNodes": [{
                "name": "n",
                "active": true,
                "components": [
                    { "type": "Transform", "data": {
                        "position": { "x": 4.0, "y": 0.0, "z": 0.0 },
                        "rotation": { "x": 0.0, "y": 0.0, "z": 0.0 },
                        "scale": { "x": 1.0, "y": 1.0, "z": 1.0 }
                    }},
                    { "type": "UnknownComponent", "data": { "ignored": true } }
                ],
                "children": []
            }]
        });

        let mut scene = Scene::new();
        let result = scene.from_json(&json, &ComponentRegistry::with_default_components());
        assert!(result.is_ok());

        let id = scene.find_node_by_name("n").unwrap();
        let node = scene.node(id).unwrap();
        assert_eq!(node.component_count(), 1);
        assert_eq!(
            node.transform().unwrap().local_position(),
            Vec3::new(4.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_registered_component_survives_round_trip() {
        let mut scene = Scene::new();
        let id = scene.create_node("hero");
        scene.node_mut(id).unwrap().add_component(Health {
            current: 7,
            max: 10,
        });
        let data = scene.serialize().unwrap();

        let mut dropped = Scene::new();
        dropped.deserialize(&data).unwrap();
        let hero = dropped.find_node_by_name("hero").unwrap();
        assert!(!dropped.node(hero).unwrap().has_component::<Health>());

        let mut registry = ComponentRegistry::with_default_components();
        registry.register::<Health>();
        let mut restored = Scene::new();
        restored.deserialize_with(&data, &registry).unwrap();
        let hero = restored.find_node_by_name("hero").unwrap();
        assert_eq!(
            restored.node(hero).unwrap().get_component::<Health>(),
            Some(&Health {
                current: 7,
                max: 10
            })
        );
    }

    #[test]
    fn test_empty_scene() {
        let mut scene = Scene::new();
        scene
            .from_json_str(r#"{"rootNodes": []}"#, &ComponentRegistry::new())
            .unwrap();
        assert!(scene.is_empty());
        assert_eq!(scene.serialize().unwrap(), SerializedScene::default());
    }

    #[test]
    fn test_deserialize_replaces_existing_roots() {
        let mut scene = Scene::new();
        scene.create_node("old");

        let data = two_node_scene().serialize().unwrap();
        scene.deserialize(&data).unwrap();

        assert!(scene.find_node_by_name("old").is_none());
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_malformed_payload_leaves_scene_untouched() {
        let mut scene = two_node_scene();
        let before = scene.serialize().unwrap();

        // second root lacks "active"
        let json = r#"{"rootNodes": [
            {"name": "ok", "active": true, "components": [], "children": []},
            {"name": "broken", "components": [], "children": []}
        ]}"#;
        let result = scene.from_json_str(json, &ComponentRegistry::new());
        assert!(matches!(result, Err(SceneError::Json(_))));
        assert_eq!(scene.serialize().unwrap(), before);
    }

    #[test]
    fn test_bad_component_payload_is_error() {
        let json = serde_json::json!({
            "rootNodes": [{
                "name": "n",
                "active": true,
                "components": [{ "type": "Transform", "data": { "position": 3 } }],
                "children": []
            }]
        });

        let mut scene = Scene::new();
        let result = scene.from_json(&json, &ComponentRegistry::with_default_components());
        match result {
            Err(SceneError::Component { type_name, .. }) => assert_eq!(type_name, "Transform"),
            other => panic!("expected component error, got {other:?}"),
        }
        assert!(scene.is_empty());
    }

    #[test]
    fn test_deserialize_node_rebuilds_children() {
        let mut scene = two_node_scene();
        let parent = scene.find_node_by_name("parent").unwrap();
        let old_child = scene.find_node_by_name("child").unwrap();
        scene.node_mut(parent).unwrap().add_component(Health::default());

        let data = SerializedNode {
            name: "renamed".to_string(),
            active: true,
            components: vec![],
            children: vec![SerializedNode {
                name: "fresh".to_string(),
                active: true,
                components: vec![],
                children: vec![],
            }],
        };
        scene
            .deserialize_node(parent, &data, &ComponentRegistry::new())
            .unwrap();

        let node = scene.node(parent).unwrap();
        assert_eq!(node.name(), "renamed");
        assert!(node.has_component::<Transform>());
        assert!(!node.has_component::<Health>());
        assert!(!scene.contains(old_child));

        let fresh = scene.find_node_by_name("fresh").unwrap();
        assert_eq!(scene.node(parent).unwrap().children(), &[fresh]);
        assert_eq!(scene.node(fresh).unwrap().parent(), Some(parent));
    }

    #[test]
    fn test_transform_restored_without_implicit_transform() {
        let data = two_node_scene().serialize().unwrap();

        let mut scene = Scene::with_config(SceneConfig::default().with_implicit_transform(false));
        scene.deserialize(&data).unwrap();
        let child = scene.find_node_by_name("child").unwrap();
        assert_eq!(
            scene.node(child).unwrap().transform().unwrap().local_position(),
            Vec3::X
        );

        let mut bare = Scene::with_config(SceneConfig::default().with_implicit_transform(false));
        bare.deserialize_with(&data, &ComponentRegistry::new()).unwrap();
        let child = bare.find_node_by_name("child").unwrap();
        assert!(bare.node(child).unwrap().transform().is_none());
    }

    fn chain(scene: &mut Scene, depth: usize) -> NodeId {
        let mut leaf = scene.create_node("n0");
        for i in 1..depth {
            leaf = scene.create_child(leaf, format!("n{i}")).unwrap();
            scene.set_local_position(leaf, Vec3::X);
        }
        leaf
    }

    fn depth_of(scene: &Scene, id: NodeId) -> usize {
        let mut depth = 1;
        let mut current = scene.node(id).unwrap().parent();
        while let Some(parent) = current {
            depth += 1;
            current = scene.node(parent).unwrap().parent();
        }
        depth
    }

    #[test]
    fn test_deep_chain_round_trips_through_json_string() {
        let mut scene = Scene::new();
        chain(&mut scene, 100);
        let json = scene.to_json_string().unwrap();

        let mut restored = Scene::new();
        restored
            .from_json_str(&json, &ComponentRegistry::with_default_components())
            .unwrap();

        assert_eq!(restored.len(), 100);
        let leaf = restored.find_node_by_name("n99").unwrap();
        assert_eq!(depth_of(&restored, leaf), 100);
        assert_eq!(restored.world_position(leaf), Some(Vec3::new(99.0, 0.0, 0.0)));
        assert_eq!(restored.to_json_string().unwrap(), json);
    }

    #[test]
    fn test_deep_chain_serialize_and_deserialize() {
        let mut scene = Scene::new();
        let leaf = chain(&mut scene, 20_000);
        scene.create_node("second_root");

        let data = scene.serialize().unwrap();
        assert_eq!(data.root_nodes.len(), 2);

        let mut restored = Scene::new();
        restored.deserialize(&data).unwrap();
        assert_eq!(restored.len(), 20_001);
        let restored_leaf = restored.find_node_by_name("n19999").unwrap();
        assert_eq!(depth_of(&restored, restored_leaf), 20_000);
        assert_eq!(
            restored.node(restored_leaf).unwrap().transform().unwrap().local_position(),
            Vec3::X
        );
        assert_eq!(restored.roots().len(), 2);

        let subtree = scene.serialize_node(scene.roots()[0]).unwrap();
        let root = restored.roots()[0];
        restored.deserialize_node(root, &subtree, &ComponentRegistry::new()).unwrap();
        assert_eq!(restored.len(), 20_001);
        assert_eq!(
            restored.node(root).unwrap().children().len(),
            scene.node(scene.roots()[0]).unwrap().children().len()
        );
        assert_eq!(scene.node(leaf).unwrap().name(), "n19999");
    }

    #[test]
    fn test_serialize_node_keeps_child_order() {
        let mut scene = Scene::new();
        let root = scene.create_node("root");
        let a = scene.create_child(root, "a").unwrap();
        scene.create_child(a, "a1").unwrap();
        scene.create_child(a, "a2").unwrap();
        scene.create_child(root, "b").unwrap();
        scene.create_child(root, "c").unwrap();

        let data = scene.serialize_node(root).unwrap();
        let names: Vec<_> = data.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        let names: Vec<_> = data.children[0]
            .children
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["a1", "a2"]);
        assert!(data.children[1].children.is_empty());
    }

    #[derive(Default)]
    struct LoadLog {
        events: std::sync::Arc<std::sync::Mutex<Vec<(&'static str, usize)>>>,
    }

    impl SceneLifecycle for LoadLog {
        fn on_load(&mut self, scene: &mut Scene) {
            self.events.lock().unwrap().push(("load", scene.len()));
        }

        fn on_unload(&mut self, scene: &mut Scene) {
            self.events.lock().unwrap().push(("unload", scene.len()));
        }
    }

    #[test]
    fn test_deserialize_runs_lifecycle_hooks() {
        let data = two_node_scene().serialize().unwrap();
        let log = LoadLog::default();
        let events = log.events.clone();

        let mut scene = Scene::new();
        scene.create_node("old");
        scene.set_lifecycle(log);
        scene.deserialize(&data).unwrap();
        assert_eq!(*events.lock().unwrap(), vec![("unload", 1), ("load", 2)]);

        // a failed load leaves the scene and hooks alone
        let result = scene.from_json_str(r#"{"rootNodes": [{"name": "x"}]}"#, &ComponentRegistry::new());
        assert!(result.is_err());
        assert_eq!(events.lock().unwrap().len(), 2);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_json_string_respects_pretty_flag() {
        let mut compact = Scene::with_config(SceneConfig::default().with_pretty_json(false));
        compact.create_node("a");
        let json = compact.to_json_string().unwrap();
        assert!(!json.contains('\n'));

        let mut pretty = Scene::new();
        pretty.create_node("a");
        assert!(pretty.to_json_string().unwrap().contains('\n'));

        let mut restored = Scene::new();
        restored
            .from_json_str(&json, &ComponentRegistry::with_default_components())
            .unwrap();
        assert!(restored.find_node_by_name("a").is_some());
    }
}
