//! Builds a small scene, saves it to JSON and restores it into a fresh scene

use composable::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Component)]
#[component(name = "Velocity", update = "integrate")]
struct Velocity {
    linear: Vec3,
    #[serde(skip)]
    travelled: f32,
}

impl Velocity {
    fn integrate(&mut self, dt: f64) {
        self.travelled += self.linear.length() * dt as f32;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Component)]
#[component(name = "Label")]
struct Label {
    text: String,
}

fn build_scene(scene: &mut Scene) -> Result<(), HierarchyError> {
    let ship = scene.create_node("ship");
    scene.set_local_position(ship, Vec3::new(10.0, 0.0, 0.0));
    scene.set_local_scale(ship, Vec3::splat(2.0));
    if let Some(node) = scene.node_mut(ship) {
        node.add_component(Velocity {
            linear: Vec3::new(1.0, 0.0, 0.0),
            travelled: 0.0,
        });
        node.add_component(Label {
            text: "Flagship".to_string(),
        });
    }

    let turret = scene.create_child(ship, "turret")?;
    scene.set_local_position(turret, Vec3::new(0.0, 1.0, 0.0));
    scene.set_local_rotation(turret, Vec3::new(0.0, 90.0, 0.0));

    let barrel = scene.create_child(turret, "barrel")?;
    scene.set_local_position(barrel, Vec3::new(0.0, 0.0, 1.5));

    let decoy = scene.create_node("decoy");
    scene.set_active(decoy, false)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    composable::init_logging();

    let mut scene = Scene::new();
    build_scene(&mut scene)?;

    if let Some(barrel) = scene.find_node_by_name("barrel") {
        info!(position = ?scene.world_position(barrel), "Barrel world position");
    }

    let json = scene.to_json_string()?;
    println!("{json}");

    let mut registry = ComponentRegistry::with_default_components();
    registry.register::<Velocity>();
    registry.register::<Label>();

    scene.clear();
    scene.from_json_str(&json, &registry)?;
    info!(nodes = scene.len(), "Scene restored");

    for _ in 0..60 {
        scene.update(1.0 / 60.0);
    }

    scene.for_each_node(|node| {
        if let Some(velocity) = node.get_component::<Velocity>() {
            info!(node = node.name(), travelled = velocity.travelled, "Moved");
        }
    });

    if let Some(barrel) = scene.find_node_by_name("barrel") {
        info!(position = ?scene.world_position(barrel), "Barrel world position after reload");
    }

    Ok(())
}
