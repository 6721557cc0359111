//! Configuration types for scenes

use tracing::debug;

/// Configuration for a [`Scene`](crate::core::entity::Scene)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneConfig {
    /// Attach a default `Transform` to every node the scene creates
    pub implicit_transform: bool,
    /// Pretty print JSON produced by `Scene::to_json_string`
    pub pretty_json: bool,
}

impl SceneConfig {
    /// Create a new SceneConfig with custom settings
    pub fn new(implicit_transform: bool, pretty_json: bool) -> Self {
        debug!(
            implicit_transform = implicit_transform,
            pretty_json = pretty_json,
            "Creating new SceneConfig"
        );
        Self {
            implicit_transform,
            pretty_json,
        }
    }

    pub fn with_implicit_transform(mut self, implicit_transform: bool) -> Self {
        self.implicit_transform = implicit_transform;
        self
    }

    pub fn with_pretty_json(mut self, pretty_json: bool) -> Self {
        self.pretty_json = pretty_json;
        self
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            implicit_transform: true,
            pretty_json: true,
        }
    }
}
