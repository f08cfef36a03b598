// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type tag to constructor registry.

use crate::error::ObjectError;
use crate::object::{AnimationObject, CameraObject, DummyObject, EntityObject, ReplayObject, SceneProperties};
use crate::scene::Scene;
use crate::snapshot::SerializedReplayObject;
use indexmap::IndexMap;

/// Builds a blank object for a scene
pub type ObjectFactory = fn(&Scene) -> AnimationObject;

/// Object constructors keyed by type tag.
///
/// Built once at startup and shared by the scenes that use it.
#[derive(Debug, Clone, Default)]
pub struct ObjectRegistry {
    factories: IndexMap<String, ObjectFactory>,
}

impl ObjectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in object type
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register(CameraObject::TYPE_TAG, |_| CameraObject::default().into());
        registry.register(EntityObject::TYPE_TAG, |_| EntityObject::default().into());
        registry.register(SceneProperties::TYPE_TAG, |scene| {
            SceneProperties::new(scene.config().default_length_ms).into()
        });
        registry.register(DummyObject::TYPE_TAG, |_| DummyObject::default().into());
        registry
    }

    /// Register a constructor, returning the one it replaced
    pub fn register(&mut self, tag: impl Into<String>, factory: ObjectFactory) -> Option<ObjectFactory> {
        let tag = tag.into();
        tracing::debug!(tag = %tag, "Registered object type");
        self.factories.insert(tag, factory)
    }

    /// Whether a tag has a constructor
    pub fn is_registered(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags in registration order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build a blank object for a tag
    pub fn create(&self, tag: Option<&str>, scene: &Scene) -> Result<AnimationObject, ObjectError> {
        let factory = tag
            .and_then(|tag| self.factories.get(tag))
            .ok_or_else(|| ObjectError::InvalidObjectType {
                tag: tag.map(str::to_owned),
            })?;
        Ok(factory(scene))
    }

    /// Build an object and load a snapshot into it
    pub fn instantiate(
        &self,
        snapshot: &SerializedReplayObject,
        scene: &Scene,
    ) -> Result<AnimationObject, ObjectError> {
        let mut object = self.create(Some(snapshot.type_tag()), scene)?;
        object.parse(snapshot)?;
        Ok(object)
    }
}
