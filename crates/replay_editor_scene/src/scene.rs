// SPDX-License-Identifier: MIT OR Apache-2.0
//! The scene aggregate: live objects, committed snapshots and history.

use crate::cache::SnapshotCache;
use crate::config::SceneConfig;
use crate::document::SceneDocument;
use crate::error::{ObjectError, Result, SceneError};
use crate::history::History;
use crate::ids::ObjectId;
use crate::object::{combined_transform, AnimationObject, SceneProperties};
use crate::operators::Operator;
use crate::registry::ObjectRegistry;
use crate::snapshot::SerializedReplayObject;
use crate::table::ObjectTable;
use glam::DMat4;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Receives errors raised while executing, undoing or redoing operators
pub type ErrorSink = Arc<dyn Fn(&SceneError) + Send + Sync>;

fn log_error(error: &SceneError) {
    tracing::error!(error = %error, "Scene operation failed");
}

/// Objects of one scene plus their committed state and undo history.
///
/// Every live object has a committed snapshot; both are added and removed
/// together.
pub struct Scene {
    objects: ObjectTable,
    saved: Arc<SnapshotCache>,
    history: History,
    registry: Arc<ObjectRegistry>,
    error_sink: ErrorSink,
    config: SceneConfig,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("objects", &self.objects)
            .field("saved", &self.saved)
            .field("history", &self.history)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with the built-in object types
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Create an empty scene with the built-in object types
    pub fn with_config(config: SceneConfig) -> Self {
        Self::with_registry(Arc::new(ObjectRegistry::with_builtin_types()), config)
    }

    /// Create an empty scene using a shared registry
    pub fn with_registry(registry: Arc<ObjectRegistry>, config: SceneConfig) -> Self {
        Self {
            objects: ObjectTable::new(),
            saved: Arc::new(SnapshotCache::new()),
            history: History::with_max_depth(config.max_history),
            registry,
            error_sink: Arc::new(log_error),
            config,
        }
    }

    /// Replace the error sink
    pub fn with_error_sink(mut self, sink: ErrorSink) -> Self {
        self.error_sink = sink;
        self
    }

    /// Replace the error sink
    pub fn set_error_sink(&mut self, sink: ErrorSink) {
        self.error_sink = sink;
    }

    /// Scene configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Object constructors used by this scene
    pub fn registry(&self) -> &Arc<ObjectRegistry> {
        &self.registry
    }

    /// Shared handle to the committed snapshots, readable from any thread
    pub fn snapshots(&self) -> Arc<SnapshotCache> {
        Arc::clone(&self.saved)
    }

    // ===== Objects =====

    /// Live object table
    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    /// Get a live object
    pub fn object(&self, id: &str) -> Option<&AnimationObject> {
        self.objects.get(id)
    }

    /// Get a mutable live object.
    ///
    /// Changes stay uncommitted until [`Scene::save_object`].
    pub fn object_mut(&mut self, id: &str) -> Option<&mut AnimationObject> {
        self.objects.get_mut(id)
    }

    /// Whether an object exists
    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains(id)
    }

    /// Object ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.ids()
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene has no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Add an object and commit its current state.
    ///
    /// Returns the object previously stored under `id`.
    pub fn add_object(&mut self, id: impl Into<ObjectId>, object: AnimationObject) -> Option<AnimationObject> {
        let id = id.into();
        if self.saved.remove(id.as_str()).is_some() {
            tracing::debug!(id = %id, "Evicted snapshot of replaced object");
        }
        let snapshot = Arc::new(object.save());
        tracing::info!(id = %id, tag = object.type_tag(), "Added object");
        let previous = self.objects.insert(id.clone(), object);
        self.saved.insert(id, snapshot);
        previous
    }

    /// Add an object unless the id is taken
    pub fn add_object_if_absent(&mut self, id: impl Into<ObjectId>, object: AnimationObject) -> bool {
        let id = id.into();
        if self.objects.contains(id.as_str()) {
            return false;
        }
        self.add_object(id, object);
        true
    }

    /// Build an object from the registry and add it.
    ///
    /// A fresh id is generated when `id` is `None`.
    pub fn create_object(&mut self, tag: &str, id: Option<ObjectId>) -> Result<ObjectId> {
        let id = id.unwrap_or_else(ObjectId::generate);
        if self.objects.contains(id.as_str()) {
            return Err(SceneError::DuplicateObject(id));
        }
        let object = self.registry.create(Some(tag), self)?;
        self.add_object(id.clone(), object);
        Ok(id)
    }

    /// Remove an object and its snapshot
    pub fn remove_object(&mut self, id: &str) -> Option<AnimationObject> {
        let object = self.objects.remove(id)?;
        self.saved.remove(id);
        tracing::info!(id = %id, "Removed object");
        Some(object)
    }

    /// Commit the live state of an object
    pub fn save_object(&mut self, id: &str) -> Result<Arc<SerializedReplayObject>> {
        let object = self
            .objects
            .get(id)
            .ok_or_else(|| SceneError::ObjectNotFound(id.into()))?;
        let snapshot = Arc::new(object.save());
        self.saved.insert(id.into(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Last committed snapshot of an object
    pub fn saved_object(&self, id: &str) -> Option<Arc<SerializedReplayObject>> {
        self.saved.get(id)
    }

    /// Reset the live object to its committed snapshot
    pub fn revert_object(&mut self, id: &str) -> Result<()> {
        let snapshot = self
            .saved
            .get(id)
            .ok_or_else(|| SceneError::ObjectNotFound(id.into()))?;
        let object = self
            .objects
            .get_mut(id)
            .ok_or_else(|| SceneError::ObjectNotFound(id.into()))?;

        if object.type_tag() == snapshot.type_tag() {
            object.parse(&snapshot)?;
        } else {
            // The snapshot belongs to a different kind of object
            let replacement = self.registry.instantiate(&snapshot, self)?;
            self.objects.insert(id.into(), replacement);
        }
        Ok(())
    }

    /// Commit a given snapshot and reset the live object to it
    pub fn restore_object(&mut self, id: &str, snapshot: Arc<SerializedReplayObject>) -> Result<()> {
        if !self.objects.contains(id) {
            return Err(SceneError::ObjectNotFound(id.into()));
        }
        self.saved.insert(id.into(), snapshot);
        self.revert_object(id)
    }

    /// Whether the live state differs from the committed snapshot
    pub fn has_uncommitted_changes(&self, id: &str) -> bool {
        match (self.objects.get(id), self.saved.get(id)) {
            (Some(object), Some(snapshot)) => object.save() != *snapshot,
            _ => false,
        }
    }

    /// Move an object to a new id.
    ///
    /// Children follow the rename; their committed parent link is updated
    /// without committing other pending edits.
    pub fn rename_object(&mut self, from: &str, to: ObjectId) -> Result<()> {
        if from == to.as_str() {
            return Ok(());
        }
        if from == ObjectId::SCENE_PROPERTIES || to.is_scene_properties() {
            return Err(SceneError::InvalidArgument(format!(
                "the {:?} id is reserved for scene properties",
                ObjectId::SCENE_PROPERTIES
            )));
        }
        if !self.objects.contains(from) {
            return Err(SceneError::ObjectNotFound(from.into()));
        }
        if self.objects.contains(to.as_str()) {
            return Err(SceneError::DuplicateObject(to));
        }

        let children = self.children_of(from);
        self.objects.rename(from, to.clone());
        self.saved.rename(from, to.clone());

        for child in &children {
            if let Some(transform) = self.objects.get_mut(child.as_str()).and_then(AnimationObject::as_transform_mut) {
                transform.set_parent(Some(to.clone()));
            }
        }
        for (child, snapshot) in self.saved.read_all() {
            if snapshot.attribute("parent").and_then(Value::as_str) == Some(from) {
                let relinked = snapshot.with_attribute("parent", Value::from(to.as_str()));
                self.saved.insert(child, Arc::new(relinked));
            }
        }

        tracing::info!(from = %from, to = %to, children = children.len(), "Renamed object");
        Ok(())
    }

    /// Objects whose parent is `id`
    pub fn children_of(&self, id: &str) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, object)| object.parent().is_some_and(|parent| parent.as_str() == id))
            .map(|(child, _)| child.clone())
            .collect()
    }

    /// Change the parent of a live object.
    ///
    /// Rejects self parenting, unknown or transform-less objects, and links
    /// that would close a cycle.
    pub fn set_parent(&mut self, child: &str, parent: Option<&str>) -> Result<()> {
        let object = self
            .objects
            .get(child)
            .ok_or_else(|| SceneError::ObjectNotFound(child.into()))?;
        if object.as_transform().is_none() {
            return Err(SceneError::InvalidArgument(format!("{child} has no transform")));
        }

        if let Some(parent) = parent {
            if parent == child {
                return Err(SceneError::InvalidArgument(format!("{child} cannot be its own parent")));
            }
            let target = self
                .objects
                .get(parent)
                .ok_or_else(|| SceneError::ObjectNotFound(parent.into()))?;
            if target.as_transform().is_none() {
                return Err(SceneError::InvalidArgument(format!("{parent} has no transform")));
            }
            if self.is_ancestor(child, parent) {
                return Err(SceneError::InvalidArgument(format!(
                    "parenting {child} to {parent} would create a cycle"
                )));
            }
        }

        if let Some(transform) = self.objects.get_mut(child).and_then(AnimationObject::as_transform_mut) {
            transform.set_parent(parent.map(ObjectId::new));
        }
        Ok(())
    }

    /// Whether `ancestor` is reachable from `id` by following parent links
    fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !visited.insert(id) {
                return false;
            }
            current = self.objects.get(id).and_then(AnimationObject::parent).map(ObjectId::as_str);
        }
        false
    }

    /// Local transform composed with the parent chain
    pub fn combined_transform(&self, id: &str) -> Option<DMat4> {
        combined_transform(&self.objects, id)
    }

    /// Push channel values sampled at `timestamp` into every object
    pub fn apply(&mut self, timestamp: f64) {
        for (_, object) in self.objects.iter_mut() {
            object.apply(timestamp);
        }
    }

    /// Scene properties, if they exist yet
    pub fn scene_properties(&self) -> Option<&SceneProperties> {
        match self.objects.get(ObjectId::SCENE_PROPERTIES) {
            Some(AnimationObject::SceneProperties(properties)) => Some(properties),
            _ => None,
        }
    }

    /// Scene properties, created with the configured length on first use
    pub fn scene_properties_mut(&mut self) -> Result<&mut SceneProperties> {
        if self.scene_properties().is_none() {
            let properties = SceneProperties::new(self.config.default_length_ms);
            if self.add_object(ObjectId::scene_properties(), properties.into()).is_some() {
                tracing::warn!("Replaced non-property object stored under the scene properties id");
            }
        }
        let Some(AnimationObject::SceneProperties(properties)) = self.objects.get_mut(ObjectId::SCENE_PROPERTIES) else {
            return Err(SceneError::ObjectNotFound(ObjectId::scene_properties()));
        };
        Ok(properties)
    }

    // ===== History =====

    /// Execute an operator and record it.
    ///
    /// Returns `false` when the operator had nothing to do or failed. A
    /// failure clears the whole history and is reported to the error sink.
    pub fn apply_operator(&mut self, mut operator: Box<dyn Operator>) -> bool {
        match operator.execute(self) {
            Ok(true) => {
                tracing::info!(op = operator.description(), "Executed operator");
                self.history.push(operator);
                true
            }
            Ok(false) => {
                tracing::debug!(op = operator.description(), "Operator had nothing to do");
                false
            }
            Err(error) => {
                self.fail(error);
                false
            }
        }
    }

    /// Undo the last operator
    pub fn undo(&mut self) -> bool {
        let Some(mut operator) = self.history.pop_undo() else {
            return false;
        };
        match operator.undo(self) {
            Ok(()) => {
                tracing::info!(op = operator.description(), "Undo");
                self.history.push_redo(operator);
                true
            }
            Err(error) => {
                self.fail(error);
                false
            }
        }
    }

    /// Redo the last undone operator
    pub fn redo(&mut self) -> bool {
        let Some(mut operator) = self.history.pop_redo() else {
            return false;
        };
        match operator.redo(self) {
            Ok(()) => {
                tracing::info!(op = operator.description(), "Redo");
                self.history.push_undo(operator);
                true
            }
            Err(error) => {
                self.fail(error);
                false
            }
        }
    }

    fn fail(&mut self, error: SceneError) {
        tracing::warn!(
            undo = self.history.undo_depth(),
            redo = self.history.redo_depth(),
            "Clearing history after operator failure"
        );
        self.history.clear();
        (self.error_sink)(&error);
    }

    /// Undo/redo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Get undo description
    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    /// Get redo description
    pub fn redo_description(&self) -> Option<&str> {
        self.history.redo_description()
    }

    /// Forget every recorded operator
    pub fn clear_history(&mut self) {
        self.history.clear();
        tracing::debug!("History cleared");
    }

    // ===== Documents =====

    /// Replace every object with the contents of a scene document.
    ///
    /// Objects that fail to load are reported to the error sink and skipped.
    /// Returns the number of objects loaded.
    pub fn read_serialized_objects(&mut self, document: SceneDocument) -> usize {
        self.history.clear();
        self.objects.clear();

        let mut snapshots = IndexMap::new();
        for (id, value) in document {
            match self.load_object(&id, value) {
                Ok(object) => {
                    snapshots.insert(id.clone(), Arc::new(object.save()));
                    self.objects.insert(id, object);
                }
                Err(error) => {
                    tracing::warn!(id = %id, error = %error, "Skipping object that failed to load");
                    (self.error_sink)(&error);
                }
            }
        }
        self.saved.replace_all(snapshots);

        tracing::info!(objects = self.objects.len(), "Loaded scene document");
        self.objects.len()
    }

    fn load_object(&self, id: &ObjectId, value: Value) -> Result<AnimationObject> {
        if value.get("type").and_then(Value::as_str).is_none() {
            return Err(ObjectError::InvalidObjectType { tag: None }.into());
        }
        let snapshot = SerializedReplayObject::from_value(value).map_err(|source| SceneError::Deserialize {
            id: id.clone(),
            source,
        })?;
        Ok(self.registry.instantiate(&snapshot, self)?)
    }

    /// Committed state of every object as a scene document
    pub fn write_serialized_objects(&self) -> serde_json::Result<SceneDocument> {
        SceneDocument::from_snapshots(&self.saved.read_all())
    }
}
