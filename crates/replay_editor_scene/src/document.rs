// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene documents and their storage.
//!
//! A scene document maps object ids to per-object snapshot documents and is
//! stored as `scenes/<name>.json`. [`SceneStore`] does the file I/O on the
//! async runtime; applying a loaded document is left to the editing thread
//! through [`crate::Scene::read_serialized_objects`].

use crate::config::SceneConfig;
use crate::error::DocumentError;
use crate::ids::ObjectId;
use crate::snapshot::SerializedReplayObject;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default directory of scene documents
pub const SCENES_DIR: &str = "scenes";

const EXTENSION: &str = "json";

/// Storage path of the scene called `name`
pub fn scene_path(name: &str) -> PathBuf {
    Path::new(SCENES_DIR).join(format!("{name}.{EXTENSION}"))
}

/// Scene name of a document path
pub fn scene_name_from_path(path: &Path) -> Option<String> {
    if path.extension()? != EXTENSION {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_owned)
}

fn validate_name(name: &str) -> Result<(), DocumentError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if invalid {
        return Err(DocumentError::InvalidName(name.to_owned()));
    }
    Ok(())
}

/// Object documents keyed by object id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneDocument {
    objects: IndexMap<ObjectId, Value>,
}

impl SceneDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from committed snapshots
    pub fn from_snapshots(snapshots: &IndexMap<ObjectId, Arc<SerializedReplayObject>>) -> serde_json::Result<Self> {
        let objects = snapshots
            .iter()
            .map(|(id, snapshot)| Ok((id.clone(), snapshot.to_value()?)))
            .collect::<serde_json::Result<_>>()?;
        Ok(Self { objects })
    }

    /// Add or replace an object document
    pub fn insert(&mut self, id: impl Into<ObjectId>, object: Value) -> Option<Value> {
        self.objects.insert(id.into(), object)
    }

    /// Get an object document
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.objects.get(id)
    }

    /// Object ids in document order
    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.keys()
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the document has no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Parse from JSON text
    pub fn from_json(source: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Serialize to pretty JSON text
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl IntoIterator for SceneDocument {
    type Item = (ObjectId, Value);
    type IntoIter = indexmap::map::IntoIter<ObjectId, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.into_iter()
    }
}

/// Reads and writes scene documents in a directory
#[derive(Debug, Clone)]
pub struct SceneStore {
    scenes_dir: PathBuf,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::from_config(&SceneConfig::default())
    }
}

impl SceneStore {
    /// Store rooted at `scenes_dir`
    pub fn new(scenes_dir: impl Into<PathBuf>) -> Self {
        Self {
            scenes_dir: scenes_dir.into(),
        }
    }

    /// Store rooted at the configured scenes directory
    pub fn from_config(config: &SceneConfig) -> Self {
        Self::new(config.scenes_dir.clone())
    }

    /// Directory holding the documents
    pub fn scenes_dir(&self) -> &Path {
        &self.scenes_dir
    }

    /// Path of the document for scene `name`
    pub fn path_of(&self, name: &str) -> Result<PathBuf, DocumentError> {
        validate_name(name)?;
        Ok(self.scenes_dir.join(format!("{name}.{EXTENSION}")))
    }

    /// Load a scene document
    pub async fn load(&self, name: &str) -> Result<SceneDocument, DocumentError> {
        let path = self.path_of(name)?;
        let source = tokio::fs::read_to_string(&path).await?;
        let document = SceneDocument::from_json(&source)?;
        tracing::info!(path = %path.display(), objects = document.len(), "Read scene document");
        Ok(document)
    }

    /// Save a scene document, creating the directory when needed
    pub async fn save(&self, name: &str, document: &SceneDocument) -> Result<PathBuf, DocumentError> {
        let path = self.path_of(name)?;
        let json = document.to_json()?;
        tokio::fs::create_dir_all(&self.scenes_dir).await?;
        tokio::fs::write(&path, json).await?;
        tracing::info!(path = %path.display(), objects = document.len(), "Wrote scene document");
        Ok(path)
    }

    /// Names of the stored scenes, sorted
    pub async fn list(&self) -> Result<Vec<String>, DocumentError> {
        let mut entries = match tokio::fs::read_dir(&self.scenes_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = scene_name_from_path(&entry.path()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete a stored scene
    pub async fn remove(&self, name: &str) -> Result<(), DocumentError> {
        let path = self.path_of(name)?;
        tokio::fs::remove_file(&path).await?;
        tracing::info!(path = %path.display(), "Removed scene document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scene_naming() {
        let path = scene_path("intro");
        assert_eq!(path, Path::new("scenes").join("intro.json"));
        assert_eq!(scene_name_from_path(&path).as_deref(), Some("intro"));
        assert_eq!(scene_name_from_path(Path::new("scenes/intro.ron")), None);
        assert_eq!(scene_name_from_path(Path::new("/tmp/a.b.json")).as_deref(), Some("a.b"));
    }

    #[test]
    fn test_store_follows_config() {
        let config = SceneConfig {
            scenes_dir: PathBuf::from("replays/scenes"),
            ..SceneConfig::default()
        };
        let store = SceneStore::from_config(&config);
        assert_eq!(store.path_of("intro").unwrap(), Path::new("replays/scenes").join("intro.json"));
        assert_eq!(SceneStore::default().path_of("intro").unwrap(), scene_path("intro"));
    }

    #[test]
    fn test_invalid_names() {
        let store = SceneStore::default();
        for name in ["", "../up", "a/b", ".hidden"] {
            assert!(matches!(store.path_of(name), Err(DocumentError::InvalidName(_))), "{name}");
        }
        assert!(store.path_of("take 2").is_ok());
    }

    #[test]
    fn test_document_is_flat_map() {
        let source = r#"{ "cam": { "type": "camera" }, "scene": { "type": "scene_properties", "length": 10 } }"#;
        let document = SceneDocument::from_json(source).unwrap();
        let ids: Vec<_> = document.ids().map(ObjectId::as_str).collect();
        assert_eq!(ids, ["cam", "scene"]);
        assert_eq!(document.get("scene").unwrap()["length"], json!(10));

        let reparsed = SceneDocument::from_json(&document.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, document);
    }
}
