// SPDX-License-Identifier: MIT OR Apache-2.0
//! Object lifecycle and hierarchy operators.

use super::commit::{commit_objects, CommitState};
use super::Operator;
use crate::error::SceneError;
use crate::ids::ObjectId;
use crate::object::AnimationObject;
use crate::scene::Scene;
use crate::snapshot::SerializedReplayObject;
use std::sync::Arc;

fn restore_from(scene: &mut Scene, id: &ObjectId, snapshot: &SerializedReplayObject) -> Result<(), SceneError> {
    let object = scene.registry().instantiate(snapshot, scene)?;
    scene.add_object(id.clone(), object);
    Ok(())
}

/// Add a new object
#[derive(Debug)]
pub struct AddObjectOperator {
    id: ObjectId,
    object: Option<AnimationObject>,
    snapshot: Option<Arc<SerializedReplayObject>>,
}

impl AddObjectOperator {
    /// Add `object` under `id`
    pub fn new(id: impl Into<ObjectId>, object: AnimationObject) -> Self {
        Self {
            id: id.into(),
            object: Some(object),
            snapshot: None,
        }
    }

    /// Id of the added object
    pub fn id(&self) -> &ObjectId {
        &self.id
    }
}

impl Operator for AddObjectOperator {
    fn description(&self) -> &str {
        "Add object"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<bool, SceneError> {
        if scene.contains(self.id.as_str()) {
            return Err(SceneError::DuplicateObject(self.id.clone()));
        }
        let object = self
            .object
            .take()
            .ok_or_else(|| SceneError::Operator(format!("{} was already added", self.id)))?;
        scene.add_object(self.id.clone(), object);
        self.snapshot = scene.saved_object(self.id.as_str());
        Ok(true)
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        scene
            .remove_object(self.id.as_str())
            .map(drop)
            .ok_or_else(|| SceneError::ObjectNotFound(self.id.clone()))
    }

    fn redo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or_else(|| SceneError::Operator("add was never executed".into()))?;
        restore_from(scene, &self.id, snapshot)
    }
}

/// Remove an object, detaching its children
#[derive(Debug)]
pub struct RemoveObjectOperator {
    id: ObjectId,
    snapshot: Option<Arc<SerializedReplayObject>>,
    children: Vec<CommitState>,
}

impl RemoveObjectOperator {
    /// Remove the object stored under `id`
    pub fn new(id: impl Into<ObjectId>) -> Self {
        Self {
            id: id.into(),
            snapshot: None,
            children: Vec::new(),
        }
    }
}

impl Operator for RemoveObjectOperator {
    fn description(&self) -> &str {
        "Remove object"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<bool, SceneError> {
        let Some(snapshot) = scene.saved_object(self.id.as_str()) else {
            return Ok(false);
        };

        let children = scene.children_of(self.id.as_str());
        self.children = commit_objects(scene, &children, |scene| {
            for child in &children {
                scene.set_parent(child.as_str(), None)?;
            }
            Ok(())
        })?;

        scene.remove_object(self.id.as_str());
        self.snapshot = Some(snapshot);
        Ok(true)
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or_else(|| SceneError::Operator("remove was never executed".into()))?;
        restore_from(scene, &self.id, snapshot)?;
        for state in self.children.iter().rev() {
            state.undo(scene)?;
        }
        Ok(())
    }

    fn redo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        for state in &self.children {
            state.redo(scene)?;
        }
        scene
            .remove_object(self.id.as_str())
            .map(drop)
            .ok_or_else(|| SceneError::ObjectNotFound(self.id.clone()))
    }
}

/// Give an object a new id
#[derive(Debug)]
pub struct RenameObjectOperator {
    from: ObjectId,
    to: ObjectId,
}

impl RenameObjectOperator {
    /// Rename `from` to `to`
    pub fn new(from: impl Into<ObjectId>, to: impl Into<ObjectId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Operator for RenameObjectOperator {
    fn description(&self) -> &str {
        "Rename object"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<bool, SceneError> {
        if self.from == self.to {
            return Ok(false);
        }
        scene.rename_object(self.from.as_str(), self.to.clone())?;
        Ok(true)
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        scene.rename_object(self.to.as_str(), self.from.clone())
    }

    fn redo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        scene.rename_object(self.from.as_str(), self.to.clone())
    }
}

/// Change the parent of an object
#[derive(Debug)]
pub struct SetParentOperator {
    child: ObjectId,
    parent: Option<ObjectId>,
    state: Option<CommitState>,
}

impl SetParentOperator {
    /// Parent `child` to `parent`, or detach it with `None`
    pub fn new(child: impl Into<ObjectId>, parent: Option<ObjectId>) -> Self {
        Self {
            child: child.into(),
            parent,
            state: None,
        }
    }
}

impl Operator for SetParentOperator {
    fn description(&self) -> &str {
        "Set parent"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<bool, SceneError> {
        let current = scene
            .object(self.child.as_str())
            .ok_or_else(|| SceneError::ObjectNotFound(self.child.clone()))?
            .parent();
        if current == self.parent.as_ref() {
            return Ok(false);
        }

        let child = &self.child;
        let parent = self.parent.as_ref().map(ObjectId::as_str);
        let mut states = commit_objects(scene, std::slice::from_ref(child), |scene| {
            scene.set_parent(child.as_str(), parent)
        })?;
        self.state = states.pop();
        Ok(self.state.is_some())
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        match &self.state {
            Some(state) => state.undo(scene),
            None => Ok(()),
        }
    }

    fn redo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        match &self.state {
            Some(state) => state.redo(scene),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{EntityObject, HasTransform};

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_object("root", EntityObject::default().into());
        scene.add_object("child", EntityObject::default().into());
        scene.set_parent("child", Some("root")).unwrap();
        scene.save_object("child").unwrap();
        scene
    }

    #[test]
    fn test_add_duplicate_fails() {
        let mut scene = scene();
        let mut op = AddObjectOperator::new("root", EntityObject::default().into());
        assert!(matches!(op.execute(&mut scene), Err(SceneError::DuplicateObject(_))));
    }

    #[test]
    fn test_add_undo_redo() {
        let mut scene = scene();
        let mut op = AddObjectOperator::new("new", EntityObject::default().into());
        assert!(op.execute(&mut scene).unwrap());
        let snapshot = scene.saved_object("new").unwrap();

        op.undo(&mut scene).unwrap();
        assert!(!scene.contains("new"));
        op.redo(&mut scene).unwrap();
        assert_eq!(scene.saved_object("new").unwrap(), snapshot);
    }

    #[test]
    fn test_remove_detaches_and_restores_children() {
        let mut scene = scene();
        let child_before = scene.saved_object("child").unwrap();
        let mut op = RemoveObjectOperator::new("root");

        assert!(op.execute(&mut scene).unwrap());
        assert!(!scene.contains("root"));
        assert!(scene.object("child").unwrap().parent().is_none());

        op.undo(&mut scene).unwrap();
        assert!(scene.contains("root"));
        assert_eq!(scene.saved_object("child").unwrap(), child_before);
        assert_eq!(scene.object("child").unwrap().parent().unwrap().as_str(), "root");

        op.redo(&mut scene).unwrap();
        assert!(!scene.contains("root"));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut scene = scene();
        assert!(!RemoveObjectOperator::new("nope").execute(&mut scene).unwrap());
    }

    #[test]
    fn test_rename_round_trip() {
        let mut scene = scene();
        let mut op = RenameObjectOperator::new("root", "base");
        assert!(op.execute(&mut scene).unwrap());
        assert_eq!(scene.object("child").unwrap().parent().unwrap().as_str(), "base");

        op.undo(&mut scene).unwrap();
        assert!(scene.contains("root"));
        assert_eq!(scene.object("child").unwrap().parent().unwrap().as_str(), "root");

        assert!(!RenameObjectOperator::new("root", "root").execute(&mut scene).unwrap());
    }

    #[test]
    fn test_set_parent() {
        let mut scene = scene();
        let mut op = SetParentOperator::new("child", None);
        assert!(op.execute(&mut scene).unwrap());
        assert!(scene
            .object("child")
            .and_then(AnimationObject::as_transform)
            .and_then(HasTransform::parent)
            .is_none());

        op.undo(&mut scene).unwrap();
        assert_eq!(scene.object("child").unwrap().parent().unwrap().as_str(), "root");

        let mut same = SetParentOperator::new("child", Some(ObjectId::new("root")));
        assert!(!same.execute(&mut scene).unwrap());
        let mut cycle = SetParentOperator::new("root", Some(ObjectId::new("child")));
        assert!(cycle.execute(&mut scene).is_err());
    }
}
