// SPDX-License-Identifier: MIT OR Apache-2.0
//! Commit pattern: snapshot, mutate, snapshot again.

use super::Operator;
use crate::error::SceneError;
use crate::ids::ObjectId;
use crate::object::AnimationObject;
use crate::scene::Scene;
use crate::snapshot::SerializedReplayObject;
use std::fmt;
use std::sync::Arc;

/// Committed state of one object before and after an edit
#[derive(Debug, Clone, PartialEq)]
pub struct CommitState {
    /// Edited object
    pub id: ObjectId,
    /// Last committed snapshot before the edit
    pub before: Arc<SerializedReplayObject>,
    /// Snapshot committed by the edit
    pub after: Arc<SerializedReplayObject>,
}

impl CommitState {
    /// Commit the live state of `id`, remembering the previous commit
    pub fn commit(scene: &mut Scene, id: &str) -> Result<Self, SceneError> {
        let before = scene
            .saved_object(id)
            .ok_or_else(|| SceneError::ObjectNotFound(id.into()))?;
        let after = scene.save_object(id)?;
        Ok(Self {
            id: id.into(),
            before,
            after,
        })
    }

    /// Whether the edit changed the committed state
    pub fn changed(&self) -> bool {
        self.before != self.after
    }

    /// Restore the state before the edit
    pub fn undo(&self, scene: &mut Scene) -> Result<(), SceneError> {
        scene.restore_object(self.id.as_str(), Arc::clone(&self.before))
    }

    /// Restore the state after the edit
    pub fn redo(&self, scene: &mut Scene) -> Result<(), SceneError> {
        scene.restore_object(self.id.as_str(), Arc::clone(&self.after))
    }
}

/// Run `edit` and commit every object in `ids`.
///
/// Before snapshots are the last committed state, so live edits made before
/// the call (e.g. an interactive drag) become part of this commit. Only
/// objects whose committed state changed are returned.
pub fn commit_objects<F>(scene: &mut Scene, ids: &[ObjectId], edit: F) -> Result<Vec<CommitState>, SceneError>
where
    F: FnOnce(&mut Scene) -> Result<(), SceneError>,
{
    let before = ids
        .iter()
        .map(|id| {
            scene
                .saved_object(id.as_str())
                .map(|snapshot| (id.clone(), snapshot))
                .ok_or_else(|| SceneError::ObjectNotFound(id.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    edit(scene)?;

    let mut states = Vec::with_capacity(before.len());
    for (id, before) in before {
        let after = scene.save_object(id.as_str())?;
        let state = CommitState { id, before, after };
        if state.changed() {
            states.push(state);
        }
    }
    Ok(states)
}

fn already_executed(description: &str) -> SceneError {
    SceneError::Operator(format!("{description} was already executed"))
}

/// Edit applied to one object
pub type ObjectEdit = Box<dyn FnOnce(&mut AnimationObject) -> Result<(), SceneError> + Send>;

/// Edit applied to a whole scene
pub type SceneEdit = Box<dyn FnOnce(&mut Scene) -> Result<(), SceneError> + Send>;

/// Commit an edit of one object
pub struct CommitObjectOperator {
    description: String,
    id: ObjectId,
    edit: Option<ObjectEdit>,
    state: Option<CommitState>,
    executed: bool,
}

impl CommitObjectOperator {
    /// Commit edits already made to the live object
    pub fn new(id: impl Into<ObjectId>) -> Self {
        Self {
            description: "Edit object".into(),
            id: id.into(),
            edit: None,
            state: None,
            executed: false,
        }
    }

    /// Apply `edit` to the object, then commit it
    pub fn with_edit(
        id: impl Into<ObjectId>,
        description: impl Into<String>,
        edit: impl FnOnce(&mut AnimationObject) -> Result<(), SceneError> + Send + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            id: id.into(),
            edit: Some(Box::new(edit)),
            state: None,
            executed: false,
        }
    }

    /// Committed states, once executed
    pub fn state(&self) -> Option<&CommitState> {
        self.state.as_ref()
    }
}

impl fmt::Debug for CommitObjectOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitObjectOperator")
            .field("description", &self.description)
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Operator for CommitObjectOperator {
    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<bool, SceneError> {
        if std::mem::replace(&mut self.executed, true) {
            return Err(already_executed(&self.description));
        }
        let edit = self.edit.take();
        let id = self.id.clone();
        let mut states = commit_objects(scene, std::slice::from_ref(&self.id), move |scene| {
            let object = scene
                .object_mut(id.as_str())
                .ok_or_else(|| SceneError::ObjectNotFound(id.clone()))?;
            match edit {
                Some(edit) => edit(object),
                None => Ok(()),
            }
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

/// Commit an edit spanning several objects
pub struct CommitObjectsOperator {
    description: String,
    ids: Vec<ObjectId>,
    edit: Option<SceneEdit>,
    states: Vec<CommitState>,
    executed: bool,
}

impl CommitObjectsOperator {
    /// Commit edits already made to the live objects
    pub fn new(ids: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            description: "Edit objects".into(),
            ids: ids.into_iter().collect(),
            edit: None,
            states: Vec::new(),
            executed: false,
        }
    }

    /// Apply `edit` to the scene, then commit every object in `ids`
    pub fn with_edit(
        ids: impl IntoIterator<Item = ObjectId>,
        description: impl Into<String>,
        edit: impl FnOnce(&mut Scene) -> Result<(), SceneError> + Send + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            ids: ids.into_iter().collect(),
            edit: Some(Box::new(edit)),
            states: Vec::new(),
            executed: false,
        }
    }

    /// Committed states of the objects that changed
    pub fn states(&self) -> &[CommitState] {
        &self.states
    }
}

impl fmt::Debug for CommitObjectsOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitObjectsOperator")
            .field("description", &self.description)
            .field("ids", &self.ids)
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

impl Operator for CommitObjectsOperator {
    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<bool, SceneError> {
        if std::mem::replace(&mut self.executed, true) {
            return Err(already_executed(&self.description));
        }
        let edit = self.edit.take();
        self.states = commit_objects(scene, &self.ids, move |scene| match edit {
            Some(edit) => edit(scene),
            None => Ok(()),
        })?;
        Ok(!self.states.is_empty())
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        for state in self.states.iter().rev() {
            state.undo(scene)?;
        }
        Ok(())
    }

    fn redo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        for state in &self.states {
            state.redo(scene)?;
        }
        Ok(())
    }
}
