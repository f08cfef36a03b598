// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undoable scene edits.
//!
//! An operator is executed once through [`Scene::apply_operator`], then moved
//! between the undo and redo stacks by [`Scene::undo`] and [`Scene::redo`].
//! Most operators follow the commit pattern in [`commit`]: remember the last
//! committed snapshot, mutate, commit, and restore either snapshot later.

mod commit;
mod keyframes;
mod objects;

pub use commit::{commit_objects, CommitObjectOperator, CommitObjectsOperator, CommitState};
pub use keyframes::{InsertKeyframeOperator, RemoveKeyframesOperator, ShiftKeyframesOperator};
pub use objects::{AddObjectOperator, RemoveObjectOperator, RenameObjectOperator, SetParentOperator};

use crate::error::SceneError;
use crate::scene::Scene;
use std::fmt::Debug;

/// An undoable edit
pub trait Operator: Debug + Send {
    /// Human readable description
    fn description(&self) -> &str;

    /// Perform the edit.
    ///
    /// `Ok(false)` means there was nothing to do and the operator is not
    /// recorded.
    fn execute(&mut self, scene: &mut Scene) -> Result<bool, SceneError>;

    /// Revert the edit
    fn undo(&mut self, scene: &mut Scene) -> Result<(), SceneError>;

    /// Perform the edit again after an undo
    fn redo(&mut self, scene: &mut Scene) -> Result<(), SceneError>;
}
