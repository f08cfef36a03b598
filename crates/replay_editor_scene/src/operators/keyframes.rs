// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe editing operators.

use super::commit::{commit_objects, CommitState};
use super::Operator;
use crate::address::{ChannelRef, KeyframeRef};
use crate::error::SceneError;
use crate::ids::ObjectId;
use crate::object::HasChannels;
use crate::scene::Scene;
use crate::selection::SelectionSet;
use indexmap::IndexMap;
use replay_editor_curves::Keyframe;
use std::collections::{BTreeMap, BTreeSet};

type KeyframeGroups = BTreeMap<ChannelRef, BTreeSet<usize>>;

fn group(keyframes: impl IntoIterator<Item = KeyframeRef>) -> KeyframeGroups {
    let mut groups = KeyframeGroups::new();
    for key in keyframes {
        groups.entry(key.channel).or_default().insert(key.index);
    }
    groups
}

fn objects_of(groups: &KeyframeGroups) -> Vec<ObjectId> {
    let ids: BTreeSet<_> = groups.keys().map(|channel| channel.object.clone()).collect();
    ids.into_iter().collect()
}

fn undo_all(states: &[CommitState], scene: &mut Scene) -> Result<(), SceneError> {
    for state in states.iter().rev() {
        state.undo(scene)?;
    }
    Ok(())
}

fn redo_all(states: &[CommitState], scene: &mut Scene) -> Result<(), SceneError> {
    for state in states {
        state.redo(scene)?;
    }
    Ok(())
}

/// Insert a keyframe, creating the channel when needed
#[derive(Debug)]
pub struct InsertKeyframeOperator {
    target: ChannelRef,
    keyframe: Keyframe,
    index: Option<usize>,
    state: Option<CommitState>,
}

impl InsertKeyframeOperator {
    /// Insert `keyframe` into `target`
    pub fn new(target: ChannelRef, keyframe: Keyframe) -> Self {
        Self {
            target,
            keyframe,
            index: None,
            state: None,
        }
    }

    /// Where the keyframe landed, once executed
    pub fn inserted(&self) -> Option<KeyframeRef> {
        self.index.map(|index| self.target.keyframe(index))
    }
}

impl Operator for InsertKeyframeOperator {
    fn description(&self) -> &str {
        "Insert keyframe"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<bool, SceneError> {
        if self.state.is_some() {
            return Err(SceneError::Operator("keyframe already inserted".into()));
        }
        let target = &self.target;
        let keyframe = self.keyframe.clone();
        let mut inserted = None;
        let mut states = commit_objects(scene, std::slice::from_ref(&target.object), |scene| {
            let object = scene
                .object_mut(target.object.as_str())
                .ok_or_else(|| SceneError::ObjectNotFound(target.object.clone()))?;
            let channel = object.channels_mut().entry(target.channel.clone()).or_default();
            let index = channel.insert(keyframe)?;
            channel.compute_auto_handles(None);
            inserted = Some(index);
            Ok(())
        })?;

        self.index = inserted;
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

/// Remove a set of keyframes
#[derive(Debug)]
pub struct RemoveKeyframesOperator {
    keyframes: KeyframeGroups,
    states: Vec<CommitState>,
}

impl RemoveKeyframesOperator {
    /// Remove the given keyframes; stale references are ignored
    pub fn new(keyframes: impl IntoIterator<Item = KeyframeRef>) -> Self {
        Self {
            keyframes: group(keyframes),
            states: Vec::new(),
        }
    }

    /// Remove every keyframe the selection touches
    pub fn from_selection(selection: &SelectionSet) -> Self {
        Self::new(selection.selected_keyframes())
    }

    /// Number of keyframes addressed
    pub fn len(&self) -> usize {
        self.keyframes.values().map(BTreeSet::len).sum()
    }

    /// Whether no keyframes are addressed
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }
}

impl Operator for RemoveKeyframesOperator {
    fn description(&self) -> &str {
        "Remove keyframes"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<bool, SceneError> {
        let ids: Vec<_> = objects_of(&self.keyframes)
            .into_iter()
            .filter(|id| scene.contains(id.as_str()))
            .collect();
        let keyframes = &self.keyframes;
        self.states = commit_objects(scene, &ids, |scene| {
            for (target, indices) in keyframes {
                let Some(channel) = target.resolve_mut(scene) else {
                    continue;
                };
                // Back to front so earlier indices stay valid
                for &index in indices.iter().rev() {
                    channel.remove(index);
                }
                channel.compute_auto_handles(None);
            }
            Ok(())
        })?;
        Ok(!self.states.is_empty())
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        undo_all(&self.states, scene)
    }

    fn redo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        redo_all(&self.states, scene)
    }
}

/// Move keyframes in time.
///
/// Channels are resorted afterwards; [`ShiftKeyframesOperator::remaps`]
/// reports the old → new index mapping of every touched channel so callers
/// can update their selection.
#[derive(Debug)]
pub struct ShiftKeyframesOperator {
    keyframes: KeyframeGroups,
    delta: i64,
    remaps: IndexMap<ChannelRef, Vec<usize>>,
    states: Vec<CommitState>,
}

impl ShiftKeyframesOperator {
    /// Shift the given keyframes by `delta` milliseconds, clamping at zero
    pub fn new(keyframes: impl IntoIterator<Item = KeyframeRef>, delta: i64) -> Self {
        Self {
            keyframes: group(keyframes),
            delta,
            remaps: IndexMap::new(),
            states: Vec::new(),
        }
    }

    /// Shift every keyframe the selection touches
    pub fn from_selection(selection: &SelectionSet, delta: i64) -> Self {
        Self::new(selection.selected_keyframes(), delta)
    }

    /// Index mapping per channel, once executed
    pub fn remaps(&self) -> &IndexMap<ChannelRef, Vec<usize>> {
        &self.remaps
    }
}

impl Operator for ShiftKeyframesOperator {
    fn description(&self) -> &str {
        "Move keyframes"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<bool, SceneError> {
        if self.delta == 0 {
            return Ok(false);
        }
        let ids: Vec<_> = objects_of(&self.keyframes)
            .into_iter()
            .filter(|id| scene.contains(id.as_str()))
            .collect();
        let keyframes = &self.keyframes;
        let delta = self.delta;
        let mut remaps = IndexMap::new();
        self.states = commit_objects(scene, &ids, |scene| {
            for (target, indices) in keyframes {
                let Some(channel) = target.resolve_mut(scene) else {
                    continue;
                };
                for &index in indices {
                    if let Some(key) = channel.get_mut(index) {
                        key.time = (key.time + delta).max(0);
                    }
                }
                remaps.insert(target.clone(), channel.resort());
                channel.compute_auto_handles(None);
            }
            Ok(())
        })?;
        self.remaps = remaps;
        Ok(!self.states.is_empty())
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        undo_all(&self.states, scene)
    }

    fn redo(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        redo_all(&self.states, scene)
    }
}
