// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selection of objects, channels, keyframes and handles.
//!
//! The set is a nested map object → channel → keyframe index → handles.
//! Removing the last entry at any level prunes its parents, so an object is
//! selected exactly when it has a non-empty entry.

use crate::address::{ChannelRef, HandleIndex, HandleRef, KeyframeRef};
use crate::ids::ObjectId;
use crate::object::HasChannels;
use crate::scene::Scene;
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};

type Handles = BTreeSet<HandleIndex>;
type Keyframes = BTreeMap<usize, Handles>;
type Channels = IndexMap<String, Keyframes>;

/// What an editing tool currently has selected
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    objects: IndexMap<ObjectId, Channels>,
}

impl SelectionSet {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Objects =====

    /// Select every keyframe of every channel of an object.
    ///
    /// Returns `true` if anything was added.
    pub fn select_object(&mut self, scene: &Scene, object: &str) -> bool {
        let Some(live) = scene.object(object) else {
            return false;
        };
        let mut changed = false;
        for (name, channel) in live.channels() {
            for index in 0..channel.len() {
                changed |= self.select_keyframe(&KeyframeRef::new(object, name.as_str(), index));
            }
        }
        changed
    }

    /// Drop everything selected on an object
    pub fn deselect_object(&mut self, object: &str) -> bool {
        self.objects.shift_remove(object).is_some()
    }

    /// Whether anything on the object is selected
    pub fn is_object_selected(&self, object: &str) -> bool {
        self.objects.contains_key(object)
    }

    // ===== Channels =====

    /// Select every keyframe of a channel
    pub fn select_channel(&mut self, scene: &Scene, channel: &ChannelRef) -> bool {
        let Some(live) = channel.resolve(scene) else {
            return false;
        };
        let mut changed = false;
        for index in 0..live.len() {
            changed |= self.select_keyframe(&channel.keyframe(index));
        }
        changed
    }

    /// Drop everything selected on a channel
    pub fn deselect_channel(&mut self, channel: &ChannelRef) -> bool {
        let Some(channels) = self.objects.get_mut(channel.object.as_str()) else {
            return false;
        };
        let removed = channels.shift_remove(&channel.channel).is_some();
        if channels.is_empty() {
            self.objects.shift_remove(channel.object.as_str());
        }
        removed
    }

    /// Whether anything on the channel is selected
    pub fn is_channel_selected(&self, channel: &ChannelRef) -> bool {
        self.keyframes(channel).is_some()
    }

    // ===== Keyframes =====

    /// Select the center and both handles of a keyframe
    pub fn select_keyframe(&mut self, keyframe: &KeyframeRef) -> bool {
        let handles = self.handles_entry(keyframe);
        let before = handles.len();
        handles.extend(HandleIndex::ALL);
        handles.len() != before
    }

    /// Deselect the center and both handles of a keyframe
    pub fn deselect_keyframe(&mut self, keyframe: &KeyframeRef) -> bool {
        let removed = self
            .keyframes_mut(&keyframe.channel)
            .and_then(|keyframes| keyframes.remove(&keyframe.index))
            .is_some();
        self.prune(&keyframe.channel);
        removed
    }

    /// Whether any part of the keyframe is selected
    pub fn is_keyframe_selected(&self, keyframe: &KeyframeRef) -> bool {
        self.keyframes(&keyframe.channel)
            .is_some_and(|keyframes| keyframes.contains_key(&keyframe.index))
    }

    // ===== Handles =====

    /// Select one part of a keyframe
    pub fn select_handle(&mut self, handle: &HandleRef) -> bool {
        self.handles_entry(&handle.keyframe).insert(handle.handle)
    }

    /// Deselect one part of a keyframe
    pub fn deselect_handle(&mut self, handle: &HandleRef) -> bool {
        let Some(keyframes) = self.keyframes_mut(&handle.keyframe.channel) else {
            return false;
        };
        let Some(handles) = keyframes.get_mut(&handle.keyframe.index) else {
            return false;
        };
        let removed = handles.remove(&handle.handle);
        if handles.is_empty() {
            keyframes.remove(&handle.keyframe.index);
        }
        self.prune(&handle.keyframe.channel);
        removed
    }

    /// Whether a part of a keyframe is selected
    pub fn is_handle_selected(&self, handle: &HandleRef) -> bool {
        self.keyframes(&handle.keyframe.channel)
            .and_then(|keyframes| keyframes.get(&handle.keyframe.index))
            .is_some_and(|handles| handles.contains(&handle.handle))
    }

    // ===== Queries =====

    /// Objects with a selection
    pub fn selected_objects(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.keys()
    }

    /// Channels with a selection
    pub fn selected_channels(&self) -> Vec<ChannelRef> {
        self.objects
            .iter()
            .flat_map(|(object, channels)| {
                channels
                    .keys()
                    .map(move |channel| ChannelRef::new(object.clone(), channel.as_str()))
            })
            .collect()
    }

    /// Keyframes with any part selected
    pub fn selected_keyframes(&self) -> Vec<KeyframeRef> {
        self.iter_handles()
            .map(|(channel, index, _)| channel.keyframe(index))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every selected part, centers included
    pub fn selected_handles(&self) -> Vec<HandleRef> {
        self.iter_handles()
            .map(|(channel, index, handle)| channel.keyframe(index).handle(handle))
            .collect()
    }

    /// Selected curve handles, with a selected center standing for both of
    /// its handles. Never contains [`HandleIndex::Center`].
    pub fn effective_selected_handles(&self) -> Vec<HandleRef> {
        let handles: BTreeSet<_> = self
            .iter_handles()
            .flat_map(|(channel, index, handle)| {
                let sides: &[HandleIndex] = match handle {
                    HandleIndex::Center => &[HandleIndex::A, HandleIndex::B],
                    HandleIndex::A => &[HandleIndex::A],
                    HandleIndex::B => &[HandleIndex::B],
                };
                let keyframe = channel.keyframe(index);
                sides.iter().map(move |&side| keyframe.handle(side))
            })
            .collect();
        handles.into_iter().collect()
    }

    /// Number of keyframes with any part selected
    pub fn keyframe_count(&self) -> usize {
        self.objects
            .values()
            .flat_map(IndexMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Deselect everything
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    // ===== Maintenance =====

    /// Re-key keyframe indices of a channel after it was resorted.
    ///
    /// `mapping[old] == new`; selected indices outside the mapping are
    /// dropped.
    pub fn remap_selection(&mut self, channel: &ChannelRef, mapping: &[usize]) {
        let Some(keyframes) = self.keyframes_mut(channel) else {
            return;
        };
        let remapped = std::mem::take(keyframes)
            .into_iter()
            .filter_map(|(old, handles)| mapping.get(old).map(|&new| (new, handles)))
            .collect();
        *keyframes = remapped;
        self.prune(channel);
    }

    /// Drop selections whose target no longer exists
    pub fn retain_valid(&mut self, scene: &Scene) {
        self.objects.retain(|object, channels| {
            let Some(live) = scene.object(object.as_str()) else {
                return false;
            };
            channels.retain(|name, keyframes| {
                let Some(channel) = live.channel(name) else {
                    return false;
                };
                keyframes.retain(|&index, _| index < channel.len());
                !keyframes.is_empty()
            });
            !channels.is_empty()
        });
    }

    fn keyframes(&self, channel: &ChannelRef) -> Option<&Keyframes> {
        self.objects.get(channel.object.as_str())?.get(&channel.channel)
    }

    fn keyframes_mut(&mut self, channel: &ChannelRef) -> Option<&mut Keyframes> {
        self.objects
            .get_mut(channel.object.as_str())?
            .get_mut(&channel.channel)
    }

    fn handles_entry(&mut self, keyframe: &KeyframeRef) -> &mut Handles {
        self.objects
            .entry(keyframe.channel.object.clone())
            .or_default()
            .entry(keyframe.channel.channel.clone())
            .or_default()
            .entry(keyframe.index)
            .or_default()
    }

    /// Remove empty entries along a channel's path
    fn prune(&mut self, channel: &ChannelRef) {
        let Some(channels) = self.objects.get_mut(channel.object.as_str()) else {
            return;
        };
        if channels.get(&channel.channel).is_some_and(BTreeMap::is_empty) {
            channels.shift_remove(&channel.channel);
        }
        if channels.is_empty() {
            self.objects.shift_remove(channel.object.as_str());
        }
    }

    fn iter_handles(&self) -> impl Iterator<Item = (ChannelRef, usize, HandleIndex)> + '_ {
        self.objects.iter().flat_map(|(object, channels)| {
            channels.iter().flat_map(move |(name, keyframes)| {
                let channel = ChannelRef::new(object.clone(), name.as_str());
                keyframes.iter().flat_map(move |(&index, handles)| {
                    let channel = channel.clone();
                    handles.iter().map(move |&handle| (channel.clone(), index, handle))
                })
            })
        })
    }
}
