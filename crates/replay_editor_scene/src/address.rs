// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value references into the object → channel → keyframe → handle hierarchy.
//!
//! References never own what they point at. Resolving a reference whose
//! target has since been removed yields `None`.

use crate::ids::ObjectId;
use crate::object::HasChannels;
use crate::scene::Scene;
use glam::DVec2;
use replay_editor_curves::{Channel, HandleSide, Keyframe, ManifestRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Part of a keyframe that can be selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandleIndex {
    /// The keyframe point itself
    Center = 0,
    /// Incoming handle
    A = 1,
    /// Outgoing handle
    B = 2,
}

impl HandleIndex {
    /// Every index, in order
    pub const ALL: [HandleIndex; 3] = [HandleIndex::Center, HandleIndex::A, HandleIndex::B];

    /// Numeric index (0 center, 1 handle A, 2 handle B)
    pub fn index(self) -> u8 {
        self as u8
    }

    /// The curve handle this index addresses, `None` for the center
    pub fn side(self) -> Option<HandleSide> {
        match self {
            Self::Center => None,
            Self::A => Some(HandleSide::A),
            Self::B => Some(HandleSide::B),
        }
    }
}

impl From<HandleSide> for HandleIndex {
    fn from(side: HandleSide) -> Self {
        match side {
            HandleSide::A => Self::A,
            HandleSide::B => Self::B,
        }
    }
}

impl TryFrom<u8> for HandleIndex {
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Self::Center),
            1 => Ok(Self::A),
            2 => Ok(Self::B),
            other => Err(other),
        }
    }
}

/// A channel of an object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Owning object
    pub object: ObjectId,
    /// Channel name
    pub channel: String,
}

impl ChannelRef {
    /// Create a reference
    pub fn new(object: impl Into<ObjectId>, channel: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            channel: channel.into(),
        }
    }

    /// Reference to a keyframe of this channel
    pub fn keyframe(&self, index: usize) -> KeyframeRef {
        KeyframeRef {
            channel: self.clone(),
            index,
        }
    }

    /// Look up the channel
    pub fn resolve<'a>(&self, scene: &'a Scene) -> Option<&'a Channel> {
        scene.object(self.object.as_str())?.channel(&self.channel)
    }

    /// Look up the channel for editing
    pub fn resolve_mut<'a>(&self, scene: &'a mut Scene) -> Option<&'a mut Channel> {
        scene
            .object_mut(self.object.as_str())
            .and_then(|object| object.channel_mut(&self.channel))
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object, self.channel)
    }
}

/// A keyframe of a channel, by index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyframeRef {
    /// Owning channel
    pub channel: ChannelRef,
    /// Keyframe index within the channel
    pub index: usize,
}

impl KeyframeRef {
    /// Create a reference
    pub fn new(object: impl Into<ObjectId>, channel: impl Into<String>, index: usize) -> Self {
        ChannelRef::new(object, channel).keyframe(index)
    }

    /// Reference to part of this keyframe
    pub fn handle(&self, handle: HandleIndex) -> HandleRef {
        HandleRef {
            keyframe: self.clone(),
            handle,
        }
    }

    /// Look up the keyframe
    pub fn resolve<'a>(&self, scene: &'a Scene) -> Option<&'a Keyframe> {
        self.channel.resolve(scene)?.get(self.index)
    }

    /// Look up the keyframe for editing
    pub fn resolve_mut<'a>(&self, scene: &'a mut Scene) -> Option<&'a mut Keyframe> {
        self.channel.resolve_mut(scene)?.get_mut(self.index)
    }

    /// Textual `object/channel/index` address. Object ids containing `/` do
    /// not survive a parse of the text form.
    pub fn to_manifest_ref(&self) -> ManifestRef {
        ManifestRef::new(self.channel.object.as_str(), self.channel.channel.as_str(), self.index)
    }
}

impl From<ManifestRef> for KeyframeRef {
    fn from(address: ManifestRef) -> Self {
        Self::new(address.category, address.channel, address.keyframe)
    }
}

impl fmt::Display for KeyframeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel, self.index)
    }
}

/// Center or one handle of a keyframe
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleRef {
    /// Owning keyframe
    pub keyframe: KeyframeRef,
    /// Which part of the keyframe
    pub handle: HandleIndex,
}

impl HandleRef {
    /// Create a reference
    pub fn new(object: impl Into<ObjectId>, channel: impl Into<String>, index: usize, handle: HandleIndex) -> Self {
        KeyframeRef::new(object, channel, index).handle(handle)
    }

    /// Owning object
    pub fn object(&self) -> &ObjectId {
        &self.keyframe.channel.object
    }

    /// Curve space position of the addressed point
    pub fn position(&self, scene: &Scene) -> Option<DVec2> {
        let keyframe = self.keyframe.resolve(scene)?;
        Some(match self.handle.side() {
            Some(side) => keyframe.global_handle(side),
            None => keyframe.center(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::DummyObject;

    fn scene_with_channel() -> Scene {
        let mut dummy = DummyObject::default();
        dummy.channels_mut().insert(
            "x".into(),
            Channel::from_keyframes(vec![
                Keyframe::new(0, 1.0).with_handles(DVec2::new(-5.0, 0.0), DVec2::new(5.0, 1.0)),
                Keyframe::new(30, 2.0),
            ]),
        );
        let mut scene = Scene::new();
        scene.add_object("d", dummy.into());
        scene
    }

    #[test]
    fn test_resolution() {
        let mut scene = scene_with_channel();
        let key = KeyframeRef::new("d", "x", 1);
        assert_eq!(key.resolve(&scene).unwrap().time, 30);

        key.resolve_mut(&mut scene).unwrap().value = 7.0;
        assert_eq!(key.resolve(&scene).unwrap().value, 7.0);

        let handle = HandleRef::new("d", "x", 0, HandleIndex::B);
        assert_eq!(handle.position(&scene), Some(DVec2::new(5.0, 2.0)));
        assert_eq!(handle.keyframe.handle(HandleIndex::Center).position(&scene), Some(DVec2::new(0.0, 1.0)));
    }

    #[test]
    fn test_deleted_targets_resolve_to_none() {
        let mut scene = scene_with_channel();
        assert!(KeyframeRef::new("d", "x", 2).resolve(&scene).is_none());
        assert!(KeyframeRef::new("d", "y", 0).resolve(&scene).is_none());

        scene.remove_object("d");
        assert!(ChannelRef::new("d", "x").resolve(&scene).is_none());
        assert!(HandleRef::new("d", "x", 0, HandleIndex::A).position(&scene).is_none());
    }

    #[test]
    fn test_handle_index_conversions() {
        assert_eq!(HandleIndex::try_from(2), Ok(HandleIndex::B));
        assert_eq!(HandleIndex::try_from(3), Err(3));
        assert_eq!(HandleIndex::A.index(), 1);
        assert_eq!(HandleIndex::from(HandleSide::A), HandleIndex::A);
        assert_eq!(HandleIndex::Center.side(), None);
    }

    #[test]
    fn test_manifest_address() {
        let key = KeyframeRef::new("cam", "posX", 2);
        assert_eq!(key.to_string(), "cam/posX/2");
        let parsed: ManifestRef = key.to_string().parse().unwrap();
        assert_eq!(KeyframeRef::from(parsed), key);
    }
}
