// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation objects.
//!
//! Every animatable thing in a scene is one variant of [`AnimationObject`].
//! Variants share the [`ReplayObject`] contract (save, parse, apply and an
//! attribute table) and opt into the capability traits [`HasTransform`] and
//! [`ProvidesCamera`].

mod camera;
mod dummy;
mod entity;
mod scene_properties;
pub mod transform;

pub use camera::CameraObject;
pub use dummy::DummyObject;
pub use entity::EntityObject;
pub use scene_properties::SceneProperties;
pub use transform::{combined_transform, HasTransform, TransformState};

use crate::error::ObjectError;
use crate::ids::ObjectId;
use crate::snapshot::SerializedReplayObject;
use glam::DMat4;
use indexmap::IndexMap;
use replay_editor_curves::{Category, Channel, Manifest};
use serde_json::{Map, Value};
use std::fmt;

/// Channels of one object, keyed by channel name
pub type ChannelMap = IndexMap<String, Channel>;

/// Capability of objects that own keyframe channels
pub trait HasChannels {
    /// All channels
    fn channels(&self) -> &ChannelMap;

    /// Mutable channels
    fn channels_mut(&mut self) -> &mut ChannelMap;

    /// Get a channel by name
    fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels().get(name)
    }

    /// Get a mutable channel by name
    fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels_mut().get_mut(name)
    }
}

/// Capability of objects a viewport can look through
pub trait ProvidesCamera {
    /// Vertical field of view in degrees
    fn fov(&self) -> f64;

    /// Near and far clip distances
    fn clip_range(&self) -> (f64, f64);

    /// Right handed perspective projection for the given aspect ratio
    fn projection(&self, aspect_ratio: f64) -> DMat4 {
        let (near, far) = self.clip_range();
        DMat4::perspective_rh(self.fov().to_radians(), aspect_ratio, near, far)
    }
}

/// A named scalar property with accessors
pub struct Attribute<T> {
    /// Field name in the snapshot document
    pub name: &'static str,
    /// Read the value
    pub get: fn(&T) -> f64,
    /// Validate and write the value
    pub set: fn(&mut T, f64) -> Result<(), ObjectError>,
}

impl<T> fmt::Debug for Attribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Shared contract of every object variant
pub trait ReplayObject: HasChannels + Default + 'static {
    /// Type tag stored in snapshots
    const TYPE_TAG: &'static str;

    /// Scalar attributes (de)serialized generically
    fn attributes() -> &'static [Attribute<Self>];

    /// Write fields that are not plain scalars
    fn write_extra(&self, _attributes: &mut Map<String, Value>) {}

    /// Read fields written by [`ReplayObject::write_extra`]
    fn read_extra(&mut self, _attributes: &Map<String, Value>) -> Result<(), ObjectError> {
        Ok(())
    }

    /// Push channel values sampled at `timestamp` into the live state
    fn apply(&mut self, timestamp: f64);

    /// Check constraints spanning several fields
    fn validate(&self) -> Result<(), ObjectError> {
        Ok(())
    }

    /// Serialize into an immutable snapshot
    fn save(&self) -> SerializedReplayObject {
        let mut attributes = Map::new();
        for attribute in Self::attributes() {
            attributes.insert(attribute.name.to_owned(), number_value((attribute.get)(self)));
        }
        self.write_extra(&mut attributes);
        SerializedReplayObject::new(Self::TYPE_TAG, self.channels().clone(), attributes)
    }

    /// Replace the live state with a snapshot.
    ///
    /// The object is left untouched when the snapshot is rejected.
    fn parse(&mut self, snapshot: &SerializedReplayObject) -> Result<(), ObjectError> {
        if snapshot.type_tag() != Self::TYPE_TAG {
            return Err(ObjectError::InvalidObjectType {
                tag: Some(snapshot.type_tag().to_owned()),
            });
        }

        let mut fresh = Self::default();
        for attribute in Self::attributes() {
            let Some(value) = snapshot.attribute(attribute.name) else {
                continue;
            };
            let number = value.as_f64().ok_or_else(|| ObjectError::Attribute {
                name: attribute.name.to_owned(),
                reason: format!("expected a number, got {value}"),
            })?;
            (attribute.set)(&mut fresh, number)?;
        }
        fresh.read_extra(snapshot.attributes())?;
        fresh.validate()?;

        // Built-in channels keep their position, extra channels follow
        let channels = fresh.channels_mut();
        for (name, channel) in snapshot.channels() {
            channels.insert(name.clone(), channel.clone());
        }

        *self = fresh;
        Ok(())
    }
}

/// Integral values are written as JSON integers
fn number_value(value: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

/// Read an optional typed field written by `write_extra`
pub(crate) fn read_field<T: serde::de::DeserializeOwned>(
    attributes: &Map<String, Value>,
    name: &str,
) -> Result<Option<T>, ObjectError> {
    match attributes.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| ObjectError::Attribute {
                name: name.to_owned(),
                reason: e.to_string(),
            }),
    }
}

/// Channel map with empty built-in channels
pub(crate) fn builtin_channels(names: &[&str]) -> ChannelMap {
    names.iter().map(|name| ((*name).to_owned(), Channel::new())).collect()
}

/// Any object that can live in a scene
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationObject {
    /// Viewpoint with transform and lens
    Camera(CameraObject),
    /// Transform bound to a host entity
    Entity(EntityObject),
    /// Scene wide properties
    SceneProperties(SceneProperties),
    /// Minimal object for tests and tooling
    Dummy(DummyObject),
}

macro_rules! dispatch {
    ($value:expr, $object:ident => $body:expr) => {
        match $value {
            AnimationObject::Camera($object) => $body,
            AnimationObject::Entity($object) => $body,
            AnimationObject::SceneProperties($object) => $body,
            AnimationObject::Dummy($object) => $body,
        }
    };
}

fn attribute_of<T: ReplayObject>(object: &T, name: &str) -> Option<f64> {
    T::attributes().iter().find(|a| a.name == name).map(|a| (a.get)(object))
}

fn set_attribute_of<T: ReplayObject>(object: &mut T, name: &str, value: f64) -> Result<(), ObjectError> {
    let attribute = T::attributes()
        .iter()
        .find(|a| a.name == name)
        .ok_or_else(|| ObjectError::Attribute {
            name: name.to_owned(),
            reason: format!("not an attribute of {}", T::TYPE_TAG),
        })?;
    let previous = (attribute.get)(object);
    (attribute.set)(object, value)?;
    if let Err(err) = object.validate() {
        (attribute.set)(object, previous)?;
        return Err(err);
    }
    Ok(())
}

fn attribute_names_of<T: ReplayObject>(_object: &T) -> Vec<&'static str> {
    T::attributes().iter().map(|a| a.name).collect()
}

fn type_tag_of<T: ReplayObject>(_object: &T) -> &'static str {
    T::TYPE_TAG
}

impl AnimationObject {
    /// Type tag of the variant
    pub fn type_tag(&self) -> &'static str {
        dispatch!(self, object => type_tag_of(object))
    }

    /// Serialize into an immutable snapshot
    pub fn save(&self) -> SerializedReplayObject {
        dispatch!(self, object => object.save())
    }

    /// Replace the live state with a snapshot of the same type
    pub fn parse(&mut self, snapshot: &SerializedReplayObject) -> Result<(), ObjectError> {
        dispatch!(self, object => object.parse(snapshot))
    }

    /// Push channel values sampled at `timestamp` into the live state
    pub fn apply(&mut self, timestamp: f64) {
        dispatch!(self, object => object.apply(timestamp));
    }

    /// Read a scalar attribute
    pub fn attribute(&self, name: &str) -> Option<f64> {
        dispatch!(self, object => attribute_of(object, name))
    }

    /// Validate and write a scalar attribute
    pub fn set_attribute(&mut self, name: &str, value: f64) -> Result<(), ObjectError> {
        dispatch!(self, object => set_attribute_of(object, name, value))
    }

    /// Names of the scalar attributes
    pub fn attribute_names(&self) -> Vec<&'static str> {
        dispatch!(self, object => attribute_names_of(object))
    }

    /// Transform capability, if the variant has one
    pub fn as_transform(&self) -> Option<&dyn HasTransform> {
        match self {
            Self::Camera(camera) => Some(camera),
            Self::Entity(entity) => Some(entity),
            Self::SceneProperties(_) | Self::Dummy(_) => None,
        }
    }

    /// Mutable transform capability, if the variant has one
    pub fn as_transform_mut(&mut self) -> Option<&mut dyn HasTransform> {
        match self {
            Self::Camera(camera) => Some(camera),
            Self::Entity(entity) => Some(entity),
            Self::SceneProperties(_) | Self::Dummy(_) => None,
        }
    }

    /// Camera capability, if the variant has one
    pub fn as_camera(&self) -> Option<&dyn ProvidesCamera> {
        match self {
            Self::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Parent object, for variants in the transform graph
    pub fn parent(&self) -> Option<&ObjectId> {
        self.as_transform().and_then(HasTransform::parent)
    }

    /// Group the channels into categories by what they drive
    pub fn manifest(&self) -> Manifest {
        let mut manifest = Manifest::new();
        for (name, channel) in self.channels() {
            let category = category_of(name);
            if manifest.category(category).is_none() {
                manifest.insert(Category::new(category));
            }
            if let Some(target) = manifest.category_mut(category) {
                target.insert_channel(name.clone(), channel.clone());
            }
        }
        manifest
    }
}

fn category_of(channel: &str) -> &'static str {
    if transform::POSITION_CHANNELS.contains(&channel) {
        "position"
    } else if transform::ROTATION_CHANNELS.contains(&channel) {
        "rotation"
    } else if transform::SCALE_CHANNELS.contains(&channel) {
        "scale"
    } else if channel == camera::FOV_CHANNEL {
        "camera"
    } else {
        "custom"
    }
}

impl HasChannels for AnimationObject {
    fn channels(&self) -> &ChannelMap {
        dispatch!(self, object => object.channels())
    }

    fn channels_mut(&mut self) -> &mut ChannelMap {
        dispatch!(self, object => object.channels_mut())
    }
}

impl From<CameraObject> for AnimationObject {
    fn from(camera: CameraObject) -> Self {
        Self::Camera(camera)
    }
}

impl From<EntityObject> for AnimationObject {
    fn from(entity: EntityObject) -> Self {
        Self::Entity(entity)
    }
}

impl From<SceneProperties> for AnimationObject {
    fn from(properties: SceneProperties) -> Self {
        Self::SceneProperties(properties)
    }
}

impl From<DummyObject> for AnimationObject {
    fn from(dummy: DummyObject) -> Self {
        Self::Dummy(dummy)
    }
}
