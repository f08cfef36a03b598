// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera objects.

use super::transform::{HasTransform, TransformState, POSITION_CHANNELS, ROTATION_CHANNELS};
use super::{builtin_channels, read_field, Attribute, ChannelMap, HasChannels, ProvidesCamera, ReplayObject};
use crate::error::ObjectError;
use crate::ids::ObjectId;
use serde_json::{Map, Value};

/// Channel animating the field of view
pub(crate) const FOV_CHANNEL: &str = "fov";

const DEFAULT_FOV: f64 = 70.0;
const DEFAULT_NEAR: f64 = 0.05;
const DEFAULT_FAR: f64 = 1000.0;

static ATTRIBUTES: [Attribute<CameraObject>; 3] = [
    Attribute {
        name: "fov",
        get: |camera| camera.fov,
        set: CameraObject::set_fov,
    },
    Attribute {
        name: "near",
        get: |camera| camera.near,
        set: |camera, near| {
            camera.near = positive("near", near)?;
            Ok(())
        },
    },
    Attribute {
        name: "far",
        get: |camera| camera.far,
        set: |camera, far| {
            camera.far = positive("far", far)?;
            Ok(())
        },
    },
];

fn positive(name: &str, value: f64) -> Result<f64, ObjectError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ObjectError::InvalidArgument(format!("{name} must be positive, got {value}")))
    }
}

/// An animated viewpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CameraObject {
    /// Transform relative to the parent
    pub transform: TransformState,
    /// Parent object
    pub parent: Option<ObjectId>,
    fov: f64,
    near: f64,
    far: f64,
    channels: ChannelMap,
}

impl Default for CameraObject {
    fn default() -> Self {
        let mut names = Vec::from(POSITION_CHANNELS);
        names.extend(ROTATION_CHANNELS);
        names.push(FOV_CHANNEL);
        Self {
            transform: TransformState::default(),
            parent: None,
            fov: DEFAULT_FOV,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            channels: builtin_channels(&names),
        }
    }
}

impl CameraObject {
    /// Set the vertical field of view, in degrees
    pub fn set_fov(&mut self, fov: f64) -> Result<(), ObjectError> {
        if !(fov > 0.0 && fov < 180.0) {
            return Err(ObjectError::InvalidArgument(format!(
                "fov must be between 0 and 180 degrees, got {fov}"
            )));
        }
        self.fov = fov;
        Ok(())
    }

    /// Set near and far clip distances
    pub fn set_clip_range(&mut self, near: f64, far: f64) -> Result<(), ObjectError> {
        let near = positive("near", near)?;
        let far = positive("far", far)?;
        if near >= far {
            return Err(ObjectError::InvalidArgument(format!(
                "near ({near}) must be closer than far ({far})"
            )));
        }
        self.near = near;
        self.far = far;
        Ok(())
    }
}

impl HasChannels for CameraObject {
    fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    fn channels_mut(&mut self) -> &mut ChannelMap {
        &mut self.channels
    }
}

impl HasTransform for CameraObject {
    fn transform(&self) -> &TransformState {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut TransformState {
        &mut self.transform
    }

    fn parent(&self) -> Option<&ObjectId> {
        self.parent.as_ref()
    }

    fn set_parent(&mut self, parent: Option<ObjectId>) {
        self.parent = parent;
    }
}

impl ProvidesCamera for CameraObject {
    fn fov(&self) -> f64 {
        self.fov
    }

    fn clip_range(&self) -> (f64, f64) {
        (self.near, self.far)
    }
}

impl ReplayObject for CameraObject {
    const TYPE_TAG: &'static str = "camera";

    fn attributes() -> &'static [Attribute<Self>] {
        &ATTRIBUTES
    }

    fn write_extra(&self, attributes: &mut Map<String, Value>) {
        if let Ok(transform) = serde_json::to_value(self.transform) {
            attributes.insert("transform".into(), transform);
        }
        if let Some(parent) = &self.parent {
            attributes.insert("parent".into(), Value::from(parent.as_str()));
        }
    }

    fn read_extra(&mut self, attributes: &Map<String, Value>) -> Result<(), ObjectError> {
        if let Some(transform) = read_field::<TransformState>(attributes, "transform")? {
            transform.validate()?;
            self.transform = transform;
        }
        self.parent = read_field(attributes, "parent")?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ObjectError> {
        if self.near >= self.far {
            return Err(ObjectError::InvalidArgument(format!(
                "near ({}) must be closer than far ({})",
                self.near, self.far
            )));
        }
        Ok(())
    }

    fn apply(&mut self, timestamp: f64) {
        self.transform.apply_channels(&self.channels, timestamp);
        if let Some(channel) = self.channels.get(FOV_CHANNEL).filter(|c| !c.is_empty()) {
            // Out of range samples keep the last valid lens
            if let Err(err) = self.set_fov(channel.sample(timestamp)) {
                tracing::debug!(error = %err, "Keeping last valid fov");
            }
        }
    }
}
