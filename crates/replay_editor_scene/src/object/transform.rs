// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transform state and parent/child transform resolution.

use super::ChannelMap;
use crate::error::ObjectError;
use crate::ids::ObjectId;
use crate::table::ObjectTable;
use glam::{DMat4, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Channels driving the position, in axis order
pub const POSITION_CHANNELS: [&str; 3] = ["posX", "posY", "posZ"];
/// Channels driving the rotation, in axis order
pub const ROTATION_CHANNELS: [&str; 3] = ["rotX", "rotY", "rotZ"];
/// Channels driving the scale, in axis order
pub const SCALE_CHANNELS: [&str; 3] = ["scaleX", "scaleY", "scaleZ"];

/// Position, rotation and scale of an object relative to its parent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformState {
    /// Translation
    pub position: DVec3,
    /// Euler angles in degrees
    pub rotation: DVec3,
    /// Per axis scale
    pub scale: DVec3,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
        }
    }
}

impl TransformState {
    /// Rotation as a quaternion (Y, then X, then Z)
    pub fn rotation_quat(&self) -> DQuat {
        DQuat::from_euler(
            EulerRot::YXZ,
            self.rotation.y.to_radians(),
            self.rotation.x.to_radians(),
            self.rotation.z.to_radians(),
        )
    }

    /// Translate, then rotate, then scale
    pub fn local_matrix(&self) -> DMat4 {
        DMat4::from_translation(self.position)
            * DMat4::from_quat(self.rotation_quat())
            * DMat4::from_scale(self.scale)
    }

    /// Set the scale, rejecting zero or negative factors
    pub fn set_scale(&mut self, scale: DVec3) -> Result<(), ObjectError> {
        if scale.cmple(DVec3::ZERO).any() || !scale.is_finite() {
            return Err(ObjectError::InvalidArgument(format!(
                "scale factors must be positive, got {scale}"
            )));
        }
        self.scale = scale;
        Ok(())
    }

    /// Check a state read from a document
    pub fn validate(&self) -> Result<(), ObjectError> {
        let mut copy = *self;
        copy.set_scale(self.scale)
    }

    /// Push sampled channel values into the transform.
    ///
    /// Empty or missing channels leave their component unchanged, as do
    /// sampled scale factors that are not positive.
    pub fn apply_channels(&mut self, channels: &ChannelMap, timestamp: f64) {
        let sample = |name: &str| {
            channels
                .get(name)
                .filter(|c| !c.is_empty())
                .map(|c| c.sample(timestamp))
        };
        for axis in 0..3 {
            if let Some(value) = sample(POSITION_CHANNELS[axis]) {
                self.position[axis] = value;
            }
            if let Some(value) = sample(ROTATION_CHANNELS[axis]) {
                self.rotation[axis] = value;
            }
            match sample(SCALE_CHANNELS[axis]) {
                Some(value) if value > 0.0 && value.is_finite() => self.scale[axis] = value,
                Some(value) => {
                    tracing::debug!(channel = SCALE_CHANNELS[axis], value, "Ignoring non-positive scale sample");
                }
                None => {}
            }
        }
    }
}

/// Capability of objects placed in the transform graph
pub trait HasTransform {
    /// Transform relative to the parent
    fn transform(&self) -> &TransformState;

    /// Mutable transform relative to the parent
    fn transform_mut(&mut self) -> &mut TransformState;

    /// Parent object, if any
    fn parent(&self) -> Option<&ObjectId>;

    /// Change the parent link
    fn set_parent(&mut self, parent: Option<ObjectId>);

    /// Local transform matrix
    fn local_transform(&self) -> DMat4 {
        self.transform().local_matrix()
    }
}

/// Compose an object's local transform with its parent chain.
///
/// Returns `None` when `id` is missing or has no transform. A parent that
/// is missing, has no transform, or was already visited during this call is
/// treated as absent.
pub fn combined_transform(objects: &ObjectTable, id: &str) -> Option<DMat4> {
    let mut visited = HashSet::new();
    resolve(objects, id, &mut visited)
}

fn resolve<'a>(objects: &'a ObjectTable, id: &'a str, visited: &mut HashSet<&'a str>) -> Option<DMat4> {
    let object = objects.get(id)?.as_transform()?;
    let local = object.local_transform();
    visited.insert(id);

    let parent = object
        .parent()
        .filter(|parent| !visited.contains(parent.as_str()))
        .and_then(|parent| resolve(objects, parent.as_str(), visited));

    Some(match parent {
        Some(parent) => parent * local,
        None => local,
    })
}
