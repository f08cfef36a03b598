// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transform entities bound to host world entities.

use super::transform::{HasTransform, TransformState, POSITION_CHANNELS, ROTATION_CHANNELS, SCALE_CHANNELS};
use super::{builtin_channels, read_field, Attribute, ChannelMap, HasChannels, ReplayObject};
use crate::error::ObjectError;
use crate::ids::ObjectId;
use serde_json::{Map, Value};

/// An animated transform, optionally driving a host entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntityObject {
    /// Transform relative to the parent
    pub transform: TransformState,
    /// Parent object
    pub parent: Option<ObjectId>,
    /// Opaque handle of the host entity this object drives
    pub entity: Option<String>,
    channels: ChannelMap,
}

impl Default for EntityObject {
    fn default() -> Self {
        let names: Vec<&str> = POSITION_CHANNELS
            .into_iter()
            .chain(ROTATION_CHANNELS)
            .chain(SCALE_CHANNELS)
            .collect();
        Self {
            transform: TransformState::default(),
            parent: None,
            entity: None,
            channels: builtin_channels(&names),
        }
    }
}

impl HasChannels for EntityObject {
    fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    fn channels_mut(&mut self) -> &mut ChannelMap {
        &mut self.channels
    }
}

impl HasTransform for EntityObject {
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

impl ReplayObject for EntityObject {
    const TYPE_TAG: &'static str = "entity";

    fn attributes() -> &'static [Attribute<Self>] {
        &[]
    }

    fn write_extra(&self, attributes: &mut Map<String, Value>) {
        if let Ok(transform) = serde_json::to_value(self.transform) {
            attributes.insert("transform".into(), transform);
        }
        if let Some(parent) = &self.parent {
            attributes.insert("parent".into(), Value::from(parent.as_str()));
        }
        if let Some(entity) = &self.entity {
            attributes.insert("entity".into(), Value::from(entity.as_str()));
        }
    }

    fn read_extra(&mut self, attributes: &Map<String, Value>) -> Result<(), ObjectError> {
        if let Some(transform) = read_field::<TransformState>(attributes, "transform")? {
            transform.validate()?;
            self.transform = transform;
        }
        self.parent = read_field(attributes, "parent")?;
        self.entity = read_field(attributes, "entity")?;
        Ok(())
    }

    fn apply(&mut self, timestamp: f64) {
        self.transform.apply_channels(&self.channels, timestamp);
    }
}
