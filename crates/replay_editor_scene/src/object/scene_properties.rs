// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene wide properties, stored as an object under the reserved `scene` id.

use super::{Attribute, ChannelMap, HasChannels, ReplayObject};
use crate::config::DEFAULT_SCENE_LENGTH_MS;
use crate::error::ObjectError;

static ATTRIBUTES: [Attribute<SceneProperties>; 2] = [
    Attribute {
        name: "length",
        get: |props| props.length as f64,
        set: |props, length| props.set_length(milliseconds("length", length)?),
    },
    Attribute {
        name: "startOffset",
        get: |props| props.start_offset as f64,
        set: |props, offset| props.set_start_offset(milliseconds("startOffset", offset)?),
    },
];

fn milliseconds(name: &str, value: f64) -> Result<i64, ObjectError> {
    if !value.is_finite() {
        return Err(ObjectError::InvalidArgument(format!("{name} must be finite, got {value}")));
    }
    Ok(value.round() as i64)
}

/// Length and start offset of the scene timeline
#[derive(Debug, Clone, PartialEq)]
pub struct SceneProperties {
    length: i64,
    start_offset: i64,
    channels: ChannelMap,
}

impl Default for SceneProperties {
    fn default() -> Self {
        Self::new(DEFAULT_SCENE_LENGTH_MS)
    }
}

impl SceneProperties {
    /// Create properties for a scene of `length` milliseconds.
    ///
    /// Negative lengths are clamped to zero.
    pub fn new(length: i64) -> Self {
        Self {
            length: length.max(0),
            start_offset: 0,
            channels: ChannelMap::new(),
        }
    }

    /// Scene length in milliseconds
    pub fn length(&self) -> i64 {
        self.length
    }

    /// Set the scene length in milliseconds
    pub fn set_length(&mut self, length: i64) -> Result<(), ObjectError> {
        if length < 0 {
            return Err(ObjectError::InvalidArgument(format!(
                "scene length must not be negative, got {length}"
            )));
        }
        self.length = length;
        Ok(())
    }

    /// Offset into the recording where the scene starts, in milliseconds
    pub fn start_offset(&self) -> i64 {
        self.start_offset
    }

    /// Set the start offset in milliseconds
    pub fn set_start_offset(&mut self, offset: i64) -> Result<(), ObjectError> {
        if offset < 0 {
            return Err(ObjectError::InvalidArgument(format!(
                "start offset must not be negative, got {offset}"
            )));
        }
        self.start_offset = offset;
        Ok(())
    }
}

impl HasChannels for SceneProperties {
    fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    fn channels_mut(&mut self) -> &mut ChannelMap {
        &mut self.channels
    }
}

impl ReplayObject for SceneProperties {
    const TYPE_TAG: &'static str = "scene_properties";

    fn attributes() -> &'static [Attribute<Self>] {
        &ATTRIBUTES
    }

    fn apply(&mut self, _timestamp: f64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative_values() {
        let mut props = SceneProperties::new(1000);
        assert!(props.set_length(-1).is_err());
        assert!(props.set_start_offset(-5).is_err());
        assert_eq!(props.length(), 1000);
        assert_eq!(props.start_offset(), 0);
    }

    #[test]
    fn test_attribute_names() {
        let snapshot = SceneProperties::new(2500).save();
        assert_eq!(snapshot.type_tag(), "scene_properties");
        assert_eq!(snapshot.attribute("length").and_then(serde_json::Value::as_i64), Some(2500));
        assert_eq!(snapshot.attribute("startOffset").and_then(serde_json::Value::as_i64), Some(0));
    }

    #[test]
    fn test_parse_negative_length_fails() {
        let mut object = SceneProperties::new(2500);
        object.set_length(-1).unwrap_err();

        let mut snapshot_source = SceneProperties::new(10);
        snapshot_source.length = -3;
        let snapshot = snapshot_source.save();
        assert!(object.parse(&snapshot).is_err());
        assert_eq!(object.length(), 2500);
    }
}
