// SPDX-License-Identifier: MIT OR Apache-2.0
//! Immutable serialized object state.

use crate::object::ChannelMap;
use replay_editor_curves::Channel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The last committed state of one object.
///
/// Snapshots never change once built; scenes and operators share them as
/// `Arc<SerializedReplayObject>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedReplayObject {
    #[serde(rename = "type")]
    type_tag: String,
    #[serde(default)]
    channels: ChannelMap,
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl SerializedReplayObject {
    /// Build a snapshot
    pub fn new(type_tag: impl Into<String>, channels: ChannelMap, attributes: Map<String, Value>) -> Self {
        Self {
            type_tag: type_tag.into(),
            channels,
            attributes,
        }
    }

    /// Type tag used to pick the object constructor
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Deep copy of the object's channels
    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    /// Get a channel by name
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Attribute fields
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Get an attribute field
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Copy of this snapshot with one attribute field replaced
    pub fn with_attribute(&self, name: impl Into<String>, value: Value) -> Self {
        let mut copy = self.clone();
        copy.attributes.insert(name.into(), value);
        copy
    }

    /// Convert to a JSON document
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Read from a JSON document
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
