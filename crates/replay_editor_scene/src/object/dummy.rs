// SPDX-License-Identifier: MIT OR Apache-2.0
//! Minimal object without transform, used by tests and tooling.

use super::{Attribute, ChannelMap, HasChannels, ReplayObject};
use crate::error::ObjectError;
use indexmap::IndexMap;

static ATTRIBUTES: [Attribute<DummyObject>; 1] = [Attribute {
    name: "weight",
    get: |dummy| dummy.weight,
    set: |dummy, weight| {
        if !weight.is_finite() {
            return Err(ObjectError::InvalidArgument(format!("weight must be finite, got {weight}")));
        }
        dummy.weight = weight;
        Ok(())
    },
}];

/// Object with free-form channels and one scalar attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DummyObject {
    /// Arbitrary scalar
    pub weight: f64,
    /// Values recorded by the last [`ReplayObject::apply`], per channel
    pub sampled: IndexMap<String, f64>,
    channels: ChannelMap,
}

impl HasChannels for DummyObject {
    fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    fn channels_mut(&mut self) -> &mut ChannelMap {
        &mut self.channels
    }
}

impl ReplayObject for DummyObject {
    const TYPE_TAG: &'static str = "dummy";

    fn attributes() -> &'static [Attribute<Self>] {
        &ATTRIBUTES
    }

    fn apply(&mut self, timestamp: f64) {
        self.sampled = self
            .channels
            .iter()
            .map(|(name, channel)| (name.clone(), channel.sample(timestamp)))
            .collect();
    }
}
