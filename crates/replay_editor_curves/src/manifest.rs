// SPDX-License-Identifier: MIT OR Apache-2.0
//! Categories and manifests grouping channels.

use crate::channel::Channel;
use crate::error::CurveError;
use crate::keyframe::Keyframe;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named group of channels, e.g. the X/Y/Z channels of one vector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Category name
    pub name: String,
    /// Channels in this category
    pub channels: IndexMap<String, Channel>,
}

impl Category {
    /// Create an empty category
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: IndexMap::new(),
        }
    }

    /// Add a channel, returning the one it replaced
    pub fn insert_channel(&mut self, name: impl Into<String>, channel: Channel) -> Option<Channel> {
        self.channels.insert(name.into(), channel)
    }

    /// Get a channel by name
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Get a mutable channel by name
    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(name)
    }

    /// Total keyframes across all channels
    pub fn keyframe_count(&self) -> usize {
        self.channels.values().map(Channel::len).sum()
    }
}

/// All categories of one object or scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    categories: IndexMap<String, Category>,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category keyed by its name
    pub fn insert(&mut self, category: Category) -> Option<Category> {
        self.categories.insert(category.name.clone(), category)
    }

    /// Get a category
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Get a mutable category
    pub fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.get_mut(name)
    }

    /// Get all categories
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Get category count
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the manifest has no categories
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Bounds checked lookup of a channel
    pub fn channel(&self, category: &str, channel: &str) -> Option<&Channel> {
        self.categories.get(category)?.channel(channel)
    }

    /// Bounds checked lookup of a keyframe
    pub fn keyframe(&self, category: &str, channel: &str, index: usize) -> Option<&Keyframe> {
        self.channel(category, channel)?.get(index)
    }

    /// Resolve a textual address
    pub fn resolve(&self, address: &ManifestRef) -> Option<&Keyframe> {
        self.keyframe(&address.category, &address.channel, address.keyframe)
    }

    /// Get the duration based on channel content
    pub fn content_duration(&self) -> i64 {
        self.categories
            .values()
            .flat_map(|c| c.channels.values())
            .filter_map(|ch| ch.time_range().map(|(_, end)| end))
            .max()
            .unwrap_or(0)
    }
}

/// Stable address of a keyframe: `category/channel/index`.
///
/// Only the channel part of the textual form may contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManifestRef {
    /// Category or object name
    pub category: String,
    /// Channel name
    pub channel: String,
    /// Keyframe index within the channel
    pub keyframe: usize,
}

impl ManifestRef {
    /// Create an address
    pub fn new(category: impl Into<String>, channel: impl Into<String>, keyframe: usize) -> Self {
        Self {
            category: category.into(),
            channel: channel.into(),
            keyframe,
        }
    }
}

impl fmt::Display for ManifestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.category, self.channel, self.keyframe)
    }
}

impl FromStr for ManifestRef {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The category ends at the first '/' and the index follows the last,
        // so only channel names may contain '/'
        let invalid = || CurveError::InvalidArgument(format!("malformed keyframe address: {s:?}"));
        let (path, index) = s.rsplit_once('/').ok_or_else(invalid)?;
        let (category, channel) = path.split_once('/').ok_or_else(invalid)?;
        if category.is_empty() || channel.is_empty() {
            return Err(invalid());
        }
        let keyframe = index.parse().map_err(|_| invalid())?;
        Ok(Self::new(category, channel, keyframe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> Manifest {
        let mut position = Category::new("position");
        position.insert_channel(
            "posX",
            Channel::from_keyframes(vec![Keyframe::new(0, 1.0), Keyframe::new(40, 2.0)]),
        );
        position.insert_channel("posY", Channel::new());
        let mut manifest = Manifest::new();
        manifest.insert(position);
        manifest
    }

    #[test]
    fn test_bounds_checked_lookup() {
        let manifest = sample_manifest();
        assert_eq!(manifest.keyframe("position", "posX", 1).unwrap().value, 2.0);
        assert!(manifest.keyframe("position", "posX", 2).is_none());
        assert!(manifest.keyframe("position", "posZ", 0).is_none());
        assert!(manifest.keyframe("rotation", "posX", 0).is_none());
        assert_eq!(manifest.content_duration(), 40);
    }

    #[test]
    fn test_clone_is_deep() {
        let manifest = sample_manifest();
        let mut copy = manifest.clone();
        copy.category_mut("position")
            .and_then(|c| c.channel_mut("posX"))
            .and_then(|ch| ch.get_mut(0))
            .unwrap()
            .value = 99.0;
        assert_eq!(manifest.keyframe("position", "posX", 0).unwrap().value, 1.0);
    }

    #[test]
    fn test_address_parsing() {
        let address: ManifestRef = "position/posX/1".parse().unwrap();
        assert_eq!(address, ManifestRef::new("position", "posX", 1));
        assert_eq!(address.to_string(), "position/posX/1");
        assert_eq!(sample_manifest().resolve(&address).unwrap().time, 40);

        assert!("position/posX".parse::<ManifestRef>().is_err());
        assert!("position/posX/x".parse::<ManifestRef>().is_err());
        assert!("/posX/0".parse::<ManifestRef>().is_err());
    }

    #[test]
    fn test_slash_only_round_trips_in_channel() {
        let nested = ManifestRef::new("cam", "lens/focus", 3);
        assert_eq!(nested.to_string().parse::<ManifestRef>().unwrap(), nested);

        let slashed_category = ManifestRef::new("rig/arm", "posX", 0);
        let parsed: ManifestRef = slashed_category.to_string().parse().unwrap();
        assert_eq!(parsed, ManifestRef::new("rig", "arm/posX", 0));
    }
}
