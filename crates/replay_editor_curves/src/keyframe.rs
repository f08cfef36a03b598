// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Interpolation mode towards the next keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Bezier segment shaped by the keyframe handles
    #[default]
    Linear,
}

/// How a handle is positioned when auto handles are recomputed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HandleType {
    /// Smooth tangent from the neighboring keyframes
    #[default]
    Auto,
    /// Smooth tangent, clamped against overshoot
    AutoClamped,
    /// Mirrors the direction of the opposite handle, keeps its own length
    Aligned,
    /// Points at the neighboring keyframe
    Vector,
    /// Never touched by auto computation
    Free,
}

/// One of the two curve handles of a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandleSide {
    /// Incoming handle, towards the previous keyframe
    A,
    /// Outgoing handle, towards the next keyframe
    B,
}

impl HandleSide {
    /// The handle on the other side of the keyframe
    pub fn opposite(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// A keyframe in a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in milliseconds
    pub time: i64,
    /// Value at this keyframe
    pub value: f64,
    /// Interpolation mode to the next keyframe
    #[serde(rename = "interp", default)]
    pub interpolation: Interpolation,
    /// Incoming handle, local offset from the center
    #[serde(rename = "handleA", default)]
    pub handle_a: DVec2,
    /// Outgoing handle, local offset from the center
    #[serde(rename = "handleB", default)]
    pub handle_b: DVec2,
    /// Positioning policy of handle A
    #[serde(rename = "handleAType", default)]
    pub handle_a_type: HandleType,
    /// Positioning policy of handle B
    #[serde(rename = "handleBType", default)]
    pub handle_b_type: HandleType,
}

impl Keyframe {
    /// Create a keyframe with flat auto handles
    pub fn new(time: i64, value: f64) -> Self {
        Self {
            time,
            value,
            interpolation: Interpolation::Linear,
            handle_a: DVec2::ZERO,
            handle_b: DVec2::ZERO,
            handle_a_type: HandleType::Auto,
            handle_b_type: HandleType::Auto,
        }
    }

    /// Set both handle types
    pub fn with_handle_types(mut self, a: HandleType, b: HandleType) -> Self {
        self.handle_a_type = a;
        self.handle_b_type = b;
        self
    }

    /// Set both local handle offsets
    pub fn with_handles(mut self, a: DVec2, b: DVec2) -> Self {
        self.handle_a = a;
        self.handle_b = b;
        self
    }

    /// The keyframe point in curve space (time, value)
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.time as f64, self.value)
    }

    /// Move the keyframe point, keeping handle offsets
    pub fn set_center(&mut self, center: DVec2) {
        self.time = center.x.round() as i64;
        self.value = center.y;
    }

    /// Local offset of a handle
    pub fn handle(&self, side: HandleSide) -> DVec2 {
        match side {
            HandleSide::A => self.handle_a,
            HandleSide::B => self.handle_b,
        }
    }

    /// Mutable local offset of a handle
    pub fn handle_mut(&mut self, side: HandleSide) -> &mut DVec2 {
        match side {
            HandleSide::A => &mut self.handle_a,
            HandleSide::B => &mut self.handle_b,
        }
    }

    /// Positioning policy of a handle
    pub fn handle_type(&self, side: HandleSide) -> HandleType {
        match side {
            HandleSide::A => self.handle_a_type,
            HandleSide::B => self.handle_b_type,
        }
    }

    /// Change the positioning policy of a handle
    pub fn set_handle_type(&mut self, side: HandleSide, handle_type: HandleType) {
        match side {
            HandleSide::A => self.handle_a_type = handle_type,
            HandleSide::B => self.handle_b_type = handle_type,
        }
    }

    /// Handle position in curve space
    pub fn global_handle(&self, side: HandleSide) -> DVec2 {
        self.center() + self.handle(side)
    }

    /// Place a handle at a curve space position
    pub fn set_global_handle(&mut self, side: HandleSide, point: DVec2) {
        let center = self.center();
        *self.handle_mut(side) = point - center;
    }
}
