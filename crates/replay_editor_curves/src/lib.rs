// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe curves for the replay editor.
//!
//! This crate provides the curve data every animatable object is built from:
//! - Cubic bezier math (sampling, derivatives, intersections, subdivision)
//! - Keyframes with typed curve handles
//! - Channels (time-sorted keyframe sequences) with sampling and auto handles
//! - Categories and manifests for grouping channels
//!
//! ## Architecture
//!
//! Everything here is plain data and pure functions. Ownership of channels
//! lives with the animation objects in `replay_editor_scene`; this crate
//! never refers back to them.

pub mod bezier;
pub mod channel;
pub mod error;
pub mod keyframe;
pub mod manifest;

pub use bezier::{set_x_keep_direction, CubicBezier, Roots};
pub use channel::{compute_auto_handles, Channel, EndTangents};
pub use error::{CurveError, Result};
pub use keyframe::{HandleSide, HandleType, Interpolation, Keyframe};
pub use manifest::{Category, Manifest, ManifestRef};

/// Re-exported vector type used for curve-space points and handle offsets
pub use glam::DVec2;
