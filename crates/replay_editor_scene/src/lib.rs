// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene core for the replay editor.
//!
//! This crate provides everything an editing session works on:
//! - Animation objects (camera, entity, scene properties) built on curve channels
//! - A transform graph resolving parented objects to world matrices
//! - The [`Scene`] aggregate with committed snapshots and undo/redo history
//! - Undoable operators for objects, hierarchy and keyframes
//! - Selection of objects, channels, keyframes and handles
//! - Scene documents and an async on-disk store
//!
//! ## Architecture
//!
//! Live objects sit in an arena table owned by the [`Scene`]. Every object
//! also has a committed JSON snapshot in a shared [`SnapshotCache`], which
//! other threads may read while the editor works. Operators mutate live
//! objects and then commit, keeping before/after snapshots for undo.

pub mod address;
pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod ids;
pub mod object;
pub mod operators;
pub mod registry;
pub mod scene;
pub mod selection;
pub mod snapshot;
pub mod table;

pub use address::{ChannelRef, HandleIndex, HandleRef, KeyframeRef};
pub use cache::SnapshotCache;
pub use config::SceneConfig;
pub use document::{SceneDocument, SceneStore};
pub use error::{ConfigError, DocumentError, ObjectError, Result, SceneError};
pub use history::History;
pub use ids::ObjectId;
pub use object::{
    AnimationObject, CameraObject, ChannelMap, DummyObject, EntityObject, HasChannels, HasTransform, ProvidesCamera,
    ReplayObject, SceneProperties, TransformState,
};
pub use operators::Operator;
pub use registry::{ObjectFactory, ObjectRegistry};
pub use scene::{ErrorSink, Scene};
pub use selection::SelectionSet;
pub use snapshot::SerializedReplayObject;
pub use table::{ObjectKey, ObjectTable};
