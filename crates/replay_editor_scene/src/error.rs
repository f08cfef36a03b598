// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for objects, scenes, documents and configuration.

use crate::ids::ObjectId;
use replay_editor_curves::CurveError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while constructing, reading or editing animation objects
#[derive(Debug, Error)]
pub enum ObjectError {
    /// Unknown or missing type tag
    #[error("Invalid object type: {}", tag.as_deref().unwrap_or("<missing>"))]
    InvalidObjectType {
        /// The offending tag, if there was one
        tag: Option<String>,
    },

    /// Value outside the accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An attribute could not be read from a snapshot
    #[error("Attribute {name}: {reason}")]
    Attribute {
        /// Attribute name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Curve error
    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),
}

/// Errors raised by scene mutation and operators
#[derive(Debug, Error)]
pub enum SceneError {
    /// Object not found
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// An object with this id already exists
    #[error("Object already exists: {0}")]
    DuplicateObject(ObjectId),

    /// Value outside the accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Object error
    #[error("Object error: {0}")]
    Object(#[from] ObjectError),

    /// Curve error
    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    /// A stored object document could not be decoded
    #[error("Failed to deserialize object {id}: {source}")]
    Deserialize {
        /// Object the document belongs to
        id: ObjectId,
        /// Underlying decode error
        source: serde_json::Error,
    },

    /// Operator misuse (e.g. executed twice)
    #[error("Operator failed: {0}")]
    Operator(String),
}

/// Errors raised while reading or writing scene documents
#[derive(Debug, Error)]
pub enum DocumentError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Scene name that cannot be mapped to a file
    #[error("Invalid scene name: {0:?}")]
    InvalidName(String),

    /// Path that does not name a scene document
    #[error("Not a scene document: {0:?}")]
    InvalidPath(PathBuf),
}

/// Errors raised while reading or writing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// RON parse error
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON write error
    #[error("Config write error: {0}")]
    Write(#[from] ron::Error),

    /// Value outside the accepted domain
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
