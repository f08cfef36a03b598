// SPDX-License-Identifier: MIT OR Apache-2.0
//! Curve errors.

use thiserror::Error;

/// Errors raised by curve math and channel editing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    /// A caller passed a value outside the accepted domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A vertical vector cannot be rescaled to a non-zero X component
    #[error("Cannot set x = {target} on a vertical direction")]
    VerticalDirection {
        /// Requested X component
        target: f64,
    },
}

/// Result type for curve operations
pub type Result<T> = std::result::Result<T, CurveError>;
