//! Error types for plate-core operations.
//!
//! # Overview
//!
//! The [`Error`] enum covers the failure modes of the in-memory image model:
//! - Window arithmetic that produces an unusable rectangle
//! - Channel storage whose length disagrees with the data window
//! - Lookups of channels that do not exist
//! - Sample kind mismatches when a typed view is requested
//!
//! # Usage
//!
//! ```rust
//! use plate_core::{Error, Result};
//!
//! fn check(expected: usize, actual: usize) -> Result<()> {
//!     if expected != actual {
//!         return Err(Error::sample_count_mismatch("R", expected, actual));
//!     }
//!     Ok(())
//! }
//! assert!(check(4, 3).is_err());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the image data model.
#[derive(Debug, Error)]
pub enum Error {
    /// A window is empty or otherwise unusable for the requested operation.
    #[error("invalid window {window}: {reason}")]
    InvalidWindow {
        /// Debug rendering of the offending window
        window: String,
        /// Why the window was rejected
        reason: String,
    },

    /// Channel storage length does not match the data window area.
    #[error("channel \"{channel}\" holds {actual} samples, data window needs {expected}")]
    SampleCountMismatch {
        /// Channel name
        channel: String,
        /// Samples required by the data window
        expected: usize,
        /// Samples actually present
        actual: usize,
    },

    /// The named channel is not present in the image.
    #[error("non-existent image channel \"{0}\"")]
    MissingChannel(String),

    /// A typed accessor was used on a channel of another kind.
    #[error("channel \"{channel}\" stores {actual}, not {expected}")]
    KindMismatch {
        /// Channel name
        channel: String,
        /// Requested kind
        expected: &'static str,
        /// Stored kind
        actual: &'static str,
    },

    /// Catch-all for errors that don't fit other categories.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates an [`Error::InvalidWindow`] error.
    #[inline]
    pub fn invalid_window(window: impl std::fmt::Debug, reason: impl Into<String>) -> Self {
        Self::InvalidWindow {
            window: format!("{:?}", window),
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::SampleCountMismatch`] error.
    #[inline]
    pub fn sample_count_mismatch(channel: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::SampleCountMismatch {
            channel: channel.into(),
            expected,
            actual,
        }
    }

    /// Creates an [`Error::Other`] error.
    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Returns `true` if the error was caused by a bad caller argument
    /// (missing channel or unusable window) rather than by stored data.
    #[inline]
    pub fn is_argument_error(&self) -> bool {
        matches!(self, Self::MissingChannel(_) | Self::InvalidWindow { .. })
    }
}
