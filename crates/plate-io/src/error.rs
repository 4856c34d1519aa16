//! Error types for I/O operations.
//!
//! The variants follow the error kinds of the codec contracts:
//!
//! | Kind | Variants | Fatal |
//! |------|----------|-------|
//! | I/O | [`IoError::Io`] | unless `open(false)` was requested |
//! | structural | [`IoError::Unsupported`], [`IoError::InvalidFile`], [`IoError::DecodeError`] | always |
//! | argument | [`IoError::MissingChannel`], [`IoError::InvalidWindow`], [`IoError::InvalidOption`] | always |
//! | encoding | [`IoError::EncodeError`], [`IoError::NoChannels`] | always |
//!
//! Probe failures never surface as errors: `can_read` returns `false`.
//! Partial-data conditions are logged with `tracing::warn!` instead.

use std::io;
use std::path::Path;

use plate_core::Rect;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No codec handles the file.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid or corrupted file.
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// A header field holds a value the codec cannot handle.
    #[error("{format}: unsupported {field} ({value}) in file {file}")]
    Unsupported {
        /// Codec name
        format: &'static str,
        /// Offending header field
        field: &'static str,
        /// Its value
        value: String,
        /// File being read or written
        file: String,
    },

    /// Decoding error from an underlying codec.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error from an underlying codec.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// A channel was requested that the file does not contain.
    #[error("non-existent image channel \"{0}\" requested")]
    MissingChannel(String),

    /// A window lies outside the region it was checked against.
    #[error("window {requested} is outside the available window {available}")]
    InvalidWindow {
        /// Requested window
        requested: Rect,
        /// Window it must fit in
        available: Rect,
    },

    /// A configuration value has the wrong type or an unknown value.
    #[error("invalid option {key}: {reason}")]
    InvalidOption {
        /// Configuration key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// Every requested channel was skipped.
    #[error("{0}: no encodable channels")]
    NoChannels(&'static str),

    /// Error from the image data model.
    #[error(transparent)]
    Core(#[from] plate_core::Error),
}

impl IoError {
    /// Creates an [`IoError::Unsupported`] error.
    pub fn unsupported(
        format: &'static str,
        field: &'static str,
        value: impl ToString,
        file: &Path,
    ) -> Self {
        Self::Unsupported {
            format,
            field,
            value: value.to_string(),
            file: file.display().to_string(),
        }
    }

    /// Creates an [`IoError::InvalidOption`] error.
    pub fn invalid_option(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors caused by caller arguments rather than
    /// file contents.
    pub fn is_argument_error(&self) -> bool {
        match self {
            Self::MissingChannel(_) | Self::InvalidWindow { .. } | Self::InvalidOption { .. } => {
                true
            }
            Self::Core(e) => e.is_argument_error(),
            _ => false,
        }
    }
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
