//! # plate-core
//!
//! Core types for windowed still-image codecs.
//!
//! This crate provides the leaves that every codec in `plate-io` builds on:
//!
//! - [`Rect`] - Inclusive integer windows (display and data)
//! - [`endian`] - Platform byte order and byte reversal
//! - [`SampleKind`], [`Sample`], [`convert`] - Scaled numeric conversion
//! - [`ChannelData`] - Tagged per-channel storage
//! - [`Image`] - Display window, data window, named channels
//! - [`LogCodec`] - Cineon/DPX 10-bit log/linear codec and bit packing
//! - [`ColorSpace`] - Named colour presets for non-raw reads and writes
//!
//! ## Crate Structure
//!
//! ```text
//! plate-core (this crate)
//!    ^
//!    |
//!    +-- plate-io (readers and writers)
//!    +-- plate-tests (integration tests)
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` - Parallel bulk sample conversion

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod channel;
pub mod colorspace;
pub mod endian;
pub mod error;
pub mod image;
pub mod logcodec;
pub mod rect;
pub mod sample;

// Re-exports for convenience
pub use channel::ChannelData;
pub use colorspace::{is_color_channel, ColorSpace};
pub use error::{Error, Result};
pub use image::{canonical_channel_order, Image};
pub use logcodec::{LogCodec, LogParams};
pub use rect::Rect;
pub use sample::{convert, convert_slice, Sample, SampleKind};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use plate_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::channel::ChannelData;
    pub use crate::colorspace::ColorSpace;
    pub use crate::error::{Error, Result};
    pub use crate::image::Image;
    pub use crate::logcodec::LogCodec;
    pub use crate::rect::Rect;
    pub use crate::sample::{Sample, SampleKind};
}
