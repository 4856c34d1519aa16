//! # plate-io
//!
//! Still-image codecs over the windowed [`plate_core::Image`].
//!
//! Every format implements the same two contracts:
//!
//! - [`ImageReader`] - probe a file, list its channels, query its data and
//!   display windows, decode any channel over any sub-window of the data
//!   window, and check that the file is complete
//! - [`ImageWriter`] - encode the part of an image inside its display
//!   window, skipping channels the format cannot hold
//!
//! [`read`] and [`write`] dispatch on file contents and extension.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use plate_io::{read, write, ReadOptions, WriteOptions};
//!
//! let image = read("scan.0001.dpx", &ReadOptions::default())?;
//! write("scan.0001.exr", &image, &WriteOptions::default())?;
//! ```
//!
//! # Windowed reads
//!
//! ```rust,ignore
//! use plate_core::Rect;
//! use plate_io::{ImageReader, dpx::DpxReader};
//!
//! let mut reader = DpxReader::new("scan.0001.dpx");
//! let top_half = Rect::new(0, 0, 2047, 777);
//! let red = reader.read_channel("R", top_half, false)?;
//! ```
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Samples |
//! |--------|------|-------|---------|
//! | DPX | Yes | Yes | 10-bit printing density |
//! | Cineon | Yes | Yes | 10-bit log |
//! | TIFF | Yes | Yes | 8/16/32 int, 32/64 float |
//! | JPEG | Yes | Yes | 8 |
//! | PNG | Yes | Yes | 8, 16 |
//! | SGI | Yes | Yes | 8, 16 |
//! | TGA | Yes | Yes | 8 |
//! | OpenEXR | Yes | Yes | 16f, 32f, 32 uint |
//! | YUV | No | Yes | 8-bit 4:2:0 |
//!
//! # Feature Flags
//!
//! - `exr` - OpenEXR support (default)
//! - `png` - PNG support (default)
//! - `jpeg` - JPEG support (default)
//! - `tiff` - TIFF support (default)
//! - `rayon` - parallel sample conversion in `plate-core`

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod attrs;
mod detect;
mod error;
mod options;
mod traits;
mod writer;

pub(crate) mod packed;

pub mod cineon;
pub mod dpx;
pub mod sgi;
pub mod tga;
pub mod yuv;

#[cfg(feature = "exr")]
pub mod exr;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png")]
pub mod png;
#[cfg(feature = "tiff")]
pub mod tiff;

pub use attrs::{AttrValue, Attrs};
pub use detect::{detect, read, reader_for, write, writer_for, Format};
pub use error::{IoError, IoResult};
pub use options::{
    ColorSpaceSetting, ReadOptions, WriteOptions, KEY_CHANNELS, KEY_COLOR_SPACE, KEY_DATA_WINDOW,
    KEY_DISPLAY_WINDOW, KEY_RAW_CHANNELS,
};
pub use traits::{ImageReader, ImageWriter};
pub use writer::WritePlan;
