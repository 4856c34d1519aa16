//! Reader and writer contracts.
//!
//! Every format module provides one [`ImageReader`] and/or one
//! [`ImageWriter`]. Both are constructed from a path and cache whatever
//! they parse against that path; calling `set_path` with a different path
//! drops the cache.
//!
//! # Reader capabilities
//!
//! | Method | Purpose |
//! |--------|---------|
//! | `can_read` | cheap magic probe, never fails |
//! | `open` | parse and validate the header once per path |
//! | `channel_names` | names discoverable from the header |
//! | `data_window` / `display_window` | header-derived windows |
//! | `read_channel` | decode one channel over a sub-window |
//! | `is_complete` | can the last scanline/tile be decoded? |
//! | `header` | parsed metadata |
//!
//! Implementors supply [`ImageReader::read_native`], which returns on-disk
//! samples for a window already validated against the data window. The
//! provided methods layer argument checks, scaled conversion and colour
//! presets on top.
//!
//! # Example
//!
//! ```rust,ignore
//! use plate_io::{ImageReader, dpx::DpxReader};
//! use plate_core::Rect;
//!
//! let mut reader = DpxReader::new("plate.0001.dpx");
//! let names = reader.channel_names()?;
//! let top_rows = reader.read_channel("R", Rect::new(0, 0, 2047, 15), false)?;
//! ```

use std::path::{Path, PathBuf};

use plate_core::{is_color_channel, ChannelData, ColorSpace, Image, Rect, SampleKind};

use crate::attrs::Attrs;
use crate::options::{ColorSpaceSetting, ReadOptions, WriteOptions};
use crate::{IoError, IoResult};

/// Shared decoder contract.
pub trait ImageReader {
    /// Short codec name used in messages.
    fn format_name(&self) -> &'static str;

    /// Path currently targeted.
    fn path(&self) -> &Path;

    /// Retargets the reader. A different path invalidates the cached header.
    fn set_path(&mut self, path: PathBuf);

    /// Probes `path` for this format. Never fails.
    fn can_read(path: &Path) -> bool
    where
        Self: Sized;

    /// Parses and validates the header if it is not cached yet.
    ///
    /// On failure returns `Ok(false)`, or the error when
    /// `throw_on_failure` is set.
    fn open(&mut self, throw_on_failure: bool) -> IoResult<bool>;

    /// Channel names found in the header.
    fn channel_names(&mut self) -> IoResult<Vec<String>>;

    /// Region of stored samples.
    fn data_window(&mut self) -> IoResult<Rect>;

    /// Nominal canvas.
    fn display_window(&mut self) -> IoResult<Rect>;

    /// Returns `true` if the final scanline or tile decodes.
    fn is_complete(&mut self) -> bool;

    /// Parsed header fields plus `dataWindow` and `displayWindow`.
    fn header(&mut self) -> IoResult<Attrs>;

    /// On-disk sample kind of channel `name`.
    fn native_kind(&mut self, name: &str) -> IoResult<SampleKind>;

    /// Decodes `window` of channel `name` in its on-disk sample kind.
    ///
    /// Callers guarantee that the channel exists and that `window` is a
    /// non-empty part of the data window.
    fn read_native(&mut self, name: &str, window: Rect) -> IoResult<ChannelData>;

    /// Converts on-disk samples to normalized floats.
    ///
    /// The default applies scaled numeric conversion. Log-encoded formats
    /// override this.
    fn decode_native(&mut self, _name: &str, data: ChannelData) -> IoResult<Vec<f32>> {
        Ok(data.to_f32())
    }

    /// Colour preset chosen by `"autoDetect"`.
    fn default_color_space(&mut self) -> IoResult<ColorSpace> {
        Ok(ColorSpace::Linear)
    }

    /// Decodes `window` of channel `name`.
    ///
    /// With `raw` set, samples keep their on-disk kind. Otherwise they are
    /// normalized `f32` values, linearised with the auto-detected preset.
    ///
    /// # Errors
    ///
    /// - [`IoError::MissingChannel`] for unknown names
    /// - [`IoError::InvalidWindow`] if `window` is empty or leaves the data window
    fn read_channel(&mut self, name: &str, window: Rect, raw: bool) -> IoResult<ChannelData> {
        self.read_channel_with(name, window, raw, ColorSpaceSetting::AutoDetect)
    }

    /// [`read_channel`](Self::read_channel) with an explicit colour setting.
    fn read_channel_with(
        &mut self,
        name: &str,
        window: Rect,
        raw: bool,
        color_space: ColorSpaceSetting,
    ) -> IoResult<ChannelData> {
        if !self.channel_names()?.iter().any(|n| n == name) {
            return Err(IoError::MissingChannel(name.to_string()));
        }
        let available = self.data_window()?;
        if window.is_empty() || !available.contains(&window) {
            return Err(IoError::InvalidWindow {
                requested: window,
                available,
            });
        }
        let native = self.read_native(name, window)?;
        debug_assert_eq!(native.len(), window.area());
        if raw {
            return Ok(native);
        }
        let mut samples = self.decode_native(name, native)?;
        let cs = color_space.resolve(self.default_color_space()?);
        if !cs.is_linear() && is_color_channel(name) {
            for v in samples.iter_mut() {
                *v = cs.to_linear(*v);
            }
        }
        Ok(ChannelData::F32(samples))
    }

    /// Reads a whole image according to `options`.
    ///
    /// The requested data window may extend past the file's; samples
    /// outside the file's data window are zero.
    fn read(&mut self, options: &ReadOptions) -> IoResult<Image> {
        self.open(true)?;
        let file_window = self.data_window()?;
        let data_window = options.data_window.unwrap_or(file_window);
        let display_window = match options.display_window {
            Some(w) => w,
            None => self.display_window()?,
        };

        let available = self.channel_names()?;
        let names = if options.channels.is_empty() {
            available
        } else {
            for name in &options.channels {
                if !available.contains(name) {
                    return Err(IoError::MissingChannel(name.clone()));
                }
            }
            options.channels.clone()
        };

        let read_window = data_window.intersect(&file_window);
        let mut image = Image::new(display_window, data_window);
        for name in names {
            let data = if read_window.is_empty() {
                let kind = if options.raw_channels {
                    self.native_kind(&name)?
                } else {
                    SampleKind::F32
                };
                ChannelData::zeros(kind, data_window.area())
            } else {
                let data = self.read_channel_with(
                    &name,
                    read_window,
                    options.raw_channels,
                    options.color_space,
                )?;
                pad_to_window(data, read_window, data_window)
            };
            image.insert_channel(name, data)?;
        }
        Ok(image)
    }
}

/// Places samples covering `inner` into a zeroed buffer covering `outer`.
pub(crate) fn pad_to_window(data: ChannelData, inner: Rect, outer: Rect) -> ChannelData {
    if inner == outer {
        return data;
    }
    let mut out = ChannelData::zeros(data.kind(), outer.area());
    let overlap = inner.intersect(&outer);
    if overlap.is_empty() {
        return out;
    }
    let src_x = (overlap.min_x - inner.min_x) as usize;
    let src_y = (overlap.min_y - inner.min_y) as usize;
    out.copy_span(
        &data,
        inner.width() as usize,
        src_x,
        src_y..src_y + overlap.height() as usize,
        overlap.width() as usize,
        outer.index_of(overlap.min_x, overlap.min_y),
        outer.width() as usize,
    );
    out
}

/// Shared encoder contract.
pub trait ImageWriter {
    /// Short codec name used in messages.
    fn format_name(&self) -> &'static str;

    /// Path currently targeted.
    fn path(&self) -> &Path;

    /// Retargets the writer.
    fn set_path(&mut self, path: PathBuf);

    /// Returns `true` if the format can store a channel of this name.
    fn supports_channel(&self, name: &str) -> bool;

    /// Writes `image` to [`path`](Self::path).
    ///
    /// Partially written files are left in place on failure.
    fn write(&mut self, image: &Image, options: &WriteOptions) -> IoResult<()>;
}

/// Header slot cached against a path.
///
/// Readers keep one of these and call [`HeaderCache::open`] from
/// [`ImageReader::open`].
#[derive(Debug)]
pub(crate) struct HeaderCache<H> {
    path: PathBuf,
    header: Option<H>,
}

impl<H> HeaderCache<H> {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path, header: None }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Retargets the cache, dropping the header if the path changed.
    pub(crate) fn set_path(&mut self, path: PathBuf) {
        if path != self.path {
            self.path = path;
            self.header = None;
        }
    }

    /// Parses the header with `parse` unless one is cached.
    pub(crate) fn open(
        &mut self,
        throw_on_failure: bool,
        parse: impl FnOnce(&Path) -> IoResult<H>,
    ) -> IoResult<bool> {
        if self.header.is_some() {
            return Ok(true);
        }
        match parse(&self.path) {
            Ok(header) => {
                self.header = Some(header);
                Ok(true)
            }
            Err(e) if throw_on_failure => Err(e),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "open failed");
                Ok(false)
            }
        }
    }

    /// The cached header. Call after a successful `open`.
    pub(crate) fn get(&self) -> IoResult<&H> {
        self.header
            .as_ref()
            .ok_or_else(|| IoError::InvalidFile(format!("{} is not open", self.path.display())))
    }

    pub(crate) fn get_mut(&mut self) -> IoResult<&mut H> {
        let path = self.path.display().to_string();
        self.header
            .as_mut()
            .ok_or_else(|| IoError::InvalidFile(format!("{} is not open", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_to_window() {
        let data = ChannelData::from(vec![1u8, 2, 3, 4]);
        let inner = Rect::new(1, 1, 2, 2);
        let outer = Rect::new(0, 0, 2, 2);
        let padded = pad_to_window(data, inner, outer);
        assert_eq!(padded, ChannelData::U8(vec![0, 0, 0, 0, 1, 2, 0, 3, 4]));
    }

    #[test]
    fn test_header_cache_invalidates_on_new_path() {
        let mut cache: HeaderCache<u32> = HeaderCache::new(PathBuf::from("a"));
        assert!(cache.open(true, |_| Ok(1)).unwrap());
        assert_eq!(*cache.get().unwrap(), 1);

        cache.set_path(PathBuf::from("a"));
        assert!(cache.open(true, |_| Ok(2)).unwrap());
        assert_eq!(*cache.get().unwrap(), 1);

        cache.set_path(PathBuf::from("b"));
        assert!(cache.get().is_err());
        let failed = cache.open(false, |p| Err(IoError::InvalidFile(p.display().to_string())));
        assert!(!failed.unwrap());
        assert!(cache.open(true, |_| Err(IoError::InvalidFile("b".into()))).is_err());
    }
}
