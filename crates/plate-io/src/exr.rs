//! OpenEXR format support.
//!
//! Only the first layer of a file is exposed. Channels keep their names as
//! stored (`R`, `G`, `B`, `A`, `Z`, `N.x`, ...) and their sample type
//! (`f16`, `f32` or `u32`). Subsampled and deep layers are rejected.
//!
//! Opening a file reads the header alone. Pixels are decoded on the first
//! channel request and stay cached until the path changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use plate_io::exr::{ExrCompression, ExrWriter, ExrWriterOptions};
//! use plate_io::{ImageWriter, WriteOptions};
//!
//! let options = ExrWriterOptions { compression: ExrCompression::Piz, half: true };
//! ExrWriter::with_options("beauty.exr", options).write(&image, &WriteOptions::default())?;
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use half::f16;
use plate_core::{ChannelData, Image, Rect, SampleKind};
use tracing::debug;

use crate::attrs::Attrs;
use crate::options::WriteOptions;
use crate::traits::HeaderCache;
use crate::writer::WritePlan;
use crate::{ImageReader, ImageWriter, IoError, IoResult};

const FORMAT: &str = "OpenEXR";

/// `0x762f3101`, stored little-endian.
const MAGIC: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];

fn decode_error(e: exr::error::Error) -> IoError {
    IoError::DecodeError(e.to_string())
}

fn encode_error(e: exr::error::Error) -> IoError {
    IoError::EncodeError(e.to_string())
}

#[derive(Debug, Clone)]
struct ExrChannel {
    name: String,
    kind: SampleKind,
}

#[derive(Debug)]
struct ExrFile {
    channels: Vec<ExrChannel>,
    data_window: Rect,
    display_window: Rect,
    attrs: Attrs,
    /// Decoded first layer, row-major over the data window.
    pixels: Option<Vec<(String, ChannelData)>>,
}

impl ExrFile {
    fn open(path: &Path) -> IoResult<Self> {
        use exr::meta::attribute::SampleType;
        use exr::meta::{BlockDescription, MetaData};

        let meta = MetaData::read_from_file(path, false).map_err(decode_error)?;
        let header = meta
            .headers
            .first()
            .ok_or_else(|| IoError::InvalidFile(format!("{}: no layers", path.display())))?;
        if header.deep {
            return Err(IoError::unsupported(FORMAT, "layer type", "deep", path));
        }

        let mut channels = Vec::with_capacity(header.channels.list.len());
        for desc in &header.channels.list {
            if desc.sampling.x() != 1 || desc.sampling.y() != 1 {
                return Err(IoError::unsupported(
                    FORMAT,
                    "channel sampling",
                    format!("{} {}x{}", desc.name, desc.sampling.x(), desc.sampling.y()),
                    path,
                ));
            }
            let kind = match desc.sample_type {
                SampleType::F16 => SampleKind::F16,
                SampleType::F32 => SampleKind::F32,
                SampleType::U32 => SampleKind::U32,
            };
            channels.push(ExrChannel {
                name: desc.name.to_string(),
                kind,
            });
        }

        let position = header.own_attributes.layer_position;
        let size = header.layer_size;
        let data_window =
            Rect::from_origin_size(position.x(), position.y(), size.x() as u32, size.y() as u32);
        let display = header.shared_attributes.display_window;
        let display_window = Rect::from_origin_size(
            display.position.x(),
            display.position.y(),
            display.size.x() as u32,
            display.size.y() as u32,
        );

        let mut attrs = Attrs::new();
        attrs.set("Compression", format!("{:?}", header.compression));
        attrs.set("LineOrder", format!("{:?}", header.line_order));
        attrs.set("Tiled", matches!(header.blocks, BlockDescription::Tiles(_)));
        attrs.set("Layers", meta.headers.len() as u32);
        attrs.set("PixelAspectRatio", header.shared_attributes.pixel_aspect);
        let own = &header.own_attributes;
        for (key, value) in [
            ("Owner", &own.owner),
            ("Comments", &own.comments),
            ("Software", &own.software_name),
        ] {
            if let Some(text) = value {
                attrs.set_text(key, &text.to_string());
            }
        }

        debug!(
            path = %path.display(),
            data = %data_window,
            display = %display_window,
            channels = channels.len(),
            "OpenEXR header"
        );
        Ok(Self {
            channels,
            data_window,
            display_window,
            attrs,
            pixels: None,
        })
    }

    fn pixels(&mut self, path: &Path) -> IoResult<&[(String, ChannelData)]> {
        if self.pixels.is_none() {
            self.pixels = Some(load_first_layer(path)?);
        }
        Ok(self.pixels.as_deref().unwrap_or_default())
    }
}

fn load_first_layer(path: &Path) -> IoResult<Vec<(String, ChannelData)>> {
    use exr::prelude::*;

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .all_channels()
        .first_valid_layer()
        .all_attributes()
        .from_file(path)
        .map_err(decode_error)?;

    let channels = image
        .layer_data
        .channel_data
        .list
        .into_iter()
        .map(|channel| {
            let data = match channel.sample_data {
                FlatSamples::F16(v) => ChannelData::F16(v),
                FlatSamples::F32(v) => ChannelData::F32(v),
                FlatSamples::U32(v) => ChannelData::U32(v),
            };
            (channel.name.to_string(), data)
        })
        .collect();
    Ok(channels)
}

// === ExrReader ===

/// OpenEXR format reader.
#[derive(Debug)]
pub struct ExrReader {
    cache: HeaderCache<ExrFile>,
}

impl ExrReader {
    /// Creates a reader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            cache: HeaderCache::new(path.into()),
        }
    }

    fn file(&mut self) -> IoResult<&mut ExrFile> {
        self.open(true)?;
        self.cache.get_mut()
    }
}

impl ImageReader for ExrReader {
    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn path(&self) -> &Path {
        self.cache.path()
    }

    fn set_path(&mut self, path: PathBuf) {
        self.cache.set_path(path);
    }

    fn can_read(path: &Path) -> bool {
        let mut magic = [0u8; 4];
        let read = File::open(path).and_then(|mut f| f.read_exact(&mut magic));
        read.is_ok() && magic == MAGIC
    }

    fn open(&mut self, throw_on_failure: bool) -> IoResult<bool> {
        self.cache.open(throw_on_failure, ExrFile::open)
    }

    fn channel_names(&mut self) -> IoResult<Vec<String>> {
        Ok(self.file()?.channels.iter().map(|c| c.name.clone()).collect())
    }

    fn data_window(&mut self) -> IoResult<Rect> {
        Ok(self.file()?.data_window)
    }

    fn display_window(&mut self) -> IoResult<Rect> {
        Ok(self.file()?.display_window)
    }

    fn is_complete(&mut self) -> bool {
        let path = self.path().to_path_buf();
        match self.file() {
            Ok(file) => file.pixels(&path).is_ok(),
            Err(_) => false,
        }
    }

    fn header(&mut self) -> IoResult<Attrs> {
        let file = self.file()?;
        let mut attrs = file.attrs.clone();
        attrs.set("dataWindow", file.data_window);
        attrs.set("displayWindow", file.display_window);
        attrs.set("Format", FORMAT);
        Ok(attrs)
    }

    fn native_kind(&mut self, name: &str) -> IoResult<SampleKind> {
        self.file()?
            .channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.kind)
            .ok_or_else(|| IoError::MissingChannel(name.to_string()))
    }

    fn read_native(&mut self, name: &str, window: Rect) -> IoResult<ChannelData> {
        let path = self.path().to_path_buf();
        let file = self.file()?;
        let data_window = file.data_window;
        let source = file
            .pixels(&path)?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data)
            .ok_or_else(|| IoError::MissingChannel(name.to_string()))?;

        if window == data_window {
            return Ok(source.clone());
        }
        let first_row = (window.min_y - data_window.min_y) as usize;
        let mut out = ChannelData::zeros(source.kind(), window.area());
        out.copy_span(
            source,
            data_window.width() as usize,
            (window.min_x - data_window.min_x) as usize,
            first_row..first_row + window.height() as usize,
            window.width() as usize,
            0,
            window.width() as usize,
        );
        Ok(out)
    }
}

// === Writer ===

/// Pixel compression for written files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExrCompression {
    /// Uncompressed.
    None,
    /// Run-length encoding.
    Rle,
    /// Deflate, one scanline per block.
    Zips,
    /// Deflate, 16 scanlines per block.
    #[default]
    Zip,
    /// Wavelet compression, best for noisy images.
    Piz,
}

impl ExrCompression {
    /// Parses the names used by OpenEXR tools (`none`, `rle`, `zips`, `zip`, `piz`).
    pub fn from_name(name: &str) -> IoResult<Self> {
        Ok(match name.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "rle" => Self::Rle,
            "zips" => Self::Zips,
            "zip" => Self::Zip,
            "piz" => Self::Piz,
            _ => {
                return Err(IoError::invalid_option(
                    "compression",
                    format!("unknown OpenEXR compression '{}'", name),
                ));
            }
        })
    }

    fn to_exr(self) -> exr::compression::Compression {
        use exr::compression::Compression;
        match self {
            Self::None => Compression::Uncompressed,
            Self::Rle => Compression::RLE,
            Self::Zips => Compression::ZIP1,
            Self::Zip => Compression::ZIP16,
            Self::Piz => Compression::PIZ,
        }
    }
}

/// Options for writing OpenEXR files.
#[derive(Debug, Clone, Default)]
pub struct ExrWriterOptions {
    /// Default: [`ExrCompression::Zip`].
    pub compression: ExrCompression,
    /// Store `f16` samples instead of `f32`. Default: `false`.
    pub half: bool,
}

/// OpenEXR format writer.
///
/// Writes every channel of the image into a single scanline layer. The
/// written region becomes the data window and the image's display window
/// is kept.
#[derive(Debug, Clone)]
pub struct ExrWriter {
    path: PathBuf,
    options: ExrWriterOptions,
}

impl ExrWriter {
    /// Creates a writer for `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, ExrWriterOptions::default())
    }

    /// Creates a writer with explicit options.
    pub fn with_options(path: impl Into<PathBuf>, options: ExrWriterOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    fn samples(&self, plan: &WritePlan, image: &Image, name: &str) -> IoResult<exr::prelude::FlatSamples> {
        use exr::prelude::FlatSamples;
        Ok(if self.options.half {
            FlatSamples::F16(plan.region_buffer::<f16>(image, name)?)
        } else {
            FlatSamples::F32(plan.region_buffer::<f32>(image, name)?)
        })
    }
}

impl ImageWriter for ExrWriter {
    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn set_path(&mut self, path: PathBuf) {
        self.path = path;
    }

    fn supports_channel(&self, name: &str) -> bool {
        !name.is_empty() && name.is_ascii()
    }

    fn write(&mut self, image: &Image, options: &WriteOptions) -> IoResult<()> {
        use exr::prelude::*;

        let plan = WritePlan::new(
            FORMAT,
            image,
            options,
            plate_core::ColorSpace::Linear,
            |n| self.supports_channel(n),
        )?;
        if plan.region.is_empty() {
            return Err(IoError::EncodeError(
                "OpenEXR data window does not overlap the display window".into(),
            ));
        }

        let mut list = Vec::with_capacity(plan.channels.len());
        for name in &plan.channels {
            let text = Text::new_or_none(name)
                .ok_or_else(|| IoError::EncodeError(format!("invalid channel name '{}'", name)))?;
            list.push(AnyChannel::new(text, self.samples(&plan, image, name)?));
        }

        let region = plan.region;
        let mut attributes = LayerAttributes::default();
        attributes.layer_position = Vec2(region.min_x, region.min_y);
        let mut encoding = Encoding::UNCOMPRESSED;
        encoding.compression = self.options.compression.to_exr();

        let layer = Layer::new(
            (region.width() as usize, region.height() as usize),
            attributes,
            encoding,
            AnyChannels::sort(list.into_iter().collect()),
        );
        let mut exr_image = Image::from_layer(layer);
        let display = plan.display_window;
        exr_image.attributes.display_window = IntegerBounds::new(
            Vec2(display.min_x, display.min_y),
            Vec2(display.width() as usize, display.height() as usize),
        );

        exr_image.write().to_file(&self.path).map_err(encode_error)?;
        Ok(())
    }
}
