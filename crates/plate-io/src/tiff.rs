//! TIFF format support.
//!
//! Reading goes through the `tiff` crate's chunk API, so a window only
//! decodes the strips or tiles it overlaps. Partial edge tiles are cropped
//! by the decoder and copied as-is.
//!
//! # Reader
//!
//! | Photometric | Channels |
//! |-------------|----------|
//! | min-is-black (1) | `Y`, then extra samples |
//! | RGB (2) | `R`, `G`, `B`, then extra samples |
//!
//! The first extra sample is surfaced as `A`, further ones as `Data1`,
//! `Data2`, ... . Samples may be 8, 16 or 32-bit unsigned integers, or 32
//! or 64-bit floats, stored contiguously.
//!
//! `XPosition`/`YPosition` offset the data window. The Pixar
//! `ImageFullWidth`/`ImageFullLength` tags (33300, 33301) give the
//! display window; without them the display window equals the data window.
//!
//! Multi-page files expose [`TiffReader::num_directories`] and
//! [`TiffReader::set_directory`]. The selected directory belongs to the
//! cached header and survives until the path changes.
//!
//! # Writer
//!
//! Writes `Y`, `RGB` or `RGBA` over the write region, with
//! position and full-size tags when the region differs from the display
//! window. See [`TiffWriterOptions`] for depth and compression.
//!
//! # Example
//!
//! ```rust,ignore
//! use plate_io::tiff::{TiffReader, TiffWriter, TiffWriterOptions};
//! use plate_io::{ImageReader, ImageWriter, ReadOptions, WriteOptions};
//!
//! let mut reader = TiffReader::new("scan.tif");
//! let image = reader.read(&ReadOptions::default())?;
//! TiffWriter::new("out.tif").write(&image, &WriteOptions::default())?;
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use plate_core::{ChannelData, ColorSpace, Image, Rect, Sample, SampleKind};
use tiff::decoder::ifd::Value;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, Compression as Codec, DeflateLevel, Rational, TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tracing::{debug, warn};

use crate::attrs::Attrs;
use crate::options::WriteOptions;
use crate::traits::HeaderCache;
use crate::writer::WritePlan;
use crate::{ImageReader, ImageWriter, IoError, IoResult};

// === Constants ===

const FORMAT: &str = "TIFF";

const PHOTOMETRIC_MIN_IS_BLACK: u32 = 1;
const PHOTOMETRIC_RGB: u32 = 2;

const SAMPLE_FORMAT_UINT: u32 = 1;
const SAMPLE_FORMAT_FLOAT: u32 = 3;

const PLANAR_CONTIG: u32 = 1;

/// Unassociated alpha in `ExtraSamples`.
const EXTRA_SAMPLE_UNASSOCIATED_ALPHA: u16 = 2;

const X_POSITION: u16 = 286;
const Y_POSITION: u16 = 287;
const PIXAR_IMAGE_FULL_WIDTH: u16 = 33300;
const PIXAR_IMAGE_FULL_LENGTH: u16 = 33301;

const ROWS_PER_STRIP: u32 = 8;

const SOFTWARE: &str = "plate-io";

type TiffDecoder = Decoder<BufReader<File>>;

fn decode_error(e: tiff::TiffError) -> IoError {
    IoError::DecodeError(e.to_string())
}

fn encode_error(e: tiff::TiffError) -> IoError {
    IoError::EncodeError(e.to_string())
}

// === Tag values ===

fn value_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Byte(v) => Some(*v as u32),
        Value::Short(v) => Some(*v as u32),
        Value::Unsigned(v) => Some(*v),
        Value::UnsignedBig(v) => u32::try_from(*v).ok(),
        Value::List(list) => list.first().and_then(value_u32),
        _ => None,
    }
}

fn value_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Float(v) => Some(*v),
        Value::Double(v) => Some(*v as f32),
        Value::Rational(n, d) if *d != 0 => Some(*n as f32 / *d as f32),
        Value::SRational(n, d) if *d != 0 => Some(*n as f32 / *d as f32),
        Value::List(list) => list.first().and_then(value_f32),
        other => value_u32(other).map(|v| v as f32),
    }
}

fn find(decoder: &mut TiffDecoder, tag: Tag) -> IoResult<Option<Value>> {
    decoder.find_tag(tag).map_err(decode_error)
}

fn find_u32(decoder: &mut TiffDecoder, tag: Tag) -> IoResult<Option<u32>> {
    Ok(find(decoder, tag)?.as_ref().and_then(value_u32))
}

fn find_text(decoder: &mut TiffDecoder, tag: Tag) -> Option<String> {
    match decoder.find_tag(tag) {
        Ok(Some(Value::Ascii(text))) => Some(text.trim_end_matches('\0').to_string()),
        _ => None,
    }
}

// === Directory layout ===

/// Everything parsed from one image file directory.
#[derive(Debug, Clone)]
struct TiffLayout {
    width: u32,
    height: u32,
    channels: Vec<String>,
    kind: SampleKind,
    samples_per_pixel: usize,
    chunk_width: u32,
    chunk_height: u32,
    tiled: bool,
    data_window: Rect,
    display_window: Rect,
    attrs: Attrs,
}

impl TiffLayout {
    fn parse(decoder: &mut TiffDecoder, path: &Path) -> IoResult<Self> {
        let (width, height) = decoder.dimensions().map_err(decode_error)?;
        let unsupported = |field: &'static str, value: u32| IoError::unsupported(FORMAT, field, value, path);

        let photometric = find_u32(decoder, Tag::PhotometricInterpretation)?.unwrap_or(PHOTOMETRIC_MIN_IS_BLACK);
        let samples_per_pixel = find_u32(decoder, Tag::SamplesPerPixel)?.unwrap_or(1) as usize;
        let bits = find_u32(decoder, Tag::BitsPerSample)?.unwrap_or(1);
        let sample_format = find_u32(decoder, Tag::SampleFormat)?.unwrap_or(SAMPLE_FORMAT_UINT);
        let planar = find_u32(decoder, Tag::PlanarConfiguration)?.unwrap_or(PLANAR_CONTIG);
        let compression = find_u32(decoder, Tag::Compression)?.unwrap_or(1);

        if planar != PLANAR_CONTIG {
            return Err(unsupported("planar configuration", planar));
        }

        let mut channels: Vec<String> = match photometric {
            PHOTOMETRIC_MIN_IS_BLACK => vec!["Y".into()],
            PHOTOMETRIC_RGB => vec!["R".into(), "G".into(), "B".into()],
            other => return Err(unsupported("photometric interpretation", other)),
        };
        if samples_per_pixel < channels.len() {
            return Err(unsupported("samples per pixel", samples_per_pixel as u32));
        }
        for extra in 0..samples_per_pixel - channels.len() {
            channels.push(if extra == 0 {
                "A".to_string()
            } else {
                format!("Data{}", extra)
            });
        }

        let kind = match (bits, sample_format) {
            (8, SAMPLE_FORMAT_UINT) => SampleKind::U8,
            (16, SAMPLE_FORMAT_UINT) => SampleKind::U16,
            (32, SAMPLE_FORMAT_UINT) => SampleKind::U32,
            (32, SAMPLE_FORMAT_FLOAT) => SampleKind::F32,
            (64, SAMPLE_FORMAT_FLOAT) => SampleKind::F64,
            (8 | 16 | 32 | 64, other) => return Err(unsupported("sample format", other)),
            (other, _) => return Err(unsupported("bits per sample", other)),
        };

        let tiled = find(decoder, Tag::TileWidth)?.is_some();
        let (chunk_width, chunk_height) = decoder.chunk_dimensions();

        let x = find(decoder, Tag::Unknown(X_POSITION))?.as_ref().and_then(value_f32).unwrap_or(0.0);
        let y = find(decoder, Tag::Unknown(Y_POSITION))?.as_ref().and_then(value_f32).unwrap_or(0.0);
        let data_window = Rect::from_origin_size(x.round() as i32, y.round() as i32, width, height);
        let full_width = find_u32(decoder, Tag::Unknown(PIXAR_IMAGE_FULL_WIDTH))?;
        let full_height = find_u32(decoder, Tag::Unknown(PIXAR_IMAGE_FULL_LENGTH))?;
        let display_window = match (full_width, full_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Rect::from_size(w, h),
            _ => data_window,
        };

        let mut attrs = Attrs::new();
        attrs.set("BitsPerSample", bits);
        attrs.set("SampleFormat", sample_format);
        attrs.set("Photometric", photometric);
        attrs.set("Compression", compression);
        attrs.set("SamplesPerPixel", samples_per_pixel as u32);
        attrs.set("Tiled", tiled);
        if tiled {
            attrs.set("TileWidth", chunk_width);
            attrs.set("TileLength", chunk_height);
        } else {
            attrs.set("RowsPerStrip", chunk_height);
        }
        for (key, tag) in [
            ("Software", Tag::Software),
            ("Artist", Tag::Artist),
            ("ImageDescription", Tag::ImageDescription),
            ("DateTime", Tag::DateTime),
            ("Copyright", Tag::Copyright),
        ] {
            if let Some(text) = find_text(decoder, tag) {
                attrs.set_text(key, &text);
            }
        }

        debug!(
            path = %path.display(),
            width,
            height,
            channels = ?channels,
            kind = %kind,
            tiled,
            "TIFF directory"
        );

        Ok(Self {
            width,
            height,
            channels,
            kind,
            samples_per_pixel,
            chunk_width,
            chunk_height,
            tiled,
            data_window,
            display_window,
            attrs,
        })
    }

    fn chunks_across(&self) -> u32 {
        self.width.div_ceil(self.chunk_width)
    }

    fn chunk_count(&self) -> u32 {
        self.chunks_across() * self.height.div_ceil(self.chunk_height)
    }
}

/// Decoder positioned on one directory.
struct TiffFile {
    decoder: TiffDecoder,
    directories: usize,
    directory: usize,
    layout: TiffLayout,
}

impl std::fmt::Debug for TiffFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiffFile")
            .field("directories", &self.directories)
            .field("directory", &self.directory)
            .field("layout", &self.layout)
            .finish()
    }
}

impl TiffFile {
    fn open(path: &Path) -> IoResult<Self> {
        let mut decoder = Self::decoder(path)?;
        let mut directories = 1;
        while decoder.more_images() {
            decoder.next_image().map_err(decode_error)?;
            directories += 1;
        }
        Self::at_directory(path, 0, directories)
    }

    fn decoder(path: &Path) -> IoResult<TiffDecoder> {
        let file = File::open(path)?;
        Decoder::new(BufReader::new(file)).map_err(decode_error)
    }

    fn at_directory(path: &Path, directory: usize, directories: usize) -> IoResult<Self> {
        let mut decoder = Self::decoder(path)?;
        for _ in 0..directory {
            decoder.next_image().map_err(decode_error)?;
        }
        let layout = TiffLayout::parse(&mut decoder, path)?;
        Ok(Self {
            decoder,
            directories,
            directory,
            layout,
        })
    }
}

/// Copies channel `channel` of one decoded chunk into `out`.
fn gather<T: Copy>(
    out: &mut [T],
    src: &[T],
    chunk: Rect,
    window: Rect,
    spp: usize,
    channel: usize,
) -> IoResult<()> {
    let overlap = chunk.intersect(&window);
    let chunk_width = chunk.width() as usize;
    for y in overlap.min_y..=overlap.max_y {
        let row = (y - chunk.min_y) as usize * chunk_width;
        let dst = window.index_of(overlap.min_x, y);
        for i in 0..overlap.width() as usize {
            let x = (overlap.min_x - chunk.min_x) as usize + i;
            out[dst + i] = *src
                .get((row + x) * spp + channel)
                .ok_or_else(|| IoError::DecodeError("TIFF chunk is shorter than its dimensions".into()))?;
        }
    }
    Ok(())
}

// === TiffReader ===

/// TIFF format reader.
#[derive(Debug)]
pub struct TiffReader {
    cache: HeaderCache<TiffFile>,
}

impl TiffReader {
    /// Creates a reader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            cache: HeaderCache::new(path.into()),
        }
    }

    fn file(&mut self) -> IoResult<&mut TiffFile> {
        self.open(true)?;
        self.cache.get_mut()
    }

    /// Number of image file directories.
    pub fn num_directories(&mut self) -> IoResult<usize> {
        Ok(self.file()?.directories)
    }

    /// Index of the directory subsequent queries target.
    pub fn directory(&mut self) -> IoResult<usize> {
        Ok(self.file()?.directory)
    }

    /// Selects the directory subsequent queries target.
    ///
    /// # Errors
    ///
    /// [`IoError::InvalidOption`] if `index` is out of range.
    pub fn set_directory(&mut self, index: usize) -> IoResult<()> {
        let path = self.path().to_path_buf();
        let file = self.file()?;
        if index == file.directory {
            return Ok(());
        }
        if index >= file.directories {
            return Err(IoError::invalid_option(
                "directory",
                format!("{} out of range, file has {}", index, file.directories),
            ));
        }
        *file = TiffFile::at_directory(&path, index, file.directories)?;
        Ok(())
    }
}

impl ImageReader for TiffReader {
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
        let read = File::open(path).and_then(|mut f| std::io::Read::read_exact(&mut f, &mut magic));
        read.is_ok()
            && matches!(
                magic,
                [b'I', b'I', 42, 0] | [b'M', b'M', 0, 42] | [b'I', b'I', 43, 0] | [b'M', b'M', 0, 43]
            )
    }

    fn open(&mut self, throw_on_failure: bool) -> IoResult<bool> {
        self.cache.open(throw_on_failure, TiffFile::open)
    }

    fn channel_names(&mut self) -> IoResult<Vec<String>> {
        Ok(self.file()?.layout.channels.clone())
    }

    fn data_window(&mut self) -> IoResult<Rect> {
        Ok(self.file()?.layout.data_window)
    }

    fn display_window(&mut self) -> IoResult<Rect> {
        Ok(self.file()?.layout.display_window)
    }

    fn is_complete(&mut self) -> bool {
        let Ok(file) = self.file() else {
            return false;
        };
        let last = file.layout.chunk_count().saturating_sub(1);
        match file.decoder.read_chunk(last) {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "last TIFF chunk does not decode");
                false
            }
        }
    }

    fn header(&mut self) -> IoResult<Attrs> {
        let file = self.file()?;
        let layout = &file.layout;
        let mut attrs = layout.attrs.clone();
        attrs.set("dataWindow", layout.data_window);
        attrs.set("displayWindow", layout.display_window);
        attrs.set("Format", FORMAT);
        attrs.set("Directory", file.directory as u32);
        attrs.set("Directories", file.directories as u32);
        Ok(attrs)
    }

    fn native_kind(&mut self, _name: &str) -> IoResult<SampleKind> {
        Ok(self.file()?.layout.kind)
    }

    fn default_color_space(&mut self) -> IoResult<ColorSpace> {
        Ok(match self.file()?.layout.kind {
            SampleKind::U8 => ColorSpace::Srgb,
            _ => ColorSpace::Linear,
        })
    }

    fn read_native(&mut self, name: &str, window: Rect) -> IoResult<ChannelData> {
        let file = self.file()?;
        let layout = file.layout.clone();
        let channel = layout
            .channels
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| IoError::MissingChannel(name.to_string()))?;

        // Chunk grid coordinates are relative to the data window origin.
        let local = window.translate(-layout.data_window.min_x, -layout.data_window.min_y);
        let (cw, ch) = (layout.chunk_width, layout.chunk_height);
        let across = layout.chunks_across();
        let mut out = ChannelData::zeros(layout.kind, window.area());

        for cy in local.min_y as u32 / ch..=local.max_y as u32 / ch {
            for cx in local.min_x as u32 / cw..=local.max_x as u32 / cw {
                let index = cy * across + cx;
                let chunk = file.decoder.read_chunk(index).map_err(|e| {
                    warn!(chunk = index, error = %e, "TIFF chunk failed to decode");
                    decode_error(e)
                })?;
                let (aw, ah) = file.decoder.chunk_data_dimensions(index);
                let rect = Rect::from_origin_size((cx * cw) as i32, (cy * ch) as i32, aw, ah);
                let spp = layout.samples_per_pixel;
                match (&mut out, &chunk) {
                    (ChannelData::U8(o), DecodingResult::U8(s)) => gather(o, s, rect, local, spp, channel)?,
                    (ChannelData::U16(o), DecodingResult::U16(s)) => gather(o, s, rect, local, spp, channel)?,
                    (ChannelData::U32(o), DecodingResult::U32(s)) => gather(o, s, rect, local, spp, channel)?,
                    (ChannelData::F32(o), DecodingResult::F32(s)) => gather(o, s, rect, local, spp, channel)?,
                    (ChannelData::F64(o), DecodingResult::F64(s)) => gather(o, s, rect, local, spp, channel)?,
                    _ => {
                        return Err(IoError::DecodeError(format!(
                            "TIFF chunk {} does not hold {} samples",
                            index, layout.kind
                        )));
                    }
                }
            }
        }
        Ok(out)
    }
}

// === Writer Options ===

/// TIFF compression method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// No compression.
    None,
    /// LZW compression (lossless, good compression).
    #[default]
    Lzw,
    /// ZIP/Deflate compression.
    Deflate,
    /// PackBits compression (simple RLE).
    PackBits,
    /// JPEG compression. Not encodable here, written as LZW with a warning.
    Jpeg,
}

impl Compression {
    /// Parses `none`, `lzw`, `deflate`, `packbits` or `jpeg`.
    pub fn from_name(name: &str) -> IoResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "lzw" => Ok(Self::Lzw),
            "deflate" | "zip" => Ok(Self::Deflate),
            "packbits" => Ok(Self::PackBits),
            "jpeg" => Ok(Self::Jpeg),
            other => Err(IoError::invalid_option("compression", format!("unknown method '{}'", other))),
        }
    }
}

/// Options for writing TIFF files.
#[derive(Debug, Clone)]
pub struct TiffWriterOptions {
    /// 8 and 16 write unsigned integers, 32 writes floats. Default: 16.
    pub bit_depth: u8,
    /// Default: LZW.
    pub compression: Compression,
}

impl Default for TiffWriterOptions {
    fn default() -> Self {
        Self {
            bit_depth: 16,
            compression: Compression::Lzw,
        }
    }
}

/// Photometric layout chosen for the written channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Gray,
    Rgb,
    Rgba,
}

// === TiffWriter ===

/// TIFF format writer.
#[derive(Debug, Clone)]
pub struct TiffWriter {
    path: PathBuf,
    options: TiffWriterOptions,
}

impl TiffWriter {
    /// Creates a writer for `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, TiffWriterOptions::default())
    }

    /// Creates a writer with explicit options.
    pub fn with_options(path: impl Into<PathBuf>, options: TiffWriterOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// Current options.
    pub fn options(&self) -> &TiffWriterOptions {
        &self.options
    }

    fn layout(plan: &mut WritePlan) -> IoResult<Layout> {
        let rgb = ["R", "G", "B"].iter().filter(|c| plan.has(c)).count();
        match rgb {
            3 => {
                if plan.has("Y") {
                    warn!(format = FORMAT, channel = "Y", "luminance cannot be stored with RGB, skipping");
                    plan.channels.retain(|c| c != "Y");
                }
                Ok(if plan.has("A") { Layout::Rgba } else { Layout::Rgb })
            }
            0 if plan.has("Y") => {
                if plan.has("A") {
                    warn!(format = FORMAT, channel = "A", "alpha is only stored with RGB, skipping");
                    plan.channels.retain(|c| c != "A");
                }
                Ok(Layout::Gray)
            }
            0 => Err(IoError::NoChannels(FORMAT)),
            n => Err(IoError::EncodeError(format!(
                "TIFF needs all of R, G, B, found {} of them",
                n
            ))),
        }
    }

    /// Interleaves the write region of `names`.
    fn interleave<T: Sample>(plan: &WritePlan, image: &Image, names: &[&str]) -> IoResult<Vec<T>> {
        let planes = names
            .iter()
            .map(|n| plan.region_buffer::<T>(image, n))
            .collect::<IoResult<Vec<_>>>()?;
        let mut out = Vec::with_capacity(plan.region.area() * names.len());
        for i in 0..plan.region.area() {
            out.extend(planes.iter().map(|p| p[i]));
        }
        Ok(out)
    }

    fn encode<C>(&self, plan: &WritePlan, data: &[C::Inner]) -> IoResult<()>
    where
        C: colortype::ColorType,
        [C::Inner]: TiffValue,
    {
        let codec = match self.options.compression {
            Compression::None => Codec::Uncompressed,
            Compression::Lzw | Compression::Jpeg => Codec::Lzw,
            Compression::Deflate => Codec::Deflate(DeflateLevel::default()),
            Compression::PackBits => Codec::Packbits,
        };

        let file = BufWriter::new(File::create(&self.path)?);
        let mut encoder = TiffEncoder::new(file)
            .map_err(encode_error)?
            .with_compression(codec);
        let region = plan.region;
        let mut image = encoder
            .new_image::<C>(region.width(), region.height())
            .map_err(encode_error)?;
        image.rows_per_strip(ROWS_PER_STRIP).map_err(encode_error)?;

        let dir = image.encoder();
        dir.write_tag(Tag::Software, SOFTWARE).map_err(encode_error)?;
        if plan.has("A") {
            dir.write_tag(Tag::ExtraSamples, EXTRA_SAMPLE_UNASSOCIATED_ALPHA)
                .map_err(encode_error)?;
        }
        if region != plan.display_window {
            let x = (region.min_x - plan.display_window.min_x) as u32;
            let y = (region.min_y - plan.display_window.min_y) as u32;
            dir.write_tag(Tag::Unknown(X_POSITION), Rational { n: x, d: 1 }).map_err(encode_error)?;
            dir.write_tag(Tag::Unknown(Y_POSITION), Rational { n: y, d: 1 }).map_err(encode_error)?;
            dir.write_tag(Tag::Unknown(PIXAR_IMAGE_FULL_WIDTH), plan.width())
                .map_err(encode_error)?;
            dir.write_tag(Tag::Unknown(PIXAR_IMAGE_FULL_LENGTH), plan.height())
                .map_err(encode_error)?;
        }
        image.write_data(data).map_err(encode_error)?;
        Ok(())
    }
}

impl ImageWriter for TiffWriter {
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
        matches!(name, "R" | "G" | "B" | "A" | "Y")
    }

    fn write(&mut self, image: &Image, options: &WriteOptions) -> IoResult<()> {
        let mut bit_depth = self.options.bit_depth;
        if !matches!(bit_depth, 8 | 16 | 32) {
            return Err(IoError::invalid_option(
                "bitDepth",
                format!("{} is not one of 8, 16, 32", bit_depth),
            ));
        }
        if self.options.compression == Compression::Jpeg {
            warn!(format = FORMAT, "JPEG compression is not available, writing 8-bit LZW");
            bit_depth = 8;
        }

        let detected = if bit_depth == 8 {
            ColorSpace::Srgb
        } else {
            ColorSpace::Linear
        };
        let mut plan = WritePlan::new(FORMAT, image, options, detected, |n| self.supports_channel(n))?;
        let layout = Self::layout(&mut plan)?;
        if plan.region.is_empty() {
            return Err(IoError::EncodeError(format!(
                "write region of {} is empty",
                self.path.display()
            )));
        }

        let names: &[&str] = match layout {
            Layout::Gray => &["Y"],
            Layout::Rgb => &["R", "G", "B"],
            Layout::Rgba => &["R", "G", "B", "A"],
        };
        match (layout, bit_depth) {
            (Layout::Gray, 8) => self.encode::<colortype::Gray8>(&plan, &Self::interleave(&plan, image, names)?),
            (Layout::Gray, 16) => self.encode::<colortype::Gray16>(&plan, &Self::interleave(&plan, image, names)?),
            (Layout::Gray, _) => self.encode::<colortype::Gray32Float>(&plan, &Self::interleave(&plan, image, names)?),
            (Layout::Rgb, 8) => self.encode::<colortype::RGB8>(&plan, &Self::interleave(&plan, image, names)?),
            (Layout::Rgb, 16) => self.encode::<colortype::RGB16>(&plan, &Self::interleave(&plan, image, names)?),
            (Layout::Rgb, _) => self.encode::<colortype::RGB32Float>(&plan, &Self::interleave(&plan, image, names)?),
            (Layout::Rgba, 8) => self.encode::<colortype::RGBA8>(&plan, &Self::interleave(&plan, image, names)?),
            (Layout::Rgba, 16) => self.encode::<colortype::RGBA16>(&plan, &Self::interleave(&plan, image, names)?),
            (Layout::Rgba, _) => self.encode::<colortype::RGBA32Float>(&plan, &Self::interleave(&plan, image, names)?),
        }
    }
}
