//! Truevision TGA format support.
//!
//! # Supported files
//!
//! | Field | Accepted |
//! |-------|----------|
//! | colour map type | 0 |
//! | image type | 2 (true colour), 10 (RLE true colour) |
//! | pixel depth | 24 (BGR), 32 (BGRA) |
//! | alpha bits | 0, or 8 at depth 32 |
//!
//! Multi-byte header fields are little-endian. Pixels are stored blue
//! first. Descriptor bit 5 marks top-down rows (bottom-up otherwise) and
//! bit 4 marks right-to-left columns. The image ID field is skipped.
//!
//! The data window starts at the header's x/y origin. TGA has no magic
//! number, so probing requires a `.tga` extension and a sane header.
//!
//! RLE data cannot be addressed by row, so the whole pixel block is
//! decoded on first access and kept with the header. A truncated stream
//! is reported with a warning and the missing pixels read as zero.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use plate_core::{ChannelData, ColorSpace, Image, Rect, SampleKind};
use tracing::{debug, warn};

use crate::attrs::Attrs;
use crate::options::WriteOptions;
use crate::traits::HeaderCache;
use crate::writer::WritePlan;
use crate::{ImageReader, ImageWriter, IoError, IoResult};

// === Constants ===

const HEADER_SIZE: usize = 18;

const TYPE_TRUE_COLOR: u8 = 2;
const TYPE_RLE_TRUE_COLOR: u8 = 10;

/// Descriptor bit: columns run right to left.
const DESC_RIGHT_TO_LEFT: u8 = 1 << 4;
/// Descriptor bit: rows run top to bottom.
const DESC_TOP_DOWN: u8 = 1 << 5;
const DESC_ALPHA_BITS: u8 = 0x0f;

/// Pixels per RLE packet.
const MAX_PACKET: usize = 128;

const FORMAT: &str = "TGA";

mod offset {
    pub const ID_LENGTH: usize = 0;
    pub const COLOR_MAP_TYPE: usize = 1;
    pub const IMAGE_TYPE: usize = 2;
    pub const X_ORIGIN: usize = 8;
    pub const Y_ORIGIN: usize = 10;
    pub const WIDTH: usize = 12;
    pub const HEIGHT: usize = 14;
    pub const PIXEL_DEPTH: usize = 16;
    pub const DESCRIPTOR: usize = 17;
}

// === Header ===

#[derive(Debug, Clone)]
struct TgaHeader {
    id_length: u8,
    color_map_type: u8,
    image_type: u8,
    x_origin: u16,
    y_origin: u16,
    width: u16,
    height: u16,
    pixel_depth: u8,
    descriptor: u8,
}

impl TgaHeader {
    fn parse(buf: &[u8; HEADER_SIZE]) -> Self {
        Self {
            id_length: buf[offset::ID_LENGTH],
            color_map_type: buf[offset::COLOR_MAP_TYPE],
            image_type: buf[offset::IMAGE_TYPE],
            x_origin: LittleEndian::read_u16(&buf[offset::X_ORIGIN..]),
            y_origin: LittleEndian::read_u16(&buf[offset::Y_ORIGIN..]),
            width: LittleEndian::read_u16(&buf[offset::WIDTH..]),
            height: LittleEndian::read_u16(&buf[offset::HEIGHT..]),
            pixel_depth: buf[offset::PIXEL_DEPTH],
            descriptor: buf[offset::DESCRIPTOR],
        }
    }

    fn validate(&self, path: &Path) -> IoResult<()> {
        if self.color_map_type != 0 {
            return Err(IoError::unsupported(FORMAT, "colour map type", self.color_map_type, path));
        }
        if self.image_type != TYPE_TRUE_COLOR && self.image_type != TYPE_RLE_TRUE_COLOR {
            return Err(IoError::unsupported(FORMAT, "image type", self.image_type, path));
        }
        if self.pixel_depth != 24 && self.pixel_depth != 32 {
            return Err(IoError::unsupported(FORMAT, "pixel depth", self.pixel_depth, path));
        }
        let alpha_bits = self.alpha_bits();
        let alpha_ok = match self.pixel_depth {
            32 => alpha_bits == 0 || alpha_bits == 8,
            _ => alpha_bits == 0,
        };
        if !alpha_ok {
            return Err(IoError::unsupported(FORMAT, "alpha channel bits", alpha_bits, path));
        }
        if self.width == 0 || self.height == 0 {
            return Err(IoError::InvalidFile(format!(
                "{}: empty image {}x{}",
                path.display(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    fn alpha_bits(&self) -> u8 {
        self.descriptor & DESC_ALPHA_BITS
    }

    fn bytes_per_pixel(&self) -> usize {
        self.pixel_depth as usize / 8
    }

    fn data_window(&self) -> Rect {
        Rect::from_origin_size(
            self.x_origin as i32,
            self.y_origin as i32,
            self.width as u32,
            self.height as u32,
        )
    }

    fn channel_names(&self) -> Vec<String> {
        let mut names = vec!["R".to_string(), "G".to_string(), "B".to_string()];
        if self.pixel_depth == 32 && self.alpha_bits() != 0 {
            names.push("A".to_string());
        }
        names
    }

    /// Byte offset of a channel inside a stored pixel.
    fn byte_index(name: &str) -> Option<usize> {
        match name {
            "B" => Some(0),
            "G" => Some(1),
            "R" => Some(2),
            "A" => Some(3),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct TgaFile {
    header: TgaHeader,
    file: File,
    /// Decoded pixel block in storage order.
    pixels: Option<Vec<u8>>,
    /// Set when the pixel block ended early.
    truncated: bool,
}

impl TgaFile {
    fn open(path: &Path) -> IoResult<Self> {
        let mut file = File::open(path)?;
        let mut buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut buf)?;
        let header = TgaHeader::parse(&buf);
        header.validate(path)?;

        // Image ID
        let mut id = vec![0u8; header.id_length as usize];
        file.read_exact(&mut id)?;

        debug!(
            path = %path.display(),
            width = header.width,
            height = header.height,
            depth = header.pixel_depth,
            rle = header.image_type == TYPE_RLE_TRUE_COLOR,
            "TGA header"
        );
        Ok(Self {
            header,
            file,
            pixels: None,
            truncated: false,
        })
    }

    /// Decodes the pixel block once.
    ///
    /// Only the bytes actually present are kept, so a header claiming more
    /// pixels than the file holds never sizes an allocation.
    fn pixels(&mut self, path: &Path) -> IoResult<&[u8]> {
        if self.pixels.is_none() {
            let h = &self.header;
            let bpp = h.bytes_per_pixel();
            let size = h.width as usize * h.height as usize * bpp;
            let mut data = Vec::new();
            self.file.read_to_end(&mut data)?;

            let pixels = if h.image_type == TYPE_RLE_TRUE_COLOR {
                decode_rle(&data, size, bpp)
            } else {
                data.truncate(size);
                data
            };
            let complete = pixels.len() == size;
            if !complete {
                warn!(
                    path = %path.display(),
                    expected = size,
                    decoded = pixels.len(),
                    "incomplete TGA pixel data, missing pixels are zero"
                );
            }
            self.truncated = !complete;
            self.pixels = Some(pixels);
        }
        Ok(self.pixels.as_deref().unwrap_or_default())
    }
}

// === RLE ===

/// Expands RLE packets into at most `size` bytes. A stream that ends early
/// yields the pixels decoded so far.
fn decode_rle(src: &[u8], size: usize, bpp: usize) -> Vec<u8> {
    // Each packet takes at least 1 + bpp bytes and expands to at most
    // MAX_PACKET pixels.
    let expandable = src.len() / (1 + bpp) * MAX_PACKET * bpp;
    let mut out = Vec::with_capacity(size.min(expandable));
    let mut s = 0;
    while out.len() < size {
        let Some(&packet) = src.get(s) else {
            break;
        };
        s += 1;
        let count = (packet & 0x7f) as usize + 1;
        let bytes = (count * bpp).min(size - out.len());
        if packet & 0x80 != 0 {
            let Some(pixel) = src.get(s..s + bpp) else {
                break;
            };
            out.extend(pixel.iter().copied().cycle().take(bytes));
            s += bpp;
        } else {
            let available = src.len().saturating_sub(s).min(bytes);
            out.extend_from_slice(&src[s..s + available]);
            if available < bytes {
                break;
            }
            s += count * bpp;
        }
    }
    out
}

/// Appends RLE packets for one row of `bpp`-byte pixels.
fn encode_rle_row(row: &[u8], bpp: usize, out: &mut Vec<u8>) {
    let pixels: Vec<&[u8]> = row.chunks_exact(bpp).collect();
    let n = pixels.len();
    let mut i = 0;
    while i < n {
        let mut run = 1;
        while i + run < n && run < MAX_PACKET && pixels[i + run] == pixels[i] {
            run += 1;
        }
        if run >= 2 {
            out.push(0x80 | (run - 1) as u8);
            out.extend_from_slice(pixels[i]);
            i += run;
            continue;
        }

        let start = i;
        while i < n && i - start < MAX_PACKET && (i + 1 >= n || pixels[i] != pixels[i + 1]) {
            i += 1;
        }
        if i == start {
            continue;
        }
        out.push((i - start - 1) as u8);
        for p in &pixels[start..i] {
            out.extend_from_slice(p);
        }
    }
}

// === TgaReader ===

/// TGA format reader.
///
/// Channels are `R`, `G`, `B` and, for 32-bit files with alpha bits,
/// `A`. Raw reads return `U8`.
#[derive(Debug)]
pub struct TgaReader {
    cache: HeaderCache<TgaFile>,
}

impl TgaReader {
    /// Creates a reader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            cache: HeaderCache::new(path.into()),
        }
    }

    fn file(&mut self) -> IoResult<&mut TgaFile> {
        self.open(true)?;
        self.cache.get_mut()
    }
}

impl ImageReader for TgaReader {
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
        let is_tga = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("tga"));
        if !is_tga {
            return false;
        }
        let mut buf = [0u8; HEADER_SIZE];
        let read = File::open(path).and_then(|mut f| f.read_exact(&mut buf));
        read.is_ok() && TgaHeader::parse(&buf).validate(path).is_ok()
    }

    fn open(&mut self, throw_on_failure: bool) -> IoResult<bool> {
        self.cache.open(throw_on_failure, TgaFile::open)
    }

    fn channel_names(&mut self) -> IoResult<Vec<String>> {
        Ok(self.file()?.header.channel_names())
    }

    fn data_window(&mut self) -> IoResult<Rect> {
        Ok(self.file()?.header.data_window())
    }

    fn display_window(&mut self) -> IoResult<Rect> {
        self.data_window()
    }

    fn is_complete(&mut self) -> bool {
        let path = self.path().to_path_buf();
        let Ok(file) = self.file() else {
            return false;
        };
        file.pixels(&path).is_ok() && !file.truncated
    }

    fn header(&mut self) -> IoResult<Attrs> {
        let h = &self.file()?.header;
        let mut attrs = Attrs::new();
        attrs.set("dataWindow", h.data_window());
        attrs.set("displayWindow", h.data_window());
        attrs.set("Format", FORMAT);
        attrs.set("ImageType", h.image_type as u32);
        attrs.set("PixelDepth", h.pixel_depth as u32);
        attrs.set("AlphaBits", h.alpha_bits() as u32);
        attrs.set("Compression", if h.image_type == TYPE_RLE_TRUE_COLOR { "rle" } else { "none" });
        attrs.set(
            "Orientation",
            match (h.descriptor & DESC_TOP_DOWN != 0, h.descriptor & DESC_RIGHT_TO_LEFT != 0) {
                (true, false) => "top-left",
                (true, true) => "top-right",
                (false, false) => "bottom-left",
                (false, true) => "bottom-right",
            },
        );
        Ok(attrs)
    }

    fn native_kind(&mut self, _name: &str) -> IoResult<SampleKind> {
        Ok(SampleKind::U8)
    }

    fn default_color_space(&mut self) -> IoResult<ColorSpace> {
        Ok(ColorSpace::Srgb)
    }

    fn read_native(&mut self, name: &str, window: Rect) -> IoResult<ChannelData> {
        let path = self.path().to_path_buf();
        let file = self.file()?;
        let channel = TgaHeader::byte_index(name)
            .filter(|_| file.header.channel_names().iter().any(|n| n == name))
            .ok_or_else(|| IoError::MissingChannel(name.to_string()))?;

        let h = file.header.clone();
        let origin = h.data_window();
        let (w, ht) = (h.width as i32, h.height as i32);
        let bpp = h.bytes_per_pixel();
        let top_down = h.descriptor & DESC_TOP_DOWN != 0;
        let right_to_left = h.descriptor & DESC_RIGHT_TO_LEFT != 0;
        let pixels = file.pixels(&path)?;

        let mut out = Vec::with_capacity(window.area());
        for y in window.min_y..=window.max_y {
            let ly = y - origin.min_y;
            let row = if top_down { ly } else { ht - 1 - ly } as usize;
            for x in window.min_x..=window.max_x {
                let lx = x - origin.min_x;
                let col = if right_to_left { w - 1 - lx } else { lx } as usize;
                let index = (row * w as usize + col) * bpp + channel;
                out.push(pixels.get(index).copied().unwrap_or(0));
            }
        }
        Ok(ChannelData::U8(out))
    }
}

// === Writer Options ===

/// Options for writing TGA files.
#[derive(Debug, Clone, Default)]
pub struct TgaWriterOptions {
    /// Run-length encode pixels (image type 10). Default: `false`.
    pub rle: bool,
}

// === TgaWriter ===

/// TGA format writer.
///
/// Writes 8-bit top-down `RGB`, or `RGBA` when the image has alpha. The
/// display window origin is stored in the header and must lie in
/// `0..=65535` on both axes.
#[derive(Debug, Clone)]
pub struct TgaWriter {
    path: PathBuf,
    options: TgaWriterOptions,
}

impl TgaWriter {
    /// Creates a writer for `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, TgaWriterOptions::default())
    }

    /// Creates a writer with explicit options.
    pub fn with_options(path: impl Into<PathBuf>, options: TgaWriterOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }
}

impl ImageWriter for TgaWriter {
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
        matches!(name, "R" | "G" | "B" | "A")
    }

    fn write(&mut self, image: &Image, options: &WriteOptions) -> IoResult<()> {
        let plan = WritePlan::new(FORMAT, image, options, ColorSpace::Srgb, |n| {
            self.supports_channel(n)
        })?;
        let (width, height) = (plan.width(), plan.height());
        if width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(IoError::EncodeError(format!(
                "TGA cannot store {}x{} images",
                width, height
            )));
        }

        let alpha = plan.has("A");
        let bpp = if alpha { 4 } else { 3 };
        // Storage order: B, G, R, A
        let mut stored: Vec<Option<Vec<u8>>> = Vec::with_capacity(bpp);
        for name in ["B", "G", "R", "A"].iter().take(bpp) {
            stored.push(if plan.has(name) {
                Some(plan.display_buffer::<u8>(image, name)?)
            } else {
                None
            });
        }
        let mut pixels = vec![0u8; plan.display_window.area() * bpp];
        for (c, plane) in stored.iter().enumerate() {
            if let Some(plane) = plane {
                for (i, &v) in plane.iter().enumerate() {
                    pixels[i * bpp + c] = v;
                }
            }
        }

        let origin = |v: i32| {
            u16::try_from(v).map_err(|_| {
                let corner = (plan.display_window.min_x, plan.display_window.min_y);
                IoError::unsupported(FORMAT, "origin", format!("{:?}", corner), &self.path)
            })
        };
        let (x_origin, y_origin) = (
            origin(plan.display_window.min_x)?,
            origin(plan.display_window.min_y)?,
        );
        let mut header = [0u8; HEADER_SIZE];
        header[offset::IMAGE_TYPE] = if self.options.rle {
            TYPE_RLE_TRUE_COLOR
        } else {
            TYPE_TRUE_COLOR
        };
        LittleEndian::write_u16(&mut header[offset::X_ORIGIN..], x_origin);
        LittleEndian::write_u16(&mut header[offset::Y_ORIGIN..], y_origin);
        LittleEndian::write_u16(&mut header[offset::WIDTH..], width as u16);
        LittleEndian::write_u16(&mut header[offset::HEIGHT..], height as u16);
        header[offset::PIXEL_DEPTH] = (bpp * 8) as u8;
        header[offset::DESCRIPTOR] = DESC_TOP_DOWN | if alpha { 8 } else { 0 };

        let mut out = BufWriter::new(File::create(&self.path)?);
        out.write_all(&header)?;
        if self.options.rle {
            let mut encoded = Vec::with_capacity(pixels.len());
            for row in pixels.chunks_exact(width as usize * bpp) {
                encode_rle_row(row, bpp, &mut encoded);
            }
            out.write_all(&encoded)?;
        } else {
            out.write_all(&pixels)?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReadOptions;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    fn header(image_type: u8, width: u16, height: u16, depth: u8, descriptor: u8) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_SIZE];
        h[offset::IMAGE_TYPE] = image_type;
        LittleEndian::write_u16(&mut h[offset::WIDTH..], width);
        LittleEndian::write_u16(&mut h[offset::HEIGHT..], height);
        h[offset::PIXEL_DEPTH] = depth;
        h[offset::DESCRIPTOR] = descriptor;
        h
    }

    #[test]
    fn test_roundtrip_rle_rgba() {
        let path = temp_path("plate_tga_rle.tga");
        let mut image = Image::with_window(Rect::from_size(4, 2));
        image.insert_channel("R", ChannelData::from(vec![9u8, 9, 9, 9, 1, 2, 3, 4])).unwrap();
        image.insert_channel("G", ChannelData::from(vec![0u8; 8])).unwrap();
        image.insert_channel("B", ChannelData::from(vec![5u8, 5, 6, 6, 7, 7, 7, 8])).unwrap();
        image.insert_channel("A", ChannelData::from(vec![255u8; 8])).unwrap();

        let mut writer = TgaWriter::with_options(&path, TgaWriterOptions { rle: true });
        writer.write(&image, &WriteOptions::default()).unwrap();

        let mut reader = TgaReader::new(&path);
        assert_eq!(reader.channel_names().unwrap(), vec!["R", "G", "B", "A"]);
        let back = reader.read(&ReadOptions::default().raw()).unwrap();
        for name in ["R", "G", "B", "A"] {
            assert_eq!(back.channel(name).unwrap(), image.channel(name).unwrap());
        }
        assert!(reader.is_complete());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_bottom_up_with_id_field() {
        let path = temp_path("plate_tga_bottom_up.tga");
        let mut bytes = header(TYPE_TRUE_COLOR, 1, 2, 24, 0);
        bytes[offset::ID_LENGTH] = 3;
        bytes.extend_from_slice(b"abc");
        // Stored bottom row first: BGR
        bytes.extend_from_slice(&[0, 0, 10]);
        bytes.extend_from_slice(&[0, 0, 20]);
        std::fs::write(&path, bytes).unwrap();

        let mut reader = TgaReader::new(&path);
        let r = reader.read_channel("R", Rect::from_size(1, 2), true).unwrap();
        assert_eq!(r, ChannelData::U8(vec![20, 10]));
        assert!(reader.read_channel("A", Rect::from_size(1, 1), true).is_err());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_truncated_rle_keeps_partial_data() {
        let path = temp_path("plate_tga_truncated.tga");
        let mut bytes = header(TYPE_RLE_TRUE_COLOR, 4, 1, 24, DESC_TOP_DOWN);
        // Run of two pixels, then a raw packet announcing two but holding one.
        bytes.extend_from_slice(&[0x81, 1, 2, 3, 0x01, 4, 5, 6]);
        std::fs::write(&path, bytes).unwrap();

        let mut reader = TgaReader::new(&path);
        let b = reader.read_channel("B", Rect::from_size(4, 1), true).unwrap();
        assert_eq!(b, ChannelData::U8(vec![1, 1, 4, 0]));
        assert!(!reader.is_complete());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_origin_sets_windows() {
        let path = temp_path("plate_tga_origin.tga");
        let mut bytes = header(TYPE_TRUE_COLOR, 2, 1, 24, DESC_TOP_DOWN | DESC_RIGHT_TO_LEFT);
        LittleEndian::write_u16(&mut bytes[offset::X_ORIGIN..], 10);
        LittleEndian::write_u16(&mut bytes[offset::Y_ORIGIN..], 5);
        bytes.extend_from_slice(&[0, 1, 0, 0, 2, 0]);
        std::fs::write(&path, bytes).unwrap();

        let mut reader = TgaReader::new(&path);
        assert_eq!(reader.data_window().unwrap(), Rect::new(10, 5, 11, 5));
        let g = reader.read_channel("G", Rect::new(10, 5, 11, 5), true).unwrap();
        assert_eq!(g, ChannelData::U8(vec![2, 1]));
        assert_eq!(reader.header().unwrap().get_str("Orientation"), Some("top-right"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_huge_header_over_short_data() {
        let path = temp_path("plate_tga_huge.tga");
        let mut bytes = header(TYPE_TRUE_COLOR, 65535, 65535, 32, DESC_TOP_DOWN);
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        std::fs::write(&path, &bytes).unwrap();

        let mut reader = TgaReader::new(&path);
        let r = reader.read_channel("R", Rect::from_size(2, 1), true).unwrap();
        assert_eq!(r, ChannelData::U8(vec![3, 0]));
        assert!(!reader.is_complete());

        // A single run packet can only cover 128 pixels.
        let mut bytes = header(TYPE_RLE_TRUE_COLOR, 65535, 65535, 32, DESC_TOP_DOWN);
        bytes.extend_from_slice(&[0xFF, 1, 2, 3, 4]);
        std::fs::write(&path, &bytes).unwrap();

        let mut reader = TgaReader::new(&path);
        let b = reader.read_channel("B", Rect::new(126, 0, 129, 0), true).unwrap();
        assert_eq!(b, ChannelData::U8(vec![1, 1, 0, 0]));
        assert!(!reader.is_complete());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_negative_origin_is_rejected() {
        let path = temp_path("plate_tga_negative_origin.tga");
        let window = Rect::new(-2, 0, 1, 1);
        let mut image = Image::with_window(window);
        for name in ["R", "G", "B"] {
            image.insert_channel(name, ChannelData::from(vec![1u8; 8])).unwrap();
        }

        let err = TgaWriter::new(&path)
            .write(&image, &WriteOptions::default())
            .unwrap_err();
        assert!(
            matches!(err, IoError::Unsupported { field: "origin", .. }),
            "{:?}",
            err
        );

        let mut shifted = Image::with_window(Rect::new(3, 7, 6, 8));
        for name in ["R", "G", "B"] {
            shifted.insert_channel(name, ChannelData::from(vec![1u8; 8])).unwrap();
        }
        TgaWriter::new(&path).write(&shifted, &WriteOptions::default()).unwrap();
        assert_eq!(TgaReader::new(&path).data_window().unwrap(), Rect::new(3, 7, 6, 8));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_can_read_needs_extension_and_header() {
        let tga = temp_path("plate_tga_probe.tga");
        let other = temp_path("plate_tga_probe.bin");
        let mut bytes = header(TYPE_TRUE_COLOR, 1, 1, 24, 0);
        bytes.extend_from_slice(&[0, 0, 0]);
        std::fs::write(&tga, &bytes).unwrap();
        std::fs::write(&other, &bytes).unwrap();
        assert!(TgaReader::can_read(&tga));
        assert!(!TgaReader::can_read(&other));

        std::fs::write(&tga, b"not a targa file at all").unwrap();
        assert!(!TgaReader::can_read(&tga));

        let _ = std::fs::remove_file(&tga);
        let _ = std::fs::remove_file(&other);
    }
}
