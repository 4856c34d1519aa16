//! DPX (Digital Picture Exchange) format support.
//!
//! Industry standard for film scanning and digital intermediate work.
//! Commonly used in VFX pipelines for frame sequences.
//!
//! # Features
//!
//! - 10-bit RGB printing density, filled method A (3 codes per `u32`)
//! - Big-endian and little-endian files
//! - Row and column order from the orientation field
//! - Windowed reads: only the requested rows and columns are fetched
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use plate_io::dpx::{DpxReader, DpxWriter};
//! use plate_io::{ImageReader, ImageWriter, ReadOptions, WriteOptions};
//!
//! let image = DpxReader::new("frame.0001.dpx").read(&ReadOptions::default())?;
//! DpxWriter::new("output.0001.dpx").write(&image, &WriteOptions::default())?;
//! ```
//!
//! # Transfer
//!
//! | Transfer | Decoded as |
//! |----------|------------|
//! | 1 (printing density) | Log-Linear Codec |
//! | 2 (linear) | `code / 1023` |
//! | anything else | Log-Linear Codec |
//!
//! Raw reads return the 10-bit codes as `U16` samples.
//!
//! # Format Details
//!
//! DPX is defined by SMPTE 268M. Key characteristics:
//! - Magic: "SDPX" (big-endian) or "XPDS" (little-endian)
//! - Header: 2048 bytes (file + image + orientation + film + TV headers)
//! - Data: uncompressed, one 32-bit word per RGB pixel

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use plate_core::logcodec::MAX_CODE;
use plate_core::{ChannelData, ColorSpace, Image, LogCodec, Rect, SampleKind};
use tracing::debug;

use crate::attrs::Attrs;
use crate::options::WriteOptions;
use crate::packed::{self, PackedLayout};
use crate::traits::HeaderCache;
use crate::writer::WritePlan;
use crate::{ImageReader, ImageWriter, IoError, IoResult};

// === Constants ===

/// DPX magic number (big-endian): "SDPX"
const MAGIC_BE: u32 = 0x53445058;
/// DPX magic number (little-endian): "XPDS"
const MAGIC_LE: u32 = 0x58504453;
/// Standard header size
const HEADER_SIZE: u32 = 2048;

/// Size of the generic (file + image + orientation) header.
const GENERIC_HEADER_SIZE: u32 = 1664;
/// Size of the industry (film + TV) header.
const INDUSTRY_HEADER_SIZE: u32 = 384;

/// Descriptor for interleaved R, G, B.
const DESCRIPTOR_RGB: u8 = 50;
/// Transfer: printing density.
const TRANSFER_PRINTING_DENSITY: u8 = 1;
/// Transfer: linear.
const TRANSFER_LINEAR: u8 = 2;

/// "Undefined" marker for 32-bit header fields.
const UNDEFINED_U32: u32 = 0xFFFF_FFFF;

const FORMAT: &str = "DPX";

/// Channels in packing order.
const CHANNELS: [&str; 3] = ["R", "G", "B"];

// Field offsets within the header.
mod offset {
    pub const MAGIC: usize = 0;
    pub const IMAGE_OFFSET: usize = 4;
    pub const VERSION: usize = 8;
    pub const FILE_SIZE: usize = 16;
    pub const DITTO_KEY: usize = 20;
    pub const GENERIC_SIZE: usize = 24;
    pub const INDUSTRY_SIZE: usize = 28;
    pub const USER_SIZE: usize = 32;
    pub const FILE_NAME: usize = 36;
    pub const CREATE_TIME: usize = 136;
    pub const CREATOR: usize = 160;
    pub const PROJECT: usize = 260;
    pub const COPYRIGHT: usize = 460;
    pub const ENCRYPT_KEY: usize = 660;

    pub const ORIENTATION: usize = 768;
    pub const ELEMENT_COUNT: usize = 770;
    pub const PIXELS_PER_LINE: usize = 772;
    pub const LINES_PER_ELEMENT: usize = 776;

    // First image element.
    pub const DATA_SIGN: usize = 780;
    pub const REF_LOW_DATA: usize = 784;
    pub const REF_LOW_QUANTITY: usize = 788;
    pub const REF_HIGH_DATA: usize = 792;
    pub const REF_HIGH_QUANTITY: usize = 796;
    pub const DESCRIPTOR: usize = 800;
    pub const TRANSFER: usize = 801;
    pub const COLORIMETRIC: usize = 802;
    pub const BIT_SIZE: usize = 803;
    pub const PACKING: usize = 804;
    pub const ENCODING: usize = 806;
    pub const DATA_OFFSET: usize = 808;
    pub const EOL_PADDING: usize = 812;
    pub const EOI_PADDING: usize = 816;

    pub const X_OFFSET: usize = 1408;
    pub const Y_OFFSET: usize = 1412;
}

// === DPX Header ===

/// Parsed DPX file header.
#[derive(Debug, Clone)]
struct DpxHeader {
    big_endian: bool,
    version: String,
    /// Offset to image data.
    image_offset: u32,
    file_size: u32,
    file_name: String,
    create_time: String,
    creator: String,
    project: String,
    copyright: String,
    /// 0..=7, bit 0 mirrors x, bit 1 mirrors y, bit 2 transposes.
    orientation: u16,
    element_count: u16,
    width: u32,
    height: u32,
    data_sign: u32,
    descriptor: u8,
    transfer: u8,
    colorimetric: u8,
    bit_depth: u8,
    /// 0=packed, 1=filled method A, 2=filled method B
    packing: u16,
    encoding: u16,
    eol_padding: u32,
    x_offset: u32,
    y_offset: u32,
}

impl DpxHeader {
    /// Parses the fixed-size header block.
    fn parse(buf: &[u8]) -> IoResult<Self> {
        let magic = BigEndian::read_u32(&buf[offset::MAGIC..]);
        match magic {
            MAGIC_BE => Ok(Self::parse_with::<BigEndian>(buf, true)),
            MAGIC_LE => Ok(Self::parse_with::<LittleEndian>(buf, false)),
            _ => Err(IoError::DecodeError(format!(
                "invalid DPX magic: 0x{:08X}",
                magic
            ))),
        }
    }

    fn parse_with<B: ByteOrder>(buf: &[u8], big_endian: bool) -> Self {
        let u32_at = |o: usize| B::read_u32(&buf[o..]);
        let u16_at = |o: usize| B::read_u16(&buf[o..]);

        let image_offset = u32_at(offset::IMAGE_OFFSET);
        let data_offset = u32_at(offset::DATA_OFFSET);
        let eol_padding = u32_at(offset::EOL_PADDING);

        Self {
            big_endian,
            version: packed::text_field(&buf[offset::VERSION..offset::VERSION + 8]),
            // The element's own offset wins when it is set.
            image_offset: match data_offset {
                0 | UNDEFINED_U32 => image_offset,
                o => o,
            },
            file_size: u32_at(offset::FILE_SIZE),
            file_name: packed::text_field(&buf[offset::FILE_NAME..offset::CREATE_TIME]),
            create_time: packed::text_field(&buf[offset::CREATE_TIME..offset::CREATOR]),
            creator: packed::text_field(&buf[offset::CREATOR..offset::PROJECT]),
            project: packed::text_field(&buf[offset::PROJECT..offset::COPYRIGHT]),
            copyright: packed::text_field(&buf[offset::COPYRIGHT..offset::ENCRYPT_KEY]),
            orientation: u16_at(offset::ORIENTATION),
            element_count: u16_at(offset::ELEMENT_COUNT),
            width: u32_at(offset::PIXELS_PER_LINE),
            height: u32_at(offset::LINES_PER_ELEMENT),
            data_sign: u32_at(offset::DATA_SIGN),
            descriptor: buf[offset::DESCRIPTOR],
            transfer: buf[offset::TRANSFER],
            colorimetric: buf[offset::COLORIMETRIC],
            bit_depth: buf[offset::BIT_SIZE],
            packing: u16_at(offset::PACKING),
            encoding: u16_at(offset::ENCODING),
            eol_padding: if eol_padding == UNDEFINED_U32 { 0 } else { eol_padding },
            x_offset: u32_at(offset::X_OFFSET),
            y_offset: u32_at(offset::Y_OFFSET),
        }
    }

    /// Rejects everything the packed decoder cannot handle.
    fn validate(&self, path: &Path) -> IoResult<()> {
        let unsupported =
            |field: &'static str, value: u32| Err(IoError::unsupported(FORMAT, field, value, path));

        if self.element_count == 0 {
            return unsupported("image element count", 0);
        }
        if self.width == 0 || self.height == 0 {
            return Err(IoError::InvalidFile(format!(
                "{}: empty image {}x{}",
                path.display(),
                self.width,
                self.height
            )));
        }
        if self.bit_depth != 10 {
            return unsupported("bit depth", self.bit_depth as u32);
        }
        if self.descriptor != DESCRIPTOR_RGB {
            return unsupported("descriptor", self.descriptor as u32);
        }
        // Three 10-bit codes fill a word the same way under both schemes.
        if self.packing > 1 {
            return unsupported("packing", self.packing as u32);
        }
        if self.encoding != 0 {
            return unsupported("encoding", self.encoding as u32);
        }
        if self.data_sign != 0 {
            return unsupported("data sign", self.data_sign);
        }
        if self.orientation > 3 {
            return unsupported("orientation", self.orientation as u32);
        }
        Ok(())
    }

    fn layout(&self) -> PackedLayout {
        let mut layout = PackedLayout::new(
            self.image_offset as u64,
            self.width,
            self.height,
            self.big_endian,
        );
        layout.row_stride += self.eol_padding as u64;
        layout.flip_x = self.orientation & 1 != 0;
        layout.flip_y = self.orientation & 2 != 0;
        layout
    }

    fn data_window(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }
}

/// Header plus the open file.
#[derive(Debug)]
struct DpxFile {
    header: DpxHeader,
    layout: PackedLayout,
    file: File,
}

impl DpxFile {
    fn open(path: &Path) -> IoResult<Self> {
        let mut file = File::open(path)?;
        let mut buf = vec![0u8; HEADER_SIZE as usize];
        file.read_exact(&mut buf)?;

        let header = DpxHeader::parse(&buf)?;
        header.validate(path)?;
        debug!(
            path = %path.display(),
            width = header.width,
            height = header.height,
            big_endian = header.big_endian,
            transfer = header.transfer,
            orientation = header.orientation,
            "DPX header"
        );
        Ok(Self {
            layout: header.layout(),
            header,
            file,
        })
    }
}

// === DpxReader ===

/// DPX format reader.
///
/// Channels are always `R`, `G` and `B`. Data and display windows are both
/// `(0, 0)-(width-1, height-1)`.
#[derive(Debug)]
pub struct DpxReader {
    cache: HeaderCache<DpxFile>,
    decode_table: Vec<f32>,
}

impl DpxReader {
    /// Creates a reader for `path`. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            cache: HeaderCache::new(path.into()),
            decode_table: LogCodec::default().decode_table(),
        }
    }

    fn file(&mut self) -> IoResult<&mut DpxFile> {
        self.open(true)?;
        self.cache.get_mut()
    }
}

impl ImageReader for DpxReader {
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
        read.is_ok() && matches!(u32::from_be_bytes(magic), MAGIC_BE | MAGIC_LE)
    }

    fn open(&mut self, throw_on_failure: bool) -> IoResult<bool> {
        self.cache.open(throw_on_failure, DpxFile::open)
    }

    fn channel_names(&mut self) -> IoResult<Vec<String>> {
        self.file()?;
        Ok(CHANNELS.iter().map(|c| c.to_string()).collect())
    }

    fn data_window(&mut self) -> IoResult<Rect> {
        Ok(self.file()?.header.data_window())
    }

    fn display_window(&mut self) -> IoResult<Rect> {
        self.data_window()
    }

    fn is_complete(&mut self) -> bool {
        let Ok(file) = self.file() else {
            return false;
        };
        let last = file.header.height as i32 - 1;
        let row = Rect::new(0, last, file.header.width as i32 - 1, last);
        file.layout.read_words(&mut file.file, row).is_ok()
    }

    fn header(&mut self) -> IoResult<Attrs> {
        let h = &self.file()?.header;
        let mut attrs = Attrs::new();
        attrs.set("dataWindow", h.data_window());
        attrs.set("displayWindow", h.data_window());
        attrs.set("Format", FORMAT);
        attrs.set_text("Version", &h.version);
        attrs.set_text("FileName", &h.file_name);
        attrs.set_text("CreateTime", &h.create_time);
        attrs.set_text("Creator", &h.creator);
        attrs.set_text("Project", &h.project);
        attrs.set_text("Copyright", &h.copyright);
        attrs.set("Endian", if h.big_endian { "BE" } else { "LE" });
        attrs.set("ImageOffset", h.image_offset);
        attrs.set("FileSize", h.file_size);
        attrs.set("Orientation", h.orientation as u32);
        attrs.set("ElementCount", h.element_count as u32);
        attrs.set("Descriptor", h.descriptor as u32);
        attrs.set("Transfer", h.transfer as u32);
        attrs.set("Colorimetric", h.colorimetric as u32);
        attrs.set("BitDepth", h.bit_depth as u32);
        attrs.set("Packing", h.packing as u32);
        if h.x_offset != UNDEFINED_U32 {
            attrs.set("XOffset", h.x_offset);
        }
        if h.y_offset != UNDEFINED_U32 {
            attrs.set("YOffset", h.y_offset);
        }
        Ok(attrs)
    }

    fn native_kind(&mut self, _name: &str) -> IoResult<SampleKind> {
        Ok(SampleKind::U16)
    }

    fn read_native(&mut self, name: &str, window: Rect) -> IoResult<ChannelData> {
        let slot = CHANNELS
            .iter()
            .position(|c| *c == name)
            .ok_or_else(|| IoError::MissingChannel(name.to_string()))?;
        let file = self.file()?;
        let words = file.layout.read_words(&mut file.file, window)?;
        Ok(ChannelData::U16(packed::unpack_slot(&words, slot)))
    }

    fn decode_native(&mut self, _name: &str, data: ChannelData) -> IoResult<Vec<f32>> {
        let linear = self.file()?.header.transfer == TRANSFER_LINEAR;
        let Some(codes) = data.as_u16() else {
            return Ok(data.to_f32());
        };
        Ok(if linear {
            codes
                .iter()
                .map(|&c| (c & MAX_CODE) as f32 / MAX_CODE as f32)
                .collect()
        } else {
            codes
                .iter()
                .map(|&c| self.decode_table[(c & MAX_CODE) as usize])
                .collect()
        })
    }
}

// === Writer Options ===

/// Options for writing DPX files.
///
/// # Example
///
/// ```rust
/// use plate_io::dpx::{DpxWriter, DpxWriterOptions};
///
/// let writer = DpxWriter::with_options("out.dpx", DpxWriterOptions {
///     project: "show".to_string(),
///     ..Default::default()
/// });
/// assert_eq!(writer.options().creator, "plate-io");
/// ```
#[derive(Debug, Clone)]
pub struct DpxWriterOptions {
    /// Creator software name (written to header).
    pub creator: String,
    /// Project name.
    pub project: String,
    /// Copyright statement.
    pub copyright: String,
}

impl Default for DpxWriterOptions {
    fn default() -> Self {
        Self {
            creator: "plate-io".to_string(),
            project: String::new(),
            copyright: String::new(),
        }
    }
}

// === DpxWriter ===

/// DPX format writer.
///
/// Writes the display window as big-endian 10-bit printing density RGB.
/// Channels other than `R`, `G` and `B` are skipped; a missing colour
/// channel is stored as code 0.
///
/// With `raw_channels` set, `U16` source channels are taken as log codes
/// and stored unchanged (clamped to 1023).
#[derive(Debug, Clone)]
pub struct DpxWriter {
    path: PathBuf,
    options: DpxWriterOptions,
    codec: LogCodec,
}

impl DpxWriter {
    /// Creates a writer for `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, DpxWriterOptions::default())
    }

    /// Creates a writer with explicit options.
    pub fn with_options(path: impl Into<PathBuf>, options: DpxWriterOptions) -> Self {
        Self {
            path: path.into(),
            options,
            codec: LogCodec::default(),
        }
    }

    /// Current options.
    pub fn options(&self) -> &DpxWriterOptions {
        &self.options
    }

    /// Builds the 2048-byte big-endian header.
    fn header_bytes(&self, width: u32, height: u32, file_size: u32) -> Vec<u8> {
        let mut header = vec![0u8; HEADER_SIZE as usize];

        // File header (0-767)
        put_u32(&mut header, offset::MAGIC, MAGIC_BE);
        put_u32(&mut header, offset::IMAGE_OFFSET, HEADER_SIZE);
        packed::put_text(&mut header[offset::VERSION..offset::FILE_SIZE], "V2.0");
        put_u32(&mut header, offset::FILE_SIZE, file_size);
        put_u32(&mut header, offset::DITTO_KEY, 1);
        put_u32(&mut header, offset::GENERIC_SIZE, GENERIC_HEADER_SIZE);
        put_u32(&mut header, offset::INDUSTRY_SIZE, INDUSTRY_HEADER_SIZE);
        put_u32(&mut header, offset::USER_SIZE, 0);

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        packed::put_text(&mut header[offset::FILE_NAME..offset::CREATE_TIME], &file_name);
        packed::put_text(&mut header[offset::CREATOR..offset::PROJECT], &self.options.creator);
        packed::put_text(&mut header[offset::PROJECT..offset::COPYRIGHT], &self.options.project);
        packed::put_text(
            &mut header[offset::COPYRIGHT..offset::ENCRYPT_KEY],
            &self.options.copyright,
        );
        put_u32(&mut header, offset::ENCRYPT_KEY, UNDEFINED_U32);

        // Image header (768-1023)
        put_u16(&mut header, offset::ORIENTATION, 0);
        put_u16(&mut header, offset::ELEMENT_COUNT, 1);
        put_u32(&mut header, offset::PIXELS_PER_LINE, width);
        put_u32(&mut header, offset::LINES_PER_ELEMENT, height);

        put_u32(&mut header, offset::DATA_SIGN, 0);
        put_u32(&mut header, offset::REF_LOW_DATA, 0);
        put_f32(&mut header, offset::REF_LOW_QUANTITY, 0.0);
        put_u32(&mut header, offset::REF_HIGH_DATA, MAX_CODE as u32);
        put_f32(&mut header, offset::REF_HIGH_QUANTITY, 2.046);
        header[offset::DESCRIPTOR] = DESCRIPTOR_RGB;
        header[offset::TRANSFER] = TRANSFER_PRINTING_DENSITY;
        header[offset::COLORIMETRIC] = TRANSFER_PRINTING_DENSITY;
        header[offset::BIT_SIZE] = 10;
        put_u16(&mut header, offset::PACKING, 1);
        put_u16(&mut header, offset::ENCODING, 0);
        put_u32(&mut header, offset::DATA_OFFSET, HEADER_SIZE);
        put_u32(&mut header, offset::EOL_PADDING, 0);
        put_u32(&mut header, offset::EOI_PADDING, 0);

        // Orientation header
        put_u32(&mut header, offset::X_OFFSET, 0);
        put_u32(&mut header, offset::Y_OFFSET, 0);

        header
    }
}

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    BigEndian::write_u32(&mut buf[at..], v);
}

fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    BigEndian::write_u16(&mut buf[at..], v);
}

fn put_f32(buf: &mut [u8], at: usize, v: f32) {
    BigEndian::write_f32(&mut buf[at..], v);
}

impl ImageWriter for DpxWriter {
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
        CHANNELS.contains(&name)
    }

    fn write(&mut self, image: &Image, options: &WriteOptions) -> IoResult<()> {
        let plan = WritePlan::new(FORMAT, image, options, ColorSpace::Linear, |n| {
            self.supports_channel(n)
        })?;
        let file_size =
            packed::file_size(FORMAT, HEADER_SIZE, plan.width(), plan.height(), &self.path)?;

        let mut words = vec![0u32; plan.display_window.area()];
        for (slot, name) in CHANNELS.iter().enumerate() {
            if !plan.has(name) {
                continue;
            }
            let raw_codes =
                options.raw_channels && image.channel(name)?.kind() == SampleKind::U16;
            let codes = if raw_codes {
                plan.display_buffer::<u16>(image, name)?
            } else {
                packed::encode_codes(&self.codec, &plan.display_linear(image, name)?)
            };
            packed::pack_slot(&mut words, slot, &codes);
        }

        let mut out = BufWriter::new(File::create(&self.path)?);
        out.write_all(&self.header_bytes(plan.width(), plan.height(), file_size))?;
        packed::write_words_be(&mut out, &words)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReadOptions;
    use approx::assert_abs_diff_eq;

    /// Builds a minimal 10-bit RGB file around `words`.
    fn fake_dpx<B: ByteOrder>(magic: u32, width: u32, height: u32, words: &[u32]) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE as usize];
        B::write_u32(&mut buf[offset::MAGIC..], magic);
        B::write_u32(&mut buf[offset::IMAGE_OFFSET..], HEADER_SIZE);
        B::write_u16(&mut buf[offset::ELEMENT_COUNT..], 1);
        B::write_u32(&mut buf[offset::PIXELS_PER_LINE..], width);
        B::write_u32(&mut buf[offset::LINES_PER_ELEMENT..], height);
        buf[offset::DESCRIPTOR] = DESCRIPTOR_RGB;
        buf[offset::TRANSFER] = TRANSFER_PRINTING_DENSITY;
        buf[offset::BIT_SIZE] = 10;
        B::write_u16(&mut buf[offset::PACKING..], 1);
        for &w in words {
            let mut bytes = [0u8; 4];
            B::write_u32(&mut bytes, w);
            buf.extend_from_slice(&bytes);
        }
        buf
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn test_log_codes_decode_monotonic() {
        let path = temp_path("plate_dpx_codes.dpx");
        let words: Vec<u32> = [0u16, 512, 1023, 300]
            .iter()
            .map(|&c| plate_core::logcodec::pack(0, 0, c))
            .collect();
        std::fs::write(&path, fake_dpx::<BigEndian>(MAGIC_BE, 2, 2, &words)).unwrap();

        let mut reader = DpxReader::new(&path);
        assert_eq!(reader.data_window().unwrap(), Rect::new(0, 0, 1, 1));

        let raw = reader.read_channel("R", Rect::new(0, 0, 1, 1), true).unwrap();
        assert_eq!(raw, ChannelData::U16(vec![0, 512, 1023, 300]));

        let v = reader.read_channel("R", Rect::new(0, 0, 1, 1), false).unwrap();
        let v = v.as_f32().unwrap();
        // codes 0 < 300 < 512 < 1023
        assert!(v[0] < v[3]);
        assert!(v[3] < v[1]);
        assert!(v[1] < v[2]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_little_endian_and_mirrored() {
        let path = temp_path("plate_dpx_le.dpx");
        // Stored bottom-up: the first stored row is the bottom one.
        let words: Vec<u32> = [100u16, 200, 300, 400]
            .iter()
            .map(|&c| plate_core::logcodec::pack(0, 1, c))
            .collect();
        let mut bytes = fake_dpx::<LittleEndian>(MAGIC_BE, 2, 2, &words);
        LittleEndian::write_u16(&mut bytes[offset::ORIENTATION..], 2);
        std::fs::write(&path, bytes).unwrap();

        let mut reader = DpxReader::new(&path);
        assert_eq!(reader.header().unwrap().get_str("Endian"), Some("LE"));
        let g = reader.read_channel("G", Rect::new(0, 0, 1, 1), true).unwrap();
        assert_eq!(g, ChannelData::U16(vec![300, 400, 100, 200]));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_rejects_bit_depth() {
        let path = temp_path("plate_dpx_12bit.dpx");
        let mut bytes = fake_dpx::<BigEndian>(MAGIC_BE, 1, 1, &[0]);
        bytes[offset::BIT_SIZE] = 12;
        std::fs::write(&path, bytes).unwrap();

        let mut reader = DpxReader::new(&path);
        assert!(!reader.open(false).unwrap());
        let err = reader.open(true).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bit depth"), "{}", msg);
        assert!(msg.contains("12"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_roundtrip_within_one_code() {
        let path = temp_path("plate_dpx_roundtrip.dpx");
        let window = Rect::from_size(8, 4);
        let mut image = Image::with_window(window);
        let ramp: Vec<f32> = (0..32).map(|i| i as f32 / 16.0).collect();
        image.insert_channel("R", ChannelData::from(ramp.clone())).unwrap();
        image.insert_channel("G", ChannelData::from(vec![0.18f32; 32])).unwrap();
        image.insert_channel("B", ChannelData::from(vec![1.0f32; 32])).unwrap();
        image.insert_channel("A", ChannelData::from(vec![1.0f32; 32])).unwrap();

        DpxWriter::new(&path).write(&image, &WriteOptions::default()).unwrap();

        let mut reader = DpxReader::new(&path);
        let back = reader.read(&ReadOptions::default()).unwrap();
        assert_eq!(back.data_window(), window);
        assert_eq!(back.channel_names(), vec!["B", "G", "R"]);

        let codec = LogCodec::default();
        let r = back.channel("R").unwrap().as_f32().unwrap().to_vec();
        for (orig, got) in ramp.iter().zip(&r) {
            let code = codec.encode(*orig) as i32;
            let got_code = codec.encode(*got) as i32;
            assert!((code - got_code).abs() <= 1);
        }
        let b = back.channel("B").unwrap().as_f32().unwrap();
        assert_abs_diff_eq!(b[0], 1.0, epsilon = 0.01);

        let header = reader.header().unwrap();
        assert_eq!(header.get_str("Creator"), Some("plate-io"));
        assert_eq!(header.get_str("FileName"), Some("plate_dpx_roundtrip.dpx"));
        assert!(reader.is_complete());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_raw_codes_roundtrip() {
        let path = temp_path("plate_dpx_raw.dpx");
        let mut image = Image::with_window(Rect::from_size(2, 1));
        image.insert_channel("G", ChannelData::U16(vec![7, 2000])).unwrap();

        let opts = WriteOptions {
            raw_channels: true,
            ..Default::default()
        };
        DpxWriter::new(&path).write(&image, &opts).unwrap();

        let mut reader = DpxReader::new(&path);
        let g = reader.read_channel("G", Rect::from_size(2, 1), true).unwrap();
        assert_eq!(g, ChannelData::U16(vec![7, 1023]));
        let r = reader.read_channel("R", Rect::from_size(2, 1), true).unwrap();
        assert_eq!(r, ChannelData::U16(vec![0, 0]));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_truncated_is_incomplete() {
        let path = temp_path("plate_dpx_truncated.dpx");
        let bytes = fake_dpx::<BigEndian>(MAGIC_BE, 4, 4, &[0; 10]);
        std::fs::write(&path, bytes).unwrap();

        let mut reader = DpxReader::new(&path);
        assert!(reader.open(true).unwrap());
        assert!(!reader.is_complete());
        assert!(reader.read_channel("R", Rect::new(0, 0, 3, 1), true).is_ok());
        assert!(reader.read_channel("R", Rect::new(0, 3, 3, 3), true).is_err());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_can_read() {
        let path = temp_path("plate_dpx_garbage.dpx");
        std::fs::write(&path, b"PNG\x00garbage").unwrap();
        assert!(!DpxReader::can_read(&path));
        assert!(!DpxReader::can_read(Path::new("/nonexistent/file.dpx")));

        std::fs::write(&path, b"XPDS").unwrap();
        assert!(DpxReader::can_read(&path));
        let _ = std::fs::remove_file(&path);
    }
}
