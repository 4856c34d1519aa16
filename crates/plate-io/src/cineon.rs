//! Kodak Cineon format support.
//!
//! The film-scan predecessor of DPX: 10-bit printing density codes,
//! three per 32-bit word, decoded with the Log-Linear Codec.
//!
//! # Layout
//!
//! | Offset | Size | Section |
//! |--------|------|---------|
//! | 0 | 192 | file information |
//! | 192 | 488 | image information (8 channel descriptors) |
//! | 680 | 32 | image data format |
//! | 712 | 312 | image origination |
//! | 1024 | | pixel words (written files) |
//!
//! Magic `0x802A5FD7`; files written on little-endian hosts carry the
//! byte-swapped `0xD75F2A80` and store every field little-endian.
//!
//! # Supported files
//!
//! Only the common scan layout decodes: packing 5 (left-justified 32-bit
//! words), pixel interleave, unsigned positive-sense data, no padding,
//! orientation 0, 10 bits per channel, at most 3 channels of identical
//! size. Every other value is a structural error naming the field.
//!
//! Channel designators (byte 1 of each channel descriptor) name the
//! channels: 0 `Y`, 1 `R`, 2 `G`, 3 `B`.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use plate_core::logcodec::{CHANNELS_PER_WORD, MAX_CODE};
use plate_core::{ChannelData, ColorSpace, Image, LogCodec, Rect, SampleKind};
use tracing::{debug, warn};

use crate::attrs::Attrs;
use crate::options::WriteOptions;
use crate::packed::{self, PackedLayout};
use crate::traits::HeaderCache;
use crate::writer::WritePlan;
use crate::{ImageReader, ImageWriter, IoError, IoResult};

// === Constants ===

const MAGIC: u32 = 0x802A_5FD7;
const MAGIC_SWAPPED: u32 = 0xD75F_2A80;

/// Bytes of header parsed by the reader.
const HEADER_SIZE: usize = 1024;
/// Pixel data offset in written files.
const DATA_OFFSET: u32 = 1024;

/// Channel descriptor slots in the image information section.
const MAX_DESCRIPTORS: usize = 8;
const DESCRIPTOR_SIZE: usize = 28;

/// Left-justified, three codes per 32-bit word.
const PACKING_LEFT_JUSTIFIED: u8 = 5;

const FORMAT: &str = "Cineon";

/// Channel names by designator code.
const DESIGNATORS: [&str; 4] = ["Y", "R", "G", "B"];

mod offset {
    // File information
    pub const MAGIC: usize = 0;
    pub const IMAGE_OFFSET: usize = 4;
    pub const GENERIC_SIZE: usize = 8;
    pub const INDUSTRY_SIZE: usize = 12;
    pub const VARIABLE_SIZE: usize = 16;
    pub const FILE_SIZE: usize = 20;
    pub const VERSION: usize = 24;
    pub const FILE_NAME: usize = 32;
    pub const CREATE_DATE: usize = 132;
    pub const CREATE_TIME: usize = 144;
    pub const FILE_INFO_END: usize = 156;

    // Image information
    pub const ORIENTATION: usize = 192;
    pub const CHANNEL_COUNT: usize = 193;
    pub const DESCRIPTORS: usize = 196;
    pub const LABEL: usize = 452;
    pub const LABEL_END: usize = 652;

    // Channel descriptor fields, relative
    pub const BYTE_0: usize = 0;
    pub const BYTE_1: usize = 1;
    pub const BPP: usize = 2;
    pub const PIXELS_PER_LINE: usize = 4;
    pub const LINES_PER_IMAGE: usize = 8;
    pub const MIN_DATA: usize = 12;
    pub const MIN_QUANTITY: usize = 16;
    pub const MAX_DATA: usize = 20;
    pub const MAX_QUANTITY: usize = 24;

    // Image data format
    pub const INTERLEAVE: usize = 680;
    pub const PACKING: usize = 681;
    pub const DATA_SIGNED: usize = 682;
    pub const SENSE: usize = 683;
    pub const EOL_PADDING: usize = 684;
    pub const EOC_PADDING: usize = 688;

    // Image origination
    pub const X_OFFSET: usize = 712;
    pub const Y_OFFSET: usize = 716;
    pub const INPUT_DEVICE: usize = 844;
    pub const INPUT_DEVICE_END: usize = 908;
    pub const GAMMA: usize = 980;
}

// === Header ===

/// One channel descriptor.
#[derive(Debug, Clone, Copy)]
struct ChannelInfo {
    byte_0: u8,
    byte_1: u8,
    bpp: u8,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone)]
struct CineonHeader {
    big_endian: bool,
    image_offset: u32,
    file_size: u32,
    version: String,
    file_name: String,
    create_date: String,
    create_time: String,
    label: String,
    input_device: String,
    orientation: u8,
    channels: Vec<ChannelInfo>,
    interleave: u8,
    packing: u8,
    data_signed: u8,
    sense: u8,
    eol_padding: u32,
    eoc_padding: u32,
    x_offset: i32,
    y_offset: i32,
    gamma: f32,
}

impl CineonHeader {
    fn parse(buf: &[u8]) -> IoResult<Self> {
        match BigEndian::read_u32(&buf[offset::MAGIC..]) {
            MAGIC => Ok(Self::parse_with::<BigEndian>(buf, true)),
            MAGIC_SWAPPED => Ok(Self::parse_with::<LittleEndian>(buf, false)),
            magic => Err(IoError::DecodeError(format!(
                "invalid Cineon magic: 0x{:08X}",
                magic
            ))),
        }
    }

    fn parse_with<B: ByteOrder>(buf: &[u8], big_endian: bool) -> Self {
        let count = (buf[offset::CHANNEL_COUNT] as usize).min(MAX_DESCRIPTORS);
        let channels = (0..count)
            .map(|i| {
                let d = &buf[offset::DESCRIPTORS + i * DESCRIPTOR_SIZE..];
                ChannelInfo {
                    byte_0: d[offset::BYTE_0],
                    byte_1: d[offset::BYTE_1],
                    bpp: d[offset::BPP],
                    width: B::read_u32(&d[offset::PIXELS_PER_LINE..]),
                    height: B::read_u32(&d[offset::LINES_PER_IMAGE..]),
                }
            })
            .collect();

        Self {
            big_endian,
            image_offset: B::read_u32(&buf[offset::IMAGE_OFFSET..]),
            file_size: B::read_u32(&buf[offset::FILE_SIZE..]),
            version: packed::text_field(&buf[offset::VERSION..offset::FILE_NAME]),
            file_name: packed::text_field(&buf[offset::FILE_NAME..offset::CREATE_DATE]),
            create_date: packed::text_field(&buf[offset::CREATE_DATE..offset::CREATE_TIME]),
            create_time: packed::text_field(&buf[offset::CREATE_TIME..offset::FILE_INFO_END]),
            label: packed::text_field(&buf[offset::LABEL..offset::LABEL_END]),
            input_device: packed::text_field(&buf[offset::INPUT_DEVICE..offset::INPUT_DEVICE_END]),
            orientation: buf[offset::ORIENTATION],
            channels,
            interleave: buf[offset::INTERLEAVE],
            packing: buf[offset::PACKING],
            data_signed: buf[offset::DATA_SIGNED],
            sense: buf[offset::SENSE],
            eol_padding: B::read_u32(&buf[offset::EOL_PADDING..]),
            eoc_padding: B::read_u32(&buf[offset::EOC_PADDING..]),
            x_offset: B::read_i32(&buf[offset::X_OFFSET..]),
            y_offset: B::read_i32(&buf[offset::Y_OFFSET..]),
            gamma: B::read_f32(&buf[offset::GAMMA..]),
        }
    }

    fn validate(&self, raw_count: u8, path: &Path) -> IoResult<()> {
        let unsupported =
            |field: &'static str, value: u32| Err(IoError::unsupported(FORMAT, field, value, path));

        if raw_count == 0 || raw_count as usize > CHANNELS_PER_WORD {
            return unsupported("channel count", raw_count as u32);
        }
        if self.packing != PACKING_LEFT_JUSTIFIED {
            return unsupported("packing", self.packing as u32);
        }
        if self.interleave != 0 {
            return unsupported("interleave", self.interleave as u32);
        }
        if self.data_signed != 0 {
            return unsupported("data sign", self.data_signed as u32);
        }
        if self.sense != 0 {
            return unsupported("image sense", self.sense as u32);
        }
        if self.eol_padding != 0 {
            return unsupported("end-of-line padding", self.eol_padding);
        }
        if self.eoc_padding != 0 {
            return unsupported("end-of-channel padding", self.eoc_padding);
        }
        if self.orientation != 0 {
            return unsupported("orientation", self.orientation as u32);
        }

        let first = self.channels[0];
        for ch in &self.channels {
            if ch.bpp != 10 {
                return unsupported("bits per pixel", ch.bpp as u32);
            }
            if ch.byte_0 != 0 {
                return unsupported("channel metric (byte 0)", ch.byte_0 as u32);
            }
            if ch.byte_1 as usize >= DESIGNATORS.len() {
                return unsupported("channel designator (byte 1)", ch.byte_1 as u32);
            }
            if ch.width != first.width || ch.height != first.height {
                return Err(IoError::unsupported(
                    FORMAT,
                    "per-channel dimensions",
                    format!("{}x{}", ch.width, ch.height),
                    path,
                ));
            }
        }
        let names = self.channel_names();
        if (1..names.len()).any(|i| names[..i].contains(&names[i])) {
            return Err(IoError::unsupported(
                FORMAT,
                "channel designators",
                names.join(","),
                path,
            ));
        }
        if first.width == 0 || first.height == 0 {
            return Err(IoError::InvalidFile(format!(
                "{}: empty image {}x{}",
                path.display(),
                first.width,
                first.height
            )));
        }
        Ok(())
    }

    fn width(&self) -> u32 {
        self.channels[0].width
    }

    fn height(&self) -> u32 {
        self.channels[0].height
    }

    fn data_window(&self) -> Rect {
        Rect::from_size(self.width(), self.height())
    }

    /// Channel names in word slot order.
    fn channel_names(&self) -> Vec<String> {
        self.channels
            .iter()
            .map(|c| DESIGNATORS[c.byte_1 as usize].to_string())
            .collect()
    }
}

#[derive(Debug)]
struct CineonFile {
    header: CineonHeader,
    layout: PackedLayout,
    file: File,
}

impl CineonFile {
    fn open(path: &Path) -> IoResult<Self> {
        let mut file = File::open(path)?;
        let mut buf = vec![0u8; HEADER_SIZE];
        file.read_exact(&mut buf)?;

        let header = CineonHeader::parse(&buf)?;
        header.validate(buf[offset::CHANNEL_COUNT], path)?;
        debug!(
            path = %path.display(),
            width = header.width(),
            height = header.height(),
            channels = ?header.channel_names(),
            big_endian = header.big_endian,
            "Cineon header"
        );

        let layout = PackedLayout::new(
            header.image_offset as u64,
            header.width(),
            header.height(),
            header.big_endian,
        );
        Ok(Self {
            header,
            layout,
            file,
        })
    }
}

// === CineonReader ===

/// Cineon format reader.
///
/// Data and display windows are `(0, 0)-(width-1, height-1)`. Raw reads
/// return 10-bit codes as `U16`.
#[derive(Debug)]
pub struct CineonReader {
    cache: HeaderCache<CineonFile>,
    decode_table: Vec<f32>,
}

impl CineonReader {
    /// Creates a reader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            cache: HeaderCache::new(path.into()),
            decode_table: LogCodec::default().decode_table(),
        }
    }

    fn file(&mut self) -> IoResult<&mut CineonFile> {
        self.open(true)?;
        self.cache.get_mut()
    }
}

impl ImageReader for CineonReader {
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
        read.is_ok() && matches!(u32::from_be_bytes(magic), MAGIC | MAGIC_SWAPPED)
    }

    fn open(&mut self, throw_on_failure: bool) -> IoResult<bool> {
        self.cache.open(throw_on_failure, CineonFile::open)
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
        let Ok(file) = self.file() else {
            return false;
        };
        let last = file.header.height() as i32 - 1;
        let row = Rect::new(0, last, file.header.width() as i32 - 1, last);
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
        attrs.set_text("CreationDate", &h.create_date);
        attrs.set_text("CreationTime", &h.create_time);
        attrs.set_text("Label", &h.label);
        attrs.set_text("InputDevice", &h.input_device);
        attrs.set("Endian", if h.big_endian { "BE" } else { "LE" });
        attrs.set("ImageOffset", h.image_offset);
        attrs.set("FileSize", h.file_size);
        attrs.set("XOffset", h.x_offset);
        attrs.set("YOffset", h.y_offset);
        if h.gamma.is_finite() && h.gamma > 0.0 {
            attrs.set("FilmGamma", h.gamma);
        }
        Ok(attrs)
    }

    fn native_kind(&mut self, _name: &str) -> IoResult<SampleKind> {
        Ok(SampleKind::U16)
    }

    fn read_native(&mut self, name: &str, window: Rect) -> IoResult<ChannelData> {
        let file = self.file()?;
        let slot = file
            .header
            .channel_names()
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| IoError::MissingChannel(name.to_string()))?;
        let words = file.layout.read_words(&mut file.file, window)?;
        Ok(ChannelData::U16(packed::unpack_slot(&words, slot)))
    }

    fn decode_native(&mut self, _name: &str, data: ChannelData) -> IoResult<Vec<f32>> {
        Ok(match data.as_u16() {
            Some(codes) => codes
                .iter()
                .map(|&c| self.decode_table[(c & MAX_CODE) as usize])
                .collect(),
            None => data.to_f32(),
        })
    }
}

// === CineonWriter ===

/// Cineon format writer.
///
/// Writes up to three of `R`, `G`, `B` in that order, or `Y` alone when
/// the image has no colour channels. The display window is written
/// big-endian with the data at offset 1024.
#[derive(Debug, Clone)]
pub struct CineonWriter {
    path: PathBuf,
    codec: LogCodec,
}

impl CineonWriter {
    /// Creates a writer for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            codec: LogCodec::default(),
        }
    }

    fn header_bytes(&self, width: u32, height: u32, file_size: u32, channels: &[String]) -> Vec<u8> {
        let mut h = vec![0u8; DATA_OFFSET as usize];

        BigEndian::write_u32(&mut h[offset::MAGIC..], MAGIC);
        BigEndian::write_u32(&mut h[offset::IMAGE_OFFSET..], DATA_OFFSET);
        BigEndian::write_u32(&mut h[offset::GENERIC_SIZE..], DATA_OFFSET);
        BigEndian::write_u32(&mut h[offset::INDUSTRY_SIZE..], 0);
        BigEndian::write_u32(&mut h[offset::VARIABLE_SIZE..], 0);
        BigEndian::write_u32(&mut h[offset::FILE_SIZE..], file_size);
        packed::put_text(&mut h[offset::VERSION..offset::FILE_NAME], "V4.5");
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        packed::put_text(&mut h[offset::FILE_NAME..offset::CREATE_DATE], &file_name);

        h[offset::ORIENTATION] = 0;
        h[offset::CHANNEL_COUNT] = channels.len() as u8;
        for (i, name) in channels.iter().enumerate() {
            let base = offset::DESCRIPTORS + i * DESCRIPTOR_SIZE;
            let d = &mut h[base..base + DESCRIPTOR_SIZE];
            d[offset::BYTE_0] = 0;
            d[offset::BYTE_1] = DESIGNATORS
                .iter()
                .position(|n| n == name)
                .unwrap_or(0) as u8;
            d[offset::BPP] = 10;
            BigEndian::write_u32(&mut d[offset::PIXELS_PER_LINE..], width);
            BigEndian::write_u32(&mut d[offset::LINES_PER_IMAGE..], height);
            BigEndian::write_f32(&mut d[offset::MIN_DATA..], 0.0);
            BigEndian::write_f32(&mut d[offset::MIN_QUANTITY..], 0.0);
            BigEndian::write_f32(&mut d[offset::MAX_DATA..], MAX_CODE as f32);
            BigEndian::write_f32(&mut d[offset::MAX_QUANTITY..], 2.046);
        }

        h[offset::INTERLEAVE] = 0;
        h[offset::PACKING] = PACKING_LEFT_JUSTIFIED;
        h[offset::DATA_SIGNED] = 0;
        h[offset::SENSE] = 0;
        BigEndian::write_u32(&mut h[offset::EOL_PADDING..], 0);
        BigEndian::write_u32(&mut h[offset::EOC_PADDING..], 0);

        BigEndian::write_i32(&mut h[offset::X_OFFSET..], 0);
        BigEndian::write_i32(&mut h[offset::Y_OFFSET..], 0);
        BigEndian::write_f32(&mut h[offset::GAMMA..], self.codec.params().film_gamma as f32);
        h
    }
}

impl ImageWriter for CineonWriter {
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
        DESIGNATORS.contains(&name)
    }

    fn write(&mut self, image: &Image, options: &WriteOptions) -> IoResult<()> {
        let mut plan = WritePlan::new(FORMAT, image, options, ColorSpace::Linear, |n| {
            self.supports_channel(n)
        })?;
        if plan.has("Y") && plan.channels.iter().any(|c| c != "Y") {
            warn!(format = FORMAT, channel = "Y", "luminance cannot be mixed with colour, skipping");
            plan.channels.retain(|c| c != "Y");
        }
        let file_size =
            packed::file_size(FORMAT, DATA_OFFSET, plan.width(), plan.height(), &self.path)?;

        let mut words = vec![0u32; plan.display_window.area()];
        for (slot, name) in plan.channels.iter().enumerate() {
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
        out.write_all(&self.header_bytes(
            plan.width(),
            plan.height(),
            file_size,
            &plan.channels,
        ))?;
        packed::write_words_be(&mut out, &words)?;
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

    fn rgb_image() -> Image {
        let mut image = Image::with_window(Rect::from_size(4, 3));
        let ramp: Vec<f32> = (0..12).map(|i| i as f32 / 12.0).collect();
        image.insert_channel("B", ChannelData::from(ramp.clone())).unwrap();
        image.insert_channel("R", ChannelData::from(vec![0.5f32; 12])).unwrap();
        image.insert_channel("G", ChannelData::from(ramp)).unwrap();
        image
    }

    #[test]
    fn test_roundtrip_rgb() {
        let path = temp_path("plate_cineon_rgb.cin");
        let image = rgb_image();
        CineonWriter::new(&path).write(&image, &WriteOptions::default()).unwrap();
        assert!(CineonReader::can_read(&path));

        let mut reader = CineonReader::new(&path);
        assert_eq!(reader.channel_names().unwrap(), vec!["R", "G", "B"]);
        let back = reader.read(&ReadOptions::default()).unwrap();

        let codec = LogCodec::default();
        for name in ["R", "G", "B"] {
            let orig = image.channel(name).unwrap().to_f32();
            let got = back.channel(name).unwrap().to_f32();
            for (a, b) in orig.iter().zip(&got) {
                assert_eq!(codec.encode(*a), codec.encode(*b));
            }
        }
        assert_eq!(reader.header().unwrap().get_str("Version"), Some("V4.5"));
        assert!(reader.is_complete());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_luminance_only() {
        let path = temp_path("plate_cineon_y.cin");
        let mut image = Image::with_window(Rect::from_size(2, 2));
        image.insert_channel("Y", ChannelData::U16(vec![95, 685, 0, 1023])).unwrap();
        let opts = WriteOptions {
            raw_channels: true,
            ..Default::default()
        };
        CineonWriter::new(&path).write(&image, &opts).unwrap();

        let mut reader = CineonReader::new(&path);
        assert_eq!(reader.channel_names().unwrap(), vec!["Y"]);
        let y = reader.read_channel("Y", Rect::new(0, 0, 1, 0), false).unwrap();
        let y = y.as_f32().unwrap();
        approx::assert_abs_diff_eq!(y[0], 0.0, epsilon = 1e-5);
        approx::assert_abs_diff_eq!(y[1], 1.0, epsilon = 1e-5);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_rejects_bits_per_pixel() {
        let path = temp_path("plate_cineon_8bit.cin");
        CineonWriter::new(&path)
            .write(&rgb_image(), &WriteOptions::default())
            .unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[offset::DESCRIPTORS + DESCRIPTOR_SIZE + offset::BPP] = 8;
        std::fs::write(&path, bytes).unwrap();

        let err = CineonReader::new(&path).open(true).unwrap_err();
        assert!(err.to_string().contains("bits per pixel"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_little_endian_file() {
        let path = temp_path("plate_cineon_le.cin");
        let mut buf = vec![0u8; HEADER_SIZE];
        LittleEndian::write_u32(&mut buf[offset::MAGIC..], MAGIC);
        LittleEndian::write_u32(&mut buf[offset::IMAGE_OFFSET..], HEADER_SIZE as u32);
        buf[offset::CHANNEL_COUNT] = 1;
        let d = offset::DESCRIPTORS;
        buf[d + offset::BYTE_1] = 2;
        buf[d + offset::BPP] = 10;
        LittleEndian::write_u32(&mut buf[d + offset::PIXELS_PER_LINE..], 2);
        LittleEndian::write_u32(&mut buf[d + offset::LINES_PER_IMAGE..], 1);
        buf[offset::PACKING] = PACKING_LEFT_JUSTIFIED;
        for code in [10u16, 20] {
            buf.extend_from_slice(&plate_core::logcodec::pack(0, 0, code).to_le_bytes());
        }
        std::fs::write(&path, buf).unwrap();

        let mut reader = CineonReader::new(&path);
        assert_eq!(reader.channel_names().unwrap(), vec!["G"]);
        let g = reader.read_channel("G", Rect::from_size(2, 1), true).unwrap();
        assert_eq!(g, ChannelData::U16(vec![10, 20]));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_can_read_garbage() {
        let path = temp_path("plate_cineon_garbage.cin");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();
        assert!(!CineonReader::can_read(&path));
        let _ = std::fs::remove_file(&path);
    }
}
