//! JPEG format support.
//!
//! Baseline and progressive 8-bit JPEG through `jpeg-decoder` and
//! `jpeg-encoder`.
//!
//! | Stored as | Channels |
//! |-----------|----------|
//! | L8 | `Y` |
//! | RGB24 | `R`, `G`, `B` |
//! | CMYK32 | `R`, `G`, `B` (converted) |
//!
//! 16-bit lossless files are rejected when the header is opened. Raw
//! reads return `U8`. The entropy-coded stream cannot be entered at an
//! arbitrary row, so the first pixel read decodes the whole frame and
//! keeps it until the path changes.
//!
//! The header also reports JFIF density, the frame coding process and
//! comment segments.
//!
//! # Example
//!
//! ```rust,ignore
//! use plate_io::jpeg::{JpegWriter, JpegWriterOptions};
//!
//! let mut writer = JpegWriter::with_options("preview.jpg", JpegWriterOptions { quality: 85 });
//! writer.write(&image, &WriteOptions::default())?;
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use jpeg_decoder::PixelFormat;
use plate_core::{ChannelData, ColorSpace, Image, Rect, SampleKind};
use tracing::{debug, warn};

use crate::attrs::Attrs;
use crate::options::WriteOptions;
use crate::traits::HeaderCache;
use crate::writer::WritePlan;
use crate::{ImageReader, ImageWriter, IoError, IoResult};

const FORMAT: &str = "JPEG";

/// Start of image marker.
const SOI: [u8; 2] = [0xFF, 0xD8];

fn decode_error(e: jpeg_decoder::Error) -> IoError {
    IoError::DecodeError(e.to_string())
}

// === Segment metadata ===

/// Collects JFIF, frame and comment metadata from the marker segments
/// preceding the scan data.
fn parse_segments(data: &[u8], attrs: &mut Attrs) {
    if !data.starts_with(&SOI) {
        return;
    }
    let mut comments = Vec::new();
    let mut pos = 2usize;

    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        while pos < data.len() && data[pos] == 0xFF {
            pos += 1;
        }
        if pos >= data.len() {
            break;
        }
        let marker = data[pos];
        pos += 1;

        // End of image, start of scan
        if marker == 0xD9 || marker == 0xDA {
            break;
        }
        // Standalone markers
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            continue;
        }
        if pos + 2 > data.len() {
            break;
        }
        let len = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        pos += 2;
        if len < 2 || pos + len - 2 > data.len() {
            break;
        }
        let segment = &data[pos..pos + len - 2];

        match marker {
            0xE0 => parse_jfif(segment, attrs),
            0xFE => comments.push(String::from_utf8_lossy(segment).trim_end_matches('\0').to_string()),
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => parse_sof(marker, segment, attrs),
            _ => {}
        }
        pos += len - 2;
    }

    if !comments.is_empty() {
        attrs.set_text("Comment", &comments.join("\n"));
    }
}

fn parse_jfif(data: &[u8], attrs: &mut Attrs) {
    if !data.starts_with(b"JFIF\0") || data.len() < 12 {
        return;
    }
    attrs.set("JFIFVersion", format!("{}.{:02}", data[5], data[6]));
    let x_density = u16::from_be_bytes([data[8], data[9]]);
    let y_density = u16::from_be_bytes([data[10], data[11]]);
    if x_density > 0 && y_density > 0 {
        attrs.set("XResolution", x_density as u32);
        attrs.set("YResolution", y_density as u32);
        attrs.set(
            "ResolutionUnit",
            match data[7] {
                0 => "aspect ratio",
                1 => "dpi",
                2 => "dpcm",
                _ => "unknown",
            },
        );
    }
}

fn parse_sof(marker: u8, data: &[u8], attrs: &mut Attrs) {
    if data.len() < 6 {
        return;
    }
    attrs.set("BitsPerSample", data[0] as u32);
    attrs.set("ColorComponents", data[5] as u32);
    attrs.set(
        "Compression",
        match marker {
            0xC0 => "Baseline DCT",
            0xC1 => "Extended Sequential DCT",
            0xC2 => "Progressive DCT",
            0xC3 => "Lossless",
            _ => "Other",
        },
    );
}

/// Approximate CMYK to RGB, as stored by non-Adobe encoders.
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    cmyk.chunks_exact(4)
        .flat_map(|px| {
            let k = 1.0 - px[3] as f32 / 255.0;
            [0, 1, 2].map(|i| ((1.0 - px[i] as f32 / 255.0) * k * 255.0).round() as u8)
        })
        .collect()
}

// === Reader ===

#[derive(Debug)]
struct JpegFile {
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    channels: Vec<String>,
    attrs: Attrs,
    /// Decoded frame, interleaved Y or RGB.
    pixels: Option<Vec<u8>>,
}

impl JpegFile {
    fn open(path: &Path) -> IoResult<Self> {
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;

        let mut decoder = jpeg_decoder::Decoder::new(bytes.as_slice());
        decoder.read_info().map_err(decode_error)?;
        let info = decoder
            .info()
            .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;

        let channels: Vec<String> = match info.pixel_format {
            PixelFormat::L8 => vec!["Y".into()],
            PixelFormat::RGB24 | PixelFormat::CMYK32 => vec!["R".into(), "G".into(), "B".into()],
            other => return Err(IoError::unsupported(FORMAT, "pixel format", format!("{:?}", other), path)),
        };

        let mut attrs = Attrs::new();
        attrs.set("PixelFormat", format!("{:?}", info.pixel_format));
        parse_segments(&bytes, &mut attrs);

        debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            format = ?info.pixel_format,
            "JPEG header"
        );
        Ok(Self {
            width: info.width as u32,
            height: info.height as u32,
            pixel_format: info.pixel_format,
            channels,
            attrs,
            pixels: None,
        })
    }

    fn pixels(&mut self, path: &Path) -> IoResult<&[u8]> {
        if self.pixels.is_none() {
            let file = File::open(path)?;
            let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(file));
            let decoded = decoder.decode().map_err(|e| {
                warn!(path = %path.display(), error = %e, "JPEG stream failed to decode");
                decode_error(e)
            })?;
            self.pixels = Some(match self.pixel_format {
                PixelFormat::CMYK32 => cmyk_to_rgb(&decoded),
                _ => decoded,
            });
        }
        Ok(self.pixels.as_deref().unwrap_or_default())
    }
}

/// JPEG format reader.
#[derive(Debug)]
pub struct JpegReader {
    cache: HeaderCache<JpegFile>,
}

impl JpegReader {
    /// Creates a reader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            cache: HeaderCache::new(path.into()),
        }
    }

    fn file(&mut self) -> IoResult<&mut JpegFile> {
        self.open(true)?;
        self.cache.get_mut()
    }
}

impl ImageReader for JpegReader {
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
        let mut magic = [0u8; 3];
        let read = File::open(path).and_then(|mut f| f.read_exact(&mut magic));
        read.is_ok() && magic[..2] == SOI && magic[2] == 0xFF
    }

    fn open(&mut self, throw_on_failure: bool) -> IoResult<bool> {
        self.cache.open(throw_on_failure, JpegFile::open)
    }

    fn channel_names(&mut self) -> IoResult<Vec<String>> {
        Ok(self.file()?.channels.clone())
    }

    fn data_window(&mut self) -> IoResult<Rect> {
        let file = self.file()?;
        Ok(Rect::from_size(file.width, file.height))
    }

    fn display_window(&mut self) -> IoResult<Rect> {
        self.data_window()
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
        let window = Rect::from_size(file.width, file.height);
        let mut attrs = file.attrs.clone();
        attrs.set("dataWindow", window);
        attrs.set("displayWindow", window);
        attrs.set("Format", FORMAT);
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
        let channel = file
            .channels
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| IoError::MissingChannel(name.to_string()))?;
        let spp = file.channels.len();
        let width = file.width as usize;
        let pixels = file.pixels(&path)?;

        let mut out = Vec::with_capacity(window.area());
        for y in window.min_y..=window.max_y {
            let row = y as usize * width;
            for x in window.min_x..=window.max_x {
                out.push(pixels[(row + x as usize) * spp + channel]);
            }
        }
        Ok(ChannelData::U8(out))
    }
}

// === Writer ===

/// Options for writing JPEG files.
#[derive(Debug, Clone)]
pub struct JpegWriterOptions {
    /// Quality level 1-100. Default: 100.
    pub quality: u8,
}

impl Default for JpegWriterOptions {
    fn default() -> Self {
        Self { quality: 100 }
    }
}

/// JPEG format writer.
///
/// Writes 8-bit `Y` or `RGB` over the display window.
#[derive(Debug, Clone)]
pub struct JpegWriter {
    path: PathBuf,
    options: JpegWriterOptions,
}

impl JpegWriter {
    /// Creates a writer for `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, JpegWriterOptions::default())
    }

    /// Creates a writer with explicit options.
    pub fn with_options(path: impl Into<PathBuf>, options: JpegWriterOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }
}

impl ImageWriter for JpegWriter {
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
        matches!(name, "R" | "G" | "B" | "Y")
    }

    fn write(&mut self, image: &Image, options: &WriteOptions) -> IoResult<()> {
        use jpeg_encoder::{ColorType as JpegColorType, Encoder};

        let quality = self.options.quality;
        if !(1..=100).contains(&quality) {
            return Err(IoError::invalid_option(
                "quality",
                format!("{} is not in 1..=100", quality),
            ));
        }

        let mut plan = WritePlan::new(FORMAT, image, options, ColorSpace::Srgb, |n| {
            self.supports_channel(n)
        })?;
        let (width, height) = (plan.width(), plan.height());
        if width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(IoError::EncodeError(format!(
                "JPEG cannot store {}x{} images",
                width, height
            )));
        }

        let rgb = ["R", "G", "B"].iter().filter(|c| plan.has(c)).count();
        let (color_type, data) = match rgb {
            3 => {
                if plan.has("Y") {
                    warn!(format = FORMAT, channel = "Y", "luminance cannot be stored with RGB, skipping");
                    plan.channels.retain(|c| c != "Y");
                }
                let planes = ["R", "G", "B"]
                    .iter()
                    .map(|n| plan.display_buffer::<u8>(image, n))
                    .collect::<IoResult<Vec<_>>>()?;
                let mut data = Vec::with_capacity(plan.display_window.area() * 3);
                for i in 0..plan.display_window.area() {
                    data.extend(planes.iter().map(|p| p[i]));
                }
                (JpegColorType::Rgb, data)
            }
            0 => (JpegColorType::Luma, plan.display_buffer::<u8>(image, "Y")?),
            n => {
                return Err(IoError::EncodeError(format!(
                    "JPEG needs all of R, G, B, found {} of them",
                    n
                )));
            }
        };

        let mut buffer = Vec::new();
        let encoder = Encoder::new(&mut buffer, quality);
        encoder
            .encode(&data, width as u16, height as u16, color_type)
            .map_err(|e: jpeg_encoder::EncodingError| IoError::EncodeError(e.to_string()))?;
        std::fs::write(&self.path, &buffer)?;
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

    fn gradient(width: u32, height: u32) -> Image {
        let n = (width * height) as usize;
        let mut image = Image::with_window(Rect::from_size(width, height));
        let ramp: Vec<u8> = (0..n)
            .map(|i| ((i as u32 % width + i as u32 / width) * 4) as u8)
            .collect();
        image.insert_channel("R", ChannelData::from(ramp.clone())).unwrap();
        image.insert_channel("G", ChannelData::from(vec![128u8; n])).unwrap();
        image.insert_channel("B", ChannelData::from(ramp.into_iter().rev().collect::<Vec<_>>())).unwrap();
        image
    }

    #[test]
    fn test_roundtrip_within_lossy_bound() {
        let path = temp_path("plate_jpeg_rgb.jpg");
        let image = gradient(16, 16);
        JpegWriter::new(&path).write(&image, &WriteOptions::default()).unwrap();

        let mut reader = JpegReader::new(&path);
        assert!(JpegReader::can_read(&path));
        assert_eq!(reader.channel_names().unwrap(), vec!["R", "G", "B"]);
        let back = reader.read(&ReadOptions::default().raw()).unwrap();
        for name in ["R", "G", "B"] {
            let a = back.channel(name).unwrap().as_u8().unwrap().to_vec();
            let b = image.channel(name).unwrap().as_u8().unwrap().to_vec();
            for (x, y) in a.iter().zip(&b) {
                assert!((*x as i32 - *y as i32).abs() <= 10, "{}: {} vs {}", name, x, y);
            }
        }
        assert!(reader.is_complete());
        assert_eq!(reader.header().unwrap().get_str("Compression"), Some("Baseline DCT"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_alpha_is_skipped_and_luma_written() {
        let path = temp_path("plate_jpeg_luma.jpg");
        let mut image = Image::with_window(Rect::from_size(8, 8));
        image.insert_channel("Y", ChannelData::from(vec![200u8; 64])).unwrap();
        image.insert_channel("A", ChannelData::from(vec![255u8; 64])).unwrap();
        JpegWriter::new(&path).write(&image, &WriteOptions::default()).unwrap();

        let mut reader = JpegReader::new(&path);
        assert_eq!(reader.channel_names().unwrap(), vec!["Y"]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_truncated_is_incomplete() {
        let path = temp_path("plate_jpeg_truncated.jpg");
        JpegWriter::new(&path).write(&gradient(32, 32), &WriteOptions::default()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        let mut reader = JpegReader::new(&path);
        assert!(reader.open(false).unwrap());
        assert!(!reader.is_complete());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_cmyk_conversion() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0, 255, 0, 0, 0]), vec![255, 255, 255, 0, 255, 255]);
    }

    #[test]
    fn test_can_read() {
        let path = temp_path("plate_jpeg_garbage.jpg");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();
        assert!(!JpegReader::can_read(&path));
        let _ = std::fs::remove_file(&path);
    }
}
