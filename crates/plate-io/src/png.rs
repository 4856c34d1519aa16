//! PNG format support.
//!
//! # Channels
//!
//! | Colour type | Channels |
//! |-------------|----------|
//! | Grayscale | `Y` |
//! | Grayscale + alpha | `Y`, `A` |
//! | RGB | `R`, `G`, `B` |
//! | RGBA | `R`, `G`, `B`, `A` |
//!
//! Samples are 8 or 16-bit. Palette images and depths below 8 bits are
//! rejected when the header is opened. PNG has no data window offset, so
//! both windows start at the origin.
//!
//! Scanlines are filtered and deflated as one stream, so the first pixel
//! read decodes the whole frame, which stays cached until the path changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use plate_io::png::{PngWriter, PngWriterOptions};
//! use plate_io::{ImageWriter, WriteOptions};
//!
//! let mut writer = PngWriter::with_options("out.png", PngWriterOptions { bit_depth: 16 });
//! writer.write(&image, &WriteOptions::default())?;
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use plate_core::{ChannelData, ColorSpace, Image, Rect, Sample, SampleKind};
use tracing::{debug, warn};

use crate::attrs::Attrs;
use crate::options::WriteOptions;
use crate::traits::HeaderCache;
use crate::writer::WritePlan;
use crate::{ImageReader, ImageWriter, IoError, IoResult};

const FORMAT: &str = "PNG";

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn decode_error(e: png::DecodingError) -> IoError {
    IoError::DecodeError(e.to_string())
}

fn encode_error(e: png::EncodingError) -> IoError {
    IoError::EncodeError(e.to_string())
}

fn channels_for(color_type: png::ColorType) -> Vec<String> {
    let names: &[&str] = match color_type {
        png::ColorType::Grayscale => &["Y"],
        png::ColorType::GrayscaleAlpha => &["Y", "A"],
        png::ColorType::Rgb => &["R", "G", "B"],
        _ => &["R", "G", "B", "A"],
    };
    names.iter().map(|n| n.to_string()).collect()
}

#[derive(Debug)]
struct PngFile {
    width: u32,
    height: u32,
    sixteen_bit: bool,
    channels: Vec<String>,
    attrs: Attrs,
    /// Decoded frame, interleaved, 16-bit samples big-endian.
    pixels: Option<Vec<u8>>,
}

impl PngFile {
    fn decoder(path: &Path) -> IoResult<png::Reader<BufReader<File>>> {
        let file = File::open(path)?;
        let mut decoder = png::Decoder::new(BufReader::new(file));
        decoder.set_transformations(png::Transformations::IDENTITY);
        decoder.read_info().map_err(decode_error)
    }

    fn open(path: &Path) -> IoResult<Self> {
        let reader = Self::decoder(path)?;
        let info = reader.info();

        if info.color_type == png::ColorType::Indexed {
            return Err(IoError::unsupported(FORMAT, "colour type", "palette", path));
        }
        let sixteen_bit = match info.bit_depth {
            png::BitDepth::Eight => false,
            png::BitDepth::Sixteen => true,
            other => return Err(IoError::unsupported(FORMAT, "bit depth", other as u8, path)),
        };

        let mut attrs = Attrs::new();
        attrs.set("BitDepth", if sixteen_bit { 16u32 } else { 8 });
        attrs.set("ColorType", format!("{:?}", info.color_type));
        attrs.set("Interlaced", info.interlaced);
        for chunk in &info.uncompressed_latin1_text {
            attrs.set_text(chunk.keyword.clone(), &chunk.text);
        }

        let channels = channels_for(info.color_type);
        debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            channels = ?channels,
            sixteen_bit,
            "PNG header"
        );
        Ok(Self {
            width: info.width,
            height: info.height,
            sixteen_bit,
            channels,
            attrs,
            pixels: None,
        })
    }

    fn pixels(&mut self, path: &Path) -> IoResult<&[u8]> {
        if self.pixels.is_none() {
            let mut reader = Self::decoder(path)?;
            let size = reader
                .output_buffer_size()
                .ok_or_else(|| IoError::DecodeError("cannot determine PNG output buffer size".into()))?;
            let mut buf = vec![0u8; size];
            let frame = reader.next_frame(&mut buf).map_err(|e| {
                warn!(path = %path.display(), error = %e, "PNG frame failed to decode");
                decode_error(e)
            })?;
            buf.truncate(frame.buffer_size());
            self.pixels = Some(buf);
        }
        Ok(self.pixels.as_deref().unwrap_or_default())
    }
}

// === PngReader ===

/// PNG format reader.
#[derive(Debug)]
pub struct PngReader {
    cache: HeaderCache<PngFile>,
}

impl PngReader {
    /// Creates a reader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            cache: HeaderCache::new(path.into()),
        }
    }

    fn file(&mut self) -> IoResult<&mut PngFile> {
        self.open(true)?;
        self.cache.get_mut()
    }
}

impl ImageReader for PngReader {
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
        let mut magic = [0u8; 8];
        let read = File::open(path).and_then(|mut f| std::io::Read::read_exact(&mut f, &mut magic));
        read.is_ok() && magic == SIGNATURE
    }

    fn open(&mut self, throw_on_failure: bool) -> IoResult<bool> {
        self.cache.open(throw_on_failure, PngFile::open)
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
        Ok(if self.file()?.sixteen_bit {
            SampleKind::U16
        } else {
            SampleKind::U8
        })
    }

    fn default_color_space(&mut self) -> IoResult<ColorSpace> {
        Ok(if self.file()?.sixteen_bit {
            ColorSpace::Linear
        } else {
            ColorSpace::Srgb
        })
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
        let sixteen_bit = file.sixteen_bit;
        let pixels = file.pixels(&path)?;

        let index = |x: i32, y: i32| (y as usize * width + x as usize) * spp + channel;
        let data = if sixteen_bit {
            let mut out = Vec::with_capacity(window.area());
            for y in window.min_y..=window.max_y {
                for x in window.min_x..=window.max_x {
                    let i = index(x, y) * 2;
                    out.push(u16::from_be_bytes([pixels[i], pixels[i + 1]]));
                }
            }
            ChannelData::U16(out)
        } else {
            let mut out = Vec::with_capacity(window.area());
            for y in window.min_y..=window.max_y {
                for x in window.min_x..=window.max_x {
                    out.push(pixels[index(x, y)]);
                }
            }
            ChannelData::U8(out)
        };
        Ok(data)
    }
}

// === Writer ===

/// Options for writing PNG files.
#[derive(Debug, Clone)]
pub struct PngWriterOptions {
    /// 8 or 16. Default: 8.
    pub bit_depth: u8,
}

impl Default for PngWriterOptions {
    fn default() -> Self {
        Self { bit_depth: 8 }
    }
}

/// PNG format writer.
///
/// Writes `Y`, `YA`, `RGB` or `RGBA` over the display window.
#[derive(Debug, Clone)]
pub struct PngWriter {
    path: PathBuf,
    options: PngWriterOptions,
}

impl PngWriter {
    /// Creates a writer for `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, PngWriterOptions::default())
    }

    /// Creates a writer with explicit options.
    pub fn with_options(path: impl Into<PathBuf>, options: PngWriterOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// Picks the colour type, dropping channels it cannot hold.
    fn color_type(plan: &mut WritePlan) -> IoResult<(png::ColorType, &'static [&'static str])> {
        let rgb = ["R", "G", "B"].iter().filter(|c| plan.has(c)).count();
        let alpha = plan.has("A");
        match rgb {
            3 => {
                if plan.has("Y") {
                    warn!(format = FORMAT, channel = "Y", "luminance cannot be stored with RGB, skipping");
                    plan.channels.retain(|c| c != "Y");
                }
                Ok(if alpha {
                    (png::ColorType::Rgba, &["R", "G", "B", "A"])
                } else {
                    (png::ColorType::Rgb, &["R", "G", "B"])
                })
            }
            0 if plan.has("Y") => Ok(if alpha {
                (png::ColorType::GrayscaleAlpha, &["Y", "A"])
            } else {
                (png::ColorType::Grayscale, &["Y"])
            }),
            0 => Err(IoError::NoChannels(FORMAT)),
            n => Err(IoError::EncodeError(format!(
                "PNG needs all of R, G, B, found {} of them",
                n
            ))),
        }
    }

    fn interleave<T: Sample>(plan: &WritePlan, image: &Image, names: &[&str]) -> IoResult<Vec<T>> {
        let planes = names
            .iter()
            .map(|n| plan.display_buffer::<T>(image, n))
            .collect::<IoResult<Vec<_>>>()?;
        let mut out = Vec::with_capacity(plan.display_window.area() * names.len());
        for i in 0..plan.display_window.area() {
            out.extend(planes.iter().map(|p| p[i]));
        }
        Ok(out)
    }
}

impl ImageWriter for PngWriter {
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
        let sixteen_bit = match self.options.bit_depth {
            8 => false,
            16 => true,
            other => {
                return Err(IoError::invalid_option(
                    "bitDepth",
                    format!("{} is not one of 8, 16", other),
                ));
            }
        };
        let detected = if sixteen_bit {
            ColorSpace::Linear
        } else {
            ColorSpace::Srgb
        };
        let mut plan = WritePlan::new(FORMAT, image, options, detected, |n| self.supports_channel(n))?;
        let (color_type, names) = Self::color_type(&mut plan)?;

        let data: Vec<u8> = if sixteen_bit {
            Self::interleave::<u16>(&plan, image, names)?
                .into_iter()
                .flat_map(u16::to_be_bytes)
                .collect()
        } else {
            Self::interleave::<u8>(&plan, image, names)?
        };

        let out = BufWriter::new(File::create(&self.path)?);
        let mut encoder = png::Encoder::new(out, plan.width(), plan.height());
        encoder.set_color(color_type);
        encoder.set_depth(if sixteen_bit {
            png::BitDepth::Sixteen
        } else {
            png::BitDepth::Eight
        });
        encoder.set_compression(png::Compression::default());
        if plan.color_space == ColorSpace::Srgb {
            encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual);
        }

        let mut writer = encoder.write_header().map_err(encode_error)?;
        writer.write_image_data(&data).map_err(encode_error)?;
        writer.finish().map_err(encode_error)?;
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

    #[test]
    fn test_roundtrip_rgba_8bit() {
        let path = temp_path("plate_png_rgba.png");
        let mut image = Image::with_window(Rect::from_size(3, 2));
        image.insert_channel("R", ChannelData::from(vec![0u8, 10, 20, 30, 40, 50])).unwrap();
        image.insert_channel("G", ChannelData::from(vec![255u8; 6])).unwrap();
        image.insert_channel("B", ChannelData::from(vec![1u8, 2, 3, 4, 5, 6])).unwrap();
        image.insert_channel("A", ChannelData::from(vec![128u8; 6])).unwrap();
        PngWriter::new(&path).write(&image, &WriteOptions::default()).unwrap();

        let mut reader = PngReader::new(&path);
        assert!(PngReader::can_read(&path));
        assert_eq!(reader.channel_names().unwrap(), vec!["R", "G", "B", "A"]);
        let back = reader.read(&ReadOptions::default().raw()).unwrap();
        for name in ["R", "G", "B", "A"] {
            assert_eq!(back.channel(name).unwrap(), image.channel(name).unwrap());
        }
        assert_eq!(reader.default_color_space().unwrap(), ColorSpace::Srgb);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_gray_alpha_16bit_window() {
        let path = temp_path("plate_png_ya16.png");
        let mut image = Image::with_window(Rect::from_size(4, 2));
        image.insert_channel("Y", ChannelData::from((0..8u16).map(|v| v * 1000).collect::<Vec<_>>())).unwrap();
        image.insert_channel("A", ChannelData::from(vec![65535u16; 8])).unwrap();
        PngWriter::with_options(&path, PngWriterOptions { bit_depth: 16 })
            .write(&image, &WriteOptions::default())
            .unwrap();

        let mut reader = PngReader::new(&path);
        assert_eq!(reader.channel_names().unwrap(), vec!["Y", "A"]);
        let y = reader.read_channel("Y", Rect::new(1, 1, 2, 1), true).unwrap();
        assert_eq!(y, ChannelData::U16(vec![5000, 6000]));
        assert!(reader.is_complete());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_rejects_low_bit_depth() {
        let path = temp_path("plate_png_1bit.png");
        {
            let out = BufWriter::new(File::create(&path).unwrap());
            let mut encoder = png::Encoder::new(out, 8, 1);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::One);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0b1010_1010]).unwrap();
        }
        assert!(PngReader::can_read(&path));
        let mut reader = PngReader::new(&path);
        assert!(!reader.open(false).unwrap());
        assert!(matches!(reader.open(true), Err(IoError::Unsupported { .. })));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_bit_depth_option_validated() {
        let path = temp_path("plate_png_bad_depth.png");
        let mut image = Image::with_window(Rect::from_size(1, 1));
        image.insert_channel("Y", ChannelData::from(vec![0u8])).unwrap();
        let err = PngWriter::with_options(&path, PngWriterOptions { bit_depth: 12 })
            .write(&image, &WriteOptions::default());
        assert!(matches!(err, Err(IoError::InvalidOption { .. })));
    }
}
