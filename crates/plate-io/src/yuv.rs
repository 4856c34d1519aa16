//! Raw YUV (Y'CbCr) writer.
//!
//! Output is headerless 8-bit planar 4:2:0: a full-resolution luma plane
//! followed by the Cb and Cr planes at half resolution in both axes. Each
//! chroma sample is taken from the top-left pixel of its 2x2 block.
//!
//! There is no reader. The file carries no dimensions, so a raw stream
//! cannot be decoded without outside knowledge.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use plate_core::{convert, ColorSpace, Image};
use tracing::debug;

use crate::options::WriteOptions;
use crate::writer::WritePlan;
use crate::{ImageWriter, IoError, IoResult};

const FORMAT: &str = "YUV";

/// Luma coefficients `(kB, kR)`.
pub type LumaCoefficients = (f32, f32);

/// ITU-R BT.709.
pub const REC709: LumaCoefficients = (0.0722, 0.2126);
/// ITU-R BT.601.
pub const REC601: LumaCoefficients = (0.114, 0.299);

/// Quantization range of the written components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YuvRange {
    /// Every component spans 0..=255.
    #[default]
    Full,
    /// Luma spans 16..=235 and chroma 16..=240.
    Standard,
}

impl YuvRange {
    /// `(min, max)` of luma then chroma, normalized.
    fn bounds(self) -> [(f32, f32); 2] {
        match self {
            Self::Full => [(0.0, 1.0), (0.0, 1.0)],
            Self::Standard => [
                (16.0 / 255.0, 235.0 / 255.0),
                (16.0 / 255.0, 240.0 / 255.0),
            ],
        }
    }
}

/// Options for writing YUV files.
#[derive(Debug, Clone)]
pub struct YuvWriterOptions {
    /// Default: [`REC709`].
    pub kb_kr: LumaCoefficients,
    /// Default: [`YuvRange::Full`].
    pub range: YuvRange,
}

impl Default for YuvWriterOptions {
    fn default() -> Self {
        Self {
            kb_kr: REC709,
            range: YuvRange::Full,
        }
    }
}

/// YUV 4:2:0 writer.
///
/// Requires `R`, `G` and `B` and an even display window. Other channels
/// are skipped with a warning.
#[derive(Debug, Clone)]
pub struct YuvWriter {
    path: PathBuf,
    options: YuvWriterOptions,
}

impl YuvWriter {
    /// Creates a writer for `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, YuvWriterOptions::default())
    }

    /// Creates a writer with explicit options.
    pub fn with_options(path: impl Into<PathBuf>, options: YuvWriterOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    fn coefficients(&self) -> IoResult<(f32, f32)> {
        let (kb, kr) = self.options.kb_kr;
        if !(kb > 0.0 && kr > 0.0 && kb + kr < 1.0) {
            return Err(IoError::invalid_option(
                "kBkR",
                format!("({}, {}) are not valid luma coefficients", kb, kr),
            ));
        }
        Ok((kb, kr))
    }
}

impl ImageWriter for YuvWriter {
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
        matches!(name, "R" | "G" | "B")
    }

    fn write(&mut self, image: &Image, options: &WriteOptions) -> IoResult<()> {
        let (kb, kr) = self.coefficients()?;
        let plan = WritePlan::new(FORMAT, image, options, ColorSpace::Linear, |n| {
            self.supports_channel(n)
        })?;
        let missing: Vec<&str> = ["R", "G", "B"]
            .into_iter()
            .filter(|c| !plan.has(c))
            .collect();
        if !missing.is_empty() {
            return Err(IoError::EncodeError(format!(
                "YUV needs R, G and B, missing {}",
                missing.join(", ")
            )));
        }

        let width = plan.width() as usize;
        let height = plan.height() as usize;
        if width % 2 != 0 || height % 2 != 0 {
            return Err(IoError::unsupported(
                FORMAT,
                "resolution",
                format!("{}x{}", width, height),
                &self.path,
            ));
        }

        let r = plan.display_buffer::<f32>(image, "R")?;
        let g = plan.display_buffer::<f32>(image, "G")?;
        let b = plan.display_buffer::<f32>(image, "B")?;
        let [(y_min, y_max), (c_min, c_max)] = self.options.range.bounds();

        let mut luma = Vec::with_capacity(width * height);
        let mut cb = Vec::with_capacity(width * height / 4);
        let mut cr = Vec::with_capacity(width * height / 4);
        for row in 0..height {
            for col in 0..width {
                let i = row * width + col;
                let (r, g, b) = (
                    r[i].clamp(0.0, 1.0),
                    g[i].clamp(0.0, 1.0),
                    b[i].clamp(0.0, 1.0),
                );
                let y = kr * r + (1.0 - kr - kb) * g + kb * b;
                luma.push(convert::<f32, u8>(y * (y_max - y_min) + y_min));

                if row % 2 == 0 && col % 2 == 0 {
                    let pb = 0.5 * (b - y) / (1.0 - kb) + 0.5;
                    let pr = 0.5 * (r - y) / (1.0 - kr) + 0.5;
                    cb.push(convert::<f32, u8>(pb * (c_max - c_min) + c_min));
                    cr.push(convert::<f32, u8>(pr * (c_max - c_min) + c_min));
                }
            }
        }

        debug!(
            path = %self.path.display(),
            width,
            height,
            kb,
            kr,
            range = ?self.options.range,
            "YUV 4:2:0"
        );
        let mut out = BufWriter::new(File::create(&self.path)?);
        out.write_all(&luma)?;
        out.write_all(&cb)?;
        out.write_all(&cr)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plate_core::{ChannelData, Rect};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    /// 4x2 image: left 2x2 block red, right block black.
    fn red_black() -> Image {
        let mut image = Image::with_window(Rect::from_size(4, 2));
        let red = vec![1.0f32, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0];
        image.insert_channel("R", ChannelData::from(red)).unwrap();
        image.insert_channel("G", ChannelData::from(vec![0.0f32; 8])).unwrap();
        image.insert_channel("B", ChannelData::from(vec![0.0f32; 8])).unwrap();
        image.insert_channel("A", ChannelData::from(vec![1.0f32; 8])).unwrap();
        image
    }

    #[test]
    fn test_rec709_full_range() {
        let path = temp_path("plate_yuv_709.yuv");
        YuvWriter::new(&path).write(&red_black(), &WriteOptions::default()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 8 + 2 + 2);
        assert_eq!(&bytes[..8], &[54, 54, 0, 0, 54, 54, 0, 0]);
        assert_eq!(&bytes[8..10], &[98, 128]);
        assert_eq!(&bytes[10..], &[255, 128]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_rec601_standard_range() {
        let path = temp_path("plate_yuv_601.yuv");
        let options = YuvWriterOptions {
            kb_kr: REC601,
            range: YuvRange::Standard,
        };
        YuvWriter::with_options(&path, options)
            .write(&red_black(), &WriteOptions::default())
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], &[81, 81, 16, 16]);
        assert_eq!(&bytes[8..10], &[90, 128]);
        assert_eq!(&bytes[10..], &[240, 128]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_odd_resolution_rejected() {
        let path = temp_path("plate_yuv_odd.yuv");
        let window = Rect::from_size(3, 2);
        let mut image = Image::with_window(window);
        for name in ["R", "G", "B"] {
            image.insert_channel(name, ChannelData::from(vec![0.5f32; 6])).unwrap();
        }
        let err = YuvWriter::new(&path).write(&image, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::Unsupported { .. }));
    }

    #[test]
    fn test_needs_rgb() {
        let path = temp_path("plate_yuv_missing.yuv");
        let mut image = Image::with_window(Rect::from_size(2, 2));
        image.insert_channel("R", ChannelData::from(vec![0.5f32; 4])).unwrap();
        image.insert_channel("G", ChannelData::from(vec![0.5f32; 4])).unwrap();
        assert!(YuvWriter::new(&path).write(&image, &WriteOptions::default()).is_err());

        let mut bad = YuvWriter::with_options(
            &path,
            YuvWriterOptions {
                kb_kr: (0.6, 0.5),
                ..YuvWriterOptions::default()
            },
        );
        assert!(bad.write(&red_black(), &WriteOptions::default()).unwrap_err().is_argument_error());
    }
}
