//! Format detection and dispatch.
//!
//! Readers are picked by probing file contents, writers by extension.

use std::path::Path;

use plate_core::Image;
use tracing::debug;

use crate::cineon::{CineonReader, CineonWriter};
use crate::dpx::{DpxReader, DpxWriter};
use crate::options::{ReadOptions, WriteOptions};
use crate::sgi::{SgiReader, SgiWriter};
use crate::tga::{TgaReader, TgaWriter};
use crate::yuv::YuvWriter;
use crate::{ImageReader, ImageWriter, IoError, IoResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// SMPTE DPX.
    Dpx,
    /// Kodak Cineon.
    Cineon,
    /// OpenEXR.
    Exr,
    /// PNG.
    Png,
    /// JPEG/JFIF.
    Jpeg,
    /// TIFF.
    Tiff,
    /// SGI image file.
    Sgi,
    /// Truevision TGA.
    Tga,
    /// Raw planar YUV 4:2:0, write only.
    Yuv,
}

impl Format {
    /// Every format, in probe order.
    pub const ALL: [Format; 9] = [
        Format::Dpx,
        Format::Cineon,
        Format::Exr,
        Format::Png,
        Format::Jpeg,
        Format::Tiff,
        Format::Sgi,
        Format::Tga,
        Format::Yuv,
    ];

    /// Detects the format from the file extension only.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())?;
        Self::ALL
            .into_iter()
            .find(|f| f.extensions().contains(&ext.as_str()))
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Dpx => "DPX",
            Format::Cineon => "Cineon",
            Format::Exr => "OpenEXR",
            Format::Png => "PNG",
            Format::Jpeg => "JPEG",
            Format::Tiff => "TIFF",
            Format::Sgi => "SGI",
            Format::Tga => "TGA",
            Format::Yuv => "YUV",
        }
    }

    /// Recognised file extensions, lowercase, preferred first.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Dpx => &["dpx"],
            Format::Cineon => &["cin"],
            Format::Exr => &["exr"],
            Format::Png => &["png"],
            Format::Jpeg => &["jpg", "jpeg", "jpe"],
            Format::Tiff => &["tif", "tiff"],
            Format::Sgi => &["sgi", "rgb", "rgba", "bw", "int", "inta"],
            Format::Tga => &["tga"],
            Format::Yuv => &["yuv"],
        }
    }

    /// Returns `true` if a reader for this format is compiled in.
    pub fn can_read(&self) -> bool {
        match self {
            Format::Dpx | Format::Cineon | Format::Sgi | Format::Tga => true,
            Format::Exr => cfg!(feature = "exr"),
            Format::Png => cfg!(feature = "png"),
            Format::Jpeg => cfg!(feature = "jpeg"),
            Format::Tiff => cfg!(feature = "tiff"),
            Format::Yuv => false,
        }
    }

    /// Returns `true` if a writer for this format is compiled in.
    pub fn can_write(&self) -> bool {
        *self == Format::Yuv || self.can_read()
    }

    /// Runs the content probe of this format's reader.
    fn probe(&self, path: &Path) -> bool {
        match self {
            Format::Dpx => DpxReader::can_read(path),
            Format::Cineon => CineonReader::can_read(path),
            #[cfg(feature = "exr")]
            Format::Exr => crate::exr::ExrReader::can_read(path),
            #[cfg(feature = "png")]
            Format::Png => crate::png::PngReader::can_read(path),
            #[cfg(feature = "jpeg")]
            Format::Jpeg => crate::jpeg::JpegReader::can_read(path),
            #[cfg(feature = "tiff")]
            Format::Tiff => crate::tiff::TiffReader::can_read(path),
            Format::Sgi => SgiReader::can_read(path),
            Format::Tga => TgaReader::can_read(path),
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn unsupported(path: &Path) -> IoError {
    IoError::UnsupportedFormat(path.display().to_string())
}

/// Detects the format of an existing file.
///
/// Content probes run in [`Format::ALL`] order. TGA is only matched with a
/// `.tga` extension since it has no magic number; a `.yuv` file is
/// recognised by extension alone.
///
/// # Errors
///
/// - [`IoError::Io`] if the file cannot be accessed
/// - [`IoError::UnsupportedFormat`] if nothing matches
pub fn detect<P: AsRef<Path>>(path: P) -> IoResult<Format> {
    let path = path.as_ref();
    std::fs::metadata(path)?;

    let format = Format::ALL
        .into_iter()
        .find(|f| f.probe(path))
        .or_else(|| Format::from_extension(path).filter(|f| *f == Format::Yuv))
        .ok_or_else(|| unsupported(path))?;
    debug!(path = %path.display(), format = %format, "detected format");
    Ok(format)
}

/// Returns a reader for `path`, picked by [`detect`].
pub fn reader_for<P: AsRef<Path>>(path: P) -> IoResult<Box<dyn ImageReader>> {
    let path = path.as_ref();
    let reader: Box<dyn ImageReader> = match detect(path)? {
        Format::Dpx => Box::new(DpxReader::new(path)),
        Format::Cineon => Box::new(CineonReader::new(path)),
        #[cfg(feature = "exr")]
        Format::Exr => Box::new(crate::exr::ExrReader::new(path)),
        #[cfg(feature = "png")]
        Format::Png => Box::new(crate::png::PngReader::new(path)),
        #[cfg(feature = "jpeg")]
        Format::Jpeg => Box::new(crate::jpeg::JpegReader::new(path)),
        #[cfg(feature = "tiff")]
        Format::Tiff => Box::new(crate::tiff::TiffReader::new(path)),
        Format::Sgi => Box::new(SgiReader::new(path)),
        Format::Tga => Box::new(TgaReader::new(path)),
        _ => return Err(unsupported(path)),
    };
    Ok(reader)
}

/// Returns a writer for `path`, picked by extension.
pub fn writer_for<P: AsRef<Path>>(path: P) -> IoResult<Box<dyn ImageWriter>> {
    let path = path.as_ref();
    let format = Format::from_extension(path).ok_or_else(|| unsupported(path))?;
    let writer: Box<dyn ImageWriter> = match format {
        Format::Dpx => Box::new(DpxWriter::new(path)),
        Format::Cineon => Box::new(CineonWriter::new(path)),
        #[cfg(feature = "exr")]
        Format::Exr => Box::new(crate::exr::ExrWriter::new(path)),
        #[cfg(feature = "png")]
        Format::Png => Box::new(crate::png::PngWriter::new(path)),
        #[cfg(feature = "jpeg")]
        Format::Jpeg => Box::new(crate::jpeg::JpegWriter::new(path)),
        #[cfg(feature = "tiff")]
        Format::Tiff => Box::new(crate::tiff::TiffWriter::new(path)),
        Format::Sgi => Box::new(SgiWriter::new(path)),
        Format::Tga => Box::new(TgaWriter::new(path)),
        Format::Yuv => Box::new(YuvWriter::new(path)),
        #[allow(unreachable_patterns)]
        _ => return Err(unsupported(path)),
    };
    Ok(writer)
}

/// Reads an image, detecting the format from the file contents.
///
/// # Example
///
/// ```rust,ignore
/// use plate_io::{read, ReadOptions};
///
/// let image = read("plate.0001.dpx", &ReadOptions::default())?;
/// ```
pub fn read<P: AsRef<Path>>(path: P, options: &ReadOptions) -> IoResult<Image> {
    reader_for(path)?.read(options)
}

/// Writes an image, picking the format from the extension.
///
/// Per-format options take their defaults. Construct a writer directly to
/// change them.
pub fn write<P: AsRef<Path>>(path: P, image: &Image, options: &WriteOptions) -> IoResult<()> {
    writer_for(path)?.write(image, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plate_core::{ChannelData, Rect};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn test_extension_detection() {
        assert_eq!(Format::from_extension("a.DPX"), Some(Format::Dpx));
        assert_eq!(Format::from_extension("a.cin"), Some(Format::Cineon));
        assert_eq!(Format::from_extension("a.jpeg"), Some(Format::Jpeg));
        assert_eq!(Format::from_extension("a.tif"), Some(Format::Tiff));
        assert_eq!(Format::from_extension("a.rgb"), Some(Format::Sgi));
        assert_eq!(Format::from_extension("a.yuv"), Some(Format::Yuv));
        assert_eq!(Format::from_extension("a.hdr"), None);
        assert_eq!(Format::from_extension("noext"), None);
    }

    #[test]
    fn test_capabilities() {
        assert!(!Format::Yuv.can_read());
        assert!(Format::Yuv.can_write());
        assert!(Format::Dpx.can_read());
        assert_eq!(Format::Exr.to_string(), "OpenEXR");
    }

    #[test]
    fn test_detect_ignores_misleading_extension() {
        // SGI content behind a .dpx name
        let path = temp_path("plate_detect_sgi.dpx");
        let mut image = Image::with_window(Rect::from_size(2, 2));
        image.insert_channel("Y", ChannelData::from(vec![0u8, 64, 128, 255])).unwrap();
        SgiWriter::new(&path).write(&image, &WriteOptions::default()).unwrap();

        assert_eq!(detect(&path).unwrap(), Format::Sgi);
        let back = read(&path, &ReadOptions::default().raw()).unwrap();
        assert_eq!(back.channel("Y").unwrap(), image.channel("Y").unwrap());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unknown_and_missing() {
        let path = temp_path("plate_detect_garbage.bin");
        std::fs::write(&path, [0u8; 64]).unwrap();
        assert!(matches!(detect(&path), Err(IoError::UnsupportedFormat(_))));
        let _ = std::fs::remove_file(&path);

        let missing = temp_path("plate_detect_missing.dpx");
        assert!(matches!(detect(&missing), Err(IoError::Io(_))));
        assert!(writer_for("out.xyz").is_err());
    }

    #[test]
    fn test_yuv_is_write_only() {
        let path = temp_path("plate_detect.yuv");
        std::fs::write(&path, [16u8; 6]).unwrap();
        assert_eq!(detect(&path).unwrap(), Format::Yuv);
        assert!(reader_for(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
