//! Reader and writer configuration.
//!
//! Options are plain structs with `Default`. They can also be built from an
//! [`Attrs`] set carrying the recognised keys:
//!
//! | Key | Type | Empty / absent means |
//! |-----|------|----------------------|
//! | `dataWindow` | rect | the file's (or image's) full data window |
//! | `displayWindow` | rect | inferred from the file |
//! | `channels` | string list | all channels |
//! | `colorSpace` | string | `"autoDetect"` |
//! | `rawChannels` | bool | `false` |
//!
//! ```rust
//! use plate_io::Attrs;
//! use plate_io::{ColorSpaceSetting, ReadOptions};
//!
//! let mut params = Attrs::new();
//! params.set("channels", vec!["R".to_string(), "G".to_string()]);
//! params.set("rawChannels", true);
//!
//! let opts = ReadOptions::from_attrs(&params)?;
//! assert_eq!(opts.channels, vec!["R", "G"]);
//! assert!(opts.raw_channels);
//! assert_eq!(opts.color_space, ColorSpaceSetting::AutoDetect);
//! # Ok::<(), plate_io::IoError>(())
//! ```

use plate_core::{ColorSpace, Rect};
use tracing::debug;

use crate::attrs::Attrs;
use crate::{IoError, IoResult};

// === Keys ===

/// Requested data window.
pub const KEY_DATA_WINDOW: &str = "dataWindow";
/// Requested display window.
pub const KEY_DISPLAY_WINDOW: &str = "displayWindow";
/// Requested channel names.
pub const KEY_CHANNELS: &str = "channels";
/// Colour preset name or `"autoDetect"`.
pub const KEY_COLOR_SPACE: &str = "colorSpace";
/// Bypass scaling and colour conversion.
pub const KEY_RAW_CHANNELS: &str = "rawChannels";

const AUTO_DETECT: &str = "autoDetect";

/// Colour handling for non-raw channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceSetting {
    /// Use the codec's default for the file at hand.
    #[default]
    AutoDetect,
    /// Use a named preset.
    Named(ColorSpace),
}

impl ColorSpaceSetting {
    /// Parses `"autoDetect"` or a preset name.
    pub fn parse(name: &str) -> IoResult<Self> {
        if name.is_empty() || name.eq_ignore_ascii_case(AUTO_DETECT) {
            return Ok(Self::AutoDetect);
        }
        ColorSpace::from_name(name)
            .map(Self::Named)
            .ok_or_else(|| IoError::invalid_option(KEY_COLOR_SPACE, format!("unknown colour space \"{}\"", name)))
    }

    /// Picks the preset to use given the codec's default.
    pub fn resolve(self, detected: ColorSpace) -> ColorSpace {
        match self {
            Self::AutoDetect => detected,
            Self::Named(cs) => cs,
        }
    }
}

/// Options for [`ImageReader::read`](crate::ImageReader::read).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOptions {
    /// Window to read; `None` reads the file's data window.
    pub data_window: Option<Rect>,
    /// Display window of the result; `None` uses the file's.
    pub display_window: Option<Rect>,
    /// Channels to read; empty reads all.
    pub channels: Vec<String>,
    /// Colour handling for non-raw reads.
    pub color_space: ColorSpaceSetting,
    /// Return on-disk sample kinds without scaling or colour conversion.
    pub raw_channels: bool,
}

impl ReadOptions {
    /// Builds options from a configuration set.
    ///
    /// Unknown keys are ignored. Known keys with the wrong value type are
    /// argument errors.
    pub fn from_attrs(attrs: &Attrs) -> IoResult<Self> {
        let mut opts = Self::default();
        for (key, value) in attrs.iter() {
            match key.as_str() {
                KEY_DATA_WINDOW => opts.data_window = window_value(key, value)?,
                KEY_DISPLAY_WINDOW => opts.display_window = window_value(key, value)?,
                KEY_CHANNELS => opts.channels = channels_value(key, value)?,
                KEY_COLOR_SPACE => opts.color_space = color_space_value(key, value)?,
                KEY_RAW_CHANNELS => opts.raw_channels = bool_value(key, value)?,
                other => debug!(key = other, "ignoring unknown read option"),
            }
        }
        Ok(opts)
    }

    /// Restricts the read to `window`.
    pub fn with_data_window(mut self, window: Rect) -> Self {
        self.data_window = Some(window);
        self
    }

    /// Restricts the read to the named channels.
    pub fn with_channels<S: Into<String>>(mut self, channels: impl IntoIterator<Item = S>) -> Self {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Requests raw on-disk samples.
    pub fn raw(mut self) -> Self {
        self.raw_channels = true;
        self
    }

    /// Selects a colour preset.
    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = ColorSpaceSetting::Named(color_space);
        self
    }
}

/// Options shared by every writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOptions {
    /// Target rectangle; `None` writes the whole image.
    pub data_window: Option<Rect>,
    /// Channels to write; empty writes all.
    pub channels: Vec<String>,
    /// Colour handling for floating-point source channels.
    pub color_space: ColorSpaceSetting,
    /// Skip colour conversion.
    pub raw_channels: bool,
}

impl WriteOptions {
    /// Builds options from a configuration set.
    ///
    /// `displayWindow` is meaningless for writers and ignored.
    pub fn from_attrs(attrs: &Attrs) -> IoResult<Self> {
        let mut opts = Self::default();
        for (key, value) in attrs.iter() {
            match key.as_str() {
                KEY_DATA_WINDOW => opts.data_window = window_value(key, value)?,
                KEY_CHANNELS => opts.channels = channels_value(key, value)?,
                KEY_COLOR_SPACE => opts.color_space = color_space_value(key, value)?,
                KEY_RAW_CHANNELS => opts.raw_channels = bool_value(key, value)?,
                other => debug!(key = other, "ignoring unknown write option"),
            }
        }
        Ok(opts)
    }

    /// Restricts the write to `window`.
    pub fn with_data_window(mut self, window: Rect) -> Self {
        self.data_window = Some(window);
        self
    }

    /// Restricts the write to the named channels.
    pub fn with_channels<S: Into<String>>(mut self, channels: impl IntoIterator<Item = S>) -> Self {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Selects a colour preset.
    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = ColorSpaceSetting::Named(color_space);
        self
    }
}

// === Value parsing ===

fn wrong_type(key: &str, expected: &str, value: &crate::attrs::AttrValue) -> IoError {
    IoError::invalid_option(key, format!("expected {}, got {}", expected, value.type_name()))
}

fn window_value(key: &str, value: &crate::attrs::AttrValue) -> IoResult<Option<Rect>> {
    let rect = value.as_rect().ok_or_else(|| wrong_type(key, "rect", value))?;
    Ok(if rect.is_empty() { None } else { Some(rect) })
}

fn channels_value(key: &str, value: &crate::attrs::AttrValue) -> IoResult<Vec<String>> {
    value
        .as_str_list()
        .ok_or_else(|| wrong_type(key, "string list", value))
}

fn color_space_value(key: &str, value: &crate::attrs::AttrValue) -> IoResult<ColorSpaceSetting> {
    let name = value.as_str().ok_or_else(|| wrong_type(key, "string", value))?;
    ColorSpaceSetting::parse(name)
}

fn bool_value(key: &str, value: &crate::attrs::AttrValue) -> IoResult<bool> {
    value.as_bool().ok_or_else(|| wrong_type(key, "bool", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_means_full() {
        let mut attrs = Attrs::new();
        attrs.set(KEY_DATA_WINDOW, Rect::empty());
        attrs.set(KEY_DISPLAY_WINDOW, Rect::new(0, 0, 9, 9));
        let opts = ReadOptions::from_attrs(&attrs).unwrap();
        assert_eq!(opts.data_window, None);
        assert_eq!(opts.display_window, Some(Rect::new(0, 0, 9, 9)));
    }

    #[test]
    fn test_wrong_type_is_argument_error() {
        let mut attrs = Attrs::new();
        attrs.set(KEY_RAW_CHANNELS, "yes");
        let err = ReadOptions::from_attrs(&attrs).unwrap_err();
        assert!(err.is_argument_error());
        assert!(err.to_string().contains("rawChannels"));
    }

    #[test]
    fn test_color_space_parsing() {
        assert_eq!(ColorSpaceSetting::parse("autoDetect").unwrap(), ColorSpaceSetting::AutoDetect);
        assert_eq!(
            ColorSpaceSetting::parse("sRGB").unwrap(),
            ColorSpaceSetting::Named(ColorSpace::Srgb)
        );
        assert!(ColorSpaceSetting::parse("bogus").is_err());
        assert_eq!(
            ColorSpaceSetting::AutoDetect.resolve(ColorSpace::Srgb),
            ColorSpace::Srgb
        );
        assert_eq!(
            ColorSpaceSetting::Named(ColorSpace::Linear).resolve(ColorSpace::Srgb),
            ColorSpace::Linear
        );
    }

    #[test]
    fn test_write_options_ignore_display_window() {
        let mut attrs = Attrs::new();
        attrs.set(KEY_DISPLAY_WINDOW, Rect::new(0, 0, 1, 1));
        attrs.set(KEY_CHANNELS, "Y");
        let opts = WriteOptions::from_attrs(&attrs).unwrap();
        assert_eq!(opts.channels, vec!["Y"]);
        assert_eq!(opts.data_window, None);
    }
}
