//! Shared write planning.
//!
//! Every writer runs the same preamble before touching the disk:
//!
//! 1. Pick the channels (requested names, or all) and put them in canonical
//!    order: `R`, `G`, `B`, `A`, then the rest.
//! 2. Drop channels the format cannot store, with a warning. Fail if none
//!    remain.
//! 3. Intersect the target rectangle with the display and data windows.
//!
//! [`WritePlan`] captures the outcome and scatters source samples into
//! buffers covering either the display window or the write region,
//! converting kinds with scaled conversion and applying the colour preset
//! to floating-point colour channels.

use plate_core::{
    canonical_channel_order, convert, is_color_channel, ColorSpace, Image, Rect, Sample,
};
use tracing::{debug, warn};

use crate::options::WriteOptions;
use crate::{IoError, IoResult};

/// Result of the shared writer preamble.
#[derive(Debug, Clone)]
pub struct WritePlan {
    /// Codec name, for messages.
    pub format: &'static str,
    /// Display window of the source image.
    pub display_window: Rect,
    /// Target rectangle clipped to the display and data windows.
    pub region: Rect,
    /// Channels to write, in canonical order.
    pub channels: Vec<String>,
    /// Encoding applied to floating-point colour channels.
    pub color_space: ColorSpace,
}

impl WritePlan {
    /// Runs the preamble.
    ///
    /// `detected` is the preset used for `"autoDetect"`. `supported`
    /// decides whether the format can hold a channel name.
    ///
    /// # Errors
    ///
    /// - [`IoError::MissingChannel`] if a requested channel is not in the image
    /// - [`IoError::NoChannels`] if every channel was skipped
    pub fn new(
        format: &'static str,
        image: &Image,
        options: &WriteOptions,
        detected: ColorSpace,
        supported: impl Fn(&str) -> bool,
    ) -> IoResult<Self> {
        let requested: Vec<String> = if options.channels.is_empty() {
            image.channel_names().into_iter().map(String::from).collect()
        } else {
            for name in &options.channels {
                if !image.has_channel(name) {
                    return Err(IoError::MissingChannel(name.clone()));
                }
            }
            options.channels.clone()
        };

        let mut channels = Vec::with_capacity(requested.len());
        for name in canonical_channel_order(&requested) {
            if supported(&name) {
                channels.push(name);
            } else {
                warn!(format, channel = %name, "channel not supported by format, skipping");
            }
        }
        if channels.is_empty() {
            return Err(IoError::NoChannels(format));
        }

        let display_window = image.display_window();
        let target = options.data_window.unwrap_or(display_window);
        let region = target
            .intersect(&display_window)
            .intersect(&image.data_window());

        let color_space = if options.raw_channels {
            ColorSpace::Linear
        } else {
            options.color_space.resolve(detected)
        };

        debug!(
            format,
            display = %display_window,
            region = %region,
            channels = ?channels,
            color_space = color_space.name(),
            "write plan"
        );

        Ok(Self {
            format,
            display_window,
            region,
            channels,
            color_space,
        })
    }

    /// Returns `true` if the plan writes a channel of this name.
    pub fn has(&self, name: &str) -> bool {
        self.channels.iter().any(|c| c == name)
    }

    /// Width of the display window.
    pub fn width(&self) -> u32 {
        self.display_window.width()
    }

    /// Height of the display window.
    pub fn height(&self) -> u32 {
        self.display_window.height()
    }

    /// Samples of `name` over the whole display window, zero outside the
    /// write region.
    pub fn display_buffer<T: Sample>(&self, image: &Image, name: &str) -> IoResult<Vec<T>> {
        self.buffer(image, name, self.display_window)
    }

    /// Samples of `name` over the write region only.
    pub fn region_buffer<T: Sample>(&self, image: &Image, name: &str) -> IoResult<Vec<T>> {
        self.buffer(image, name, self.region)
    }

    /// Scatters the write region of `name` into a zeroed buffer covering
    /// `window`.
    pub fn buffer<T: Sample>(&self, image: &Image, name: &str, window: Rect) -> IoResult<Vec<T>> {
        let src = image.channel(name)?;
        let mut out = vec![T::default(); window.area()];
        let region = self.region.intersect(&window);
        if region.is_empty() {
            return Ok(out);
        }

        let encode = !self.color_space.is_linear()
            && is_color_channel(name)
            && !src.kind().is_integer();
        let data_window = image.data_window();

        for y in region.min_y..=region.max_y {
            let s = data_window.index_of(region.min_x, y);
            let d = window.index_of(region.min_x, y);
            for i in 0..region.width() as usize {
                out[d + i] = if encode {
                    convert::<f32, T>(self.color_space.from_linear(src.get_f32(s + i)))
                } else {
                    src.get::<T>(s + i)
                };
            }
        }
        Ok(out)
    }

    /// Like [`display_buffer`](Self::display_buffer) but always linear
    /// `f32`, for codecs that apply their own log transfer.
    pub fn display_linear(&self, image: &Image, name: &str) -> IoResult<Vec<f32>> {
        let src = image.channel(name)?;
        let mut out = vec![0.0f32; self.display_window.area()];
        let region = self.region;
        if region.is_empty() {
            return Ok(out);
        }
        let data_window = image.data_window();
        for y in region.min_y..=region.max_y {
            let s = data_window.index_of(region.min_x, y);
            let d = self.display_window.index_of(region.min_x, y);
            for i in 0..region.width() as usize {
                out[d + i] = src.get_f32(s + i);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ColorSpaceSetting;
    use plate_core::ChannelData;

    fn image() -> Image {
        let mut img = Image::new(Rect::from_size(4, 2), Rect::new(1, 0, 4, 1));
        for name in ["B", "Z", "R", "G"] {
            img.insert_channel(name, ChannelData::from(vec![1.0f32; 8])).unwrap();
        }
        img
    }

    #[test]
    fn test_channel_order_and_skip() {
        let plan = WritePlan::new(
            "TEST",
            &image(),
            &WriteOptions::default(),
            ColorSpace::Linear,
            |n| n != "Z",
        )
        .unwrap();
        assert_eq!(plan.channels, vec!["R", "G", "B"]);
    }

    #[test]
    fn test_no_channels_is_fatal() {
        let err = WritePlan::new(
            "TEST",
            &image(),
            &WriteOptions::default(),
            ColorSpace::Linear,
            |_| false,
        )
        .unwrap_err();
        assert!(matches!(err, IoError::NoChannels("TEST")));
    }

    #[test]
    fn test_missing_requested_channel() {
        let opts = WriteOptions::default().with_channels(["Q"]);
        let err = WritePlan::new("TEST", &image(), &opts, ColorSpace::Linear, |_| true).unwrap_err();
        assert!(err.is_argument_error());
    }

    #[test]
    fn test_region_intersects_all_windows() {
        let opts = WriteOptions::default().with_data_window(Rect::new(2, -5, 10, 0));
        let plan = WritePlan::new("TEST", &image(), &opts, ColorSpace::Linear, |_| true).unwrap();
        assert_eq!(plan.region, Rect::new(2, 0, 3, 0));

        let buf: Vec<u8> = plan.display_buffer(&image(), "R").unwrap();
        assert_eq!(buf, vec![0, 0, 255, 255, 0, 0, 0, 0]);
    }

    #[test]
    fn test_color_applies_to_float_only() {
        let mut img = Image::with_window(Rect::from_size(1, 1));
        img.insert_channel("R", ChannelData::from(vec![0.214f32])).unwrap();
        img.insert_channel("G", ChannelData::from(vec![10u8])).unwrap();
        img.insert_channel("A", ChannelData::from(vec![0.5f32])).unwrap();
        let opts = WriteOptions {
            color_space: ColorSpaceSetting::AutoDetect,
            ..Default::default()
        };
        let plan = WritePlan::new("TEST", &img, &opts, ColorSpace::Srgb, |_| true).unwrap();
        let r: Vec<u8> = plan.display_buffer(&img, "R").unwrap();
        let g: Vec<u8> = plan.display_buffer(&img, "G").unwrap();
        let a: Vec<u8> = plan.display_buffer(&img, "A").unwrap();
        assert!((r[0] as i32 - 128).abs() <= 1);
        assert_eq!(g[0], 10);
        assert_eq!(a[0], 128);
    }
}
