//! Windowed image data model.
//!
//! An [`Image`] owns:
//! - a **display window**, the nominal canvas
//! - a **data window**, the region with stored samples
//! - a map from channel name to [`ChannelData`]
//!
//! # Memory Layout
//!
//! Channels are planar. Each holds exactly `data_window.area()` samples in
//! **row-major** order, top to bottom, left to right:
//!
//! ```text
//! R: [r00 r01 r02 ... r10 r11 ...]
//! G: [g00 g01 g02 ... g10 g11 ...]
//! ```
//!
//! Channels may use different sample kinds. Samples outside the data
//! window read as zero when the display window is queried.
//!
//! # Usage
//!
//! ```rust
//! use plate_core::{ChannelData, Image, Rect};
//!
//! let mut img = Image::new(Rect::from_size(2, 2), Rect::from_size(2, 2));
//! img.insert_channel("R", ChannelData::from(vec![0.0f32, 0.25, 0.5, 1.0]))?;
//! img.insert_channel("A", ChannelData::from(vec![255u8; 4]))?;
//!
//! assert_eq!(img.channel_names(), vec!["A", "R"]);
//! assert_eq!(img.channel("A")?.get_f32(0), 1.0);
//! # Ok::<(), plate_core::Error>(())
//! ```
//!
//! # Used By
//!
//! - `plate-io` - every reader produces an `Image`, every writer consumes one

use std::collections::BTreeMap;

use crate::{ChannelData, Error, Rect, Result};

/// Planar image with display and data windows.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    display_window: Rect,
    data_window: Rect,
    channels: BTreeMap<String, ChannelData>,
}

impl Default for Image {
    fn default() -> Self {
        Self::new(Rect::empty(), Rect::empty())
    }
}

impl Image {
    /// Creates an image without channels.
    pub fn new(display_window: Rect, data_window: Rect) -> Self {
        Self {
            display_window,
            data_window,
            channels: BTreeMap::new(),
        }
    }

    /// Creates an image whose data window equals its display window.
    pub fn with_window(window: Rect) -> Self {
        Self::new(window, window)
    }

    /// The nominal canvas.
    #[inline]
    pub fn display_window(&self) -> Rect {
        self.display_window
    }

    /// The region with stored samples.
    #[inline]
    pub fn data_window(&self) -> Rect {
        self.data_window
    }

    /// Replaces the display window. Samples are unaffected.
    pub fn set_display_window(&mut self, window: Rect) {
        self.display_window = window;
    }

    /// Replaces the data window.
    ///
    /// Channels whose length no longer matches the new area are dropped and
    /// their names returned.
    pub fn set_data_window(&mut self, window: Rect) -> Vec<String> {
        self.data_window = window;
        let area = window.area();
        let stale: Vec<String> = self
            .channels
            .iter()
            .filter(|(_, data)| data.len() != area)
            .map(|(name, _)| name.clone())
            .collect();
        for name in &stale {
            self.channels.remove(name);
        }
        stale
    }

    /// Adds or replaces a channel.
    ///
    /// # Errors
    ///
    /// [`Error::SampleCountMismatch`] if `data` does not cover the data
    /// window exactly.
    pub fn insert_channel(&mut self, name: impl Into<String>, data: ChannelData) -> Result<()> {
        let name = name.into();
        let expected = self.data_window.area();
        if data.len() != expected {
            return Err(Error::sample_count_mismatch(name, expected, data.len()));
        }
        self.channels.insert(name, data);
        Ok(())
    }

    /// Borrows a channel.
    pub fn channel(&self, name: &str) -> Result<&ChannelData> {
        self.channels
            .get(name)
            .ok_or_else(|| Error::MissingChannel(name.to_string()))
    }

    /// Mutably borrows a channel. The length must be preserved.
    pub fn channel_mut(&mut self, name: &str) -> Result<&mut ChannelData> {
        self.channels
            .get_mut(name)
            .ok_or_else(|| Error::MissingChannel(name.to_string()))
    }

    /// Removes a channel, handing its storage back.
    pub fn remove_channel(&mut self, name: &str) -> Option<ChannelData> {
        self.channels.remove(name)
    }

    /// Returns `true` if the channel exists.
    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Returns `true` if the channel exists and matches the data window.
    pub fn channel_valid(&self, name: &str) -> bool {
        self.channels
            .get(name)
            .is_some_and(|c| c.len() == self.data_window.area())
    }

    /// Channel names in sorted order.
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.keys().map(String::as_str).collect()
    }

    /// Iterates over `(name, data)` pairs in sorted order.
    pub fn channels(&self) -> impl Iterator<Item = (&str, &ChannelData)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Normalized samples of `name` laid out over the display window.
    ///
    /// Pixels outside the data window are zero.
    pub fn display_samples(&self, name: &str) -> Result<Vec<f32>> {
        let data = self.channel(name)?;
        let display = self.display_window;
        let mut out = vec![0.0f32; display.area()];
        let overlap = display.intersect(&self.data_window);
        if overlap.is_empty() {
            return Ok(out);
        }
        for y in overlap.min_y..=overlap.max_y {
            let src = self.data_window.index_of(overlap.min_x, y);
            let dst = display.index_of(overlap.min_x, y);
            for i in 0..overlap.width() as usize {
                out[dst + i] = data.get_f32(src + i);
            }
        }
        Ok(out)
    }
}

/// Orders channel names for writing: `R`, `G`, `B`, `A` first, then the
/// rest in their given order. Duplicates are dropped.
///
/// ```rust
/// use plate_core::canonical_channel_order;
///
/// let names = ["Z", "B", "A", "R", "G", "B"];
/// assert_eq!(canonical_channel_order(&names), vec!["R", "G", "B", "A", "Z"]);
/// ```
pub fn canonical_channel_order<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for preferred in ["R", "G", "B", "A"] {
        if names.iter().any(|n| n.as_ref() == preferred) {
            out.push(preferred.to_string());
        }
    }
    for name in names {
        let name = name.as_ref();
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_validates_length() {
        let mut img = Image::with_window(Rect::from_size(3, 2));
        assert!(img.insert_channel("R", ChannelData::from(vec![0u8; 6])).is_ok());
        let err = img.insert_channel("G", ChannelData::from(vec![0u8; 5])).unwrap_err();
        assert!(matches!(err, Error::SampleCountMismatch { expected: 6, actual: 5, .. }));
        assert!(!img.has_channel("G"));
    }

    #[test]
    fn test_missing_channel() {
        let img = Image::with_window(Rect::from_size(1, 1));
        assert!(matches!(img.channel("R"), Err(Error::MissingChannel(_))));
    }

    #[test]
    fn test_mixed_kinds() {
        let mut img = Image::with_window(Rect::from_size(2, 1));
        img.insert_channel("R", ChannelData::from(vec![0.5f32, 1.0])).unwrap();
        img.insert_channel("A", ChannelData::from(vec![0u16, 65535])).unwrap();
        assert_eq!(img.channel("R").unwrap().kind(), crate::SampleKind::F32);
        assert_eq!(img.channel("A").unwrap().kind(), crate::SampleKind::U16);
        assert_eq!(img.num_channels(), 2);
    }

    #[test]
    fn test_display_samples_zero_outside_data() {
        let mut img = Image::new(Rect::from_size(3, 3), Rect::new(1, 1, 3, 3));
        img.insert_channel("Y", ChannelData::from(vec![1.0f32; 9])).unwrap();
        let samples = img.display_samples("Y").unwrap();
        assert_eq!(
            samples,
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_set_data_window_drops_stale() {
        let mut img = Image::with_window(Rect::from_size(2, 2));
        img.insert_channel("R", ChannelData::from(vec![0u8; 4])).unwrap();
        let dropped = img.set_data_window(Rect::from_size(1, 1));
        assert_eq!(dropped, vec!["R".to_string()]);
        assert_eq!(img.num_channels(), 0);
    }

    #[test]
    fn test_canonical_order_keeps_extras() {
        assert_eq!(
            canonical_channel_order(&["Data1", "A", "Y"]),
            vec!["A", "Data1", "Y"]
        );
    }
}
