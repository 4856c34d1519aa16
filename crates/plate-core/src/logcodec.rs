//! Cineon/DPX 10-bit printing density codec.
//!
//! Film scans store scene intensity as 10-bit *log codes*, three per 32-bit
//! word. This module converts between codes and linear values and packs
//! codes into words.
//!
//! # Transfer
//!
//! With reference white `W`, reference black `K` and film gamma `g`:
//!
//! ```text
//! mult        = 0.002 / g
//! blackOffset = 10^((K - W) * mult)
//! linear(c)   = (10^((c - W) * mult) - blackOffset) / (1 - blackOffset)
//! ```
//!
//! Decoding applies the formula directly. Encoding searches a 1024-entry
//! table whose entry `i` is `linear(i + 0.5)` and returns the index of the
//! first entry not less than the input. The half-code offset makes every
//! decoded code encode back to itself; arbitrary linear values land on the
//! code at or above them.
//!
//! # Packing
//!
//! ```text
//!  31        22 21        12 11         2 1 0
//! ┌────────────┬────────────┬────────────┬───┐
//! │  channel 0 │  channel 1 │  channel 2 │pad│
//! └────────────┴────────────┴────────────┴───┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use plate_core::logcodec::{LogCodec, pack, unpack};
//!
//! let codec = LogCodec::default();
//! let white = codec.decode(685);
//! assert!((white - 1.0).abs() < 1e-6);
//! assert_eq!(codec.encode(white), 685);
//!
//! let word = pack(pack(0, 0, 1023), 2, 300);
//! assert_eq!(unpack(word, 0), 1023);
//! assert_eq!(unpack(word, 1), 0);
//! assert_eq!(unpack(word, 2), 300);
//! ```

// === Constants ===

/// Bits per packed code.
pub const CODE_BITS: u32 = 10;

/// Largest representable code.
pub const MAX_CODE: u16 = (1 << CODE_BITS) - 1;

/// Number of codes, and of encode table entries.
pub const CODE_COUNT: usize = 1 << CODE_BITS;

/// Channels packed into one 32-bit word.
pub const CHANNELS_PER_WORD: usize = 3;

const CODE_MASK: u32 = (1 << CODE_BITS) - 1;

// === Parameters ===

/// Reference points of the log transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogParams {
    /// Code that decodes to linear 1.0
    pub ref_white: f64,
    /// Code that decodes to linear 0.0
    pub ref_black: f64,
    /// Negative film gamma
    pub film_gamma: f64,
}

impl Default for LogParams {
    fn default() -> Self {
        Self {
            ref_white: 685.0,
            ref_black: 95.0,
            film_gamma: 0.6,
        }
    }
}

impl LogParams {
    /// Density change per code step divided by film gamma.
    #[inline]
    fn ref_mult(&self) -> f64 {
        0.002 / self.film_gamma
    }

    #[inline]
    fn black_offset(&self) -> f64 {
        10f64.powf((self.ref_black - self.ref_white) * self.ref_mult())
    }

    /// Linear value of a (possibly fractional) code.
    #[inline]
    pub fn linear(&self, code: f64) -> f64 {
        let black = self.black_offset();
        (10f64.powf((code - self.ref_white) * self.ref_mult()) - black) / (1.0 - black)
    }
}

// === Codec ===

/// Log/linear converter with a prebuilt encode table.
#[derive(Debug, Clone)]
pub struct LogCodec {
    params: LogParams,
    encode_table: Vec<f32>,
}

impl Default for LogCodec {
    fn default() -> Self {
        Self::new(LogParams::default())
    }
}

impl LogCodec {
    /// Builds the encode table for `params`.
    pub fn new(params: LogParams) -> Self {
        let encode_table = (0..CODE_COUNT)
            .map(|i| params.linear(i as f64 + 0.5) as f32)
            .collect();
        Self {
            params,
            encode_table,
        }
    }

    /// Transfer parameters.
    pub fn params(&self) -> &LogParams {
        &self.params
    }

    /// Decodes a 10-bit code to a linear value.
    ///
    /// Bits above the tenth are ignored.
    #[inline]
    pub fn decode(&self, code: u16) -> f32 {
        self.params.linear((code & MAX_CODE) as f64) as f32
    }

    /// Encodes a linear value as the first code whose table entry is not
    /// less than `linear`, clamped to [`MAX_CODE`].
    ///
    /// NaN encodes to 0.
    #[inline]
    pub fn encode(&self, linear: f32) -> u16 {
        if linear.is_nan() {
            return 0;
        }
        let idx = self.encode_table.partition_point(|&entry| entry < linear);
        idx.min(MAX_CODE as usize) as u16
    }

    /// Decoded value of every code, for bulk decoding.
    pub fn decode_table(&self) -> Vec<f32> {
        (0..CODE_COUNT as u16).map(|c| self.decode(c)).collect()
    }
}

// === Bit packing ===

/// Bit offset of `channel` inside a packed word.
#[inline]
pub const fn channel_shift(channel: usize) -> u32 {
    (32 - CODE_BITS) - channel as u32 * CODE_BITS
}

/// Extracts the code of `channel` (0, 1 or 2) from a native-order word.
#[inline]
pub const fn unpack(word: u32, channel: usize) -> u16 {
    let shift = channel_shift(channel);
    ((word & (CODE_MASK << shift)) >> shift) as u16
}

/// ORs `code` into the slot of `channel` (0, 1 or 2) of `word`.
///
/// Codes above [`MAX_CODE`] are clamped.
#[inline]
pub const fn pack(word: u32, channel: usize, code: u16) -> u32 {
    let code = if code > MAX_CODE { MAX_CODE } else { code };
    word | ((code as u32) << channel_shift(channel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_reference_points() {
        let codec = LogCodec::default();
        assert_abs_diff_eq!(codec.decode(95), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(codec.decode(685), 1.0, epsilon = 1e-6);
        assert!(codec.decode(0) < 0.0);
        assert!(codec.decode(1023) > 1.0);
    }

    #[test]
    fn test_decode_monotonic() {
        let table = LogCodec::default().decode_table();
        assert_eq!(table.len(), CODE_COUNT);
        for pair in table.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_code_roundtrip() {
        let codec = LogCodec::default();
        for code in 0..=MAX_CODE {
            let back = codec.encode(codec.decode(code)) as i32;
            assert!((back - code as i32).abs() <= 1, "code {} came back as {}", code, back);
        }
    }

    #[test]
    fn test_encode_biased_upward() {
        let codec = LogCodec::default();
        // halfway between two decoded codes lands on the upper one
        let mid = (codec.decode(400) + codec.decode(401)) / 2.0;
        let code = codec.encode(mid);
        assert!(code == 400 || code == 401);
        assert!(codec.decode(code) + 1e-3 >= codec.decode(400));
    }

    #[test]
    fn test_encode_clamps() {
        let codec = LogCodec::default();
        assert_eq!(codec.encode(-10.0), 0);
        assert_eq!(codec.encode(1.0e6), MAX_CODE);
        assert_eq!(codec.encode(f32::NAN), 0);
    }

    #[test]
    fn test_pack_layout() {
        assert_eq!(channel_shift(0), 22);
        assert_eq!(channel_shift(1), 12);
        assert_eq!(channel_shift(2), 2);

        let word = pack(pack(pack(0, 0, 1), 1, 2), 2, 3);
        assert_eq!(word, (1 << 22) | (2 << 12) | (3 << 2));
        assert_eq!(word & 0b11, 0);
        for (c, v) in [(0, 1), (1, 2), (2, 3)] {
            assert_eq!(unpack(word, c), v);
        }
        assert_eq!(unpack(pack(0, 1, 5000), 1), MAX_CODE);
    }
}
