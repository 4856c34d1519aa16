//! Sample kinds and scaled numeric conversion.
//!
//! Channels store samples of one of six [`SampleKind`]s. Converting between
//! kinds preserves *normalized intensity*:
//!
//! | From \ To | integer | float |
//! |-----------|---------|-------|
//! | integer   | proportional rescale, rounded | divide by source max |
//! | float     | multiply by target max, round, clamp to `[0, max]` | direct cast |
//!
//! Out-of-range floats clamp silently when narrowed to integers; NaN maps
//! to zero.
//!
//! # Example
//!
//! ```rust
//! use plate_core::sample::convert;
//!
//! assert_eq!(convert::<u8, u16>(255), 65535);
//! assert_eq!(convert::<u16, u8>(257), 1);
//! assert_eq!(convert::<u8, f32>(255), 1.0);
//! assert_eq!(convert::<f32, u8>(2.0), 255);
//! assert_eq!(convert::<f32, u8>(-1.0), 0);
//! ```

use half::f16;

/// Numeric representation of one channel's samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 16-bit IEEE half float
    F16,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl SampleKind {
    /// Returns `true` for the unsigned integer kinds.
    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32)
    }

    /// Largest representable value for integer kinds, `None` for floats.
    #[inline]
    pub const fn max_value(self) -> Option<f64> {
        match self {
            Self::U8 => Some(u8::MAX as f64),
            Self::U16 => Some(u16::MAX as f64),
            Self::U32 => Some(u32::MAX as f64),
            _ => None,
        }
    }

    /// Storage size of one sample in bytes.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
            Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Short lowercase name, as used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::F16 => "f16",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl std::fmt::Display for SampleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar type that can live in a channel.
///
/// `to_f64`/`from_f64` move the *unscaled* value; the scaling rules live in
/// [`convert`] so that every kind pair is handled by one function.
pub trait Sample: Copy + Default + PartialEq + Send + Sync + 'static {
    /// The tag of this type.
    const KIND: SampleKind;

    /// The stored value, unscaled.
    fn to_f64(self) -> f64;

    /// Builds a sample from an unscaled value. Integer kinds round to
    /// nearest and clamp to their range.
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_int_sample {
    ($t:ty, $kind:ident) => {
        impl Sample for $t {
            const KIND: SampleKind = SampleKind::$kind;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                // `as` saturates and maps NaN to 0
                v.round() as $t
            }
        }
    };
}

impl_int_sample!(u8, U8);
impl_int_sample!(u16, U16);
impl_int_sample!(u32, U32);

impl Sample for f16 {
    const KIND: SampleKind = SampleKind::F16;

    #[inline]
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }
}

impl Sample for f32 {
    const KIND: SampleKind = SampleKind::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Sample for f64 {
    const KIND: SampleKind = SampleKind::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

/// Converts one sample between any two kinds, preserving normalized
/// intensity.
#[inline]
pub fn convert<A: Sample, B: Sample>(value: A) -> B {
    let v = value.to_f64();
    match (A::KIND.max_value(), B::KIND.max_value()) {
        (Some(src_max), Some(dst_max)) => {
            if A::KIND == B::KIND {
                B::from_f64(v)
            } else {
                B::from_f64(v * dst_max / src_max)
            }
        }
        (Some(src_max), None) => B::from_f64(v / src_max),
        (None, Some(dst_max)) => {
            let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
            B::from_f64(v * dst_max)
        }
        (None, None) => B::from_f64(v),
    }
}

/// Converts a slice of samples.
///
/// With the `rayon` feature, large slices are converted in parallel.
pub fn convert_slice<A: Sample, B: Sample>(src: &[A]) -> Vec<B> {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        if src.len() >= PARALLEL_THRESHOLD {
            return src.par_iter().map(|&v| convert::<A, B>(v)).collect();
        }
    }
    src.iter().map(|&v| convert::<A, B>(v)).collect()
}

#[cfg(feature = "rayon")]
const PARALLEL_THRESHOLD: usize = 1 << 16;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_int_to_float() {
        assert_eq!(convert::<u8, f32>(0), 0.0);
        assert_relative_eq!(convert::<u8, f32>(128), 128.0 / 255.0);
        assert_eq!(convert::<u16, f64>(65535), 1.0);
        assert_eq!(convert::<u32, f32>(u32::MAX), 1.0);
        assert_eq!(convert::<u8, f16>(255), f16::ONE);
    }

    #[test]
    fn test_float_to_int_rounds_and_clamps() {
        assert_eq!(convert::<f32, u8>(0.5), 128);
        assert_eq!(convert::<f32, u8>(1.5), 255);
        assert_eq!(convert::<f32, u16>(-0.25), 0);
        assert_eq!(convert::<f32, u16>(f32::NAN), 0);
        assert_eq!(convert::<f64, u32>(1.0), u32::MAX);
        assert_eq!(convert::<f16, u8>(f16::from_f32(1.0)), 255);
    }

    #[test]
    fn test_int_rescale_is_proportional() {
        // a plain shift would give 0xFF00
        assert_eq!(convert::<u8, u16>(255), 0xFFFF);
        assert_eq!(convert::<u8, u16>(1), 257);
        assert_eq!(convert::<u16, u8>(0x8080), 128);
        assert_eq!(convert::<u32, u8>(u32::MAX), 255);
        assert_eq!(convert::<u8, u32>(255), u32::MAX);
        assert_eq!(convert::<u16, u16>(1234), 1234);
    }

    #[test]
    fn test_float_to_float_is_unscaled() {
        assert_eq!(convert::<f32, f64>(3.5), 3.5);
        assert_eq!(convert::<f64, f32>(-2.0), -2.0);
        assert_eq!(convert::<f32, f16>(0.5), f16::from_f32(0.5));
        assert_eq!(convert::<f16, f32>(f16::from_f32(8.0)), 8.0);
    }

    #[test]
    fn test_integer_roundtrip_through_wider_kind() {
        for v in 0..=255u8 {
            let wide: u16 = convert(v);
            assert_eq!(convert::<u16, u8>(wide), v);
            let f: f32 = convert(v);
            assert_eq!(convert::<f32, u8>(f), v);
        }
    }

    #[test]
    fn test_convert_slice() {
        let out: Vec<u8> = convert_slice(&[0.0f32, 1.0, 0.2]);
        assert_eq!(out, vec![0, 255, 51]);
    }

    #[test]
    fn test_kind_properties() {
        assert!(SampleKind::U16.is_integer());
        assert!(!SampleKind::F16.is_integer());
        assert_eq!(SampleKind::F64.bytes(), 8);
        assert_eq!(SampleKind::U32.max_value(), Some(4294967295.0));
        assert_eq!(SampleKind::F32.to_string(), "f32");
    }
}
