//! Platform byte order and byte reversal.
//!
//! Legacy film formats store multi-byte fields in a file-defined order that
//! is detected from the magic number. These helpers reverse fixed-width
//! scalars explicitly, reinterpreting floats through their bit patterns.
//!
//! ```rust
//! use plate_core::endian::{reverse_bytes, as_big_endian};
//!
//! assert_eq!(reverse_bytes(0x1234u16), 0x3412);
//! assert_eq!(reverse_bytes(reverse_bytes(1.5f32)), 1.5);
//!
//! // Always the big-endian representation, whatever the host
//! let be = as_big_endian(0x0102_0304u32);
//! assert_eq!(be.to_ne_bytes(), [1, 2, 3, 4]);
//! ```

/// Returns `true` when compiled for a little-endian target.
#[inline]
pub const fn is_little_endian_platform() -> bool {
    cfg!(target_endian = "little")
}

/// Returns `true` when compiled for a big-endian target.
#[inline]
pub const fn is_big_endian_platform() -> bool {
    cfg!(target_endian = "big")
}

/// Fixed-width scalars whose byte order can be reversed.
pub trait ReverseBytes: Copy {
    /// Returns a copy with the byte order reversed.
    fn reverse_bytes(self) -> Self;
}

macro_rules! impl_reverse_int {
    ($($t:ty),*) => {
        $(
            impl ReverseBytes for $t {
                #[inline]
                fn reverse_bytes(self) -> Self {
                    self.swap_bytes()
                }
            }
        )*
    };
}

impl_reverse_int!(u16, i16, u32, i32, u64, i64);

impl ReverseBytes for f32 {
    #[inline]
    fn reverse_bytes(self) -> Self {
        f32::from_bits(self.to_bits().swap_bytes())
    }
}

impl ReverseBytes for f64 {
    #[inline]
    fn reverse_bytes(self) -> Self {
        f64::from_bits(self.to_bits().swap_bytes())
    }
}

/// Reverses the byte order of `x`.
#[inline]
pub fn reverse_bytes<T: ReverseBytes>(x: T) -> T {
    x.reverse_bytes()
}

/// Converts a native value to its little-endian in-memory representation.
///
/// A no-op on little-endian hosts.
#[inline]
pub fn as_little_endian<T: ReverseBytes>(x: T) -> T {
    if is_little_endian_platform() {
        x
    } else {
        x.reverse_bytes()
    }
}

/// Converts a native value to its big-endian in-memory representation.
///
/// A no-op on big-endian hosts.
#[inline]
pub fn as_big_endian<T: ReverseBytes>(x: T) -> T {
    if is_big_endian_platform() {
        x
    } else {
        x.reverse_bytes()
    }
}

/// Interprets a value loaded verbatim from big-endian storage.
///
/// Byte reversal is an involution, so this is [`as_big_endian`] under a
/// name that reads correctly at decode sites.
#[inline]
pub fn from_big_endian<T: ReverseBytes>(x: T) -> T {
    as_big_endian(x)
}

/// Interprets a value loaded verbatim from little-endian storage.
#[inline]
pub fn from_little_endian<T: ReverseBytes>(x: T) -> T {
    as_little_endian(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_flags_are_exclusive() {
        assert_ne!(is_little_endian_platform(), is_big_endian_platform());
    }

    #[test]
    fn test_reverse_involution() {
        for x in [0u32, 1, 0x802a_5fd7, u32::MAX, 0x5344_5058] {
            assert_eq!(reverse_bytes(reverse_bytes(x)), x);
        }
        for x in [0i16, -1, i16::MIN, 0x1234] {
            assert_eq!(reverse_bytes(reverse_bytes(x)), x);
        }
        for x in [0u64, 0x0102_0304_0506_0708, u64::MAX - 7] {
            assert_eq!(reverse_bytes(reverse_bytes(x)), x);
        }
        for x in [0.0f64, -2.5, 1e300, f64::MIN_POSITIVE] {
            assert_eq!(reverse_bytes(reverse_bytes(x)), x);
        }
        let nan = f32::NAN.reverse_bytes().reverse_bytes();
        assert!(nan.is_nan());
    }

    #[test]
    fn test_magic_swap() {
        assert_eq!(reverse_bytes(0x5344_5058u32), 0x5850_4453);
        assert_eq!(reverse_bytes(0x802a_5fd7u32), 0xd75f_2a80);
    }

    #[test]
    fn test_as_endian_layout() {
        let v = 0x0a0b_0c0du32;
        assert_eq!(as_big_endian(v).to_ne_bytes(), v.to_be_bytes());
        assert_eq!(as_little_endian(v).to_ne_bytes(), v.to_le_bytes());
        assert_eq!(from_big_endian(as_big_endian(v)), v);
        assert_eq!(from_little_endian(as_little_endian(v)), v);
    }

    #[test]
    fn test_float_reverse_uses_bits() {
        let x = 1.0f32;
        assert_eq!(x.reverse_bytes().to_bits(), 0x0000_803f);
    }
}
