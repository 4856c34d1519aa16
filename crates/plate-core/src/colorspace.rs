//! Named colour presets for non-raw channel reads and writes.
//!
//! Files store colour in an *encoded* space; images in memory are linear.
//! A preset names the encoding and converts single samples both ways.
//!
//! | Preset | Decode (file to linear) |
//! |--------|-------------------------|
//! | `linear` | identity |
//! | `sRGB` | IEC 61966-2-1 piecewise curve |
//! | `rec709` | BT.709 camera curve, inverted |
//!
//! Alpha and depth channels are never converted; see [`is_color_channel`].

/// A named colour encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// Samples are already linear.
    #[default]
    Linear,
    /// sRGB transfer curve.
    Srgb,
    /// Rec.709 transfer curve.
    Rec709,
}

impl ColorSpace {
    /// Parses a preset name, case-insensitively.
    ///
    /// ```rust
    /// use plate_core::ColorSpace;
    ///
    /// assert_eq!(ColorSpace::from_name("sRGB"), Some(ColorSpace::Srgb));
    /// assert_eq!(ColorSpace::from_name("acescg"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "linear" | "lin" => Some(Self::Linear),
            "srgb" => Some(Self::Srgb),
            "rec709" | "rec.709" | "bt709" => Some(Self::Rec709),
            _ => None,
        }
    }

    /// Canonical preset name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Srgb => "sRGB",
            Self::Rec709 => "rec709",
        }
    }

    /// Converts an encoded sample to linear light.
    #[inline]
    pub fn to_linear(self, v: f32) -> f32 {
        match self {
            Self::Linear => v,
            Self::Srgb => {
                if v <= 0.04045 {
                    v / 12.92
                } else {
                    ((v + 0.055) / 1.055).powf(2.4)
                }
            }
            Self::Rec709 => {
                if v < 0.081 {
                    v / 4.5
                } else {
                    ((v + 0.099) / 1.099).powf(1.0 / 0.45)
                }
            }
        }
    }

    /// Converts a linear sample to this encoding.
    #[inline]
    pub fn from_linear(self, l: f32) -> f32 {
        match self {
            Self::Linear => l,
            Self::Srgb => {
                if l <= 0.003_130_8 {
                    l * 12.92
                } else {
                    1.055 * l.powf(1.0 / 2.4) - 0.055
                }
            }
            Self::Rec709 => {
                if l < 0.018 {
                    l * 4.5
                } else {
                    1.099 * l.powf(0.45) - 0.099
                }
            }
        }
    }

    /// Returns `true` for the identity preset.
    #[inline]
    pub fn is_linear(self) -> bool {
        self == Self::Linear
    }
}

/// Returns `true` if colour presets apply to the named channel.
///
/// Alpha (`A`) and depth (`Z`) hold non-colour data.
pub fn is_color_channel(name: &str) -> bool {
    !matches!(name, "A" | "Z")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_srgb_roundtrip() {
        for i in 0..=20 {
            let v = i as f32 / 20.0;
            let back = ColorSpace::Srgb.from_linear(ColorSpace::Srgb.to_linear(v));
            assert_abs_diff_eq!(back, v, epsilon = 1e-5);
        }
        assert_abs_diff_eq!(ColorSpace::Srgb.to_linear(0.5), 0.214, epsilon = 1e-3);
    }

    #[test]
    fn test_rec709_roundtrip() {
        for i in 0..=20 {
            let l = i as f32 / 20.0;
            let back = ColorSpace::Rec709.to_linear(ColorSpace::Rec709.from_linear(l));
            assert_abs_diff_eq!(back, l, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(ColorSpace::from_name("LINEAR"), Some(ColorSpace::Linear));
        assert_eq!(ColorSpace::from_name(ColorSpace::Rec709.name()), Some(ColorSpace::Rec709));
        assert!(is_color_channel("R"));
        assert!(!is_color_channel("A"));
        assert!(!is_color_channel("Z"));
    }
}
