//! Tagged per-channel sample storage.
//!
//! A [`ChannelData`] owns a dense, row-major sequence of samples of one
//! [`SampleKind`]. Different channels of one image may use different kinds.

use half::f16;

use crate::sample::{convert, convert_slice, Sample, SampleKind};

/// Samples of one channel, tagged with their numeric kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelData {
    /// 8-bit unsigned samples
    U8(Vec<u8>),
    /// 16-bit unsigned samples
    U16(Vec<u16>),
    /// 32-bit unsigned samples
    U32(Vec<u32>),
    /// Half float samples
    F16(Vec<f16>),
    /// 32-bit float samples
    F32(Vec<f32>),
    /// 64-bit float samples
    F64(Vec<f64>),
}

/// Expands `$body` once per variant with `$v` bound to the inner vector.
macro_rules! dispatch {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            ChannelData::U8($v) => $body,
            ChannelData::U16($v) => $body,
            ChannelData::U32($v) => $body,
            ChannelData::F16($v) => $body,
            ChannelData::F32($v) => $body,
            ChannelData::F64($v) => $body,
        }
    };
}

impl ChannelData {
    /// Allocates `len` zero samples of `kind`.
    pub fn zeros(kind: SampleKind, len: usize) -> Self {
        match kind {
            SampleKind::U8 => Self::U8(vec![0; len]),
            SampleKind::U16 => Self::U16(vec![0; len]),
            SampleKind::U32 => Self::U32(vec![0; len]),
            SampleKind::F16 => Self::F16(vec![f16::ZERO; len]),
            SampleKind::F32 => Self::F32(vec![0.0; len]),
            SampleKind::F64 => Self::F64(vec![0.0; len]),
        }
    }

    /// Numeric kind of the stored samples.
    pub fn kind(&self) -> SampleKind {
        match self {
            Self::U8(_) => SampleKind::U8,
            Self::U16(_) => SampleKind::U16,
            Self::U32(_) => SampleKind::U32,
            Self::F16(_) => SampleKind::F16,
            Self::F32(_) => SampleKind::F32,
            Self::F64(_) => SampleKind::F64,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    /// Returns `true` if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts all samples to `kind` with scaled conversion.
    ///
    /// Returns a clone when the kind already matches.
    pub fn convert(&self, kind: SampleKind) -> ChannelData {
        match kind {
            SampleKind::U8 => Self::U8(self.to_vec()),
            SampleKind::U16 => Self::U16(self.to_vec()),
            SampleKind::U32 => Self::U32(self.to_vec()),
            SampleKind::F16 => Self::F16(self.to_vec()),
            SampleKind::F32 => Self::F32(self.to_vec()),
            SampleKind::F64 => Self::F64(self.to_vec()),
        }
    }

    /// Copies all samples into a vector of `T` with scaled conversion.
    pub fn to_vec<T: Sample>(&self) -> Vec<T> {
        dispatch!(self, v => convert_slice(v))
    }

    /// Normalized `f32` copy of all samples.
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            Self::F32(v) => v.clone(),
            other => other.to_vec(),
        }
    }

    /// Sample `index` converted to `T`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn get<T: Sample>(&self, index: usize) -> T {
        dispatch!(self, v => convert(v[index]))
    }

    /// Normalized `f32` value of sample `index`.
    pub fn get_f32(&self, index: usize) -> f32 {
        self.get::<f32>(index)
    }

    /// Borrows `8-bit` storage.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            Self::U8(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows 16-bit storage.
    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            Self::U16(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows 32-bit integer storage.
    pub fn as_u32(&self) -> Option<&[u32]> {
        match self {
            Self::U32(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows half float storage.
    pub fn as_f16(&self) -> Option<&[f16]> {
        match self {
            Self::F16(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows float storage.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Self::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows double storage.
    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            Self::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Copies the samples of `src` selected by `src_index` into the
    /// positions of `self` selected by `dst_index`, converting kinds.
    ///
    /// Both index lists must have the same length.
    pub fn scatter_from(&mut self, src: &ChannelData, src_index: &[usize], dst_index: &[usize]) {
        dispatch!(self, dst => {
            for (&s, &d) in src_index.iter().zip(dst_index) {
                dst[d] = src.get(s);
            }
        })
    }

    /// Copies rows of a `src_width`-wide buffer into this buffer.
    ///
    /// Rows `src_rows` start at column `src_x`; `span` samples of each row
    /// land in consecutive rows of `self` starting at `dst_offset`, with
    /// `dst_stride` samples between rows.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_span(
        &mut self,
        src: &ChannelData,
        src_width: usize,
        src_x: usize,
        src_rows: std::ops::Range<usize>,
        span: usize,
        dst_offset: usize,
        dst_stride: usize,
    ) {
        dispatch!(self, dst => {
            for (i, row) in src_rows.enumerate() {
                let s = row * src_width + src_x;
                let d = dst_offset + i * dst_stride;
                for k in 0..span {
                    dst[d + k] = src.get(s + k);
                }
            }
        })
    }
}

macro_rules! impl_from_vec {
    ($t:ty, $variant:ident) => {
        impl From<Vec<$t>> for ChannelData {
            fn from(v: Vec<$t>) -> Self {
                Self::$variant(v)
            }
        }
    };
}

impl_from_vec!(u8, U8);
impl_from_vec!(u16, U16);
impl_from_vec!(u32, U32);
impl_from_vec!(f16, F16);
impl_from_vec!(f32, F32);
impl_from_vec!(f64, F64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_kind() {
        let c = ChannelData::zeros(SampleKind::F16, 6);
        assert_eq!(c.kind(), SampleKind::F16);
        assert_eq!(c.len(), 6);
        assert!(ChannelData::zeros(SampleKind::U8, 0).is_empty());
    }

    #[test]
    fn test_convert_rescales() {
        let c = ChannelData::from(vec![0u8, 255, 51]);
        assert_eq!(c.convert(SampleKind::U16), ChannelData::U16(vec![0, 65535, 13107]));
        assert_eq!(c.to_f32(), vec![0.0, 1.0, 0.2]);
        assert_eq!(c.convert(SampleKind::U8), c);
    }

    #[test]
    fn test_get_converts() {
        let c = ChannelData::from(vec![0.5f32, 2.0]);
        assert_eq!(c.get::<u8>(0), 128);
        assert_eq!(c.get::<u8>(1), 255);
        assert_eq!(c.get_f32(1), 2.0);
    }

    #[test]
    fn test_typed_views() {
        let c = ChannelData::from(vec![1u16, 2]);
        assert_eq!(c.as_u16(), Some(&[1u16, 2][..]));
        assert!(c.as_u8().is_none());
        assert!(c.as_f32().is_none());
    }

    #[test]
    fn test_copy_span() {
        // 4x2 source, copy columns 1..3 of both rows
        let src = ChannelData::from(vec![0u8, 1, 2, 3, 4, 5, 6, 7]);
        let mut dst = ChannelData::zeros(SampleKind::U8, 4);
        dst.copy_span(&src, 4, 1, 0..2, 2, 0, 2);
        assert_eq!(dst, ChannelData::U8(vec![1, 2, 5, 6]));
    }
}
