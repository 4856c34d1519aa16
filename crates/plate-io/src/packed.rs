//! Shared plumbing for the 10-bit packed log formats (DPX and Cineon).
//!
//! Both store one 32-bit word per pixel holding three 10-bit codes, in a
//! byte order given by the file magic. [`PackedLayout`] describes where the
//! words live; [`PackedLayout::read_words`] fetches a window of them in
//! top-to-bottom, left-to-right order and corrects their byte order.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use plate_core::endian::{as_big_endian, from_big_endian, from_little_endian};
use plate_core::logcodec::{pack, unpack};
use plate_core::{LogCodec, Rect};

use crate::{IoError, IoResult};

/// Bytes per packed pixel.
pub(crate) const WORD_BYTES: usize = 4;

/// Location and order of packed pixel words in a file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PackedLayout {
    /// Byte offset of the first word.
    pub offset: u64,
    pub width: u32,
    pub height: u32,
    /// Bytes from one stored row to the next.
    pub row_stride: u64,
    pub big_endian: bool,
    /// Stored rows run right to left.
    pub flip_x: bool,
    /// Stored rows run bottom to top.
    pub flip_y: bool,
}

impl PackedLayout {
    /// Unpadded layout, left to right, top to bottom.
    pub fn new(offset: u64, width: u32, height: u32, big_endian: bool) -> Self {
        Self {
            offset,
            width,
            height,
            row_stride: width as u64 * WORD_BYTES as u64,
            big_endian,
            flip_x: false,
            flip_y: false,
        }
    }

    /// Byte size of the pixel block.
    pub fn data_size(&self) -> u64 {
        self.row_stride * self.height as u64
    }

    /// Reads the words covering `window`, which must lie inside
    /// `(0, 0)-(width-1, height-1)`.
    ///
    /// Each row is fetched as one contiguous span. For mirrored rows the
    /// span is taken from the other end and reversed.
    pub fn read_words(&self, file: &mut File, window: Rect) -> IoResult<Vec<u32>> {
        let span = window.width() as usize;
        let mut words = Vec::with_capacity(window.area());
        let mut row = vec![0u8; span * WORD_BYTES];

        let first_col = if self.flip_x {
            self.width as i32 - 1 - window.max_x
        } else {
            window.min_x
        } as u64;

        for y in window.min_y..=window.max_y {
            let file_row = if self.flip_y {
                self.height as i32 - 1 - y
            } else {
                y
            } as u64;
            let pos = self.offset + file_row * self.row_stride + first_col * WORD_BYTES as u64;
            file.seek(SeekFrom::Start(pos))?;
            file.read_exact(&mut row)?;

            let start = words.len();
            words.extend(row.chunks_exact(WORD_BYTES).map(|b| {
                let word = u32::from_ne_bytes([b[0], b[1], b[2], b[3]]);
                if self.big_endian {
                    from_big_endian(word)
                } else {
                    from_little_endian(word)
                }
            }));
            if self.flip_x {
                words[start..].reverse();
            }
        }
        Ok(words)
    }
}

/// Extracts channel `slot` of every word.
pub(crate) fn unpack_slot(words: &[u32], slot: usize) -> Vec<u16> {
    words.iter().map(|&w| unpack(w, slot)).collect()
}

/// ORs `codes` into channel `slot` of `words`.
pub(crate) fn pack_slot(words: &mut [u32], slot: usize, codes: &[u16]) {
    for (w, &code) in words.iter_mut().zip(codes) {
        *w = pack(*w, slot, code);
    }
}

/// Log-encodes linear samples.
pub(crate) fn encode_codes(codec: &LogCodec, linear: &[f32]) -> Vec<u16> {
    linear.iter().map(|&v| codec.encode(v)).collect()
}

/// Writes words in big-endian order.
pub(crate) fn write_words_be<W: Write>(out: &mut W, words: &[u32]) -> IoResult<()> {
    let mut bytes = Vec::with_capacity(words.len() * WORD_BYTES);
    for &word in words {
        bytes.extend_from_slice(&as_big_endian(word).to_ne_bytes());
    }
    out.write_all(&bytes)?;
    Ok(())
}

/// Total size of a file holding `width x height` words after `data_offset`
/// header bytes, checked against the 32-bit file size field.
pub(crate) fn file_size(
    format: &'static str,
    data_offset: u32,
    width: u32,
    height: u32,
    path: &Path,
) -> IoResult<u32> {
    (width as u64)
        .checked_mul(height as u64)
        .and_then(|n| n.checked_mul(WORD_BYTES as u64))
        .and_then(|n| n.checked_add(data_offset as u64))
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            IoError::unsupported(format, "image size", format!("{}x{}", width, height), path)
        })
}

// === Fixed-width text fields ===

/// Decodes a NUL-padded ASCII field.
pub(crate) fn text_field(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

/// Copies `text` into a fixed-width field, truncated to leave a final NUL.
pub(crate) fn put_text(field: &mut [u8], text: &str) {
    let n = text.len().min(field.len().saturating_sub(1));
    field[..n].copy_from_slice(&text.as_bytes()[..n]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_fields() {
        let mut field = [0u8; 8];
        put_text(&mut field, "plate-io-long");
        assert_eq!(&field[..7], b"plate-i");
        assert_eq!(field[7], 0);
        assert_eq!(text_field(&field), "plate-i");
        assert_eq!(text_field(b"V2.0\0\0\0\0"), "V2.0");
    }

    #[test]
    fn test_file_size_limit() {
        let path = Path::new("plate_size.dpx");
        assert_eq!(file_size("DPX", 2048, 4, 3, path).unwrap(), 2048 + 48);
        assert_eq!(file_size("DPX", 2048, 65535, 16383, path).unwrap(), 2048 + 65535 * 16383 * 4);

        // 2^30 pixels no longer fit the 32-bit size field.
        let err = file_size("DPX", 2048, 32768, 32768, path).unwrap_err();
        assert!(
            matches!(err, IoError::Unsupported { field: "image size", .. }),
            "{:?}",
            err
        );
        assert!(file_size("Cineon", 1024, u32::MAX, u32::MAX, path).is_err());
    }

    #[test]
    fn test_pack_slots() {
        let mut words = vec![0u32; 2];
        pack_slot(&mut words, 0, &[1023, 1]);
        pack_slot(&mut words, 2, &[5, 6]);
        assert_eq!(unpack_slot(&words, 0), vec![1023, 1]);
        assert_eq!(unpack_slot(&words, 1), vec![0, 0]);
        assert_eq!(unpack_slot(&words, 2), vec![5, 6]);
    }

    #[test]
    fn test_read_words_mirrored() {
        let path = std::env::temp_dir().join("plate_packed_mirror.bin");
        // 3x2 words, little-endian, values = file index
        let mut bytes = vec![0u8; 4];
        for i in 0..6u32 {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        std::fs::write(&path, &bytes).unwrap();

        let mut layout = PackedLayout::new(4, 3, 2, false);
        let mut file = File::open(&path).unwrap();
        let all = layout.read_words(&mut file, Rect::from_size(3, 2)).unwrap();
        assert_eq!(all, vec![0, 1, 2, 3, 4, 5]);

        layout.flip_x = true;
        layout.flip_y = true;
        let span = layout.read_words(&mut file, Rect::new(0, 0, 1, 0)).unwrap();
        assert_eq!(span, vec![5, 4]);

        let _ = std::fs::remove_file(&path);
    }
}
