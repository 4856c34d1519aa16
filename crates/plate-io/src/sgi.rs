//! SGI image format support (`.sgi`, `.rgb`, `.rgba`, `.bw`).
//!
//! # Layout
//!
//! A 512-byte big-endian header followed by channel planes. Each plane
//! stores its scanlines bottom-up.
//!
//! | Offset | Type | Field |
//! |--------|------|-------|
//! | 0 | u16 | magic (474) |
//! | 2 | u8 | storage (0 verbatim, 1 RLE) |
//! | 3 | u8 | bytes per channel (1 or 2) |
//! | 4 | u16 | dimension (1, 2 or 3) |
//! | 6 | u16 | x size |
//! | 8 | u16 | y size |
//! | 10 | u16 | z size (channels) |
//! | 12 | u32 | min pixel value |
//! | 16 | u32 | max pixel value |
//! | 24 | char[80] | image name |
//! | 104 | u32 | colour map (only 0 is supported) |
//!
//! RLE files follow the header with two tables of `ysize * zsize` u32
//! entries: file offsets and byte lengths of each encoded scanline, indexed
//! `channel * ysize + row`. Scanlines decode one at a time into a
//! full-width scratch buffer. Files with the byte-swapped magic are read
//! little-endian.
//!
//! # Channels
//!
//! | Dimension | Z size | Channels |
//! |-----------|--------|----------|
//! | 1, 2 | any | `Y` |
//! | 3 | 1 | `Y` |
//! | 3 | 2 | `Y`, `A` |
//! | 3 | 3 | `R`, `G`, `B` |
//! | 3 | 4+ | `R`, `G`, `B`, `A`, `Data1`.. |

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use plate_core::{ChannelData, ColorSpace, Image, Rect, SampleKind};
use tracing::{debug, warn};

use crate::attrs::Attrs;
use crate::options::WriteOptions;
use crate::traits::HeaderCache;
use crate::writer::WritePlan;
use crate::{ImageReader, ImageWriter, IoError, IoResult};

// === Constants ===

const MAGIC: u16 = 474;
const HEADER_SIZE: usize = 512;
const NAME_LEN: usize = 80;

/// Longest run a single RLE packet can describe.
const MAX_RUN: usize = 127;

const FORMAT: &str = "SGI";

mod offset {
    pub const MAGIC: usize = 0;
    pub const STORAGE: usize = 2;
    pub const BPC: usize = 3;
    pub const DIMENSION: usize = 4;
    pub const XSIZE: usize = 6;
    pub const YSIZE: usize = 8;
    pub const ZSIZE: usize = 10;
    pub const PIXMIN: usize = 12;
    pub const PIXMAX: usize = 16;
    pub const NAME: usize = 24;
    pub const COLORMAP: usize = 104;
}

// === Header ===

#[derive(Debug, Clone)]
struct SgiHeader {
    big_endian: bool,
    rle: bool,
    /// Bytes per channel sample.
    bpc: u8,
    dimension: u16,
    width: u32,
    height: u32,
    depth: u32,
    pix_min: u32,
    pix_max: u32,
    name: String,
    /// Plane names in storage order.
    channels: Vec<String>,
    /// RLE scanline offsets, indexed `channel * height + stored_row`.
    offsets: Vec<u32>,
    lengths: Vec<u32>,
    file_len: u64,
}

impl SgiHeader {
    fn read(file: &mut File, path: &Path) -> IoResult<Self> {
        let file_len = file.metadata()?.len();
        let mut buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut buf)?;

        match BigEndian::read_u16(&buf[offset::MAGIC..]) {
            MAGIC => Self::parse::<BigEndian>(&buf, true, file, file_len, path),
            m if m == MAGIC.swap_bytes() => {
                Self::parse::<LittleEndian>(&buf, false, file, file_len, path)
            }
            m => Err(IoError::DecodeError(format!("invalid SGI magic: {}", m))),
        }
    }

    fn parse<B: ByteOrder>(
        buf: &[u8],
        big_endian: bool,
        file: &mut File,
        file_len: u64,
        path: &Path,
    ) -> IoResult<Self> {
        let storage = buf[offset::STORAGE];
        let bpc = buf[offset::BPC];
        let dimension = B::read_u16(&buf[offset::DIMENSION..]);
        let width = B::read_u16(&buf[offset::XSIZE..]) as u32;
        let ysize = B::read_u16(&buf[offset::YSIZE..]) as u32;
        let zsize = B::read_u16(&buf[offset::ZSIZE..]) as u32;
        let colormap = B::read_u32(&buf[offset::COLORMAP..]);

        if storage > 1 {
            return Err(IoError::unsupported(FORMAT, "storage format", storage, path));
        }
        if bpc != 1 && bpc != 2 {
            return Err(IoError::unsupported(FORMAT, "bytes per channel", bpc, path));
        }
        if !(1..=3).contains(&dimension) {
            return Err(IoError::unsupported(FORMAT, "dimension", dimension, path));
        }
        if colormap != 0 {
            return Err(IoError::unsupported(FORMAT, "colour map", colormap, path));
        }

        let (height, depth) = match dimension {
            1 => (1, 1),
            2 => (ysize, 1),
            _ => (ysize, zsize),
        };
        if width == 0 || height == 0 || depth == 0 {
            return Err(IoError::InvalidFile(format!(
                "{}: empty image {}x{}x{}",
                path.display(),
                width,
                height,
                depth
            )));
        }

        let channels = match depth {
            1 => vec!["Y".to_string()],
            2 => vec!["Y".to_string(), "A".to_string()],
            n => ["R", "G", "B", "A"]
                .iter()
                .map(|s| s.to_string())
                .chain((5..=n).map(|i| format!("Data{}", i - 4)))
                .take(n as usize)
                .collect(),
        };

        let (offsets, lengths) = if storage == 1 {
            let entries = (height * depth) as usize;
            let tables_end = HEADER_SIZE as u64 + entries as u64 * 8;
            if tables_end > file_len {
                return Err(IoError::InvalidFile(format!(
                    "{}: RLE tables for {} scanlines need {} bytes, file has {}",
                    path.display(),
                    entries,
                    tables_end,
                    file_len
                )));
            }
            let mut table = vec![0u8; entries * 8];
            file.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
            file.read_exact(&mut table)?;
            let (off_bytes, len_bytes) = table.split_at(entries * 4);
            let mut offsets = vec![0u32; entries];
            let mut lengths = vec![0u32; entries];
            B::read_u32_into(off_bytes, &mut offsets);
            B::read_u32_into(len_bytes, &mut lengths);
            (offsets, lengths)
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(Self {
            big_endian,
            rle: storage == 1,
            bpc,
            dimension,
            width,
            height,
            depth,
            pix_min: B::read_u32(&buf[offset::PIXMIN..]),
            pix_max: B::read_u32(&buf[offset::PIXMAX..]),
            name: crate::packed::text_field(&buf[offset::NAME..offset::NAME + NAME_LEN]),
            channels,
            offsets,
            lengths,
            file_len,
        })
    }

    fn data_window(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    fn kind(&self) -> SampleKind {
        if self.bpc == 1 {
            SampleKind::U8
        } else {
            SampleKind::U16
        }
    }

    /// First byte after the RLE tables.
    fn tables_end(&self) -> u64 {
        HEADER_SIZE as u64 + self.offsets.len() as u64 * 8
    }

    /// Returns `true` if every RLE scanline lies between the tables and
    /// the end of the file.
    fn rows_in_bounds(&self) -> bool {
        let end = self.tables_end();
        self.offsets
            .iter()
            .zip(&self.lengths)
            .all(|(&o, &l)| o as u64 >= end && o as u64 + l as u64 <= self.file_len)
    }
}

#[derive(Debug)]
struct SgiFile {
    header: SgiHeader,
    file: File,
}

impl SgiFile {
    fn open(path: &Path) -> IoResult<Self> {
        let mut file = File::open(path)?;
        let header = SgiHeader::read(&mut file, path)?;
        debug!(
            path = %path.display(),
            width = header.width,
            height = header.height,
            channels = ?header.channels,
            rle = header.rle,
            bpc = header.bpc,
            "SGI header"
        );
        Ok(Self { header, file })
    }

    /// Widens stored bytes to samples.
    fn samples(&self, bytes: &[u8]) -> Vec<u16> {
        if self.header.bpc == 1 {
            bytes.iter().map(|&b| b as u16).collect()
        } else {
            let mut out = vec![0u16; bytes.len() / 2];
            if self.header.big_endian {
                BigEndian::read_u16_into(&bytes[..out.len() * 2], &mut out);
            } else {
                LittleEndian::read_u16_into(&bytes[..out.len() * 2], &mut out);
            }
            out
        }
    }

    /// Reads samples `[x0, x0 + span)` of one stored scanline.
    fn read_row(
        &mut self,
        plane: usize,
        stored_row: u32,
        x0: usize,
        span: usize,
        path: &Path,
    ) -> IoResult<Vec<u16>> {
        let h = &self.header;
        let bpc = h.bpc as usize;

        if !h.rle {
            let row_index = (plane as u64 * h.height as u64 + stored_row as u64) * h.width as u64;
            let pos = HEADER_SIZE as u64 + (row_index + x0 as u64) * bpc as u64;
            let mut bytes = vec![0u8; span * bpc];
            self.file.seek(SeekFrom::Start(pos))?;
            self.file.read_exact(&mut bytes)?;
            return Ok(self.samples(&bytes));
        }

        let index = plane * h.height as usize + stored_row as usize;
        let (start, len) = (h.offsets[index] as u64, h.lengths[index] as u64);
        if start < h.tables_end() || start + len > h.file_len {
            return Err(IoError::InvalidFile(format!(
                "{}: invalid RLE row offset {} (length {}) for row {} of channel {}",
                path.display(),
                start,
                len,
                stored_row,
                h.channels[plane]
            )));
        }
        let mut bytes = vec![0u8; len as usize];
        self.file.seek(SeekFrom::Start(start))?;
        self.file.read_exact(&mut bytes)?;

        let mut scanline = vec![0u16; h.width as usize];
        decode_rle_row(&self.samples(&bytes), &mut scanline).map_err(|reason| {
            IoError::InvalidFile(format!(
                "{}: invalid RLE data in row {} of channel {}: {}",
                path.display(),
                stored_row,
                self.header.channels[plane],
                reason
            ))
        })?;
        Ok(scanline[x0..x0 + span].to_vec())
    }
}

// === RLE ===

/// Expands one RLE scanline into `dst`, which must be filled exactly.
fn decode_rle_row(src: &[u16], dst: &mut [u16]) -> Result<(), &'static str> {
    let mut s = 0;
    let mut d = 0;
    loop {
        let Some(&packet) = src.get(s) else {
            return Err("missing end marker");
        };
        s += 1;
        let count = (packet & 0x7f) as usize;
        if count == 0 {
            break;
        }
        if d + count > dst.len() {
            return Err("run overflows scanline");
        }
        if packet & 0x80 != 0 {
            let Some(literal) = src.get(s..s + count) else {
                return Err("literal run overflows data");
            };
            dst[d..d + count].copy_from_slice(literal);
            s += count;
        } else {
            let Some(&value) = src.get(s) else {
                return Err("repeat run overflows data");
            };
            dst[d..d + count].fill(value);
            s += 1;
        }
        d += count;
    }
    if d != dst.len() {
        return Err("scanline too short");
    }
    Ok(())
}

/// Appends the RLE encoding of `row` to `out`, ending with a zero packet.
fn encode_rle_row(row: &[u16], out: &mut Vec<u16>) {
    let n = row.len();
    let mut i = 0;
    while i < n {
        let mut run = 1;
        while i + run < n && run < MAX_RUN && row[i + run] == row[i] {
            run += 1;
        }
        if run >= 2 {
            out.push(run as u16);
            out.push(row[i]);
            i += run;
            continue;
        }

        let start = i;
        while i < n && i - start < MAX_RUN && (i + 1 >= n || row[i] != row[i + 1]) {
            i += 1;
        }
        if i == start {
            // A run begins right here; the next pass emits it.
            continue;
        }
        out.push(0x80 | (i - start) as u16);
        out.extend_from_slice(&row[start..i]);
    }
    out.push(0);
}

/// Builds the offset and length tables for encoded scanlines of
/// `row_bytes` bytes each.
///
/// Offsets are 32-bit, so the whole file must stay below 4 GiB.
fn rle_tables(row_bytes: &[u64]) -> IoResult<(Vec<u32>, Vec<u32>)> {
    let too_large = |size: u64| {
        IoError::EncodeError(format!(
            "SGI RLE data ends at byte {}, past the 32-bit offset limit",
            size
        ))
    };

    let mut pos = HEADER_SIZE as u64 + row_bytes.len() as u64 * 8;
    let mut offsets = Vec::with_capacity(row_bytes.len());
    let mut lengths = Vec::with_capacity(row_bytes.len());
    for &len in row_bytes {
        offsets.push(u32::try_from(pos).map_err(|_| too_large(pos))?);
        lengths.push(u32::try_from(len).map_err(|_| too_large(pos + len))?);
        pos += len;
    }
    if pos > u32::MAX as u64 + 1 {
        return Err(too_large(pos));
    }
    Ok((offsets, lengths))
}

// === SgiReader ===

/// SGI format reader.
///
/// Data and display windows are `(0, 0)-(xsize-1, ysize-1)`. Raw reads
/// return `U8` or `U16` samples.
#[derive(Debug)]
pub struct SgiReader {
    cache: HeaderCache<SgiFile>,
}

impl SgiReader {
    /// Creates a reader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            cache: HeaderCache::new(path.into()),
        }
    }

    fn file(&mut self) -> IoResult<&mut SgiFile> {
        self.open(true)?;
        self.cache.get_mut()
    }
}

impl ImageReader for SgiReader {
    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn path(&self) -> &Path {
        self.cache.path()
    }

    fn set_path(&mut self, path: PathBuf) {
        self.cache.set_path(path);
    }

    fn can_read(path: &Path) -> bool {
        let mut magic = [0u8; 2];
        let read = File::open(path).and_then(|mut f| f.read_exact(&mut magic));
        let magic = u16::from_be_bytes(magic);
        read.is_ok() && (magic == MAGIC || magic == MAGIC.swap_bytes())
    }

    fn open(&mut self, throw_on_failure: bool) -> IoResult<bool> {
        self.cache.open(throw_on_failure, SgiFile::open)
    }

    fn channel_names(&mut self) -> IoResult<Vec<String>> {
        Ok(self.file()?.header.channels.clone())
    }

    fn data_window(&mut self) -> IoResult<Rect> {
        Ok(self.file()?.header.data_window())
    }

    fn display_window(&mut self) -> IoResult<Rect> {
        self.data_window()
    }

    /// Checks the RLE tables, then decodes the last stored scanline of
    /// every channel.
    fn is_complete(&mut self) -> bool {
        let path = self.path().to_path_buf();
        let Ok(file) = self.file() else {
            return false;
        };
        if file.header.rle && !file.header.rows_in_bounds() {
            return false;
        }
        let (depth, height, width) = (
            file.header.depth as usize,
            file.header.height,
            file.header.width as usize,
        );
        (0..depth).all(|plane| file.read_row(plane, height - 1, 0, width, &path).is_ok())
    }

    fn header(&mut self) -> IoResult<Attrs> {
        let h = &self.file()?.header;
        let mut attrs = Attrs::new();
        attrs.set("dataWindow", h.data_window());
        attrs.set("displayWindow", h.data_window());
        attrs.set("Format", FORMAT);
        attrs.set_text("ImageName", &h.name);
        attrs.set("Compression", if h.rle { "rle" } else { "none" });
        attrs.set("BytesPerChannel", h.bpc as u32);
        attrs.set("Dimension", h.dimension as u32);
        attrs.set("PixMin", h.pix_min);
        attrs.set("PixMax", h.pix_max);
        attrs.set("Endian", if h.big_endian { "BE" } else { "LE" });
        Ok(attrs)
    }

    fn native_kind(&mut self, _name: &str) -> IoResult<SampleKind> {
        Ok(self.file()?.header.kind())
    }

    fn default_color_space(&mut self) -> IoResult<ColorSpace> {
        Ok(if self.file()?.header.bpc == 1 {
            ColorSpace::Srgb
        } else {
            ColorSpace::Linear
        })
    }

    fn read_native(&mut self, name: &str, window: Rect) -> IoResult<ChannelData> {
        let path = self.path().to_path_buf();
        let file = self.file()?;
        let plane = file
            .header
            .channels
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| IoError::MissingChannel(name.to_string()))?;

        let height = file.header.height as i32;
        let span = window.width() as usize;
        let mut samples = Vec::with_capacity(window.area());
        for y in window.min_y..=window.max_y {
            let stored_row = (height - 1 - y) as u32;
            let row = file.read_row(plane, stored_row, window.min_x as usize, span, &path)?;
            samples.extend_from_slice(&row);
        }

        Ok(match file.header.kind() {
            SampleKind::U8 => ChannelData::U8(samples.into_iter().map(|v| v as u8).collect()),
            _ => ChannelData::U16(samples),
        })
    }
}

// === Writer Options ===

/// Options for writing SGI files.
#[derive(Debug, Clone)]
pub struct SgiWriterOptions {
    /// 8 or 16 bits per channel. Default: 8.
    pub bit_depth: u8,
    /// Run-length encode scanlines. Default: `true`.
    pub rle: bool,
}

impl Default for SgiWriterOptions {
    fn default() -> Self {
        Self {
            bit_depth: 8,
            rle: true,
        }
    }
}

// === SgiWriter ===

/// SGI format writer.
///
/// Writes `R`, `G`, `B` (missing ones as zero) plus `A` when present, or
/// `Y` plus optional `A` when the image has no colour channels.
#[derive(Debug, Clone)]
pub struct SgiWriter {
    path: PathBuf,
    options: SgiWriterOptions,
}

impl SgiWriter {
    /// Creates a writer for `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, SgiWriterOptions::default())
    }

    /// Creates a writer with explicit options.
    pub fn with_options(path: impl Into<PathBuf>, options: SgiWriterOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    fn header_bytes(&self, width: u32, height: u32, planes: usize, bpc: u8, rle: bool) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_SIZE];
        BigEndian::write_u16(&mut h[offset::MAGIC..], MAGIC);
        h[offset::STORAGE] = rle as u8;
        h[offset::BPC] = bpc;
        BigEndian::write_u16(&mut h[offset::DIMENSION..], if planes == 1 { 2 } else { 3 });
        BigEndian::write_u16(&mut h[offset::XSIZE..], width as u16);
        BigEndian::write_u16(&mut h[offset::YSIZE..], height as u16);
        BigEndian::write_u16(&mut h[offset::ZSIZE..], planes as u16);
        BigEndian::write_u32(&mut h[offset::PIXMIN..], 0);
        BigEndian::write_u32(&mut h[offset::PIXMAX..], if bpc == 1 { 255 } else { 65535 });
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        crate::packed::put_text(&mut h[offset::NAME..offset::NAME + NAME_LEN], &name);
        BigEndian::write_u32(&mut h[offset::COLORMAP..], 0);
        h
    }
}

impl ImageWriter for SgiWriter {
    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn set_path(&mut self, path: PathBuf) {
        self.path = path;
    }

    fn supports_channel(&self, name: &str) -> bool {
        matches!(name, "R" | "G" | "B" | "A" | "Y")
    }

    fn write(&mut self, image: &Image, options: &WriteOptions) -> IoResult<()> {
        let bpc: u8 = match self.options.bit_depth {
            8 => 1,
            16 => 2,
            other => return Err(IoError::invalid_option("bit_depth", format!("SGI cannot store {} bits", other))),
        };
        let detected = if bpc == 1 { ColorSpace::Srgb } else { ColorSpace::Linear };
        let plan = WritePlan::new(FORMAT, image, options, detected, |n| self.supports_channel(n))?;

        let colour = ["R", "G", "B"].iter().any(|c| plan.has(c));
        let mut planes: Vec<&str> = if colour {
            if plan.has("Y") {
                warn!(format = FORMAT, channel = "Y", "luminance cannot be mixed with colour, skipping");
            }
            vec!["R", "G", "B"]
        } else {
            vec!["Y"]
        };
        if plan.has("A") {
            planes.push("A");
        }

        let (width, height) = (plan.width(), plan.height());
        if width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(IoError::EncodeError(format!(
                "SGI cannot store {}x{} images",
                width, height
            )));
        }

        // Scanlines bottom-up, plane by plane.
        let mut rows: Vec<Vec<u16>> = Vec::with_capacity(planes.len() * height as usize);
        for name in &planes {
            let buf: Vec<u16> = if !plan.has(name) {
                vec![0; plan.display_window.area()]
            } else if bpc == 1 {
                plan.display_buffer::<u8>(image, name)?
                    .into_iter()
                    .map(u16::from)
                    .collect()
            } else {
                plan.display_buffer::<u16>(image, name)?
            };
            for stored_row in 0..height as usize {
                let y = height as usize - 1 - stored_row;
                rows.push(buf[y * width as usize..(y + 1) * width as usize].to_vec());
            }
        }

        let mut out = BufWriter::new(File::create(&self.path)?);
        out.write_all(&self.header_bytes(width, height, planes.len(), bpc, self.options.rle))?;

        let put = |out: &mut BufWriter<File>, samples: &[u16]| -> IoResult<()> {
            for &v in samples {
                if bpc == 1 {
                    out.write_u8(v as u8)?;
                } else {
                    out.write_u16::<BigEndian>(v)?;
                }
            }
            Ok(())
        };

        if self.options.rle {
            let encoded: Vec<Vec<u16>> = rows
                .iter()
                .map(|row| {
                    let mut e = Vec::with_capacity(row.len() + 2);
                    encode_rle_row(row, &mut e);
                    e
                })
                .collect();
            let row_bytes: Vec<u64> = encoded
                .iter()
                .map(|e| e.len() as u64 * bpc as u64)
                .collect();
            let (offsets, lengths) = rle_tables(&row_bytes)?;
            for pos in offsets {
                out.write_u32::<BigEndian>(pos)?;
            }
            for len in lengths {
                out.write_u32::<BigEndian>(len)?;
            }
            for e in &encoded {
                put(&mut out, e)?;
            }
        } else {
            for row in &rows {
                put(&mut out, row)?;
            }
        }
        out.flush()?;
        Ok(())
    }
}
