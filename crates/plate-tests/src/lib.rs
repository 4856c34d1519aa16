//! Integration tests for plate-rs crates.
//!
//! Cross-format checks that go through the public dispatch API: round
//! trips, split-window reads and probing of unrelated files.

#[cfg(test)]
mod tests {
    use std::path::Path;

    use approx::assert_relative_eq;
    use plate_core::{ChannelData, Image, Rect, SampleKind};
    use plate_io::{
        detect, read, reader_for, write, Attrs, Format, ImageReader, IoError, ReadOptions,
        WriteOptions,
    };
    use tempfile::tempdir;

    const WIDTH: u32 = 8;
    const HEIGHT: u32 = 6;

    /// RGBA with distinct 8-bit values in every channel.
    fn rgba8() -> Image {
        let window = Rect::from_size(WIDTH, HEIGHT);
        let mut image = Image::with_window(window);
        for (c, name) in ["R", "G", "B", "A"].into_iter().enumerate() {
            let data: Vec<u8> = (0..window.area())
                .map(|i| ((i * 5 + c * 60) % 256) as u8)
                .collect();
            image.insert_channel(name, ChannelData::from(data)).unwrap();
        }
        image
    }

    /// Smooth float RGBA ramps in [0, 1].
    fn rgba_float() -> Image {
        let window = Rect::from_size(WIDTH, HEIGHT);
        let mut image = Image::with_window(window);
        for (c, name) in ["R", "G", "B", "A"].into_iter().enumerate() {
            let data: Vec<f32> = (0..window.area())
                .map(|i| {
                    let x = (i as u32 % WIDTH) as f32;
                    let y = (i as u32 / WIDTH) as f32;
                    (x + y + c as f32) / (WIDTH + HEIGHT + 4) as f32
                })
                .collect();
            image.insert_channel(name, ChannelData::from(data)).unwrap();
        }
        image
    }

    /// Reads `window` as four quadrant reads and stitches them together.
    fn read_in_pieces(reader: &mut dyn ImageReader, name: &str, window: Rect) -> ChannelData {
        let mid_x = window.min_x + window.width() as i32 / 2;
        let mid_y = window.min_y + window.height() as i32 / 2;
        let (top, bottom) = window.split_y(mid_y);
        let (tl, tr) = top.split_x(mid_x);
        let (bl, br) = bottom.split_x(mid_x);

        let kind = reader.native_kind(name).unwrap();
        let mut out = ChannelData::zeros(kind, window.area());
        for piece in [tl, tr, bl, br] {
            let data = reader.read_channel(name, piece, true).unwrap();
            out.copy_span(
                &data,
                piece.width() as usize,
                0,
                0..piece.height() as usize,
                piece.width() as usize,
                window.index_of(piece.min_x, piece.min_y),
                window.width() as usize,
            );
        }
        out
    }

    #[test]
    fn test_lossless_8bit_roundtrips() {
        let dir = tempdir().unwrap();
        let image = rgba8();

        for ext in ["png", "tga", "sgi", "tif"] {
            let path = dir.path().join(format!("lossless.{}", ext));
            write(&path, &image, &WriteOptions::default()).unwrap();

            let back = read(&path, &ReadOptions::default().raw()).unwrap();
            assert_eq!(back.data_window(), image.data_window(), "{}", ext);
            assert_eq!(back.display_window(), image.display_window(), "{}", ext);
            for name in ["R", "G", "B", "A"] {
                // TIFF defaults to 16 bits; 8-bit values survive the rescale.
                let got = back.channel(name).unwrap().convert(SampleKind::U8);
                assert_eq!(&got, image.channel(name).unwrap(), "{} {}", ext, name);
            }
        }
    }

    #[test]
    fn test_exr_roundtrip_keeps_windows_and_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("windows.exr");

        let display = Rect::new(-4, -4, 11, 11);
        let data = Rect::new(-2, 1, 5, 4);
        let mut image = Image::new(display, data);
        let values: Vec<f32> = (0..data.area()).map(|i| i as f32 * 1.5 - 3.0).collect();
        image.insert_channel("Z", ChannelData::from(values.clone())).unwrap();

        write(&path, &image, &WriteOptions::default()).unwrap();
        assert_eq!(detect(&path).unwrap(), Format::Exr);

        let back = read(&path, &ReadOptions::default()).unwrap();
        assert_eq!(back.display_window(), display);
        assert_eq!(back.data_window(), data);
        let z = back.channel("Z").unwrap().as_f32().unwrap();
        for (orig, got) in values.iter().zip(z) {
            assert_relative_eq!(*orig, *got);
        }
    }

    #[test]
    fn test_split_window_reads_match_full_reads() {
        let dir = tempdir().unwrap();
        let image = rgba_float();

        for ext in ["dpx", "cin", "png", "jpg", "tga", "sgi", "tif", "exr"] {
            let path = dir.path().join(format!("split.{}", ext));
            write(&path, &image, &WriteOptions::default()).unwrap();

            let mut reader = reader_for(&path).unwrap();
            assert!(reader.is_complete(), "{}", ext);
            let window = reader.data_window().unwrap();
            for name in reader.channel_names().unwrap() {
                let full = reader.read_channel(&name, window, true).unwrap();
                let pieces = read_in_pieces(reader.as_mut(), &name, window);
                assert_eq!(full, pieces, "{} {}", ext, name);
            }
        }
    }

    #[test]
    fn test_padded_read_outside_data_window() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("padded.png");
        let image = rgba8();
        write(&path, &image, &WriteOptions::default()).unwrap();

        let outer = Rect::new(-2, -1, WIDTH as i32 + 1, HEIGHT as i32);
        let options = ReadOptions::default().raw().with_data_window(outer);
        let back = read(&path, &options).unwrap();
        assert_eq!(back.data_window(), outer);

        let r = back.channel("R").unwrap();
        let src = image.channel("R").unwrap();
        assert_eq!(r.get::<u8>(outer.index_of(-2, -1)), 0);
        assert_eq!(r.get::<u8>(outer.index_of(WIDTH as i32, 0)), 0);
        for (x, y) in [(0, 0), (3, 2), (WIDTH as i32 - 1, HEIGHT as i32 - 1)] {
            let inner = image.data_window().index_of(x, y);
            assert_eq!(r.get::<u8>(outer.index_of(x, y)), src.get::<u8>(inner));
        }
    }

    #[test]
    fn test_options_from_attrs_select_channels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subset.exr");

        let mut attrs = Attrs::new();
        attrs.set("channels", vec!["G".to_string(), "A".to_string()]);
        let options = WriteOptions::from_attrs(&attrs).unwrap();
        write(&path, &rgba_float(), &options).unwrap();

        let mut reader = reader_for(&path).unwrap();
        assert_eq!(reader.channel_names().unwrap(), vec!["A", "G"]);

        let mut attrs = Attrs::new();
        attrs.set("channels", vec!["R".to_string()]);
        let err = read(&path, &ReadOptions::from_attrs(&attrs).unwrap()).unwrap_err();
        assert!(matches!(err, IoError::MissingChannel(_)));
    }

    #[test]
    fn test_unsupported_channels_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skip.tga");
        let mut image = rgba8();
        image
            .insert_channel("Z", ChannelData::from(vec![1.0f32; (WIDTH * HEIGHT) as usize]))
            .unwrap();
        write(&path, &image, &WriteOptions::default()).unwrap();

        let mut reader = reader_for(&path).unwrap();
        assert_eq!(reader.channel_names().unwrap(), vec!["R", "G", "B", "A"]);
    }

    fn assert_not_readable(path: &Path) {
        assert!(!plate_io::dpx::DpxReader::can_read(path));
        assert!(!plate_io::cineon::CineonReader::can_read(path));
        assert!(!plate_io::exr::ExrReader::can_read(path));
        assert!(!plate_io::png::PngReader::can_read(path));
        assert!(!plate_io::jpeg::JpegReader::can_read(path));
        assert!(!plate_io::tiff::TiffReader::can_read(path));
        assert!(!plate_io::sgi::SgiReader::can_read(path));
        assert!(!plate_io::tga::TgaReader::can_read(path));
    }

    #[test]
    fn test_garbage_is_never_readable() {
        let dir = tempdir().unwrap();
        let garbage: Vec<u8> = b"this is not an image file. ".repeat(40);

        for format in Format::ALL.into_iter().filter(|f| f.can_read()) {
            let path = dir.path().join(format!("garbage.{}", format.extensions()[0]));
            std::fs::write(&path, &garbage).unwrap();
            assert_not_readable(&path);
            assert!(
                matches!(detect(&path), Err(IoError::UnsupportedFormat(_))),
                "{}",
                format
            );
        }

        let empty = dir.path().join("empty.tga");
        std::fs::write(&empty, []).unwrap();
        assert_not_readable(&empty);
    }

    #[test]
    fn test_yuv_frame_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.yuv");
        write(&path, &rgba_float(), &WriteOptions::default()).unwrap();

        let size = std::fs::metadata(&path).unwrap().len() as u32;
        assert_eq!(size, WIDTH * HEIGHT * 3 / 2);
        assert!(reader_for(&path).is_err());
    }
}
