//! Assertion helpers for tests.

use pretty_assertions::assert_eq;
use std::io::Cursor;

/// Header facts of an encoded PNG.
#[derive(Debug)]
pub struct PngHeader {
    pub width: u32,
    pub height: u32,
    pub color_type: png::ColorType,
    pub bit_depth: png::BitDepth,
    pub palette_len: Option<usize>,
    pub has_trns: bool,
}

/// Assert the bytes are a readable PNG and return its header
pub fn assert_png(data: &[u8]) -> PngHeader {
    assert!(
        data.starts_with(b"\x89PNG\r\n\x1a\n"),
        "Expected PNG image, got {} bytes starting with {:?}",
        data.len(),
        &data[..8.min(data.len())]
    );
    let decoder = png::Decoder::new(Cursor::new(data));
    let reader = decoder.read_info().expect("PNG header should parse");
    let info = reader.info();
    PngHeader {
        width: info.width,
        height: info.height,
        color_type: info.color_type,
        bit_depth: info.bit_depth,
        palette_len: info.palette.as_ref().map(|p| p.len() / 3),
        has_trns: info.trns.is_some(),
    }
}

/// Assert the PNG is indexed with at most `max_colors` palette entries
pub fn assert_indexed_png(data: &[u8], max_colors: usize) -> PngHeader {
    let header = assert_png(data);
    assert_eq!(
        header.color_type,
        png::ColorType::Indexed,
        "Expected indexed PNG"
    );
    let palette_len = header.palette_len.expect("Indexed PNG must carry PLTE");
    assert!(
        palette_len <= max_colors,
        "Palette has {palette_len} entries, expected at most {max_colors}"
    );
    header
}
