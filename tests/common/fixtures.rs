//! Test fixtures: small PNGs written with the `png` crate directly, so the
//! inputs do not depend on the encoder under test.

use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Encode RGBA8 data as a PNG.
pub fn rgba_png(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(rgba).unwrap();
    }
    buf.into_inner()
}

/// A smooth opaque gradient with `width * height` distinct colors (up to 65536).
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            rgba.extend_from_slice(&[(i % 256) as u8, (i / 256) as u8, (x * 255 / width.max(1)) as u8, 255]);
        }
    }
    rgba_png(width, height, &rgba)
}

/// A gradient whose left column is fully transparent.
pub fn transparent_edge_png(width: u32, height: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            if x == 0 {
                rgba.extend_from_slice(&[7, 7, 7, 0]);
            } else {
                rgba.extend_from_slice(&[(x * 9) as u8, (y * 13) as u8, ((x + y) * 5) as u8, 255]);
            }
        }
    }
    rgba_png(width, height, &rgba)
}

/// A gradient with partial alpha throughout.
pub fn translucent_png(width: u32, height: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            rgba.extend_from_slice(&[(x * 16) as u8, (y * 16) as u8, 128, 0x40 + (x * 4) as u8]);
        }
    }
    rgba_png(width, height, &rgba)
}

/// Write `data` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}
