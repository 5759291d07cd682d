use crate::error::ImageError;
use pnn_engine::{Argb, IndexBuffer, QuantizedImage};
use std::io::Cursor;

/// A decoded PNG as packed ARGB pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Argb>,
}

/// Decode any PNG color type to 8-bit ARGB.
///
/// Indexed and low bit-depth images are expanded, 16-bit channels are
/// stripped to 8 bits and a tRNS chunk becomes per-pixel alpha.
pub fn decode_png(data: &[u8]) -> Result<DecodedImage, ImageError> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    let bytes = &buf[..info.buffer_size()];

    if info.bit_depth != png::BitDepth::Eight {
        return Err(ImageError::UnsupportedLayout(format!(
            "{:?} at {:?} bits",
            info.color_type, info.bit_depth
        )));
    }

    let pixels: Vec<Argb> = match info.color_type {
        png::ColorType::Rgba => bytes
            .chunks_exact(4)
            .map(|p| Argb::from_rgba([p[0], p[1], p[2], p[3]]))
            .collect(),
        png::ColorType::Rgb => bytes
            .chunks_exact(3)
            .map(|p| Argb::opaque(p[0], p[1], p[2]))
            .collect(),
        png::ColorType::GrayscaleAlpha => bytes
            .chunks_exact(2)
            .map(|p| Argb::new(p[1], p[0], p[0], p[0]))
            .collect(),
        png::ColorType::Grayscale => bytes.iter().map(|&v| Argb::opaque(v, v, v)).collect(),
        png::ColorType::Indexed => {
            return Err(ImageError::UnsupportedLayout(
                "indexed data survived expansion".to_string(),
            ))
        }
    };

    Ok(DecodedImage {
        width: info.width as usize,
        height: info.height as usize,
        pixels,
    })
}

/// Encode a quantized image as PNG.
///
/// Palettes of at most 256 entries become indexed PNG (PLTE + tRNS) packed
/// at 1, 2, 4 or 8 bits per pixel; larger palettes are written as RGBA.
pub fn encode_png(image: &QuantizedImage) -> Result<Vec<u8>, ImageError> {
    let width = u32::try_from(image.width())
        .map_err(|_| ImageError::Encode(format!("width {} exceeds PNG limits", image.width())))?;
    let height = u32::try_from(image.height())
        .map_err(|_| ImageError::Encode(format!("height {} exceeds PNG limits", image.height())))?;

    let palette = image.palette();
    match image.indices() {
        IndexBuffer::Narrow(indices) if palette.len() <= 256 => {
            let (depth, bits) = match palette.len() {
                0..=2 => (png::BitDepth::One, 1),
                3..=4 => (png::BitDepth::Two, 2),
                5..=16 => (png::BitDepth::Four, 4),
                _ => (png::BitDepth::Eight, 8),
            };
            let plte: Vec<u8> = palette.iter().flat_map(|c| [c.r(), c.g(), c.b()]).collect();
            let trns = transparency_chunk(palette);
            let packed = if bits == 8 {
                indices.clone()
            } else {
                pack_nbits(indices, image.width(), bits)
            };
            write_png(
                width,
                height,
                png::ColorType::Indexed,
                depth,
                Some((&plte, trns.as_deref())),
                &packed,
            )
        }
        _ => {
            let rgba: Vec<u8> = image.to_argb().iter().flat_map(|c| c.to_rgba()).collect();
            write_png(
                width,
                height,
                png::ColorType::Rgba,
                png::BitDepth::Eight,
                None,
                &rgba,
            )
        }
    }
}

/// Re-compress with oxipng (zopfli + adaptive filter selection), keeping
/// the input when optimization fails.
pub fn optimize_png(png_bytes: Vec<u8>) -> Vec<u8> {
    match oxipng::optimize_from_memory(
        &png_bytes,
        &oxipng::Options {
            strip: oxipng::StripChunks::Safe,
            optimize_alpha: false,
            ..Default::default()
        },
    ) {
        Ok(optimized) => optimized,
        Err(e) => {
            tracing::warn!(%e, "oxipng failed, keeping unoptimized PNG");
            png_bytes
        }
    }
}

/// Alpha per palette entry, trimmed after the last non-opaque entry.
fn transparency_chunk(palette: &[Argb]) -> Option<Vec<u8>> {
    let last = palette.iter().rposition(|c| c.a() != 0xFF)?;
    Some(palette[..=last].iter().map(|c| c.a()).collect())
}

fn write_png(
    width: u32,
    height: u32,
    color_type: png::ColorType,
    bit_depth: png::BitDepth,
    palette: Option<(&[u8], Option<&[u8]>)>,
    data: &[u8],
) -> Result<Vec<u8>, ImageError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(color_type);
        encoder.set_depth(bit_depth);
        encoder.set_compression(png::Compression::Fast);
        encoder.set_filter(png::FilterType::NoFilter);
        if let Some((plte, trns)) = palette {
            encoder.set_palette(plte);
            if let Some(trns) = trns {
                encoder.set_trns(trns);
            }
        }
        let mut writer = encoder.write_header()?;
        writer.write_image_data(data)?;
    }
    Ok(buf.into_inner())
}

/// Pack pixel values into N-bit PNG row data (1, 2, or 4 bits per pixel).
fn pack_nbits(indices: &[u8], width: usize, bits: u8) -> Vec<u8> {
    let pixels_per_byte = 8 / bits as usize;
    let bytes_per_row = width.div_ceil(pixels_per_byte);
    let height = indices.len() / width;
    let mask = (1u8 << bits) - 1;
    let mut packed = Vec::with_capacity(bytes_per_row * height);

    for row in indices.chunks(width) {
        let mut byte = 0u8;
        for (i, &idx) in row.iter().enumerate() {
            let shift = (8 - bits) - (i % pixels_per_byte) as u8 * bits;
            byte |= (idx & mask) << shift;

            if (i % pixels_per_byte) == pixels_per_byte - 1 || i == row.len() - 1 {
                packed.push(byte);
                byte = 0;
            }
        }
    }

    packed
}
