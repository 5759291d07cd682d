//! Quantized image: palette, per-pixel indices and encoding hints.

use std::fmt;

use crate::cluster::MergeRegime;
use crate::color::Argb;

/// Palette indices, 8-bit up to 256 requested colors and 16-bit above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    Narrow(Vec<u8>),
    Wide(Vec<u16>),
}

impl IndexBuffer {
    /// Pack `indices`; `wide` selects 16-bit storage.
    ///
    /// Narrow storage requires every index to fit in a byte, which holds
    /// whenever the palette has at most 256 entries.
    pub fn from_indices(indices: Vec<u16>, wide: bool) -> Self {
        if wide {
            IndexBuffer::Wide(indices)
        } else {
            IndexBuffer::Narrow(indices.into_iter().map(|i| i as u8).collect())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::Narrow(v) => v.len(),
            IndexBuffer::Wide(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<usize> {
        match self {
            IndexBuffer::Narrow(v) => v.get(i).map(|&x| x as usize),
            IndexBuffer::Wide(v) => v.get(i).map(|&x| x as usize),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    pub fn is_wide(&self) -> bool {
        matches!(self, IndexBuffer::Wide(_))
    }
}

/// Which encoder family suits the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Gif,
    Png,
}

impl ImageType {
    pub fn mime(self) -> &'static str {
        match self {
            ImageType::Gif => "image/gif",
            ImageType::Png => "image/png",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// How the indices were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Few enough distinct colors to keep them all.
    Exact,
    /// Serpentine scan-line diffusion.
    Scan,
    /// Per-pixel lookup without diffusion.
    Flat,
    /// Diffusion along the gilbert curve.
    Curve,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Route::Exact => "exact",
            Route::Scan => "scan",
            Route::Flat => "flat",
            Route::Curve => "curve",
        })
    }
}

/// Diagnostics from one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizeStats {
    pub route: Route,
    pub distinct_colors: usize,
    /// Non-empty histogram bins; 0 when clustering was skipped.
    pub bins: usize,
    pub weight: f64,
    pub regime: Option<MergeRegime>,
}

/// The result of quantizing one image.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedImage {
    width: usize,
    height: usize,
    palette: Vec<Argb>,
    indices: IndexBuffer,
    transparent_index: Option<u16>,
    image_type: ImageType,
    stats: QuantizeStats,
}

impl QuantizedImage {
    pub(crate) fn new(
        width: usize,
        height: usize,
        palette: Vec<Argb>,
        indices: IndexBuffer,
        transparent_index: Option<u16>,
        image_type: ImageType,
        stats: QuantizeStats,
    ) -> Self {
        debug_assert_eq!(indices.len(), width * height);
        debug_assert!(indices.iter().all(|i| i < palette.len()));
        Self {
            width,
            height,
            palette,
            indices,
            transparent_index,
            image_type,
            stats,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn palette(&self) -> &[Argb] {
        &self.palette
    }

    #[inline]
    pub fn indices(&self) -> &IndexBuffer {
        &self.indices
    }

    /// Palette slot holding the transparent color, if the image has one.
    #[inline]
    pub fn transparent_index(&self) -> Option<u16> {
        self.transparent_index
    }

    #[inline]
    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    #[inline]
    pub fn stats(&self) -> &QuantizeStats {
        &self.stats
    }

    /// Expand back to one packed color per pixel.
    pub fn to_argb(&self) -> Vec<Argb> {
        self.indices.iter().map(|i| self.palette[i]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> QuantizeStats {
        QuantizeStats {
            route: Route::Exact,
            distinct_colors: 2,
            bins: 0,
            weight: 0.0,
            regime: None,
        }
    }

    #[test]
    fn test_to_argb_expands_palette() {
        let image = QuantizedImage::new(
            2,
            2,
            vec![Argb::BLACK, Argb::WHITE],
            IndexBuffer::from_indices(vec![0, 1, 1, 0], false),
            None,
            ImageType::Gif,
            stats(),
        );
        assert_eq!(
            image.to_argb(),
            vec![Argb::BLACK, Argb::WHITE, Argb::WHITE, Argb::BLACK]
        );
    }

    #[test]
    fn test_index_buffer_width() {
        let narrow = IndexBuffer::from_indices(vec![3, 255], false);
        assert_eq!(narrow, IndexBuffer::Narrow(vec![3, 255]));
        let wide = IndexBuffer::from_indices(vec![300, 2], true);
        assert!(wide.is_wide());
        assert_eq!(wide.iter().collect::<Vec<_>>(), vec![300, 2]);
    }

    #[test]
    fn test_mime_strings() {
        assert_eq!(ImageType::Gif.mime(), "image/gif");
        assert_eq!(ImageType::Png.to_string(), "image/png");
    }
}
