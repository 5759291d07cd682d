//! Quantizer builder -- the primary ergonomic entry point for the crate.

use super::context::QuantizeContext;
use super::error::QuantizeError;
use super::request::{Quality, QuantizeRequest, DEFAULT_ALPHA_THRESHOLD};
use crate::color::Argb;
use crate::dither::{BlueNoise, NoiseDisperser};
use crate::output::QuantizedImage;

/// Reduces an ARGB image to an indexed palette image.
///
/// # Design
///
/// - Configuration methods consume and return `self`
/// - [`quantize()`](Self::quantize) takes `&self` so the builder is
///   **reusable** across images; every call starts from fresh caches
///
/// # Example
///
/// ```
/// use pnn_engine::{Argb, Quality, Quantizer};
///
/// let pixels: Vec<Argb> = (0..64u32)
///     .map(|i| Argb::opaque((i * 4) as u8, 255 - (i * 4) as u8, 128))
///     .collect();
///
/// let image = Quantizer::new(8)
///     .quality(Quality::Standard)
///     .quantize(&pixels, 8, 8)
///     .unwrap();
///
/// assert!(image.palette().len() <= 8);
/// assert_eq!(image.indices().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantizer {
    colors: usize,
    dither: bool,
    quality: Quality,
    alpha_threshold: u8,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Quantizer {
    /// Create a quantizer producing at most `colors` palette entries.
    ///
    /// Defaults: dithering on, [`Quality::High`], alpha threshold 15.
    pub fn new(colors: usize) -> Self {
        Self {
            colors,
            dither: true,
            quality: Quality::default(),
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
        }
    }

    #[inline]
    pub fn colors(mut self, colors: usize) -> Self {
        self.colors = colors;
        self
    }

    /// Enable or disable error diffusion.
    #[inline]
    pub fn dither(mut self, enabled: bool) -> Self {
        self.dither = enabled;
        self
    }

    #[inline]
    pub fn quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Alpha at or below which a pixel maps to the transparent slot.
    #[inline]
    pub fn alpha_threshold(mut self, threshold: u8) -> Self {
        self.alpha_threshold = threshold;
        self
    }

    /// The request this quantizer would run for `pixels`.
    pub fn request<'a>(&self, pixels: &'a [Argb], width: usize, height: usize) -> QuantizeRequest<'a> {
        QuantizeRequest {
            pixels,
            width,
            height,
            colors: self.colors,
            dither: self.dither,
            quality: self.quality,
            alpha_threshold: self.alpha_threshold,
        }
    }

    /// Quantize with the built-in blue noise.
    pub fn quantize(
        &self,
        pixels: &[Argb],
        width: usize,
        height: usize,
    ) -> Result<QuantizedImage, QuantizeError> {
        self.quantize_with(pixels, width, height, &BlueNoise)
    }

    /// Quantize with a caller-supplied noise source.
    pub fn quantize_with<N: NoiseDisperser + ?Sized>(
        &self,
        pixels: &[Argb],
        width: usize,
        height: usize,
        noise: &N,
    ) -> Result<QuantizedImage, QuantizeError> {
        let request = self.request(pixels, width, height);
        request.validate()?;
        tracing::debug!(
            width,
            height,
            colors = self.colors,
            quality = %self.quality,
            dither = self.dither,
            "quantizing"
        );
        let image = QuantizeContext::new(request).run(noise);
        tracing::debug!(
            palette = image.palette().len(),
            route = %image.stats().route,
            "quantized"
        );
        Ok(image)
    }
}
