//! Per-run state of the quantizer.
//!
//! A [`QuantizeContext`] is built fresh for every image from its
//! [`QuantizeRequest`]. It owns every cache and tunable the run touches, so
//! nothing leaks between images.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use super::request::{Quality, QuantizeRequest};
use crate::cluster::{self, BucketMode, ClusterParams, MergeRegime};
use crate::color::{Argb, LabCache};
use crate::dither::{curve_dither, saliency_map, scan_dither, CurveInput, NoiseDisperser, Pick};
use crate::output::{ImageType, IndexBuffer, QuantizeStats, QuantizedImage, Route};
use crate::palette::{ChannelWeights, LookupPolicy, Palette, PaletteLookup};

/// Palettes strictly between these sizes use the scan ditherer.
const SCAN_RANGE: (usize, usize) = (32, 64);
/// Alpha at or above which a pixel is no longer semi-transparent.
const SEMI_TRANSPARENT_CEILING: u8 = 0xE0;
/// Requests above this many colors produce 16-bit indices.
const NARROW_INDEX_LIMIT: usize = 256;

/// Transparency and color-count facts about an image.
///
/// # Example
///
/// ```
/// use pnn_engine::{Argb, ImageTraits};
///
/// let pixels = [Argb::new(0, 9, 9, 9), Argb::WHITE, Argb::new(0x80, 1, 2, 3)];
/// let traits = ImageTraits::scan(&pixels, 15);
/// assert_eq!(traits.transparent, Some(Argb::new(0, 9, 9, 9)));
/// assert!(traits.has_semi_transparency);
/// assert_eq!(traits.distinct_colors, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTraits {
    /// The first fully transparent pixel, which becomes the canonical
    /// transparent color.
    pub transparent: Option<Argb>,
    /// Offset of that pixel.
    pub transparent_pixel: Option<usize>,
    /// Some pixel has alpha above the threshold but below 0xE0.
    pub has_semi_transparency: bool,
    /// Distinct colors once all fully transparent pixels are merged.
    pub distinct_colors: usize,
}

impl ImageTraits {
    pub fn scan(pixels: &[Argb], alpha_threshold: u8) -> Self {
        let mut transparent = None;
        let mut transparent_pixel = None;
        let mut has_semi_transparency = false;
        let mut seen = HashSet::new();
        for (i, &p) in pixels.iter().enumerate() {
            let a = p.a();
            if a == 0 {
                if transparent.is_none() {
                    transparent = Some(p);
                    transparent_pixel = Some(i);
                }
                seen.insert(Argb::TRANSPARENT);
                continue;
            }
            if a > alpha_threshold && a < SEMI_TRANSPARENT_CEILING {
                has_semi_transparency = true;
            }
            seen.insert(p);
        }
        Self {
            transparent,
            transparent_pixel,
            has_semi_transparency,
            distinct_colors: seen.len(),
        }
    }

    /// The hint an encoder would use for a palette of `colors` entries.
    pub fn image_type(&self, colors: usize) -> ImageType {
        if colors > NARROW_INDEX_LIMIT || self.has_semi_transparency {
            ImageType::Png
        } else {
            ImageType::Gif
        }
    }

    /// Whether alpha matters anywhere in the image.
    pub fn has_alpha(&self) -> bool {
        self.transparent.is_some() || self.has_semi_transparency
    }
}

/// Mutable state threaded through one quantization run.
pub struct QuantizeContext<'a> {
    pub request: QuantizeRequest<'a>,
    pub traits: ImageTraits,
    /// Input with every fully transparent pixel replaced by the canonical
    /// transparent color.
    pub pixels: Cow<'a, [Argb]>,
    pub weights: ChannelWeights,
    pub labs: LabCache,
    /// `min(0.9, colors / bins)` once known.
    pub weight: f64,
    pub bins: usize,
    pub regime: Option<MergeRegime>,
    pub saliencies: Option<Vec<f32>>,
}

impl<'a> QuantizeContext<'a> {
    /// Analyze the image. The request must already be validated.
    pub fn new(request: QuantizeRequest<'a>) -> Self {
        let traits = ImageTraits::scan(request.pixels, request.alpha_threshold);
        let pixels = match traits.transparent {
            Some(t) if request.pixels.iter().any(|p| p.a() == 0 && *p != t) => Cow::Owned(
                request
                    .pixels
                    .iter()
                    .map(|&p| if p.a() == 0 { t } else { p })
                    .collect(),
            ),
            _ => Cow::Borrowed(request.pixels),
        };
        Self {
            weights: ChannelWeights::for_image(traits.has_semi_transparency),
            request,
            traits,
            pixels,
            labs: LabCache::new(),
            weight: 1.0,
            bins: 0,
            regime: None,
            saliencies: None,
        }
    }

    fn wide(&self) -> bool {
        self.request.colors > NARROW_INDEX_LIMIT
    }

    /// Run to completion, consuming the context.
    pub fn run<N: NoiseDisperser + ?Sized>(mut self, noise: &N) -> QuantizedImage {
        let n = self.request.colors;
        if self.traits.distinct_colors <= n {
            tracing::debug!(distinct = self.traits.distinct_colors, "exact palette");
            return self.exact();
        }

        let palette = if n <= 2 {
            self.weight = cluster::regime::weight(n, self.traits.distinct_colors);
            Palette::two_color(self.traits.transparent)
        } else {
            let clustering = cluster::cluster(
                &self.pixels,
                &ClusterParams {
                    max_colors: n,
                    quality: self.request.quality,
                    bucket: self.bucket(),
                    transparent: self.traits.transparent,
                },
                &mut self.labs,
            );
            self.weight = clustering.weight;
            self.bins = clustering.bins;
            self.regime = clustering.regime;
            Palette::new(clustering.palette)
        };

        let route = if n > SCAN_RANGE.0 && n < SCAN_RANGE.1 {
            if self.request.dither {
                Route::Scan
            } else {
                Route::Flat
            }
        } else {
            Route::Curve
        };
        if route == Route::Curve && self.request.dither && !self.traits.has_semi_transparency {
            self.saliencies = Some(saliency_map(&self.pixels, &mut self.labs));
        }
        tracing::debug!(route = %route, palette = palette.len(), weight = self.weight, "dithering");

        let policy = LookupPolicy {
            quality: self.request.quality,
            alpha_threshold: self.request.alpha_threshold,
            transparent: self.traits.transparent,
            has_semi_transparency: self.traits.has_semi_transparency,
            weights: self.weights,
        };
        let labs = std::mem::take(&mut self.labs);
        let mut lookup = PaletteLookup::new(palette, policy, labs, noise);
        let (width, height) = (self.request.width, self.request.height);

        let mut indices = match route {
            Route::Scan => scan_dither(&self.pixels, width, height, &mut lookup),
            Route::Flat => self.pixels.iter().map(|&p| lookup.nearest(p)).collect(),
            Route::Curve | Route::Exact => {
                let pick = Pick::for_palette(lookup.palette().len(), self.traits.transparent.is_some());
                let input = CurveInput {
                    pixels: &self.pixels,
                    width,
                    height,
                    weight: self.weight,
                    has_alpha: self.traits.has_alpha(),
                    dither: self.request.dither,
                    saliencies: self.saliencies.as_deref(),
                    bucket: self.bucket(),
                    pick,
                };
                curve_dither(input, &mut lookup)
            }
        };

        let mut palette = lookup.into_palette();
        let transparent_index = self.fix_transparent(&mut palette, &mut indices);
        self.finish(palette.into_colors(), indices, transparent_index, route)
    }

    fn bucket(&self) -> BucketMode {
        BucketMode::for_image(self.traits.has_semi_transparency, self.traits.transparent.is_some())
    }

    /// Keep every distinct color, transparent first, in order of appearance.
    fn exact(self) -> QuantizedImage {
        let mut palette: Vec<Argb> = Vec::with_capacity(self.traits.distinct_colors);
        if let Some(t) = self.traits.transparent {
            palette.push(t);
        }
        let mut slots: HashMap<Argb, u16> = HashMap::with_capacity(self.traits.distinct_colors);
        for (i, &c) in palette.iter().enumerate() {
            slots.insert(c, i as u16);
        }
        let indices: Vec<u16> = self
            .pixels
            .iter()
            .map(|&p| {
                *slots.entry(p).or_insert_with(|| {
                    palette.push(p);
                    (palette.len() - 1) as u16
                })
            })
            .collect();
        let transparent_index = self.traits.transparent.map(|_| 0);
        self.finish(palette, indices, transparent_index, Route::Exact)
    }

    /// Make sure the slot the transparent pixel maps to holds the
    /// transparent color, then move that slot to index 0.
    fn fix_transparent(&self, palette: &mut Palette, indices: &mut [u16]) -> Option<u16> {
        let (t, pos) = (self.traits.transparent?, self.traits.transparent_pixel?);
        let k = indices[pos] as usize;
        if palette.len() > 2 {
            palette.set(k, t);
        } else if palette.color(k) != t {
            match palette.position(t) {
                Some(j) => swap_slots(palette, indices, j, k),
                None => palette.set(k, t),
            }
        }
        if k != 0 {
            swap_slots(palette, indices, 0, k);
        }
        Some(0)
    }

    fn finish(
        self,
        palette: Vec<Argb>,
        indices: Vec<u16>,
        transparent_index: Option<u16>,
        route: Route,
    ) -> QuantizedImage {
        let image_type = self.traits.image_type(self.request.colors);
        let stats = QuantizeStats {
            route,
            distinct_colors: self.traits.distinct_colors,
            bins: self.bins,
            weight: self.weight,
            regime: self.regime,
        };
        QuantizedImage::new(
            self.request.width,
            self.request.height,
            palette,
            IndexBuffer::from_indices(indices, self.wide()),
            transparent_index,
            image_type,
            stats,
        )
    }
}

/// Swap two palette entries and every index pointing at them.
fn swap_slots(palette: &mut Palette, indices: &mut [u16], a: usize, b: usize) {
    if a == b {
        return;
    }
    palette.swap(a, b);
    let (a, b) = (a as u16, b as u16);
    for idx in indices.iter_mut() {
        if *idx == a {
            *idx = b;
        } else if *idx == b {
            *idx = a;
        }
    }
}
