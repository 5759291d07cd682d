//! Error diffusion along a gilbert curve.
//!
//! Pixels are visited in [`gilbert_walk`] order. Each one receives the
//! weighted sum of the last few residuals from an [`ErrorWindow`], is
//! matched against the palette, and pushes its own (compressed) residual
//! back into the window.
//!
//! With dithering off the walk is skipped and pixels map to their nearest
//! entry. Otherwise, when a saliency map is available, the match goes
//! through a blend cascade: if the chosen color is already within tolerance
//! the blend is skipped; otherwise the source is pulled toward the candidate
//! with the noise disperser and matched again, escalating the strength when
//! the first blend still leaves large deltas and falling back to the
//! unblended match where blending would smear low-saliency detail.

use std::f64::consts::PI;

use crate::cluster::BucketMode;
use crate::color::yuv::{chroma_diff, luma_diff};
use crate::color::Argb;
use crate::palette::{PaletteLookup, POSITION_MASK};

use super::error_box::{decay_weights, ErrorBox, ErrorWindow};
use super::gilbert::gilbert_walk;
use super::NoiseDisperser;

const BLEND_STRENGTH: f32 = 1.0 / 3.0;
/// Saliency band where cached small-palette matches get re-blended.
const SALIENCY_BAND: (f32, f32) = (0.65, 0.75);
/// Saliency below which a blended match may be rejected.
const LOW_SALIENCY: f32 = 0.6;
/// Beta for the second chance given to unaccepted matches.
const RETRY_BETA: f64 = 1.25;

/// Luma delta scaled to `0..=1`, the key of the sorted window.
fn luma_key(a: Argb, b: Argb) -> f32 {
    (luma_diff(a, b) / 255.0) as f32
}

/// How an oversized residual is shrunk before it enters the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    /// `tanh` squash, at positions the noise flags as diffuse.
    Diffuse,
    /// Scaled by the luma key.
    Illusion,
    /// Divided by `1 + sqrt(dither_max)`.
    Damp,
}

impl Compression {
    fn apply(self, e: f32, max_err: f32, y_diff: f32, dither_max: f32) -> f32 {
        match self {
            Compression::Diffuse => (e / max_err * 20.0).tanh() * (dither_max - 1.0),
            Compression::Illusion => e / max_err * y_diff * (dither_max - 1.0),
            Compression::Damp => e / (1.0 + dither_max.sqrt()),
        }
    }
}

/// Which lookup policy picks indices, fixed per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    Nearest,
    Closest,
}

impl Pick {
    /// Nearest when the image has a transparent color or the palette is
    /// small, closest otherwise.
    pub fn for_palette(palette_len: usize, has_transparent: bool) -> Self {
        if has_transparent || palette_len < 64 {
            Pick::Nearest
        } else {
            Pick::Closest
        }
    }
}

/// Tuning derived from palette size and histogram density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveRegime {
    /// Window length (9, 16 or 25).
    pub window: usize,
    pub edge: f64,
    /// Residuals at or above this magnitude get compressed.
    pub dither_max: f64,
    /// Spatial threshold above which a position diffuses.
    pub threshold: i8,
    pub margin: f64,
    /// Window ordered by luma delta instead of age.
    pub sorted: bool,
    /// Blend strength multiplier.
    pub beta: f64,
}

impl CurveRegime {
    pub fn new(palette_len: usize, weight: f64, has_alpha: bool, has_saliency: bool) -> Self {
        let pal = palette_len as f64;
        let weight = weight.abs().max(f64::MIN_POSITIVE);

        let window = if weight >= 0.01 {
            9
        } else if weight > 0.0025 {
            25
        } else {
            16
        };
        let edge = if has_alpha { 1.0 } else { weight.exp() - 0.25 };
        let mut dither_max = if has_alpha || window > 9 {
            ((window as f64).sqrt() + edge).powi(2)
        } else {
            window as f64
        };
        let density = pal / weight;
        if density > 5000.0 && (weight > 0.045 || (weight > 0.01 && palette_len <= 64)) {
            dither_max = (5.0 + edge).powi(2);
        }
        if density < 3200.0 && palette_len > 16 && palette_len < 256 {
            dither_max = dither_max.max(pal - window as f64);
        }

        let threshold = if window > 9 { -112 } else { -64 };
        let margin = if weight < 0.0025 {
            12.0
        } else if weight < 0.004 {
            8.0
        } else {
            6.0
        };
        let sorted = palette_len >= 128
            && (has_alpha || weight < 0.02)
            && (!has_saliency || weight < 0.0025);

        Self {
            window,
            edge,
            dither_max,
            threshold,
            margin,
            sorted,
            beta: Self::beta(palette_len, weight),
        }
    }

    fn beta(palette_len: usize, weight: f64) -> f64 {
        if palette_len <= 4 {
            return 0.95;
        }
        let pal = palette_len as f64;
        let boundary = 0.005 - 0.0000625 * pal;
        let mut beta = if weight > boundary {
            0.25
        } else {
            (0.6 - 0.00625 * pal + pal * weight).min(1.5)
        };
        if palette_len > 32 && palette_len < 256 {
            beta += 0.1;
        }
        beta
    }

    /// Multiplier on the accepted luma delta before escalating a blend.
    fn escalation(&self, weight: f64) -> f64 {
        if weight > 0.0015 && weight < 0.0025 {
            self.beta
        } else {
            PI
        }
    }
}

/// Everything the curve ditherer needs for one image.
pub struct CurveInput<'a> {
    pub pixels: &'a [Argb],
    pub width: usize,
    pub height: usize,
    pub weight: f64,
    pub has_alpha: bool,
    pub dither: bool,
    pub saliencies: Option<&'a [f32]>,
    pub bucket: BucketMode,
    pub pick: Pick,
}

struct CurveDitherer<'a, 'l, 'n, N: NoiseDisperser + ?Sized> {
    input: CurveInput<'a>,
    lookup: &'l mut PaletteLookup<'n, N>,
    regime: CurveRegime,
    escalation: f64,
    weights_by_len: Vec<Vec<f32>>,
    window: ErrorWindow,
    bucket_cache: Vec<Option<u16>>,
    indices: Vec<u16>,
}

/// Dither along the gilbert curve, returning one index per pixel.
///
/// With dithering off no error is carried: every pixel maps to its nearest
/// palette entry.
pub fn curve_dither<N: NoiseDisperser + ?Sized>(
    input: CurveInput<'_>,
    lookup: &mut PaletteLookup<'_, N>,
) -> Vec<u16> {
    if !input.dither {
        return input.pixels.iter().map(|&p| lookup.nearest(p)).collect();
    }
    let regime = CurveRegime::new(
        lookup.palette().len(),
        input.weight,
        input.has_alpha,
        input.saliencies.is_some(),
    );
    tracing::debug!(
        window = regime.window,
        dither_max = regime.dither_max,
        sorted = regime.sorted,
        beta = regime.beta,
        "curve dither"
    );
    let window = if regime.sorted {
        ErrorWindow::sorted(regime.window)
    } else {
        ErrorWindow::temporal(regime.window)
    };
    let (width, height) = (input.width, input.height);
    let mut ditherer = CurveDitherer {
        indices: vec![0; input.pixels.len()],
        escalation: regime.escalation(input.weight.abs()),
        weights_by_len: (0..=regime.window).map(decay_weights).collect(),
        bucket_cache: vec![None; 1 << 16],
        input,
        lookup,
        regime,
        window,
    };
    gilbert_walk(width, height, |x, y| ditherer.dither_pixel(x, y));
    ditherer.indices
}

impl<N: NoiseDisperser + ?Sized> CurveDitherer<'_, '_, '_, N> {
    fn pick(&mut self, color: Argb, pos: usize) -> u16 {
        match self.input.pick {
            Pick::Nearest => self.lookup.nearest(color),
            Pick::Closest => self.lookup.closest(color, pos),
        }
    }

    fn palette_len(&self) -> usize {
        self.lookup.palette().len()
    }

    fn accepted_diff(&self) -> f64 {
        (self.palette_len() as f64 - self.regime.margin).max(2.0)
    }

    /// Blend cascade around an initial match `idx` for `pixel`.
    fn refine(&mut self, pixel: Argb, idx: u16, saliency: f32, beta: f64, x: usize, y: usize) -> u16 {
        let pos = x + y * self.input.width;
        let accepted = self.accepted_diff();
        let c2 = self.lookup.color(idx);
        if luma_diff(pixel, c2) <= accepted && chroma_diff(pixel, c2) <= 2.0 * accepted {
            return idx;
        }

        let noise = self.lookup.noise();
        let strength = BLEND_STRENGTH * (beta as f32) / saliency;
        let blended = noise.diffuse(pixel, c2, strength * 0.5, x, y);
        let mut candidate = self.pick(blended, pos);
        let mut c3 = self.lookup.color(candidate);

        if chroma_diff(pixel, c3) > self.regime.margin * accepted
            || luma_diff(pixel, c3) > accepted * self.escalation
        {
            let blended = noise.diffuse(pixel, c2, strength, x, y);
            candidate = self.pick(blended, pos);
            c3 = self.lookup.color(candidate);
        }

        let luma = luma_diff(pixel, c3);
        if self.regime.window < 16
            && self.palette_len() > 4
            && saliency < LOW_SALIENCY
            && luma > self.regime.margin - 1.0
        {
            return idx;
        }
        if beta > 1.0 && luma > self.regime.window as f64 {
            return idx;
        }
        candidate
    }

    fn dither_pixel(&mut self, x: usize, y: usize) {
        let bidx = x + y * self.input.width;
        let pixel = self.input.pixels[bidx];

        let mut acc = ErrorBox::from(pixel);
        let mut max_err = (self.regime.window - 1) as f32;
        self.window.for_each_weighted(&self.weights_by_len, |eb, w| {
            for j in 0..4 {
                acc.0[j] += eb.0[j] * w;
                if acc.0[j] > max_err {
                    max_err = acc.0[j];
                }
            }
        });
        let clamped = acc.to_argb();

        let saliency = self.input.saliencies.map(|s| s[bidx]);
        let palette_len = self.palette_len();
        let mut refined = false;
        let mut idx;
        match saliency {
            Some(s)
                if !self.regime.sorted
                    && (!self.input.has_alpha || pixel.a() < clamped.a()) =>
            {
                idx = self.pick(clamped, bidx);
                idx = self.refine(pixel, idx, s, self.regime.beta, x, y);
                refined = true;
            }
            _ if palette_len <= 32 && clamped.a() > 0xF0 => {
                let offset = self.input.bucket.index(clamped);
                idx = match self.bucket_cache[offset] {
                    Some(cached) => cached,
                    None => {
                        let picked = self.pick(clamped, bidx);
                        self.bucket_cache[offset] = Some(picked);
                        picked
                    }
                };
                if let Some(s) = saliency.filter(|s| *s > SALIENCY_BAND.0 && *s < SALIENCY_BAND.1) {
                    let target = self.lookup.color(idx);
                    let blended = self.lookup.noise().diffuse(pixel, target, BLEND_STRENGTH / s, x, y);
                    idx = self.pick(blended, bidx);
                }
            }
            _ => idx = self.pick(clamped, bidx),
        }

        if !refined {
            let c2 = self.lookup.color(idx);
            let (luma, chroma) = (luma_diff(pixel, c2), chroma_diff(pixel, c2));
            if luma > self.accepted_diff() {
                if let Some(s) = saliency {
                    idx = self.refine(pixel, idx, s, RETRY_BETA, x, y);
                } else if luma > 3.0 && chroma > 3.0 {
                    let blended = self.lookup.noise().diffuse(pixel, c2, BLEND_STRENGTH, x, y);
                    idx = self.pick(blended, bidx);
                }
            }
        }
        self.indices[bidx] = idx;

        let chosen = self.lookup.color(idx);
        let mut error = ErrorBox::residual(clamped, chosen);
        let y_diff = if self.regime.sorted {
            luma_key(clamped, chosen)
        } else {
            1.0
        };

        let noise = self.lookup.noise();
        let threshold = self.regime.threshold;
        let diffuse = noise.spatial_threshold(bidx & POSITION_MASK) > threshold;
        let illusion = !diffuse
            && noise.spatial_threshold(((y_diff * 4096.0) as usize) & POSITION_MASK) > threshold;

        if palette_len > 2 {
            let dither_max = self.regime.dither_max as f32;
            let compression = if diffuse {
                Compression::Diffuse
            } else if illusion {
                Compression::Illusion
            } else {
                Compression::Damp
            };
            for e in &mut error.0[..3] {
                if e.abs() >= dither_max {
                    *e = compression.apply(*e, max_err, y_diff, dither_max);
                }
            }
        }

        self.window.push(error, y_diff);
    }
}
