//! Pixel to palette index lookup.
//!
//! Two policies share one [`PaletteLookup`]:
//!
//! - [`nearest`](PaletteLookup::nearest): full scan with alpha-first early
//!   reject, distance chosen once per run from palette size and
//!   transparency;
//! - [`closest`](PaletteLookup::closest): tracks the two best candidates and
//!   splits near-ties between them with the spatial threshold mask, so that
//!   flat regions between two palette colors come out as an ordered pattern.
//!
//! Both memoize per distinct pixel. A lookup is built for one palette and one
//! run, and dropped with it.

use std::collections::HashMap;

use crate::api::Quality;
use crate::color::ciede2000::{chroma_term, hue_term, lightness_term, rotation_term};
use crate::color::yuv::LUMA;
use crate::color::{Argb, Lab, LabCache};
use crate::dither::NoiseDisperser;

use super::Palette;

/// Spatial threshold above which the closest policy defers to nearest while
/// luma weighting is active.
const LUMA_DEFER_THRESHOLD: i8 = -88;

/// Mask for positions fed to [`NoiseDisperser::spatial_threshold`].
pub(crate) const POSITION_MASK: usize = 4095;

/// Offset of the sample that splits near-ties, half a 64x64 tile across and
/// down from the one that decides deferral.
const SPLIT_OFFSET: usize = 32 * 64 + 32;

/// Per-channel weights for RGB distances (`PR`, `PG`, `PB`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelWeights {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ChannelWeights {
    pub const LUMA: Self = Self {
        r: LUMA[0],
        g: LUMA[1],
        b: LUMA[2],
    };
    pub const UNIFORM: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Luma weights, or uniform ones once alpha carries meaning.
    pub fn for_image(has_semi_transparency: bool) -> Self {
        if has_semi_transparency {
            Self::UNIFORM
        } else {
            Self::LUMA
        }
    }

    pub fn is_luma(&self) -> bool {
        *self == Self::LUMA
    }
}

/// Facts about the image the lookup needs.
#[derive(Debug, Clone, Copy)]
pub struct LookupPolicy {
    pub quality: Quality,
    pub alpha_threshold: u8,
    pub transparent: Option<Argb>,
    pub has_semi_transparency: bool,
    pub weights: ChannelWeights,
}

/// Distance used by [`PaletteLookup::nearest`], fixed per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NearestMetric {
    SquaredRgb,
    WeightedRgb,
    SplitLab,
    Ciede2000,
}

impl NearestMetric {
    fn select(policy: &LookupPolicy, palette_len: usize) -> Self {
        match policy.quality {
            Quality::Standard => NearestMetric::SquaredRgb,
            Quality::High if palette_len <= 4 => NearestMetric::SquaredRgb,
            Quality::High if policy.has_semi_transparency => NearestMetric::WeightedRgb,
            Quality::High if palette_len > 32 => NearestMetric::SplitLab,
            Quality::High => NearestMetric::Ciede2000,
        }
    }
}

/// Best and second-best palette entries for one pixel.
#[derive(Debug, Clone, Copy)]
struct Candidates {
    best: u16,
    second: u16,
    best_err: f64,
    second_err: f64,
}

#[inline]
fn sqr(v: f64) -> f64 {
    v * v
}

#[inline]
fn channel_delta(a: u8, b: u8) -> f64 {
    a as f64 - b as f64
}

/// Memoizing palette lookup for one run.
pub struct PaletteLookup<'n, N: NoiseDisperser + ?Sized> {
    palette: Palette,
    policy: LookupPolicy,
    metric: NearestMetric,
    labs: LabCache,
    nearest: HashMap<Argb, u16>,
    closest: HashMap<Argb, Candidates>,
    noise: &'n N,
}

impl<'n, N: NoiseDisperser + ?Sized> PaletteLookup<'n, N> {
    /// `labs` carries the conversions already done while clustering.
    pub fn new(palette: Palette, policy: LookupPolicy, labs: LabCache, noise: &'n N) -> Self {
        let metric = NearestMetric::select(&policy, palette.len());
        tracing::debug!(palette = palette.len(), metric = ?metric, "palette lookup");
        Self {
            palette,
            policy,
            metric,
            labs,
            nearest: HashMap::new(),
            closest: HashMap::new(),
            noise,
        }
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    pub fn color(&self, idx: u16) -> Argb {
        self.palette.color(idx as usize)
    }

    #[inline]
    pub fn policy(&self) -> &LookupPolicy {
        &self.policy
    }

    #[inline]
    pub fn noise(&self) -> &'n N {
        self.noise
    }

    /// Memoized Lab value of `pixel`.
    #[inline]
    pub fn lab(&mut self, pixel: Argb) -> Lab {
        self.labs.get(pixel)
    }

    pub fn into_palette(self) -> Palette {
        self.palette
    }

    fn below_threshold(&self, pixel: Argb) -> bool {
        pixel.a() <= self.policy.alpha_threshold
    }

    /// Slot 0 is reserved for the transparent color.
    fn has_reserved_slot(&self) -> bool {
        self.palette.len() > 2 && self.policy.transparent.is_some()
    }

    /// Index of the palette entry nearest to `pixel`.
    pub fn nearest(&mut self, pixel: Argb) -> u16 {
        let pixel = if self.below_threshold(pixel) {
            self.policy.transparent.unwrap_or(Argb::TRANSPARENT)
        } else {
            pixel
        };
        if let Some(&idx) = self.nearest.get(&pixel) {
            return idx;
        }

        let start = if self.has_reserved_slot() && !self.below_threshold(pixel) {
            1
        } else {
            0
        };
        let lab1 = self.labs.get(pixel);
        let mut best = start;
        let mut min_dist = f64::MAX;
        for i in start..self.palette.len() {
            let candidate = self.palette.color(i);
            let mut dist = sqr(channel_delta(candidate.a(), pixel.a()));
            if dist > min_dist {
                continue;
            }
            dist += self.color_distance(pixel, &lab1, i, min_dist - dist);
            if dist < min_dist {
                min_dist = dist;
                best = i;
            }
        }

        let idx = best as u16;
        self.nearest.insert(pixel, idx);
        idx
    }

    /// Color part of the nearest distance; may stop early past `budget`.
    fn color_distance(&self, pixel: Argb, lab1: &Lab, i: usize, budget: f64) -> f64 {
        let candidate = self.palette.color(i);
        let dr = channel_delta(candidate.r(), pixel.r());
        let dg = channel_delta(candidate.g(), pixel.g());
        let db = channel_delta(candidate.b(), pixel.b());
        match self.metric {
            NearestMetric::SquaredRgb => sqr(dr) + sqr(dg) + sqr(db),
            NearestMetric::WeightedRgb => {
                let w = self.policy.weights;
                w.r * sqr(dr) + w.g * sqr(dg) + w.b * sqr(db)
            }
            NearestMetric::SplitLab => {
                let lab2 = self.palette.lab(i);
                (lab2.l - lab1.l).abs() + (lab2.a - lab1.a).hypot(lab2.b - lab1.b)
            }
            NearestMetric::Ciede2000 => {
                let lab2 = self.palette.lab(i);
                let mut dist = sqr(lightness_term(lab1, &lab2));
                if dist > budget {
                    return dist;
                }
                let chroma = chroma_term(lab1, &lab2);
                dist += sqr(chroma.delta);
                if dist > budget {
                    return dist;
                }
                let hue = hue_term(lab1, &lab2, &chroma);
                dist += sqr(hue.delta);
                if dist > budget {
                    return dist;
                }
                dist + rotation_term(&chroma, &hue)
            }
        }
    }

    fn candidates(&mut self, pixel: Argb) -> Candidates {
        if let Some(&c) = self.closest.get(&pixel) {
            return c;
        }
        let lab1 = self.labs.get(pixel);
        let mut c = Candidates {
            best: 0,
            second: 0,
            best_err: f64::MAX,
            second_err: f64::MAX,
        };
        for i in 0..self.palette.len() {
            let err = match self.policy.quality {
                Quality::High => {
                    let lab2 = self.palette.lab(i);
                    (lab2.alpha - lab1.alpha).abs()
                        + (lab2.l - lab1.l).abs()
                        + (lab2.a - lab1.a).abs()
                        + (lab2.b - lab1.b).abs()
                }
                Quality::Standard => {
                    let c2 = self.palette.color(i);
                    channel_delta(c2.a(), pixel.a()).abs()
                        + channel_delta(c2.r(), pixel.r()).abs()
                        + channel_delta(c2.g(), pixel.g()).abs()
                        + channel_delta(c2.b(), pixel.b()).abs()
                }
            };
            if err < c.best_err {
                c.second = c.best;
                c.second_err = c.best_err;
                c.best = i as u16;
                c.best_err = err;
            } else if err < c.second_err {
                c.second = i as u16;
                c.second_err = err;
            }
        }
        if c.second_err == f64::MAX {
            c.best_err = 0.0;
        }
        self.closest.insert(pixel, c);
        c
    }

    /// Index of one of the two palette entries closest to `pixel`.
    ///
    /// `position` is the pixel's offset in the image. It picks two spatial
    /// thresholds: one decides whether luma-weighted images defer to
    /// [`nearest`](Self::nearest), the other splits near-ties.
    pub fn closest(&mut self, pixel: Argb, position: usize) -> u16 {
        if self.below_threshold(pixel) {
            return self.nearest(pixel);
        }
        let c = self.candidates(pixel);

        let threshold = self.noise.spatial_threshold(position & POSITION_MASK);
        if self.policy.weights.is_luma() && threshold > LUMA_DEFER_THRESHOLD {
            return self.nearest(pixel);
        }

        let split = self
            .noise
            .spatial_threshold((position + SPLIT_OFFSET) & POSITION_MASK);
        let frac = (split as f64 + 128.0) / 256.0;
        let (idx, err) = if c.best_err == 0.0 || frac * (c.best_err + c.second_err) <= c.second_err {
            (c.best, c.best_err)
        } else {
            (c.second, c.second_err)
        };

        if err >= self.palette.len() as f64 {
            return self.nearest(pixel);
        }
        if idx == 0 && self.has_reserved_slot() {
            return self.nearest(pixel);
        }
        idx
    }
}
