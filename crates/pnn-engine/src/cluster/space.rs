//! Color spaces the clusterer can run in.
//!
//! A [`BinSpace`] decides what a bin accumulates, what merging two bins
//! costs, and how a finished bin turns back into a palette color. The
//! clusterer is generic over it, so the choice is made once per run.

use crate::color::ciede2000::{chroma_term, hue_term, lightness_term, rotation_term};
use crate::color::{to_channel, to_rgb, Argb, Lab, LabCache};

use super::bin::PnnBin;

pub(crate) trait BinSpace {
    /// Add one pixel to a bin's running sums.
    fn accumulate(&mut self, bin: &mut PnnBin, pixel: Argb);

    /// Cost of merging `b2` into `b1`.
    ///
    /// Implementations may stop early once the cost reaches `bound`; any
    /// value `>= bound` is treated as "not better".
    fn merge_cost(&self, b1: &PnnBin, b2: &PnnBin, bound: f64) -> f64;

    /// Palette color for a finished bin.
    fn emit(&self, bin: &PnnBin) -> Argb;
}

#[inline]
fn sqr(v: f64) -> f64 {
    v * v
}

/// Squared RGBA distance scaled by the merged count.
#[derive(Debug, Default)]
pub(crate) struct RgbSpace;

impl BinSpace for RgbSpace {
    fn accumulate(&mut self, bin: &mut PnnBin, pixel: Argb) {
        bin.alpha += pixel.a() as f64;
        bin.channels[0] += pixel.r() as f64;
        bin.channels[1] += pixel.g() as f64;
        bin.channels[2] += pixel.b() as f64;
        bin.cnt += 1.0;
    }

    fn merge_cost(&self, b1: &PnnBin, b2: &PnnBin, _bound: f64) -> f64 {
        let dist = sqr(b2.alpha - b1.alpha)
            + sqr(b2.channels[0] - b1.channels[0])
            + sqr(b2.channels[1] - b1.channels[1])
            + sqr(b2.channels[2] - b1.channels[2]);
        dist * (b1.cnt * b2.cnt) / (b1.cnt + b2.cnt)
    }

    fn emit(&self, bin: &PnnBin) -> Argb {
        Argb::new(
            to_channel(bin.alpha),
            to_channel(bin.channels[0]),
            to_channel(bin.channels[1]),
            to_channel(bin.channels[2]),
        )
    }
}

/// Lab distance blended with the CIEDE2000 terms by `ratio`.
///
/// Terms are added one at a time; each stage bails out as soon as the
/// running cost reaches the bound.
pub(crate) struct LabSpace<'c> {
    pub labs: &'c mut LabCache,
    pub ratio: f64,
}

impl<'c> LabSpace<'c> {
    pub fn new(labs: &'c mut LabCache) -> Self {
        Self { labs, ratio: 1.0 }
    }
}

fn bin_lab(bin: &PnnBin) -> Lab {
    Lab::new(bin.alpha, bin.channels[0], bin.channels[1], bin.channels[2])
}

impl BinSpace for LabSpace<'_> {
    fn accumulate(&mut self, bin: &mut PnnBin, pixel: Argb) {
        let lab = self.labs.get(pixel);
        bin.alpha += pixel.a() as f64;
        bin.channels[0] += lab.l;
        bin.channels[1] += lab.a;
        bin.channels[2] += lab.b;
        bin.cnt += 1.0;
    }

    fn merge_cost(&self, b1: &PnnBin, b2: &PnnBin, bound: f64) -> f64 {
        let n = (b1.cnt * b2.cnt) / (b1.cnt + b2.cnt);
        if n >= bound {
            return n;
        }
        let (lab1, lab2) = (bin_lab(b1), bin_lab(b2));
        let plain = (1.0 - self.ratio) * n;
        let perceptual = self.ratio * n;

        let mut cost = n * sqr(lab2.alpha - lab1.alpha) / 1.7f64.exp();
        if cost >= bound {
            return cost;
        }
        for delta in [lab2.l - lab1.l, lab2.a - lab1.a, lab2.b - lab1.b] {
            cost += plain * sqr(delta);
            if cost >= bound {
                return cost;
            }
        }

        cost += perceptual * sqr(lightness_term(&lab1, &lab2));
        if cost >= bound {
            return cost;
        }
        let chroma = chroma_term(&lab1, &lab2);
        cost += perceptual * sqr(chroma.delta);
        if cost >= bound {
            return cost;
        }
        let hue = hue_term(&lab1, &lab2, &chroma);
        cost += perceptual * sqr(hue.delta);
        if cost >= bound {
            return cost;
        }
        cost + perceptual * rotation_term(&chroma, &hue)
    }

    fn emit(&self, bin: &PnnBin) -> Argb {
        let alpha = bin.alpha.clamp(0.0, 255.0).trunc();
        to_rgb(Lab::new(alpha, bin.channels[0], bin.channels[1], bin.channels[2]))
    }
}
