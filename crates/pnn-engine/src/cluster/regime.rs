//! Named merge regimes for the perceptual clusterer.
//!
//! The regime decides how bin counts are pre-scaled before merging and how
//! `ratio` mixes plain Lab distance with the CIEDE2000 terms. The boundaries
//! are empirically tuned and kept here as constants so they can be audited
//! in one place.

/// Palettes below this size use [`MergeRegime::SmallPalette`].
pub const SMALL_PALETTE_LIMIT: usize = 16;
/// Palettes below this size are "mid-sized" for regime and ratio selection.
pub const MID_PALETTE_LIMIT: usize = 64;
/// Mid-sized palettes with `proportional` outside
/// `PROPORTIONAL_FLOOR..=PROPORTIONAL_CEILING` merge with unscaled counts.
pub const PROPORTIONAL_FLOOR: f64 = 0.022;
pub const PROPORTIONAL_CEILING: f64 = 0.5;
/// Weights below this switch to three-quarter-power counts.
pub const SPARSE_WEIGHT: f64 = 0.001;
/// Open weight band that also switches to three-quarter-power counts.
pub const WEIGHT_BAND: (f64, f64) = (0.0015, 0.0022);
/// Upper bound of `weight`.
pub const MAX_WEIGHT: f64 = 0.9;

const MID_RATIO_EXP: f64 = 3.845;
const DISTINCT_RATIO_POW: f64 = 1.05;
const BIN_RATIO_POW: f64 = 2.31;
const SMALL_PALETTE_RATIO_BOOST: f64 = 0.5;

/// `max_colors² / bins`
pub fn proportional(max_colors: usize, bins: usize) -> f64 {
    let n = max_colors as f64;
    n * n / bins.max(1) as f64
}

/// `min(0.9, max_colors / bins)`, the palette-to-histogram density that
/// also tunes the curve ditherer.
pub fn weight(max_colors: usize, bins: usize) -> f64 {
    (max_colors as f64 / bins.max(1) as f64).min(MAX_WEIGHT)
}

/// How bin counts are rescaled before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountScale {
    Identity,
    Sqrt,
    FloorSqrt,
    FloorThreeQuarter,
}

impl CountScale {
    #[inline]
    pub fn apply(self, count: f64) -> f64 {
        match self {
            CountScale::Identity => count,
            CountScale::Sqrt => count.sqrt(),
            CountScale::FloorSqrt => count.sqrt().floor().max(1.0),
            CountScale::FloorThreeQuarter => count.powf(0.75).floor().max(1.0),
        }
    }
}

/// Merge strategy for perceptual clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRegime {
    /// Fewer than 16 colors: raw counts, CIEDE2000-heavy ratio.
    SmallPalette,
    /// Mid-sized palette far from the histogram density sweet spot.
    Linear,
    /// Default: square-root counts favor merging small bins.
    SquareRoot,
    /// Very sparse palettes relative to the histogram.
    ThreeQuarterPower,
}

impl MergeRegime {
    pub fn select(max_colors: usize, bins: usize) -> Self {
        let proportional = proportional(max_colors, bins);
        let weight = weight(max_colors, bins);
        if max_colors < SMALL_PALETTE_LIMIT {
            MergeRegime::SmallPalette
        } else if max_colors < MID_PALETTE_LIMIT
            && (proportional < PROPORTIONAL_FLOOR || proportional > PROPORTIONAL_CEILING)
        {
            MergeRegime::Linear
        } else if weight < SPARSE_WEIGHT || (weight > WEIGHT_BAND.0 && weight < WEIGHT_BAND.1) {
            MergeRegime::ThreeQuarterPower
        } else {
            MergeRegime::SquareRoot
        }
    }

    pub fn count_scale(self) -> CountScale {
        match self {
            MergeRegime::SmallPalette | MergeRegime::Linear => CountScale::Identity,
            MergeRegime::SquareRoot => CountScale::FloorSqrt,
            MergeRegime::ThreeQuarterPower => CountScale::FloorThreeQuarter,
        }
    }

    fn scales_counts(self) -> bool {
        self.count_scale() != CountScale::Identity
    }

    /// Share of the merge cost taken by the CIEDE2000 terms.
    ///
    /// `distinct` is the number of distinct pixel values in the image.
    /// The small-palette boost may push the result above 1.
    pub fn ratio(self, max_colors: usize, bins: usize, distinct: usize) -> f64 {
        let n = max_colors as f64;
        let distinct = distinct.max(1) as f64;
        let mut ratio = if self != MergeRegime::Linear && max_colors < MID_PALETTE_LIMIT {
            (proportional(max_colors, bins) + n * MID_RATIO_EXP.exp() / distinct).min(1.0)
        } else if self.scales_counts() {
            (n.powf(DISTINCT_RATIO_POW) / distinct).min(1.0)
        } else {
            (n.powf(BIN_RATIO_POW) / bins.max(1) as f64).min(1.0)
        };
        if self == MergeRegime::SmallPalette {
            ratio += SMALL_PALETTE_RATIO_BOOST;
        }
        ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_palette_regime() {
        assert_eq!(MergeRegime::select(8, 5000), MergeRegime::SmallPalette);
        assert_eq!(MergeRegime::select(15, 20), MergeRegime::SmallPalette);
    }

    #[test]
    fn test_mid_palette_outside_band_is_linear() {
        // 32² / 100_000 = 0.01024 < 0.022
        assert_eq!(MergeRegime::select(32, 100_000), MergeRegime::Linear);
        // 32² / 1000 = 1.024 > 0.5
        assert_eq!(MergeRegime::select(32, 1000), MergeRegime::Linear);
    }

    #[test]
    fn test_mid_palette_inside_band_scales_counts() {
        // 32² / 10_000 = 0.1024, weight 0.0032
        assert_eq!(MergeRegime::select(32, 10_000), MergeRegime::SquareRoot);
    }

    #[test]
    fn test_sparse_weight_uses_three_quarter_power() {
        // weight = 64 / 65536 < 0.001
        assert_eq!(MergeRegime::select(64, 65_536), MergeRegime::ThreeQuarterPower);
        // weight = 100 / 50_000 = 0.002 inside the band
        assert_eq!(MergeRegime::select(100, 50_000), MergeRegime::ThreeQuarterPower);
        // weight = 256 / 20_000 = 0.0128
        assert_eq!(MergeRegime::select(256, 20_000), MergeRegime::SquareRoot);
    }

    #[test]
    fn test_small_palette_ratio_is_boosted() {
        let ratio = MergeRegime::SmallPalette.ratio(8, 10_000, 50_000);
        // proportional 0.0064 + 8·e^3.845/50000 ≈ 0.0137, plus 0.5
        assert!((ratio - 0.5137).abs() < 1e-3, "ratio = {ratio}");
    }

    #[test]
    fn test_ratio_caps_at_one_before_boost() {
        let ratio = MergeRegime::SmallPalette.ratio(8, 10, 10);
        assert!((ratio - 1.5).abs() < 1e-12, "ratio = {ratio}");
        let ratio = MergeRegime::Linear.ratio(256, 100, 100);
        assert_eq!(ratio, 1.0);
    }

    #[test]
    fn test_count_scales_floor_and_never_zero() {
        assert_eq!(CountScale::FloorSqrt.apply(10.0), 3.0);
        assert_eq!(CountScale::FloorThreeQuarter.apply(16.0), 8.0);
        assert_eq!(CountScale::FloorSqrt.apply(1.0), 1.0);
        assert_eq!(CountScale::Identity.apply(7.0), 7.0);
        assert!((CountScale::Sqrt.apply(2.0) - 2f64.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn test_weight_is_capped() {
        assert_eq!(weight(256, 10), MAX_WEIGHT);
        assert!((weight(16, 1600) - 0.01).abs() < 1e-15);
    }
}
