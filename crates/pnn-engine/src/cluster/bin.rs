//! Histogram bins and bucket hashing.

use crate::color::Argb;

/// Marks a bin that has been absorbed by a merge.
pub(crate) const DELETED: u32 = 0xFFFF;

/// Cost stored for a bin with no forward neighbor.
pub(crate) const NO_NEIGHBOR: f64 = 1e100;

/// Number of histogram buckets (16-bit bucket index).
pub(crate) const BUCKETS: usize = 1 << 16;

/// How pixels are hashed into the 16-bit histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketMode {
    /// 4 bits per channel including alpha.
    SemiTransparent,
    /// Top bit flags alpha > 0x80, then 5 bits per color channel.
    Transparent,
    /// RGB565.
    Opaque,
}

impl BucketMode {
    pub fn for_image(has_semi_transparency: bool, has_transparent: bool) -> Self {
        if has_semi_transparency {
            BucketMode::SemiTransparent
        } else if has_transparent {
            BucketMode::Transparent
        } else {
            BucketMode::Opaque
        }
    }

    #[inline]
    pub fn index(self, pixel: Argb) -> usize {
        let (a, r, g, b) = (
            pixel.a() as usize,
            pixel.r() as usize,
            pixel.g() as usize,
            pixel.b() as usize,
        );
        match self {
            BucketMode::SemiTransparent => {
                (a & 0xF0) << 8 | (r & 0xF0) << 4 | (g & 0xF0) | (b >> 4)
            }
            BucketMode::Transparent => (a & 0x80) << 8 | (r & 0xF8) << 7 | (g & 0xF8) << 2 | (b >> 3),
            BucketMode::Opaque => (r & 0xF8) << 8 | (g & 0xFC) << 3 | (b >> 3),
        }
    }
}

/// One histogram bucket, later one cluster.
///
/// `channels` holds the R/G/B or L/A/B means depending on the color space
/// the clusterer runs in. Live bins form a doubly linked list through
/// `fw`/`bk`; index 0 is the head and `fw == 0` terminates it.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PnnBin {
    pub alpha: f64,
    pub channels: [f64; 3],
    pub cnt: f64,
    pub nn: usize,
    pub fw: usize,
    pub bk: usize,
    /// Merge count when `err` was last computed.
    pub tm: u32,
    /// Merge count when this bin last changed, or [`DELETED`].
    pub mtm: u32,
    pub err: f64,
}

impl PnnBin {
    /// Turn accumulated sums into means.
    pub fn normalize(&mut self) {
        let d = 1.0 / self.cnt;
        self.alpha *= d;
        for c in &mut self.channels {
            *c *= d;
        }
    }

    /// Count-weighted average of `self` and `other`.
    pub fn absorb(&mut self, other: &PnnBin) {
        let (n1, n2) = (self.cnt, other.cnt);
        let d = 1.0 / (n1 + n2);
        self.alpha = d * (n1 * self.alpha + n2 * other.alpha);
        for (c, o) in self.channels.iter_mut().zip(other.channels) {
            *c = d * (n1 * *c + n2 * o);
        }
        self.cnt += other.cnt;
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.mtm == DELETED
    }
}
