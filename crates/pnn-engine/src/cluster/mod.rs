//! Pairwise-nearest-neighbor palette clustering.
//!
//! Pixels are hashed into a 16-bit histogram ([`BucketMode`]); the non-empty
//! buckets are compacted into a linked list of bins and merged, cheapest
//! pair first, until `max_colors` remain.
//!
//! # Merge loop
//!
//! Every bin caches its forward nearest neighbor (`nn`) and the cost of
//! merging with it (`err`). The heap holds one entry per bin keyed by that
//! cost. Merging changes bins in place, so an entry reaching the top is
//! checked before use:
//!
//! - the bin was deleted: drop the entry;
//! - the bin or its neighbor changed after `err` was computed: recompute
//!   and reinsert;
//! - otherwise merge it with its neighbor. The surviving bin stays in the
//!   heap with its old key and is refreshed the next time it surfaces.
//!
//! Each merge bumps the merge clock; `tm` records when a bin's `err` was
//! computed and `mtm` when the bin last changed.

mod bin;
mod heap;
pub mod regime;
mod space;

use crate::api::Quality;
use crate::color::{Argb, LabCache};

pub use bin::BucketMode;
pub use regime::{CountScale, MergeRegime};

use bin::{PnnBin, BUCKETS, DELETED, NO_NEIGHBOR};
use heap::MergeHeap;
use space::{BinSpace, LabSpace, RgbSpace};

/// Inputs that shape one clustering run.
#[derive(Debug, Clone, Copy)]
pub struct ClusterParams {
    pub max_colors: usize,
    pub quality: Quality,
    pub bucket: BucketMode,
    /// Canonical transparent color, if the image has one.
    pub transparent: Option<Argb>,
}

/// Result of clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Sorted palette, at most `max_colors` entries.
    pub palette: Vec<Argb>,
    /// Non-empty histogram bins before merging.
    pub bins: usize,
    /// `min(0.9, max_colors / bins)`.
    pub weight: f64,
    /// CIEDE2000 share of the merge cost; 0 for [`Quality::Standard`].
    pub ratio: f64,
    /// Regime in effect; `None` for [`Quality::Standard`].
    pub regime: Option<MergeRegime>,
}

/// Cluster `pixels` down to at most `params.max_colors` colors.
///
/// `labs` must be fresh for this image; it is filled as a side effect and
/// reused by the lookups that follow.
pub fn cluster(pixels: &[Argb], params: &ClusterParams, labs: &mut LabCache) -> Clustering {
    match params.quality {
        Quality::Standard => {
            let mut space = RgbSpace;
            let mut bins = build_histogram(pixels, params.bucket, &mut space);
            let count = bins.len();
            scale_counts(&mut bins, CountScale::Sqrt);
            merge(&mut bins, params.max_colors, &space);
            Clustering {
                palette: fill_palette(&bins, &space, params.transparent),
                bins: count,
                weight: regime::weight(params.max_colors, count),
                ratio: 0.0,
                regime: None,
            }
        }
        Quality::High => {
            let mut space = LabSpace::new(labs);
            let mut bins = build_histogram(pixels, params.bucket, &mut space);
            let count = bins.len();
            let regime = MergeRegime::select(params.max_colors, count);
            space.ratio = regime.ratio(params.max_colors, count, space.labs.len());
            tracing::debug!(
                bins = count,
                regime = ?regime,
                ratio = space.ratio,
                "perceptual clustering"
            );
            scale_counts(&mut bins, regime.count_scale());
            merge(&mut bins, params.max_colors, &space);
            Clustering {
                palette: fill_palette(&bins, &space, params.transparent),
                bins: count,
                weight: regime::weight(params.max_colors, count),
                ratio: space.ratio,
                regime: Some(regime),
            }
        }
    }
}

/// Histogram `pixels`, drop empty buckets, turn sums into means and link the
/// survivors in bucket order.
fn build_histogram<S: BinSpace>(pixels: &[Argb], bucket: BucketMode, space: &mut S) -> Vec<PnnBin> {
    let mut bins = vec![PnnBin::default(); BUCKETS];
    for &pixel in pixels {
        space.accumulate(&mut bins[bucket.index(pixel)], pixel);
    }
    bins.retain(|b| b.cnt > 0.0);

    let last = bins.len().saturating_sub(1);
    for (i, bin) in bins.iter_mut().enumerate() {
        bin.normalize();
        bin.fw = if i < last { i + 1 } else { 0 };
        bin.bk = i.saturating_sub(1);
    }
    bins
}

fn scale_counts(bins: &mut [PnnBin], scale: CountScale) {
    for bin in bins {
        bin.cnt = scale.apply(bin.cnt);
    }
}

/// Recompute the forward nearest neighbor of `bins[idx]`.
fn find_nn<S: BinSpace>(bins: &mut [PnnBin], idx: usize, space: &S) {
    let bin1 = bins[idx];
    let mut nn = 0;
    let mut err = NO_NEIGHBOR;
    let mut i = bin1.fw;
    while i != 0 {
        let cost = space.merge_cost(&bin1, &bins[i], err);
        // NaN compares false and is skipped.
        if cost < err {
            err = cost;
            nn = i;
        }
        i = bins[i].fw;
    }
    bins[idx].err = err;
    bins[idx].nn = nn;
}

fn merge<S: BinSpace>(bins: &mut [PnnBin], max_colors: usize, space: &S) {
    let extbins = bins.len().saturating_sub(max_colors);
    if extbins == 0 {
        return;
    }

    let mut heap = MergeHeap::with_capacity(bins.len());
    for i in 0..bins.len() {
        find_nn(bins, i, space);
        heap.push(i, bins[i].err);
    }

    let mut merges: u32 = 0;
    while (merges as usize) < extbins {
        let Some(b1) = next_fresh(bins, &mut heap, merges, space) else {
            break;
        };

        let nn = bins[b1].nn;
        let nb = bins[nn];
        bins[b1].absorb(&nb);
        merges += 1;
        bins[b1].mtm = merges;

        bins[nb.bk].fw = nb.fw;
        bins[nb.fw].bk = nb.bk;
        bins[nn].mtm = DELETED;
    }
    tracing::debug!(merges, remaining = bins.len() - merges as usize, "merged bins");
}

/// Peek until the top of the heap holds a bin whose cached cost is current.
fn next_fresh<S: BinSpace>(
    bins: &mut [PnnBin],
    heap: &mut MergeHeap,
    merges: u32,
    space: &S,
) -> Option<usize> {
    loop {
        let b1 = heap.peek()?;
        let tb = bins[b1];
        if tb.tm >= tb.mtm && bins[tb.nn].mtm <= tb.tm {
            // Every remaining cost was unusable.
            if tb.err >= NO_NEIGHBOR {
                return None;
            }
            return Some(b1);
        }
        heap.pop();
        if !tb.is_deleted() {
            find_nn(bins, b1, space);
            bins[b1].tm = merges;
            heap.push(b1, bins[b1].err);
        }
    }
}

/// Walk the live bins in link order, move the transparent color to the
/// front and sort.
fn fill_palette<S: BinSpace>(bins: &[PnnBin], space: &S, transparent: Option<Argb>) -> Vec<Argb> {
    let mut palette = Vec::new();
    if bins.is_empty() {
        return palette;
    }
    let mut i = 0;
    loop {
        let color = space.emit(&bins[i]);
        palette.push(color);
        if transparent == Some(color) {
            let k = palette.len() - 1;
            palette.swap(0, k);
        }
        i = bins[i].fw;
        if i == 0 {
            break;
        }
    }
    palette.sort_unstable();
    palette
}
