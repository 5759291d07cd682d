//! Default noise disperser backed by a 64x64 blue noise tile.
//!
//! The tile is built with Ulichney's void-and-cluster method on a torus, so
//! it tiles seamlessly and carries little low-frequency energy. Generation
//! runs once per process on first use.

use std::sync::OnceLock;

use super::NoiseDisperser;
use crate::color::{to_channel, Argb};

const SIZE: usize = 64;
const CELLS: usize = SIZE * SIZE;
/// Gaussian spread of the density filter, in cells.
const SIGMA: f64 = 1.5;
/// One seed point per this many cells in the initial pattern.
const SEED_DENSITY: u32 = 10;

static THRESHOLDS: OnceLock<Box<[i8; CELLS]>> = OnceLock::new();

/// 64x64 signed threshold tile, row-major. Every value in `-128..=127`
/// appears exactly 16 times.
pub fn thresholds() -> &'static [i8; CELLS] {
    THRESHOLDS.get_or_init(void_and_cluster)
}

/// Integer avalanche used to pick the seed pattern.
fn mix(idx: usize) -> u32 {
    let mut hash = idx as u32;
    hash = hash.wrapping_mul(0x85eb_ca6b);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0xc2b2_ae35);
    hash ^= hash >> 16;
    hash
}

/// Running density of set points, filtered by a wrapped Gaussian.
struct Density {
    kernel: Vec<f64>,
    energy: Vec<f64>,
    set: Vec<bool>,
}

impl Density {
    fn new() -> Self {
        let kernel = (0..CELLS)
            .map(|i| {
                let wrap = |d: usize| d.min(SIZE - d) as f64;
                let (dy, dx) = (wrap(i / SIZE), wrap(i % SIZE));
                (-(dx * dx + dy * dy) / (2.0 * SIGMA * SIGMA)).exp()
            })
            .collect();
        Self {
            kernel,
            energy: vec![0.0; CELLS],
            set: vec![false; CELLS],
        }
    }

    fn toggle(&mut self, at: usize, on: bool) {
        self.set[at] = on;
        let sign = if on { 1.0 } else { -1.0 };
        let (py, px) = (at / SIZE, at % SIZE);
        for (y, row) in self.energy.chunks_exact_mut(SIZE).enumerate() {
            let dy = (y + SIZE - py) & (SIZE - 1);
            let kernel = &self.kernel[dy * SIZE..(dy + 1) * SIZE];
            for (x, e) in row.iter_mut().enumerate() {
                *e += sign * kernel[(x + SIZE - px) & (SIZE - 1)];
            }
        }
    }

    /// Set point with the highest density.
    fn tightest_cluster(&self) -> usize {
        self.extreme(true, |a, b| a > b)
    }

    /// Empty cell with the lowest density.
    fn largest_void(&self) -> usize {
        self.extreme(false, |a, b| a < b)
    }

    fn extreme(&self, among_set: bool, better: impl Fn(f64, f64) -> bool) -> usize {
        let mut best = None;
        for (i, &e) in self.energy.iter().enumerate() {
            if self.set[i] != among_set {
                continue;
            }
            match best {
                Some((_, be)) if !better(e, be) => {}
                _ => best = Some((i, e)),
            }
        }
        best.map_or(0, |(i, _)| i)
    }
}

fn void_and_cluster() -> Box<[i8; CELLS]> {
    let mut density = Density::new();
    let mut seeded = 0;
    for i in 0..CELLS {
        if mix(i) % SEED_DENSITY == 0 {
            density.toggle(i, true);
            seeded += 1;
        }
    }

    // Spread the seed points until moving the tightest one lands it back in
    // place.
    for _ in 0..CELLS {
        let cluster = density.tightest_cluster();
        density.toggle(cluster, false);
        let void = density.largest_void();
        density.toggle(void, true);
        if void == cluster {
            break;
        }
    }
    let seed = density.set.clone();

    let mut rank = vec![0usize; CELLS];
    let mut ones = seeded;
    while ones > 0 {
        let cluster = density.tightest_cluster();
        density.toggle(cluster, false);
        ones -= 1;
        rank[cluster] = ones;
    }

    let mut density = Density::new();
    for i in (0..CELLS).filter(|&i| seed[i]) {
        density.toggle(i, true);
    }
    for ones in seeded..CELLS {
        let void = density.largest_void();
        density.toggle(void, true);
        rank[void] = ones;
    }
    tracing::debug!(seeded, "generated blue noise tile");

    let mut table = Box::new([0i8; CELLS]);
    for (t, &r) in table.iter_mut().zip(&rank) {
        *t = ((r * 256 / CELLS) as i32 - 128) as i8;
    }
    table
}

/// Blends toward the target by a strength jittered with the threshold tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlueNoise;

impl NoiseDisperser for BlueNoise {
    fn diffuse(&self, source: Argb, target: Argb, strength: f32, x: usize, y: usize) -> Argb {
        let t = thresholds()[(x & (SIZE - 1)) | (y & (SIZE - 1)) << 6] as f32;
        let adj = (t + 0.5) / 127.5;
        let k = (strength * (0.5 + 0.5 * adj)).clamp(0.0, 1.0) as f64;

        let (s, d) = (source.to_rgba(), target.to_rgba());
        let mut out = [0u8; 4];
        for (o, (s, d)) in out.iter_mut().zip(s.iter().zip(d.iter())) {
            let (s, d) = (*s as f64, *d as f64);
            *o = to_channel(s + (d - s) * k);
        }
        Argb::from_rgba(out)
    }

    #[inline]
    fn spatial_threshold(&self, position: usize) -> i8 {
        thresholds()[position & (CELLS - 1)]
    }
}
