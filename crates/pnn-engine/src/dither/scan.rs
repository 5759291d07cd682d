//! Serpentine Floyd–Steinberg diffusion with fixed-point error rows.
//!
//! Errors live in two `i32` rows of four channels per cell, offset by one
//! cell on each side. The current row is read with a forward cursor and the
//! next row written with a backward one, so reversing the pixel order on
//! alternate lines needs no extra bookkeeping. Table lookups replace the
//! per-pixel clamping.

use crate::api::Quality;
use crate::color::Argb;
use crate::palette::PaletteLookup;

use super::NoiseDisperser;

/// Channels per error cell.
const DJ: usize = 4;
const BLOCK_SIZE: i32 = 256;
/// Error limit per channel, high quality.
const DITHER_MAX_HIGH: i32 = 16;
/// Error limit per channel, standard quality.
const DITHER_MAX_STANDARD: i32 = 20;

/// Rounding used when adding accumulated error back to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rounding {
    /// Every channel at 1/16 granularity.
    Uniform,
    /// Red and blue at 1/32, green at 1/16, alpha untouched.
    Biased,
}

struct Tables {
    clamp: Vec<u8>,
    limit: Vec<i32>,
}

impl Tables {
    fn new(dither_max: i32) -> Self {
        let block = BLOCK_SIZE as usize;
        let mut clamp = vec![0u8; DJ * block];
        for i in 0..block {
            clamp[i + block] = i as u8;
            clamp[i + block * 2] = 0xFF;
            clamp[i + block * 3] = 0xFF;
        }
        let limit = (0..2 * BLOCK_SIZE)
            .map(|i| (i - BLOCK_SIZE).clamp(-dither_max, dither_max))
            .collect();
        Self { clamp, limit }
    }

    #[inline]
    fn clamp(&self, idx: i32) -> u8 {
        self.clamp[idx.clamp(0, self.clamp.len() as i32 - 1) as usize]
    }

    #[inline]
    fn limit(&self, diff: i32) -> i32 {
        self.limit[(diff + BLOCK_SIZE).clamp(0, 2 * BLOCK_SIZE - 1) as usize]
    }
}

/// Dither `pixels` in raster order, reversing direction every line.
///
/// Uniform rounding picks with the nearest policy, biased rounding with the
/// closest one.
pub fn scan_dither<N: NoiseDisperser + ?Sized>(
    pixels: &[Argb],
    width: usize,
    height: usize,
    lookup: &mut PaletteLookup<'_, N>,
) -> Vec<u16> {
    let policy = *lookup.policy();
    let (dither_max, rounding) = match policy.quality {
        Quality::Standard => (DITHER_MAX_STANDARD, Rounding::Uniform),
        Quality::High if policy.has_semi_transparency || lookup.palette().len() < 64 => {
            (DITHER_MAX_HIGH, Rounding::Uniform)
        }
        Quality::High => (DITHER_MAX_HIGH, Rounding::Biased),
    };
    tracing::debug!(width, height, dither_max, rounding = ?rounding, "scan dither");

    let tables = Tables::new(dither_max);
    let err_len = (width + 2) * DJ;
    let mut row0 = vec![0i32; err_len];
    let mut row1 = vec![0i32; err_len];
    let mut indices = vec![0u16; pixels.len()];

    for y in 0..height {
        let forward = y % 2 == 0;
        let mut cursor0 = DJ;
        let mut cursor1 = width * DJ;
        row1[cursor1..cursor1 + DJ].fill(0);

        for j in 0..width {
            let x = if forward { j } else { width - 1 - j };
            let pos = y * width + x;
            let [r, g, b, a] = pixels[pos].to_rgba();
            let [r, g, b, a] = [r as i32, g as i32, b as i32, a as i32];

            let e = &row0[cursor0..cursor0 + DJ];
            let fine = |err: i32, c: i32| tables.clamp(((err + 0x1008) >> 4) + c);
            let coarse = |err: i32, c: i32| tables.clamp(((err + 0x2010) >> 5) + c);
            let dithered = match rounding {
                Rounding::Uniform => Argb::new(fine(e[3], a), fine(e[0], r), fine(e[1], g), fine(e[2], b)),
                Rounding::Biased => Argb::new(a as u8, coarse(e[0], r), fine(e[1], g), coarse(e[2], b)),
            };

            let idx = match rounding {
                Rounding::Uniform => lookup.nearest(dithered),
                Rounding::Biased => lookup.closest(dithered, pos),
            };
            indices[pos] = idx;

            let chosen = lookup.color(idx).to_rgba();
            let got = dithered.to_rgba();
            for c in 0..DJ {
                let mut err = tables.limit(got[c] as i32 - chosen[c] as i32);
                let k = err * 2;
                row1[cursor1 + c - DJ] = err;
                err += k;
                row1[cursor1 + c + DJ] += err;
                err += k;
                row1[cursor1 + c] += err;
                err += k;
                row0[cursor0 + c + DJ] += err;
            }

            cursor0 += DJ;
            cursor1 -= DJ;
        }
        std::mem::swap(&mut row0, &mut row1);
    }
    indices
}
