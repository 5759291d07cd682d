//! Luma and chroma deltas in YUV, used by the curve ditherer's gating.

use super::argb::Argb;

/// BT.601 luma weights, also the default `PR/PG/PB` channel weights.
pub const LUMA: [f64; 3] = [0.299, 0.587, 0.114];
const U_COEFFS: [f64; 3] = [-0.147_13, -0.288_86, 0.436];

#[inline]
fn dot(c: Argb, w: &[f64; 3]) -> f64 {
    c.r() as f64 * w[0] + c.g() as f64 * w[1] + c.b() as f64 * w[2]
}

/// Absolute luma difference between two colors.
#[inline]
pub fn luma_diff(c1: Argb, c2: Argb) -> f64 {
    (dot(c1, &LUMA) - dot(c2, &LUMA)).abs()
}

/// Absolute U-chroma difference between two colors.
#[inline]
pub fn chroma_diff(c1: Argb, c2: Argb) -> f64 {
    (dot(c1, &U_COEFFS) - dot(c2, &U_COEFFS)).abs()
}
