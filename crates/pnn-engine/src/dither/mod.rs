//! Dithering: map every pixel to a palette index while spreading the
//! quantization error.
//!
//! Two ditherers are available:
//!
//! - [`scan_dither`]: serpentine Floyd–Steinberg over raster rows, used for
//!   mid-sized palettes;
//! - [`curve_dither`]: error diffusion along a gilbert curve with a short
//!   weighted error window, used for everything else.
//!
//! Both consult a [`NoiseDisperser`] for position-dependent decisions. The
//! default is [`BlueNoise`]; callers may supply their own through
//! [`Quantizer::quantize_with`](crate::Quantizer::quantize_with).

mod blue_noise;
mod curve;
mod error_box;
mod gilbert;
mod saliency;
mod scan;

pub use blue_noise::BlueNoise;
pub use curve::{curve_dither, CurveInput, CurveRegime, Pick};
pub use error_box::{decay_weights, ErrorBox, ErrorWindow};
pub use gilbert::gilbert_walk;
pub use saliency::saliency_map;
pub use scan::scan_dither;

use crate::color::Argb;

/// Source of deterministic, position-dependent dither decisions.
///
/// Implementations must be pure: the same arguments always give the same
/// result, and nothing is shared between calls.
pub trait NoiseDisperser {
    /// Blend `source` toward `target` by roughly `strength`, jittered by
    /// position.
    fn diffuse(&self, source: Argb, target: Argb, strength: f32, x: usize, y: usize) -> Argb;

    /// Signed threshold for `position` (taken modulo 4096).
    fn spatial_threshold(&self, position: usize) -> i8;
}
