//! Gamma lookup table access functions
//!
//! Decoding uses a 256-entry table generated at compile time by build.rs;
//! encoding is evaluated directly since its input is continuous.

// Include the generated LUT from build.rs
include!(concat!(env!("OUT_DIR"), "/gamma_lut.rs"));

/// Convert an 8-bit sRGB channel to linear light (0.0..=1.0).
#[inline]
pub fn srgb_to_linear(channel: u8) -> f64 {
    SRGB_TO_LINEAR[channel as usize]
}

/// Convert linear light to an sRGB value (nominally 0.0..=1.0, unclamped).
#[inline]
pub fn linear_to_srgb(linear: f64) -> f64 {
    if linear > 0.003_130_8 {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * linear
    }
}
