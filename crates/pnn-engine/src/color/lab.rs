//! CIELAB color type and sRGB conversions.
//!
//! Conversions follow the D65 reference white with the 0.008856 / 7.787
//! piecewise cube-root. Alpha rides along untouched so that bins can average
//! it together with the perceptual channels.

use super::argb::Argb;
use super::lut::{linear_to_srgb, srgb_to_linear};

/// D65 reference white, normalized so that Y = 1.
const WHITE_X: f64 = 0.950_47;
const WHITE_Y: f64 = 1.0;
const WHITE_Z: f64 = 1.088_83;

const EPSILON: f64 = 0.008_856;
/// kappa / 116 (903.3 / 116).
const LINEAR_SLOPE: f64 = 7.787;
const LINEAR_OFFSET: f64 = 16.0 / 116.0;

/// A color in CIELAB space plus its alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    /// Alpha, 0..=255.
    pub alpha: f64,
    /// Lightness, 0..=100.
    pub l: f64,
    /// Green/red axis.
    pub a: f64,
    /// Blue/yellow axis.
    pub b: f64,
}

impl Lab {
    #[inline]
    pub fn new(alpha: f64, l: f64, a: f64, b: f64) -> Self {
        Self { alpha, l, a, b }
    }

    /// Chroma, `sqrt(a² + b²)`.
    #[inline]
    pub fn chroma(&self) -> f64 {
        self.a.hypot(self.b)
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        LINEAR_SLOPE * t + LINEAR_OFFSET
    }
}

#[inline]
fn lab_f_inv(t: f64) -> f64 {
    let cube = t * t * t;
    if cube > EPSILON {
        cube
    } else {
        (t - LINEAR_OFFSET) / LINEAR_SLOPE
    }
}

/// Convert a packed pixel to CIELAB.
pub fn to_lab(pixel: Argb) -> Lab {
    let r = srgb_to_linear(pixel.r());
    let g = srgb_to_linear(pixel.g());
    let b = srgb_to_linear(pixel.b());

    let x = (r * 0.4124 + g * 0.3576 + b * 0.1805) / WHITE_X;
    let y = (r * 0.2126 + g * 0.7152 + b * 0.0722) / WHITE_Y;
    let z = (r * 0.0193 + g * 0.1192 + b * 0.9505) / WHITE_Z;

    let fx = lab_f(x);
    let fy = lab_f(y);
    let fz = lab_f(z);

    Lab {
        alpha: pixel.a() as f64,
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Convert CIELAB back to a packed pixel, clamping out-of-gamut values.
pub fn to_rgb(lab: Lab) -> Argb {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = lab.a / 500.0 + fy;
    let fz = fy - lab.b / 200.0;

    let x = WHITE_X * lab_f_inv(fx);
    let y = WHITE_Y * lab_f_inv(fy);
    let z = WHITE_Z * lab_f_inv(fz);

    let r = x * 3.2406 + y * -1.5372 + z * -0.4986;
    let g = x * -0.9689 + y * 1.8758 + z * 0.0415;
    let b = x * 0.0557 + y * -0.2040 + z * 1.0570;

    Argb::new(
        to_channel(lab.alpha),
        to_channel(linear_to_srgb(r) * 255.0),
        to_channel(linear_to_srgb(g) * 255.0),
        to_channel(linear_to_srgb(b) * 255.0),
    )
}

/// Round and clamp to a channel byte; NaN maps to 0.
#[inline]
pub(crate) fn to_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

impl From<Argb> for Lab {
    #[inline]
    fn from(pixel: Argb) -> Self {
        to_lab(pixel)
    }
}

impl From<Lab> for Argb {
    #[inline]
    fn from(lab: Lab) -> Self {
        to_rgb(lab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The rounded matrix coefficients keep us within a small distance of
    /// the exact CIE constants used by the palette crate.
    const PALETTE_TOLERANCE: f64 = 0.5;

    #[test]
    fn test_lab_matches_palette_crate() {
        use ::palette::{IntoColor, Lab as PaletteLab, Srgb};

        let test_colors = [
            (255u8, 0u8, 0u8),
            (0, 255, 0),
            (0, 0, 255),
            (128, 128, 128),
            (255, 255, 255),
            (0, 0, 0),
            (12, 200, 90),
        ];

        for (r, g, b) in test_colors {
            let ours = to_lab(Argb::opaque(r, g, b));
            let theirs: PaletteLab<::palette::white_point::D65, f64> =
                Srgb::new(r, g, b).into_format::<f64>().into_color();

            assert!(
                (ours.l - theirs.l).abs() < PALETTE_TOLERANCE,
                "L mismatch for ({r}, {g}, {b}): ours={}, palette={}",
                ours.l,
                theirs.l
            );
            assert!(
                (ours.a - theirs.a).abs() < PALETTE_TOLERANCE,
                "a mismatch for ({r}, {g}, {b}): ours={}, palette={}",
                ours.a,
                theirs.a
            );
            assert!(
                (ours.b - theirs.b).abs() < PALETTE_TOLERANCE,
                "b mismatch for ({r}, {g}, {b}): ours={}, palette={}",
                ours.b,
                theirs.b
            );
        }
    }

    #[test]
    fn test_white_and_black_anchor_points() {
        let white = to_lab(Argb::WHITE);
        assert!((white.l - 100.0).abs() < 0.01, "white L = {}", white.l);
        assert!(white.a.abs() < 0.05 && white.b.abs() < 0.05);

        let black = to_lab(Argb::BLACK);
        assert!(black.l.abs() < 1e-9, "black L = {}", black.l);
        assert_eq!(black.alpha, 255.0);
    }

    #[test]
    fn test_round_trip_within_one_unit() {
        // Coarse sweep of the opaque cube.
        for r in (0..=255u32).step_by(15) {
            for g in (0..=255u32).step_by(17) {
                for b in (0..=255u32).step_by(51) {
                    let p = Argb::opaque(r as u8, g as u8, b as u8);
                    let back = to_rgb(to_lab(p));
                    for (c0, c1) in p.to_rgba().iter().zip(back.to_rgba().iter()) {
                        assert!(
                            (*c0 as i32 - *c1 as i32).abs() <= 1,
                            "round trip of {p} gave {back}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_alpha_is_preserved() {
        let p = Argb::new(0x42, 10, 20, 30);
        assert_eq!(to_rgb(to_lab(p)).a(), 0x42);
    }

    #[test]
    fn test_to_channel_guards_nan() {
        assert_eq!(to_channel(f64::NAN), 0);
        assert_eq!(to_channel(-3.0), 0);
        assert_eq!(to_channel(300.0), 255);
    }
}
