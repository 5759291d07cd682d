//! CIEDE2000 color difference, split into its weighted sub-terms.
//!
//! The clustering and lookup code accumulates the terms one at a time and
//! bails out as soon as the running cost exceeds the current best, so each
//! term is exposed on its own. Later terms reuse the primed quantities of
//! earlier ones; those travel in [`ChromaTerm`] and [`HueTerm`].
//!
//! Reference: Sharma, Wu, Dalal, "The CIEDE2000 Color-Difference Formula:
//! Implementation Notes, Supplementary Test Data, and Mathematical
//! Observations", Color Res. Appl. 30(1), 2005.
//!
//! All angles are radians. [`ciede2000`] returns the *squared* ΔE00.

use std::f64::consts::PI;

use super::lab::Lab;

/// 25⁷
const POW25_TO_7: f64 = 6_103_515_625.0;

const K_L: f64 = 1.0;
const K_C: f64 = 1.0;
const K_H: f64 = 1.0;

/// Degrees to radians.
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * (PI / 180.0)
}

/// Chroma sub-term plus the primed values the hue term needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromaTerm {
    /// ΔC′ / (k_C·S_C)
    pub delta: f64,
    pub a1_prime: f64,
    pub a2_prime: f64,
    pub c1_prime: f64,
    pub c2_prime: f64,
}

/// Hue sub-term plus the means the rotation term needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueTerm {
    /// ΔH′ / (k_H·S_H)
    pub delta: f64,
    pub bar_c_prime: f64,
    pub bar_h_prime: f64,
}

/// ΔL′ / (k_L·S_L)
pub fn lightness_term(lab1: &Lab, lab2: &Lab) -> f64 {
    let delta_l_prime = lab2.l - lab1.l;
    let bar_l_prime = (lab1.l + lab2.l) / 2.0;
    let offset = (bar_l_prime - 50.0) * (bar_l_prime - 50.0);
    let s_l = 1.0 + (0.015 * offset) / (20.0 + offset).sqrt();
    delta_l_prime / (K_L * s_l)
}

pub fn chroma_term(lab1: &Lab, lab2: &Lab) -> ChromaTerm {
    let c1 = lab1.chroma();
    let c2 = lab2.chroma();
    let bar_c7 = ((c1 + c2) / 2.0).powi(7);
    let g = 0.5 * (1.0 - (bar_c7 / (bar_c7 + POW25_TO_7)).sqrt());
    let a1_prime = (1.0 + g) * lab1.a;
    let a2_prime = (1.0 + g) * lab2.a;

    let c1_prime = a1_prime.hypot(lab1.b);
    let c2_prime = a2_prime.hypot(lab2.b);
    let bar_c_prime = (c1_prime + c2_prime) / 2.0;
    let s_c = 1.0 + 0.045 * bar_c_prime;

    ChromaTerm {
        delta: (c2_prime - c1_prime) / (K_C * s_c),
        a1_prime,
        a2_prime,
        c1_prime,
        c2_prime,
    }
}

/// Hue angle in [0, 2π); achromatic colors get 0.
#[inline]
fn hue_angle(b: f64, a_prime: f64) -> f64 {
    if b == 0.0 && a_prime == 0.0 {
        return 0.0;
    }
    let h = b.atan2(a_prime);
    if h < 0.0 {
        h + 2.0 * PI
    } else {
        h
    }
}

pub fn hue_term(lab1: &Lab, lab2: &Lab, chroma: &ChromaTerm) -> HueTerm {
    let h1 = hue_angle(lab1.b, chroma.a1_prime);
    let h2 = hue_angle(lab2.b, chroma.a2_prime);
    let c_product = chroma.c1_prime * chroma.c2_prime;

    let delta_h_small = if c_product == 0.0 {
        0.0
    } else {
        let d = h2 - h1;
        if d < -PI {
            d + 2.0 * PI
        } else if d > PI {
            d - 2.0 * PI
        } else {
            d
        }
    };
    let delta_h_big = 2.0 * c_product.sqrt() * (delta_h_small / 2.0).sin();

    let h_sum = h1 + h2;
    let bar_h_prime = if c_product == 0.0 {
        h_sum
    } else if (h1 - h2).abs() <= PI {
        h_sum / 2.0
    } else if h_sum < 2.0 * PI {
        (h_sum + 2.0 * PI) / 2.0
    } else {
        (h_sum - 2.0 * PI) / 2.0
    };

    let bar_c_prime = (chroma.c1_prime + chroma.c2_prime) / 2.0;
    let t = 1.0 - 0.17 * (bar_h_prime - deg_to_rad(30.0)).cos()
        + 0.24 * (2.0 * bar_h_prime).cos()
        + 0.32 * (3.0 * bar_h_prime + deg_to_rad(6.0)).cos()
        - 0.20 * (4.0 * bar_h_prime - deg_to_rad(63.0)).cos();
    let s_h = 1.0 + 0.015 * bar_c_prime * t;

    HueTerm {
        delta: delta_h_big / (K_H * s_h),
        bar_c_prime,
        bar_h_prime,
    }
}

/// R_T·(ΔC′/S_C)·(ΔH′/S_H), the chroma/hue interaction around the blue hues.
pub fn rotation_term(chroma: &ChromaTerm, hue: &HueTerm) -> f64 {
    let exponent = (hue.bar_h_prime - deg_to_rad(275.0)) / deg_to_rad(25.0);
    let delta_theta = deg_to_rad(30.0) * (-(exponent * exponent)).exp();
    let bar_c7 = hue.bar_c_prime.powi(7);
    let r_c = 2.0 * (bar_c7 / (bar_c7 + POW25_TO_7)).sqrt();
    let r_t = -(2.0 * delta_theta).sin() * r_c;
    r_t * chroma.delta * hue.delta
}

/// Squared CIEDE2000 difference between two Lab colors.
pub fn ciede2000(lab1: &Lab, lab2: &Lab) -> f64 {
    let dl = lightness_term(lab1, lab2);
    let chroma = chroma_term(lab1, lab2);
    let hue = hue_term(lab1, lab2, &chroma);
    dl * dl + chroma.delta * chroma.delta + hue.delta * hue.delta + rotation_term(&chroma, &hue)
}
