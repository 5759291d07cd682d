//! Color types and perceptual distance.
//!
//! - [`Argb`]: packed 32-bit pixels, the engine's I/O format
//! - [`Lab`]: CIELAB plus alpha, where clustering happens in high quality mode
//! - [`ciede2000`]: perceptual difference and its individual sub-terms
//! - [`LabCache`]: per-run pixel to Lab memo

mod argb;
pub mod ciede2000;
mod lab;
mod lut;
pub mod yuv;

use std::collections::HashMap;

pub use argb::Argb;
pub use ciede2000::{ciede2000, deg_to_rad};
pub use lab::{to_lab, to_rgb, Lab};
pub(crate) use lab::to_channel;

/// Memoizes pixel to Lab conversions for one quantization run.
///
/// A fresh cache is created for every run; it is never shared between
/// images.
#[derive(Debug, Default)]
pub struct LabCache {
    map: HashMap<Argb, Lab>,
}

impl LabCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lab value of `pixel`, converting on first use.
    #[inline]
    pub fn get(&mut self, pixel: Argb) -> Lab {
        *self.map.entry(pixel).or_insert_with(|| to_lab(pixel))
    }

    /// Number of distinct pixels converted so far.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
