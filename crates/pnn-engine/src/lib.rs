#![allow(
    clippy::excessive_precision,
    clippy::needless_range_loop,
    clippy::module_inception,
    clippy::manual_range_contains
)]

//! pnn-engine: pairwise-nearest-neighbor color quantization
//!
//! This library reduces a 32-bit ARGB image to a palette of at most N
//! colors plus a per-pixel index buffer. Palettes are built by greedy
//! agglomerative clustering of a color histogram; pixels are then mapped
//! to the palette with error diffusion.
//!
//! # Quick Start
//!
//! The [`Quantizer`] builder is the primary entry point:
//!
//! ```
//! use pnn_engine::{Argb, Quantizer};
//!
//! let pixels: Vec<Argb> = (0..256u32)
//!     .map(|i| Argb::opaque(i as u8, (i / 2) as u8, 255 - i as u8))
//!     .collect();
//!
//! let image = Quantizer::new(16).quantize(&pixels, 16, 16).unwrap();
//!
//! assert!(image.palette().len() <= 16);
//! assert_eq!(image.width(), 16);
//! assert_eq!(image.indices().len(), 256);
//! ```
//!
//! # Quality Variants
//!
//! [`Quality::Standard`] clusters in RGB with square-root-scaled counts and
//! matches with plain squared distance. [`Quality::High`] clusters in
//! CIELAB, folds CIEDE2000 sub-terms into the merge cost with a weight that
//! depends on palette size and histogram density, and matches with a
//! perceptual metric selected per run.
//!
//! # Pipeline Overview
//!
//! ```text
//! ARGB pixels
//!     |
//!     v
//! [Image traits]           (transparent color, semi-transparency, distinct count)
//!     |
//!     +---> distinct <= N  -> exact palette, no clustering
//!     |
//!     v
//! [Histogram]              (65536 buckets, 4/5/6 bits per channel by alpha mode)
//!     |
//!     v
//! [PNN merge]              (min-heap of merge costs with lazy refresh)
//!     |
//!     v
//! Palette (<= N colors)
//!     |
//!     +---> 32 < N < 64    -> serpentine scan dither, or flat lookup
//!     |
//!     v
//! [Gilbert curve dither]   (error window, saliency cascade, blue noise)
//!     |
//!     v
//! QuantizedImage           (palette, indices, transparent slot 0, type hint)
//! ```
//!
//! # Merge Cost
//!
//! Two bins with counts `n1`, `n2` merge at cost
//!
//! ```text
//! cost = n1 * n2 / (n1 + n2) * d(c1, c2)
//! ```
//!
//! where `d` is squared RGBA distance in standard quality. In high quality
//! `d` blends squared CIELAB differences with CIEDE2000 sub-terms by a
//! ratio, and the partial sum is abandoned as soon as it exceeds the best
//! cost found so far.
//!
//! # Determinism
//!
//! Every run starts from fresh caches. The default [`BlueNoise`] is a fixed
//! table, so the same input always yields the same output. A custom
//! [`NoiseDisperser`] can be passed to [`Quantizer::quantize_with`].

pub mod api;
pub mod cluster;
pub mod color;
pub mod dither;
pub mod output;
pub mod palette;

#[cfg(test)]
mod domain_tests;

pub use api::{ImageTraits, Quality, QuantizeError, QuantizeRequest, Quantizer};
pub use color::{ciede2000, to_lab, to_rgb, Argb, Lab};
pub use dither::{BlueNoise, NoiseDisperser};
pub use output::{ImageType, IndexBuffer, QuantizeStats, QuantizedImage, Route};
pub use palette::Palette;
