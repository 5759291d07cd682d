//! Precondition failures of the quantizer.
//!
//! These are the only errors the engine reports: everything past
//! validation resolves to some valid palette and index buffer.

use thiserror::Error;

/// Rejected quantization input.
///
/// # Example
///
/// ```
/// use pnn_engine::{Argb, QuantizeError, Quantizer};
///
/// let err = Quantizer::new(16).quantize(&[Argb::BLACK; 3], 2, 2).unwrap_err();
/// assert!(matches!(err, QuantizeError::BufferLength { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantizeError {
    /// Width or height is zero.
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: usize, height: usize },

    /// The pixel buffer does not hold exactly `width * height` pixels.
    #[error("pixel buffer holds {actual} pixels, {width}x{height} needs {expected}")]
    BufferLength {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    /// Requested palette size outside `2..=65536`.
    #[error("palette size {0} is outside 2..=65536")]
    PaletteSize(usize),
}
