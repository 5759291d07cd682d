//! Immutable description of one quantization job.

use std::fmt;
use std::str::FromStr;

use super::error::QuantizeError;
use crate::color::Argb;

/// Smallest palette the quantizer builds.
pub const MIN_COLORS: usize = 2;
/// Largest palette the quantizer builds.
pub const MAX_COLORS: usize = 65_536;
/// Default alpha at or below which a pixel counts as transparent for lookup.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 15;

/// Quality variant.
///
/// `Standard` clusters and matches in RGB; `High` clusters in CIELAB with
/// CIEDE2000-weighted merge costs and perceptual matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quality {
    Standard,
    #[default]
    High,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Quality::Standard => "standard",
            Quality::High => "high",
        })
    }
}

/// Error returned when parsing an unknown quality name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quality '{0}', expected 'standard' or 'high'")]
pub struct ParseQualityError(String);

impl FromStr for Quality {
    type Err = ParseQualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "std" => Ok(Quality::Standard),
            "high" | "hq" => Ok(Quality::High),
            _ => Err(ParseQualityError(s.to_string())),
        }
    }
}

/// One image and the settings to quantize it with.
#[derive(Debug, Clone, Copy)]
pub struct QuantizeRequest<'a> {
    /// Row-major pixels, `width * height` of them.
    pub pixels: &'a [Argb],
    pub width: usize,
    pub height: usize,
    /// Requested palette size, `2..=65536`.
    pub colors: usize,
    pub dither: bool,
    pub quality: Quality,
    pub alpha_threshold: u8,
}

impl QuantizeRequest<'_> {
    /// Check the preconditions; nothing past this point can fail.
    pub fn validate(&self) -> Result<(), QuantizeError> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return Err(QuantizeError::ZeroDimension { width, height });
        }
        let expected = width.checked_mul(height).unwrap_or(usize::MAX);
        if self.pixels.len() != expected {
            return Err(QuantizeError::BufferLength {
                width,
                height,
                expected,
                actual: self.pixels.len(),
            });
        }
        if !(MIN_COLORS..=MAX_COLORS).contains(&self.colors) {
            return Err(QuantizeError::PaletteSize(self.colors));
        }
        Ok(())
    }
}
