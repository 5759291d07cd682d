//! Public API for the pnn-engine crate.
//!
//! This module provides the high-level API: the [`Quantizer`] builder, the
//! [`QuantizeRequest`] it validates and the [`QuantizeError`] it reports.

mod builder;
mod context;
mod error;
mod request;

pub use builder::Quantizer;
pub use context::{ImageTraits, QuantizeContext};
pub use error::QuantizeError;
pub use request::{
    ParseQualityError, Quality, QuantizeRequest, DEFAULT_ALPHA_THRESHOLD, MAX_COLORS, MIN_COLORS,
};
