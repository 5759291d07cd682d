//! pnnquant - PNN color quantizer for PNG images
//!
//! Host around the `pnn_engine` quantizer: PNG decoding and encoding,
//! YAML configuration and the batch runner used by the CLI.
//! This library exposes modules for integration testing.

pub mod error;
pub mod models;
pub mod rendering;
pub mod services;
