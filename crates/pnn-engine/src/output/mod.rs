//! Quantization results.

mod quantized_image;

pub use quantized_image::{ImageType, IndexBuffer, QuantizeStats, QuantizedImage, Route};
