use pnn_engine::QuantizeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("PNG decode error: {0}")]
    Decode(String),

    #[error("PNG encode error: {0}")]
    Encode(String),

    #[error("Unsupported PNG layout: {0}")]
    UnsupportedLayout(String),

    #[error("Image too large: {width}x{height} (max {max} pixels)")]
    TooLarge {
        width: usize,
        height: usize,
        max: usize,
    },

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Quantize error: {0}")]
    Quantize(#[from] QuantizeError),

    #[error("Worker failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<png::DecodingError> for ImageError {
    fn from(e: png::DecodingError) -> Self {
        ImageError::Decode(e.to_string())
    }
}

impl From<png::EncodingError> for ImageError {
    fn from(e: png::EncodingError) -> Self {
        ImageError::Encode(e.to_string())
    }
}
