pub mod png_codec;

pub use png_codec::{decode_png, encode_png, optimize_png, DecodedImage};
