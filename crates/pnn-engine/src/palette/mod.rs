//! Palettes and pixel to index lookup.

mod lookup;
mod palette;

pub use lookup::{ChannelWeights, LookupPolicy, PaletteLookup};
pub(crate) use lookup::POSITION_MASK;
pub use palette::Palette;
