//! Packed 32-bit pixel type.
//!
//! All pixel buffers handed to the engine are row-major slices of [`Argb`].
//! The packing is `0xAARRGGBB`, so ordering by the raw value sorts fully
//! transparent colors ahead of everything else.

use std::fmt;

/// A packed 8-bit-per-channel color, `0xAARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Argb(pub u32);

impl Argb {
    /// Fully transparent black.
    pub const TRANSPARENT: Argb = Argb(0x0000_0000);
    /// Opaque black.
    pub const BLACK: Argb = Argb(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Argb = Argb(0xFFFF_FFFF);

    /// Pack four channels.
    #[inline]
    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Pack an opaque color.
    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(0xFF, r, g, b)
    }

    #[inline]
    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Channels in `[r, g, b, a]` order, the order error boxes use.
    #[inline]
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r(), self.g(), self.b(), self.a()]
    }

    /// Build from `[r, g, b, a]` bytes.
    #[inline]
    pub const fn from_rgba(rgba: [u8; 4]) -> Self {
        Self::new(rgba[3], rgba[0], rgba[1], rgba[2])
    }
}

impl From<u32> for Argb {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Argb> for u32 {
    fn from(value: Argb) -> Self {
        value.0
    }
}

impl From<[u8; 4]> for Argb {
    fn from(rgba: [u8; 4]) -> Self {
        Self::from_rgba(rgba)
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_accessors() {
        let c = Argb::new(0x80, 0x12, 0x34, 0x56);
        assert_eq!(c.0, 0x8012_3456);
        assert_eq!(c.a(), 0x80);
        assert_eq!(c.r(), 0x12);
        assert_eq!(c.g(), 0x34);
        assert_eq!(c.b(), 0x56);
    }

    #[test]
    fn test_rgba_byte_order() {
        let c = Argb::from_rgba([1, 2, 3, 4]);
        assert_eq!(c, Argb::new(4, 1, 2, 3));
        assert_eq!(c.to_rgba(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_transparent_sorts_first() {
        let mut colors = vec![Argb::WHITE, Argb::opaque(1, 1, 1), Argb::TRANSPARENT];
        colors.sort();
        assert_eq!(colors[0], Argb::TRANSPARENT);
    }

    #[test]
    fn test_display_hex() {
        assert_eq!(Argb::opaque(255, 0, 16).to_string(), "#FFFF0010");
    }
}
