//! Palette with precomputed Lab values.

use crate::color::{to_lab, Argb, Lab};

/// An ordered set of packed colors plus their CIELAB values.
///
/// Index 0 holds the transparent color whenever the image has one and the
/// palette has more than two entries. Lab values are computed once at
/// construction and kept in step by [`set`](Palette::set) and
/// [`swap`](Palette::swap).
///
/// # Example
///
/// ```
/// use pnn_engine::{Argb, Palette};
///
/// let palette = Palette::new(vec![Argb::BLACK, Argb::WHITE]);
/// assert_eq!(palette.len(), 2);
/// assert_eq!(palette.color(1), Argb::WHITE);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Argb>,
    labs: Vec<Lab>,
}

impl Palette {
    pub fn new(colors: Vec<Argb>) -> Self {
        let labs = colors.iter().map(|&c| to_lab(c)).collect();
        Self { colors, labs }
    }

    /// The fixed two-entry palette used when at most two colors are requested
    /// and the image has more distinct colors than that.
    pub fn two_color(transparent: Option<Argb>) -> Self {
        match transparent {
            Some(t) => Self::new(vec![t, Argb::BLACK]),
            None => Self::new(vec![Argb::BLACK, Argb::WHITE]),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn color(&self, idx: usize) -> Argb {
        self.colors[idx]
    }

    #[inline]
    pub fn lab(&self, idx: usize) -> Lab {
        self.labs[idx]
    }

    #[inline]
    pub fn colors(&self) -> &[Argb] {
        &self.colors
    }

    /// Index of the first exact match.
    pub fn position(&self, color: Argb) -> Option<usize> {
        self.colors.iter().position(|&c| c == color)
    }

    pub fn set(&mut self, idx: usize, color: Argb) {
        self.colors[idx] = color;
        self.labs[idx] = to_lab(color);
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        self.colors.swap(a, b);
        self.labs.swap(a, b);
    }

    pub fn into_colors(self) -> Vec<Argb> {
        self.colors
    }
}

impl From<Vec<Argb>> for Palette {
    fn from(colors: Vec<Argb>) -> Self {
        Self::new(colors)
    }
}
