//! Propagated quantization error and the sliding window that carries it
//! along the curve.

use std::collections::VecDeque;

use crate::color::Argb;

/// Ratio between the heaviest and lightest weight is `BLOCK_SIZE + 1`.
const BLOCK_SIZE: f64 = 343.0;

/// Signed per-channel error, `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorBox(pub [f32; 4]);

impl From<Argb> for ErrorBox {
    fn from(pixel: Argb) -> Self {
        let [r, g, b, a] = pixel.to_rgba();
        ErrorBox([r as f32, g as f32, b as f32, a as f32])
    }
}

impl ErrorBox {
    /// `lhs - rhs` per channel.
    pub fn residual(lhs: Argb, rhs: Argb) -> Self {
        let (l, r) = (ErrorBox::from(lhs), ErrorBox::from(rhs));
        ErrorBox(std::array::from_fn(|j| l.0[j] - r.0[j]))
    }

    /// Clamp each channel to a byte, truncating.
    pub fn to_argb(&self) -> Argb {
        let c = |v: f32| v.clamp(0.0, 255.0) as u8;
        Argb::new(c(self.0[3]), c(self.0[0]), c(self.0[1]), c(self.0[2]))
    }
}

/// Exponentially decaying weights for a window of `len` entries.
///
/// Index `len - 1` is the heaviest. The rounding residue of the
/// normalization lands on index 0 so the weights sum to one.
pub fn decay_weights(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let ratio = (BLOCK_SIZE + 1.0).powf(1.0 / (len as f64 - 1.0));
    let mut weights = vec![0f32; len];
    let mut weight = 1.0f64;
    let mut sum = 0.0f64;
    for c in 0..len {
        let d = (1.0 / weight) as f32;
        weights[len - c - 1] = d;
        sum += d as f64;
        weight *= ratio;
    }
    let mut total = 0f32;
    for w in &mut weights {
        *w = (*w as f64 / sum) as f32;
        total += *w;
    }
    weights[0] += 1.0 - total;
    weights
}

/// Recent residuals, oldest first or ordered by luma delta.
#[derive(Debug, Clone)]
pub enum ErrorWindow {
    /// Fixed-length FIFO, prefilled with zero error.
    Temporal(VecDeque<ErrorBox>),
    /// Up to `capacity` entries ascending by luma delta; the largest is
    /// evicted when full.
    Sorted {
        entries: Vec<(f32, ErrorBox)>,
        capacity: usize,
    },
}

impl ErrorWindow {
    pub fn temporal(len: usize) -> Self {
        ErrorWindow::Temporal(std::iter::repeat(ErrorBox::default()).take(len).collect())
    }

    pub fn sorted(capacity: usize) -> Self {
        ErrorWindow::Sorted {
            entries: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ErrorWindow::Temporal(q) => q.len(),
            ErrorWindow::Sorted { entries, .. } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a residual.
    pub fn push(&mut self, error: ErrorBox, y_diff: f32) {
        match self {
            ErrorWindow::Temporal(q) => {
                q.pop_front();
                q.push_back(error);
            }
            ErrorWindow::Sorted { entries, capacity } => {
                let at = entries.partition_point(|(d, _)| *d <= y_diff);
                entries.insert(at, (y_diff, error));
                entries.truncate(*capacity);
            }
        }
    }

    /// Visit each entry with its weight from `weights_by_len[self.len()]`.
    ///
    /// Temporal windows give the newest entry the heaviest weight; sorted
    /// windows give it to the smallest luma delta.
    pub fn for_each_weighted<F: FnMut(&ErrorBox, f32)>(&self, weights_by_len: &[Vec<f32>], mut f: F) {
        let weights = &weights_by_len[self.len()];
        match self {
            ErrorWindow::Temporal(q) => {
                for (eb, &w) in q.iter().zip(weights) {
                    f(eb, w);
                }
            }
            ErrorWindow::Sorted { entries, .. } => {
                for ((_, eb), &w) in entries.iter().zip(weights.iter().rev()) {
                    f(eb, w);
                }
            }
        }
    }
}
