//! Per-pixel saliency: opaque mid-tones matter most.

use crate::color::{Argb, LabCache};

/// Saliency floor; fully transparent or pure black/white pixels get this.
const FLOOR: f32 = 0.1;

/// `0.1 + 0.9 · (a / 255) · (1 − |L − 50| / 50)` for every pixel.
pub fn saliency_map(pixels: &[Argb], labs: &mut LabCache) -> Vec<f32> {
    pixels
        .iter()
        .map(|&p| {
            let lab = labs.get(p);
            let alpha = p.a() as f64 / 255.0;
            let mid = (1.0 - (lab.l - 50.0).abs() / 50.0).max(0.0);
            FLOOR + (1.0 - FLOOR) * (alpha * mid) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes_get_the_floor() {
        let mut labs = LabCache::new();
        let map = saliency_map(&[Argb::BLACK, Argb::TRANSPARENT], &mut labs);
        assert!((map[0] - FLOOR).abs() < 1e-6);
        assert!((map[1] - FLOOR).abs() < 1e-6);
    }

    #[test]
    fn test_mid_grey_is_most_salient() {
        let mut labs = LabCache::new();
        // sRGB 119 sits close to L = 50.
        let map = saliency_map(&[Argb::opaque(119, 119, 119), Argb::opaque(230, 230, 230)], &mut labs);
        assert!(map[0] > 0.95, "mid grey saliency {}", map[0]);
        assert!(map[0] > map[1]);
    }
}
