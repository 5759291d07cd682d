//! Domain-critical regression tests for pnn-engine.
//!
//! These tests are designed to catch specific classes of bugs, not just
//! confirm happy paths. Each test documents the regression it guards against.

#[cfg(test)]
mod domain_tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use crate::api::{Quality, Quantizer};
    use crate::color::{ciede2000, to_lab, to_rgb, Argb};
    use crate::dither::gilbert_walk;
    use crate::output::{ImageType, IndexBuffer, Route};

    /// Helper: `count` distinct opaque colors spread over the cube.
    fn distinct_colors(count: u32) -> Vec<Argb> {
        (0..count)
            .map(|i| {
                let r = (i * 37 % 256) as u8;
                let g = (i * 11 / 3 % 256) as u8;
                let b = (i * 7 + i / 256 * 13) as u8;
                Argb::opaque(r, g, b)
            })
            .collect()
    }

    fn assert_indices_valid(image: &crate::QuantizedImage) {
        let len = image.palette().len();
        for (pos, idx) in image.indices().iter().enumerate() {
            assert!(idx < len, "index {idx} at pixel {pos} outside palette of {len}");
        }
    }

    // ========================================================================
    // GAP 1: Exact reproduction when the image already fits the palette
    // ========================================================================

    /// If this breaks, it means: images with at most N distinct colors are
    /// being clustered or dithered instead of reproduced verbatim.
    #[test]
    fn test_few_colors_reproduced_exactly() {
        let pixels = vec![
            Argb::opaque(255, 0, 0),
            Argb::opaque(0, 255, 0),
            Argb::opaque(0, 0, 255),
            Argb::opaque(255, 0, 0),
            Argb::opaque(10, 20, 30),
            Argb::opaque(0, 255, 0),
        ];
        for quality in [Quality::Standard, Quality::High] {
            for dither in [true, false] {
                let image = Quantizer::new(4)
                    .quality(quality)
                    .dither(dither)
                    .quantize(&pixels, 3, 2)
                    .unwrap();
                assert_eq!(image.stats().route, Route::Exact);
                assert_eq!(image.palette().len(), 4);
                assert_eq!(image.to_argb(), pixels);
            }
        }
    }

    /// If this breaks, it means: a uniform image lost its only color, or
    /// the exact path grew a padding entry.
    #[test]
    fn test_uniform_red_with_two_colors() {
        let red = Argb::opaque(255, 0, 0);
        let pixels = vec![red; 16];
        let image = Quantizer::new(2).quantize(&pixels, 4, 4).unwrap();
        assert_eq!(image.palette(), &[red]);
        assert!(image.indices().iter().all(|i| i == 0));
        assert_eq!(image.transparent_index(), None);
    }

    /// If this breaks, it means: the exact path stopped preserving first
    /// appearance order.
    #[test]
    fn test_checkerboard_without_dither() {
        let pixels = vec![Argb::BLACK, Argb::WHITE, Argb::WHITE, Argb::BLACK];
        let image = Quantizer::new(2).dither(false).quantize(&pixels, 2, 2).unwrap();
        assert_eq!(image.palette(), &[Argb::BLACK, Argb::WHITE]);
        assert_eq!(image.indices(), &IndexBuffer::Narrow(vec![0, 1, 1, 0]));
    }

    // ========================================================================
    // GAP 2: Palette size bounds and index validity
    // ========================================================================

    /// If this breaks, it means: the merge loop stops early or late, or a
    /// ditherer returned an index past the end of the palette.
    #[test]
    fn test_palette_bounded_and_indices_valid() {
        let pixels = distinct_colors(900);
        for n in [3, 8, 16, 40, 63, 100] {
            for quality in [Quality::Standard, Quality::High] {
                for dither in [true, false] {
                    let image = Quantizer::new(n)
                        .quality(quality)
                        .dither(dither)
                        .quantize(&pixels, 30, 30)
                        .unwrap();
                    assert!(
                        image.palette().len() <= n,
                        "n={n} {quality} dither={dither}: palette of {}",
                        image.palette().len()
                    );
                    assert!(!image.palette().is_empty());
                    assert_eq!(image.indices().len(), 900);
                    assert_indices_valid(&image);
                }
            }
        }
    }

    /// If this breaks, it means: routing by palette size is off by one.
    #[test]
    fn test_routes_by_palette_size() {
        let pixels = distinct_colors(400);
        let route = |n: usize, dither: bool| {
            Quantizer::new(n)
                .dither(dither)
                .quantize(&pixels, 20, 20)
                .unwrap()
                .stats()
                .route
        };
        assert_eq!(route(32, true), Route::Curve);
        assert_eq!(route(33, true), Route::Scan);
        assert_eq!(route(63, true), Route::Scan);
        assert_eq!(route(63, false), Route::Flat);
        assert_eq!(route(64, true), Route::Curve);
    }

    /// If this breaks, it means: requests above 256 colors are being
    /// truncated to 8-bit indices.
    #[test]
    fn test_large_palette_uses_wide_indices() {
        let pixels = distinct_colors(1200);
        let image = Quantizer::new(300)
            .quality(Quality::Standard)
            .quantize(&pixels, 40, 30)
            .unwrap();
        assert!(image.indices().is_wide());
        assert!(image.palette().len() <= 300);
        assert_eq!(image.image_type(), ImageType::Png);
        assert_indices_valid(&image);
    }

    /// If this breaks, it means: the two-color bypass no longer produces
    /// the fixed black and white palette.
    #[test]
    fn test_two_color_bypass() {
        let pixels = distinct_colors(64);
        let image = Quantizer::new(2).quantize(&pixels, 8, 8).unwrap();
        assert_eq!(image.palette(), &[Argb::BLACK, Argb::WHITE]);
        assert_eq!(image.stats().bins, 0);
        assert_indices_valid(&image);
    }

    // ========================================================================
    // GAP 3: Transparency handling
    // ========================================================================

    /// If this breaks, it means: the transparent pixel no longer lands in
    /// palette slot 0, or the slot lost its transparent color.
    #[test]
    fn test_transparent_pixel_takes_slot_zero() {
        let mut pixels = distinct_colors(64);
        let transparent = Argb::new(0, 1, 2, 3);
        pixels[5] = transparent;
        pixels[40] = Argb::new(0, 200, 200, 200);
        for quality in [Quality::Standard, Quality::High] {
            let image = Quantizer::new(8).quality(quality).quantize(&pixels, 8, 8).unwrap();
            assert_eq!(image.transparent_index(), Some(0));
            assert_eq!(image.palette()[0], transparent);
            assert_eq!(image.indices().get(5), Some(0));
            assert_indices_valid(&image);
        }
    }

    /// If this breaks, it means: the exact path forgot to put the
    /// transparent color first.
    #[test]
    fn test_single_transparent_pixel_exact() {
        let pixels = vec![
            Argb::opaque(9, 9, 9),
            Argb::WHITE,
            Argb::new(0, 0, 0, 0),
            Argb::opaque(9, 9, 9),
        ];
        let image = Quantizer::new(8).quantize(&pixels, 2, 2).unwrap();
        assert_eq!(image.transparent_index(), Some(0));
        assert_eq!(
            image.palette(),
            &[Argb::TRANSPARENT, Argb::opaque(9, 9, 9), Argb::WHITE]
        );
        assert_eq!(image.indices(), &IndexBuffer::Narrow(vec![1, 2, 0, 1]));
    }

    /// If this breaks, it means: semi-transparent input is hinted as GIF,
    /// which cannot carry partial alpha.
    #[test]
    fn test_semi_transparency_hints_png() {
        let pixels: Vec<Argb> = (0..64u32)
            .map(|i| Argb::new(0x40 + i as u8, (i * 4) as u8, 100, 200))
            .collect();
        let image = Quantizer::new(8).quantize(&pixels, 8, 8).unwrap();
        assert_eq!(image.image_type(), ImageType::Png);
        assert_indices_valid(&image);

        let opaque = distinct_colors(64);
        let image = Quantizer::new(8).quantize(&opaque, 8, 8).unwrap();
        assert_eq!(image.image_type(), ImageType::Gif);
    }

    // ========================================================================
    // GAP 4: Determinism
    // ========================================================================

    /// If this breaks, it means: state is leaking between runs or the
    /// default noise is no longer a fixed table.
    #[test]
    fn test_runs_are_deterministic() {
        let pixels = distinct_colors(900);
        for n in [6, 48, 128] {
            let q = Quantizer::new(n);
            assert_eq!(
                q.quantize(&pixels, 30, 30).unwrap(),
                q.quantize(&pixels, 30, 30).unwrap()
            );
        }
    }

    // ========================================================================
    // GAP 5: Color science
    // ========================================================================

    /// If this breaks, it means: the Lab conversion pair drifted and
    /// quantized palettes will shift color on output.
    #[test]
    fn test_lab_round_trip() {
        for pixel in distinct_colors(300) {
            let back = to_rgb(to_lab(pixel));
            for (ours, theirs) in back.to_rgba().iter().zip(pixel.to_rgba()) {
                assert!(
                    (*ours as i16 - theirs as i16).abs() <= 1,
                    "{pixel:?} came back as {back:?}"
                );
            }
        }
    }

    /// If this breaks, it means: CIEDE2000 lost symmetry, so merge costs
    /// depend on which bin is examined first.
    #[test]
    fn test_ciede2000_symmetric() {
        let colors = distinct_colors(40);
        for &p in &colors {
            let lp = to_lab(p);
            assert_eq!(ciede2000(&lp, &lp), 0.0);
            for &q in &colors {
                let lq = to_lab(q);
                let (d1, d2) = (ciede2000(&lp, &lq), ciede2000(&lq, &lp));
                assert_eq!(d1.to_bits(), d2.to_bits(), "{p:?} vs {q:?}: {d1} != {d2}");
                assert!(d1 >= 0.0);
            }
        }
    }

    // ========================================================================
    // GAP 6: Curve traversal
    // ========================================================================

    /// If this breaks, it means: the curve ditherer skips or revisits
    /// pixels on some rectangle shapes.
    #[test]
    fn test_gilbert_visits_every_cell_once() {
        for (w, h) in [(1, 1), (1, 7), (7, 1), (5, 3), (3, 5), (8, 8), (13, 6), (2, 9)] {
            let mut seen = HashSet::new();
            gilbert_walk(w, h, |x, y| {
                assert!(x < w && y < h);
                assert!(seen.insert((x, y)), "({x}, {y}) visited twice in {w}x{h}");
            });
            assert_eq!(seen.len(), w * h);
        }
    }
}
