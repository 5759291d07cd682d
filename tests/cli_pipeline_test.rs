//! End-to-end tests: PNG file in, quantized PNG file out.

mod common;

use common::fixtures;
use pnnquant::error::ImageError;
use pnnquant::models::{AppConfig, QualityName, QuantizeSettings};
use pnnquant::rendering::decode_png;
use pnnquant::services::QuantizeService;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn service(settings: QuantizeSettings) -> QuantizeService {
    QuantizeService::new(settings, false, None)
}

#[test]
fn test_quantize_file_writes_indexed_png() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixtures::write_file(dir.path(), "gradient.png", &fixtures::gradient_png(32, 32));
    let output = dir.path().join("out.png");

    let report = service(QuantizeSettings {
        colors: 16,
        ..Default::default()
    })
    .quantize_file(&input, &output)
    .unwrap();

    let data = std::fs::read(&output).unwrap();
    let header = common::assert_indexed_png(&data, 16);
    assert_eq!((header.width, header.height), (32, 32));
    assert_eq!(header.bit_depth, png::BitDepth::Four);
    assert_eq!(report.bytes, data.len());
    assert_eq!(report.output.as_deref(), Some(output.as_path()));
}

#[test]
fn test_quantized_output_uses_only_palette_colors() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixtures::write_file(dir.path(), "g.png", &fixtures::gradient_png(24, 20));
    let output = dir.path().join("g8.png");

    for quality in [QualityName::Standard, QualityName::High] {
        let report = service(QuantizeSettings {
            colors: 8,
            quality,
            ..Default::default()
        })
        .quantize_file(&input, &output)
        .unwrap();

        let decoded = decode_png(&std::fs::read(&output).unwrap()).unwrap();
        let mut distinct = decoded.pixels.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert!(
            distinct.len() <= 8,
            "{quality:?}: {} colors in output",
            distinct.len()
        );
        assert!(distinct.len() <= report.palette_len);
    }
}

#[test]
fn test_few_colors_survive_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let rgba = [
        255, 0, 0, 255, 0, 255, 0, 255, //
        0, 0, 255, 255, 255, 0, 0, 255,
    ];
    let input = fixtures::write_file(dir.path(), "four.png", &fixtures::rgba_png(2, 2, &rgba));
    let output = dir.path().join("four-out.png");

    let report = service(QuantizeSettings::default())
        .quantize_file(&input, &output)
        .unwrap();

    assert_eq!(report.route, "exact");
    let original = decode_png(&std::fs::read(&input).unwrap()).unwrap();
    let quantized = decode_png(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(quantized, original);
}

#[test]
fn test_transparent_pixels_stay_transparent() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixtures::write_file(
        dir.path(),
        "edge.png",
        &fixtures::transparent_edge_png(16, 16),
    );
    let output = dir.path().join("edge-out.png");

    let report = service(QuantizeSettings {
        colors: 12,
        ..Default::default()
    })
    .quantize_file(&input, &output)
    .unwrap();

    assert_eq!(report.transparent_index, Some(0));
    let data = std::fs::read(&output).unwrap();
    let header = common::assert_indexed_png(&data, 12);
    assert!(header.has_trns, "Transparent palette entry needs a tRNS chunk");

    let decoded = decode_png(&data).unwrap();
    assert_eq!(decoded.pixels[0].a(), 0, "First transparent pixel lost its alpha");
}

#[test]
fn test_semi_transparent_input_reports_png_type() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixtures::write_file(dir.path(), "glass.png", &fixtures::translucent_png(16, 16));
    let output = dir.path().join("glass-out.png");

    let report = service(QuantizeSettings {
        colors: 8,
        ..Default::default()
    })
    .quantize_file(&input, &output)
    .unwrap();

    assert_eq!(report.image_type, "image/png");
    let inspect = service(QuantizeSettings::default())
        .inspect_file(&input)
        .unwrap();
    assert!(inspect.has_semi_transparency);
    assert!(!inspect.has_transparency);
}

#[test]
fn test_invalid_palette_size_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixtures::write_file(dir.path(), "g.png", &fixtures::gradient_png(4, 4));

    let err = service(QuantizeSettings {
        colors: 1,
        ..Default::default()
    })
    .quantize_file(&input, &dir.path().join("never.png"))
    .unwrap_err();

    assert!(matches!(err, ImageError::Quantize(_)), "got {err:?}");
    assert!(!dir.path().join("never.png").exists());
}

#[test]
fn test_inspect_counts_colors() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixtures::write_file(dir.path(), "g.png", &fixtures::gradient_png(20, 15));

    let report = service(QuantizeSettings::default()).inspect_file(&input).unwrap();

    assert_eq!(report.width, 20);
    assert_eq!(report.height, 15);
    assert_eq!(report.distinct_colors, 300);
    assert!(!report.has_transparency);
    assert_eq!(report.image_type, "image/gif");
}

#[test]
fn test_config_preset_drives_service() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = fixtures::write_file(
        dir.path(),
        "pnnquant.yaml",
        b"presets:\n  icon:\n    colors: 4\n    dither: false\noptimize: false\n",
    );
    let config = AppConfig::load(Some(config_path.as_path()));
    let settings = config.settings(Some("icon")).unwrap();
    assert_eq!(settings.colors, 4);
    assert!(!config.optimize);

    let input = fixtures::write_file(dir.path(), "g.png", &fixtures::gradient_png(16, 16));
    let output = dir.path().join("icon.png");
    let report = QuantizeService::new(settings, config.optimize, config.max_pixels)
        .quantize_file(&input, &output)
        .unwrap();

    assert!(report.palette_len <= 4);
    assert!(!report.dither);
    common::assert_indexed_png(&std::fs::read(&output).unwrap(), 4);
}

#[tokio::test]
async fn test_batch_quantizes_every_file() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        fixtures::write_file(dir.path(), "a.png", &fixtures::gradient_png(12, 12)),
        fixtures::write_file(dir.path(), "b.png", &fixtures::transparent_edge_png(10, 8)),
        fixtures::write_file(dir.path(), "broken.png", b"not a png"),
    ];
    let out_dir = dir.path().join("out");

    let service = Arc::new(service(QuantizeSettings {
        colors: 6,
        ..Default::default()
    }));
    let outcomes = service.quantize_batch(inputs, out_dir.clone()).await.unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].report.is_some());
    assert!(outcomes[1].report.is_some());
    assert!(outcomes[2].error.is_some(), "Broken input should fail alone");

    for name in ["a.png", "b.png"] {
        let data = std::fs::read(out_dir.join(name)).unwrap();
        common::assert_indexed_png(&data, 6);
    }
    assert!(!out_dir.join("broken.png").exists());
}
