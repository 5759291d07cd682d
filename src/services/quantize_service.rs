use crate::error::ImageError;
use crate::models::QuantizeSettings;
use crate::rendering::{decode_png, encode_png, optimize_png, DecodedImage};
use pnn_engine::{ImageTraits, QuantizedImage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Machine-readable summary of one quantization run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantizeReport {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub width: usize,
    pub height: usize,
    pub colors_requested: usize,
    pub palette_len: usize,
    pub distinct_colors: usize,
    pub route: String,
    pub image_type: String,
    pub transparent_index: Option<u16>,
    pub quality: String,
    pub dither: bool,
    pub bytes: usize,
}

/// Facts about an input image, without quantizing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    pub width: usize,
    pub height: usize,
    pub has_transparency: bool,
    pub has_semi_transparency: bool,
    pub distinct_colors: usize,
    /// Encoder hint the quantizer would report for the configured colors
    pub image_type: String,
}

/// Outcome of one file in a batch.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<QuantizeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Decodes PNGs, quantizes them with fixed settings and encodes the result.
///
/// Every call builds a fresh quantizer run, so one service can be shared
/// across batch workers.
#[derive(Debug, Clone)]
pub struct QuantizeService {
    settings: QuantizeSettings,
    optimize: bool,
    max_pixels: Option<usize>,
}

impl QuantizeService {
    pub fn new(settings: QuantizeSettings, optimize: bool, max_pixels: Option<usize>) -> Self {
        Self {
            settings,
            optimize,
            max_pixels,
        }
    }

    pub fn settings(&self) -> &QuantizeSettings {
        &self.settings
    }

    fn decode(&self, data: &[u8]) -> Result<DecodedImage, ImageError> {
        let decoded = decode_png(data)?;
        if let Some(max) = self.max_pixels {
            if decoded.pixels.len() > max {
                return Err(ImageError::TooLarge {
                    width: decoded.width,
                    height: decoded.height,
                    max,
                });
            }
        }
        Ok(decoded)
    }

    /// Quantize in-memory PNG data, returning the encoded result.
    pub fn quantize_png(&self, data: &[u8]) -> Result<(Vec<u8>, QuantizeReport), ImageError> {
        let decoded = self.decode(data)?;
        let image = self
            .settings
            .quantizer()
            .quantize(&decoded.pixels, decoded.width, decoded.height)?;
        let mut png_bytes = encode_png(&image)?;
        if self.optimize {
            png_bytes = optimize_png(png_bytes);
        }
        let report = self.report(&image, png_bytes.len());
        tracing::debug!(
            palette = report.palette_len,
            route = %report.route,
            bytes = report.bytes,
            "Quantized image"
        );
        Ok((png_bytes, report))
    }

    /// Quantize `input` and write the PNG to `output`.
    pub fn quantize_file(&self, input: &Path, output: &Path) -> Result<QuantizeReport, ImageError> {
        let data = std::fs::read(input)?;
        let (png_bytes, mut report) = self.quantize_png(&data)?;
        std::fs::write(output, &png_bytes)?;
        report.input = Some(input.to_path_buf());
        report.output = Some(output.to_path_buf());
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            colors = report.palette_len,
            bytes = report.bytes,
            "Wrote quantized image"
        );
        Ok(report)
    }

    /// Analyze `input` without quantizing it.
    pub fn inspect_file(&self, input: &Path) -> Result<InspectReport, ImageError> {
        let data = std::fs::read(input)?;
        let decoded = self.decode(&data)?;
        let traits = ImageTraits::scan(&decoded.pixels, self.settings.alpha_threshold);
        Ok(InspectReport {
            width: decoded.width,
            height: decoded.height,
            has_transparency: traits.transparent.is_some(),
            has_semi_transparency: traits.has_semi_transparency,
            distinct_colors: traits.distinct_colors,
            image_type: traits.image_type(self.settings.colors).mime().to_string(),
        })
    }

    /// Quantize every input into `out_dir`, one blocking worker per file.
    ///
    /// Jobs share nothing but the immutable settings; a failing file is
    /// reported in its outcome and does not stop the others.
    pub async fn quantize_batch(
        self: Arc<Self>,
        inputs: Vec<PathBuf>,
        out_dir: PathBuf,
    ) -> Result<Vec<BatchOutcome>, ImageError> {
        tokio::fs::create_dir_all(&out_dir).await?;

        let handles: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                let service = self.clone();
                let output = out_dir.join(output_name(&input));
                let job_input = input.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    service.quantize_file(&job_input, &output)
                });
                (input, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (input, handle) in handles {
            let result = handle
                .await
                .map_err(|e| ImageError::Task(e.to_string()))
                .and_then(|r| r);
            let outcome = match result {
                Ok(report) => BatchOutcome {
                    input,
                    report: Some(report),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(input = %input.display(), %e, "Failed to quantize");
                    BatchOutcome {
                        input,
                        report: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn report(&self, image: &QuantizedImage, bytes: usize) -> QuantizeReport {
        let stats = image.stats();
        QuantizeReport {
            input: None,
            output: None,
            width: image.width(),
            height: image.height(),
            colors_requested: self.settings.colors,
            palette_len: image.palette().len(),
            distinct_colors: stats.distinct_colors,
            route: stats.route.to_string(),
            image_type: image.image_type().mime().to_string(),
            transparent_index: image.transparent_index(),
            quality: pnn_engine::Quality::from(self.settings.quality).to_string(),
            dither: self.settings.dither,
            bytes,
        }
    }
}

/// `photo.png` -> `photo.png`, `scan.PNG` -> `scan.png`, `raw` -> `raw.png`.
fn output_name(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    PathBuf::from(format!("{stem}.png"))
}
