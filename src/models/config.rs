use crate::error::ImageError;
use pnn_engine::{Quality, Quantizer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Quality names accepted in config files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QualityName {
    Standard,
    #[default]
    High,
}

impl From<QualityName> for Quality {
    fn from(name: QualityName) -> Self {
        match name {
            QualityName::Standard => Quality::Standard,
            QualityName::High => Quality::High,
        }
    }
}

/// One complete set of quantizer settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct QuantizeSettings {
    pub colors: usize,
    pub dither: bool,
    pub quality: QualityName,
    pub alpha_threshold: u8,
}

impl Default for QuantizeSettings {
    fn default() -> Self {
        Self {
            colors: 256,
            dither: true,
            quality: QualityName::High,
            alpha_threshold: pnn_engine::api::DEFAULT_ALPHA_THRESHOLD,
        }
    }
}

impl QuantizeSettings {
    pub fn quantizer(&self) -> Quantizer {
        Quantizer::new(self.colors)
            .dither(self.dither)
            .quality(self.quality.into())
            .alpha_threshold(self.alpha_threshold)
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverride {
    pub colors: Option<usize>,
    pub dither: Option<bool>,
    pub quality: Option<QualityName>,
    pub alpha_threshold: Option<u8>,
}

impl SettingsOverride {
    pub fn apply(&self, mut settings: QuantizeSettings) -> QuantizeSettings {
        if let Some(colors) = self.colors {
            settings.colors = colors;
        }
        if let Some(dither) = self.dither {
            settings.dither = dither;
        }
        if let Some(quality) = self.quality {
            settings.quality = quality;
        }
        if let Some(threshold) = self.alpha_threshold {
            settings.alpha_threshold = threshold;
        }
        settings
    }
}

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Settings used when no preset is named
    pub defaults: QuantizeSettings,

    /// Named settings, selected with `--preset`
    pub presets: HashMap<String, QuantizeSettings>,

    /// Recompress written PNGs with oxipng
    pub optimize: bool,

    /// Refuse inputs with more pixels than this
    pub max_pixels: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: QuantizeSettings::default(),
            presets: HashMap::new(),
            optimize: true,
            max_pixels: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file is missing or malformed.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        presets = config.presets.len(),
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Settings for `preset`, or the defaults when none is named.
    pub fn settings(&self, preset: Option<&str>) -> Result<QuantizeSettings, ImageError> {
        match preset {
            None => Ok(self.defaults.clone()),
            Some(name) => self
                .presets
                .get(name)
                .cloned()
                .ok_or_else(|| ImageError::UnknownPreset(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.defaults.colors, 256);
        assert!(config.defaults.dither);
        assert_eq!(config.defaults.quality, QualityName::High);
        assert_eq!(config.defaults.alpha_threshold, 15);
        assert!(config.presets.is_empty());
        assert!(config.optimize);
        assert_eq!(config.max_pixels, None);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
defaults:
  colors: 64
  quality: standard
presets:
  icon:
    colors: 16
    dither: false
  web:
    colors: 128
optimize: false
max_pixels: 1000000
"#;

        let config = AppConfig::parse(yaml).unwrap();

        assert_eq!(config.defaults.colors, 64);
        assert_eq!(config.defaults.quality, QualityName::Standard);
        assert!(config.defaults.dither, "Missing fields should take defaults");
        assert!(!config.optimize);
        assert_eq!(config.max_pixels, Some(1_000_000));

        let icon = config.presets.get("icon").unwrap();
        assert_eq!(icon.colors, 16);
        assert!(!icon.dither);
        assert_eq!(icon.quality, QualityName::High);
    }

    #[test]
    fn test_settings_by_preset() {
        let mut config = AppConfig::default();
        config.presets.insert(
            "tiny".to_string(),
            QuantizeSettings {
                colors: 4,
                ..Default::default()
            },
        );

        assert_eq!(config.settings(None).unwrap().colors, 256);
        assert_eq!(config.settings(Some("tiny")).unwrap().colors, 4);
        assert!(matches!(
            config.settings(Some("huge")),
            Err(ImageError::UnknownPreset(name)) if name == "huge"
        ));
    }

    #[test]
    fn test_override_takes_precedence() {
        let overrides = SettingsOverride {
            colors: Some(8),
            dither: Some(false),
            ..Default::default()
        };
        let settings = overrides.apply(QuantizeSettings::default());

        assert_eq!(settings.colors, 8);
        assert!(!settings.dither);
        assert_eq!(settings.quality, QualityName::High);
        assert_eq!(settings.alpha_threshold, 15);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load(Some(Path::new("/nonexistent/pnnquant.yaml")));
        assert_eq!(config, AppConfig::default());
        assert_eq!(AppConfig::load(None), AppConfig::default());
    }

    #[test]
    fn test_load_malformed_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "defaults: [not, a, map]").unwrap();

        let config = AppConfig::load(Some(file.path()));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_quality_name_maps_to_engine() {
        assert_eq!(Quality::from(QualityName::Standard), Quality::Standard);
        assert_eq!(Quality::from(QualityName::High), Quality::High);
    }
}
