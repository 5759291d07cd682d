pub mod config;

pub use config::{AppConfig, QualityName, QuantizeSettings, SettingsOverride};
