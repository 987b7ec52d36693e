//! Configuration loading from TOML files.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. TOML file passed explicitly by the embedding application
//! 2. Built-in defaults
//!
//! Every section and field is optional; an empty file or `None` path yields
//! the default configuration.

use crate::error::ConfigError;
use std::path::Path;

mod defaults;
mod types;

pub use types::{
    ClustererConfig, CollectorConfig, ExtractionConfig, ExtractorConfig, FetchConfig, LogoConfig,
};

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load configuration from disk.
///
/// `path_override` is an explicit config file path; `None` means defaults.
pub fn load_config(path_override: Option<&str>) -> Result<ExtractionConfig, ConfigError> {
    match path_override {
        Some(path) => {
            let text = std::fs::read_to_string(Path::new(path))?;
            from_toml_str(&text)
        }
        None => Ok(ExtractionConfig::default()),
    }
}

/// Parse configuration from a TOML string and validate the result.
pub fn from_toml_str(text: &str) -> Result<ExtractionConfig, ConfigError> {
    let config: ExtractionConfig = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config.fetch.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "fetch.timeout_secs must be at least 1".to_string(),
        ));
    }
    if config.fetch.max_content_bytes == 0 {
        return Err(ConfigError::Invalid(
            "fetch.max_content_bytes must be at least 1".to_string(),
        ));
    }
    if config.clusterer.max_palette == 0 {
        return Err(ConfigError::Invalid(
            "clusterer.max_palette must be at least 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.extractor.min_saturation) {
        return Err(ConfigError::Invalid(
            "extractor.min_saturation must be between 0.0 and 1.0".to_string(),
        ));
    }
    if config.clusterer.contrast_floor < 1.0 {
        return Err(ConfigError::Invalid(
            "clusterer.contrast_floor must be at least 1.0".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
