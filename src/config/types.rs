//! Configuration data model.
//!
//! This module intentionally holds struct definitions plus default values.
//! Loader logic remains in `config::mod` so parsing and validation behavior
//! stays centralized.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{
    default_brand_markers, default_denied_hosts, DEFAULT_BASE_SELECTOR_WEIGHT,
    DEFAULT_BRAND_SELECTOR_WEIGHT, DEFAULT_CACHE_TTL_SECS, DEFAULT_CONTRAST_FLOOR,
    DEFAULT_CONTRAST_SHIFT_CAP, DEFAULT_DEDUPE_DELTA_E, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_LOGO_MAX_COLORS, DEFAULT_MAX_CONTENT_BYTES, DEFAULT_MAX_IMPORT_DEPTH,
    DEFAULT_MAX_KMEANS_ITERATIONS, DEFAULT_MAX_PALETTE, DEFAULT_MAX_REDIRECTS,
    DEFAULT_MIN_SATURATION, DEFAULT_ROOT_SELECTOR_WEIGHT, DEFAULT_USER_AGENT,
};

/// Top-level extraction configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub fetch: FetchConfig,
    pub collector: CollectorConfig,
    pub extractor: ExtractorConfig,
    pub clusterer: ClustererConfig,
    pub logo: LogoConfig,
}

/// Network fetch settings stored under `[fetch]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds (connect plus body).
    pub timeout_secs: u64,
    /// Hard ceiling on a single response body in bytes.
    pub max_content_bytes: u64,
    /// Redirect hops followed before the request is abandoned.
    pub max_redirects: u32,
    pub user_agent: String,
    /// Hostnames refused outright, before DNS resolution.
    pub denied_hosts: Vec<String>,
    /// Permit fetches that resolve to private/loopback ranges.
    /// Off in production; tests and local development enable it to reach
    /// fixture servers bound to 127.0.0.1.
    pub permit_private_ranges: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            denied_hosts: default_denied_hosts(),
            permit_private_ranges: false,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Stylesheet discovery settings stored under `[collector]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// `@import` nesting levels followed below a linked stylesheet.
    pub max_import_depth: u32,
    /// How long a fetched stylesheet body stays reusable.
    pub cache_ttl_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl CollectorConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Candidate-color scoring settings stored under `[extractor]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Minimum HSL saturation for a color to count as chromatic.
    pub min_saturation: f32,
    /// Weight applied to declarations under `:root`, `html`, or `body`.
    pub root_selector_weight: f32,
    /// Weight applied when the selector contains a brand marker.
    pub brand_selector_weight: f32,
    /// Weight applied to every other selector.
    pub base_selector_weight: f32,
    /// Substrings that mark a selector as brand-relevant.
    pub brand_markers: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_saturation: DEFAULT_MIN_SATURATION,
            root_selector_weight: DEFAULT_ROOT_SELECTOR_WEIGHT,
            brand_selector_weight: DEFAULT_BRAND_SELECTOR_WEIGHT,
            base_selector_weight: DEFAULT_BASE_SELECTOR_WEIGHT,
            brand_markers: default_brand_markers(),
        }
    }
}

/// Palette clustering settings stored under `[clusterer]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClustererConfig {
    /// Maximum palette entries surviving dedupe.
    pub max_palette: usize,
    /// CIELAB delta-E under which two clusters collapse into one.
    pub dedupe_delta_e: f32,
    /// Cap on k-means refinement iterations.
    pub max_iterations: usize,
    /// WCAG contrast ratio enforced for text roles.
    pub contrast_floor: f32,
    /// Lightness-shift steps allowed while restoring contrast.
    pub contrast_shift_cap: usize,
}

impl Default for ClustererConfig {
    fn default() -> Self {
        Self {
            max_palette: DEFAULT_MAX_PALETTE,
            dedupe_delta_e: DEFAULT_DEDUPE_DELTA_E,
            max_iterations: DEFAULT_MAX_KMEANS_ITERATIONS,
            contrast_floor: DEFAULT_CONTRAST_FLOOR,
            contrast_shift_cap: DEFAULT_CONTRAST_SHIFT_CAP,
        }
    }
}

/// Logo sampling settings stored under `[logo]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogoConfig {
    /// Domain allowlist for logo image fetches. When non-empty, only
    /// matching domains (exact or subdomain) are fetched.
    pub allowed_domains: Vec<String>,
    /// Maximum colors sampled from one logo image.
    pub max_colors: usize,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            allowed_domains: Vec::new(),
            max_colors: DEFAULT_LOGO_MAX_COLORS,
        }
    }
}
