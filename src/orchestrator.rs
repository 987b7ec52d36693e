//! Theme extraction orchestrator.
//!
//! [`ThemeOrchestrator`] runs the fallback cascade for one website: a CSS
//! extraction pass first, then an optional logo signal merged with the weak
//! CSS colors, then any non-empty CSS palette, and finally the built-in
//! default. Internal failures never escape; every path terminates in a
//! usable result carrying a provenance tag and a confidence score. The only
//! caller-visible error is a website URL that does not parse at all.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::cluster::lab::{Lab, Rgb};
use crate::cluster::PerceptualClusterer;
use crate::config::ExtractionConfig;
use crate::css::{ParsedStylesheet, StylesheetCache, StylesheetCollector};
use crate::error::ExtractError;
use crate::extract::{resolve_value, ColorExtractor};
use crate::fetch::{ContentFetcher, HostResolver, SystemResolver};
use crate::logo::LogoExtractor;
use crate::theme::{self, ThemeBundle};

/// Confidence at or above which the CSS palette is accepted outright.
const ACCEPT_CONFIDENCE: f32 = 0.6;

/// Palette entries required by the css and hybrid acceptance checks.
const MIN_ACCEPTED_COLORS: usize = 3;

/// Distinct colors at which confidence saturates to 1.0.
const FULL_CONFIDENCE_COLORS: f32 = 5.0;

/// Where an accepted palette came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Css,
    Hybrid,
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Css => "css",
            Self::Hybrid => "hybrid",
            Self::Fallback => "fallback",
        })
    }
}

/// Everything one extraction produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Accepted palette as lowercase hex, largest signal first.
    pub palette: Vec<String>,
    /// Custom-property bindings with `var()` references substituted.
    pub variables: BTreeMap<String, String>,
    /// `min(colors / 5, 1.0)`; 0 on the fallback path.
    pub confidence: f32,
    pub provenance: Provenance,
    pub themes: ThemeBundle,
}

/// The single entry point for theme extraction.
pub struct ThemeOrchestrator {
    config: ExtractionConfig,
    fetcher: Arc<ContentFetcher>,
    collector: StylesheetCollector,
    extractor: ColorExtractor,
    clusterer: PerceptualClusterer,
    logo: LogoExtractor,
}

impl ThemeOrchestrator {
    /// Orchestrator backed by system DNS.
    pub fn new(config: ExtractionConfig) -> Self {
        Self::with_resolver(config, Box::new(SystemResolver))
    }

    /// Orchestrator with an injected resolver. Tests use this to pin
    /// hostnames onto fixture servers.
    pub fn with_resolver(config: ExtractionConfig, resolver: Box<dyn HostResolver>) -> Self {
        let fetcher = Arc::new(ContentFetcher::new(config.fetch.clone(), resolver));
        let cache = StylesheetCache::new(config.collector.cache_ttl());
        let collector = StylesheetCollector::new(fetcher.clone(), cache, &config.collector);
        let extractor = ColorExtractor::new(config.extractor.clone());
        let clusterer = PerceptualClusterer::new(config.clusterer.clone());
        let logo = LogoExtractor::new(
            fetcher.clone(),
            config.logo.clone(),
            config.extractor.min_saturation,
        );
        Self {
            config,
            fetcher,
            collector,
            extractor,
            clusterer,
            logo,
        }
    }

    /// Extract a theme for a website.
    ///
    /// Runs the cascade to a terminal state. Apart from an unparseable
    /// `website_url`, every failure degrades to a weaker state instead of
    /// propagating.
    pub async fn extract(
        &self,
        website_url: &str,
        logo_url: Option<&str>,
    ) -> Result<ExtractionResult, ExtractError> {
        let url = Url::parse(website_url)?;

        let sheet = self.css_signal(&url).await;
        let candidates = self.extractor.extract(&sheet);
        let css_palette = self
            .clusterer
            .cluster(&candidates)
            .map(|clustered| clustered.palette)
            .unwrap_or_default();
        let variables = resolved_variables(&sheet.variables);

        let confidence = confidence_for(css_palette.len());
        if confidence >= ACCEPT_CONFIDENCE && css_palette.len() >= MIN_ACCEPTED_COLORS {
            return Ok(self.finish(css_palette, variables, Provenance::Css));
        }

        if let Some(raw) = logo_url {
            if let Some(merged) = self.logo_signal(raw, &css_palette).await {
                return Ok(self.finish(merged, variables, Provenance::Hybrid));
            }
        }

        if !css_palette.is_empty() {
            debug!(colors = css_palette.len(), "accepting weak css palette");
            return Ok(self.finish(css_palette, variables, Provenance::Css));
        }

        Ok(self.finish(theme::default_palette(), variables, Provenance::Fallback))
    }

    /// Fetch the page and aggregate every reachable stylesheet. A page that
    /// cannot be fetched yields an empty sheet.
    async fn css_signal(&self, url: &Url) -> ParsedStylesheet {
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, error = %e, "page fetch failed");
                return ParsedStylesheet::default();
            }
        };
        let html = page.text();
        self.collector.collect(&html, &page.final_url).await
    }

    /// Fetch the logo and merge it with the weak CSS palette, logo colors
    /// first. `None` when the logo contributes nothing or the merge stays
    /// below the acceptance size.
    async fn logo_signal(&self, raw: &str, css_palette: &[String]) -> Option<Vec<String>> {
        let logo_url = match Url::parse(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(url = raw, error = %e, "ignoring unparseable logo url");
                return None;
            }
        };
        let logo_colors = self.logo.extract(&logo_url).await;
        if logo_colors.is_empty() {
            return None;
        }
        let merged = merge_palettes(
            &logo_colors,
            css_palette,
            self.config.clusterer.dedupe_delta_e,
            self.config.clusterer.max_palette,
        );
        (merged.len() >= MIN_ACCEPTED_COLORS).then_some(merged)
    }

    fn finish(
        &self,
        palette: Vec<String>,
        variables: BTreeMap<String, String>,
        provenance: Provenance,
    ) -> ExtractionResult {
        let confidence = match provenance {
            Provenance::Fallback => 0.0,
            _ => confidence_for(palette.len()),
        };
        let themes = ThemeBundle::from_palette(
            &palette,
            self.config.clusterer.contrast_floor,
            self.config.clusterer.contrast_shift_cap,
        );
        debug!(%provenance, colors = palette.len(), confidence, "extraction settled");
        ExtractionResult {
            palette,
            variables,
            confidence,
            provenance,
            themes,
        }
    }
}

fn confidence_for(colors: usize) -> f32 {
    (colors as f32 / FULL_CONFIDENCE_COLORS).min(1.0)
}

/// Union of two palettes under the perceptual dedupe rule, `first` walked
/// first, capped at `max` entries.
fn merge_palettes(first: &[String], second: &[String], dedupe_delta_e: f32, max: usize) -> Vec<String> {
    let mut kept: Vec<(String, Lab)> = Vec::new();
    for hex in first.iter().chain(second) {
        if kept.len() >= max {
            break;
        }
        let Some(rgb) = Rgb::from_hex(hex) else {
            continue;
        };
        let lab = rgb.to_lab();
        if kept
            .iter()
            .all(|(_, existing)| lab.delta_e(*existing) >= dedupe_delta_e)
        {
            kept.push((hex.clone(), lab));
        }
    }
    kept.into_iter().map(|(hex, _)| hex).collect()
}

/// Resolve every variable binding through the map itself, so consumers see
/// final values in name order.
fn resolved_variables(variables: &HashMap<String, String>) -> BTreeMap<String, String> {
    variables
        .iter()
        .map(|(name, value)| (name.clone(), resolve_value(value, variables)))
        .collect()
}
