//! Best-effort logo color sampling.
//!
//! The logo path is an auxiliary signal for the hybrid fallback state: fetch
//! the image through the same vetted fetcher, decode it, downscale to a small
//! thumbnail, and rank quantized opaque pixels by frequency. Every failure is
//! swallowed with a warning and an empty list, so a missing or broken logo
//! can never fail an extraction.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::cluster::lab::Rgb;
use crate::config::LogoConfig;
use crate::css::color::saturation;
use crate::fetch::ContentFetcher;

/// Longest thumbnail side the logo is downscaled to before sampling.
const THUMBNAIL_EDGE: u32 = 64;

/// Pixels with alpha below this are treated as transparent and skipped.
const MIN_ALPHA: u8 = 128;

/// Channels snap to buckets of this width before counting, so anti-aliased
/// shades of one brand color land on one bucket.
const QUANT_STEP: u8 = 32;

pub struct LogoExtractor {
    fetcher: Arc<ContentFetcher>,
    config: LogoConfig,
    min_saturation: f32,
}

impl LogoExtractor {
    pub fn new(fetcher: Arc<ContentFetcher>, config: LogoConfig, min_saturation: f32) -> Self {
        Self {
            fetcher,
            config,
            min_saturation,
        }
    }

    /// Sample the dominant colors of a logo image, most frequent first.
    ///
    /// Always returns a list. A logo that is off-allowlist, unfetchable, or
    /// undecodable contributes an empty one rather than an error.
    pub async fn extract(&self, url: &Url) -> Vec<String> {
        if !self.domain_allowed(url) {
            warn!(url = %url, "logo host is not in the image allowlist");
            return Vec::new();
        }
        let document = match self.fetcher.fetch(url).await {
            Ok(document) => document,
            Err(e) => {
                warn!(url = %url, error = %e, "logo fetch failed");
                return Vec::new();
            }
        };
        match self.sample(&document.bytes) {
            Some(colors) => colors,
            None => {
                warn!(url = %url, "logo bytes did not decode as an image");
                Vec::new()
            }
        }
    }

    /// Exact or subdomain match against the configured allowlist. An empty
    /// allowlist permits any host the fetch guard accepts.
    fn domain_allowed(&self, url: &Url) -> bool {
        if self.config.allowed_domains.is_empty() {
            return true;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.config.allowed_domains.iter().any(|entry| {
            let allowed = entry.trim_end_matches('.').to_ascii_lowercase();
            host == allowed || host.ends_with(&format!(".{allowed}"))
        })
    }

    fn sample(&self, bytes: &[u8]) -> Option<Vec<String>> {
        let decoded = image::load_from_memory(bytes).ok()?;
        let thumb = decoded.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE).to_rgba8();

        let mut counts: HashMap<Rgb, u32> = HashMap::new();
        for pixel in thumb.pixels() {
            let [r, g, b, a] = pixel.0;
            if a < MIN_ALPHA {
                continue;
            }
            let quantized = Rgb::new(quantize(r), quantize(g), quantize(b));
            if saturation(quantized) < self.min_saturation {
                continue;
            }
            *counts.entry(quantized).or_insert(0) += 1;
        }

        let mut ranked: Vec<(Rgb, u32)> = counts.into_iter().collect();
        ranked.sort_by(|(a, ca), (b, cb)| cb.cmp(ca).then_with(|| a.to_hex().cmp(&b.to_hex())));
        debug!(distinct = ranked.len(), "sampled logo colors");
        Some(
            ranked
                .into_iter()
                .take(self.config.max_colors)
                .map(|(rgb, _)| rgb.to_hex())
                .collect(),
        )
    }
}

/// Snap a channel to the middle of its quantization bucket.
fn quantize(channel: u8) -> u8 {
    (channel / QUANT_STEP * QUANT_STEP).saturating_add(QUANT_STEP / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ContentFetcher;
    use crate::testsupport::{http_response, local_fetch_config, FixtureServer, StaticResolver};
    use image::{Rgba, RgbaImage};
    use std::collections::HashMap;

    fn extractor(fetcher: ContentFetcher, allowed: &[&str]) -> LogoExtractor {
        let config = LogoConfig {
            allowed_domains: allowed.iter().map(|d| d.to_string()).collect(),
            max_colors: 6,
        };
        LogoExtractor::new(Arc::new(fetcher), config, 0.15)
    }

    fn local_extractor(allowed: &[&str]) -> LogoExtractor {
        let fetcher = ContentFetcher::new(local_fetch_config(), Box::new(StaticResolver::empty()));
        extractor(fetcher, allowed)
    }

    fn png_bytes(image: RgbaImage) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn sample_ranks_the_dominant_color_first() {
        let mut img = RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 255]));
        for x in 0..16 {
            img.put_pixel(x, 0, Rgba([0, 0, 255, 255]));
        }
        let colors = local_extractor(&[]).sample(&png_bytes(img)).unwrap();
        let red = Rgb::new(quantize(255), quantize(0), quantize(0)).to_hex();
        let blue = Rgb::new(quantize(0), quantize(0), quantize(255)).to_hex();
        assert_eq!(colors, vec![red, blue]);
    }

    #[test]
    fn sample_skips_transparent_pixels() {
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 10]));
        img.put_pixel(3, 3, Rgba([0, 255, 0, 255]));
        let colors = local_extractor(&[]).sample(&png_bytes(img)).unwrap();
        let green = Rgb::new(quantize(0), quantize(255), quantize(0)).to_hex();
        assert_eq!(colors, vec![green]);
    }

    #[test]
    fn sample_skips_structural_grays() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([120, 120, 120, 255]));
        let colors = local_extractor(&[]).sample(&png_bytes(img)).unwrap();
        assert!(colors.is_empty());
    }

    #[test]
    fn sample_caps_at_the_configured_color_count() {
        let swatches: [[u8; 3]; 8] = [
            [255, 0, 0],
            [0, 255, 0],
            [0, 0, 255],
            [255, 255, 0],
            [255, 0, 255],
            [0, 255, 255],
            [128, 0, 255],
            [255, 128, 0],
        ];
        let mut img = RgbaImage::new(8, 8);
        for (i, [r, g, b]) in swatches.iter().enumerate() {
            for y in 0..8 {
                img.put_pixel(i as u32, y, Rgba([*r, *g, *b, 255]));
            }
        }
        let colors = local_extractor(&[]).sample(&png_bytes(img)).unwrap();
        assert_eq!(colors.len(), 6);
    }

    #[test]
    fn sample_rejects_bytes_that_are_not_an_image() {
        assert!(local_extractor(&[]).sample(b"not a png").is_none());
    }

    #[test]
    fn allowlist_matches_exact_and_subdomain_hosts() {
        let logo = local_extractor(&["cdn.example.com"]);
        let allowed = Url::parse("https://cdn.example.com/logo.png").unwrap();
        let sub = Url::parse("https://img.cdn.example.com/logo.png").unwrap();
        let lookalike = Url::parse("https://notcdn.example.com/logo.png").unwrap();
        assert!(logo.domain_allowed(&allowed));
        assert!(logo.domain_allowed(&sub));
        assert!(!logo.domain_allowed(&lookalike));
    }

    #[tokio::test]
    async fn off_allowlist_logo_is_never_fetched() {
        let server = FixtureServer::start(HashMap::new()).await;
        let fetcher = ContentFetcher::new(local_fetch_config(), Box::new(StaticResolver::empty()));
        let logo = extractor(fetcher, &["cdn.example.com"]);

        let url = Url::parse(&server.url("/logo.png")).unwrap();
        assert!(logo.extract(&url).await.is_empty());
        assert!(server.hits().is_empty());
    }

    #[tokio::test]
    async fn extracts_colors_from_a_served_png() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([26, 115, 232, 255]));
        let mut routes = HashMap::new();
        routes.insert(
            "/logo.png".to_string(),
            http_response(200, "image/png", &png_bytes(img)),
        );
        let server = FixtureServer::start(routes).await;
        let fetcher = ContentFetcher::new(local_fetch_config(), Box::new(StaticResolver::empty()));
        let logo = extractor(fetcher, &[]);

        let url = Url::parse(&server.url("/logo.png")).unwrap();
        let colors = logo.extract(&url).await;
        let expected = Rgb::new(quantize(26), quantize(115), quantize(232)).to_hex();
        assert_eq!(colors, vec![expected]);
    }

    #[tokio::test]
    async fn unfetchable_logo_contributes_nothing() {
        let server = FixtureServer::start(HashMap::new()).await;
        let fetcher = ContentFetcher::new(local_fetch_config(), Box::new(StaticResolver::empty()));
        let logo = extractor(fetcher, &[]);

        let url = Url::parse(&server.url("/missing.png")).unwrap();
        assert!(logo.extract(&url).await.is_empty());
    }
}
