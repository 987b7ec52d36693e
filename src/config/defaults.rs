//! Default configuration constants.
//!
//! Keeping defaults in one module makes behavior-preserving refactors safer:
//! callers can share the same constants without duplicating literals.

/// Default timeout for a single page or stylesheet request.
pub(super) const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
/// Default ceiling on a single response body (5 MiB).
pub(super) const DEFAULT_MAX_CONTENT_BYTES: u64 = 5 * 1024 * 1024;
/// Default maximum number of redirect hops followed per request.
pub(super) const DEFAULT_MAX_REDIRECTS: u32 = 5;
/// Default User-Agent header sent with every outbound request.
pub(super) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; sitetint/0.2)";
/// Default maximum `@import` nesting depth below a linked stylesheet.
pub(super) const DEFAULT_MAX_IMPORT_DEPTH: u32 = 2;
/// Default time-to-live for cached stylesheet bodies.
pub(super) const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
/// Default minimum HSL saturation for a candidate to count as chromatic.
pub(super) const DEFAULT_MIN_SATURATION: f32 = 0.15;
/// Weight for declarations found under `:root` / `html` / `body`.
pub(super) const DEFAULT_ROOT_SELECTOR_WEIGHT: f32 = 3.0;
/// Weight for declarations under selectors carrying a brand marker.
pub(super) const DEFAULT_BRAND_SELECTOR_WEIGHT: f32 = 2.0;
/// Weight for every other selector.
pub(super) const DEFAULT_BASE_SELECTOR_WEIGHT: f32 = 1.0;
/// Default maximum number of palette entries kept after clustering.
pub(super) const DEFAULT_MAX_PALETTE: usize = 8;
/// Default CIELAB delta-E below which two clusters merge into one entry.
pub(super) const DEFAULT_DEDUPE_DELTA_E: f32 = 30.0;
/// Default cap on k-means refinement iterations.
pub(super) const DEFAULT_MAX_KMEANS_ITERATIONS: usize = 100;
/// Default WCAG AA contrast ratio enforced for text roles.
pub(super) const DEFAULT_CONTRAST_FLOOR: f32 = 4.5;
/// Default cap on lightness-shift steps while restoring contrast.
pub(super) const DEFAULT_CONTRAST_SHIFT_CAP: usize = 50;
/// Default maximum number of colors sampled from a logo image.
pub(super) const DEFAULT_LOGO_MAX_COLORS: usize = 6;

/// Substrings that mark a selector as brand-relevant.
pub(super) fn default_brand_markers() -> Vec<String> {
    [
        "brand", "primary", "accent", "theme", "header", "nav", "logo", "btn", "button",
        "link", "hero", "cta",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Hostnames refused before DNS resolution is even attempted.
pub(super) fn default_denied_hosts() -> Vec<String> {
    ["localhost", "metadata.google.internal"]
        .into_iter()
        .map(str::to_string)
        .collect()
}
