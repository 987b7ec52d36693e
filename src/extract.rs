//! Candidate-color extraction from collected style rules.
//!
//! Each rule's selector earns a weight (root-level highest, brand-marked
//! selectors medium, everything else baseline), `var()` references are
//! resolved against the collected custom-property map, and every color
//! literal found in a color-bearing declaration is normalized and
//! accumulated. Structural grays and pure black/white carry no brand signal
//! and are dropped before accumulation.

use std::collections::HashMap;

use crate::cluster::lab::Rgb;
use crate::config::ExtractorConfig;
use crate::css::color::{normalize_color, saturation};
use crate::css::ParsedStylesheet;

/// Passes of `var()` substitution before giving up on a value. Bounds both
/// nesting depth and reference cycles.
const VAR_RESOLUTION_PASSES: usize = 4;

/// Properties whose values are scanned for color literals.
const COLOR_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "background",
    "border-color",
    "border",
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
    "outline-color",
    "fill",
    "stroke",
];

/// Colors that never count as brand signal.
const IGNORED_COLORS: &[&str] = &["#000000", "#ffffff"];

/// One normalized color with its accumulated evidence.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateColor {
    pub hex: String,
    /// How many declarations produced this color.
    pub count: u32,
    /// Sum of the selector weights of those declarations.
    pub weight: f32,
    /// Distinct selectors the color was seen under, in discovery order.
    pub selectors: Vec<String>,
}

pub struct ColorExtractor {
    config: ExtractorConfig,
}

impl ColorExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Rank every chromatic color the stylesheet mentions.
    ///
    /// The result is sorted by cumulative weight, then occurrence count,
    /// then hex so equal evidence stays deterministic.
    pub fn extract(&self, sheet: &ParsedStylesheet) -> Vec<CandidateColor> {
        let mut accumulated: HashMap<String, CandidateColor> = HashMap::new();

        for rule in &sheet.rules {
            let weight = self.selector_weight(&rule.selector);
            for declaration in &rule.declarations {
                if !is_color_bearing(&declaration.property) {
                    continue;
                }
                let resolved = resolve_value(&declaration.value, &sheet.variables);
                for token in color_tokens(&resolved) {
                    let Some(hex) = normalize_color(&token) else {
                        continue;
                    };
                    if IGNORED_COLORS.contains(&hex.as_str()) {
                        continue;
                    }
                    let Some(rgb) = Rgb::from_hex(&hex) else {
                        continue;
                    };
                    if saturation(rgb) < self.config.min_saturation {
                        continue;
                    }
                    let entry =
                        accumulated
                            .entry(hex.clone())
                            .or_insert_with(|| CandidateColor {
                                hex: hex.clone(),
                                count: 0,
                                weight: 0.0,
                                selectors: Vec::new(),
                            });
                    entry.count += 1;
                    entry.weight += weight;
                    if !entry.selectors.contains(&rule.selector) {
                        entry.selectors.push(rule.selector.clone());
                    }
                }
            }
        }

        let mut candidates: Vec<CandidateColor> = accumulated.into_values().collect();
        candidates.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then(b.count.cmp(&a.count))
                .then_with(|| a.hex.cmp(&b.hex))
        });
        candidates
    }

    /// Root-level beats brand-marked beats baseline; a selector list earns
    /// the highest weight any of its parts qualifies for.
    fn selector_weight(&self, selector: &str) -> f32 {
        let lower = selector.to_ascii_lowercase();
        let root_level = lower.split(',').any(|part| {
            let part = part.trim();
            part == "html" || part == "body" || part == ":root" || part.starts_with(":root")
        });
        if root_level {
            return self.config.root_selector_weight;
        }
        if self
            .config
            .brand_markers
            .iter()
            .any(|marker| lower.contains(marker.as_str()))
        {
            return self.config.brand_selector_weight;
        }
        self.config.base_selector_weight
    }
}

fn is_color_bearing(property: &str) -> bool {
    COLOR_PROPERTIES.contains(&property) || property.starts_with("--")
}

// ---------------------------------------------------------------------------
// var() resolution
// ---------------------------------------------------------------------------

/// Substitute `var()` references, resolving against the variable map and
/// falling back to the inline default for unknown names. Runs a bounded
/// number of passes so nested references resolve and cycles terminate;
/// anything still unresolved is left literal and will not parse as a color.
pub(crate) fn resolve_value(raw: &str, variables: &HashMap<String, String>) -> String {
    let mut value = raw.to_string();
    for _ in 0..VAR_RESOLUTION_PASSES {
        let (next, changed) = substitute_pass(&value, variables);
        value = next;
        if !changed {
            break;
        }
    }
    value
}

/// Replace every top-level `var(...)` occurrence once, left to right.
fn substitute_pass(value: &str, variables: &HashMap<String, String>) -> (String, bool) {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut changed = false;
    while let Some(start) = rest.find("var(") {
        let open = start + 3;
        let Some(close) = matching_paren(rest, open) else {
            break;
        };
        out.push_str(&rest[..start]);
        let inner = &rest[open + 1..close];
        let (name, fallback) = match inner.split_once(',') {
            Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
            None => (inner.trim(), None),
        };
        let replacement = variables
            .get(name)
            .map(String::as_str)
            .or(fallback)
            .unwrap_or("");
        out.push_str(replacement);
        changed = true;
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    (out, changed)
}

/// Index of the `)` matching the `(` at `open`.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0u32;
    for (idx, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Token scanning
// ---------------------------------------------------------------------------

/// Lift candidate color tokens out of a (possibly multi-part) value, keeping
/// functional syntax like `rgb(26, 115, 232)` intact.
fn color_tokens(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let lower = value.to_ascii_lowercase();
    let mut i = 0;
    while i < value.len() {
        let rest = &value[i..];
        if rest.starts_with('#') {
            let end = rest[1..]
                .find(|c: char| !c.is_ascii_hexdigit())
                .map(|offset| i + 1 + offset)
                .unwrap_or(value.len());
            tokens.push(value[i..end].to_string());
            i = end;
            continue;
        }
        if lower[i..].starts_with("rgb") || lower[i..].starts_with("hsl") {
            let after = &lower[i + 3..];
            let paren_offset = if after.starts_with('a') { 4 } else { 3 };
            if lower[i + paren_offset..].starts_with('(') {
                if let Some(close) = matching_paren(value, i + paren_offset) {
                    tokens.push(value[i..=close].to_string());
                    i = close + 1;
                    continue;
                }
            }
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }
    tokens
}
