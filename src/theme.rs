//! Theme model and variant builders.
//!
//! A [`Theme`] is the consumer-facing bundle of semantic color roles,
//! typography, spacing, and styling tokens. Variants are always built in
//! pairs: [`ThemeBundle::from_palette`] derives a light and a dark theme
//! from one accepted palette, sharing the brand roles while neutral and
//! status roles come from per-variant presets. The WCAG text contrast check
//! runs independently for each variant.

use serde::{Deserialize, Serialize};

use crate::cluster::lab::Rgb;
use crate::cluster::{readable_text, NeutralPreset, DARK_NEUTRALS, LIGHT_NEUTRALS};

/// Built-in palette for the default-fallback path: a neutral blue ramp that
/// reads acceptably on both light and dark backdrops.
pub const DEFAULT_PALETTE: [&str; 3] = ["#2563eb", "#3b82f6", "#60a5fa"];

/// [`DEFAULT_PALETTE`] as owned strings, in palette order.
pub fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|hex| hex.to_string()).collect()
}

/// Semantic color roles, all lowercase `#rrggbb`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ColorRoles {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub surface: String,
    pub text: String,
    pub text_secondary: String,
    pub border: String,
    pub success: String,
    pub warning: String,
    pub error: String,
}

/// Font stacks and type scale shared by both variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Typography {
    pub font_family: String,
    pub heading_font_family: String,
    pub monospace_font_family: String,
    pub base_size: String,
    pub scale_ratio: f32,
    pub weight_regular: u16,
    pub weight_medium: u16,
    pub weight_bold: u16,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family:
                "system-ui, -apple-system, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif"
                    .to_string(),
            heading_font_family:
                "system-ui, -apple-system, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif"
                    .to_string(),
            monospace_font_family: "ui-monospace, 'SF Mono', Menlo, Consolas, monospace"
                .to_string(),
            base_size: "16px".to_string(),
            scale_ratio: 1.25,
            weight_regular: 400,
            weight_medium: 500,
            weight_bold: 700,
        }
    }
}

/// Spacing scale shared by both variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Spacing {
    pub unit: String,
    pub scale: Vec<String>,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            unit: "4px".to_string(),
            scale: ["4px", "8px", "12px", "16px", "24px", "32px", "48px", "64px"]
                .iter()
                .map(|step| step.to_string())
                .collect(),
        }
    }
}

/// Corner radius and shadow tokens, per variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StyleTokens {
    pub radius_small: String,
    pub radius_medium: String,
    pub radius_large: String,
    pub shadow_low: String,
    pub shadow_medium: String,
    pub shadow_high: String,
}

impl StyleTokens {
    /// Radius and shadow defaults for one variant. Dark surfaces get denser
    /// shadows.
    fn for_variant(dark: bool) -> Self {
        let (low, medium, high) = if dark {
            (
                "0 1px 2px rgba(0, 0, 0, 0.5)",
                "0 2px 8px rgba(0, 0, 0, 0.55)",
                "0 8px 24px rgba(0, 0, 0, 0.6)",
            )
        } else {
            (
                "0 1px 2px rgba(0, 0, 0, 0.08)",
                "0 2px 8px rgba(0, 0, 0, 0.12)",
                "0 8px 24px rgba(0, 0, 0, 0.2)",
            )
        };
        Self {
            radius_small: "4px".to_string(),
            radius_medium: "8px".to_string(),
            radius_large: "16px".to_string(),
            shadow_low: low.to_string(),
            shadow_medium: medium.to_string(),
            shadow_high: high.to_string(),
        }
    }
}

/// One theme variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Theme {
    pub name: String,
    pub colors: ColorRoles,
    pub typography: Typography,
    pub spacing: Spacing,
    pub tokens: StyleTokens,
}

impl Theme {
    fn build(dark: bool, palette: &[String], contrast_floor: f32, shift_cap: usize) -> Self {
        let preset: &NeutralPreset = if dark { &DARK_NEUTRALS } else { &LIGHT_NEUTRALS };

        let primary = palette
            .first()
            .cloned()
            .unwrap_or_else(|| preset.text.to_hex());
        let secondary = palette.get(1).cloned().unwrap_or_else(|| primary.clone());
        let accent = palette.get(2).cloned().unwrap_or_else(|| secondary.clone());

        let text = readable_text(
            preset.text,
            preset.background,
            preset.surface,
            contrast_floor,
            shift_cap,
        );
        let text_secondary = muted_text(text, preset.background);

        let (success, warning, error) = if dark {
            ("#81c995", "#fdd663", "#f28b82")
        } else {
            ("#188038", "#e37400", "#d93025")
        };

        Self {
            name: if dark { "dark" } else { "light" }.to_string(),
            colors: ColorRoles {
                primary,
                secondary,
                accent,
                background: preset.background.to_hex(),
                surface: preset.surface.to_hex(),
                text: text.to_hex(),
                text_secondary: text_secondary.to_hex(),
                border: preset.border.to_hex(),
                success: success.to_string(),
                warning: warning.to_string(),
                error: error.to_string(),
            },
            typography: Typography::default(),
            spacing: Spacing::default(),
            tokens: StyleTokens::for_variant(dark),
        }
    }
}

/// Light and dark variants built together from one palette.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeBundle {
    pub light: Theme,
    pub dark: Theme,
}

impl ThemeBundle {
    /// Build both variants from an accepted palette.
    ///
    /// The first three palette entries become primary, secondary, and accent
    /// in both variants, reusing earlier entries when the palette is shorter.
    /// An empty palette falls back to the preset text color for all three.
    pub fn from_palette(palette: &[String], contrast_floor: f32, shift_cap: usize) -> Self {
        Self {
            light: Theme::build(false, palette, contrast_floor, shift_cap),
            dark: Theme::build(true, palette, contrast_floor, shift_cap),
        }
    }
}

/// Secondary text is the text color pulled a third of the way toward the
/// backdrop lightness.
fn muted_text(text: Rgb, background: Rgb) -> Rgb {
    let mut lab = text.to_lab();
    lab.l += (background.to_lab().l - lab.l) / 3.0;
    lab.to_rgb()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::lab::contrast_ratio;

    const FLOOR: f32 = 4.5;
    const CAP: usize = 50;

    fn palette(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|hex| hex.to_string()).collect()
    }

    #[test]
    fn brand_roles_are_shared_across_variants() {
        let bundle = ThemeBundle::from_palette(
            &palette(&["#1a73e8", "#d93025", "#fbbc04"]),
            FLOOR,
            CAP,
        );
        assert_eq!(bundle.light.colors.primary, "#1a73e8");
        assert_eq!(bundle.dark.colors.primary, "#1a73e8");
        assert_eq!(bundle.light.colors.secondary, bundle.dark.colors.secondary);
        assert_eq!(bundle.light.colors.accent, "#fbbc04");
    }

    #[test]
    fn short_palette_reuses_earlier_roles() {
        let bundle = ThemeBundle::from_palette(&palette(&["#1a73e8"]), FLOOR, CAP);
        assert_eq!(bundle.light.colors.secondary, "#1a73e8");
        assert_eq!(bundle.light.colors.accent, "#1a73e8");
    }

    #[test]
    fn empty_palette_uses_preset_text_for_brand_roles() {
        let bundle = ThemeBundle::from_palette(&[], FLOOR, CAP);
        assert_eq!(bundle.light.colors.primary, "#202124");
        assert_eq!(bundle.dark.colors.primary, "#e8eaed");
    }

    #[test]
    fn neutrals_differ_per_variant() {
        let bundle = ThemeBundle::from_palette(&palette(&["#1a73e8"]), FLOOR, CAP);
        assert_eq!(bundle.light.colors.background, "#ffffff");
        assert_eq!(bundle.dark.colors.background, "#202124");
        assert_ne!(bundle.light.colors.surface, bundle.dark.colors.surface);
        assert_ne!(bundle.light.colors.success, bundle.dark.colors.success);
    }

    #[test]
    fn text_clears_contrast_floor_in_both_variants() {
        let bundle = ThemeBundle::from_palette(&palette(&["#1a73e8"]), FLOOR, CAP);
        for theme in [&bundle.light, &bundle.dark] {
            let text = Rgb::from_hex(&theme.colors.text).unwrap();
            let background = Rgb::from_hex(&theme.colors.background).unwrap();
            let surface = Rgb::from_hex(&theme.colors.surface).unwrap();
            assert!(contrast_ratio(text, background) >= FLOOR, "{}", theme.name);
            assert!(contrast_ratio(text, surface) >= FLOOR, "{}", theme.name);
        }
    }

    #[test]
    fn secondary_text_sits_between_text_and_background() {
        let bundle = ThemeBundle::from_palette(&palette(&["#1a73e8"]), FLOOR, CAP);
        let text = Rgb::from_hex(&bundle.light.colors.text).unwrap().to_lab();
        let muted = Rgb::from_hex(&bundle.light.colors.text_secondary)
            .unwrap()
            .to_lab();
        assert!(muted.l > text.l);
        assert!(muted.l < 100.0);
    }

    #[test]
    fn themes_serialize_with_kebab_case_keys() {
        let bundle = ThemeBundle::from_palette(&palette(&["#1a73e8"]), FLOOR, CAP);
        let value = serde_json::to_value(&bundle.light).unwrap();
        assert_eq!(value["name"], "light");
        assert!(value["colors"]["text-secondary"].is_string());
        assert!(value["tokens"]["radius-small"].is_string());
        assert!(value["typography"]["font-family"].is_string());
    }

    #[test]
    fn themes_survive_a_serde_round_trip() {
        let bundle = ThemeBundle::from_palette(&palette(&["#1a73e8", "#d93025"]), FLOOR, CAP);
        let json = serde_json::to_string(&bundle).unwrap();
        let back: ThemeBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bundle);
    }

    #[test]
    fn default_palette_entries_are_valid_hex() {
        let entries = default_palette();
        assert_eq!(entries.len(), DEFAULT_PALETTE.len());
        for hex in &entries {
            assert!(Rgb::from_hex(hex).is_some(), "{hex}");
        }
    }
}
