//! Parsing and normalization of CSS color literals.
//!
//! Every syntax the extractor understands is a tagged variant here, each with
//! its own normalization rule. Everything normalizes to lowercase `#rrggbb`;
//! fully transparent values normalize to `None` so callers drop them.

use crate::cluster::lab::Rgb;

/// A literal color value lifted out of a CSS declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorLiteral {
    /// Raw hex digits without the `#`, length 3, 4, 6, or 8.
    Hex(String),
    Rgb { r: u8, g: u8, b: u8, alpha: f32 },
    Hsl { h: f32, s: f32, l: f32, alpha: f32 },
}

impl ColorLiteral {
    /// Parse a single color token. Keywords (`transparent`, `inherit`, ...)
    /// and malformed values yield `None`.
    pub fn parse(raw: &str) -> Option<ColorLiteral> {
        let token = raw.trim();
        if let Some(digits) = token.strip_prefix('#') {
            return parse_hex(digits);
        }
        let lower = token.to_ascii_lowercase();
        if let Some(body) = strip_function(&lower, &["rgba", "rgb"]) {
            return parse_rgb_args(body);
        }
        if let Some(body) = strip_function(&lower, &["hsla", "hsl"]) {
            return parse_hsl_args(body);
        }
        None
    }

    /// Normalize to lowercase `#rrggbb`, dropping any alpha channel.
    /// Fully transparent colors yield `None`.
    pub fn normalize(&self) -> Option<String> {
        match self {
            ColorLiteral::Hex(digits) => normalize_hex(digits),
            ColorLiteral::Rgb { r, g, b, alpha } => {
                if *alpha == 0.0 {
                    return None;
                }
                Some(Rgb::new(*r, *g, *b).to_hex())
            }
            ColorLiteral::Hsl { h, s, l, alpha } => {
                if *alpha == 0.0 {
                    return None;
                }
                Some(hsl_to_rgb(*h, *s, *l).to_hex())
            }
        }
    }
}

/// Parse and normalize in one step.
pub fn normalize_color(raw: &str) -> Option<String> {
    ColorLiteral::parse(raw)?.normalize()
}

/// HSL saturation of an 8-bit color, 0.0 for pure gray through 1.0.
pub fn saturation(rgb: Rgb) -> f32 {
    let r = rgb.r as f32 / 255.0;
    let g = rgb.g as f32 / 255.0;
    let b = rgb.b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == min {
        return 0.0;
    }
    let lightness = (max + min) / 2.0;
    (max - min) / (1.0 - (2.0 * lightness - 1.0).abs())
}

// ---------------------------------------------------------------------------
// Hex
// ---------------------------------------------------------------------------

fn parse_hex(digits: &str) -> Option<ColorLiteral> {
    let valid_len = matches!(digits.len(), 3 | 4 | 6 | 8);
    if !valid_len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(ColorLiteral::Hex(digits.to_ascii_lowercase()))
}

fn normalize_hex(digits: &str) -> Option<String> {
    // Shorthand forms double each digit; 8- and 4-digit forms carry alpha.
    let expanded: String = match digits.len() {
        3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => digits.to_string(),
        _ => return None,
    };
    if expanded.len() == 8 {
        if &expanded[6..8] == "00" {
            return None;
        }
        return Some(format!("#{}", &expanded[..6]));
    }
    Some(format!("#{expanded}"))
}

// ---------------------------------------------------------------------------
// rgb() / hsl()
// ---------------------------------------------------------------------------

fn strip_function<'a>(lower: &'a str, names: &[&str]) -> Option<&'a str> {
    for name in names {
        if let Some(rest) = lower.strip_prefix(name) {
            let rest = rest.trim_start();
            return rest.strip_prefix('(')?.strip_suffix(')');
        }
    }
    None
}

/// Split a functional color body into component tokens. Handles both the
/// legacy comma syntax and the modern space syntax with `/` before alpha.
fn split_args(body: &str) -> Vec<&str> {
    if body.contains(',') {
        body.split(',').map(str::trim).collect()
    } else {
        body.split(['/', ' '])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect()
    }
}

fn parse_rgb_args(body: &str) -> Option<ColorLiteral> {
    let args = split_args(body);
    if args.len() < 3 || args.len() > 4 {
        return None;
    }
    let r = parse_channel(args[0])?;
    let g = parse_channel(args[1])?;
    let b = parse_channel(args[2])?;
    let alpha = match args.get(3) {
        Some(raw) => parse_alpha(raw)?,
        None => 1.0,
    };
    Some(ColorLiteral::Rgb { r, g, b, alpha })
}

fn parse_hsl_args(body: &str) -> Option<ColorLiteral> {
    let args = split_args(body);
    if args.len() < 3 || args.len() > 4 {
        return None;
    }
    let h = parse_hue(args[0])?;
    let s = parse_fraction(args[1])?;
    let l = parse_fraction(args[2])?;
    let alpha = match args.get(3) {
        Some(raw) => parse_alpha(raw)?,
        None => 1.0,
    };
    Some(ColorLiteral::Hsl { h, s, l, alpha })
}

/// An rgb() channel: either 0-255 or a percentage. Out-of-range values clamp
/// the way browsers clamp them.
fn parse_channel(raw: &str) -> Option<u8> {
    let value = if let Some(pct) = raw.strip_suffix('%') {
        pct.trim().parse::<f32>().ok()? * 255.0 / 100.0
    } else {
        raw.parse::<f32>().ok()?
    };
    Some(value.round().clamp(0.0, 255.0) as u8)
}

fn parse_hue(raw: &str) -> Option<f32> {
    let value = raw.strip_suffix("deg").unwrap_or(raw).trim();
    Some(value.parse::<f32>().ok()?.rem_euclid(360.0))
}

/// Saturation or lightness: a percentage, tolerating a bare 0-1 fraction.
fn parse_fraction(raw: &str) -> Option<f32> {
    let value = if let Some(pct) = raw.strip_suffix('%') {
        pct.trim().parse::<f32>().ok()? / 100.0
    } else {
        raw.parse::<f32>().ok()?
    };
    Some(value.clamp(0.0, 1.0))
}

fn parse_alpha(raw: &str) -> Option<f32> {
    let value = if let Some(pct) = raw.strip_suffix('%') {
        pct.trim().parse::<f32>().ok()? / 100.0
    } else {
        raw.parse::<f32>().ok()?
    };
    Some(value.clamp(0.0, 1.0))
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Rgb {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r1, g1, b1) = match hp {
        hp if hp < 1.0 => (c, x, 0.0),
        hp if hp < 2.0 => (x, c, 0.0),
        hp if hp < 3.0 => (0.0, c, x),
        hp if hp < 4.0 => (0.0, x, c),
        hp if hp < 5.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    Rgb::new(
        ((r1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((g1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((b1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_hex_doubles_each_digit() {
        assert_eq!(normalize_color("#ABC"), Some("#aabbcc".to_string()));
        assert_eq!(normalize_color("#1a73e8"), Some("#1a73e8".to_string()));
        assert_eq!(normalize_color("#1A73E8"), Some("#1a73e8".to_string()));
    }

    #[test]
    fn eight_digit_hex_drops_opaque_alpha_and_rejects_transparent() {
        assert_eq!(normalize_color("#1a73e8ff"), Some("#1a73e8".to_string()));
        assert_eq!(normalize_color("#1a73e880"), Some("#1a73e8".to_string()));
        assert_eq!(normalize_color("#1a73e800"), None);
        assert_eq!(normalize_color("#abcf"), Some("#aabbcc".to_string()));
        assert_eq!(normalize_color("#abc0"), None);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert_eq!(normalize_color("#ab"), None);
        assert_eq!(normalize_color("#abcde"), None);
        assert_eq!(normalize_color("#zzzzzz"), None);
        assert_eq!(normalize_color("#"), None);
    }

    #[test]
    fn rgb_comma_and_space_syntaxes_agree() {
        assert_eq!(normalize_color("rgb(26, 115, 232)"), Some("#1a73e8".to_string()));
        assert_eq!(normalize_color("rgb(26 115 232)"), Some("#1a73e8".to_string()));
        assert_eq!(normalize_color("RGB(26,115,232)"), Some("#1a73e8".to_string()));
    }

    #[test]
    fn rgb_percentages_scale_to_channels() {
        assert_eq!(normalize_color("rgb(100%, 0%, 0%)"), Some("#ff0000".to_string()));
        assert_eq!(normalize_color("rgb(50%, 50%, 50%)"), Some("#808080".to_string()));
    }

    #[test]
    fn rgb_out_of_range_channels_clamp() {
        assert_eq!(normalize_color("rgb(300, -5, 0)"), Some("#ff0000".to_string()));
    }

    #[test]
    fn rgba_alpha_is_dropped_unless_fully_transparent() {
        assert_eq!(normalize_color("rgba(26, 115, 232, 0.5)"), Some("#1a73e8".to_string()));
        assert_eq!(normalize_color("rgba(26, 115, 232, 0)"), None);
        assert_eq!(normalize_color("rgb(26 115 232 / 0.5)"), Some("#1a73e8".to_string()));
        assert_eq!(normalize_color("rgb(26 115 232 / 0%)"), None);
    }

    #[test]
    fn hsl_converts_through_the_color_wheel() {
        assert_eq!(normalize_color("hsl(0, 100%, 50%)"), Some("#ff0000".to_string()));
        assert_eq!(normalize_color("hsl(120, 100%, 25%)"), Some("#008000".to_string()));
        assert_eq!(normalize_color("hsl(240deg, 100%, 50%)"), Some("#0000ff".to_string()));
        assert_eq!(normalize_color("hsl(0, 0%, 100%)"), Some("#ffffff".to_string()));
    }

    #[test]
    fn hsla_transparent_is_rejected() {
        assert_eq!(normalize_color("hsla(0, 100%, 50%, 0)"), None);
        assert_eq!(normalize_color("hsla(0, 100%, 50%, 0.3)"), Some("#ff0000".to_string()));
    }

    #[test]
    fn hue_wraps_past_a_full_turn() {
        assert_eq!(normalize_color("hsl(360, 100%, 50%)"), normalize_color("hsl(0, 100%, 50%)"));
        assert_eq!(normalize_color("hsl(-120, 100%, 50%)"), normalize_color("hsl(240, 100%, 50%)"));
    }

    #[test]
    fn keywords_are_not_colors() {
        assert_eq!(normalize_color("transparent"), None);
        assert_eq!(normalize_color("inherit"), None);
        assert_eq!(normalize_color("currentColor"), None);
        assert_eq!(normalize_color("none"), None);
        assert_eq!(normalize_color(""), None);
    }

    #[test]
    fn saturation_separates_grays_from_chromatic_colors() {
        assert_eq!(saturation(Rgb::new(119, 119, 119)), 0.0);
        assert!(saturation(Rgb::new(26, 115, 232)) > 0.5);
        assert!(saturation(Rgb::new(200, 195, 205)) < 0.15);
    }

    #[cfg(feature = "fuzz-tests")]
    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_never_panics_and_output_is_canonical(input in ".{0,48}") {
                if let Some(hex) = normalize_color(&input) {
                    prop_assert_eq!(hex.len(), 7);
                    prop_assert!(hex.starts_with('#'));
                    prop_assert!(hex[1..].chars().all(|c| c.is_ascii_hexdigit()
                        && !c.is_ascii_uppercase()));
                }
            }

            #[test]
            fn rgb_triples_round_trip(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255) {
                let hex = normalize_color(&format!("rgb({r}, {g}, {b})")).unwrap();
                prop_assert_eq!(hex, Rgb::new(r, g, b).to_hex());
            }
        }
    }
}
