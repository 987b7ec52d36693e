//! sRGB / CIELAB conversions and the perceptual and accessibility metrics
//! built on them.
//!
//! All conversions assume the D65 reference white. Lightness runs 0..100,
//! the a/b axes are unbounded in theory but stay within roughly -128..128
//! for displayable colors.

const D65_X: f32 = 0.95047;
const D65_Y: f32 = 1.0;
const D65_Z: f32 = 1.08883;

// CIE standard constants: (6/29)^3 and 24389/27.
const LAB_EPSILON: f32 = 0.008856;
const LAB_KAPPA: f32 = 903.3;

/// A color in 8-bit sRGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A color in CIELAB space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a normalized `#rrggbb` string. Returns `None` for anything else.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert through linear RGB and XYZ into CIELAB.
    pub fn to_lab(self) -> Lab {
        let r = srgb_to_linear(self.r);
        let g = srgb_to_linear(self.g);
        let b = srgb_to_linear(self.b);

        let x = (0.4124 * r + 0.3576 * g + 0.1805 * b) / D65_X;
        let y = (0.2126 * r + 0.7152 * g + 0.0722 * b) / D65_Y;
        let z = (0.0193 * r + 0.1192 * g + 0.9505 * b) / D65_Z;

        let fx = lab_f(x);
        let fy = lab_f(y);
        let fz = lab_f(z);

        Lab {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// WCAG relative luminance, 0.0 for black through 1.0 for white.
    pub fn relative_luminance(self) -> f32 {
        let r = srgb_to_linear(self.r);
        let g = srgb_to_linear(self.g);
        let b = srgb_to_linear(self.b);
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }
}

impl Lab {
    /// CIE76 color difference: Euclidean distance in LAB.
    pub fn delta_e(self, other: Lab) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        (dl * dl + da * da + db * db).sqrt()
    }

    /// Convert back to 8-bit sRGB, clamping out-of-gamut channels.
    pub fn to_rgb(self) -> Rgb {
        let fy = (self.l + 16.0) / 116.0;
        let fx = fy + self.a / 500.0;
        let fz = fy - self.b / 200.0;

        let xr = lab_f_inv(fx);
        let yr = if self.l > LAB_KAPPA * LAB_EPSILON {
            fy * fy * fy
        } else {
            self.l / LAB_KAPPA
        };
        let zr = lab_f_inv(fz);

        let x = xr * D65_X;
        let y = yr * D65_Y;
        let z = zr * D65_Z;

        let r = 3.2406 * x - 1.5372 * y - 0.4986 * z;
        let g = -0.9689 * x + 1.8758 * y + 0.0415 * z;
        let b = 0.0557 * x - 0.2040 * y + 1.0570 * z;

        Rgb {
            r: linear_to_srgb(r),
            g: linear_to_srgb(g),
            b: linear_to_srgb(b),
        }
    }
}

/// WCAG contrast ratio between two colors, from 1.0 up to 21.0.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f32 {
    let la = a.relative_luminance();
    let lb = b.relative_luminance();
    let (lighter, darker) = if la > lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(linear: f32) -> u8 {
    let c = if linear <= 0.003_130_8 {
        12.92 * linear
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    };
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        (LAB_KAPPA * t + 16.0) / 116.0
    }
}

fn lab_f_inv(f: f32) -> f32 {
    let cubed = f * f * f;
    if cubed > LAB_EPSILON {
        cubed
    } else {
        (116.0 * f - 16.0) / LAB_KAPPA
    }
}
