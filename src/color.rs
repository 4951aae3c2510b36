use anyhow::{bail, Result};
use palette::{FromColor, Hsl, IntoColor, Lab, Srgb};

/// Core color type used throughout the pipeline.
/// Wraps sRGB u8 components and provides conversions to CIELAB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex color string like `#ff8800` or `#FF8800`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            bail!(
                "invalid hex color: expected 6 hex digits, got {:?}",
                hex
            );
        }
        let r = u8::from_str_radix(&hex[0..2], 16)?;
        let g = u8::from_str_radix(&hex[2..4], 16)?;
        let b = u8::from_str_radix(&hex[4..6], 16)?;
        Ok(Self { r, g, b })
    }

    /// Serialize to uppercase hex `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Serialize to `rgba(R,G,B,1.0)` with integer channels.
    pub fn to_rgba(self) -> String {
        format!("rgba({},{},{},1.0)", self.r, self.g, self.b)
    }

    /// Convert to `palette::Srgb<u8>`.
    pub fn to_srgb_u8(self) -> Srgb<u8> {
        Srgb::new(self.r, self.g, self.b)
    }

    /// Convert to CIELAB (for clustering and deduplication).
    pub fn to_lab(self) -> Lab {
        let srgb_f32: Srgb<f32> = self.to_srgb_u8().into_format();
        srgb_f32.into_color()
    }

    /// Create from CIELAB. Out-of-gamut values are clamped.
    pub fn from_lab(lab: Lab) -> Self {
        let srgb_f32: Srgb<f32> = Srgb::from_color(lab);
        Self::from_srgb_f32_clamped(srgb_f32)
    }

    /// Clamp an Srgb<f32> to [0, 1] and convert to Color.
    fn from_srgb_f32_clamped(srgb: Srgb<f32>) -> Self {
        let r = (srgb.red.clamp(0.0, 1.0) * 255.0).round() as u8;
        let g = (srgb.green.clamp(0.0, 1.0) * 255.0).round() as u8;
        let b = (srgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { r, g, b }
    }

    /// WCAG 2.0 relative luminance.
    ///
    /// Linearizes each sRGB channel, then computes the weighted sum.
    pub fn relative_luminance(self) -> f32 {
        fn linearize(c: u8) -> f32 {
            let c = c as f32 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        let r = linearize(self.r);
        let g = linearize(self.g);
        let b = linearize(self.b);
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }

    /// WCAG 2.0 contrast ratio between two colors.
    ///
    /// Returns a value in [1, 21]. Higher means more contrast.
    pub fn contrast_ratio(c1: &Color, c2: &Color) -> f32 {
        let l1 = c1.relative_luminance();
        let l2 = c2.relative_luminance();
        let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Luma over gamma-encoded channels in [0, 1], without linearization.
    pub fn luma(self) -> f32 {
        (0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32) / 255.0
    }

    /// Multiply every channel by `factor`, truncating and capping at 255.
    pub fn brighten(self, factor: f32) -> Color {
        let scale = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
        Color::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Multiply HSL saturation by `factor` (capped at 1), truncating channels.
    pub fn saturate(self, factor: f32) -> Color {
        let srgb_f32: Srgb<f32> = self.to_srgb_u8().into_format();
        let mut hsl: Hsl = srgb_f32.into_color();
        hsl.saturation = (hsl.saturation * factor).min(1.0);
        let out: Srgb<f32> = Srgb::from_color(hsl);
        let trunc = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
        Color::new(trunc(out.red), trunc(out.green), trunc(out.blue))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Colorfulness of a Lab point: the magnitude of its (a, b) vector.
pub fn chroma(lab: &Lab) -> f32 {
    (lab.a * lab.a + lab.b * lab.b).sqrt()
}

/// Euclidean distance in CIELAB (ΔE76).
pub fn delta_e(x: &Lab, y: &Lab) -> f32 {
    delta_e_sq(x, y).sqrt()
}

/// Squared ΔE76, for nearest-neighbour searches that only compare distances.
pub fn delta_e_sq(x: &Lab, y: &Lab) -> f32 {
    (x.l - y.l).powi(2) + (x.a - y.a).powi(2) + (x.b - y.b).powi(2)
}
