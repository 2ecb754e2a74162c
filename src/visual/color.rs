//! Colours
//!
//! Hex colour parsing (`#rgb`, `#rrggbb`, `#rrggbbaa`) and straight-alpha
//! RGBA8 values for the surface.

use crate::error::{OverloadError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Straight (non-premultiplied) RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(0xff, 0, 0);
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS-style hex colour
    ///
    /// # Errors
    /// `InvalidColor` for anything other than 3, 6 or 8 hex digits after `#`
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || OverloadError::InvalidColor {
            value: value.to_string(),
        };

        let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|n| n * 17)
                .map_err(|_| invalid())
        };

        match hex.len() {
            3 => Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(invalid()),
        }
    }

    /// Colour with its alpha scaled by `opacity` (clamped to 0-1)
    pub fn with_opacity(self, opacity: f32) -> Self {
        let alpha = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a: alpha, ..self }
    }

    pub fn to_hex(self) -> String {
        if self.a == 0xff {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = OverloadError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = OverloadError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Composite `src` over the pixel `dst` (source-over, straight alpha)
#[inline]
pub fn blend_over(dst: &mut [u8], src: Color) {
    if src.a == 0 {
        return;
    }
    let sa = src.a as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        dst.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }

    let mix = |s: u8, d: u8| {
        let value = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    dst[0] = mix(src.r, dst[0]);
    dst[1] = mix(src.g, dst[1]);
    dst[2] = mix(src.b, dst[2]);
    dst[3] = (out_a * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(Color::parse("#fff").unwrap(), Color::WHITE);
        assert_eq!(Color::parse("#ff4444").unwrap(), Color::rgb(0xff, 0x44, 0x44));
        assert_eq!(
            Color::parse("#10203040").unwrap(),
            Color::rgba(0x10, 0x20, 0x30, 0x40)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["red", "#12", "#gggggg", "ff0000", "#ff00001"] {
            let err = Color::parse(bad).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_COLOR", "{bad}");
        }
    }

    #[test]
    fn test_serde_as_hex_string() {
        let color: Color = serde_json::from_str("\"#333333\"").unwrap();
        assert_eq!(color, Color::rgb(0x33, 0x33, 0x33));
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"#333333\"");
        assert!(serde_json::from_str::<Color>("\"blue\"").is_err());
    }

    #[test]
    fn test_blend_over_transparent() {
        let mut pixel = [0, 0, 0, 0];
        blend_over(&mut pixel, Color::RED.with_opacity(0.5));
        assert_eq!(pixel, [255, 0, 0, 128]);
    }

    #[test]
    fn test_blend_over_opaque() {
        let mut pixel = [0, 0, 0, 255];
        blend_over(&mut pixel, Color::WHITE.with_opacity(0.5));
        assert_eq!(pixel[3], 255);
        assert!(pixel[0] > 120 && pixel[0] < 135);
    }
}
