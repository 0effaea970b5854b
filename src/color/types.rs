use std::fmt;
use std::str::FromStr;

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::{VisionError, VisionResult};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from integer channels, each of which must be in `0..=255`
    pub fn from_rgb(r: i32, g: i32, b: i32) -> VisionResult<Self> {
        let channel = |value: i32, name: &str| {
            u8::try_from(value).map_err(|_| {
                VisionError::invalid_color(
                    format!("({r}, {g}, {b})"),
                    format!("channel {name}={value} is out of range"),
                )
            })
        };
        Ok(Self::new(channel(r, "r")?, channel(g, "g")?, channel(b, "b")?))
    }

    /// Parse `#RRGGBB` (case-insensitive)
    pub fn from_hex(input: &str) -> VisionResult<Self> {
        let Some(digits) = input.strip_prefix('#') else {
            return Err(VisionError::invalid_color(input, "hex color must start with '#'"));
        };
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(VisionError::invalid_color(input, "hex color must have 6 hex digits"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| VisionError::invalid_color(input, e.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Lowercase `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_hls(&self) -> HlsColor {
        HlsColor::from_rgb(self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<Rgb<u8>> for Color {
    fn from(pixel: Rgb<u8>) -> Self {
        Self::new(pixel[0], pixel[1], pixel[2])
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        Rgb([color.r, color.g, color.b])
    }
}

/// Anything accepted where a color is expected
pub trait IntoColor {
    fn into_color(self) -> VisionResult<Color>;
}

impl IntoColor for Color {
    fn into_color(self) -> VisionResult<Color> {
        Ok(self)
    }
}

impl IntoColor for &str {
    fn into_color(self) -> VisionResult<Color> {
        Color::from_hex(self)
    }
}

impl IntoColor for String {
    fn into_color(self) -> VisionResult<Color> {
        Color::from_hex(&self)
    }
}

impl IntoColor for &String {
    fn into_color(self) -> VisionResult<Color> {
        Color::from_hex(self)
    }
}

impl IntoColor for (u8, u8, u8) {
    fn into_color(self) -> VisionResult<Color> {
        Ok(Color::new(self.0, self.1, self.2))
    }
}

impl IntoColor for [u8; 3] {
    fn into_color(self) -> VisionResult<Color> {
        Ok(Color::new(self[0], self[1], self[2]))
    }
}

impl IntoColor for (i32, i32, i32) {
    fn into_color(self) -> VisionResult<Color> {
        Color::from_rgb(self.0, self.1, self.2)
    }
}

impl IntoColor for &[i32] {
    fn into_color(self) -> VisionResult<Color> {
        match self {
            [r, g, b] => Color::from_rgb(*r, *g, *b),
            _ => Err(VisionError::invalid_color(
                format!("{self:?}"),
                format!("expected 3 channels, got {}", self.len()),
            )),
        }
    }
}

/// 8-bit HLS with OpenCV's scaling: `h` in `0..=180`, `l` and `s` in `0..=255`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HlsColor {
    pub h: u8,
    pub l: u8,
    pub s: u8,
}

impl HlsColor {
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r = r as f32 / 255.0;
        let g = g as f32 / 255.0;
        let b = b as f32 / 255.0;
        let vmax = r.max(g).max(b);
        let vmin = r.min(g).min(b);
        let diff = vmax - vmin;
        let l = (vmax + vmin) * 0.5;

        let (mut h, mut s) = (0.0, 0.0);
        if diff > f32::EPSILON {
            s = if l < 0.5 {
                diff / (vmax + vmin)
            } else {
                diff / (2.0 - vmax - vmin)
            };
            let scale = 60.0 / diff;
            h = if vmax == r {
                (g - b) * scale
            } else if vmax == g {
                (b - r) * scale + 120.0
            } else {
                (r - g) * scale + 240.0
            };
            if h < 0.0 {
                h += 360.0;
            }
        }

        Self {
            h: saturate(h * 0.5),
            l: saturate(l * 255.0),
            s: saturate(s * 255.0),
        }
    }

    /// Normalized distance in `[0, 1]` with hue weighted double
    pub fn distance(&self, other: &HlsColor) -> f32 {
        let dh = (self.h as f32 - other.h as f32).abs();
        let dh = dh.min(180.0 - dh) / 90.0;
        let dl = (self.l as f32 - other.l as f32).abs() / 255.0;
        let ds = (self.s as f32 - other.s as f32).abs() / 255.0;
        ((2.0 * dh).powi(2) + dl.powi(2) + ds.powi(2)).sqrt() / 6f32.sqrt()
    }
}

fn saturate(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_hex_round_trip() {
        for hex in ["#000000", "#ffffff", "#fc545f", "#0a1b2c"] {
            assert_eq!(Color::from_hex(hex).unwrap().to_hex(), hex);
        }
        assert_eq!(Color::from_hex("#FC545F").unwrap(), Color::new(252, 84, 95));
        let parsed: Color = "#102030".parse().unwrap();
        assert_eq!(parsed.to_string(), "#102030");
    }

    #[test]
    fn test_channels_survive_hex() {
        for r in (0..=255).step_by(17) {
            for g in (0..=255).step_by(51) {
                for b in [0, 1, 127, 128, 254, 255] {
                    let color = Color::from_rgb(r, g, b).unwrap();
                    let back = Color::from_hex(&color.to_hex()).unwrap();
                    assert_eq!((back.r, back.g, back.b), (r as u8, g as u8, b as u8));
                }
            }
        }
    }

    #[test]
    fn test_invalid_hex_strings() {
        for input in ["fc545f", "#fc54", "#fc545f00", "#gg0000", "", "#"] {
            let err = Color::from_hex(input).unwrap_err();
            assert!(matches!(err, VisionError::InvalidColor { .. }), "{input}");
        }
        assert!(Color::from_hex("#ffff").unwrap_err().to_string().contains("#RRGGBB"));
    }

    #[test]
    fn test_into_color_inputs() {
        let expected = Color::new(1, 2, 3);
        assert_eq!("#010203".into_color().unwrap(), expected);
        assert_eq!(String::from("#010203").into_color().unwrap(), expected);
        assert_eq!((1u8, 2u8, 3u8).into_color().unwrap(), expected);
        assert_eq!([1u8, 2, 3].into_color().unwrap(), expected);
        assert_eq!((1i32, 2, 3).into_color().unwrap(), expected);
        assert_eq!([1i32, 2, 3][..].into_color().unwrap(), expected);
    }

    #[test]
    fn test_invalid_tuples() {
        assert!((256i32, 0, 0).into_color().is_err());
        assert!((0i32, -1, 0).into_color().is_err());
        assert!([1i32, 2][..].into_color().is_err());
        assert!([1i32, 2, 3, 4][..].into_color().is_err());
    }

    #[test]
    fn test_hls_primaries() {
        assert_eq!(HlsColor::from_rgb(255, 0, 0), HlsColor { h: 0, l: 128, s: 255 });
        assert_eq!(HlsColor::from_rgb(0, 255, 0), HlsColor { h: 60, l: 128, s: 255 });
        assert_eq!(HlsColor::from_rgb(0, 0, 255), HlsColor { h: 120, l: 128, s: 255 });
        assert_eq!(HlsColor::from_rgb(255, 255, 255), HlsColor { h: 0, l: 255, s: 0 });
        assert_eq!(HlsColor::from_rgb(0, 0, 0), HlsColor { h: 0, l: 0, s: 0 });
    }

    #[test]
    fn test_hls_distance() {
        let red = HlsColor::from_rgb(255, 0, 0);
        assert_abs_diff_eq!(red.distance(&red), 0.0);
        let black = HlsColor::from_rgb(0, 0, 0);
        let white = HlsColor::from_rgb(255, 255, 255);
        assert_abs_diff_eq!(black.distance(&white), 1.0 / 6f32.sqrt(), epsilon = 1e-6);
        // Hue wraps around at 180
        let a = HlsColor { h: 2, l: 100, s: 100 };
        let b = HlsColor { h: 178, l: 100, s: 100 };
        assert_abs_diff_eq!(a.distance(&b), (2.0 * 4.0 / 90.0) / 6f32.sqrt(), epsilon = 1e-6);
    }
}
