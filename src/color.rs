// filepath: src/color.rs
//! Packed colors and compositing operators

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A 32-bit color in the surface's native order, `0xAARRGGBB`.
///
/// In memory (little-endian) a pixel reads B, G, R, A. The compositor treats
/// the value as opaque; only the `Over` blend looks at the alpha byte, and it
/// expects the color channels to be premultiplied by it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0x0000_0000);
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    /// Wrap an already packed `0xAARRGGBB` value
    pub const fn from_argb(value: u32) -> Self {
        Self(value)
    }

    /// Pack channels that are already premultiplied by `a`
    pub const fn from_premultiplied(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Premultiply straight (non-premultiplied) RGBA and pack it
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_premultiplied(mul_div_255(r, a), mul_div_255(g, a), mul_div_255(b, a), a)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color({:#010x})", self.0)
    }
}

impl From<u32> for Color {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.0
    }
}

/// `x * a / 255`, rounded to nearest
pub(crate) fn mul_div_255(x: u8, a: u8) -> u8 {
    ((x as u32 * a as u32 + 127) / 255) as u8
}

/// How the filled buffer is combined with the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Alpha-composite the premultiplied source atop the destination
    #[default]
    Over,
    /// Replace destination pixels, ignoring alpha
    Src,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Over => f.write_str("over"),
            Operator::Src => f.write_str("src"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown compositing operator {0:?} (expected \"over\" or \"src\")")]
pub struct ParseOperatorError(pub String);

impl FromStr for Operator {
    type Err = ParseOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "over" => Ok(Operator::Over),
            "src" => Ok(Operator::Src),
            _ => Err(ParseOperatorError(s.to_string())),
        }
    }
}
