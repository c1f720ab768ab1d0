//! Hex color parsing.
//!
//! Accepts `#RGB`, `#RGBA`, `#RRGGBB` and `#RRGGBBAA`. Short forms double each
//! digit (`#F00` is `#FF0000`); forms without an alpha component are opaque.

use std::fmt;
use std::str::FromStr;

use image::Rgba;

use crate::error::{Error, Result};

/// An RGBA color with 8 bits per channel and straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel; 255 is opaque.
    pub a: u8,
}

impl Color {
    /// Create a color from its four channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque red, the default watermark foreground.
    #[must_use]
    pub const fn red() -> Self {
        Self::new(255, 0, 0, 255)
    }

    /// The color as a premultiplied-alpha pixel.
    #[must_use]
    pub fn to_premultiplied(self) -> Rgba<u8> {
        let mul = |c: u8| -> u8 {
            // c * a / 255 never exceeds 255
            #[allow(clippy::cast_possible_truncation)]
            let v = ((u32::from(c) * u32::from(self.a) + 127) / 255) as u8;
            v
        };
        Rgba([mul(self.r), mul(self.g), mul(self.b), self.a])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex_color(s)
    }
}

/// Parse a hex color string.
///
/// # Errors
///
/// Returns [`Error::InvalidColor`] if the string does not start with `#`, has
/// a length other than 3, 4, 6 or 8 digits, or contains a non-hex digit.
///
/// # Examples
///
/// ```
/// use screenmark::watermark::{parse_hex_color, Color};
///
/// assert_eq!(parse_hex_color("#FF0000FF").unwrap(), Color::red());
/// assert_eq!(parse_hex_color("#f00").unwrap(), Color::red());
/// ```
pub fn parse_hex_color(value: &str) -> Result<Color> {
    let hex = value
        .strip_prefix('#')
        .ok_or_else(|| Error::invalid_color(value, "color must start with '#'"))?;

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::invalid_color(value, "invalid hex digit"));
    }

    let digit = |i: usize| -> Result<u8> {
        u8::from_str_radix(&hex[i..=i], 16)
            .map_err(|_| Error::invalid_color(value, "invalid hex digit"))
    };
    let pair = |i: usize| -> Result<u8> {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| Error::invalid_color(value, "invalid hex digit"))
    };

    match hex.len() {
        // 0xF -> 0xFF, 0xA -> 0xAA
        3 => Ok(Color::new(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17, 255)),
        4 => Ok(Color::new(
            digit(0)? * 17,
            digit(1)? * 17,
            digit(2)? * 17,
            digit(3)? * 17,
        )),
        6 => Ok(Color::new(pair(0)?, pair(2)?, pair(4)?, 255)),
        8 => Ok(Color::new(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
        n => Err(Error::invalid_color(
            value,
            format!("expected 3, 4, 6 or 8 hex digits, got {n}"),
        )),
    }
}
