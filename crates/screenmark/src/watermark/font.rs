//! Fixed-width 8x16 bitmap face.
//!
//! Glyphs come from the public-domain `font8x8` set; each 8x8 bitmap row is
//! drawn twice to fill a 16 px cell. Bit 0 of a row byte is the leftmost pixel.

use font8x8::{UnicodeFonts, BASIC_FONTS};

/// Width of one glyph cell and the pen advance, in pixels.
pub const GLYPH_WIDTH: u32 = 8;

/// Height of one glyph cell, in pixels.
pub const GLYPH_HEIGHT: u32 = 16;

/// Distance from the top of the cell to the baseline.
///
/// The 8x8 set keeps letter bodies in rows 0..7 and descenders in row 7, so
/// the doubled baseline sits 14 px down.
pub const ASCENT: u32 = 14;

/// A monospaced bitmap face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitmapFace;

impl BitmapFace {
    /// Horizontal pen advance per character.
    #[must_use]
    pub const fn advance(self) -> u32 {
        GLYPH_WIDTH
    }

    /// Cell height.
    #[must_use]
    pub const fn height(self) -> u32 {
        GLYPH_HEIGHT
    }

    /// Baseline offset from the top of the cell.
    #[must_use]
    pub const fn ascent(self) -> u32 {
        ASCENT
    }

    /// Inked pixels of `c` as `(x, y)` offsets within the 8x16 cell.
    ///
    /// Returns an empty list for characters outside the face.
    #[must_use]
    pub fn glyph_pixels(self, c: char) -> Vec<(u32, u32)> {
        let Some(rows) = BASIC_FONTS.get(c) else {
            return Vec::new();
        };

        let mut pixels = Vec::new();
        for (row, bits) in (0u32..).zip(rows.iter()) {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << col) != 0 {
                    pixels.push((col, row * 2));
                    pixels.push((col, row * 2 + 1));
                }
            }
        }
        pixels
    }
}
