//! Tiling a watermark across a captured image.
//!
//! Tiles are laid on a regular grid whose first cell starts half a tile before
//! the origin, so the pattern runs off every edge instead of starting flush
//! with the top-left corner. Each tile is painted with Porter-Duff "over".

use image::{Rgba, RgbaImage};
use tracing::debug;

/// Blend `src` over `dst` using `src`'s alpha (straight alpha, integer math).
///
/// A fully transparent source leaves `dst` untouched and a fully opaque one
/// replaces it exactly.
#[must_use]
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let da = u32::from(dst[3]);
    let inv = 255 - sa;
    // Output alpha scaled by 255
    let out_a = sa * 255 + da * inv;

    let channel = |s: u8, d: u8| -> u8 {
        let num = u32::from(s) * sa * 255 + u32::from(d) * da * inv;
        #[allow(clippy::cast_possible_truncation)]
        let v = ((num + out_a / 2) / out_a).min(255) as u8;
        v
    };

    #[allow(clippy::cast_possible_truncation)]
    let alpha = ((out_a + 127) / 255).min(255) as u8;
    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        alpha,
    ])
}

/// Top-left offsets of every tile covering a `base_width` x `base_height`
/// image with `tile_width` x `tile_height` tiles.
///
/// Offsets start at `(-tile_width / 2, -tile_height / 2)` and advance by whole
/// tiles while still left of / above the far edge. Columns are outer, rows
/// inner. Empty tiles produce no offsets.
#[must_use]
pub fn tile_offsets(
    base_width: u32,
    base_height: u32,
    tile_width: u32,
    tile_height: u32,
) -> Vec<(i64, i64)> {
    if tile_width == 0 || tile_height == 0 {
        return Vec::new();
    }

    let start_x = -i64::from(tile_width / 2);
    let start_y = -i64::from(tile_height / 2);
    let step_x = usize::try_from(tile_width).unwrap_or(usize::MAX);
    let step_y = usize::try_from(tile_height).unwrap_or(usize::MAX);

    let mut offsets = Vec::new();
    for x in (start_x..i64::from(base_width)).step_by(step_x) {
        for y in (start_y..i64::from(base_height)).step_by(step_y) {
            offsets.push((x, y));
        }
    }
    offsets
}

/// Paint `tile` over `base` with its top-left corner at `(x, y)`, clipped to
/// the base bounds.
pub fn paint_over(base: &mut RgbaImage, tile: &RgbaImage, x: i64, y: i64) {
    let (base_w, base_h) = (i64::from(base.width()), i64::from(base.height()));
    let (tile_w, tile_h) = (i64::from(tile.width()), i64::from(tile.height()));

    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + tile_w).min(base_w);
    let y_end = (y + tile_h).min(base_h);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            // All four coordinates are inside their images here
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (bx, by, wx, wy) = (tx as u32, ty as u32, (tx - x) as u32, (ty - y) as u32);
            let src = *tile.get_pixel(wx, wy);
            let dst = base.get_pixel_mut(bx, by);
            *dst = blend_over(*dst, src);
        }
    }
}

/// Tile `watermark` across `base` in place.
pub fn tile_watermark(base: &mut RgbaImage, watermark: &RgbaImage) {
    let offsets = tile_offsets(
        base.width(),
        base.height(),
        watermark.width(),
        watermark.height(),
    );
    debug!(
        base = ?base.dimensions(),
        tile = ?watermark.dimensions(),
        tiles = offsets.len(),
        "Tiling watermark"
    );
    for (x, y) in offsets {
        paint_over(base, watermark, x, y);
    }
}

/// Copy `capture` into a fresh buffer and tile `watermark` across it.
#[must_use]
pub fn apply_watermark(capture: &RgbaImage, watermark: &RgbaImage) -> RgbaImage {
    let mut marked = capture.clone();
    tile_watermark(&mut marked, watermark);
    marked
}
