//! Watermark rendering.
//!
//! Text is drawn with the fixed 8x16 [`BitmapFace`] onto a transparent canvas,
//! scaled up with a bilinear filter and rotated with cubic interpolation. All
//! resampling runs on premultiplied pixels so the transparent background never
//! bleeds dark fringes into the text; the returned image is straight alpha.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::trace;

use super::color::Color;
use super::font::BitmapFace;

/// Rendering parameters for a watermark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkStyle {
    /// Text foreground.
    pub color: Color,
    /// Scale factor applied after drawing.
    pub scale: f64,
    /// Padding, in glyph cells on each side horizontally and in cell rows
    /// vertically.
    pub padding: u32,
    /// Counter-clockwise rotation in degrees.
    pub rotation_degrees: f64,
    /// Glyph face.
    pub face: BitmapFace,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            color: Color::red(),
            scale: 2.0,
            padding: 2,
            rotation_degrees: 45.0,
            face: BitmapFace,
        }
    }
}

/// Size of the unscaled text canvas for `text`.
///
/// Width is one advance per character plus `2 * padding` advances; height is
/// `padding` cell heights.
#[must_use]
pub fn canvas_size(text: &str, style: &WatermarkStyle) -> (u32, u32) {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    let width = style
        .face
        .advance()
        .saturating_mul(chars.saturating_add(style.padding.saturating_mul(2)));
    let height = style.face.height().saturating_mul(style.padding);
    (width, height)
}

/// Draw `text` onto a transparent canvas, in premultiplied form.
///
/// The pen starts `padding` pixels from the left edge with the baseline on the
/// bottom edge of the canvas, so descenders are clipped.
#[must_use]
pub fn draw_text(text: &str, style: &WatermarkStyle) -> RgbaImage {
    let (width, height) = canvas_size(text, style);
    let mut canvas = RgbaImage::new(width, height);
    let ink = style.color.to_premultiplied();

    let face = style.face;
    let top = i64::from(height) - i64::from(face.ascent());
    let mut pen_x = i64::from(style.padding);

    for c in text.chars() {
        for (gx, gy) in face.glyph_pixels(c) {
            let x = pen_x + i64::from(gx);
            let y = top + i64::from(gy);
            if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
                if x < width && y < height {
                    canvas.put_pixel(x, y, ink);
                }
            }
        }
        pen_x += i64::from(face.advance());
    }

    canvas
}

/// Render a complete watermark: draw, scale, rotate.
///
/// # Examples
///
/// ```
/// use screenmark::watermark::{render_watermark, WatermarkStyle};
///
/// let mark = render_watermark("t - 1.2.3.4", &WatermarkStyle::default());
/// assert!(mark.width() > 0 && mark.height() > 0);
/// ```
#[must_use]
pub fn render_watermark(text: &str, style: &WatermarkStyle) -> RgbaImage {
    let drawn = draw_text(text, style);
    let scaled = scale_image(&drawn, style.scale);
    let rotated = rotate_image(&scaled, style.rotation_degrees);

    trace!(
        text,
        drawn = ?drawn.dimensions(),
        scaled = ?scaled.dimensions(),
        rotated = ?rotated.dimensions(),
        "Rendered watermark"
    );

    unpremultiply(rotated)
}

/// Scale by `factor` with a bilinear filter. Target sizes are truncated and
/// never drop below one pixel.
#[must_use]
pub fn scale_image(image: &RgbaImage, factor: f64) -> RgbaImage {
    let target = |n: u32| -> u32 {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let scaled = (f64::from(n) * factor) as u32;
        scaled.max(1)
    };
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    imageops::resize(image, target(width), target(height), FilterType::Triangle)
}

/// Size of the canvas needed to hold a `width` x `height` image rotated by
/// `degrees` without clipping.
///
/// Corners are measured from pixel centers; a fractional extent above 0.1 px
/// rounds up to an extra pixel.
#[must_use]
pub fn rotated_size(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let x_off = f64::from(width) / 2.0 - 0.5;
    let y_off = f64::from(height) / 2.0 - 0.5;
    let right = f64::from(width - 1) - x_off;
    let bottom = f64::from(height - 1) - y_off;

    let corners = [
        (-x_off, -y_off),
        (right, -y_off),
        (right, bottom),
        (-x_off, bottom),
    ]
    .map(|(x, y)| rotate_point(x, y, sin, cos));

    let extent = |pick: fn(&(f64, f64)) -> f64| -> u32 {
        let min = corners.iter().map(pick).fold(f64::INFINITY, f64::min);
        let max = corners.iter().map(pick).fold(f64::NEG_INFINITY, f64::max);
        let mut size = max - min + 1.0;
        if size - size.floor() > 0.1 {
            size += 1.0;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let size = size as u32;
        size
    };

    (extent(|p| p.0), extent(|p| p.1))
}

fn rotate_point(x: f64, y: f64, sin: f64, cos: f64) -> (f64, f64) {
    (x * cos - y * sin, x * sin + y * cos)
}

/// Rotate a premultiplied image counter-clockwise about its center, expanding
/// the canvas. Uncovered areas are transparent.
#[must_use]
pub fn rotate_image(image: &RgbaImage, degrees: f64) -> RgbaImage {
    let (src_w, src_h) = image.dimensions();
    let (dst_w, dst_h) = rotated_size(src_w, src_h, degrees);
    let mut rotated = RgbaImage::new(dst_w, dst_h);
    if dst_w == 0 || dst_h == 0 {
        return rotated;
    }

    let (sin, cos) = degrees.to_radians().sin_cos();
    let src_x_off = f64::from(src_w) / 2.0 - 0.5;
    let src_y_off = f64::from(src_h) / 2.0 - 0.5;
    let dst_x_off = f64::from(dst_w) / 2.0 - 0.5;
    let dst_y_off = f64::from(dst_h) / 2.0 - 0.5;
    let max_x = f64::from(src_w) - 0.5;
    let max_y = f64::from(src_h) - 0.5;

    for (dx, dy, pixel) in rotated.enumerate_pixels_mut() {
        let (sx, sy) = rotate_point(
            f64::from(dx) - dst_x_off,
            f64::from(dy) - dst_y_off,
            sin,
            cos,
        );
        let (sx, sy) = (sx + src_x_off, sy + src_y_off);

        if sx < -0.5 || sy < -0.5 || sx >= max_x || sy >= max_y {
            continue;
        }
        *pixel = sample_cubic(image, sx, sy);
    }

    rotated
}

/// Cubic convolution kernel with a = -0.5 (Catmull-Rom).
fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t < 1.0 {
        (1.5 * t - 2.5) * t * t + 1.0
    } else if t < 2.0 {
        ((-0.5 * t + 2.5) * t - 4.0) * t + 2.0
    } else {
        0.0
    }
}

/// Sample a premultiplied image at a fractional position using the 4x4
/// neighborhood. Neighbors outside the image count as transparent.
fn sample_cubic(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (width, height) = image.dimensions();
    let x0 = x.floor();
    let y0 = y.floor();
    let mut acc = [0.0f64; 4];

    for j in -1..=2 {
        let row = y0 + f64::from(j);
        if row < 0.0 || row >= f64::from(height) {
            continue;
        }
        let wy = cubic_weight(y - row);
        for i in -1..=2 {
            let col = x0 + f64::from(i);
            if col < 0.0 || col >= f64::from(width) {
                continue;
            }
            let w = wy * cubic_weight(x - col);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let p = image.get_pixel(col as u32, row as u32);
            for (sum, &channel) in acc.iter_mut().zip(p.0.iter()) {
                *sum += w * f64::from(channel);
            }
        }
    }

    let alpha = acc[3].round().clamp(0.0, 255.0);
    // Premultiplied color never exceeds alpha, even where the kernel overshoots
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let channel = |v: f64| v.round().clamp(0.0, alpha) as u8;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let alpha_u8 = alpha as u8;
    Rgba([channel(acc[0]), channel(acc[1]), channel(acc[2]), alpha_u8])
}

/// Convert a premultiplied image to straight alpha.
#[must_use]
pub fn unpremultiply(mut image: RgbaImage) -> RgbaImage {
    for pixel in image.pixels_mut() {
        let a = u32::from(pixel[3]);
        if a == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
            continue;
        }
        if a == 255 {
            continue;
        }
        for c in 0..3 {
            let v = (u32::from(pixel[c]) * 255 + a / 2) / a;
            #[allow(clippy::cast_possible_truncation)]
            let v = v.min(255) as u8;
            pixel[c] = v;
        }
    }
    image
}
