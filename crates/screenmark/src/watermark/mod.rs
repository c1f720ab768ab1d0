//! Watermark rendering and compositing.
//!
//! A watermark is a line of text drawn with a fixed 8x16 bitmap face, scaled,
//! rotated 45 degrees and tiled across the whole capture:
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use screenmark::watermark::{apply_watermark, render_watermark, WatermarkStyle};
//!
//! let capture = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 255, 255]));
//! let mark = render_watermark("t - 1.2.3.4", &WatermarkStyle::default());
//! let marked = apply_watermark(&capture, &mark);
//! assert_eq!(marked.dimensions(), (100, 100));
//! ```

pub mod color;
pub mod compositor;
pub mod font;
pub mod render;

pub use color::{parse_hex_color, Color};
pub use compositor::{apply_watermark, blend_over, paint_over, tile_offsets, tile_watermark};
pub use font::BitmapFace;
pub use render::{canvas_size, draw_text, render_watermark, WatermarkStyle};
