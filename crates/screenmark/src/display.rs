//! Display enumeration and screen capture.
//!
//! [`DisplaySource`] is the seam between the capture session and the
//! platform. [`XcapDisplays`] implements it on top of the `xcap` crate; tests
//! substitute in-memory sources.

use std::fmt;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, warn};
use xcap::Monitor;

use crate::error::{Error, Result};

/// A monitor's pixel rectangle in global screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DisplayRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl DisplayRect {
    /// Create a rectangle from its origin and size.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Width and height as a tuple.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for DisplayRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{:+}{:+}", self.width, self.height, self.x, self.y)
    }
}

/// Source of displays and their pixels.
///
/// Indices are stable for the lifetime of the source and run from `0` to
/// `count() - 1`.
pub trait DisplaySource {
    /// The name of this source (for logging).
    fn name(&self) -> &'static str;

    /// Number of active displays.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot enumerate displays.
    fn count(&self) -> Result<usize>;

    /// Rectangle of the display at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DisplayNotFound`] for an index outside `[0, count)`,
    /// or a capture error if the platform cannot report the geometry.
    fn bounds(&self, index: usize) -> Result<DisplayRect>;

    /// Capture the current contents of the display at `index`.
    ///
    /// The returned image has exactly `rect`'s dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] if the platform capture call fails, for
    /// example when screen recording permission is missing.
    fn capture(&self, index: usize, rect: &DisplayRect) -> Result<RgbaImage>;

    /// Human-readable label for the display, if the platform has one.
    fn label(&self, _index: usize) -> Option<String> {
        None
    }
}

/// Displays reported by the `xcap` crate.
///
/// The monitor list is taken once, when the source is created.
pub struct XcapDisplays {
    monitors: Vec<Monitor>,
}

impl fmt::Debug for XcapDisplays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XcapDisplays")
            .field("monitors", &self.monitors.len())
            .finish()
    }
}

impl XcapDisplays {
    /// Enumerate the active monitors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DisplayEnumeration`] if the platform call fails.
    pub fn enumerate() -> Result<Self> {
        let monitors = Monitor::all().map_err(|e| Error::display_enumeration(e.to_string()))?;
        debug!(count = monitors.len(), "Enumerated monitors");
        Ok(Self { monitors })
    }

    fn monitor(&self, index: usize) -> Result<&Monitor> {
        self.monitors.get(index).ok_or(Error::DisplayNotFound {
            index,
            count: self.monitors.len(),
        })
    }
}

impl DisplaySource for XcapDisplays {
    fn name(&self) -> &'static str {
        "xcap"
    }

    fn count(&self) -> Result<usize> {
        Ok(self.monitors.len())
    }

    fn bounds(&self, index: usize) -> Result<DisplayRect> {
        let monitor = self.monitor(index)?;
        let geometry = |e: xcap::XCapError| Error::capture(index, format!("geometry: {e}"));
        Ok(DisplayRect::new(
            monitor.x().map_err(geometry)?,
            monitor.y().map_err(geometry)?,
            monitor.width().map_err(geometry)?,
            monitor.height().map_err(geometry)?,
        ))
    }

    fn capture(&self, index: usize, rect: &DisplayRect) -> Result<RgbaImage> {
        let monitor = self.monitor(index)?;
        let image = monitor
            .capture_image()
            .map_err(|e| Error::capture(index, e.to_string()))?;
        Ok(fit_to_rect(image, index, rect))
    }

    fn label(&self, index: usize) -> Option<String> {
        self.monitors.get(index).and_then(|m| m.name().ok())
    }
}

/// One row of a display listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayInfo {
    /// Enumeration index.
    pub index: usize,
    /// Platform label, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Pixel rectangle.
    #[serde(flatten)]
    pub rect: DisplayRect,
}

/// List every display of `source` in enumeration order.
///
/// # Errors
///
/// Returns the first enumeration or geometry error.
pub fn describe_displays<D: DisplaySource + ?Sized>(source: &D) -> Result<Vec<DisplayInfo>> {
    (0..source.count()?)
        .map(|index| {
            Ok(DisplayInfo {
                index,
                label: source.label(index),
                rect: source.bounds(index)?,
            })
        })
        .collect()
}

/// Resample `image` to `rect`'s size if the backend returned a different one.
///
/// HiDPI backends report logical geometry but capture physical pixels.
#[must_use]
pub fn fit_to_rect(image: RgbaImage, index: usize, rect: &DisplayRect) -> RgbaImage {
    if image.dimensions() == rect.dimensions() || rect.is_empty() {
        return image;
    }
    warn!(
        display = index,
        captured = ?image.dimensions(),
        expected = ?rect.dimensions(),
        "Captured size differs from display bounds; resampling"
    );
    imageops::resize(&image, rect.width, rect.height, FilterType::Triangle)
}
