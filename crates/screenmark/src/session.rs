//! The capture run.
//!
//! A [`Session`] walks every display in enumeration order and, for each one,
//! captures it, builds the watermark text from the current local time and the
//! outbound address, renders and tiles the watermark, and writes the result.
//! The first error aborts the run; displays after it are not touched.

use std::fmt::{Display, Write as _};
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::display::{DisplayRect, DisplaySource};
use crate::encode::{write_image, OutputFormat};
use crate::error::{Error, Result};
use crate::network::AddressResolver;
use crate::watermark::{apply_watermark, render_watermark, WatermarkStyle};

/// A screenshot written by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Screenshot {
    /// Index of the captured display.
    pub index: usize,
    /// The display's rectangle at capture time.
    pub rect: DisplayRect,
    /// Capture time in seconds since the Unix epoch.
    pub timestamp: i64,
    /// Text rendered into the watermark.
    pub text: String,
    /// Where the image was written.
    pub path: PathBuf,
}

/// Settings for a capture run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Watermark rendering parameters.
    pub style: WatermarkStyle,
    /// chrono format string for the timestamp in the watermark text.
    pub time_format: String,
    /// Output image format.
    pub format: OutputFormat,
    /// Directory the images are written to.
    pub output_dir: PathBuf,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            style: WatermarkStyle::default(),
            time_format: "%Y-%m-%d %H:%M:%S%.f %z".to_string(),
            format: OutputFormat::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl SessionOptions {
    /// Build options from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the watermark color does not parse.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            style: config.watermark_style()?,
            time_format: config.watermark.time_format.clone(),
            format: config.output.format,
            output_dir: config.output_dir(),
        })
    }
}

/// Watermark text: `"<local time> - <address>"`.
///
/// An unusable format string falls back to RFC 3339.
#[must_use]
pub fn watermark_text<Tz>(time: &DateTime<Tz>, ip: Ipv4Addr, time_format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut stamp = String::new();
    if write!(stamp, "{}", time.format(time_format)).is_err() {
        stamp = time.to_rfc3339();
    }
    format!("{stamp} - {ip}")
}

/// Output file name: `<unix seconds>_<index>_<width>x<height>.<ext>`.
#[must_use]
pub fn file_name(timestamp: i64, index: usize, rect: &DisplayRect, format: OutputFormat) -> String {
    format!(
        "{timestamp}_{index}_{}x{}.{}",
        rect.width,
        rect.height,
        format.extension()
    )
}

/// One pass over all displays.
#[derive(Debug)]
pub struct Session<D, R> {
    displays: D,
    resolver: R,
    options: SessionOptions,
}

impl<D: DisplaySource, R: AddressResolver> Session<D, R> {
    /// Create a session over `displays`, resolving addresses with `resolver`.
    pub fn new(displays: D, resolver: R, options: SessionOptions) -> Self {
        Self {
            displays,
            resolver,
            options,
        }
    }

    /// Capture, watermark and write every display, in order.
    ///
    /// `on_written` is called after each file is written, before the next
    /// display is captured.
    ///
    /// # Errors
    ///
    /// Returns the first error from any display; later displays are skipped.
    pub fn run<F>(&self, mut on_written: F) -> Result<Vec<Screenshot>>
    where
        F: FnMut(&Screenshot),
    {
        ensure_dir(&self.options.output_dir)?;

        let count = self.displays.count()?;
        info!(
            source = self.displays.name(),
            displays = count,
            format = %self.options.format,
            "Starting capture run"
        );

        let mut written = Vec::with_capacity(count);
        for index in 0..count {
            let shot = self.capture_display(index)?;
            on_written(&shot);
            written.push(shot);
        }
        Ok(written)
    }

    /// Capture, watermark and write a single display.
    ///
    /// # Errors
    ///
    /// Returns an error if capture, address resolution or writing fails.
    #[instrument(skip(self), fields(source = self.displays.name()))]
    pub fn capture_display(&self, index: usize) -> Result<Screenshot> {
        let rect = self.displays.bounds(index)?;
        let image = self.displays.capture(index, &rect)?;
        if image.dimensions() != rect.dimensions() {
            return Err(Error::capture(
                index,
                format!(
                    "captured {}x{} for a {} display",
                    image.width(),
                    image.height(),
                    rect
                ),
            ));
        }
        debug!(%rect, "Captured display");

        let now = Local::now();
        let ip = self.resolver.outbound_ipv4()?;
        let text = watermark_text(&now, ip, &self.options.time_format);
        let timestamp = now.timestamp();

        let watermark = render_watermark(&text, &self.options.style);
        let marked = apply_watermark(&image, &watermark);

        let path = self
            .options
            .output_dir
            .join(file_name(timestamp, index, &rect, self.options.format));
        write_image(&marked, &path, self.options.format)?;

        info!(%rect, path = %path.display(), %ip, "Screenshot written");
        Ok(Screenshot {
            index,
            rect,
            timestamp,
            text,
            path,
        })
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use crate::network::CachedResolver;
    use chrono::FixedOffset;
    use image::{Rgba, RgbaImage};
    use std::cell::Cell;

    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    /// Solid blue displays, optionally failing to capture one index.
    struct FakeDisplays {
        rects: Vec<DisplayRect>,
        fail_on: Option<usize>,
        captures: Cell<usize>,
    }

    impl FakeDisplays {
        fn new(rects: Vec<DisplayRect>) -> Self {
            Self {
                rects,
                fail_on: None,
                captures: Cell::new(0),
            }
        }

        fn failing_on(mut self, index: usize) -> Self {
            self.fail_on = Some(index);
            self
        }
    }

    impl DisplaySource for FakeDisplays {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn count(&self) -> Result<usize> {
            Ok(self.rects.len())
        }

        fn bounds(&self, index: usize) -> Result<DisplayRect> {
            self.rects.get(index).copied().ok_or(Error::DisplayNotFound {
                index,
                count: self.rects.len(),
            })
        }

        fn capture(&self, index: usize, rect: &DisplayRect) -> Result<RgbaImage> {
            self.captures.set(self.captures.get() + 1);
            if self.fail_on == Some(index) {
                return Err(Error::capture(index, "display disconnected"));
            }
            Ok(RgbaImage::from_pixel(rect.width, rect.height, BLUE))
        }
    }

    struct FixedResolver {
        ip: Ipv4Addr,
        calls: Cell<usize>,
    }

    impl FixedResolver {
        fn new(ip: Ipv4Addr) -> Self {
            Self {
                ip,
                calls: Cell::new(0),
            }
        }
    }

    impl AddressResolver for FixedResolver {
        fn outbound_ipv4(&self) -> Result<Ipv4Addr> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.ip)
        }
    }

    fn options(dir: &Path) -> SessionOptions {
        SessionOptions {
            output_dir: dir.to_path_buf(),
            ..SessionOptions::default()
        }
    }

    fn rects() -> Vec<DisplayRect> {
        vec![
            DisplayRect::new(0, 0, 120, 80),
            DisplayRect::new(120, 0, 64, 96),
            DisplayRect::new(-50, -20, 50, 20),
        ]
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_watermark_text_format() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let time = offset.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let text = watermark_text(&time, Ipv4Addr::new(10, 0, 0, 7), "%Y-%m-%d %H:%M:%S %z");
        assert_eq!(text, "2024-03-09 14:05:07 +0200 - 10.0.0.7");
    }

    #[test]
    fn test_file_name_pattern() {
        let rect = DisplayRect::new(-1920, 0, 1920, 1080);
        assert_eq!(
            file_name(1_700_000_000, 1, &rect, OutputFormat::Png),
            "1700000000_1_1920x1080.png"
        );
        assert_eq!(
            file_name(5, 0, &rect, OutputFormat::Jpeg),
            "5_0_1920x1080.jpeg"
        );
    }

    #[test]
    fn test_one_file_per_display() {
        init_test_logging();
        let dir = tempfile::tempdir().unwrap();
        let displays = FakeDisplays::new(rects());
        let resolver = FixedResolver::new(Ipv4Addr::new(1, 2, 3, 4));
        let session = Session::new(displays, resolver, options(dir.path()));

        let mut reported = Vec::new();
        let shots = session.run(|s| reported.push(s.path.clone())).unwrap();

        assert_eq!(shots.len(), 3);
        assert_eq!(files_in(dir.path()).len(), 3);
        assert_eq!(
            reported,
            shots.iter().map(|s| s.path.clone()).collect::<Vec<_>>()
        );

        for (shot, rect) in shots.iter().zip(rects()) {
            let name = shot.path.file_name().unwrap().to_string_lossy().into_owned();
            assert_eq!(
                name,
                format!(
                    "{}_{}_{}x{}.png",
                    shot.timestamp, shot.index, rect.width, rect.height
                )
            );
            assert_eq!(shot.rect, rect);

            let decoded = image::open(&shot.path).unwrap().to_rgba8();
            assert_eq!(decoded.dimensions(), rect.dimensions());
        }
    }

    #[test]
    fn test_watermark_text_per_display() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(
            FakeDisplays::new(rects()),
            FixedResolver::new(Ipv4Addr::new(192, 168, 1, 20)),
            options(dir.path()),
        );

        for shot in session.run(|_| {}).unwrap() {
            let (stamp, ip) = shot.text.rsplit_once(" - ").unwrap();
            assert_eq!(ip, "192.168.1.20");
            let parsed = DateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S%.f %z").unwrap();
            assert_eq!(parsed.timestamp(), shot.timestamp);
        }
    }

    #[test]
    fn test_resolves_once_per_display() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FixedResolver::new(Ipv4Addr::LOCALHOST);
        let session = Session::new(FakeDisplays::new(rects()), &resolver, options(dir.path()));

        session.run(|_| {}).unwrap();
        assert_eq!(resolver.calls.get(), 3);
    }

    #[test]
    fn test_cached_resolver_resolves_once_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FixedResolver::new(Ipv4Addr::LOCALHOST);
        let session = Session::new(
            FakeDisplays::new(rects()),
            CachedResolver::new(&resolver),
            options(dir.path()),
        );

        session.run(|_| {}).unwrap();
        assert_eq!(resolver.calls.get(), 1);
    }

    /// Answers until `answers` runs out, then reports no route.
    struct FailingAfter {
        answers: Cell<usize>,
    }

    impl AddressResolver for FailingAfter {
        fn outbound_ipv4(&self) -> Result<Ipv4Addr> {
            match self.answers.get() {
                0 => Err(Error::OutboundAddress {
                    probe: "192.0.2.1:80".to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NetworkUnreachable,
                        "no route",
                    ),
                }),
                n => {
                    self.answers.set(n - 1);
                    Ok(Ipv4Addr::new(10, 0, 0, 1))
                }
            }
        }
    }

    #[test]
    fn test_resolver_failure_aborts_remaining_displays() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(
            FakeDisplays::new(rects()),
            FailingAfter {
                answers: Cell::new(1),
            },
            options(dir.path()),
        );

        let mut reported = 0;
        let err = session.run(|_| reported += 1).unwrap_err();

        assert!(matches!(err, Error::OutboundAddress { .. }));
        assert!(err.to_string().contains("no route"));
        assert_eq!(reported, 1);
        let files = files_in(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].contains("_0_120x80"));
        // Display 1 was captured before its lookup failed; display 2 never was
        assert_eq!(session.displays.captures.get(), 2);
    }

    #[test]
    fn test_capture_failure_aborts_remaining_displays() {
        let dir = tempfile::tempdir().unwrap();
        let displays = FakeDisplays::new(rects()).failing_on(1);
        let session = Session::new(
            displays,
            FixedResolver::new(Ipv4Addr::new(1, 2, 3, 4)),
            options(dir.path()),
        );

        let mut reported = 0;
        let err = session.run(|_| reported += 1).unwrap_err();

        assert!(matches!(err, Error::Capture { index: 1, .. }));
        assert_eq!(reported, 1);
        let files = files_in(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].contains("_0_120x80"));
        // Display 2 was never captured
        assert_eq!(session.displays.captures.get(), 2);
    }

    #[test]
    fn test_no_displays_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(
            FakeDisplays::new(Vec::new()),
            FixedResolver::new(Ipv4Addr::LOCALHOST),
            options(dir.path()),
        );

        assert!(session.run(|_| {}).unwrap().is_empty());
        assert!(files_in(dir.path()).is_empty());
    }

    #[test]
    fn test_creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let session = Session::new(
            FakeDisplays::new(vec![DisplayRect::new(0, 0, 10, 10)]),
            FixedResolver::new(Ipv4Addr::LOCALHOST),
            options(&nested),
        );

        session.run(|_| {}).unwrap();
        assert_eq!(files_in(&nested).len(), 1);
    }

    #[test]
    fn test_solid_blue_capture_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let capture = RgbaImage::from_pixel(100, 100, BLUE);
        let mark = render_watermark("t - 1.2.3.4", &WatermarkStyle::default());
        let marked = apply_watermark(&capture, &mark);
        let path = dir.path().join("blue.png");
        write_image(&marked, &path, OutputFormat::Png).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (100, 100));

        let mut inked = 0;
        for p in decoded.pixels() {
            assert_eq!(p[3], 255);
            assert_eq!(p[1], 0, "unexpected hue {p:?}");
            if *p != BLUE {
                inked += 1;
                assert!(p[0] > 0, "non-blue pixel without red: {p:?}");
            }
        }
        assert!(inked > 0, "watermark left no mark");
        assert!(inked < 100 * 100, "watermark covered every pixel");
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.output.format = OutputFormat::Gif;
        config.output.directory = Some(PathBuf::from("/tmp/x"));

        let options = SessionOptions::from_config(&config).unwrap();
        assert_eq!(options.format, OutputFormat::Gif);
        assert_eq!(options.output_dir, PathBuf::from("/tmp/x"));
        assert_eq!(options.style, WatermarkStyle::default());
        assert_eq!(options, SessionOptions {
            format: OutputFormat::Gif,
            output_dir: PathBuf::from("/tmp/x"),
            ..SessionOptions::default()
        });
    }
}
