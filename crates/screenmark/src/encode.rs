//! Output encoding.
//!
//! PNG is the default and the only lossless choice; GIF and JPEG are kept as
//! alternatives for smaller files.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, Frame, ImageEncoder, ImageError, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// JPEG quality used for the `jpeg` format.
pub const JPEG_QUALITY: u8 = 75;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG with alpha.
    #[default]
    Png,
    /// GIF quantized to a 256-color palette.
    Gif,
    /// Baseline JPEG without alpha.
    Jpeg,
}

impl OutputFormat {
    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Jpeg => "jpeg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// Encode `image` into `writer`.
///
/// # Errors
///
/// Returns the encoder's error unchanged.
pub fn encode<W: Write>(
    image: &RgbaImage,
    writer: W,
    format: OutputFormat,
) -> std::result::Result<(), ImageError> {
    let (width, height) = image.dimensions();
    match format {
        OutputFormat::Png => PngEncoder::new(writer).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        OutputFormat::Gif => {
            let mut encoder = GifEncoder::new(writer);
            encoder.encode_frame(Frame::new(image.clone()))
        }
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(writer, JPEG_QUALITY).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
    }
}

/// Write `image` to `path`, creating or truncating the file.
///
/// A file left behind by a failed encode is removed before returning.
///
/// # Errors
///
/// Returns [`Error::FileCreate`] if the file cannot be opened and
/// [`Error::Encode`] if encoding or flushing fails.
pub fn write_image(image: &RgbaImage, path: &Path, format: OutputFormat) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::FileCreate {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let result = encode(image, &mut writer, format)
        .and_then(|()| writer.flush().map_err(ImageError::IoError));
    drop(writer);

    match result {
        Ok(()) => {
            debug!(path = %path.display(), %format, "Encoded image");
            Ok(())
        }
        Err(source) => {
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "Failed to remove partial output");
            }
            Err(Error::Encode {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        let mut image = RgbaImage::from_pixel(12, 9, Rgba([0, 0, 255, 255]));
        image.put_pixel(3, 4, Rgba([255, 0, 0, 255]));
        image
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("GIF".parse::<OutputFormat>().unwrap(), OutputFormat::Gif);
        assert_eq!("jpg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
    }

    #[test]
    fn test_unknown_format() {
        let err = "bmp".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, Error::UnknownFormat(ref f) if f == "bmp"));
        assert_eq!(err.to_string(), "unknown format bmp");
    }

    #[test]
    fn test_format_default_and_extension() {
        assert_eq!(OutputFormat::default(), OutputFormat::Png);
        assert_eq!(OutputFormat::Png.to_string(), "png");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpeg");
    }

    #[test]
    fn test_format_serde() {
        let json = serde_json::to_string(&OutputFormat::Gif).unwrap();
        assert_eq!(json, r#""gif""#);
        let parsed: OutputFormat = serde_json::from_str(r#""jpeg""#).unwrap();
        assert_eq!(parsed, OutputFormat::Jpeg);
    }

    #[test]
    fn test_write_png_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let image = sample();

        write_image(&image, &path, OutputFormat::Png).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_write_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        fs::write(&path, vec![0u8; 1 << 16]).unwrap();

        write_image(&sample(), &path, OutputFormat::Png).unwrap();

        assert!(fs::metadata(&path).unwrap().len() < 1 << 16);
        assert!(image::open(&path).is_ok());
    }

    #[test]
    fn test_write_gif_and_jpeg_decode() {
        let dir = tempfile::tempdir().unwrap();
        for format in [OutputFormat::Gif, OutputFormat::Jpeg] {
            let path = dir.path().join(format!("out.{}", format.extension()));
            write_image(&sample(), &path, format).unwrap();
            let decoded = image::open(&path).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (12, 9));
        }
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.png");

        let err = write_image(&sample(), &path, OutputFormat::Png).unwrap_err();
        assert!(matches!(err, Error::FileCreate { .. }));
    }

    #[test]
    fn test_encode_failure_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.gif");
        // GIF dimensions are 16-bit
        let image = RgbaImage::new(70_000, 1);

        let err = write_image(&image, &path, OutputFormat::Gif).unwrap_err();

        assert!(matches!(err, Error::Encode { .. }), "{err}");
        assert!(!path.exists());
    }
}
