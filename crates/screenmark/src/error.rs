//! Error types for screenmark.
//!
//! Every failure in a capture run is fatal for the whole run: errors are
//! propagated to `main`, which reports them and exits with a non-zero status.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for screenmark operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Display Errors ===
    /// The platform could not list the attached displays.
    #[error("failed to enumerate displays: {message}")]
    DisplayEnumeration {
        /// Description of what went wrong.
        message: String,
    },

    /// A display index outside `[0, count)` was requested.
    #[error("display {index} not found ({count} active)")]
    DisplayNotFound {
        /// The requested index.
        index: usize,
        /// Number of active displays.
        count: usize,
    },

    /// Capturing the contents of a display failed.
    #[error("failed to capture display {index}: {message}")]
    Capture {
        /// Index of the display being captured.
        index: usize,
        /// Description of what went wrong.
        message: String,
    },

    // === Network Errors ===
    /// The local outbound address could not be determined.
    #[error("failed to resolve outbound address via {probe}: {source}")]
    OutboundAddress {
        /// The remote address used as the routing probe.
        probe: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Watermark Errors ===
    /// A color string could not be parsed.
    #[error("invalid color '{value}': {message}")]
    InvalidColor {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        message: String,
    },

    // === Output Errors ===
    /// The requested output format is not supported.
    #[error("unknown format {0}")]
    UnknownFormat(String),

    /// The output file could not be created.
    #[error("failed to create {path}: {source}")]
    FileCreate {
        /// Path of the output file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Encoding the image into the output file failed.
    #[error("unable to encode image to {path}: {source}")]
    Encode {
        /// Path of the output file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: image::ImageError,
    },

    /// The output directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },
}

/// A specialized Result type for screenmark operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a display enumeration error.
    #[must_use]
    pub fn display_enumeration(message: impl Into<String>) -> Self {
        Self::DisplayEnumeration {
            message: message.into(),
        }
    }

    /// Create a capture error for the given display.
    #[must_use]
    pub fn capture(index: usize, message: impl Into<String>) -> Self {
        Self::Capture {
            index,
            message: message.into(),
        }
    }

    /// Create an invalid color error.
    #[must_use]
    pub fn invalid_color(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidColor {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}
