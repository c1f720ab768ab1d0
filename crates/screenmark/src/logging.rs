//! Diagnostic logging.
//!
//! stdout carries only the `[*] Screenshot Written: <path>` lines, so scripts
//! can collect the written files. Everything `tracing` emits goes to stderr,
//! filtered to the `screenmark` target at a level picked by `-q` / `-v`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much of the capture run to report on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `-q`: failures only.
    Quiet,
    /// Run start and one line per written screenshot.
    #[default]
    Normal,
    /// `-v`: display geometry, tiling and encoder details.
    Verbose,
    /// `-vv`: per-socket address lookups and render sizes.
    Trace,
}

impl Verbosity {
    /// Most detailed level shown at this verbosity.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    fn directive(self) -> String {
        format!("screenmark={}", self.to_level_filter())
    }
}

/// Install the stderr subscriber.
///
/// A `RUST_LOG` value replaces the verbosity-derived filter. Calling this a
/// second time keeps the first subscriber.
///
/// # Examples
///
/// ```no_run
/// use screenmark::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .try_init();
}

/// Route warnings from code under test through the test harness's capture.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("screenmark=warn")
        .with_test_writer()
        .try_init();
}
