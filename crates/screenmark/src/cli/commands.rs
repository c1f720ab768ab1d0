//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::config::Config;
use crate::encode::OutputFormat;

/// Capture command arguments.
///
/// Each flag overrides the matching configuration value for this run only.
#[derive(Debug, Default, Args)]
pub struct CaptureCommand {
    /// Output image format
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Directory to write screenshots to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Look up the outbound address once for the whole run
    #[arg(long)]
    pub resolve_once: bool,
}

impl CaptureCommand {
    /// Apply the flags on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(format) = self.format {
            config.output.format = format.into();
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = Some(dir.clone());
        }
        if self.resolve_once {
            config.network.resolve_per_display = false;
        }
    }
}

/// Displays command arguments.
#[derive(Debug, Args)]
pub struct DisplaysCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Lossless PNG
    Png,
    /// 256-color GIF
    Gif,
    /// JPEG at quality 75
    #[value(alias = "jpg")]
    Jpeg,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => Self::Png,
            FormatArg::Gif => Self::Gif,
            FormatArg::Jpeg => Self::Jpeg,
        }
    }
}
