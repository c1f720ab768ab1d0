//! Command-line interface for screenmark.
//!
//! Running the binary with no subcommand performs a capture run with the
//! configured settings.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{CaptureCommand, ConfigCommand, DisplaysCommand, FormatArg};

/// screenmark - Watermarked screenshots of every display
///
/// Captures each active display, stamps it with a tiled watermark of the
/// local time and the machine's outbound IPv4 address, and writes one image
/// per display.
#[derive(Debug, Parser)]
#[command(name = "screenmark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute (defaults to `capture`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Capture and watermark every display
    Capture(CaptureCommand),

    /// List active displays and their rectangles
    Displays(DisplaysCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }

    /// The command to run, with a bare invocation meaning `capture`.
    #[must_use]
    pub fn command_or_default(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Capture(CaptureCommand::default()))
    }
}
