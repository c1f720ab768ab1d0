//! `screenmark` - Watermarked screenshots of every display
//!
//! This library captures each active display, tiles a rotated watermark of
//! the local time and the machine's outbound IPv4 address over the capture,
//! and writes one image per display.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod display;
pub mod encode;
pub mod error;
pub mod logging;
pub mod network;
pub mod session;
pub mod watermark;

pub use config::Config;
pub use display::{describe_displays, DisplayInfo, DisplayRect, DisplaySource, XcapDisplays};
pub use encode::{write_image, OutputFormat};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use network::{AddressResolver, CachedResolver, UdpProbe};
pub use session::{Screenshot, Session, SessionOptions};
