//! Configuration management for screenmark.
//!
//! Configuration is loaded with figment from serialized defaults, an optional
//! TOML file and `SCREENMARK_`-prefixed environment variables. The defaults
//! are the complete behavior of the tool; nothing has to be configured.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::encode::OutputFormat;
use crate::error::{Error, Result};
use crate::network::DEFAULT_PROBE_ADDRESS;
use crate::watermark::{parse_hex_color, BitmapFace, WatermarkStyle};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name under the platform config directory.
const CONFIG_DIR_NAME: &str = "screenmark";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "SCREENMARK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SCREENMARK_`, sections split on `__`)
/// 2. TOML config file at `<config dir>/screenmark/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Watermark appearance.
    pub watermark: WatermarkConfig,
    /// Output location and format.
    pub output: OutputConfig,
    /// Outbound address discovery.
    pub network: NetworkConfig,
}

/// Watermark appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Text color as `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`.
    pub text_color: String,
    /// Scale factor applied to the rendered text.
    pub scale: f64,
    /// Padding around the text, in glyph cells.
    pub padding: u32,
    /// Counter-clockwise rotation in degrees.
    pub rotation_degrees: f64,
    /// chrono format string for the local timestamp in the text.
    pub time_format: String,
}

/// Output-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for screenshots. Defaults to the current directory.
    pub directory: Option<PathBuf>,
    /// Image format.
    pub format: OutputFormat,
}

/// Network-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Remote address used only to select the outbound route.
    pub probe_address: String,
    /// Query the outbound address once per display instead of once per run.
    pub resolve_per_display: bool,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text_color: "#FF0000FF".to_string(),
            scale: 2.0,
            padding: 2,
            rotation_degrees: 45.0,
            time_format: "%Y-%m-%d %H:%M:%S%.f %z".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_address: DEFAULT_PROBE_ADDRESS.to_string(),
            resolve_per_display: true,
        }
    }
}

impl Config {
    /// Load configuration, reading the TOML file at `config_path` or, when
    /// `None`, at [`Config::default_config_path`].
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let wm = &self.watermark;

        if !wm.scale.is_finite() || wm.scale <= 0.0 {
            return Err(Error::config_validation(format!(
                "watermark.scale must be a positive number, got {}",
                wm.scale
            )));
        }

        if wm.padding == 0 {
            return Err(Error::config_validation(
                "watermark.padding must be greater than 0",
            ));
        }

        if !wm.rotation_degrees.is_finite() {
            return Err(Error::config_validation(
                "watermark.rotation_degrees must be finite",
            ));
        }

        if wm.time_format.is_empty()
            || StrftimeItems::new(&wm.time_format).any(|item| matches!(item, Item::Error))
        {
            return Err(Error::config_validation(format!(
                "watermark.time_format is not a valid format string: {:?}",
                wm.time_format
            )));
        }

        if let Err(e) = parse_hex_color(&wm.text_color) {
            return Err(Error::config_validation(format!("watermark.text_color: {e}")));
        }

        if self.network.probe_address.parse::<SocketAddr>().is_err() {
            return Err(Error::config_validation(format!(
                "network.probe_address must be an ip:port pair, got {}",
                self.network.probe_address
            )));
        }

        Ok(())
    }

    /// Build the renderer style from the watermark section.
    ///
    /// # Errors
    ///
    /// Returns an error if the text color does not parse.
    pub fn watermark_style(&self) -> Result<WatermarkStyle> {
        Ok(WatermarkStyle {
            color: parse_hex_color(&self.watermark.text_color)?,
            scale: self.watermark.scale,
            padding: self.watermark.padding,
            rotation_degrees: self.watermark.rotation_degrees,
            face: BitmapFace,
        })
    }

    /// The routing probe address.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured address does not parse.
    pub fn probe_address(&self) -> Result<SocketAddr> {
        self.network.probe_address.parse().map_err(|_| {
            Error::config_validation(format!(
                "network.probe_address must be an ip:port pair, got {}",
                self.network.probe_address
            ))
        })
    }

    /// Directory screenshots are written to, resolving the default.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
