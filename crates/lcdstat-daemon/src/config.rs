//! Configuration management.

use anyhow::{Context, Result};
use lcdstat_hw::{CursorStyle, Geometry, PinMap};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Display refresh period in milliseconds
    #[serde(default = "default_refresh")]
    pub refresh: u64,

    /// Mount point whose usage is shown
    #[serde(default = "default_filesystem")]
    pub filesystem: PathBuf,

    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Display device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// I2C bus device path
    #[serde(default = "default_device")]
    pub device: String,

    /// 7-bit I2C address of the expander
    #[serde(default = "default_address")]
    pub address: u8,

    /// Number of character rows
    #[serde(default = "default_rows")]
    pub rows: usize,

    /// Number of character columns
    #[serde(default = "default_columns")]
    pub columns: usize,

    /// Backlight state at startup
    #[serde(default = "default_true")]
    pub backlight: bool,

    /// Cursor style: "hidden", "solid" or "blink"
    #[serde(default = "default_cursor")]
    pub cursor: String,

    /// Clear the display and switch the backlight off on shutdown
    #[serde(default)]
    pub blank_on_exit: bool,

    /// Expander wiring
    #[serde(default)]
    pub pins: PinsConfig,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            address: default_address(),
            rows: default_rows(),
            columns: default_columns(),
            backlight: default_true(),
            cursor: default_cursor(),
            blank_on_exit: false,
            pins: PinsConfig::default(),
        }
    }
}

impl DisplayConfig {
    /// Returns the panel geometry.
    pub fn geometry(&self) -> lcdstat_hw::Result<Geometry> {
        Geometry::new(self.rows, self.columns)
    }

    /// Returns the configured cursor style.
    pub fn cursor_style(&self) -> Result<CursorStyle> {
        self.cursor.parse::<CursorStyle>().map_err(anyhow::Error::msg)
    }
}

/// Expander bit (0-7) driving each controller line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinsConfig {
    #[serde(default = "default_rs")]
    pub rs: u8,
    #[serde(default = "default_rw")]
    pub rw: u8,
    #[serde(default = "default_enable")]
    pub enable: u8,
    #[serde(default = "default_backlight_pin")]
    pub backlight: u8,
    /// D4, D5, D6, D7
    #[serde(default = "default_data_pins")]
    pub data: [u8; 4],
}

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            rs: default_rs(),
            rw: default_rw(),
            enable: default_enable(),
            backlight: default_backlight_pin(),
            data: default_data_pins(),
        }
    }
}

impl PinsConfig {
    /// Builds the driver's pin map.
    pub fn to_pin_map(&self) -> lcdstat_hw::Result<PinMap> {
        PinMap::new(self.rs, self.rw, self.enable, self.backlight, self.data)
    }
}

// Default value functions
fn default_refresh() -> u64 {
    1000
}

fn default_filesystem() -> PathBuf {
    PathBuf::from("/")
}

fn default_device() -> String {
    "/dev/i2c-0".to_string()
}

fn default_address() -> u8 {
    lcdstat_hw::DEFAULT_ADDRESS
}

fn default_rows() -> usize {
    4
}

fn default_columns() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_cursor() -> String {
    CursorStyle::Hidden.to_string()
}

fn default_rs() -> u8 {
    0
}

fn default_rw() -> u8 {
    1
}

fn default_enable() -> u8 {
    2
}

fn default_backlight_pin() -> u8 {
    3
}

fn default_data_pins() -> [u8; 4] {
    [4, 5, 6, 7]
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    /// Serialises the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh: default_refresh(),
            filesystem: default_filesystem(),
            display: DisplayConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.refresh, 1000);
        assert_eq!(config.filesystem, PathBuf::from("/"));
        assert_eq!(config.display.device, "/dev/i2c-0");
        assert_eq!(config.display.address, 0x3F);
        assert_eq!(config.display.rows, 4);
        assert_eq!(config.display.columns, 20);
        assert!(config.display.backlight);
        assert!(!config.display.blank_on_exit);
        assert_eq!(config.display.cursor_style().unwrap(), CursorStyle::Hidden);
        assert_eq!(config.display.pins.to_pin_map().unwrap(), PinMap::default());
    }

    #[test]
    fn test_parse_display_section() {
        let config = Config::parse(
            r#"
            refresh = 2000

            [display]
            device = "/dev/i2c-1"
            address = 0x27
            rows = 2
            columns = 16

            [display.pins]
            rs = 4
            rw = 5
            enable = 6
            backlight = 7
            data = [0, 1, 2, 3]
            "#,
        )
        .unwrap();
        assert_eq!(config.refresh, 2000);
        assert_eq!(config.display.address, 0x27);
        let geometry = config.display.geometry().unwrap();
        assert_eq!((geometry.rows(), geometry.columns()), (2, 16));
        let pins = config.display.pins.to_pin_map().unwrap();
        assert_eq!(pins.enable(), 0x40);
    }

    #[test]
    fn test_cursor_style() {
        let config = Config::parse("[display]\ncursor = \"blink\"\n").unwrap();
        assert_eq!(config.display.cursor_style().unwrap(), CursorStyle::Blink);

        let config = Config::parse("[display]\ncursor = \"dashed\"\n").unwrap();
        assert!(config.display.cursor_style().is_err());
    }

    #[test]
    fn test_invalid_pins_rejected() {
        let config = Config::parse("[display.pins]\nrs = 2\n").unwrap();
        assert!(config.display.pins.to_pin_map().is_err());
    }

    #[test]
    fn test_round_trip() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        let parsed = Config::parse(&text).unwrap();
        assert_eq!(parsed.display.columns, config.display.columns);
        assert_eq!(parsed.display.pins.data, config.display.pins.data);
    }
}
