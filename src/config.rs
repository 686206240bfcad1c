//! Panel wiring and defaults, read from a TOML file.
//!
//! ```toml
//! spi_device = "/dev/spidev0.0"
//! spi_speed_hz = 32000000
//! rotate = true
//! dither = true
//! font = "/usr/share/mztx/font.psf"
//! ```

use crate::lcd::gpio_pin::GpioPin;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    pub spi_device: PathBuf,
    pub spi_speed_hz: u32,
    /// BCM GPIO numbers.
    pub chip_select_pin: u8,
    pub register_select_pin: u8,
    pub reset_pin: u8,
    /// Drive the backlight from PWM0. Without it the backlight stays at
    /// whatever the board wiring gives it.
    pub backlight: bool,
    /// Landscape (320x240) rather than portrait (240x320).
    pub rotate: bool,
    /// Ordered dithering for images built from 8-bit colour.
    pub dither: bool,
    /// 8x16 font, PSF1 or a raw 4096 byte table.
    pub font: Option<PathBuf>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            spi_device: PathBuf::from("/dev/spidev0.0"),
            spi_speed_hz: 32_000_000,
            chip_select_pin: GpioPin::ChipSelectPin.into(),
            register_select_pin: GpioPin::RegisterSelectPin.into(),
            reset_pin: GpioPin::ResetPin.into(),
            backlight: true,
            rotate: true,
            dither: true,
            font: None,
        }
    }
}

impl PanelConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<PanelConfig, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        info!("Loaded panel configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config: PanelConfig = toml::from_str("").unwrap();
        assert_eq!(config, PanelConfig::default());
        assert_eq!(config.register_select_pin, 25);
        assert_eq!(config.reset_pin, 23);
        assert_eq!(config.chip_select_pin, 8);
    }

    #[test]
    fn overrides_selected_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rotate = false\nspi_speed_hz = 16000000\nfont = \"/tmp/f.psf\"").unwrap();

        let config = PanelConfig::load(file.path()).unwrap();
        assert!(!config.rotate);
        assert_eq!(config.spi_speed_hz, 16_000_000);
        assert_eq!(config.font, Some(PathBuf::from("/tmp/f.psf")));
        assert!(config.dither);
        assert_eq!(config.spi_device, PathBuf::from("/dev/spidev0.0"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<PanelConfig>("colour_depth = 24").is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            PanelConfig::load(dir.path().join("absent.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
