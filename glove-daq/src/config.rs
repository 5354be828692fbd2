use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{WrapErr, ensure};
use glove_core::Side;
use glove_core::normalize::ADC_FULL_SCALE;
use serde::Deserialize;

use crate::output::xml::DEFAULT_OUTPUT_PATH;
use crate::reset::DEFAULT_GPIO_VALUE_PATH;
use crate::sequencer::{DEFAULT_ADDRESS, Timing};

/// Highest 7-bit I2C address.
const MAX_ADDRESS: u16 = 0x7f;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bus: BusConfig,
    pub glove: GloveConfig,
    pub timing: TimingConfig,
    /// Reset pulse sent once before the first cycle. A config file without
    /// a `[reset]` table skips it.
    #[serde(default)]
    pub reset: Option<ResetConfig>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BusConfig {
    /// 7-bit address of the glove microcontroller
    #[serde(default = "default_address")]
    pub address: u16,
    pub device: BusDevice,
}

fn default_address() -> u16 {
    DEFAULT_ADDRESS
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusDevice {
    Linux {
        path: PathBuf,
    },
    Mock {
        /// Draw a fresh random frame every cycle
        #[serde(default)]
        jitter: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GloveConfig {
    /// Hand the acquisition rig is wired to
    pub side: Side,
    /// Raw flex value that maps to 100 before bucketing
    pub flex_full_scale: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub cursor_settle_us: u64,
    pub read_settle_us: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetConfig {
    pub gpio_value_path: PathBuf,
    #[serde(default = "default_pulse_interval_ms")]
    pub pulse_interval_ms: u64,
    #[serde(default = "default_recovery_ms")]
    pub recovery_ms: u64,
}

fn default_pulse_interval_ms() -> u64 {
    250
}

fn default_recovery_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    File { path: PathBuf },
    Stdout,
}

impl Config {
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .wrap_err_with(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> color_eyre::Result<()> {
        ensure!(
            self.bus.address <= MAX_ADDRESS,
            "bus address {:#x} is not a 7-bit I2C address",
            self.bus.address
        );
        ensure!(
            self.glove.flex_full_scale.is_finite() && self.glove.flex_full_scale > 0.0,
            "flex_full_scale must be positive, got {}",
            self.glove.flex_full_scale
        );
        Ok(())
    }
}

impl From<&TimingConfig> for Timing {
    fn from(config: &TimingConfig) -> Self {
        Timing {
            cursor_settle: Duration::from_micros(config.cursor_settle_us),
            read_settle: Duration::from_micros(config.read_settle_us),
        }
    }
}

impl ResetConfig {
    pub fn pulse_interval(&self) -> Duration {
        Duration::from_millis(self.pulse_interval_ms)
    }

    pub fn recovery(&self) -> Duration {
        Duration::from_millis(self.recovery_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            glove: GloveConfig::default(),
            timing: TimingConfig::default(),
            reset: Some(ResetConfig {
                gpio_value_path: PathBuf::from(DEFAULT_GPIO_VALUE_PATH),
                pulse_interval_ms: default_pulse_interval_ms(),
                recovery_ms: default_recovery_ms(),
            }),
            output: OutputConfig::default(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            device: BusDevice::Linux {
                path: PathBuf::from("/dev/i2c-1"),
            },
        }
    }
}

impl Default for GloveConfig {
    fn default() -> Self {
        Self {
            side: Side::Right,
            flex_full_scale: ADC_FULL_SCALE,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        let timing = Timing::default();
        Self {
            cursor_settle_us: timing.cursor_settle.as_micros() as u64,
            read_settle_us: timing.read_settle.as_micros() as u64,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig::File {
            path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[bus]
address = 4
[bus.device]
type = "linux"
path = "/dev/i2c-1"

[glove]
side = "left"
flex_full_scale = 900.0

[timing]
cursor_settle_us = 62500
read_settle_us = 31250

[reset]
gpio_value_path = "/sys/class/gpio/gpio27/value"
pulse_interval_ms = 100

[output]
type = "stdout"
"#;

    #[test]
    fn parses_every_section() {
        let config: Config = toml::from_str(FULL).unwrap();

        assert_eq!(config.bus.address, 0x04);
        assert_eq!(
            config.bus.device,
            BusDevice::Linux {
                path: PathBuf::from("/dev/i2c-1")
            }
        );
        assert_eq!(config.glove.side, Side::Left);
        assert_eq!(config.glove.flex_full_scale, 900.0);
        assert_eq!(Timing::from(&config.timing), Timing::default());

        let reset = config.reset.unwrap();
        assert_eq!(reset.pulse_interval(), Duration::from_millis(100));
        assert_eq!(reset.recovery(), Duration::from_secs(2));
        assert_eq!(config.output, OutputConfig::Stdout);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
[bus.device]
type = "mock"
jitter = true
"#,
        )
        .unwrap();

        assert_eq!(config.bus.address, DEFAULT_ADDRESS);
        assert_eq!(config.bus.device, BusDevice::Mock { jitter: true });
        assert_eq!(config.glove, GloveConfig::default());
        assert_eq!(config.timing, TimingConfig::default());
        assert_eq!(config.reset, None);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn default_matches_rig_wiring() {
        let config = Config::default();

        assert_eq!(config.glove.side, Side::Right);
        assert_eq!(config.timing.cursor_settle_us, 62_500);
        assert_eq!(config.timing.read_settle_us, 31_250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unusable_full_scale() {
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut config = Config::default();
            config.glove.flex_full_scale = scale;
            assert!(config.validate().is_err(), "accepted {scale}");
        }
    }

    #[test]
    fn rejects_ten_bit_address() {
        let mut config = Config::default();
        config.bus.address = 0x80;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[glove]\nflex_full_scale = 0.0\n").unwrap();

        assert!(Config::load(file.path()).is_err());
    }
}
