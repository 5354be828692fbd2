use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::delay::Delay;

/// sysfs value file of the GPIO wired to the microcontroller's reset pin.
pub const DEFAULT_GPIO_VALUE_PATH: &str = "/sys/class/gpio/gpio27/value";

const PULSE_LEVELS: [&str; 3] = ["1", "0", "1"];

#[derive(Debug, thiserror::Error)]
#[error("unable to drive reset line {}", path.display())]
pub struct ResetPulseError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Power-cycles the glove microcontroller through a GPIO line.
#[derive(Debug, Clone)]
pub struct ResetPulse {
    path: PathBuf,
    interval: Duration,
    recovery: Duration,
}

impl ResetPulse {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_timing(path, Duration::from_millis(250), Duration::from_secs(2))
    }

    pub fn with_timing(path: impl Into<PathBuf>, interval: Duration, recovery: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
            recovery,
        }
    }

    /// Drives the line high, low, high, holding each level for the pulse
    /// interval, then waits for the firmware to boot.
    pub fn fire(&self, delay: &mut impl Delay) -> Result<(), ResetPulseError> {
        for level in PULSE_LEVELS {
            self.write_level(level)
                .map_err(|source| ResetPulseError {
                    path: self.path.clone(),
                    source,
                })?;
            debug!(value = level, "Reset line driven");
            delay.delay(self.interval);
        }

        delay.delay(self.recovery);
        info!(path = ?self.path, "Microcontroller reset");
        Ok(())
    }

    fn write_level(&self, level: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.write_all(level.as_bytes())
    }
}
