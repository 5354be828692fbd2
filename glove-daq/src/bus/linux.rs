use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, IntoRawFd};
use std::path::PathBuf;

use super::{I2cChannel, I2cPort};

// I2C_SLAVE from <linux/i2c-dev.h>
nix::ioctl_write_int_bad!(i2c_set_slave, 0x0703);

/// An i2c-dev character device such as `/dev/i2c-1`.
#[derive(Debug, Clone)]
pub struct LinuxI2cPort {
    path: PathBuf,
    device: String,
}

impl LinuxI2cPort {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let device = path.display().to_string();
        Self { path, device }
    }
}

impl I2cPort for LinuxI2cPort {
    type Channel = LinuxI2cChannel;

    fn device(&self) -> &str {
        &self.device
    }

    fn open(&self) -> io::Result<Self::Channel> {
        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        Ok(LinuxI2cChannel { file })
    }
}

pub struct LinuxI2cChannel {
    file: File,
}

impl I2cChannel for LinuxI2cChannel {
    fn select(&mut self, address: u16) -> io::Result<()> {
        // SAFETY: the descriptor belongs to `self.file`, which outlives the call.
        unsafe { i2c_set_slave(self.file.as_raw_fd(), address.into()) }
            .map(drop)
            .map_err(io::Error::from)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.file.write(data)
    }

    fn close(self) -> io::Result<()> {
        nix::unistd::close(self.file.into_raw_fd()).map_err(io::Error::from)
    }
}
