pub mod linux;
pub mod mock;

use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => f.write_str("read"),
            Direction::Write => f.write_str("write"),
        }
    }
}

/// Errors raised by a single bus transaction.
///
/// None of these are fatal: the sequencer downgrades the cycle and moves on.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("unable to open I2C channel {device}")]
    ChannelOpen {
        device: String,
        #[source]
        source: io::Error,
    },
    #[error("unable to address I2C device {address:#04x}")]
    Addressing {
        address: u16,
        #[source]
        source: io::Error,
    },
    #[error("unable to {direction} {width} bytes on I2C bus")]
    Transfer {
        direction: Direction,
        width: usize,
        #[source]
        source: io::Error,
    },
    #[error("unable to close I2C channel")]
    ChannelClose(#[source] io::Error),
}

/// A bus that hands out one fresh channel per transaction.
pub trait I2cPort {
    type Channel: I2cChannel;

    /// Human-readable name of the underlying device, for error reports.
    fn device(&self) -> &str;

    fn open(&self) -> io::Result<Self::Channel>;
}

/// An open handle on the bus. Dropping it releases the handle without
/// reporting; [`I2cChannel::close`] releases it and reports failure.
pub trait I2cChannel {
    fn select(&mut self, address: u16) -> io::Result<()>;

    /// Returns the number of bytes actually received.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Returns the number of bytes actually sent.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    fn close(self) -> io::Result<()>;
}

/// One fixed-width exchange with the peer.
///
/// Consumed by [`Transaction::run`]; the channel it opens never outlives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    direction: Direction,
    address: u16,
    payload: Vec<u8>,
}

impl Transaction {
    pub fn read(address: u16, width: usize) -> Self {
        Self {
            direction: Direction::Read,
            address,
            payload: vec![0; width],
        }
    }

    pub fn write(address: u16, data: &[u8]) -> Self {
        Self {
            direction: Direction::Write,
            address,
            payload: data.to_vec(),
        }
    }

    /// Opens a channel, selects the peer, moves exactly `width` bytes and
    /// closes the channel. Returns the payload: bytes received for a read,
    /// bytes sent for a write.
    ///
    /// A short transfer is an error and its bytes are discarded.
    pub fn run<P: I2cPort>(mut self, port: &P) -> Result<Vec<u8>, BusError> {
        let mut channel = port.open().map_err(|source| BusError::ChannelOpen {
            device: port.device().to_owned(),
            source,
        })?;

        channel
            .select(self.address)
            .map_err(|source| BusError::Addressing {
                address: self.address,
                source,
            })?;

        let direction = self.direction;
        let width = self.payload.len();
        let transfer = move |source: io::Error| BusError::Transfer {
            direction,
            width,
            source,
        };
        let moved = match self.direction {
            Direction::Read => channel.read(&mut self.payload),
            Direction::Write => channel.write(&self.payload),
        }
        .map_err(transfer)?;

        if moved != width {
            return Err(transfer(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("transferred {moved} of {width} bytes"),
            )));
        }

        channel.close().map_err(BusError::ChannelClose)?;

        Ok(self.payload)
    }
}
