use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glove_core::SensorStreams;
use rand::Rng;

use super::{Direction, I2cChannel, I2cPort};
use crate::sequencer::CURSOR_RESET;

/// Failure to inject into one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Open,
    Address,
    ShortTransfer,
    Close,
}

/// What the peer saw of one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Zero-based count of channel opens since the peer was created.
    pub ordinal: u64,
    pub address: Option<u16>,
    pub direction: Option<Direction>,
    pub width: usize,
    pub closed: bool,
}

/// In-process stand-in for the glove microcontroller.
///
/// Serves a frame of ASCII samples through an internal cursor, one sample
/// per read, NUL-padded to the read width. A single `0x00` write rewinds the
/// cursor. Reads past the end of the frame return `"0"`. Clones share the
/// same peer state.
#[derive(Clone)]
pub struct MockPeer {
    state: Arc<Mutex<PeerState>>,
}

struct PeerState {
    address: u16,
    frame: Vec<Vec<u8>>,
    randomize: bool,
    cursor: usize,
    opened: u64,
    faults: Vec<(u64, FaultKind)>,
    journal: Vec<JournalEntry>,
}

impl PeerState {
    fn has_fault(&self, ordinal: u64, kind: FaultKind) -> bool {
        self.faults.contains(&(ordinal, kind))
    }
}

impl MockPeer {
    pub fn new(address: u16, frame: Vec<Vec<u8>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PeerState {
                address,
                frame,
                randomize: false,
                cursor: 0,
                opened: 0,
                faults: Vec::new(),
                journal: Vec::new(),
            })),
        }
    }

    /// A peer whose frame encodes `streams` the way the firmware would.
    pub fn from_streams(address: u16, streams: &SensorStreams) -> Self {
        Self::new(address, encode_frame(streams))
    }

    /// A peer that draws a fresh random frame on every cursor reset.
    pub fn randomized(address: u16) -> Self {
        let peer = Self::new(address, encode_frame(&random_streams()));
        peer.state().randomize = true;
        peer
    }

    /// Fail the transaction with the given ordinal.
    pub fn fail_at(&self, ordinal: u64, kind: FaultKind) {
        self.state().faults.push((ordinal, kind));
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.state().journal.clone()
    }

    pub fn cursor(&self) -> usize {
        self.state().cursor
    }

    fn state(&self) -> MutexGuard<'_, PeerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl I2cPort for MockPeer {
    type Channel = MockChannel;

    fn device(&self) -> &str {
        "mock"
    }

    fn open(&self) -> io::Result<Self::Channel> {
        let mut state = self.state();
        let ordinal = state.opened;
        state.opened += 1;
        state.journal.push(JournalEntry {
            ordinal,
            address: None,
            direction: None,
            width: 0,
            closed: false,
        });

        if state.has_fault(ordinal, FaultKind::Open) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "mock bus unavailable",
            ));
        }

        Ok(MockChannel {
            state: Arc::clone(&self.state),
            ordinal,
            entry: state.journal.len() - 1,
            selected: false,
        })
    }
}

pub struct MockChannel {
    state: Arc<Mutex<PeerState>>,
    ordinal: u64,
    entry: usize,
    selected: bool,
}

impl MockChannel {
    fn state(&self) -> MutexGuard<'_, PeerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_transfer(&self, direction: Direction, width: usize) -> io::Result<bool> {
        if !self.selected {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "no peer selected",
            ));
        }
        let mut state = self.state();
        let entry = &mut state.journal[self.entry];
        entry.direction = Some(direction);
        entry.width = width;
        Ok(state.has_fault(self.ordinal, FaultKind::ShortTransfer))
    }
}

impl I2cChannel for MockChannel {
    fn select(&mut self, address: u16) -> io::Result<()> {
        let mut state = self.state();
        state.journal[self.entry].address = Some(address);

        if address != state.address || state.has_fault(self.ordinal, FaultKind::Address) {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("no acknowledge from {address:#04x}"),
            ));
        }

        drop(state);
        self.selected = true;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.begin_transfer(Direction::Read, buf.len())? {
            return Ok(buf.len().saturating_sub(1));
        }

        let mut state = self.state();
        let sample = state
            .frame
            .get(state.cursor)
            .map(Vec::as_slice)
            .unwrap_or(b"0".as_slice());
        let n = sample.len().min(buf.len());
        buf.fill(0);
        buf[..n].copy_from_slice(&sample[..n]);
        state.cursor += 1;

        Ok(buf.len())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.begin_transfer(Direction::Write, data.len())? {
            return Ok(data.len().saturating_sub(1));
        }

        let mut state = self.state();
        if data == CURSOR_RESET {
            state.cursor = 0;
            if state.randomize {
                state.frame = encode_frame(&random_streams());
            }
        }

        Ok(data.len())
    }

    fn close(self) -> io::Result<()> {
        let mut state = self.state();
        if state.has_fault(self.ordinal, FaultKind::Close) {
            return Err(io::Error::other("mock close failed"));
        }
        state.journal[self.entry].closed = true;
        Ok(())
    }
}

/// Lays `streams` out in the firmware's transmit order.
pub fn encode_frame(streams: &SensorStreams) -> Vec<Vec<u8>> {
    let mut frame = Vec::new();
    frame.extend(streams.flex.iter().map(|v| v.to_string().into_bytes()));
    frame.extend(
        streams
            .contacts
            .iter()
            .map(|&contact| if contact { b"0".to_vec() } else { b"1".to_vec() }),
    );
    for stream in [
        &streams.six_axis_accel,
        &streams.six_axis_mag,
        &streams.nine_axis_accel,
        &streams.nine_axis_mag,
        &streams.nine_axis_gyro,
    ] {
        frame.extend(stream.iter().map(|v| (*v as i64).to_string().into_bytes()));
    }
    frame
}

fn random_streams() -> SensorStreams {
    let mut rng = rand::rng();
    let mut streams = SensorStreams {
        flex: std::array::from_fn(|_| rng.random_range(0..=1023)),
        contacts: std::array::from_fn(|_| rng.random_bool(0.25)),
        ..Default::default()
    };
    for stream in [&mut streams.six_axis_accel, &mut streams.six_axis_mag] {
        *stream = std::array::from_fn(|_| f64::from(rng.random_range(-999..=999_i32)));
    }
    for stream in [
        &mut streams.nine_axis_accel,
        &mut streams.nine_axis_mag,
        &mut streams.nine_axis_gyro,
    ] {
        *stream = std::array::from_fn(|_| f64::from(rng.random_range(-99_999..=99_999_i32)));
    }
    streams
}
