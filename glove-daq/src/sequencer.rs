//! The per-cycle read protocol.
//!
//! The glove microcontroller exposes no registers, only a read cursor: a
//! single `0x00` write rewinds it to the first value and every successful
//! read consumes the value under it. A cycle is therefore a fixed walk:
//!
//! | State               | Transactions | Width |
//! |---------------------|--------------|-------|
//! | `CursorReset`       | 1 write      | 1     |
//! | `ReadFlex`          | 4 reads      | 4     |
//! | `ReadContacts`      | 13 reads     | 1     |
//! | `ReadSixAxisAccel`  | 6 reads      | 4     |
//! | `ReadSixAxisMag`    | 6 reads      | 4     |
//! | `ReadNineAxisAccel` | 6 reads      | 6     |
//! | `ReadNineAxisMag`   | 6 reads      | 6     |
//! | `ReadNineAxisGyro`  | 6 reads      | 6     |

use std::time::Duration;

use glove_core::stream::{AXIS_LEN, CONTACT_LEN, FLEX_LEN};
use glove_core::{CycleStatus, RawSample, SensorStreams};
use tracing::{debug, error};

use crate::bus::{BusError, I2cPort, Transaction};
use crate::delay::Delay;

/// Payload that rewinds the peer's read cursor.
pub const CURSOR_RESET: [u8; 1] = [0x00];
/// Bus address the glove firmware answers on.
pub const DEFAULT_ADDRESS: u16 = 0x04;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcquisitionState {
    CursorReset,
    ReadFlex,
    ReadContacts,
    ReadSixAxisAccel,
    ReadSixAxisMag,
    ReadNineAxisAccel,
    ReadNineAxisMag,
    ReadNineAxisGyro,
    Done,
}

impl AcquisitionState {
    pub const fn next(self) -> Self {
        match self {
            AcquisitionState::CursorReset => AcquisitionState::ReadFlex,
            AcquisitionState::ReadFlex => AcquisitionState::ReadContacts,
            AcquisitionState::ReadContacts => AcquisitionState::ReadSixAxisAccel,
            AcquisitionState::ReadSixAxisAccel => AcquisitionState::ReadSixAxisMag,
            AcquisitionState::ReadSixAxisMag => AcquisitionState::ReadNineAxisAccel,
            AcquisitionState::ReadNineAxisAccel => AcquisitionState::ReadNineAxisMag,
            AcquisitionState::ReadNineAxisMag => AcquisitionState::ReadNineAxisGyro,
            AcquisitionState::ReadNineAxisGyro | AcquisitionState::Done => AcquisitionState::Done,
        }
    }

    /// The reads this state performs. `None` for states that read nothing.
    pub const fn plan(self) -> Option<ReadPlan> {
        match self {
            AcquisitionState::CursorReset | AcquisitionState::Done => None,
            AcquisitionState::ReadFlex => Some(ReadPlan::new(FLEX_LEN, 4)),
            AcquisitionState::ReadContacts => Some(ReadPlan::new(CONTACT_LEN, 1)),
            AcquisitionState::ReadSixAxisAccel | AcquisitionState::ReadSixAxisMag => {
                Some(ReadPlan::new(AXIS_LEN, 4))
            }
            AcquisitionState::ReadNineAxisAccel
            | AcquisitionState::ReadNineAxisMag
            | AcquisitionState::ReadNineAxisGyro => Some(ReadPlan::new(AXIS_LEN, 6)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPlan {
    pub count: usize,
    pub width: usize,
}

impl ReadPlan {
    const fn new(count: usize, width: usize) -> Self {
        Self { count, width }
    }
}

/// Bus transactions issued by one fault-free cycle.
pub const fn transactions_per_cycle() -> usize {
    // the cursor reset
    let mut total = 1;
    let mut state = AcquisitionState::CursorReset.next();
    while !matches!(state, AcquisitionState::Done) {
        if let Some(plan) = state.plan() {
            total += plan.count;
        }
        state = state.next();
    }
    total
}

/// Settle times the firmware needs between transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// After the cursor reset, whether or not it succeeded.
    pub cursor_settle: Duration,
    /// After each successful read.
    pub read_settle: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            cursor_settle: Duration::from_micros(62_500),
            read_settle: Duration::from_micros(31_250),
        }
    }
}

/// Result of one pass through the state machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Acquisition {
    pub streams: SensorStreams,
    pub status: CycleStatus,
    /// States that hit a bus failure, in order.
    pub failed: Vec<AcquisitionState>,
}

pub struct Sequencer<P, D> {
    port: P,
    address: u16,
    timing: Timing,
    delay: D,
}

impl<P: I2cPort, D: Delay> Sequencer<P, D> {
    pub fn new(port: P, address: u16, timing: Timing, delay: D) -> Self {
        Self {
            port,
            address,
            timing,
            delay,
        }
    }

    /// Runs one cycle.
    ///
    /// A failed transaction marks the cycle disconnected and abandons the
    /// rest of its state; the stream for that state keeps its zero value and
    /// the walk continues with the next state. Nothing is retried.
    pub fn acquire(&mut self) -> Acquisition {
        let mut acquisition = Acquisition::default();
        let mut state = AcquisitionState::CursorReset;

        while state != AcquisitionState::Done {
            let outcome = match state.plan() {
                None => self.reset_cursor(),
                Some(plan) => self.read_all(plan).map(|samples| {
                    commit(state, &samples, &mut acquisition.streams);
                    debug!(state = ?state, samples = samples.len(), "State complete");
                }),
            };

            if let Err(e) = outcome {
                error!(state = ?state, error = ?e, "Bus transaction failed");
                acquisition.status.mark_disconnected();
                acquisition.failed.push(state);
            }

            state = state.next();
        }

        acquisition
    }

    fn reset_cursor(&mut self) -> Result<(), BusError> {
        let result = Transaction::write(self.address, &CURSOR_RESET).run(&self.port);
        self.delay.delay(self.timing.cursor_settle);
        result.map(drop)
    }

    fn read_all(&mut self, plan: ReadPlan) -> Result<Vec<Vec<u8>>, BusError> {
        let mut samples = Vec::with_capacity(plan.count);
        for _ in 0..plan.count {
            let payload = Transaction::read(self.address, plan.width).run(&self.port)?;
            self.delay.delay(self.timing.read_settle);
            samples.push(payload);
        }
        Ok(samples)
    }
}

fn commit(state: AcquisitionState, samples: &[Vec<u8>], streams: &mut SensorStreams) {
    let target = match state {
        AcquisitionState::ReadFlex => return fill(&mut streams.flex, samples, |s| s.count()),
        AcquisitionState::ReadContacts => {
            return fill(&mut streams.contacts, samples, |s| s.contact());
        }
        AcquisitionState::ReadSixAxisAccel => &mut streams.six_axis_accel,
        AcquisitionState::ReadSixAxisMag => &mut streams.six_axis_mag,
        AcquisitionState::ReadNineAxisAccel => &mut streams.nine_axis_accel,
        AcquisitionState::ReadNineAxisMag => &mut streams.nine_axis_mag,
        AcquisitionState::ReadNineAxisGyro => &mut streams.nine_axis_gyro,
        AcquisitionState::CursorReset | AcquisitionState::Done => return,
    };
    fill(target, samples, |s| s.axis());
}

fn fill<T>(target: &mut [T], samples: &[Vec<u8>], decode: impl Fn(RawSample<'_>) -> T) {
    for (slot, sample) in target.iter_mut().zip(samples) {
        *slot = decode(RawSample::new(sample));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Direction;
    use crate::bus::mock::{FaultKind, MockPeer};
    use crate::delay::RecordingDelay;

    fn sample_streams() -> SensorStreams {
        let mut streams = SensorStreams {
            flex: [100, 200, 300, 400],
            ..Default::default()
        };
        streams.contacts[0] = true;
        streams.contacts[8] = true;
        streams.contacts[12] = true;
        for (i, value) in streams.six_axis_accel.iter_mut().enumerate() {
            *value = i as f64 + 1.0;
        }
        for (i, value) in streams.nine_axis_gyro.iter_mut().enumerate() {
            *value = -(i as f64) * 1000.0;
        }
        streams
    }

    fn sequencer(peer: &MockPeer) -> Sequencer<MockPeer, RecordingDelay> {
        Sequencer::new(
            peer.clone(),
            DEFAULT_ADDRESS,
            Timing::default(),
            RecordingDelay::default(),
        )
    }

    #[test]
    fn states_run_in_protocol_order() {
        let mut state = AcquisitionState::CursorReset;
        let mut visited = vec![state];
        while state != AcquisitionState::Done {
            state = state.next();
            visited.push(state);
        }
        assert_eq!(visited.len(), 9);
        assert_eq!(AcquisitionState::Done.next(), AcquisitionState::Done);
        assert_eq!(transactions_per_cycle(), 48);
    }

    #[test]
    fn issues_reads_in_order_and_width() {
        let peer = MockPeer::from_streams(DEFAULT_ADDRESS, &sample_streams());

        sequencer(&peer).acquire();

        let journal = peer.journal();
        assert_eq!(journal.len(), transactions_per_cycle());
        assert_eq!(journal[0].direction, Some(Direction::Write));
        assert_eq!(journal[0].width, 1);

        let widths: Vec<usize> = journal[1..].iter().map(|entry| entry.width).collect();
        let mut expected = vec![4; 4];
        expected.extend([1; 13]);
        expected.extend([4; 12]);
        expected.extend([6; 18]);
        assert_eq!(widths, expected);
        assert!(journal[1..].iter().all(|e| e.direction == Some(Direction::Read)));
        assert!(journal.iter().all(|e| e.closed && e.address == Some(DEFAULT_ADDRESS)));
    }

    #[test]
    fn decodes_every_stream() {
        let streams = sample_streams();
        let peer = MockPeer::from_streams(DEFAULT_ADDRESS, &streams);

        let acquisition = sequencer(&peer).acquire();

        assert_eq!(acquisition.streams, streams);
        assert!(acquisition.status.connected);
        assert!(acquisition.failed.is_empty());
    }

    #[test]
    fn honors_settle_times() {
        let peer = MockPeer::from_streams(DEFAULT_ADDRESS, &sample_streams());
        let mut sequencer = sequencer(&peer);

        sequencer.acquire();

        let timing = Timing::default();
        let delays = &sequencer.delay.0;
        assert_eq!(delays.len(), 48);
        assert_eq!(delays[0], timing.cursor_settle);
        assert!(delays[1..].iter().all(|d| *d == timing.read_settle));
    }

    #[test]
    fn contact_failure_leaves_contacts_zeroed_and_continues() {
        let streams = sample_streams();
        let peer = MockPeer::from_streams(DEFAULT_ADDRESS, &streams);
        // reset + 4 flex + 5 good contact reads, then the sixth contact read
        peer.fail_at(10, FaultKind::ShortTransfer);
        let mut sequencer = sequencer(&peer);

        let acquisition = sequencer.acquire();

        assert_eq!(acquisition.status, CycleStatus::disconnected());
        assert_eq!(acquisition.failed, [AcquisitionState::ReadContacts]);
        assert_eq!(acquisition.streams.flex, streams.flex);
        assert!(acquisition.streams.contacts.iter().all(|c| !c));
        // inertial reads were still attempted
        assert_eq!(peer.journal().len(), 48 - 7);
        // no settle after the failed read
        assert_eq!(sequencer.delay.0.len(), 48 - 8);
    }

    #[test]
    fn failed_cursor_reset_still_settles() {
        let peer = MockPeer::from_streams(DEFAULT_ADDRESS, &sample_streams());
        peer.fail_at(0, FaultKind::Address);
        let mut sequencer = sequencer(&peer);

        let acquisition = sequencer.acquire();

        assert_eq!(acquisition.failed, [AcquisitionState::CursorReset]);
        assert!(!acquisition.status.connected);
        assert_eq!(sequencer.delay.0[0], Timing::default().cursor_settle);
        assert_eq!(acquisition.streams.flex, [100, 200, 300, 400]);
    }

    #[test]
    fn every_state_can_fail_independently() {
        let peer = MockPeer::from_streams(DEFAULT_ADDRESS, &sample_streams());
        // first flex read, then the first 9-axis gyro read: reset, one flex
        // attempt, 13 contacts and 4 x 6 axis reads come before it
        peer.fail_at(1, FaultKind::Open);
        peer.fail_at(2 + 13 + 24, FaultKind::Close);

        let acquisition = sequencer(&peer).acquire();

        assert_eq!(
            acquisition.failed,
            [AcquisitionState::ReadFlex, AcquisitionState::ReadNineAxisGyro]
        );
        assert_eq!(acquisition.streams.flex, [0; 4]);
        assert_eq!(acquisition.streams.nine_axis_gyro, [0.0; 6]);
    }
}
