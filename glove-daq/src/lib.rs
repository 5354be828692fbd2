pub mod bus;
pub mod config;
pub mod delay;
pub mod driver;
pub mod output;
pub mod reset;
pub mod sequencer;

pub use bus::linux::LinuxI2cPort;
pub use bus::mock::{FaultKind, JournalEntry, MockPeer};
pub use bus::{BusError, Direction, I2cChannel, I2cPort, Transaction};
pub use config::{BusConfig, BusDevice, Config, GloveConfig, OutputConfig, ResetConfig, TimingConfig};
pub use delay::{Delay, ThreadDelay};
pub use driver::{CycleDriver, RunSummary};
pub use output::{GestureSink, MemorySink, OutputWriteError, XmlFileSink, XmlStreamSink};
pub use reset::{ResetPulse, ResetPulseError};
pub use sequencer::{
    Acquisition, AcquisitionState, CURSOR_RESET, DEFAULT_ADDRESS, ReadPlan, Sequencer, Timing,
    transactions_per_cycle,
};
