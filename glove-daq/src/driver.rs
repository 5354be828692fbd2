use glove_core::{
    FlexNormalizer, Gesture, HAND_COUNT, SensorStreams, Side, assemble_hands,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn};

use crate::bus::I2cPort;
use crate::delay::Delay;
use crate::output::GestureSink;
use crate::sequencer::Sequencer;

/// Totals reported when the driver stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub cycles: u64,
    /// Cycles that saw at least one bus failure.
    pub disconnected: u64,
    /// Cycles whose gesture could not be written.
    pub output_failures: u64,
}

/// Acquire, assemble, normalize, emit. Repeat until told to stop.
pub struct CycleDriver<P, D, S> {
    sequencer: Sequencer<P, D>,
    side: Side,
    normalizer: FlexNormalizer,
    sink: S,
}

impl<P, D, S> CycleDriver<P, D, S>
where
    P: I2cPort,
    D: Delay,
    S: GestureSink,
{
    /// `side` is the hand the bus is wired to; the other hand is emitted
    /// zeroed.
    pub fn new(
        sequencer: Sequencer<P, D>,
        side: Side,
        normalizer: FlexNormalizer,
        sink: S,
    ) -> Self {
        Self {
            sequencer,
            side,
            normalizer,
            sink,
        }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// One full cycle, starting from zeroed records.
    pub fn run_cycle(&mut self) -> Gesture {
        let acquisition = self.sequencer.acquire();

        let mut streams = [SensorStreams::default(); HAND_COUNT];
        streams[self.side.index()] = acquisition.streams;
        let hands = assemble_hands(&streams);
        debug!(side = %self.side, hand = %hands[self.side.index()], "Hand assembled");

        Gesture::new(hands, acquisition.status, &self.normalizer)
    }

    /// Runs cycles until `cancel` fires or `limit` cycles have been emitted.
    ///
    /// Cancellation is observed between cycles only: a cycle that has begun
    /// is always acquired and emitted.
    pub fn run(&mut self, cancel: &CancellationToken, limit: Option<u64>) -> RunSummary {
        let mut summary = RunSummary::default();

        while limit.is_none_or(|limit| summary.cycles < limit) {
            let cycle = summary.cycles + 1;
            let span = info_span!("cycle", cycle);
            let _enter = span.enter();

            let gesture = self.run_cycle();
            if !gesture.status.connected {
                summary.disconnected += 1;
                warn!("Cycle completed without the glove connected");
            }

            if let Err(e) = self.sink.emit(&gesture) {
                error!(error = ?e, "Failed to write gesture");
                summary.output_failures += 1;
            }
            summary.cycles = cycle;

            if cancel.is_cancelled() {
                info!("Interrupt received, stopping after this cycle");
                break;
            }
        }

        info!(
            cycles = summary.cycles,
            disconnected = summary.disconnected,
            output_failures = summary.output_failures,
            "Acquisition stopped"
        );
        summary
    }
}
