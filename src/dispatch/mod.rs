/// Event dispatcher - the per-block entry point
///
/// Each block is handled in a fixed order regardless of arrival time:
/// surface events first, then instrument input through the deferred
/// queue, then clock events. Clock-driven playback therefore sees any
/// edits the user made earlier in the same block.
use crate::config::SequencerConfig;
use crate::error::{Error, Result, Stream};
use crate::midi::{
    MidiEvent, MidiSink, Outputs, SinkFull, CLOCK_CONTINUE, CLOCK_START, CLOCK_STOP,
    CLOCK_TICK,
};
use crate::queue::DeferredQueue;
use crate::sequencer::{playback, SequencerState};
use crate::surface::render;

pub mod buttons;

pub use buttons::ButtonEvent;

pub const MIN_CLOCK_LEN: usize = 1;
pub const MIN_SURFACE_LEN: usize = 3;

/// The input events that arrived during one processing block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Block<'a> {
    pub clock: &'a [MidiEvent],
    pub surface: &'a [MidiEvent],
    pub instrument: &'a [MidiEvent],
}

/// What happened during a block that completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockReport {
    pub surface_events: usize,
    pub clock_events: usize,
    pub steps_played: usize,
    /// Instrument events drained from the deferred queue.
    pub deferred: usize,
    /// Instrument events lost to a full deferred queue.
    pub dropped: usize,
}

pub struct Dispatcher {
    config: SequencerConfig,
    deferred: DeferredQueue,
}

impl Dispatcher {
    pub fn new(config: SequencerConfig) -> Self {
        let config = config.sanitized();
        Self {
            deferred: DeferredQueue::new(config.queue_capacity),
            config,
        }
    }

    /// Resets the surface and draws the current state on it.
    pub fn initialize(
        &self,
        state: &SequencerState,
        surface: &mut dyn MidiSink,
    ) -> Result<()> {
        let mut instrument = NullSink;
        let mut out = Outputs::new(&mut instrument, surface);
        for command in render::startup(state) {
            out.surface(command.to_event())?;
        }
        Ok(())
    }

    /// Handles one block. On error the rest of the block is skipped; state
    /// changed by earlier events in the block is kept.
    pub fn process(
        &mut self,
        state: &mut SequencerState,
        block: &Block,
        out: &mut Outputs,
    ) -> Result<BlockReport> {
        let mut report = BlockReport::default();

        for event in block.surface {
            self.handle_surface(state, event, out)?;
            report.surface_events += 1;
        }

        for event in block.instrument {
            if let Err(Error::QueueOverflow) = self.deferred.push(*event) {
                report.dropped += 1;
            }
        }
        report.deferred = self.deferred.drain(handle_instrument);

        for event in block.clock {
            if self.handle_clock(state, event, out)? {
                report.steps_played += 1;
            }
            report.clock_events += 1;
        }

        Ok(report)
    }

    fn handle_surface(
        &self,
        state: &mut SequencerState,
        event: &MidiEvent,
        out: &mut Outputs,
    ) -> Result<()> {
        if event.len() < MIN_SURFACE_LEN {
            return Err(Error::MalformedEvent {
                stream: Stream::Surface,
                expected: MIN_SURFACE_LEN,
                actual: event.len(),
            });
        }
        buttons::handle(state, &self.config, ButtonEvent::from_event(event), out)
    }

    /// Returns whether a step was played.
    fn handle_clock(
        &self,
        state: &mut SequencerState,
        event: &MidiEvent,
        out: &mut Outputs,
    ) -> Result<bool> {
        if event.len() < MIN_CLOCK_LEN {
            return Err(Error::MalformedEvent {
                stream: Stream::Clock,
                expected: MIN_CLOCK_LEN,
                actual: event.len(),
            });
        }
        match event.byte(0) {
            CLOCK_TICK => playback::tick(state, &self.config, out),
            // No song position support: continue restarts from step 0.
            CLOCK_START | CLOCK_CONTINUE => {
                playback::start(state, &self.config, out)?;
                Ok(true)
            }
            // Stop leaves the transport where it is.
            CLOCK_STOP => Ok(false),
            _ => Ok(false),
        }
    }
}

/// Instrument input is captured but not interpreted yet.
fn handle_instrument(_event: MidiEvent) {}

struct NullSink;

impl MidiSink for NullSink {
    fn write(&mut self, _event: MidiEvent) -> std::result::Result<(), SinkFull> {
        Ok(())
    }
}
