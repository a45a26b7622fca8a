/// Host glue - MIDI ports, ring buffers and the block engine
///
/// midir delivers each input on its own thread. Every input callback
/// pushes into its own ring; the audio callback pops whatever arrived and
/// runs one dispatcher block over it. Output goes the other way through
/// rings drained by forwarder threads that own the midir connections.
/// Nothing on those real-time paths logs: failures are counted in
/// [HostStats] and reported by a monitor thread.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Result};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::audio::{BlockClock, BlockProcessor};
use crate::config::{PortConfig, SequencerConfig};
use crate::dispatch::{Block, Dispatcher};
use crate::error::{Error, Stream};
use crate::midi::ports::{find_input_port, find_output_port};
use crate::midi::{MidiEvent, Outputs, RingSink};
use crate::sequencer::SequencerState;

pub mod stats;

pub use stats::{HostStats, StatsSnapshot};

/// Most events taken from one input in a single block. Anything beyond
/// waits for the next block.
pub const MAX_BLOCK_EVENTS: usize = 256;
pub const INPUT_CAPACITY: usize = 1024;
pub const OUTPUT_CAPACITY: usize = 4096;
/// Block errors kept for the monitor between polls. Later ones are only
/// counted.
pub const FAULT_CAPACITY: usize = 64;

const FORWARD_INTERVAL: Duration = Duration::from_millis(1);
const MONITOR_INTERVAL: Duration = Duration::from_millis(250);

/// Consumer ends of the three input rings.
pub struct Inputs {
    pub clock: Consumer<MidiEvent>,
    pub surface: Consumer<MidiEvent>,
    pub instrument: Consumer<MidiEvent>,
}

/// Runs the dispatcher once per audio block.
pub struct Engine {
    dispatcher: Dispatcher,
    state: SequencerState,
    inputs: Inputs,
    instrument_out: RingSink,
    surface_out: RingSink,
    stats: Arc<HostStats>,
    faults: Producer<Error>,
}

impl Engine {
    /// Builds the engine and queues the startup redraw on the surface.
    pub fn new(
        config: SequencerConfig,
        inputs: Inputs,
        instrument_out: Producer<MidiEvent>,
        surface_out: Producer<MidiEvent>,
        stats: Arc<HostStats>,
        faults: Producer<Error>,
    ) -> Result<Self> {
        let dispatcher = Dispatcher::new(config);
        let state = SequencerState::new();
        let mut surface_out = RingSink::new(surface_out);
        dispatcher
            .initialize(&state, &mut surface_out)
            .map_err(|err| anyhow!("failed to initialize surface: {}", err))?;

        Ok(Self {
            dispatcher,
            state,
            inputs,
            instrument_out: RingSink::new(instrument_out),
            surface_out,
            stats,
            faults,
        })
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn run_block(&mut self) {
        let mut clock = [MidiEvent::default(); MAX_BLOCK_EVENTS];
        let mut surface = [MidiEvent::default(); MAX_BLOCK_EVENTS];
        let mut instrument = [MidiEvent::default(); MAX_BLOCK_EVENTS];

        let block = Block {
            clock: take(&mut self.inputs.clock, &mut clock),
            surface: take(&mut self.inputs.surface, &mut surface),
            instrument: take(&mut self.inputs.instrument, &mut instrument),
        };
        let mut out = Outputs::new(&mut self.instrument_out, &mut self.surface_out);

        match self.dispatcher.process(&mut self.state, &block, &mut out) {
            Ok(report) => {
                if report.dropped > 0 {
                    self.stats.record_dropped(report.dropped as u64);
                }
            }
            Err(err) => {
                self.stats.record_failure();
                // A full fault ring still leaves the failure counted.
                let _ = self.faults.push(err);
            }
        }
    }
}

impl BlockProcessor for Engine {
    fn process_block(&mut self, _frames: usize) {
        self.run_block();
    }
}

/// Pops up to `buffer.len()` events and returns the filled prefix.
fn take<'a>(
    consumer: &mut Consumer<MidiEvent>,
    buffer: &'a mut [MidiEvent],
) -> &'a [MidiEvent] {
    let mut count = 0;
    while count < buffer.len() {
        match consumer.pop() {
            Ok(event) => {
                buffer[count] = event;
                count += 1;
            }
            Err(_) => break,
        }
    }
    &buffer[..count]
}

/// Copies one incoming message into its ring, counting it when the ring
/// is full.
fn capture(
    producer: &mut Producer<MidiEvent>,
    message: &[u8],
    stats: &HostStats,
    stream: Stream,
) {
    if producer.push(MidiEvent::new(message)).is_err() {
        stats.record_overrun(stream);
    }
}

/// Logs queued block errors and whatever the counters gained since `last`.
/// Returns that gain.
fn report(
    stats: &HostStats,
    last: &mut StatsSnapshot,
    faults: &mut Consumer<Error>,
) -> StatsSnapshot {
    while let Ok(err) = faults.pop() {
        log::warn!("block failed: {}", err);
    }

    let now = stats.snapshot();
    let gained = now.since(last);
    *last = now;

    for stream in [Stream::Clock, Stream::Surface, Stream::Instrument] {
        let lost = gained.overruns(stream);
        if lost > 0 {
            log::warn!("{} input ring full, lost {} event(s)", stream, lost);
        }
    }
    if gained.queue_dropped > 0 {
        log::warn!("dropped {} instrument event(s)", gained.queue_dropped);
    }
    if gained.failed_blocks > 0 {
        log::warn!("{} block(s) failed", gained.failed_blocks);
    }
    gained
}

/// Calls `poll` on its own thread until dropped, then once more so nothing
/// queued at shutdown is lost.
struct Worker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn<F>(interval: Duration, mut poll: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let is_running = Arc::clone(&running);

        let handle = thread::spawn(move || {
            while is_running.load(Ordering::Relaxed) {
                poll();
                thread::sleep(interval);
            }
            poll();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Drains a ring into a midir output connection.
    fn forwarder(
        label: &'static str,
        mut consumer: Consumer<MidiEvent>,
        mut connection: MidiOutputConnection,
    ) -> Self {
        Self::spawn(FORWARD_INTERVAL, move || {
            while let Ok(event) = consumer.pop() {
                log::trace!("{} <- {:02X?}", label, event.bytes());
                if let Err(err) = connection.send(event.bytes()) {
                    log::warn!("failed to send to {}: {}", label, err);
                }
            }
        })
    }

    fn monitor(stats: Arc<HostStats>, mut faults: Consumer<Error>) -> Self {
        let mut last = StatsSnapshot::default();
        Self::spawn(MONITOR_INTERVAL, move || {
            report(&stats, &mut last, &mut faults);
        })
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Everything that must stay alive while the sequencer runs. Dropping it
/// stops the block clock first, then the inputs, then the forwarders and
/// the monitor.
pub struct Host {
    _block_clock: BlockClock,
    _inputs: Vec<MidiInputConnection<Producer<MidiEvent>>>,
    _workers: Vec<Worker>,
    stats: Arc<HostStats>,
}

impl Host {
    /// Finds and connects every port, then starts the block clock.
    pub fn start(ports: &PortConfig, config: SequencerConfig) -> Result<Self> {
        let stats = Arc::new(HostStats::new());
        let (clock_in, clock) = connect_input(ports, Stream::Clock, &ports.clock, &stats)?;
        let (surface_in, surface) =
            connect_input(ports, Stream::Surface, &ports.surface, &stats)?;
        let (instrument_in, instrument) =
            connect_input(ports, Stream::Instrument, &ports.instrument, &stats)?;

        let (surface_tx, surface_rx) = RingBuffer::new(OUTPUT_CAPACITY);
        let (instrument_tx, instrument_rx) = RingBuffer::new(OUTPUT_CAPACITY);
        let (faults_tx, faults_rx) = RingBuffer::new(FAULT_CAPACITY);
        let workers = vec![
            Worker::forwarder(
                "surface",
                surface_rx,
                connect_output(ports, "surface out", &ports.surface)?,
            ),
            Worker::forwarder(
                "instrument",
                instrument_rx,
                connect_output(ports, "instrument out", &ports.instrument)?,
            ),
            Worker::monitor(Arc::clone(&stats), faults_rx),
        ];

        let inputs = Inputs {
            clock,
            surface,
            instrument,
        };
        let engine = Engine::new(
            config,
            inputs,
            instrument_tx,
            surface_tx,
            Arc::clone(&stats),
            faults_tx,
        )?;
        let block_clock = BlockClock::start(engine)?;

        Ok(Self {
            _block_clock: block_clock,
            _inputs: vec![clock_in, surface_in, instrument_in],
            _workers: workers,
            stats,
        })
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

fn connect_input(
    ports: &PortConfig,
    stream: Stream,
    needle: &str,
    stats: &Arc<HostStats>,
) -> Result<(MidiInputConnection<Producer<MidiEvent>>, Consumer<MidiEvent>)> {
    let label = format!("{} in", stream);
    let mut midi_in = MidiInput::new(&ports.client_name)
        .map_err(|err| anyhow!("failed to create MIDI input: {}", err))?;
    // Clock bytes are filtered out unless every ignore flag is cleared.
    midi_in.ignore(Ignore::None);

    let (port, name) = find_input_port(&midi_in, needle)?;
    let (producer, consumer) = RingBuffer::new(INPUT_CAPACITY);
    let stats = Arc::clone(stats);
    let connection = midi_in
        .connect(
            &port,
            &label,
            move |_stamp, message, producer: &mut Producer<MidiEvent>| {
                capture(producer, message, &stats, stream);
            },
            producer,
        )
        .map_err(|err| anyhow!("failed to connect {} to {}: {}", label, name, err))?;

    log::info!("{} connected to {}", label, name);
    Ok((connection, consumer))
}

fn connect_output(ports: &PortConfig, label: &str, needle: &str) -> Result<MidiOutputConnection> {
    let midi_out = MidiOutput::new(&ports.client_name)
        .map_err(|err| anyhow!("failed to create MIDI output: {}", err))?;
    let (port, name) = find_output_port(&midi_out, needle)?;
    let connection = midi_out
        .connect(&port, label)
        .map_err(|err| anyhow!("failed to connect {} to {}: {}", label, name, err))?;

    log::info!("{} connected to {}", label, name);
    Ok(connection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{CLOCK_START, CLOCK_TICK, CONTROL_CHANGE, NOTE_ON};
    use crate::sequencer::{STEPS, TRACKS};
    use crate::surface::cell_for_step;

    struct Rig {
        engine: Engine,
        stats: Arc<HostStats>,
        faults: Consumer<Error>,
        clock: Producer<MidiEvent>,
        surface: Producer<MidiEvent>,
        instrument: Producer<MidiEvent>,
        instrument_out: Consumer<MidiEvent>,
        surface_out: Consumer<MidiEvent>,
    }

    fn rig() -> Rig {
        let (clock, clock_rx) = RingBuffer::new(INPUT_CAPACITY);
        let (surface, surface_rx) = RingBuffer::new(INPUT_CAPACITY);
        let (instrument, instrument_rx) = RingBuffer::new(INPUT_CAPACITY);
        let (instrument_tx, instrument_out) = RingBuffer::new(OUTPUT_CAPACITY);
        let (surface_tx, surface_out) = RingBuffer::new(OUTPUT_CAPACITY);
        let inputs = Inputs {
            clock: clock_rx,
            surface: surface_rx,
            instrument: instrument_rx,
        };
        let stats = Arc::new(HostStats::new());
        let (faults_tx, faults) = RingBuffer::new(FAULT_CAPACITY);
        let engine = Engine::new(
            SequencerConfig::default(),
            inputs,
            instrument_tx,
            surface_tx,
            Arc::clone(&stats),
            faults_tx,
        )
        .unwrap();
        Rig {
            engine,
            stats,
            faults,
            clock,
            surface,
            instrument,
            instrument_out,
            surface_out,
        }
    }

    fn drain(consumer: &mut Consumer<MidiEvent>) -> Vec<MidiEvent> {
        let mut events = Vec::new();
        while let Ok(event) = consumer.pop() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_engine_writes_startup_redraw() {
        let mut rig = rig();
        let events = drain(&mut rig.surface_out);
        assert_eq!(events.len(), 1 + TRACKS + STEPS + 1);
        assert_eq!(events[0], MidiEvent::message(0xB0, 0, 0));
    }

    #[test]
    fn test_engine_runs_block_from_rings() {
        let mut rig = rig();
        drain(&mut rig.surface_out);

        rig.surface
            .push(MidiEvent::message(NOTE_ON, cell_for_step(0), 127))
            .unwrap();
        rig.clock.push(MidiEvent::new(&[CLOCK_START])).unwrap();
        rig.instrument
            .push(MidiEvent::message(CONTROL_CHANGE, 1, 64))
            .unwrap();
        rig.engine.run_block();

        assert!(rig.engine.state().grid.is_armed(0, 0));
        assert_eq!(rig.engine.state().transport.current_step(), 1);
        assert_eq!(
            drain(&mut rig.instrument_out),
            vec![MidiEvent::message(0x90, 60, 127)]
        );
        assert!(!drain(&mut rig.surface_out).is_empty());
        assert_eq!(rig.stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_engine_leaves_excess_events_for_next_block() {
        let mut rig = rig();
        for _ in 0..MAX_BLOCK_EVENTS + 6 {
            rig.clock.push(MidiEvent::new(&[CLOCK_TICK])).unwrap();
        }
        rig.engine.run_block();
        assert_eq!(
            rig.engine.state().transport.tick_counter(),
            MAX_BLOCK_EVENTS as u64
        );
        rig.engine.run_block();
        assert_eq!(
            rig.engine.state().transport.tick_counter(),
            MAX_BLOCK_EVENTS as u64 + 6
        );
    }

    #[test]
    fn test_engine_counts_failed_blocks() {
        let mut rig = rig();
        rig.surface.push(MidiEvent::new(&[NOTE_ON, 0])).unwrap();
        rig.engine.run_block();
        assert_eq!(rig.stats.snapshot().failed_blocks, 1);
        assert_eq!(
            rig.faults.pop(),
            Ok(Error::MalformedEvent {
                stream: Stream::Surface,
                expected: 3,
                actual: 2,
            })
        );

        // The next block runs normally.
        rig.clock.push(MidiEvent::new(&[CLOCK_START])).unwrap();
        rig.engine.run_block();
        assert_eq!(rig.stats.snapshot().failed_blocks, 1);
        assert!(rig.faults.is_empty());
        assert_eq!(rig.engine.state().transport.current_step(), 1);
    }

    #[test]
    fn test_full_input_ring_counts_lost_ticks() {
        let stats = HostStats::new();
        let (mut producer, mut consumer) = RingBuffer::new(4);
        for _ in 0..6 {
            capture(&mut producer, &[CLOCK_TICK], &stats, Stream::Clock);
        }
        assert_eq!(drain(&mut consumer).len(), 4);
        assert_eq!(stats.snapshot().overruns(Stream::Clock), 2);
        assert_eq!(stats.snapshot().overruns(Stream::Surface), 0);

        // Space frees up once the engine has drained the ring.
        capture(&mut producer, &[CLOCK_TICK], &stats, Stream::Clock);
        assert_eq!(drain(&mut consumer), vec![MidiEvent::new(&[CLOCK_TICK])]);
        assert_eq!(stats.snapshot().overruns(Stream::Clock), 2);
    }

    #[test]
    fn test_engine_counts_deferred_queue_drops() {
        let mut rig = rig();
        let capacity = SequencerConfig::default().queue_capacity;
        for _ in 0..capacity + 3 {
            rig.instrument
                .push(MidiEvent::message(CONTROL_CHANGE, 1, 64))
                .unwrap();
        }
        rig.engine.run_block();
        assert_eq!(rig.stats.snapshot().queue_dropped, 3);
        assert_eq!(rig.stats.snapshot().failed_blocks, 0);
    }

    #[test]
    fn test_report_drains_faults_and_returns_gain() {
        let stats = HostStats::new();
        let (mut faults_tx, mut faults) = RingBuffer::new(FAULT_CAPACITY);
        let mut last = StatsSnapshot::default();

        stats.record_overrun(Stream::Clock);
        stats.record_failure();
        faults_tx.push(Error::QueueOverflow).unwrap();
        let gained = report(&stats, &mut last, &mut faults);
        assert_eq!(gained.clock_overruns, 1);
        assert_eq!(gained.failed_blocks, 1);
        assert!(faults.is_empty());

        // Nothing new since the last report.
        assert_eq!(
            report(&stats, &mut last, &mut faults),
            StatsSnapshot::default()
        );
    }
}
