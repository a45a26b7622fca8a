/// MIDI event records and the output seam the dispatcher writes through
use rtrb::Producer;

use crate::error::{Error, Port};

pub mod ports;

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const CONTROL_CHANGE: u8 = 0xB0;

pub const CLOCK_TICK: u8 = 0xF8;
pub const CLOCK_START: u8 = 0xFA;
pub const CLOCK_CONTINUE: u8 = 0xFB;
pub const CLOCK_STOP: u8 = 0xFC;

/// Largest message the core ever reads or writes.
pub const MAX_EVENT_LEN: usize = 3;

/// A fixed-size MIDI message. Longer messages are truncated to
/// [MAX_EVENT_LEN] bytes; the core never looks past the third byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MidiEvent {
    data: [u8; MAX_EVENT_LEN],
    len: u8,
}

impl MidiEvent {
    pub fn new(bytes: &[u8]) -> Self {
        let len = bytes.len().min(MAX_EVENT_LEN);
        let mut data = [0; MAX_EVENT_LEN];
        data[..len].copy_from_slice(&bytes[..len]);
        Self {
            data,
            len: len as u8,
        }
    }

    pub const fn message(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            data: [status, data1, data2],
            len: 3,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte at `index`, or 0 past the end.
    pub fn byte(&self, index: usize) -> u8 {
        self.bytes().get(index).copied().unwrap_or(0)
    }
}

/// The sink refused the event, usually because it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkFull;

/// Anything the dispatcher can write MIDI to. Implementations used on the
/// real-time path must not allocate or block.
pub trait MidiSink {
    fn write(&mut self, event: MidiEvent) -> Result<(), SinkFull>;
}

/// The pair of outputs a block writes to.
pub struct Outputs<'a> {
    pub instrument: &'a mut dyn MidiSink,
    pub surface: &'a mut dyn MidiSink,
}

impl<'a> Outputs<'a> {
    pub fn new(instrument: &'a mut dyn MidiSink, surface: &'a mut dyn MidiSink) -> Self {
        Self {
            instrument,
            surface,
        }
    }

    pub fn instrument(&mut self, event: MidiEvent) -> Result<(), Error> {
        self.instrument
            .write(event)
            .map_err(|_| Error::OutputWriteFailure(Port::Instrument))
    }

    pub fn surface(&mut self, event: MidiEvent) -> Result<(), Error> {
        self.surface
            .write(event)
            .map_err(|_| Error::OutputWriteFailure(Port::Surface))
    }
}

/// A sink with storage reserved up front. Writes past the capacity are
/// rejected instead of growing the buffer.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    events: Vec<MidiEvent>,
    capacity: usize,
}

impl EventBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn events(&self) -> &[MidiEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl MidiSink for EventBuffer {
    fn write(&mut self, event: MidiEvent) -> Result<(), SinkFull> {
        if self.events.len() >= self.capacity {
            return Err(SinkFull);
        }
        self.events.push(event);
        Ok(())
    }
}

/// Writes into the producer half of a ring drained by another thread.
pub struct RingSink {
    producer: Producer<MidiEvent>,
}

impl RingSink {
    pub fn new(producer: Producer<MidiEvent>) -> Self {
        Self { producer }
    }
}

impl MidiSink for RingSink {
    fn write(&mut self, event: MidiEvent) -> Result<(), SinkFull> {
        self.producer.push(event).map_err(|_| SinkFull)
    }
}
