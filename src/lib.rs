/// GRIDSEQ - A clock-driven step sequencer for an 8x8 pad controller
///
/// This library provides the core components of the sequencer:
/// - Grid codec and LED rendering for the controller surface
/// - Trigger grid, transport and mode state
/// - A per-block event dispatcher that never allocates or blocks
/// - Host glue that drives the dispatcher from MIDI ports and an audio clock

pub mod audio;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod midi;
pub mod queue;
pub mod sequencer;
pub mod surface;

// Re-export commonly used types
pub use config::{LiveChannel, LiveRelease, PortConfig, SequencerConfig};
pub use dispatch::{Block, BlockReport, Dispatcher};
pub use error::{Error, Result};
pub use host::Host;
pub use midi::{EventBuffer, MidiEvent, MidiSink, Outputs};
pub use queue::DeferredQueue;
pub use sequencer::{Mode, SequencerState, TriggerGrid};
pub use surface::LedCommand;
