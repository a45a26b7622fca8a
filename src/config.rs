/// Runtime settings for the sequencer and the host
use crate::sequencer::{TrackId, TRACKS};

/// What a released pad does in live-trigger mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiveRelease {
    /// Send a note-off to the instrument and darken the pad.
    #[default]
    Forward,
    /// Drop the release entirely.
    Ignore,
}

/// Which instrument channel a live-trigger pad plays on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiveChannel {
    /// The pad's column, offset from the base channel.
    #[default]
    Column,
    /// Always the given track's channel.
    Fixed(TrackId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Channel of track 0; track t plays on `instrument_channel + t`.
    pub instrument_channel: u8,
    pub note: u8,
    pub velocity: u8,
    pub live_release: LiveRelease,
    pub live_channel: LiveChannel,
    pub queue_capacity: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            instrument_channel: 0,
            note: 60, // Middle C
            velocity: 127,
            live_release: LiveRelease::default(),
            live_channel: LiveChannel::default(),
            queue_capacity: 64,
        }
    }
}

impl SequencerConfig {
    /// Channel nibble for `track`, wrapped into the 16 MIDI channels.
    pub fn channel_for(&self, track: TrackId) -> u8 {
        ((self.instrument_channel as usize + track) & 0x0F) as u8
    }

    /// Clamps values into their MIDI ranges.
    pub fn sanitized(mut self) -> Self {
        self.instrument_channel = self.instrument_channel.min(15);
        self.note = self.note.min(127);
        self.velocity = self.velocity.min(127);
        if let LiveChannel::Fixed(track) = self.live_channel {
            self.live_channel = LiveChannel::Fixed(track.min(TRACKS - 1));
        }
        self.queue_capacity = self.queue_capacity.max(1);
        self
    }
}

/// Client name and the substrings used to find each device's ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
    pub client_name: String,
    pub surface: String,
    pub instrument: String,
    pub clock: String,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            client_name: "gridseq".to_string(),
            surface: "Launchpad Mini".to_string(),
            instrument: "Scarlett 6i6".to_string(),
            clock: "jack_midi_clock".to_string(),
        }
    }
}
