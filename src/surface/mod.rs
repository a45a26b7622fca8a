/// Addressing and color encoding for the 8x8 controller surface
///
/// The surface packs its 64 grid pads into rows of 16 address units, of
/// which only the first 8 are pads. Scene buttons along the side are
/// controller numbers starting at [SCENE_BASE].
use crate::midi::{MidiEvent, CONTROL_CHANGE, NOTE_OFF, NOTE_ON};
use crate::sequencer::{StepId, TrackId};

pub mod render;

/// Controller number of the first scene button / indicator.
pub const SCENE_BASE: u8 = 104;
/// Scene index of the mode toggle.
pub const MODE_SCENE: u8 = 6;
/// Controller number of the mode indicator LED.
pub const MODE_INDICATOR: u8 = SCENE_BASE + MODE_SCENE;

pub const OFF: u8 = 0;
pub const ARMED: u8 = encode_color(3, 0);
pub const PLAYHEAD: u8 = encode_color(1, 1);
pub const LIVE_HIT: u8 = encode_color(3, 0);
pub const MODE_LIVE: u8 = encode_color(3, 0);
pub const MODE_SEQUENCER: u8 = encode_color(3, 3);

/// Button address of the pad showing `step`.
pub const fn cell_for_step(step: StepId) -> u8 {
    let step = step as u8;
    16 * (step / 8) + (step % 8)
}

/// Step shown by the pad at `address`. Left inverse of [cell_for_step].
pub const fn step_for_button(address: u8) -> StepId {
    ((address % 8) + ((address & 0xF0) / 2)) as StepId
}

/// Packs a (group, intensity) pair, each 0..4, into one color byte.
pub const fn encode_color(group: u8, intensity: u8) -> u8 {
    16 * group + intensity
}

/// Controller number of the indicator for `track`.
pub const fn track_indicator(track: TrackId) -> u8 {
    SCENE_BASE + track as u8
}

/// A single LED update destined for the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCommand {
    /// Light (or darken, with [OFF]) a grid pad.
    Cell { address: u8, color: u8 },
    /// Turn a grid pad off with a note-off.
    CellOff { address: u8 },
    /// Light (or darken) a scene-button indicator.
    Indicator { number: u8, color: u8 },
    /// Clear every LED on the surface.
    Reset,
}

impl LedCommand {
    pub fn step(step: StepId, color: u8) -> Self {
        LedCommand::Cell {
            address: cell_for_step(step),
            color,
        }
    }

    pub fn to_event(self) -> MidiEvent {
        match self {
            LedCommand::Cell { address, color } => MidiEvent::message(NOTE_ON, address, color),
            LedCommand::CellOff { address } => MidiEvent::message(NOTE_OFF, address, 0),
            LedCommand::Indicator { number, color } => {
                MidiEvent::message(CONTROL_CHANGE, number, color)
            }
            LedCommand::Reset => MidiEvent::message(CONTROL_CHANGE, 0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::STEPS;

    #[test]
    fn test_cell_round_trip() {
        for step in 0..STEPS {
            assert_eq!(step_for_button(cell_for_step(step)), step);
        }
    }

    #[test]
    fn test_cell_layout() {
        assert_eq!(cell_for_step(0), 0x00);
        assert_eq!(cell_for_step(7), 0x07);
        assert_eq!(cell_for_step(8), 0x10);
        assert_eq!(cell_for_step(63), 0x77);
    }

    #[test]
    fn test_every_grid_address_maps_to_a_step() {
        for row in 0..8u8 {
            for column in 0..8u8 {
                let address = row * 16 + column;
                assert_eq!(address & 0x08, 0);
                assert_eq!(step_for_button(address), (row * 8 + column) as StepId);
            }
        }
    }

    #[test]
    fn test_encode_color_is_injective() {
        let mut seen = std::collections::HashSet::new();
        for group in 0..4 {
            for intensity in 0..4 {
                assert!(seen.insert(encode_color(group, intensity)));
            }
        }
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn test_led_command_wire_format() {
        assert_eq!(
            LedCommand::step(9, ARMED).to_event().bytes(),
            &[0x90, 0x11, 0x30]
        );
        assert_eq!(
            LedCommand::CellOff { address: 0x21 }.to_event().bytes(),
            &[0x80, 0x21, 0x00]
        );
        assert_eq!(
            LedCommand::Indicator {
                number: MODE_INDICATOR,
                color: MODE_SEQUENCER
            }
            .to_event()
            .bytes(),
            &[0xB0, 110, 0x33]
        );
        assert_eq!(LedCommand::Reset.to_event().bytes(), &[0xB0, 0, 0]);
    }
}
