/// Handlers for controller-surface buttons
use crate::config::{LiveChannel, LiveRelease, SequencerConfig};
use crate::error::Result;
use crate::midi::{MidiEvent, Outputs, CONTROL_CHANGE, NOTE_OFF, NOTE_ON};
use crate::sequencer::{Mode, SequencerState, TrackId, STEPS, TRACKS};
use crate::surface::{
    render, step_for_button, LedCommand, ARMED, LIVE_HIT, MODE_SCENE, OFF,
};

/// A 3-byte message from the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub status: u8,
    pub number: u8,
    pub value: u8,
}

impl ButtonEvent {
    pub fn from_event(event: &MidiEvent) -> Self {
        Self {
            status: event.byte(0),
            number: event.byte(1),
            value: event.byte(2),
        }
    }

    /// Note-on with a non-zero value. Note-offs and zero-velocity note-ons
    /// are releases.
    pub fn is_press(&self) -> bool {
        self.status & 0xF0 == NOTE_ON && self.value != 0
    }

    fn is_scene(&self) -> bool {
        self.status == CONTROL_CHANGE
    }

    fn is_letter(&self) -> bool {
        self.number & 0x08 == 0x08
    }
}

pub fn handle(
    state: &mut SequencerState,
    config: &SequencerConfig,
    button: ButtonEvent,
    out: &mut Outputs,
) -> Result<()> {
    if button.is_scene() {
        return scene_button(state, button, out);
    }
    if button.is_letter() {
        return letter_button(button);
    }
    grid_button(state, config, button, out)
}

/// Scene buttons 0-5 select a track, 6 toggles the mode, 7 is unassigned.
pub fn scene_button(
    state: &mut SequencerState,
    button: ButtonEvent,
    out: &mut Outputs,
) -> Result<()> {
    match button.number % 8 {
        MODE_SCENE => {
            if button.value == 0 {
                return Ok(());
            }
            switch_mode(state, out)
        }
        7 => Ok(()),
        index => select_track(state, index as TrackId, out),
    }
}

/// The letter column (A-H) has no function yet.
pub fn letter_button(_button: ButtonEvent) -> Result<()> {
    Ok(())
}

pub fn grid_button(
    state: &mut SequencerState,
    config: &SequencerConfig,
    button: ButtonEvent,
    out: &mut Outputs,
) -> Result<()> {
    match state.mode {
        Mode::StepSequencer => toggle_step(state, button, out),
        Mode::LiveTrigger => live_trigger(config, button, out),
    }
}

pub fn switch_mode(state: &mut SequencerState, out: &mut Outputs) -> Result<()> {
    state.toggle_mode();
    for command in render::full_refresh(state) {
        out.surface(command.to_event())?;
    }
    Ok(())
}

/// Selects `track` and redraws the indicators and grid for it. Live-trigger
/// mode keeps the surface blank, so selection is ignored there.
pub fn select_track(
    state: &mut SequencerState,
    track: TrackId,
    out: &mut Outputs,
) -> Result<()> {
    if state.mode == Mode::LiveTrigger || track >= TRACKS {
        return Ok(());
    }
    state.select_track(track);

    for command in render::render_track_indicators(track) {
        out.surface(command.to_event())?;
    }
    for command in render::render_grid(&state.grid, track) {
        out.surface(command.to_event())?;
    }
    Ok(())
}

/// Toggles the pressed step on the selected track. Releases are ignored,
/// as are addresses below the last grid row.
pub fn toggle_step(
    state: &mut SequencerState,
    button: ButtonEvent,
    out: &mut Outputs,
) -> Result<()> {
    if !button.is_press() {
        return Ok(());
    }
    let step = step_for_button(button.number);
    if step >= STEPS {
        return Ok(());
    }
    let armed = state.toggle_step(step);
    let color = if armed { ARMED } else { OFF };
    out.surface(LedCommand::step(step, color).to_event())
}

/// Fires the instrument straight from a pad. Velocity falls from 127 on
/// the top row to 15 on the bottom.
pub fn live_trigger(
    config: &SequencerConfig,
    button: ButtonEvent,
    out: &mut Outputs,
) -> Result<()> {
    let pressed = button.is_press();
    if !pressed && config.live_release == LiveRelease::Ignore {
        return Ok(());
    }

    let track = match config.live_channel {
        LiveChannel::Column => (button.number % 8) as TrackId,
        LiveChannel::Fixed(track) => track,
    };
    let channel = config.channel_for(track);
    let velocity = live_velocity(button.number);

    let (status, led) = if pressed {
        (
            NOTE_ON,
            LedCommand::Cell {
                address: button.number,
                color: LIVE_HIT,
            },
        )
    } else {
        (
            NOTE_OFF,
            LedCommand::CellOff {
                address: button.number,
            },
        )
    };
    out.instrument(MidiEvent::message(status | channel, config.note, velocity))?;
    out.surface(led.to_event())
}

pub fn live_velocity(address: u8) -> u8 {
    (112u8.saturating_sub(address & 0xF0)) + 15
}
