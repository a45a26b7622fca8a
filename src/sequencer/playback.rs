/// Playback - turns beat-clock messages into triggers and playhead LEDs
use super::{Mode, SequencerState, StepId, TRACKS};
use crate::config::SequencerConfig;
use crate::error::Result;
use crate::midi::{MidiEvent, Outputs, NOTE_ON};
use crate::surface::{render, LedCommand, ARMED, OFF, PLAYHEAD};

/// Counts one clock tick and plays the current step on every sixth.
/// Returns whether a step was played.
pub fn tick(
    state: &mut SequencerState,
    config: &SequencerConfig,
    out: &mut Outputs,
) -> Result<bool> {
    if state.transport.count_tick() {
        play(state, config, out)?;
        return Ok(true);
    }
    Ok(false)
}

/// Rewinds to step 0 and plays it immediately.
pub fn start(
    state: &mut SequencerState,
    config: &SequencerConfig,
    out: &mut Outputs,
) -> Result<()> {
    state.transport.rewind();
    play(state, config, out)?;
    Ok(())
}

/// Plays the current step, moves the playhead and advances one step.
pub fn play(
    state: &mut SequencerState,
    config: &SequencerConfig,
    out: &mut Outputs,
) -> Result<StepId> {
    let step = state.transport.current_step();

    for track in 0..TRACKS {
        if state.grid.is_armed(track, step) {
            out.instrument(MidiEvent::message(
                NOTE_ON | config.channel_for(track),
                config.note,
                config.velocity,
            ))?;
        }
    }

    // Live-trigger mode uses the surface as a pad, never as a display.
    if state.mode == Mode::LiveTrigger {
        state.transport.advance();
        return Ok(step);
    }

    out.surface(LedCommand::step(step, PLAYHEAD).to_event())?;
    if state.transport.is_first_advance() {
        for command in render::clear_grid() {
            out.surface(command.to_event())?;
        }
    } else {
        let previous = state.transport.previous_step();
        let color = if state.grid.is_armed(state.selected_track(), previous) {
            ARMED
        } else {
            OFF
        };
        out.surface(LedCommand::step(previous, color).to_event())?;
    }

    state.transport.advance();
    Ok(step)
}
