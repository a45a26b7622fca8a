/// LED output that brings the surface in line with sequencer state.
///
/// Every function returns a lazy iterator over [LedCommand]s so callers on
/// the real-time path can stream them to a sink without allocating.
use std::iter;

use super::{cell_for_step, track_indicator, LedCommand, ARMED, MODE_INDICATOR, OFF};
use crate::sequencer::{Mode, SequencerState, TrackId, TriggerGrid, STEPS, TRACKS};

/// One indicator per track, only `selected` lit.
pub fn render_track_indicators(selected: TrackId) -> impl Iterator<Item = LedCommand> {
    indicators(Some(selected))
}

/// One pad per step, lit where `track` is armed.
pub fn render_grid(grid: &TriggerGrid, track: TrackId) -> impl Iterator<Item = LedCommand> + '_ {
    cells(grid, Some(track))
}

pub fn render_mode_indicator(mode: Mode) -> LedCommand {
    let color = match mode {
        Mode::LiveTrigger => super::MODE_LIVE,
        Mode::StepSequencer => super::MODE_SEQUENCER,
    };
    LedCommand::Indicator {
        number: MODE_INDICATOR,
        color,
    }
}

/// Redraws indicators, grid and mode LED, in that order. Live-trigger mode
/// blanks the grid and then the indicators since it never displays the
/// sequence.
pub fn full_refresh(state: &SequencerState) -> impl Iterator<Item = LedCommand> + '_ {
    let (shown, leading, trailing) = match state.mode {
        Mode::LiveTrigger => (None, 0, TRACKS),
        Mode::StepSequencer => (Some(state.selected_track()), TRACKS, 0),
    };
    indicators(shown)
        .take(leading)
        .chain(cells(&state.grid, shown))
        .chain(indicators(shown).take(trailing))
        .chain(iter::once(render_mode_indicator(state.mode)))
}

/// Note-off for every pad.
pub fn clear_grid() -> impl Iterator<Item = LedCommand> {
    (0..STEPS).map(|step| LedCommand::CellOff {
        address: cell_for_step(step),
    })
}

/// What the surface receives before the first block runs.
pub fn startup(state: &SequencerState) -> impl Iterator<Item = LedCommand> + '_ {
    iter::once(LedCommand::Reset).chain(full_refresh(state))
}

fn indicators(lit: Option<TrackId>) -> impl Iterator<Item = LedCommand> {
    (0..TRACKS).map(move |track| LedCommand::Indicator {
        number: track_indicator(track),
        color: if lit == Some(track) { ARMED } else { OFF },
    })
}

fn cells(grid: &TriggerGrid, track: Option<TrackId>) -> impl Iterator<Item = LedCommand> + '_ {
    (0..STEPS).map(move |step| {
        let armed = track.map_or(false, |track| grid.is_armed(track, step));
        LedCommand::step(step, if armed { ARMED } else { OFF })
    })
}
