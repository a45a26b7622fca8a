/// Core sequencer state - trigger grid, transport and mode
///
/// Everything here is fixed-size and allocation-free so it can be mutated
/// from the real-time callback.
pub mod playback;

pub const TRACKS: usize = 6;
pub const STEPS: usize = 64;
/// Clock ticks per sequencer step (sixteenth notes at 24 PPQN).
pub const TICKS_PER_STEP: u64 = 6;

/// Track index in `0..TRACKS`.
pub type TrackId = usize;
/// Step index in `0..STEPS`.
pub type StepId = usize;

/// Armed flags for every (track, step) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerGrid {
    cells: [[bool; STEPS]; TRACKS],
}

impl TriggerGrid {
    pub fn new() -> Self {
        Self {
            cells: [[false; STEPS]; TRACKS],
        }
    }

    /// Out-of-range coordinates read as unarmed.
    pub fn is_armed(&self, track: TrackId, step: StepId) -> bool {
        self.cells
            .get(track)
            .and_then(|row| row.get(step))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, track: TrackId, step: StepId, value: bool) {
        if let Some(row) = self.cells.get_mut(track) {
            if let Some(cell) = row.get_mut(step) {
                *cell = value;
            }
        }
    }

    /// Flips the flag and returns the stored value. Out-of-range
    /// coordinates stay unarmed.
    pub fn toggle(&mut self, track: TrackId, step: StepId) -> bool {
        self.set(track, step, !self.is_armed(track, step));
        self.is_armed(track, step)
    }
}

impl Default for TriggerGrid {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    LiveTrigger,
    #[default]
    StepSequencer,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::LiveTrigger => Mode::StepSequencer,
            Mode::StepSequencer => Mode::LiveTrigger,
        }
    }
}

/// Beat-clock position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transport {
    tick_counter: u64,
    current_step: StepId,
    previous_step: StepId,
}

impl Transport {
    pub fn tick_counter(&self) -> u64 {
        self.tick_counter
    }

    pub fn current_step(&self) -> StepId {
        self.current_step
    }

    pub fn previous_step(&self) -> StepId {
        self.previous_step
    }

    /// Counts one clock tick; true when it lands on a step boundary.
    pub fn count_tick(&mut self) -> bool {
        self.tick_counter = self.tick_counter.wrapping_add(1);
        self.tick_counter % TICKS_PER_STEP == 0
    }

    /// True until the first advance after startup or a transport start.
    pub fn is_first_advance(&self) -> bool {
        self.current_step == 0 && self.previous_step == 0
    }

    pub fn advance(&mut self) -> StepId {
        self.previous_step = self.current_step;
        self.current_step = (self.current_step + 1) % STEPS;
        self.current_step
    }

    /// Rewinds to step 0. The tick counter keeps running.
    pub fn rewind(&mut self) {
        self.current_step = 0;
        self.previous_step = 0;
    }
}

/// The one piece of mutable state the dispatcher threads through every
/// handler.
#[derive(Debug, Clone, Default)]
pub struct SequencerState {
    pub grid: TriggerGrid,
    pub transport: Transport,
    pub mode: Mode,
    selected_track: TrackId,
}

impl SequencerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_track(&self) -> TrackId {
        self.selected_track
    }

    /// Ignores tracks outside `0..TRACKS`.
    pub fn select_track(&mut self, track: TrackId) -> bool {
        if track < TRACKS {
            self.selected_track = track;
            true
        } else {
            false
        }
    }

    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        self.mode
    }

    /// Toggles a step on the selected track.
    pub fn toggle_step(&mut self, step: StepId) -> bool {
        self.grid.toggle(self.selected_track, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_starts_unarmed() {
        let grid = TriggerGrid::new();
        for track in 0..TRACKS {
            for step in 0..STEPS {
                assert!(!grid.is_armed(track, step));
            }
        }
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut grid = TriggerGrid::new();
        for track in 0..TRACKS {
            for step in [0, 5, 31, 63] {
                let before = grid.is_armed(track, step);
                assert_eq!(grid.toggle(track, step), !before);
                assert_eq!(grid.toggle(track, step), before);
                assert_eq!(grid.is_armed(track, step), before);
            }
        }
    }

    #[test]
    fn test_tracks_are_independent() {
        let mut grid = TriggerGrid::new();
        grid.toggle(2, 5);
        assert!(grid.is_armed(2, 5));
        assert!(!grid.is_armed(1, 5));
        assert!(!grid.is_armed(3, 5));
    }

    #[test]
    fn test_out_of_range_is_unarmed() {
        let mut grid = TriggerGrid::new();
        grid.set(TRACKS, 0, true);
        grid.set(0, STEPS, true);
        assert!(!grid.is_armed(TRACKS, 0));
        assert!(!grid.is_armed(0, STEPS));
        assert!(!grid.toggle(0, STEPS));
        assert!(!grid.toggle(TRACKS, 0));
        assert_eq!(grid, TriggerGrid::new());
    }

    #[test]
    fn test_transport_advance_wraps() {
        let mut transport = Transport::default();
        assert!(transport.is_first_advance());
        for _ in 0..STEPS - 1 {
            transport.advance();
        }
        assert_eq!(transport.current_step(), 63);
        assert_eq!(transport.advance(), 0);
        assert_eq!(transport.previous_step(), 63);
        assert!(!transport.is_first_advance());
    }

    #[test]
    fn test_count_tick_gates_every_sixth() {
        let mut transport = Transport::default();
        let gates: Vec<bool> = (0..12).map(|_| transport.count_tick()).collect();
        assert_eq!(gates.iter().filter(|g| **g).count(), 2);
        assert!(gates[5]);
        assert!(gates[11]);
        assert_eq!(transport.tick_counter(), 12);
    }

    #[test]
    fn test_state_defaults() {
        let state = SequencerState::new();
        assert_eq!(state.mode, Mode::StepSequencer);
        assert_eq!(state.selected_track(), 0);
    }

    #[test]
    fn test_select_track_bounds() {
        let mut state = SequencerState::new();
        assert!(state.select_track(5));
        assert!(!state.select_track(6));
        assert_eq!(state.selected_track(), 5);
    }

    #[test]
    fn test_mode_double_toggle() {
        let mut state = SequencerState::new();
        assert_eq!(state.toggle_mode(), Mode::LiveTrigger);
        assert_eq!(state.toggle_mode(), Mode::StepSequencer);
    }
}
