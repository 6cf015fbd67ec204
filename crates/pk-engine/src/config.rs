//! Module-wide behaviour switches shared by every track.

/// How activating a tie treats gate types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TieMode {
    /// The tied run holds the gate: predecessors become full-length gates and
    /// the head's gate type moves to the tail of the run.
    #[default]
    Hold,
    /// The new tied step copies its predecessor's attributes.
    Legacy,
}

/// Which track, if any, stops playback when its song reaches the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopAtEnd {
    #[default]
    Never,
    Track(u8),
}

impl StopAtEnd {
    pub fn matches(self, track: usize) -> bool {
        matches!(self, StopAtEnd::Track(t) if t as usize == track)
    }

    /// Index stored in save files: 0 = never, n = track n-1.
    pub fn to_index(self) -> u8 {
        match self {
            StopAtEnd::Never => 0,
            StopAtEnd::Track(t) => t.saturating_add(1),
        }
    }

    pub fn from_index(index: u8) -> Self {
        match index {
            0 => StopAtEnd::Never,
            n => StopAtEnd::Track(n - 1),
        }
    }
}

/// Settings consulted by every kernel on each clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KernelConfig {
    pub tie_mode: TieMode,
    pub stop_at_end: StopAtEnd,
    /// Also honour `stop_at_end` when a sequence (not a song) completes.
    pub stop_while_editing: bool,
}
