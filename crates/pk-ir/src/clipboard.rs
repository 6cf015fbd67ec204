//! Copy/paste snapshots of step and phrase ranges.

use arrayvec::ArrayVec;

use crate::phrase::Phrase;
use crate::run_mode::RunMode;
use crate::seq::SeqAttributes;
use crate::step::StepAttributes;
use crate::{MAX_PHRASES, MAX_STEPS};

/// How many steps (or phrases) a copy captures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CopyRange {
    Four,
    Eight,
    /// The whole sequence or song, starting at index 0, including metadata.
    #[default]
    All,
}

impl CopyRange {
    /// Number of slots captured out of `capacity`.
    pub const fn count(self, capacity: usize) -> usize {
        match self {
            CopyRange::Four => 4,
            CopyRange::Eight => 8,
            CopyRange::All => capacity,
        }
    }

    /// Cycle Four → Eight → All → Four.
    pub const fn next(self) -> Self {
        match self {
            CopyRange::Four => CopyRange::Eight,
            CopyRange::Eight => CopyRange::All,
            CopyRange::All => CopyRange::Four,
        }
    }
}

/// A contiguous run of steps plus the source sequence's attributes.
#[derive(Clone, Debug, Default)]
pub struct SeqCpBuffer {
    /// Captured (pitch, attributes) pairs, in step order.
    pub steps: ArrayVec<(f32, StepAttributes), MAX_STEPS>,
    /// Attributes of the source sequence at copy time.
    pub seq_attributes: SeqAttributes,
}

impl SeqCpBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps actually captured.
    pub fn stored_len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// A capture of every step; pasting it also restores the attributes.
    pub fn is_whole_sequence(&self) -> bool {
        self.steps.len() == MAX_STEPS
    }
}

/// A contiguous run of phrases plus the source song's playable window.
#[derive(Clone, Debug)]
pub struct SongCpBuffer {
    pub phrases: ArrayVec<Phrase, MAX_PHRASES>,
    pub begin: u8,
    pub end: u8,
    pub run_mode: RunMode,
}

impl Default for SongCpBuffer {
    fn default() -> Self {
        Self {
            phrases: ArrayVec::new(),
            begin: 0,
            end: 0,
            run_mode: RunMode::Forward,
        }
    }
}

impl SongCpBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored_len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// A capture of every phrase; pasting it also restores begin/end/run mode.
    pub fn is_whole_song(&self) -> bool {
        self.phrases.len() == MAX_PHRASES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_counts() {
        assert_eq!(CopyRange::Four.count(MAX_STEPS), 4);
        assert_eq!(CopyRange::Eight.count(MAX_STEPS), 8);
        assert_eq!(CopyRange::All.count(MAX_PHRASES), MAX_PHRASES);
    }

    #[test]
    fn range_cycles() {
        assert_eq!(CopyRange::All.next(), CopyRange::Four);
        assert_eq!(CopyRange::Four.next().next(), CopyRange::All);
    }

    #[test]
    fn new_buffers_are_empty() {
        assert!(SeqCpBuffer::new().is_empty());
        assert!(!SongCpBuffer::new().is_whole_song());
    }
}
