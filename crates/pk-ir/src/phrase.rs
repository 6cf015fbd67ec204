//! Song slot record.

use crate::{MAX_REPS, MAX_SEQS};

const MSK_SEQ_NUM: u16 = 0x00FF;
const MSK_REPS: u16 = 0xFF00;
const SHIFT_REPS: u16 = 8;

/// One song slot: which sequence to play and how many times.
///
/// Phrases with zero repeats are skipped during playback but stay editable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Phrase(u16);

impl Default for Phrase {
    fn default() -> Self {
        Self::INIT
    }
}

impl Phrase {
    /// Sequence 0, played once.
    pub const INIT: Self = Self(1 << SHIFT_REPS);

    pub fn new(seq_num: u8, reps: u8) -> Self {
        let mut p = Self(0);
        p.set_seq_num(seq_num);
        p.set_reps(reps);
        p
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn seq_num(self) -> u8 {
        (self.0 & MSK_SEQ_NUM) as u8
    }

    pub const fn reps(self) -> u8 {
        ((self.0 & MSK_REPS) >> SHIFT_REPS) as u8
    }

    /// Whether playback visits this slot.
    pub const fn is_playable(self) -> bool {
        self.reps() != 0
    }

    pub fn set_seq_num(&mut self, seq_num: u8) {
        let seq_num = seq_num.min(MAX_SEQS as u8 - 1);
        self.0 = (self.0 & !MSK_SEQ_NUM) | seq_num as u16;
    }

    pub fn set_reps(&mut self, reps: u8) {
        let reps = reps.min(MAX_REPS);
        self.0 = (self.0 & !MSK_REPS) | ((reps as u16) << SHIFT_REPS);
    }
}
