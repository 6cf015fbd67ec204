//! Per-sequence attribute record.

use crate::run_mode::RunMode;
use crate::MAX_STEPS;

/// Largest magnitude of the stored transpose and rotate offsets.
pub const MAX_OFFSET: i32 = 99;

const MSK_LENGTH: u32 = 0x0000_00FF;
const MSK_RUN_MODE: u32 = 0x0000_FF00;
const SHIFT_RUN_MODE: u32 = 8;
const MSK_TRANSPOSE: u32 = 0x007F_0000;
const SHIFT_TRANSPOSE: u32 = 16;
const MSK_TRANSPOSE_SIGN: u32 = 0x0080_0000;
const MSK_ROTATE: u32 = 0x7F00_0000;
const SHIFT_ROTATE: u32 = 24;
const MSK_ROTATE_SIGN: u32 = 0x8000_0000;

/// Global attributes of one sequence, packed into 32 bits.
///
/// Layout (LSB first): length (8), run mode (8), transpose magnitude (7),
/// transpose sign, rotate magnitude (7), rotate sign. Positive rotation
/// moves steps to the right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SeqAttributes(u32);

impl Default for SeqAttributes {
    fn default() -> Self {
        Self::INIT
    }
}

impl SeqAttributes {
    /// Full length, forward, no transpose, no rotation.
    pub const INIT: Self = Self(MAX_STEPS as u32);

    pub const fn new(length: u8, run_mode: RunMode) -> Self {
        Self(clamp_length(length) as u32 | (run_mode as u32) << SHIFT_RUN_MODE)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Number of steps played, 1..=MAX_STEPS.
    pub const fn length(self) -> u8 {
        clamp_length((self.0 & MSK_LENGTH) as u8)
    }

    pub const fn run_mode(self) -> RunMode {
        RunMode::from_index(((self.0 & MSK_RUN_MODE) >> SHIFT_RUN_MODE) as u8)
    }

    /// Accumulated transpose in semitones.
    pub const fn transpose(self) -> i32 {
        let magnitude = ((self.0 & MSK_TRANSPOSE) >> SHIFT_TRANSPOSE) as i32;
        if self.0 & MSK_TRANSPOSE_SIGN != 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Accumulated rotation in steps.
    pub const fn rotate(self) -> i32 {
        let magnitude = ((self.0 & MSK_ROTATE) >> SHIFT_ROTATE) as i32;
        if self.0 & MSK_ROTATE_SIGN != 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn set_length(&mut self, length: u8) {
        self.0 = (self.0 & !MSK_LENGTH) | clamp_length(length) as u32;
    }

    pub fn set_run_mode(&mut self, run_mode: RunMode) {
        self.0 = (self.0 & !MSK_RUN_MODE) | ((run_mode as u32) << SHIFT_RUN_MODE);
    }

    /// Store a transpose offset, clamped to ±99.
    pub fn set_transpose(&mut self, semitones: i32) {
        let (magnitude, sign) = sign_magnitude(semitones);
        self.0 = (self.0 & !(MSK_TRANSPOSE | MSK_TRANSPOSE_SIGN))
            | (magnitude << SHIFT_TRANSPOSE)
            | if sign { MSK_TRANSPOSE_SIGN } else { 0 };
    }

    /// Store a rotate offset, clamped to ±99.
    pub fn set_rotate(&mut self, steps: i32) {
        let (magnitude, sign) = sign_magnitude(steps);
        self.0 = (self.0 & !(MSK_ROTATE | MSK_ROTATE_SIGN))
            | (magnitude << SHIFT_ROTATE)
            | if sign { MSK_ROTATE_SIGN } else { 0 };
    }
}

const fn clamp_length(length: u8) -> u8 {
    if length == 0 {
        1
    } else if length as usize > MAX_STEPS {
        MAX_STEPS as u8
    } else {
        length
    }
}

fn sign_magnitude(value: i32) -> (u32, bool) {
    let clamped = value.clamp(-MAX_OFFSET, MAX_OFFSET);
    (clamped.unsigned_abs(), clamped < 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_full_length_forward() {
        let a = SeqAttributes::INIT;
        assert_eq!(a.length() as usize, MAX_STEPS);
        assert_eq!(a.run_mode(), RunMode::Forward);
        assert_eq!(a.transpose(), 0);
        assert_eq!(a.rotate(), 0);
    }

    #[test]
    fn signed_offsets_round_trip() {
        let mut a = SeqAttributes::INIT;
        a.set_transpose(-12);
        a.set_rotate(7);
        assert_eq!(a.transpose(), -12);
        assert_eq!(a.rotate(), 7);
        a.set_rotate(-99);
        assert_eq!(a.rotate(), -99);
        assert_eq!(a.transpose(), -12);
    }

    #[test]
    fn offsets_clamp() {
        let mut a = SeqAttributes::INIT;
        a.set_transpose(150);
        assert_eq!(a.transpose(), 99);
        a.set_rotate(-400);
        assert_eq!(a.rotate(), -99);
    }

    #[test]
    fn negative_zero_reads_as_zero() {
        let a = SeqAttributes::from_bits(MSK_TRANSPOSE_SIGN | MSK_ROTATE_SIGN | 16);
        assert_eq!(a.transpose(), 0);
        assert_eq!(a.rotate(), 0);
    }

    #[test]
    fn length_clamps() {
        let mut a = SeqAttributes::new(0, RunMode::Pendulum);
        assert_eq!(a.length(), 1);
        assert_eq!(a.run_mode(), RunMode::Pendulum);
        a.set_length(200);
        assert_eq!(a.length() as usize, MAX_STEPS);
    }
}
