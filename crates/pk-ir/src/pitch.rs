//! 1V/octave pitch helpers.
//!
//! A step's CV is a float where the integer part is the octave offset from
//! C4 (0 V) and the fractional part is semitones / 12.

/// Octave number printed for a CV of 0 V.
pub const OCTAVE_OFFSET: i32 = 4;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Round a CV to the nearest semitone.
pub fn quantize_semitone(cv: f32) -> f32 {
    libm::roundf(cv * 12.0) / 12.0
}

/// Split a CV into (octave offset from C4, semitone 0..12), rounding to the
/// nearest semitone first so that values just under a boundary land on it.
pub fn split_pitch(cv: f32) -> (i32, u8) {
    let semis = libm::roundf(cv * 12.0) as i32;
    (semis.div_euclid(12), semis.rem_euclid(12) as u8)
}

/// Note name and printed octave number, e.g. `("A", 4)` for 0.75 V.
pub fn note_name(cv: f32) -> (&'static str, i32) {
    let (octave, semitone) = split_pitch(cv);
    (NOTE_NAMES[semitone as usize], octave + OCTAVE_OFFSET)
}
