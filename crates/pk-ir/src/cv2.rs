//! Interpretation of the per-step velocity field on the CV2 output.

use crate::step::MAX_VELOCITY;

/// How a track renders step velocity as a voltage.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cv2Mode {
    /// 0..=200 maps linearly onto 0..10 V.
    #[default]
    Volts = 0,
    /// 0..=120 semitones at 1 V/octave.
    Note = 1,
}

impl Cv2Mode {
    pub const fn from_index(index: u8) -> Self {
        match index {
            0 => Cv2Mode::Volts,
            _ => Cv2Mode::Note,
        }
    }

    /// Largest velocity value editable in this mode.
    pub const fn max_velocity(self) -> u8 {
        match self {
            Cv2Mode::Volts => MAX_VELOCITY,
            Cv2Mode::Note => 120,
        }
    }

    pub fn to_volts(self, velocity: u8) -> f32 {
        let v = velocity.min(self.max_velocity()) as f32;
        match self {
            Cv2Mode::Volts => v * (10.0 / MAX_VELOCITY as f32),
            Cv2Mode::Note => v / 12.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_is_ten_volts() {
        assert_eq!(Cv2Mode::Volts.to_volts(MAX_VELOCITY), 10.0);
        assert_eq!(Cv2Mode::Note.to_volts(120), 10.0);
    }

    #[test]
    fn note_mode_clamps_to_its_range() {
        assert_eq!(Cv2Mode::Note.to_volts(200), 10.0);
        assert_eq!(Cv2Mode::Note.to_volts(12), 1.0);
    }
}
