//! Per-sample control-voltage output.

use pk_ir::MAX_TRACKS;

/// Interleaved output channels per track: pitch, gate, velocity.
pub const CHANNELS_PER_TRACK: usize = 3;

/// Gate high level.
const GATE_VOLTS: f32 = 10.0;

/// Outputs of one track for one sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackOutput {
    /// Pitch, volts (1V/octave, 0 V = C4).
    pub cv: f32,
    pub gate: bool,
    /// CV2 (velocity), volts.
    pub velocity: f32,
}

/// Outputs of every track for one sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub tracks: [TrackOutput; MAX_TRACKS],
    pub num_tracks: u8,
}

impl Frame {
    /// Create an all-zero frame.
    pub const fn silence() -> Self {
        Self {
            tracks: [TrackOutput { cv: 0.0, gate: false, velocity: 0.0 }; MAX_TRACKS],
            num_tracks: 0,
        }
    }

    /// The populated tracks.
    pub fn tracks(&self) -> &[TrackOutput] {
        &self.tracks[..(self.num_tracks as usize).min(MAX_TRACKS)]
    }

    pub fn num_channels(&self) -> usize {
        self.tracks().len() * CHANNELS_PER_TRACK
    }

    /// Volts on interleaved channel `channel`; 0 past the last track.
    pub fn channel_volts(&self, channel: usize) -> f32 {
        let Some(out) = self.tracks().get(channel / CHANNELS_PER_TRACK) else {
            return 0.0;
        };
        match channel % CHANNELS_PER_TRACK {
            0 => out.cv,
            1 if out.gate => GATE_VOLTS,
            1 => 0.0,
            _ => out.velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_interleave_per_track() {
        let mut f = Frame::silence();
        f.num_tracks = 2;
        f.tracks[1] = TrackOutput { cv: 1.5, gate: true, velocity: 2.0 };
        assert_eq!(f.num_channels(), 6);
        assert_eq!(f.channel_volts(3), 1.5);
        assert_eq!(f.channel_volts(4), 10.0);
        assert_eq!(f.channel_volts(5), 2.0);
        assert_eq!(f.channel_volts(1), 0.0);
        assert_eq!(f.channel_volts(6), 0.0);
    }
}
