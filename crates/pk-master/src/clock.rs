//! Free-running clock for hosts without an external clock input.

/// Clock state for one sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockTick {
    /// The clock went high on this sample.
    pub rising: bool,
    pub high: bool,
}

/// Square-wave clock at `bpm` × `pulses_per_beat` pulses per minute.
///
/// The phase starts at zero and the first rising edge comes when it first
/// wraps, one full period after start.
#[derive(Clone, Debug)]
pub struct InternalClock {
    sample_rate: u32,
    bpm: f64,
    pulses_per_beat: u32,
    phase: f64,
}

impl InternalClock {
    pub fn new(sample_rate: u32, bpm: f64, pulses_per_beat: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            bpm: bpm.max(1.0),
            pulses_per_beat: pulses_per_beat.max(1),
            phase: 0.0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm.max(1.0);
    }

    /// Samples per clock pulse.
    pub fn period(&self) -> f64 {
        self.sample_rate as f64 * 60.0 / (self.bpm * self.pulses_per_beat as f64)
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn tick(&mut self) -> ClockTick {
        self.phase += 1.0 / self.period();
        let rising = self.phase >= 1.0;
        if rising {
            self.phase -= self.phase.floor();
        }
        ClockTick { rising, high: self.phase < 0.5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rises_once_per_period() {
        // 120 bpm, 1 ppb, 100 Hz: 50 samples per pulse
        let mut clock = InternalClock::new(100, 120.0, 1);
        assert_eq!(clock.period(), 50.0);
        let edges: Vec<usize> = (1..=220).filter(|_| clock.tick().rising).collect();
        assert_eq!(edges.len(), 4);
    }

    #[test]
    fn no_edge_at_start() {
        let mut clock = InternalClock::new(48_000, 120.0, 4);
        assert!(!clock.tick().rising);
    }

    #[test]
    fn half_duty_cycle() {
        let mut clock = InternalClock::new(100, 120.0, 1);
        let high = (0..50).filter(|_| clock.tick().high).count();
        assert!((24..=26).contains(&high), "{high}");
    }
}
