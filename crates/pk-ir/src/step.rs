//! Per-step attribute record.

use crate::gate::GateType;

/// Upper bound of the velocity/CV2 field.
pub const MAX_VELOCITY: u8 = 200;
/// Velocity of a freshly initialized step.
pub const INIT_VELOCITY: u8 = 100;
/// Gate probability (percent) of a freshly initialized step.
pub const INIT_GATE_PROB: u8 = 50;
/// Slide amount (percent) of a freshly initialized step.
pub const INIT_SLIDE: u8 = 10;

const MSK_VELOCITY: u32 = 0x0000_00FF;
const MSK_GATE_PROB_VAL: u32 = 0x0000_FF00;
const SHIFT_GATE_PROB_VAL: u32 = 8;
const MSK_SLIDE_VAL: u32 = 0x00FF_0000;
const SHIFT_SLIDE_VAL: u32 = 16;
const MSK_GATE: u32 = 0x0100_0000;
const MSK_GATE_PROB: u32 = 0x0200_0000;
const MSK_SLIDE: u32 = 0x0400_0000;
const MSK_TIED: u32 = 0x0800_0000;
const MSK_GATE_TYPE: u32 = 0xF000_0000;
const SHIFT_GATE_TYPE: u32 = 28;

/// Playable attributes of one step, packed into 32 bits.
///
/// Layout (LSB first): velocity (8), gate probability percent (8),
/// slide percent (8), gate, probability enable, slide enable, tied,
/// gate type (4). The raw value is the save-file representation.
///
/// Setters mask their input into the field width; they never reject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StepAttributes(u32);

impl Default for StepAttributes {
    fn default() -> Self {
        Self::INIT
    }
}

impl StepAttributes {
    /// Gate on, velocity 100, probability 50%, slide 10%, gate type 0.
    pub const INIT: Self = Self(
        MSK_GATE
            | INIT_VELOCITY as u32
            | (INIT_GATE_PROB as u32) << SHIFT_GATE_PROB_VAL
            | (INIT_SLIDE as u32) << SHIFT_SLIDE_VAL,
    );

    /// Wrap a raw bit pattern (e.g. read from a save file).
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bit pattern.
    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn gate(self) -> bool {
        self.0 & MSK_GATE != 0
    }

    pub const fn gate_prob(self) -> bool {
        self.0 & MSK_GATE_PROB != 0
    }

    pub const fn slide(self) -> bool {
        self.0 & MSK_SLIDE != 0
    }

    pub const fn tied(self) -> bool {
        self.0 & MSK_TIED != 0
    }

    pub const fn gate_type(self) -> GateType {
        GateType::from_index(((self.0 & MSK_GATE_TYPE) >> SHIFT_GATE_TYPE) as u8)
    }

    pub const fn velocity(self) -> u8 {
        (self.0 & MSK_VELOCITY) as u8
    }

    /// Gate probability, 0..=100 percent.
    pub const fn gate_prob_val(self) -> u8 {
        ((self.0 & MSK_GATE_PROB_VAL) >> SHIFT_GATE_PROB_VAL) as u8
    }

    /// Slide amount, 0..=100 percent of the step duration.
    pub const fn slide_val(self) -> u8 {
        ((self.0 & MSK_SLIDE_VAL) >> SHIFT_SLIDE_VAL) as u8
    }

    fn set_flag(&mut self, mask: u32, on: bool) {
        if on {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    pub fn set_gate(&mut self, on: bool) {
        self.set_flag(MSK_GATE, on);
    }

    pub fn set_gate_prob(&mut self, on: bool) {
        self.set_flag(MSK_GATE_PROB, on);
    }

    pub fn set_slide(&mut self, on: bool) {
        self.set_flag(MSK_SLIDE, on);
    }

    /// Set the tied flag. Tying a step clears its gate, probability and slide
    /// flags: a tied step never re-triggers on its own.
    pub fn set_tied(&mut self, on: bool) {
        self.set_flag(MSK_TIED, on);
        if on {
            self.0 &= !(MSK_GATE | MSK_GATE_PROB | MSK_SLIDE);
        }
    }

    pub fn set_gate_type(&mut self, gate_type: GateType) {
        self.0 = (self.0 & !MSK_GATE_TYPE) | ((gate_type as u32) << SHIFT_GATE_TYPE);
    }

    pub fn set_velocity(&mut self, velocity: u8) {
        self.0 = (self.0 & !MSK_VELOCITY) | velocity as u32;
    }

    pub fn set_gate_prob_val(&mut self, percent: u8) {
        self.0 = (self.0 & !MSK_GATE_PROB_VAL) | ((percent as u32) << SHIFT_GATE_PROB_VAL);
    }

    pub fn set_slide_val(&mut self, percent: u8) {
        self.0 = (self.0 & !MSK_SLIDE_VAL) | ((percent as u32) << SHIFT_SLIDE_VAL);
    }

    pub fn toggle_gate(&mut self) {
        self.0 ^= MSK_GATE;
    }

    pub fn toggle_gate_prob(&mut self) {
        self.0 ^= MSK_GATE_PROB;
    }

    pub fn toggle_slide(&mut self) {
        self.0 ^= MSK_SLIDE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_values() {
        let a = StepAttributes::INIT;
        assert!(a.gate());
        assert!(!a.gate_prob());
        assert!(!a.slide());
        assert!(!a.tied());
        assert_eq!(a.velocity(), INIT_VELOCITY);
        assert_eq!(a.gate_prob_val(), INIT_GATE_PROB);
        assert_eq!(a.slide_val(), INIT_SLIDE);
        assert_eq!(a.gate_type(), GateType::Pct25);
    }

    #[test]
    fn init_bit_pattern_is_stable() {
        // Save files depend on this exact value.
        assert_eq!(StepAttributes::INIT.bits(), 0x010A_3264);
    }

    #[test]
    fn tying_clears_trigger_flags() {
        let mut a = StepAttributes::INIT;
        a.set_gate_prob(true);
        a.set_slide(true);
        a.set_tied(true);
        assert!(a.tied());
        assert!(!a.gate());
        assert!(!a.gate_prob());
        assert!(!a.slide());
        // Values survive, only the enables are dropped.
        assert_eq!(a.gate_prob_val(), INIT_GATE_PROB);
    }

    #[test]
    fn untying_leaves_flags_alone() {
        let mut a = StepAttributes::INIT;
        a.set_tied(true);
        a.set_gate(true);
        a.set_tied(false);
        assert!(a.gate());
        assert!(!a.tied());
    }

    #[test]
    fn fields_are_independent() {
        let mut a = StepAttributes::from_bits(0);
        a.set_velocity(200);
        a.set_gate_prob_val(77);
        a.set_slide_val(100);
        a.set_gate_type(GateType::Trig);
        assert_eq!(a.velocity(), 200);
        assert_eq!(a.gate_prob_val(), 77);
        assert_eq!(a.slide_val(), 100);
        assert_eq!(a.gate_type(), GateType::Trig);
        assert!(!a.gate());
    }

    #[test]
    fn toggles_flip_single_bit() {
        let mut a = StepAttributes::INIT;
        a.toggle_gate();
        assert!(!a.gate());
        a.toggle_slide();
        assert!(a.slide());
        a.toggle_gate_prob();
        assert!(a.gate_prob());
        assert_eq!(a.velocity(), INIT_VELOCITY);
    }
}
