//! Advanced gate types and their sub-step hit patterns.

/// Number of advanced gate types.
pub const NUM_GATE_TYPES: usize = 12;

/// Resolution of a gate pattern: one step is divided into this many slices.
/// Divisible by every supported pulses-per-step value up to 24 except 10,
/// 14, 18, 20 and 22, which sample at the truncated stride.
pub const GATE_PATTERN_BITS: u32 = 96;

/// A rhythmic subdivision played within one step.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GateType {
    /// First quarter of the step.
    #[default]
    Pct25 = 0,
    /// Triplet: first half of each third.
    Tri = 1,
    /// First half of the step.
    Pct50 = 2,
    /// Second and third triplet hits.
    T23 = 3,
    /// First three quarters of the step.
    Pct75 = 4,
    /// Whole step.
    Full = 5,
    /// First triplet hit only.
    Tr1 = 6,
    /// Two quarter-length hits, one at the start of each half.
    Duo = 7,
    /// Second triplet hit only.
    Tr2 = 8,
    /// Second hit of `Duo` only.
    D2 = 9,
    /// Third triplet hit only.
    Tr3 = 10,
    /// Fixed-length trigger on the first sub-step, independent of tempo.
    Trig = 11,
}

// Bit n is slice n of 96. Low 64 bits first, upper 32 bits shifted in.
const fn pattern(high: u64, low: u64) -> u128 {
    ((high as u128) << 64) | low as u128
}

const PATTERNS: [u128; NUM_GATE_TYPES] = [
    pattern(0x0000_0000_0000_0000, 0x0000_0000_00FF_FFFF), // 25%
    pattern(0x0000_0000_0000_FFFF, 0x0000_FFFF_0000_FFFF), // TRI
    pattern(0x0000_0000_0000_0000, 0x0000_FFFF_FFFF_FFFF), // 50%
    pattern(0x0000_0000_0000_FFFF, 0x0000_FFFF_0000_0000), // T23
    pattern(0x0000_0000_0000_00FF, 0xFFFF_FFFF_FFFF_FFFF), // 75%
    pattern(0x0000_0000_FFFF_FFFF, 0xFFFF_FFFF_FFFF_FFFF), // FUL
    pattern(0x0000_0000_0000_0000, 0x0000_0000_0000_FFFF), // TR1
    pattern(0x0000_0000_0000_00FF, 0xFFFF_0000_00FF_FFFF), // DUO
    pattern(0x0000_0000_0000_0000, 0x0000_FFFF_0000_0000), // TR2
    pattern(0x0000_0000_0000_00FF, 0xFFFF_0000_0000_0000), // D2
    pattern(0x0000_0000_0000_FFFF, 0x0000_0000_0000_0000), // TR3
    0,                                                     // TRIG
];

const SHORT_NAMES: [&str; NUM_GATE_TYPES] = [
    "25%", "TRI", "50%", "T23", "75%", "FUL", "TR1", "DUO", "TR2", "D2", "TR3", "TRG",
];

impl GateType {
    pub const ALL: [GateType; NUM_GATE_TYPES] = [
        GateType::Pct25,
        GateType::Tri,
        GateType::Pct50,
        GateType::T23,
        GateType::Pct75,
        GateType::Full,
        GateType::Tr1,
        GateType::Duo,
        GateType::Tr2,
        GateType::D2,
        GateType::Tr3,
        GateType::Trig,
    ];

    /// Gate type for a stored index. Indices past the table saturate to `Trig`.
    pub const fn from_index(index: u8) -> Self {
        let i = if (index as usize) < NUM_GATE_TYPES {
            index as usize
        } else {
            NUM_GATE_TYPES - 1
        };
        Self::ALL[i]
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Three-letter panel label.
    pub const fn short_name(self) -> &'static str {
        SHORT_NAMES[self as usize]
    }

    /// The 96-slice pattern mask.
    pub const fn pattern(self) -> u128 {
        PATTERNS[self as usize]
    }

    /// Whether sub-step `ppqn_count` of a step divided into `pulses_per_step`
    /// pulses falls on a hit of this pattern.
    pub fn hit(self, ppqn_count: u32, pulses_per_step: u32) -> bool {
        let stride = GATE_PATTERN_BITS / pulses_per_step.max(1);
        let shift = ppqn_count * stride;
        if shift >= GATE_PATTERN_BITS {
            return false;
        }
        (self.pattern() >> shift) & 1 != 0
    }

    /// Step to the next/previous gate type, saturating at both ends.
    pub fn offset(self, delta: i32) -> Self {
        let i = (self as i32 + delta).clamp(0, NUM_GATE_TYPES as i32 - 1);
        Self::from_index(i as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(gate: GateType, pps: u32) -> [bool; 4] {
        let mut out = [false; 4];
        for (i, slot) in out.iter_mut().enumerate().take(pps as usize) {
            *slot = gate.hit(i as u32, pps);
        }
        out
    }

    #[test]
    fn coverage_matches_name() {
        let ones = |g: GateType| g.pattern().count_ones();
        assert_eq!(ones(GateType::Pct25), 24);
        assert_eq!(ones(GateType::Pct50), 48);
        assert_eq!(ones(GateType::Pct75), 72);
        assert_eq!(ones(GateType::Full), 96);
        assert_eq!(ones(GateType::Trig), 0);
    }

    #[test]
    fn patterns_fit_in_96_bits() {
        for g in GateType::ALL {
            assert_eq!(g.pattern() >> GATE_PATTERN_BITS, 0, "{:?}", g);
        }
    }

    #[test]
    fn half_gate_at_four_pulses() {
        assert_eq!(hits(GateType::Pct50, 4), [true, true, false, false]);
    }

    #[test]
    fn quarter_and_three_quarter_gates() {
        assert_eq!(hits(GateType::Pct25, 4), [true, false, false, false]);
        assert_eq!(hits(GateType::Pct75, 4), [true, true, true, false]);
        assert_eq!(hits(GateType::Full, 4), [true, true, true, true]);
    }

    #[test]
    fn triplet_at_six_pulses() {
        let mut tri = [false; 6];
        for (i, slot) in tri.iter_mut().enumerate() {
            *slot = GateType::Tri.hit(i as u32, 6);
        }
        assert_eq!(tri, [true, false, true, false, true, false]);
    }

    #[test]
    fn out_of_range_index_saturates() {
        assert_eq!(GateType::from_index(15), GateType::Trig);
        assert_eq!(GateType::from_index(3), GateType::T23);
    }

    #[test]
    fn offset_saturates() {
        assert_eq!(GateType::Pct25.offset(-1), GateType::Pct25);
        assert_eq!(GateType::Tr3.offset(5), GateType::Trig);
        assert_eq!(GateType::Pct50.offset(1), GateType::T23);
    }
}
