//! Per-clock gate decision.

use pk_ir::{GateType, StepAttributes};

/// What the gate output does until the next clock edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GateCode {
    #[default]
    Off,
    On,
    /// Follow the incoming clock's high phase.
    ClockHigh,
    /// A short fixed-length trigger at the start of the clock period.
    TriggerPulse,
}

/// Gate state for sub-step `ppqn_count` of a step split into
/// `pulses_per_step` clocks.
///
/// `prob_enable` is the probability draw latched at the step's first clock;
/// a missed draw silences the whole step.
pub fn gate_code(
    attributes: StepAttributes,
    ppqn_count: u32,
    pulses_per_step: u32,
    prob_enable: bool,
) -> GateCode {
    if !attributes.gate() || !prob_enable {
        return GateCode::Off;
    }
    let gate_type = attributes.gate_type();
    if pulses_per_step <= 1 && gate_type == GateType::Pct25 {
        return GateCode::ClockHigh;
    }
    if gate_type == GateType::Trig {
        return if ppqn_count == 0 {
            GateCode::TriggerPulse
        } else {
            GateCode::Off
        };
    }
    if gate_type.hit(ppqn_count, pulses_per_step) {
        GateCode::On
    } else {
        GateCode::Off
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(gate_type: GateType) -> StepAttributes {
        let mut a = StepAttributes::INIT;
        a.set_gate_type(gate_type);
        a
    }

    #[test]
    fn gate_off_or_missed_probability_is_silent() {
        let mut a = step(GateType::Full);
        assert_eq!(gate_code(a, 0, 4, false), GateCode::Off);
        a.set_gate(false);
        assert_eq!(gate_code(a, 0, 4, true), GateCode::Off);
    }

    #[test]
    fn first_type_at_one_pulse_follows_clock() {
        assert_eq!(gate_code(step(GateType::Pct25), 0, 1, true), GateCode::ClockHigh);
        assert_eq!(gate_code(step(GateType::Pct25), 0, 4, true), GateCode::On);
        assert_eq!(gate_code(step(GateType::Pct25), 1, 4, true), GateCode::Off);
    }

    #[test]
    fn trigger_only_on_first_subdivision() {
        let a = step(GateType::Trig);
        assert_eq!(gate_code(a, 0, 4, true), GateCode::TriggerPulse);
        for ppqn in 1..4 {
            assert_eq!(gate_code(a, ppqn, 4, true), GateCode::Off);
        }
    }

    #[test]
    fn half_gate_across_four_pulses() {
        let codes: Vec<GateCode> = (0..4).map(|p| gate_code(step(GateType::Pct50), p, 4, true)).collect();
        assert_eq!(codes, [GateCode::On, GateCode::On, GateCode::Off, GateCode::Off]);
    }

    #[test]
    fn same_inputs_same_code() {
        for gt in GateType::ALL {
            for ppqn in 0..12 {
                assert_eq!(
                    gate_code(step(gt), ppqn, 12, true),
                    gate_code(step(gt), ppqn, 12, true)
                );
            }
        }
    }
}
