//! Sequencing engine for phrasekit.
//!
//! Drives the per-track [`SequencerKernel`]s from an external clock and turns
//! their state into per-sample CV/gate values. Nothing here allocates or
//! performs I/O, so a host may call it from a realtime audio callback.

#![cfg_attr(not(feature = "std"), no_std)]

mod config;
mod frame;
mod gate_code;
mod kernel;
mod random;
mod sequencer;
pub mod traversal;

pub use config::{KernelConfig, StopAtEnd, TieMode};
pub use frame::{Frame, TrackOutput, CHANNELS_PER_TRACK};
pub use gate_code::{gate_code, GateCode};
pub use kernel::{
    ClockOutcome, RunPosition, SequencerKernel, MAX_DELAY, PULSES_PER_STEP_VALUES,
    TRIGGER_PULSE_SECONDS,
};
pub use random::{FixedRandom, RandomSource, ScriptedRandom};
pub use sequencer::{Sequencer, EDIT_GATE_SECONDS};
