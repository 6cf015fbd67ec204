//! Core value types for the phrasekit sequencer.
//!
//! This crate defines the data the sequencing engine stores and the save-file
//! layer persists: bit-packed step, sequence and phrase records, run modes,
//! gate-pattern tables and copy/paste buffers. Every record is a plain `Copy`
//! value whose raw bit pattern is the on-disk representation.
//!
//! Designed to be `no_std` compatible.

#![cfg_attr(not(feature = "std"), no_std)]

mod clipboard;
mod cv2;
mod edit;
mod gate;
mod phrase;
mod pitch;
mod run_mode;
mod seq;
mod step;

pub use clipboard::{CopyRange, SeqCpBuffer, SongCpBuffer};
pub use cv2::Cv2Mode;
pub use edit::Edit;
pub use gate::{GateType, GATE_PATTERN_BITS, NUM_GATE_TYPES};
pub use phrase::Phrase;
pub use pitch::{note_name, quantize_semitone, split_pitch, OCTAVE_OFFSET};
pub use run_mode::{RunMode, NUM_RUN_MODES};
pub use seq::{SeqAttributes, MAX_OFFSET};
pub use step::{StepAttributes, INIT_GATE_PROB, INIT_SLIDE, INIT_VELOCITY, MAX_VELOCITY};

/// Steps per sequence.
pub const MAX_STEPS: usize = 32;
/// Sequences in each track's bank.
pub const MAX_SEQS: usize = 64;
/// Phrase slots in each track's song.
pub const MAX_PHRASES: usize = 99;
/// Tracks driven by one multi-track sequencer.
pub const MAX_TRACKS: usize = 4;
/// Largest repeat count a phrase can hold.
pub const MAX_REPS: u8 = 99;
