//! Edit commands for mutating sequencer data during playback.
//!
//! Every discrete panel operation (button, knob detent or CV-triggered edit)
//! has one variant. Hosts that confine the sequencer to the realtime thread
//! queue these and apply them between samples. `multi` fans the edit out to
//! every track, using the value computed on the edited track.

use crate::clipboard::CopyRange;
use crate::cv2::Cv2Mode;
use crate::gate::GateType;
use crate::run_mode::RunMode;

/// An edit command that mutates sequencer data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Edit {
    // --- Edit cursor ---
    SelectTrack(u8),
    SelectStep(u8),
    MoveStep(i8),
    SelectPhrase(u8),
    MovePhrase(i8),
    /// Change the sequence being edited (and played, in sequence mode) immediately.
    SelectSequence { seq: u8, multi: bool },
    /// Change a track's sequence once its current pass completes.
    RequestSequence { track: u8, seq: u8 },

    // --- Step pitch ---
    /// Write a CV into `count` consecutive steps starting at the cursor.
    WriteCv { cv: f32, count: u8, multi: bool },
    /// Keep the semitone, set the octave (offset from C4, -3..=3).
    SetOctave { octave: i8, count: u8, multi: bool },
    /// Keep the octave, set the semitone (0..12).
    SetKey { key: u8, count: u8, multi: bool },

    // --- Step attributes ---
    ToggleGate { multi: bool },
    ToggleGateProb { multi: bool },
    ToggleSlide { multi: bool },
    ToggleTied { multi: bool },
    SetGateType { gate_type: GateType, multi: bool },
    ModVelocity { delta: i16, multi: bool },
    ModGateProb { delta: i8, multi: bool },
    ModSlide { delta: i8, multi: bool },

    // --- Sequence attributes ---
    ModLength { delta: i8, multi: bool },
    SetSeqRunMode { mode: RunMode, multi: bool },
    Transpose { delta: i8, multi: bool },
    Untranspose { multi: bool },
    Rotate { delta: i8, multi: bool },
    Unrotate { multi: bool },
    InitSequence { multi: bool },
    RandomizeSequence { multi: bool },

    // --- Song ---
    SetPhraseSeq { seq: u8, multi: bool },
    ModPhraseReps { delta: i8, multi: bool },
    SetSongBegin { multi: bool },
    SetSongEnd { multi: bool },
    SetSongRunMode { mode: RunMode, multi: bool },
    InitSong { multi: bool },
    RandomizeSong { multi: bool },

    // --- Track settings ---
    ModPulsesPerStep { delta: i8, multi: bool },
    ModDelay { delta: i8, multi: bool },
    SetCv2Mode { mode: Cv2Mode, multi: bool },

    // --- Clipboard ---
    CopySequence(CopyRange),
    PasteSequence,
    CopySong(CopyRange),
    PasteSong,
}
