//! Bank files: every track's sequences, song and settings.
//!
//! Layout (little-endian): magic `PKSQ`, u16 version, module settings, then
//! one record per track. Step, sequence and phrase records are stored as
//! their packed bit patterns. Counts precede every list, so a file written
//! with fewer phrases or sequences than the current maximum still loads; the
//! missing slots keep their defaults.

use std::io::Cursor;

use binrw::{binrw, BinRead, BinWrite};
use pk_engine::{KernelConfig, RandomSource, Sequencer, SequencerKernel, StopAtEnd, TieMode};
use pk_ir::{
    Cv2Mode, Phrase, RunMode, SeqAttributes, StepAttributes, MAX_PHRASES, MAX_SEQS, MAX_STEPS,
    MAX_TRACKS,
};

use crate::FormatError;

/// First four bytes of every bank.
pub const BANK_MAGIC: &[u8; 4] = b"PKSQ";
/// Format version written by this build.
pub const BANK_VERSION: u16 = 1;

#[binrw]
#[brw(little, magic = b"PKSQ")]
#[derive(Debug)]
struct BankHeader {
    version: u16,
}

/// One step: pitch CV and packed attributes.
#[binrw]
#[brw(little)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepRecord {
    pub cv: f32,
    pub attributes: u32,
}

#[binrw]
#[brw(little)]
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceRecord {
    pub attributes: u32,
    #[br(temp)]
    #[bw(calc = steps.len() as u8)]
    num_steps: u8,
    #[br(count = num_steps)]
    pub steps: Vec<StepRecord>,
}

#[binrw]
#[brw(little)]
#[derive(Clone, Debug, PartialEq)]
pub struct TrackRecord {
    pub pulses_per_step: u8,
    pub delay: u8,
    pub run_mode_song: u8,
    pub song_begin: u8,
    pub song_end: u8,
    pub cv2_mode: u8,
    pub seq_index_edit: u8,
    #[br(temp)]
    #[bw(calc = phrases.len() as u8)]
    num_phrases: u8,
    #[br(count = num_phrases)]
    pub phrases: Vec<u16>,
    #[br(temp)]
    #[bw(calc = sequences.len() as u8)]
    num_sequences: u8,
    #[br(count = num_sequences)]
    pub sequences: Vec<SequenceRecord>,
}

/// Decoded bank body.
#[binrw]
#[brw(little)]
#[derive(Clone, Debug, PartialEq)]
pub struct Bank {
    pub tie_mode: u8,
    pub stop_at_end: u8,
    pub stop_while_editing: u8,
    #[br(temp)]
    #[bw(calc = tracks.len() as u8)]
    num_tracks: u8,
    #[br(count = num_tracks)]
    pub tracks: Vec<TrackRecord>,
}

impl TrackRecord {
    pub fn from_kernel(k: &SequencerKernel) -> Self {
        Self {
            pulses_per_step: k.pulses_per_step(),
            delay: k.delay(),
            run_mode_song: k.run_mode_song().index(),
            song_begin: k.song_begin() as u8,
            song_end: k.song_end() as u8,
            cv2_mode: k.cv2_mode() as u8,
            seq_index_edit: k.seq_index_edit() as u8,
            phrases: k.phrases().iter().map(|p| p.bits()).collect(),
            sequences: (0..MAX_SEQS)
                .map(|seqn| SequenceRecord {
                    attributes: k.seq_attributes(seqn).bits(),
                    steps: (0..MAX_STEPS)
                        .map(|stepn| StepRecord {
                            cv: k.cv(seqn, stepn),
                            attributes: k.attributes(seqn, stepn).bits(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    fn validate(&self) -> Result<(), FormatError> {
        check_count("phrases", self.phrases.len(), MAX_PHRASES)?;
        check_count("sequences", self.sequences.len(), MAX_SEQS)?;
        for seq in &self.sequences {
            check_count("steps", seq.steps.len(), MAX_STEPS)?;
        }
        Ok(())
    }

    /// Replace `k`'s content with this record. Slots absent from the record
    /// are reset to defaults; non-finite pitches load as 0 V.
    pub fn apply_to(&self, k: &mut SequencerKernel) {
        k.init();
        k.set_pulses_per_step(self.pulses_per_step);
        k.set_delay(self.delay);
        k.set_run_mode_song(RunMode::from_index(self.run_mode_song));
        k.set_song_window(self.song_begin as usize, self.song_end as usize);
        k.set_cv2_mode(Cv2Mode::from_index(self.cv2_mode));
        k.set_seq_index_edit(self.seq_index_edit as usize);
        for (phrn, &bits) in self.phrases.iter().enumerate() {
            k.set_phrase(phrn, Phrase::from_bits(bits));
        }
        for (seqn, seq) in self.sequences.iter().enumerate() {
            k.set_seq_attributes(seqn, SeqAttributes::from_bits(seq.attributes));
            for (stepn, step) in seq.steps.iter().enumerate() {
                let cv = if step.cv.is_finite() { step.cv } else { 0.0 };
                k.set_cv(seqn, stepn, cv);
                k.set_attributes(seqn, stepn, StepAttributes::from_bits(step.attributes));
            }
        }
    }
}

fn check_count(what: &'static str, count: usize, max: usize) -> Result<(), FormatError> {
    if count > max {
        return Err(FormatError::TooMany { what, count, max });
    }
    Ok(())
}

impl Bank {
    /// Snapshot every track of `seq`.
    pub fn from_sequencer<R: RandomSource>(seq: &Sequencer<R>) -> Self {
        let config = seq.config();
        Self {
            tie_mode: match config.tie_mode {
                TieMode::Hold => 0,
                TieMode::Legacy => 1,
            },
            stop_at_end: config.stop_at_end.to_index(),
            stop_while_editing: config.stop_while_editing as u8,
            tracks: seq.kernels().iter().map(TrackRecord::from_kernel).collect(),
        }
    }

    pub fn config(&self) -> KernelConfig {
        KernelConfig {
            tie_mode: if self.tie_mode == 0 { TieMode::Hold } else { TieMode::Legacy },
            stop_at_end: StopAtEnd::from_index(self.stop_at_end),
            stop_while_editing: self.stop_while_editing != 0,
        }
    }

    fn validate(&self) -> Result<(), FormatError> {
        check_count("tracks", self.tracks.len(), MAX_TRACKS)?;
        self.tracks.iter().try_for_each(TrackRecord::validate)
    }

    /// Decode a bank, checking magic, version and record counts.
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        let mut cursor = Cursor::new(data);
        let header = BankHeader::read(&mut cursor)?;
        if header.version != BANK_VERSION {
            return Err(FormatError::UnsupportedVersion(header.version));
        }
        let bank = Bank::read(&mut cursor)?;
        bank.validate()?;

        let trailing = data.len() as u64 - cursor.position();
        if trailing > 0 {
            log::warn!(target: "formats::bank", "ignoring {trailing} trailing bytes");
        }
        Ok(bank)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut cursor = Cursor::new(Vec::new());
        BankHeader { version: BANK_VERSION }.write(&mut cursor)?;
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Load into `seq`. Tracks beyond the sequencer's count are dropped;
    /// sequencer tracks missing from the bank are reset to defaults.
    pub fn apply<R: RandomSource>(&self, seq: &mut Sequencer<R>) {
        if self.tracks.len() > seq.num_tracks() {
            log::warn!(
                target: "formats::bank",
                "bank has {} tracks, sequencer has {}; extra tracks dropped",
                self.tracks.len(),
                seq.num_tracks()
            );
        }
        seq.set_config(self.config());
        for t in 0..seq.num_tracks() {
            let Some(k) = seq.kernel_mut(t) else { continue };
            match self.tracks.get(t) {
                Some(record) => record.apply_to(k),
                None => k.init(),
            }
        }
    }
}

/// Serialize every track of `seq` as a bank file.
pub fn save_bank<R: RandomSource>(seq: &Sequencer<R>) -> Result<Vec<u8>, FormatError> {
    let bytes = Bank::from_sequencer(seq).to_bytes()?;
    log::debug!(target: "formats::bank", "saved {} tracks, {} bytes", seq.num_tracks(), bytes.len());
    Ok(bytes)
}

/// Parse `data` and replace `seq`'s content with it. Nothing is modified
/// unless the whole file decodes.
pub fn load_bank<R: RandomSource>(data: &[u8], seq: &mut Sequencer<R>) -> Result<(), FormatError> {
    let bank = Bank::parse(data)?;
    bank.apply(seq);
    log::debug!(target: "formats::bank", "loaded {} tracks", bank.tracks.len());
    Ok(())
}
