//! One track of the sequencer: its stored content and its playback state.
//!
//! A kernel owns a bank of [`MAX_SEQS`] sequences, a song of [`MAX_PHRASES`]
//! phrases and the clock-driven run state that walks them. It performs no
//! I/O and never allocates; randomness comes from the caller.

use pk_ir::{
    split_pitch, Cv2Mode, GateType, Phrase, RunMode, SeqAttributes, SeqCpBuffer, SongCpBuffer,
    StepAttributes, MAX_OFFSET, MAX_PHRASES, MAX_REPS, MAX_SEQS, MAX_STEPS,
};

use crate::config::{KernelConfig, TieMode};
use crate::gate_code::{gate_code, GateCode};
use crate::random::RandomSource;
use crate::traversal::{self, IndexSpace, RunHistory, SongSpace, StepSpace};

/// Pulses-per-step values a track accepts, in knob order.
pub const PULSES_PER_STEP_VALUES: [u8; 13] = [1, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24];
/// Largest clock delay, in pulses.
pub const MAX_DELAY: u8 = 99;
/// Length of a `Trig` gate.
pub const TRIGGER_PULSE_SECONDS: f32 = 0.01;

/// Lowest and highest CV reachable through octave edits.
const MIN_CV: f32 = -3.0;
const MAX_CV: f32 = 4.0;

/// Result of one clock edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClockOutcome {
    #[default]
    NoChange,
    /// A sequence pass (or phrase) completed on this edge.
    PhraseOrSeqBoundary,
    /// The song ended on the stop-at-end track; positions were left unchanged.
    StopRequested,
}

/// Snapshot of a kernel's run position, handed to followers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunPosition {
    pub step_index: usize,
    pub phrase_index: usize,
    /// Whether the last clock edge completed a sequence pass.
    pub step_crossed: bool,
}

/// One sequencer track.
#[derive(Clone, Debug)]
pub struct SequencerKernel {
    id: usize,

    // Content
    pulses_per_step: u8,
    delay: u8,
    run_mode_song: RunMode,
    song_begin: u8,
    song_end: u8,
    cv2_mode: Cv2Mode,
    seq_index_edit: u8,
    phrases: [Phrase; MAX_PHRASES],
    sequences: [SeqAttributes; MAX_SEQS],
    cv: [[f32; MAX_STEPS]; MAX_SEQS],
    attributes: [[StepAttributes; MAX_STEPS]; MAX_SEQS],

    // Run state
    step_index_run: usize,
    step_history: RunHistory,
    phrase_index_run: usize,
    phrase_history: RunHistory,
    ppqn_count: u32,
    ppqn_left_to_skip: u32,
    clock_period: u32,
    gate_code: GateCode,
    last_prob_gate_enable: bool,
    slide_steps_remain: u32,
    slide_cv_delta: f32,
    skip_next_step_advance: bool,
    last_step_crossed: bool,
}

impl SequencerKernel {
    /// A kernel with initialized content, positioned at the start.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            pulses_per_step: 1,
            delay: 0,
            run_mode_song: RunMode::Forward,
            song_begin: 0,
            song_end: 0,
            cv2_mode: Cv2Mode::Volts,
            seq_index_edit: 0,
            phrases: [Phrase::INIT; MAX_PHRASES],
            sequences: [SeqAttributes::INIT; MAX_SEQS],
            cv: [[0.0; MAX_STEPS]; MAX_SEQS],
            attributes: [[StepAttributes::INIT; MAX_STEPS]; MAX_SEQS],
            step_index_run: 0,
            step_history: RunHistory::new(),
            phrase_index_run: 0,
            phrase_history: RunHistory::new(),
            ppqn_count: 0,
            ppqn_left_to_skip: 0,
            clock_period: 0,
            gate_code: GateCode::Off,
            last_prob_gate_enable: true,
            slide_steps_remain: 0,
            slide_cv_delta: 0.0,
            skip_next_step_advance: false,
            last_step_crossed: false,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Reset all content to defaults. Run state is left for `init_run`.
    pub fn init(&mut self) {
        self.pulses_per_step = 1;
        self.delay = 0;
        self.cv2_mode = Cv2Mode::Volts;
        self.seq_index_edit = 0;
        self.init_song();
        for seqn in 0..MAX_SEQS {
            self.init_sequence(seqn);
        }
    }

    pub fn init_sequence(&mut self, seqn: usize) {
        let seqn = clamp_seq(seqn);
        self.sequences[seqn] = SeqAttributes::INIT;
        self.cv[seqn] = [0.0; MAX_STEPS];
        self.attributes[seqn] = [StepAttributes::INIT; MAX_STEPS];
    }

    pub fn init_song(&mut self) {
        self.run_mode_song = RunMode::Forward;
        self.song_begin = 0;
        self.song_end = 0;
        self.phrases = [Phrase::INIT; MAX_PHRASES];
    }

    // --- Content accessors ---

    pub fn cv(&self, seqn: usize, stepn: usize) -> f32 {
        self.cv[clamp_seq(seqn)][clamp_step(stepn)]
    }

    pub fn set_cv(&mut self, seqn: usize, stepn: usize, cv: f32) {
        self.cv[clamp_seq(seqn)][clamp_step(stepn)] = cv;
    }

    pub fn attributes(&self, seqn: usize, stepn: usize) -> StepAttributes {
        self.attributes[clamp_seq(seqn)][clamp_step(stepn)]
    }

    pub fn set_attributes(&mut self, seqn: usize, stepn: usize, attributes: StepAttributes) {
        self.attributes[clamp_seq(seqn)][clamp_step(stepn)] = attributes;
    }

    pub fn seq_attributes(&self, seqn: usize) -> SeqAttributes {
        self.sequences[clamp_seq(seqn)]
    }

    pub fn set_seq_attributes(&mut self, seqn: usize, attributes: SeqAttributes) {
        self.sequences[clamp_seq(seqn)] = attributes;
    }

    pub fn phrase(&self, phrn: usize) -> Phrase {
        self.phrases[clamp_phrase(phrn)]
    }

    pub fn set_phrase(&mut self, phrn: usize, phrase: Phrase) {
        self.phrases[clamp_phrase(phrn)] = phrase;
    }

    pub fn phrases(&self) -> &[Phrase; MAX_PHRASES] {
        &self.phrases
    }

    pub fn length(&self, seqn: usize) -> usize {
        self.seq_attributes(seqn).length() as usize
    }

    pub fn pulses_per_step(&self) -> u8 {
        self.pulses_per_step
    }

    /// Set pulses per step, snapping to the nearest accepted value.
    pub fn set_pulses_per_step(&mut self, pps: u8) {
        self.pulses_per_step = match pps {
            0 | 1 => 1,
            n => (n.min(24) + 1) & !1,
        };
    }

    /// Move through [`PULSES_PER_STEP_VALUES`], saturating at both ends.
    pub fn mod_pulses_per_step(&mut self, delta: i32) {
        let current = PULSES_PER_STEP_VALUES
            .iter()
            .position(|&v| v >= self.pulses_per_step)
            .unwrap_or(PULSES_PER_STEP_VALUES.len() - 1);
        let i = (current as i32 + delta).clamp(0, PULSES_PER_STEP_VALUES.len() as i32 - 1);
        self.pulses_per_step = PULSES_PER_STEP_VALUES[i as usize];
    }

    pub fn delay(&self) -> u8 {
        self.delay
    }

    pub fn set_delay(&mut self, delay: u8) {
        self.delay = delay.min(MAX_DELAY);
    }

    pub fn mod_delay(&mut self, delta: i32) {
        self.delay = (self.delay as i32 + delta).clamp(0, MAX_DELAY as i32) as u8;
    }

    pub fn cv2_mode(&self) -> Cv2Mode {
        self.cv2_mode
    }

    pub fn set_cv2_mode(&mut self, mode: Cv2Mode) {
        self.cv2_mode = mode;
    }

    pub fn seq_index_edit(&self) -> usize {
        self.seq_index_edit as usize
    }

    pub fn set_seq_index_edit(&mut self, seqn: usize) {
        self.seq_index_edit = clamp_seq(seqn) as u8;
    }

    pub fn run_mode_song(&self) -> RunMode {
        self.run_mode_song
    }

    pub fn set_run_mode_song(&mut self, mode: RunMode) {
        self.run_mode_song = mode;
    }

    pub fn song_begin(&self) -> usize {
        self.song_begin as usize
    }

    pub fn song_end(&self) -> usize {
        self.song_end as usize
    }

    /// Move the song start; the end is dragged along if it would precede it.
    pub fn set_begin(&mut self, phrn: usize) {
        let phrn = clamp_phrase(phrn) as u8;
        self.song_begin = phrn;
        self.song_end = self.song_end.max(phrn);
    }

    /// Move the song end; the start is dragged along if it would follow it.
    pub fn set_end(&mut self, phrn: usize) {
        let phrn = clamp_phrase(phrn) as u8;
        self.song_end = phrn;
        self.song_begin = self.song_begin.min(phrn);
    }

    /// Restore a saved begin/end pair without dragging.
    pub fn set_song_window(&mut self, begin: usize, end: usize) {
        let begin = clamp_phrase(begin);
        let end = clamp_phrase(end).max(begin);
        self.song_begin = begin as u8;
        self.song_end = end as u8;
    }

    // --- Run state accessors ---

    pub fn step_index_run(&self) -> usize {
        self.step_index_run
    }

    pub fn phrase_index_run(&self) -> usize {
        self.phrase_index_run
    }

    pub fn gate_code(&self) -> GateCode {
        self.gate_code
    }

    pub fn ppqn_count(&self) -> u32 {
        self.ppqn_count
    }

    pub fn slide_steps_remain(&self) -> u32 {
        self.slide_steps_remain
    }

    pub fn slide_cv_delta(&self) -> f32 {
        self.slide_cv_delta
    }

    pub fn run_position(&self) -> RunPosition {
        RunPosition {
            step_index: self.step_index_run,
            phrase_index: self.phrase_index_run,
            step_crossed: self.last_step_crossed,
        }
    }

    /// Sequence currently played: the edited one, or the current phrase's.
    pub fn seq_index_run(&self, editing: bool) -> usize {
        if editing {
            self.seq_index_edit as usize
        } else {
            clamp_seq(self.phrases[clamp_phrase(self.phrase_index_run)].seq_num() as usize)
        }
    }

    pub fn length_run(&self, editing: bool) -> usize {
        self.length(self.seq_index_run(editing))
    }

    pub fn cv_run(&self, editing: bool) -> f32 {
        self.cv[self.seq_index_run(editing)][clamp_step(self.step_index_run)]
    }

    pub fn attributes_run(&self, editing: bool) -> StepAttributes {
        self.attributes[self.seq_index_run(editing)][clamp_step(self.step_index_run)]
    }

    // --- Per-sample output ---

    /// Remaining slide distance, subtracted from the target CV.
    pub fn slide_offset(&self) -> f32 {
        if self.slide_steps_remain > 0 {
            self.slide_cv_delta * self.slide_steps_remain as f32
        } else {
            0.0
        }
    }

    /// Pitch CV including any slide in progress.
    pub fn cv_output(&self, editing: bool) -> f32 {
        self.cv_run(editing) - self.slide_offset()
    }

    /// Gate output level. `clock_high` is the current level of the incoming clock.
    pub fn gate_output(&self, clock_high: bool, sample_rate: f32) -> bool {
        if self.ppqn_left_to_skip != 0 {
            return false;
        }
        match self.gate_code {
            GateCode::Off => false,
            GateCode::On => true,
            GateCode::ClockHigh => clock_high,
            GateCode::TriggerPulse => (self.clock_period as f32) < sample_rate * TRIGGER_PULSE_SECONDS,
        }
    }

    /// CV2 output voltage for the current step's velocity.
    pub fn velocity_output(&self, editing: bool) -> f32 {
        self.cv2_mode.to_volts(self.attributes_run(editing).velocity())
    }

    /// Advance per-sample counters. Call once per audio sample.
    pub fn process(&mut self) {
        self.clock_period = self.clock_period.saturating_add(1);
        if self.slide_steps_remain > 0 {
            self.slide_steps_remain -= 1;
        }
    }

    // --- Run control ---

    /// Place the run state at the start of the song (or edited sequence).
    ///
    /// `master` is the first track's position, consulted by tracks that
    /// follow it.
    pub fn init_run<R: RandomSource>(
        &mut self,
        editing: bool,
        master: Option<&RunPosition>,
        rng: &mut R,
    ) {
        self.init_phrase_run(master);
        self.init_step_run(editing, master);
        self.ppqn_count = 0;
        self.ppqn_left_to_skip = self.delay as u32;
        self.skip_next_step_advance = false;
        self.last_step_crossed = false;
        self.calc_gate_code(editing, rng);
        self.slide_steps_remain = 0;
        self.clock_period = 0;
    }

    fn init_phrase_run(&mut self, master: Option<&RunPosition>) {
        self.phrase_history.clear();
        self.phrase_index_run = match (self.follows_song(), master) {
            (true, Some(m)) => clamp_phrase(m.phrase_index),
            _ => {
                let space = SongSpace::new(&self.phrases, self.song_begin as usize, self.song_end as usize);
                traversal::init_index(&space, self.run_mode_song)
            }
        };
    }

    fn init_step_run(&mut self, editing: bool, master: Option<&RunPosition>) {
        self.step_history.clear();
        let seq = self.sequences[self.seq_index_run(editing)];
        let len = seq.length() as usize;
        self.step_index_run = match (seq.run_mode(), master) {
            (RunMode::FollowTrackA, Some(m)) => m.step_index % len,
            (mode, _) => traversal::init_index(&StepSpace::new(len), mode),
        };
    }

    fn follows_song(&self) -> bool {
        self.id != 0 && self.run_mode_song == RunMode::FollowTrackA
    }

    /// Jump to the first track's phrase after it crossed a phrase boundary.
    ///
    /// The step run restarts and the next clock's step advance is skipped so
    /// the new phrase starts on its first step.
    pub fn follow_phrase(&mut self, master: &RunPosition, editing: bool) {
        self.phrase_index_run = clamp_phrase(master.phrase_index);
        self.phrase_history.clear();
        self.init_step_run(editing, Some(master));
        self.skip_next_step_advance = true;
    }

    /// Process one incoming clock edge.
    ///
    /// `delayed_seq` is a pending sequence change for sequence mode; it is
    /// consumed when the current sequence completes.
    pub fn clock_step<R: RandomSource>(
        &mut self,
        editing: bool,
        delayed_seq: &mut Option<u8>,
        master: Option<&RunPosition>,
        config: &KernelConfig,
        rng: &mut R,
    ) -> ClockOutcome {
        let skip_advance = core::mem::take(&mut self.skip_next_step_advance);
        self.last_step_crossed = false;

        if self.ppqn_left_to_skip > 0 {
            self.ppqn_left_to_skip -= 1;
            self.clock_period = 0;
            return ClockOutcome::NoChange;
        }

        let mut outcome = ClockOutcome::NoChange;
        self.ppqn_count += 1;
        if self.ppqn_count >= self.pulses_per_step as u32 {
            self.ppqn_count = 0;
        }

        if self.ppqn_count == 0 {
            let slide_from = self.cv_run(editing);
            let saved_step = (self.step_index_run, self.step_history);

            let crossed = !skip_advance && self.advance_step(editing, master, rng);
            self.last_step_crossed = crossed;

            if crossed {
                let stops = config.stop_at_end.matches(self.id);
                if editing {
                    if stops && config.stop_while_editing {
                        (self.step_index_run, self.step_history) = saved_step;
                        self.clock_period = 0;
                        log::debug!(target: "engine::kernel", "track {} stopped at end of sequence", self.id);
                        return ClockOutcome::StopRequested;
                    }
                    // The looped sequence only restarts when it changes.
                    if let Some(seqn) = delayed_seq.take() {
                        self.seq_index_edit = clamp_seq(seqn as usize) as u8;
                        self.init_step_run(editing, master);
                    }
                } else {
                    let saved_phrase = (self.phrase_index_run, self.phrase_history);
                    let song_ended = self.advance_phrase(rng);
                    if song_ended && stops {
                        (self.phrase_index_run, self.phrase_history) = saved_phrase;
                        (self.step_index_run, self.step_history) = saved_step;
                        self.clock_period = 0;
                        log::debug!(target: "engine::kernel", "track {} stopped at end of song", self.id);
                        return ClockOutcome::StopRequested;
                    }
                    self.init_step_run(editing, master);
                }
                outcome = ClockOutcome::PhraseOrSeqBoundary;
            }

            let attributes = self.attributes_run(editing);
            if attributes.slide() {
                let steps = self.clock_period as f32
                    * self.pulses_per_step as f32
                    * attributes.slide_val() as f32
                    / 100.0;
                self.slide_steps_remain = steps as u32;
                if self.slide_steps_remain != 0 {
                    self.slide_cv_delta =
                        (self.cv_run(editing) - slide_from) / self.slide_steps_remain as f32;
                }
            } else {
                self.slide_steps_remain = 0;
            }
        }

        self.calc_gate_code(editing, rng);
        self.clock_period = 0;
        outcome
    }

    /// Move the step index once; true when the sequence's passes completed.
    fn advance_step<R: RandomSource>(
        &mut self,
        editing: bool,
        master: Option<&RunPosition>,
        rng: &mut R,
    ) -> bool {
        let seq = self.sequences[self.seq_index_run(editing)];
        let len = seq.length() as usize;
        let reps = if editing {
            1
        } else {
            self.phrases[clamp_phrase(self.phrase_index_run)].reps().max(1) as u32
        };

        match (seq.run_mode(), master) {
            (RunMode::FollowTrackA, Some(m)) => {
                self.step_index_run = m.step_index % len;
                m.step_crossed
            }
            (mode, _) => traversal::advance(
                &mut self.step_index_run,
                &StepSpace::new(len),
                mode,
                reps,
                &mut self.step_history,
                rng,
            ),
        }
    }

    /// Move the phrase index once; true when the song completed.
    fn advance_phrase<R: RandomSource>(&mut self, rng: &mut R) -> bool {
        if self.follows_song() {
            return false;
        }
        let space = SongSpace::new(&self.phrases, self.song_begin as usize, self.song_end as usize);
        traversal::advance(
            &mut self.phrase_index_run,
            &space,
            self.run_mode_song,
            1,
            &mut self.phrase_history,
            rng,
        )
    }

    fn calc_gate_code<R: RandomSource>(&mut self, editing: bool, rng: &mut R) {
        let attributes = self.attributes_run(editing);
        if self.ppqn_count == 0 && !attributes.tied() {
            self.last_prob_gate_enable = !attributes.gate_prob()
                || rng.next_unit() < attributes.gate_prob_val() as f32 / 100.0;
        }
        self.gate_code = gate_code(
            attributes,
            self.ppqn_count,
            self.pulses_per_step as u32,
            self.last_prob_gate_enable,
        );
    }

    // --- Step edits ---

    /// Write `cv` into `count` steps from `stepn`, carrying it through tied runs.
    /// Tied steps are never written directly; they inherit from their head.
    pub fn write_cv(&mut self, seqn: usize, stepn: usize, cv: f32, count: usize) {
        let seqn = clamp_seq(seqn);
        let end = (stepn + count.max(1)).min(MAX_STEPS);
        for i in stepn..end {
            if self.attributes[seqn][i].tied() {
                continue;
            }
            self.cv[seqn][i] = cv;
            self.propagate_cv_to_tied(seqn, i);
        }
    }

    /// Copy step `stepn`'s CV into every tied step that follows it.
    fn propagate_cv_to_tied(&mut self, seqn: usize, stepn: usize) {
        for i in stepn + 1..MAX_STEPS {
            if !self.attributes[seqn][i].tied() {
                break;
            }
            self.cv[seqn][i] = self.cv[seqn][i - 1];
        }
    }

    /// Keep the semitone of step `stepn`, move it to `octave` (relative to C4).
    /// Returns the written CV, or `None` if it would leave the playable range.
    pub fn apply_new_octave(&mut self, seqn: usize, stepn: usize, octave: i32, count: usize) -> Option<f32> {
        let (_, semitone) = split_pitch(self.cv(seqn, stepn));
        let cv = octave as f32 + semitone as f32 / 12.0;
        if !(MIN_CV..MAX_CV).contains(&cv) {
            return None;
        }
        self.write_cv(seqn, stepn, cv, count);
        Some(cv)
    }

    /// Keep the octave of step `stepn`, set its semitone to `key` (0..12).
    pub fn apply_new_key(&mut self, seqn: usize, stepn: usize, key: u8, count: usize) -> f32 {
        let (octave, _) = split_pitch(self.cv(seqn, stepn));
        let cv = octave as f32 + key.min(11) as f32 / 12.0;
        self.write_cv(seqn, stepn, cv, count);
        cv
    }

    /// Tie `stepn` to its predecessor.
    pub fn activate_tied_step(&mut self, seqn: usize, stepn: usize, mode: TieMode) {
        let seqn = clamp_seq(seqn);
        let stepn = clamp_step(stepn);
        let steps = &mut self.attributes[seqn];

        if mode == TieMode::Legacy && stepn > 0 {
            steps[stepn] = steps[stepn - 1];
        }
        steps[stepn].set_tied(true);

        if mode == TieMode::Hold {
            steps[stepn].set_gate(true);
            for i in stepn.max(1)..MAX_STEPS {
                if !steps[i].tied() {
                    break;
                }
                let gate_type = steps[i - 1].gate_type();
                steps[i].set_gate_type(gate_type);
                steps[i - 1].set_gate_type(GateType::Full);
                steps[i - 1].set_gate(true);
            }
        }

        if stepn > 0 {
            self.propagate_cv_to_tied(seqn, stepn - 1);
        }
    }

    /// Untie `stepn` from its predecessor.
    pub fn deactivate_tied_step(&mut self, seqn: usize, stepn: usize, mode: TieMode) {
        let seqn = clamp_seq(seqn);
        let stepn = clamp_step(stepn);
        let steps = &mut self.attributes[seqn];
        steps[stepn].set_tied(false);

        if mode == TieMode::Hold && stepn > 0 {
            let mut gate_type = steps[stepn].gate_type();
            for step in &steps[stepn + 1..] {
                if !step.tied() {
                    break;
                }
                gate_type = step.gate_type();
            }
            steps[stepn - 1].set_gate_type(gate_type);
        }
    }

    pub fn toggle_tied(&mut self, seqn: usize, stepn: usize, mode: TieMode) -> bool {
        if self.attributes(seqn, stepn).tied() {
            self.deactivate_tied_step(seqn, stepn, mode);
            false
        } else {
            self.activate_tied_step(seqn, stepn, mode);
            true
        }
    }

    // --- Sequence edits ---

    pub fn set_length(&mut self, seqn: usize, length: usize) {
        self.sequences[clamp_seq(seqn)].set_length(length.min(MAX_STEPS) as u8);
    }

    pub fn mod_length(&mut self, seqn: usize, delta: i32) -> usize {
        let len = (self.length(seqn) as i32 + delta).clamp(1, MAX_STEPS as i32) as usize;
        self.set_length(seqn, len);
        len
    }

    pub fn set_run_mode_seq(&mut self, seqn: usize, mode: RunMode) {
        self.sequences[clamp_seq(seqn)].set_run_mode(mode);
    }

    /// Shift every step of `seqn` by `delta` semitones.
    ///
    /// The stored offset saturates at ±99; only the part of `delta` that
    /// fits is applied, so an untranspose always restores the pitches.
    pub fn transpose_seq(&mut self, seqn: usize, delta: i32) -> i32 {
        let seqn = clamp_seq(seqn);
        let old = self.sequences[seqn].transpose();
        let new = (old + delta).clamp(-MAX_OFFSET, MAX_OFFSET);
        let applied = new - old;
        self.sequences[seqn].set_transpose(new);
        let offset = applied as f32 / 12.0;
        for cv in self.cv[seqn].iter_mut() {
            *cv += offset;
        }
        applied
    }

    pub fn untranspose_seq(&mut self, seqn: usize) {
        let t = self.seq_attributes(seqn).transpose();
        self.transpose_seq(seqn, -t);
    }

    /// Rotate the first `length` steps of `seqn` by `delta`; positive moves right.
    pub fn rotate_seq(&mut self, seqn: usize, delta: i32) -> i32 {
        let seqn = clamp_seq(seqn);
        let old = self.sequences[seqn].rotate();
        let new = (old + delta).clamp(-MAX_OFFSET, MAX_OFFSET);
        let applied = new - old;
        self.sequences[seqn].set_rotate(new);

        let len = self.sequences[seqn].length() as usize;
        let shift = applied.rem_euclid(len as i32) as usize;
        self.cv[seqn][..len].rotate_right(shift);
        self.attributes[seqn][..len].rotate_right(shift);
        applied
    }

    pub fn unrotate_seq(&mut self, seqn: usize) {
        let r = self.seq_attributes(seqn).rotate();
        self.rotate_seq(seqn, -r);
    }

    // --- Clipboard ---

    /// Capture up to `count` steps of `seqn` from `start`, plus its attributes.
    pub fn copy_sequence(&self, buf: &mut SeqCpBuffer, seqn: usize, start: usize, count: usize) {
        let seqn = clamp_seq(seqn);
        let start = start.min(MAX_STEPS);
        let count = count.min(MAX_STEPS - start);
        buf.steps.clear();
        for i in start..start + count {
            buf.steps.push((self.cv[seqn][i], self.attributes[seqn][i]));
        }
        buf.seq_attributes = self.sequences[seqn];
    }

    /// Write `buf` into `seqn` from `start`, truncating at the sequence end.
    /// A whole-sequence capture also restores the sequence attributes.
    pub fn paste_sequence(&mut self, buf: &SeqCpBuffer, seqn: usize, start: usize) {
        let seqn = clamp_seq(seqn);
        let start = start.min(MAX_STEPS);
        for (i, &(cv, attributes)) in buf.steps.iter().take(MAX_STEPS - start).enumerate() {
            self.cv[seqn][start + i] = cv;
            self.attributes[seqn][start + i] = attributes;
        }
        if buf.is_whole_sequence() {
            self.sequences[seqn] = buf.seq_attributes;
        }
    }

    pub fn copy_song(&self, buf: &mut SongCpBuffer, start: usize, count: usize) {
        let start = start.min(MAX_PHRASES);
        let count = count.min(MAX_PHRASES - start);
        buf.phrases.clear();
        buf.phrases.extend(self.phrases[start..start + count].iter().copied());
        buf.begin = self.song_begin;
        buf.end = self.song_end;
        buf.run_mode = self.run_mode_song;
    }

    pub fn paste_song(&mut self, buf: &SongCpBuffer, start: usize) {
        let start = start.min(MAX_PHRASES);
        for (i, &phrase) in buf.phrases.iter().take(MAX_PHRASES - start).enumerate() {
            self.phrases[start + i] = phrase;
        }
        if buf.is_whole_song() {
            self.set_song_window(buf.begin as usize, buf.end as usize);
            self.run_mode_song = buf.run_mode;
        }
    }

    // --- Phrase edits ---

    pub fn set_phrase_seq_num(&mut self, phrn: usize, seqn: usize) {
        self.phrases[clamp_phrase(phrn)].set_seq_num(clamp_seq(seqn) as u8);
    }

    pub fn mod_phrase_reps(&mut self, phrn: usize, delta: i32) -> u8 {
        let phrase = &mut self.phrases[clamp_phrase(phrn)];
        let reps = (phrase.reps() as i32 + delta).clamp(0, MAX_REPS as i32) as u8;
        phrase.set_reps(reps);
        reps
    }

    // --- Randomization ---

    /// Fill `seqn` with random pitches (two octaves around C4) and gates.
    pub fn randomize_sequence<R: RandomSource>(&mut self, seqn: usize, rng: &mut R) {
        let seqn = clamp_seq(seqn);
        for stepn in 0..MAX_STEPS {
            self.cv[seqn][stepn] = (rng.next_u32() % 49) as f32 / 12.0 - 2.0;
            let mut attributes = StepAttributes::INIT;
            attributes.set_gate(rng.next_u32() % 2 == 0);
            attributes.set_gate_type(GateType::from_index((rng.next_u32() % 6) as u8));
            attributes.set_slide(rng.next_u32() % 8 == 0);
            self.attributes[seqn][stepn] = attributes;
        }
        self.sequences[seqn] = SeqAttributes::new(
            (1 + rng.next_u32() % MAX_STEPS as u32) as u8,
            RunMode::from_index((rng.next_u32() % 6) as u8),
        );
    }

    /// Fill the song with random phrases over the first eight sequences.
    pub fn randomize_song<R: RandomSource>(&mut self, rng: &mut R) {
        for phrase in self.phrases.iter_mut() {
            *phrase = Phrase::new((rng.next_u32() % 8) as u8, (1 + rng.next_u32() % 4) as u8);
        }
        let end = (rng.next_u32() % 16) as usize;
        self.set_song_window(0, end);
    }

    /// Whether playback can progress at all: some phrase in the song window
    /// has a non-zero repeat count.
    pub fn song_is_playable(&self) -> bool {
        SongSpace::new(&self.phrases, self.song_begin as usize, self.song_end as usize).count() > 0
    }
}

fn clamp_seq(seqn: usize) -> usize {
    seqn.min(MAX_SEQS - 1)
}

fn clamp_step(stepn: usize) -> usize {
    stepn.min(MAX_STEPS - 1)
}

fn clamp_phrase(phrn: usize) -> usize {
    phrn.min(MAX_PHRASES - 1)
}
