//! Multi-track sequencer: kernels plus the shared edit cursor.
//!
//! The sequencer owns one [`SequencerKernel`] per track, the edit cursor
//! (track, step, phrase), the copy/paste buffers and the random source. Edits
//! target the cursor's track; with `multi` set they fan out to every track,
//! applying the value computed on the edited track. Tracks other than the
//! first may follow it, which the sequencer wires up on every clock.

use core::ops::Range;

use pk_ir::{
    CopyRange, Cv2Mode, Edit, GateType, RunMode, SeqCpBuffer, SongCpBuffer, StepAttributes,
    MAX_PHRASES, MAX_STEPS, MAX_TRACKS,
};
use tinyrand::{Seeded, Wyrand};

use crate::config::KernelConfig;
use crate::frame::{Frame, TrackOutput};
use crate::kernel::{ClockOutcome, SequencerKernel};
use crate::random::RandomSource;

/// How long an edit auditions the written note while stopped.
pub const EDIT_GATE_SECONDS: f32 = 0.4;

/// Multi-track step sequencer.
#[derive(Clone)]
pub struct Sequencer<R: RandomSource = Wyrand> {
    kernels: heapless::Vec<SequencerKernel, MAX_TRACKS>,
    config: KernelConfig,
    rng: R,
    track_index_edit: usize,
    step_index_edit: usize,
    phrase_index_edit: usize,
    /// Sequence changes waiting for the current pass to finish.
    delayed_seq_requests: [Option<u8>; MAX_TRACKS],
    /// Samples left on the audition gate, per track.
    editing_gate: [u32; MAX_TRACKS],
    editing_gate_cv: [f32; MAX_TRACKS],
    /// Set by the host while the clock drives playback.
    running: bool,
    sample_rate: f32,
    seq_cp_buf: SeqCpBuffer,
    song_cp_buf: SongCpBuffer,
}

impl Sequencer<Wyrand> {
    /// A sequencer driven by a seeded Wyrand generator.
    pub fn with_seed(num_tracks: usize, seed: u64) -> Self {
        Self::new(num_tracks, Wyrand::seed(seed))
    }
}

impl<R: RandomSource> Sequencer<R> {
    /// Create a sequencer with `num_tracks` tracks (clamped to 1..=MAX_TRACKS).
    pub fn new(num_tracks: usize, rng: R) -> Self {
        let kernels = (0..num_tracks.clamp(1, MAX_TRACKS)).map(SequencerKernel::new).collect();
        Self {
            kernels,
            config: KernelConfig::default(),
            rng,
            track_index_edit: 0,
            step_index_edit: 0,
            phrase_index_edit: 0,
            delayed_seq_requests: [None; MAX_TRACKS],
            editing_gate: [0; MAX_TRACKS],
            editing_gate_cv: [0.0; MAX_TRACKS],
            running: false,
            sample_rate: 48_000.0,
            seq_cp_buf: SeqCpBuffer::new(),
            song_cp_buf: SongCpBuffer::new(),
        }
    }

    pub fn num_tracks(&self) -> usize {
        self.kernels.len()
    }

    pub fn kernel(&self, track: usize) -> Option<&SequencerKernel> {
        self.kernels.get(track)
    }

    pub fn kernel_mut(&mut self, track: usize) -> Option<&mut SequencerKernel> {
        self.kernels.get_mut(track)
    }

    pub fn kernels(&self) -> &[SequencerKernel] {
        &self.kernels
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: KernelConfig) {
        self.config = config;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// While not running, pitch edits audition the edited step.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Sample rate the audition gate is timed against.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    pub fn seq_cp_buffer(&self) -> &SeqCpBuffer {
        &self.seq_cp_buf
    }

    pub fn song_cp_buffer(&self) -> &SongCpBuffer {
        &self.song_cp_buf
    }

    /// Reset every track's content to defaults.
    pub fn init_all(&mut self) {
        for k in self.kernels.iter_mut() {
            k.init();
        }
        self.track_index_edit = 0;
        self.step_index_edit = 0;
        self.phrase_index_edit = 0;
        self.delayed_seq_requests = [None; MAX_TRACKS];
    }

    // --- Edit cursor ---

    pub fn track_index_edit(&self) -> usize {
        self.track_index_edit
    }

    pub fn set_track_index_edit(&mut self, track: usize) {
        self.track_index_edit = track.min(self.kernels.len() - 1);
    }

    pub fn step_index_edit(&self) -> usize {
        self.step_index_edit
    }

    pub fn set_step_index_edit(&mut self, step: usize) {
        self.step_index_edit = step.min(MAX_STEPS - 1);
    }

    /// Move the step cursor, wrapping within the edited sequence's length.
    pub fn move_step_index_edit(&mut self, delta: i32) {
        let k = self.edit_kernel();
        let len = k.length(k.seq_index_edit()) as i32;
        let step = (self.step_index_edit as i32).min(len - 1);
        self.step_index_edit = (step + delta).rem_euclid(len) as usize;
    }

    pub fn phrase_index_edit(&self) -> usize {
        self.phrase_index_edit
    }

    pub fn set_phrase_index_edit(&mut self, phrase: usize) {
        self.phrase_index_edit = phrase.min(MAX_PHRASES - 1);
    }

    pub fn move_phrase_index_edit(&mut self, delta: i32) {
        self.phrase_index_edit =
            (self.phrase_index_edit as i32 + delta).rem_euclid(MAX_PHRASES as i32) as usize;
    }

    /// Sequence under edit on the edit track.
    pub fn seq_index_edit(&self) -> usize {
        self.edit_kernel().seq_index_edit()
    }

    pub fn set_seq_index_edit(&mut self, seq: usize, multi: bool) {
        for t in self.targets(multi) {
            self.kernels[t].set_seq_index_edit(seq);
        }
    }

    /// Queue a sequence change for `track`, applied when its current
    /// sequence completes in sequence mode.
    pub fn request_delayed_seq(&mut self, track: usize, seq: u8) {
        if let Some(slot) = self.delayed_seq_requests.get_mut(track) {
            *slot = Some(seq);
        }
    }

    pub fn delayed_seq_request(&self, track: usize) -> Option<u8> {
        self.delayed_seq_requests.get(track).copied().flatten()
    }

    fn edit_kernel(&self) -> &SequencerKernel {
        &self.kernels[self.track_index_edit]
    }

    /// Tracks an edit touches: the edit track first, then the rest.
    fn targets(&self, multi: bool) -> impl Iterator<Item = usize> {
        let edit = self.track_index_edit;
        let rest: Range<usize> = if multi { 0..self.kernels.len() } else { 0..0 };
        core::iter::once(edit).chain(rest.filter(move |&t| t != edit))
    }

    /// Attributes of the cursor step on the edit track.
    pub fn edit_attributes(&self) -> StepAttributes {
        let k = self.edit_kernel();
        k.attributes(k.seq_index_edit(), self.step_index_edit)
    }

    pub fn edit_cv(&self) -> f32 {
        let k = self.edit_kernel();
        k.cv(k.seq_index_edit(), self.step_index_edit)
    }

    /// Apply `f` to the cursor step on every target track whose step is not tied.
    fn update_untied_steps(&mut self, multi: bool, f: impl Fn(&mut StepAttributes)) {
        let step = self.step_index_edit;
        for t in self.targets(multi) {
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            let mut attributes = k.attributes(seq, step);
            if attributes.tied() {
                continue;
            }
            f(&mut attributes);
            k.set_attributes(seq, step, attributes);
        }
    }

    // --- Step edits ---

    /// Write `cv` into `count` steps from the cursor.
    pub fn write_cv(&mut self, cv: f32, count: usize, multi: bool) {
        let step = self.step_index_edit;
        for t in self.targets(multi) {
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            k.write_cv(seq, step, cv, count);
        }
        self.audition_if_stopped();
    }

    /// Move the cursor step to `octave` (relative to C4), keeping its semitone.
    pub fn apply_new_octave(&mut self, octave: i32, count: usize, multi: bool) -> Option<f32> {
        let step = self.step_index_edit;
        let t = self.track_index_edit;
        let seq = self.kernels[t].seq_index_edit();
        let cv = self.kernels[t].apply_new_octave(seq, step, octave, count)?;
        if multi {
            self.write_cv(cv, count, true);
        }
        self.audition_if_stopped();
        Some(cv)
    }

    /// Set the cursor step's semitone to `key`, keeping its octave.
    pub fn apply_new_key(&mut self, key: u8, count: usize, multi: bool) -> f32 {
        let step = self.step_index_edit;
        let t = self.track_index_edit;
        let seq = self.kernels[t].seq_index_edit();
        let cv = self.kernels[t].apply_new_key(seq, step, key, count);
        if multi {
            self.write_cv(cv, count, true);
        }
        self.audition_if_stopped();
        cv
    }

    /// Toggle the cursor step's gate. Refused (false) on a tied step.
    pub fn toggle_gate(&mut self, multi: bool) -> bool {
        let current = self.edit_attributes();
        if current.tied() {
            return false;
        }
        let on = !current.gate();
        self.update_untied_steps(multi, |a| a.set_gate(on));
        true
    }

    pub fn toggle_gate_prob(&mut self, multi: bool) -> bool {
        let current = self.edit_attributes();
        if current.tied() {
            return false;
        }
        let on = !current.gate_prob();
        self.update_untied_steps(multi, |a| a.set_gate_prob(on));
        true
    }

    pub fn toggle_slide(&mut self, multi: bool) -> bool {
        let current = self.edit_attributes();
        if current.tied() {
            return false;
        }
        let on = !current.slide();
        self.update_untied_steps(multi, |a| a.set_slide(on));
        true
    }

    /// Tie or untie the cursor step. Returns the new tied state.
    pub fn toggle_tied(&mut self, multi: bool) -> bool {
        let tie = !self.edit_attributes().tied();
        let step = self.step_index_edit;
        let mode = self.config.tie_mode;
        for t in self.targets(multi) {
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            match (tie, k.attributes(seq, step).tied()) {
                (true, false) => k.activate_tied_step(seq, step, mode),
                (false, true) => k.deactivate_tied_step(seq, step, mode),
                _ => {}
            }
        }
        tie
    }

    pub fn set_gate_type(&mut self, gate_type: GateType, multi: bool) -> bool {
        if self.edit_attributes().tied() {
            return false;
        }
        self.update_untied_steps(multi, |a| a.set_gate_type(gate_type));
        true
    }

    /// Change the cursor step's velocity, bounded by the track's CV2 mode.
    pub fn mod_velocity(&mut self, delta: i32, multi: bool) -> u8 {
        let max = self.edit_kernel().cv2_mode().max_velocity() as i32;
        let velocity = (self.edit_attributes().velocity() as i32 + delta).clamp(0, max) as u8;
        let step = self.step_index_edit;
        for t in self.targets(multi) {
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            let mut attributes = k.attributes(seq, step);
            attributes.set_velocity(velocity.min(k.cv2_mode().max_velocity()));
            k.set_attributes(seq, step, attributes);
        }
        velocity
    }

    pub fn mod_gate_prob_val(&mut self, delta: i32, multi: bool) -> u8 {
        let value = (self.edit_attributes().gate_prob_val() as i32 + delta).clamp(0, 100) as u8;
        self.update_untied_steps(multi, |a| a.set_gate_prob_val(value));
        value
    }

    pub fn mod_slide_val(&mut self, delta: i32, multi: bool) -> u8 {
        let value = (self.edit_attributes().slide_val() as i32 + delta).clamp(0, 100) as u8;
        self.update_untied_steps(multi, |a| a.set_slide_val(value));
        value
    }

    // --- Sequence edits ---

    pub fn mod_length(&mut self, delta: i32, multi: bool) -> usize {
        let t = self.track_index_edit;
        let seq = self.kernels[t].seq_index_edit();
        let len = self.kernels[t].mod_length(seq, delta);
        for t in self.targets(multi).skip(1) {
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            k.set_length(seq, len);
        }
        len
    }

    /// Set the step run mode. The first track cannot follow itself.
    pub fn set_run_mode_seq(&mut self, mode: RunMode, multi: bool) {
        for t in self.targets(multi) {
            if t == 0 && mode == RunMode::FollowTrackA {
                continue;
            }
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            k.set_run_mode_seq(seq, mode);
        }
    }

    /// Transpose the edited sequence; other tracks receive the same
    /// effective offset.
    pub fn transpose_seq(&mut self, delta: i32, multi: bool) -> i32 {
        let t = self.track_index_edit;
        let seq = self.kernels[t].seq_index_edit();
        let applied = self.kernels[t].transpose_seq(seq, delta);
        for t in self.targets(multi).skip(1) {
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            k.transpose_seq(seq, applied);
        }
        applied
    }

    pub fn untranspose_seq(&mut self, multi: bool) {
        for t in self.targets(multi) {
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            k.untranspose_seq(seq);
        }
    }

    pub fn rotate_seq(&mut self, delta: i32, multi: bool) -> i32 {
        let t = self.track_index_edit;
        let seq = self.kernels[t].seq_index_edit();
        let applied = self.kernels[t].rotate_seq(seq, delta);
        for t in self.targets(multi).skip(1) {
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            k.rotate_seq(seq, applied);
        }
        applied
    }

    pub fn unrotate_seq(&mut self, multi: bool) {
        for t in self.targets(multi) {
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            k.unrotate_seq(seq);
        }
    }

    pub fn init_sequence(&mut self, multi: bool) {
        for t in self.targets(multi) {
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            k.init_sequence(seq);
        }
    }

    pub fn randomize_sequence(&mut self, multi: bool) {
        for t in self.targets(multi) {
            let k = &mut self.kernels[t];
            let seq = k.seq_index_edit();
            k.randomize_sequence(seq, &mut self.rng);
        }
    }

    // --- Song edits ---

    pub fn set_phrase_seq(&mut self, seq: usize, multi: bool) {
        let phrase = self.phrase_index_edit;
        for t in self.targets(multi) {
            self.kernels[t].set_phrase_seq_num(phrase, seq);
        }
    }

    pub fn mod_phrase_reps(&mut self, delta: i32, multi: bool) -> u8 {
        let phrase = self.phrase_index_edit;
        let t = self.track_index_edit;
        let reps = self.kernels[t].mod_phrase_reps(phrase, delta);
        for t in self.targets(multi).skip(1) {
            let k = &mut self.kernels[t];
            let mut p = k.phrase(phrase);
            p.set_reps(reps);
            k.set_phrase(phrase, p);
        }
        reps
    }

    /// Start the song at the phrase cursor.
    pub fn set_song_begin(&mut self, multi: bool) {
        let phrase = self.phrase_index_edit;
        for t in self.targets(multi) {
            self.kernels[t].set_begin(phrase);
        }
    }

    /// End the song at the phrase cursor.
    pub fn set_song_end(&mut self, multi: bool) {
        let phrase = self.phrase_index_edit;
        for t in self.targets(multi) {
            self.kernels[t].set_end(phrase);
        }
    }

    pub fn set_run_mode_song(&mut self, mode: RunMode, multi: bool) {
        for t in self.targets(multi) {
            if t == 0 && mode == RunMode::FollowTrackA {
                continue;
            }
            self.kernels[t].set_run_mode_song(mode);
        }
    }

    pub fn init_song(&mut self, multi: bool) {
        for t in self.targets(multi) {
            self.kernels[t].init_song();
        }
    }

    /// Randomize the whole song of the edit track (or every track).
    pub fn randomize_song(&mut self, multi: bool) {
        for t in self.targets(multi) {
            self.kernels[t].randomize_song(&mut self.rng);
        }
    }

    // --- Track settings ---

    pub fn mod_pulses_per_step(&mut self, delta: i32, multi: bool) -> u8 {
        let t = self.track_index_edit;
        self.kernels[t].mod_pulses_per_step(delta);
        let pps = self.kernels[t].pulses_per_step();
        for t in self.targets(multi).skip(1) {
            self.kernels[t].set_pulses_per_step(pps);
        }
        pps
    }

    pub fn mod_delay(&mut self, delta: i32, multi: bool) -> u8 {
        let t = self.track_index_edit;
        self.kernels[t].mod_delay(delta);
        let delay = self.kernels[t].delay();
        for t in self.targets(multi).skip(1) {
            self.kernels[t].set_delay(delay);
        }
        delay
    }

    pub fn set_cv2_mode(&mut self, mode: Cv2Mode, multi: bool) {
        for t in self.targets(multi) {
            self.kernels[t].set_cv2_mode(mode);
        }
    }

    // --- Clipboard ---

    /// Copy from the step cursor (or from step 0 for a whole-sequence copy).
    pub fn copy_sequence(&mut self, range: CopyRange) {
        let start = if range == CopyRange::All { 0 } else { self.step_index_edit };
        let k = &self.kernels[self.track_index_edit];
        k.copy_sequence(&mut self.seq_cp_buf, k.seq_index_edit(), start, range.count(MAX_STEPS));
    }

    pub fn paste_sequence(&mut self) {
        if self.seq_cp_buf.is_empty() {
            return;
        }
        let start = if self.seq_cp_buf.is_whole_sequence() { 0 } else { self.step_index_edit };
        let k = &mut self.kernels[self.track_index_edit];
        let seq = k.seq_index_edit();
        k.paste_sequence(&self.seq_cp_buf, seq, start);
    }

    pub fn copy_song(&mut self, range: CopyRange) {
        let start = if range == CopyRange::All { 0 } else { self.phrase_index_edit };
        self.kernels[self.track_index_edit].copy_song(&mut self.song_cp_buf, start, range.count(MAX_PHRASES));
    }

    pub fn paste_song(&mut self) {
        if self.song_cp_buf.is_empty() {
            return;
        }
        let start = if self.song_cp_buf.is_whole_song() { 0 } else { self.phrase_index_edit };
        self.kernels[self.track_index_edit].paste_song(&self.song_cp_buf, start);
    }

    /// Apply one queued edit command.
    pub fn apply_edit(&mut self, edit: &Edit) {
        match *edit {
            Edit::SelectTrack(t) => self.set_track_index_edit(t as usize),
            Edit::SelectStep(s) => self.set_step_index_edit(s as usize),
            Edit::MoveStep(d) => self.move_step_index_edit(d as i32),
            Edit::SelectPhrase(p) => self.set_phrase_index_edit(p as usize),
            Edit::MovePhrase(d) => self.move_phrase_index_edit(d as i32),
            Edit::SelectSequence { seq, multi } => self.set_seq_index_edit(seq as usize, multi),
            Edit::RequestSequence { track, seq } => self.request_delayed_seq(track as usize, seq),
            Edit::WriteCv { cv, count, multi } => self.write_cv(cv, count as usize, multi),
            Edit::SetOctave { octave, count, multi } => {
                self.apply_new_octave(octave as i32, count as usize, multi);
            }
            Edit::SetKey { key, count, multi } => {
                self.apply_new_key(key, count as usize, multi);
            }
            Edit::ToggleGate { multi } => {
                self.toggle_gate(multi);
            }
            Edit::ToggleGateProb { multi } => {
                self.toggle_gate_prob(multi);
            }
            Edit::ToggleSlide { multi } => {
                self.toggle_slide(multi);
            }
            Edit::ToggleTied { multi } => {
                self.toggle_tied(multi);
            }
            Edit::SetGateType { gate_type, multi } => {
                self.set_gate_type(gate_type, multi);
            }
            Edit::ModVelocity { delta, multi } => {
                self.mod_velocity(delta as i32, multi);
            }
            Edit::ModGateProb { delta, multi } => {
                self.mod_gate_prob_val(delta as i32, multi);
            }
            Edit::ModSlide { delta, multi } => {
                self.mod_slide_val(delta as i32, multi);
            }
            Edit::ModLength { delta, multi } => {
                self.mod_length(delta as i32, multi);
            }
            Edit::SetSeqRunMode { mode, multi } => self.set_run_mode_seq(mode, multi),
            Edit::Transpose { delta, multi } => {
                self.transpose_seq(delta as i32, multi);
            }
            Edit::Untranspose { multi } => self.untranspose_seq(multi),
            Edit::Rotate { delta, multi } => {
                self.rotate_seq(delta as i32, multi);
            }
            Edit::Unrotate { multi } => self.unrotate_seq(multi),
            Edit::InitSequence { multi } => self.init_sequence(multi),
            Edit::RandomizeSequence { multi } => self.randomize_sequence(multi),
            Edit::SetPhraseSeq { seq, multi } => self.set_phrase_seq(seq as usize, multi),
            Edit::ModPhraseReps { delta, multi } => {
                self.mod_phrase_reps(delta as i32, multi);
            }
            Edit::SetSongBegin { multi } => self.set_song_begin(multi),
            Edit::SetSongEnd { multi } => self.set_song_end(multi),
            Edit::SetSongRunMode { mode, multi } => self.set_run_mode_song(mode, multi),
            Edit::InitSong { multi } => self.init_song(multi),
            Edit::RandomizeSong { multi } => self.randomize_song(multi),
            Edit::ModPulsesPerStep { delta, multi } => {
                self.mod_pulses_per_step(delta as i32, multi);
            }
            Edit::ModDelay { delta, multi } => {
                self.mod_delay(delta as i32, multi);
            }
            Edit::SetCv2Mode { mode, multi } => self.set_cv2_mode(mode, multi),
            Edit::CopySequence(range) => self.copy_sequence(range),
            Edit::PasteSequence => self.paste_sequence(),
            Edit::CopySong(range) => self.copy_song(range),
            Edit::PasteSong => self.paste_song(),
        }
    }

    // --- Playback ---

    /// Re-initialize every track's run state. Followers start from the
    /// first track's fresh position.
    pub fn reset(&mut self, editing: bool) {
        self.delayed_seq_requests = [None; MAX_TRACKS];
        self.editing_gate = [0; MAX_TRACKS];
        if let Some((first, rest)) = self.kernels.split_first_mut() {
            first.init_run(editing, None, &mut self.rng);
            let master = first.run_position();
            for k in rest {
                k.init_run(editing, Some(&master), &mut self.rng);
            }
        }
        log::debug!(target: "engine::sequencer", "reset {} tracks (editing: {})", self.kernels.len(), editing);
    }

    /// Clock one track.
    pub fn clock_step(&mut self, track: usize, editing: bool) -> ClockOutcome {
        let master = match track {
            0 => None,
            _ => self.kernels.first().map(SequencerKernel::run_position),
        };
        let Some(kernel) = self.kernels.get_mut(track) else {
            return ClockOutcome::NoChange;
        };
        let outcome = kernel.clock_step(
            editing,
            &mut self.delayed_seq_requests[track],
            master.as_ref(),
            &self.config,
            &mut self.rng,
        );
        if track == 0 && !editing && outcome == ClockOutcome::PhraseOrSeqBoundary {
            self.sync_followers(editing);
        }
        outcome
    }

    /// Clock every track in order. Returns the most significant outcome.
    pub fn clock_all(&mut self, editing: bool) -> ClockOutcome {
        (0..self.kernels.len())
            .map(|t| self.clock_step(t, editing))
            .max()
            .unwrap_or_default()
    }

    /// Move song followers onto the first track's new phrase.
    fn sync_followers(&mut self, editing: bool) {
        if let Some((first, rest)) = self.kernels.split_first_mut() {
            let master = first.run_position();
            for k in rest.iter_mut().filter(|k| k.run_mode_song() == RunMode::FollowTrackA) {
                k.follow_phrase(&master, editing);
                log::trace!(target: "engine::sequencer", "track {} follows phrase {}", k.id(), master.phrase_index);
            }
        }
    }

    /// Sound the cursor step on the edit track for [`EDIT_GATE_SECONDS`].
    pub fn audition(&mut self, sample_rate: f32) {
        let t = self.track_index_edit;
        self.editing_gate[t] = (sample_rate * EDIT_GATE_SECONDS) as u32;
        self.editing_gate_cv[t] = self.edit_cv();
    }

    fn audition_if_stopped(&mut self) {
        if !self.running {
            self.audition(self.sample_rate);
        }
    }

    /// Advance per-sample counters on every track.
    pub fn process(&mut self) {
        for k in self.kernels.iter_mut() {
            k.process();
        }
        for g in self.editing_gate.iter_mut() {
            *g = g.saturating_sub(1);
        }
    }

    pub fn cv_output(&self, track: usize, editing: bool) -> f32 {
        match (self.kernels.get(track), self.editing_gate.get(track)) {
            (Some(_), Some(&g)) if g > 0 => self.editing_gate_cv[track],
            (Some(k), _) => k.cv_output(editing),
            _ => 0.0,
        }
    }

    pub fn gate_output(&self, track: usize, clock_high: bool, sample_rate: f32) -> bool {
        let auditioning = self.editing_gate.get(track).is_some_and(|&g| g > 0);
        auditioning
            || self
                .kernels
                .get(track)
                .is_some_and(|k| k.gate_output(clock_high, sample_rate))
    }

    /// Current outputs of every track.
    pub fn frame(&self, editing: bool, clock_high: bool, sample_rate: f32) -> Frame {
        let mut frame = Frame::silence();
        frame.num_tracks = self.kernels.len() as u8;
        for (t, (k, out)) in self.kernels.iter().zip(frame.tracks.iter_mut()).enumerate() {
            *out = TrackOutput {
                cv: self.cv_output(t, editing),
                gate: self.gate_output(t, clock_high, sample_rate),
                velocity: k.velocity_output(editing),
            };
        }
        frame
    }
}
