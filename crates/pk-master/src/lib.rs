//! Headless controller for phrasekit.
//!
//! Owns the edited sequencer, runs realtime playback on a background thread
//! and renders offline. Shared by the CLI and the integration tests.

mod clock;
mod demo;
mod render;

use pk_audio::{AudioOutput, CpalOutput};
use pk_engine::Sequencer;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tinyrand::Wyrand;

pub use clock::{ClockTick, InternalClock};
pub use demo::demo_edits;
pub use pk_engine::{
    ClockOutcome, Frame, KernelConfig, StopAtEnd, TieMode, TrackOutput, CHANNELS_PER_TRACK,
};
pub use pk_formats::{frames_to_wav, write_wav, FormatError};
pub use pk_ir::{CopyRange, Cv2Mode, Edit, GateType, RunMode, MAX_TRACKS};
pub use render::Renderer;

/// Edits queued for the playback thread.
const EDIT_QUEUE_LEN: usize = 256;
/// Frames rendered between position updates and edit polls.
const BLOCK_FRAMES: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    pub num_tracks: usize,
    pub bpm: f64,
    /// Clock pulses per beat fed to the sequencer.
    pub pulses_per_beat: u32,
    /// Play the edited sequence on a loop instead of the song.
    pub editing: bool,
    pub seed: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { num_tracks: MAX_TRACKS, bpm: 120.0, pulses_per_beat: 4, editing: false, seed: 0 }
    }
}

/// Run position of one track during playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackPosition {
    pub seq: u8,
    pub step: u8,
    pub phrase: u8,
}

impl TrackPosition {
    fn pack(self) -> u32 {
        u32::from_le_bytes([self.step, self.phrase, self.seq, 1])
    }

    fn unpack(bits: u32) -> Option<Self> {
        let [step, phrase, seq, valid] = bits.to_le_bytes();
        (valid != 0).then_some(Self { seq, step, phrase })
    }
}

pub struct Controller {
    config: ControllerConfig,
    sequencer: Box<Sequencer>,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    positions: Arc<[AtomicU32; MAX_TRACKS]>,
    edits: HeapProd<Edit>,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new(config: ControllerConfig) -> Self {
        let sequencer = Box::new(Sequencer::with_seed(config.num_tracks, config.seed));
        Self { config, sequencer, playback: None }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.config.bpm = bpm;
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.config.editing = editing;
    }

    // --- Content ---

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Direct access for bulk changes. Not forwarded to a running playback;
    /// call [`Controller::play`] again to pick them up.
    pub fn sequencer_mut(&mut self) -> &mut Sequencer {
        &mut self.sequencer
    }

    /// Apply `edit` here and, when playing, on the playback thread.
    ///
    /// Randomizing edits restart playback so both copies draw the same
    /// content.
    pub fn apply_edit(&mut self, edit: Edit) {
        self.sequencer.apply_edit(&edit);
        if draws_random(&edit) {
            if self.playback.is_some() {
                self.play();
            }
            return;
        }
        if let Some(pb) = self.playback.as_mut() {
            if pb.edits.try_push(edit).is_err() {
                log::warn!(target: "master", "edit queue full; dropped {edit:?}");
            }
        }
    }

    pub fn load_bank(&mut self, data: &[u8]) -> Result<(), FormatError> {
        self.stop();
        pk_formats::load_bank(data, &mut self.sequencer)?;
        log::info!(target: "master", "loaded bank ({} bytes)", data.len());
        Ok(())
    }

    pub fn save_bank(&self) -> Result<Vec<u8>, FormatError> {
        pk_formats::save_bank(&self.sequencer)
    }

    // --- Realtime playback ---

    /// Start (or restart) playback of a snapshot of the current content.
    pub fn play(&mut self) {
        self.stop();

        let sequencer = self.sequencer.clone();
        let (edits, edit_rx) = HeapRb::<Edit>::new(EDIT_QUEUE_LEN).split();
        let stop_signal = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let positions = Arc::new([0u32; MAX_TRACKS].map(AtomicU32::new));

        let shared = Shared {
            stop_signal: stop_signal.clone(),
            finished: finished.clone(),
            positions: positions.clone(),
        };
        let config = self.config.clone();
        let thread = std::thread::spawn(move || audio_thread(sequencer, config, edit_rx, shared));

        self.playback = Some(PlaybackHandle {
            stop_signal,
            finished,
            positions,
            edits,
            thread: Some(thread),
        });
    }

    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                if handle.join().is_err() {
                    log::error!(target: "master", "playback thread panicked");
                }
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    pub fn is_finished(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.finished.load(Ordering::Relaxed))
    }

    /// Last reported position of `track`, while playing.
    pub fn position(&self, track: usize) -> Option<TrackPosition> {
        let pb = self.playback.as_ref()?;
        if pb.finished.load(Ordering::Relaxed) {
            return None;
        }
        TrackPosition::unpack(pb.positions.get(track)?.load(Ordering::Relaxed))
    }

    // --- Offline rendering ---

    /// Render up to `max_frames` frames from a reset run state, stopping
    /// early if a track requests a stop.
    pub fn render_frames(&self, sample_rate: u32, max_frames: usize) -> Vec<Frame> {
        let mut renderer = build_renderer(self.sequencer.clone(), &self.config, sample_rate);
        let mut frames = vec![Frame::silence(); max_frames];
        let n = renderer.render(&mut frames);
        frames.truncate(n);
        frames
    }

    pub fn render_to_wav(&self, sample_rate: u32, max_seconds: u32) -> std::io::Result<Vec<u8>> {
        let max_frames = (sample_rate * max_seconds) as usize;
        let frames = self.render_frames(sample_rate, max_frames);
        frames_to_wav(&frames, sample_rate)
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

struct Shared {
    stop_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    positions: Arc<[AtomicU32; MAX_TRACKS]>,
}

/// Edits whose result depends on the random stream, which the local and
/// playback sequencers do not share.
fn draws_random(edit: &Edit) -> bool {
    matches!(edit, Edit::RandomizeSequence { .. } | Edit::RandomizeSong { .. })
}

fn build_renderer(
    sequencer: Box<Sequencer>,
    config: &ControllerConfig,
    sample_rate: u32,
) -> Renderer<Wyrand> {
    let clock = InternalClock::new(sample_rate, config.bpm, config.pulses_per_beat);
    Renderer::new(sequencer, clock, config.editing)
}

fn publish_positions(
    renderer: &Renderer<Wyrand>,
    editing: bool,
    positions: &[AtomicU32; MAX_TRACKS],
) {
    for (k, slot) in renderer.sequencer().kernels().iter().zip(positions.iter()) {
        let pos = TrackPosition {
            seq: k.seq_index_run(editing) as u8,
            step: k.step_index_run() as u8,
            phrase: k.phrase_index_run() as u8,
        };
        slot.store(pos.pack(), Ordering::Relaxed);
    }
}

fn audio_thread(
    sequencer: Box<Sequencer>,
    config: ControllerConfig,
    mut edits: HeapCons<Edit>,
    shared: Shared,
) {
    let (mut output, consumer) = match CpalOutput::new() {
        Ok(pair) => pair,
        Err(e) => {
            log::error!(target: "master", "no audio output: {e}");
            shared.finished.store(true, Ordering::Relaxed);
            return;
        }
    };
    let sample_rate = output.sample_rate();
    let mut renderer = build_renderer(sequencer, &config, sample_rate);

    if let Err(e) = output.build_stream(consumer).and_then(|()| output.start()) {
        log::error!(target: "master", "failed to start output: {e}");
        shared.finished.store(true, Ordering::Relaxed);
        return;
    }
    log::info!(target: "master", "playing at {} bpm, {} Hz", config.bpm, sample_rate);

    let mut block = [Frame::silence(); BLOCK_FRAMES];
    while !renderer.is_stopped() && !shared.stop_signal.load(Ordering::Relaxed) {
        while let Some(edit) = edits.try_pop() {
            renderer.apply_edit(&edit);
        }
        let n = renderer.render(&mut block);
        for frame in &block[..n] {
            output.write_spin(*frame);
        }
        publish_positions(&renderer, config.editing, &shared.positions);
    }

    // Let the device drain before the stream is dropped.
    for _ in 0..sample_rate {
        output.write_spin(Frame::silence());
    }
    shared.finished.store(true, Ordering::Relaxed);
    log::info!(target: "master", "playback finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_pack_and_unpack() {
        let pos = TrackPosition { seq: 63, step: 31, phrase: 98 };
        assert_eq!(TrackPosition::unpack(pos.pack()), Some(pos));
        assert_eq!(TrackPosition::unpack(0), None);
    }

    #[test]
    fn edits_reach_the_local_sequencer() {
        let mut c = Controller::new(ControllerConfig { num_tracks: 2, ..Default::default() });
        c.apply_edit(Edit::SelectTrack(1));
        c.apply_edit(Edit::ModLength { delta: -4, multi: false });
        assert_eq!(c.sequencer().kernel(1).map(|k| k.length(0)), Some(28));
        assert_eq!(c.sequencer().kernel(0).map(|k| k.length(0)), Some(32));
    }

    #[test]
    fn randomizing_edits_restart_playback() {
        assert!(draws_random(&Edit::RandomizeSequence { multi: false }));
        assert!(draws_random(&Edit::RandomizeSong { multi: true }));
        assert!(!draws_random(&Edit::InitSong { multi: true }));
        assert!(!draws_random(&Edit::WriteCv { cv: 0.0, count: 1, multi: false }));
    }

    #[test]
    fn bank_survives_controller_round_trip() {
        let mut c = Controller::default();
        c.apply_edit(Edit::WriteCv { cv: 1.0, count: 1, multi: false });
        let bytes = c.save_bank().unwrap();

        let mut d = Controller::default();
        d.load_bank(&bytes).unwrap();
        assert_eq!(d.sequencer().kernel(0).map(|k| k.cv(0, 0)), Some(1.0));
    }
}
