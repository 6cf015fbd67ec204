//! Realtime render loop: clock in, CV/gate frames out.

use pk_engine::{ClockOutcome, Frame, RandomSource, Sequencer};
use pk_ir::Edit;

use crate::clock::InternalClock;

/// Drives a [`Sequencer`] from an [`InternalClock`].
///
/// [`Renderer::render`] performs no allocation and no I/O.
pub struct Renderer<R: RandomSource> {
    sequencer: Box<Sequencer<R>>,
    clock: InternalClock,
    editing: bool,
    stopped: bool,
}

impl<R: RandomSource> Renderer<R> {
    /// Reset `sequencer`'s run state and prepare to render.
    pub fn new(mut sequencer: Box<Sequencer<R>>, clock: InternalClock, editing: bool) -> Self {
        sequencer.reset(editing);
        sequencer.set_sample_rate(clock.sample_rate() as f32);
        sequencer.set_running(true);
        Self { sequencer, clock, editing, stopped: false }
    }

    pub fn sequencer(&self) -> &Sequencer<R> {
        &self.sequencer
    }

    pub fn into_sequencer(self) -> Box<Sequencer<R>> {
        self.sequencer
    }

    pub fn clock(&self) -> &InternalClock {
        &self.clock
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn apply_edit(&mut self, edit: &Edit) {
        self.sequencer.apply_edit(edit);
    }

    fn render_frame(&mut self) -> Frame {
        let tick = self.clock.tick();
        if tick.rising && self.sequencer.clock_all(self.editing) == ClockOutcome::StopRequested {
            self.stopped = true;
            self.sequencer.set_running(false);
        }
        self.sequencer.process();
        self.sequencer
            .frame(self.editing, tick.high, self.clock.sample_rate() as f32)
    }

    /// Fill `out` with frames. Returns how many were written; fewer than
    /// `out.len()` once a track requests a stop.
    pub fn render(&mut self, out: &mut [Frame]) -> usize {
        #[cfg(feature = "alloc_check")]
        {
            assert_no_alloc::assert_no_alloc(|| self.render_inner(out))
        }
        #[cfg(not(feature = "alloc_check"))]
        {
            self.render_inner(out)
        }
    }

    fn render_inner(&mut self, out: &mut [Frame]) -> usize {
        for (i, slot) in out.iter_mut().enumerate() {
            if self.stopped {
                return i;
            }
            *slot = self.render_frame();
        }
        out.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pk_engine::{KernelConfig, StopAtEnd};
    use pk_ir::{Phrase, RunMode};

    fn renderer(seq: Sequencer<pk_engine::FixedRandom>) -> Renderer<pk_engine::FixedRandom> {
        // 100 Hz, 60 bpm, 1 ppb: one pulse per 100 samples
        Renderer::new(Box::new(seq), InternalClock::new(100, 60.0, 1), false)
    }

    fn fixed_sequencer() -> Sequencer<pk_engine::FixedRandom> {
        Sequencer::new(1, pk_engine::FixedRandom::new(0, 0.0))
    }

    #[test]
    fn steps_advance_on_clock_edges() {
        let mut r = renderer(fixed_sequencer());
        let mut buf = vec![Frame::silence(); 250];
        assert_eq!(r.render(&mut buf), 250);
        assert_eq!(r.sequencer().kernel(0).map(|k| k.step_index_run()), Some(2));
        assert_eq!(buf[0].num_tracks, 1);
    }

    #[test]
    fn stop_at_end_halts_rendering() {
        let mut seq = fixed_sequencer();
        seq.set_config(KernelConfig { stop_at_end: StopAtEnd::Track(0), ..Default::default() });
        let k = seq.kernel_mut(0).unwrap();
        k.set_run_mode_song(RunMode::Forward);
        k.set_phrase(0, Phrase::new(0, 1));
        k.set_song_window(0, 0);
        k.set_length(0, 2);

        let mut r = renderer(seq);
        let mut buf = vec![Frame::silence(); 1000];
        let n = r.render(&mut buf);
        assert!(r.is_stopped());
        assert!(n < 1000);
        assert_eq!(r.render(&mut buf), 0);
        assert!(!r.sequencer().is_running());
    }

    #[test]
    fn edits_while_running_do_not_audition() {
        let mut r = renderer(fixed_sequencer());
        r.apply_edit(&Edit::SelectStep(5));
        r.apply_edit(&Edit::WriteCv { cv: 1.0, count: 1, multi: false });
        let mut buf = vec![Frame::silence(); 10];
        r.render(&mut buf);
        // Step 0 is playing; an audition would report the written pitch.
        assert_eq!(buf[9].tracks()[0].cv, 0.0);
    }
}
