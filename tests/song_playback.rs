//! Integration test: build a song through edits, render offline, check the
//! CV/gate output.

use pk_master::{
    demo_edits, Controller, ControllerConfig, Edit, Frame, KernelConfig, StopAtEnd,
    CHANNELS_PER_TRACK,
};

const SAMPLE_RATE: u32 = 8_000;

fn demo_controller(config: ControllerConfig) -> Controller {
    let mut ctrl = Controller::new(config);
    for edit in demo_edits() {
        ctrl.apply_edit(edit);
    }
    ctrl
}

fn gate_count(frames: &[Frame], track: usize) -> usize {
    frames
        .windows(2)
        .filter(|w| !w[0].tracks[track].gate && w[1].tracks[track].gate)
        .count()
}

#[test]
fn demo_renders_gates_on_both_tracks() {
    let ctrl = demo_controller(ControllerConfig { num_tracks: 2, ..Default::default() });
    let frames = ctrl.render_frames(SAMPLE_RATE, SAMPLE_RATE as usize * 4);
    assert_eq!(frames.len(), SAMPLE_RATE as usize * 4);
    assert!(frames.iter().all(|f| f.num_tracks == 2));
    assert!(gate_count(&frames, 0) > 4);
    assert!(gate_count(&frames, 1) > 4);
}

#[test]
fn pitch_stays_in_range() {
    let ctrl = demo_controller(ControllerConfig { num_tracks: 2, ..Default::default() });
    let frames = ctrl.render_frames(SAMPLE_RATE, SAMPLE_RATE as usize * 4);
    for (i, f) in frames.iter().enumerate() {
        for t in f.tracks() {
            assert!((-10.0..=10.0).contains(&t.cv), "frame {i}: cv {}", t.cv);
            assert!((0.0..=10.0).contains(&t.velocity), "frame {i}: velocity {}", t.velocity);
        }
    }
}

#[test]
fn track_a_plays_both_sequences() {
    let ctrl = demo_controller(ControllerConfig { num_tracks: 2, ..Default::default() });
    let frames = ctrl.render_frames(SAMPLE_RATE, SAMPLE_RATE as usize * 4);
    let pitches: Vec<f32> = frames.iter().map(|f| f.tracks[0].cv).collect();
    let low = pitches.iter().cloned().fold(f32::INFINITY, f32::min);
    let high = pitches.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    assert!(low >= -1e-6, "{low}");
    // seq 1 is the riff transposed up a fourth
    assert!((high - 15.0 / 12.0).abs() < 1e-4, "{high}");
}

#[test]
fn stop_at_end_shortens_render() {
    let mut ctrl = demo_controller(ControllerConfig { num_tracks: 2, ..Default::default() });
    ctrl.sequencer_mut().set_config(KernelConfig {
        stop_at_end: StopAtEnd::Track(0),
        ..Default::default()
    });
    let max = SAMPLE_RATE as usize * 30;
    let frames = ctrl.render_frames(SAMPLE_RATE, max);
    assert!(frames.len() < max);
    // 3 passes of 8 steps at 120 bpm, 4 ppqn, 1 pulse per step: 24 pulses of 1/8 s
    let expected = SAMPLE_RATE as usize * 3;
    assert!(frames.len().abs_diff(expected) < SAMPLE_RATE as usize / 4, "{}", frames.len());
}

#[test]
fn wav_has_three_channels_per_track() {
    let ctrl = demo_controller(ControllerConfig { num_tracks: 2, ..Default::default() });
    let wav = ctrl.render_to_wav(SAMPLE_RATE, 1).unwrap();
    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(u16::from_le_bytes([wav[22], wav[23]]) as usize, 2 * CHANNELS_PER_TRACK);
    assert_eq!(wav.len(), 44 + SAMPLE_RATE as usize * 2 * CHANNELS_PER_TRACK * 2);
}

#[test]
fn sequence_mode_loops_the_edited_sequence() {
    let mut ctrl = demo_controller(ControllerConfig {
        num_tracks: 2,
        editing: true,
        ..Default::default()
    });
    ctrl.apply_edit(Edit::ModLength { delta: -6, multi: false });
    let frames = ctrl.render_frames(SAMPLE_RATE, SAMPLE_RATE as usize * 2);
    assert_eq!(frames.len(), SAMPLE_RATE as usize * 2);
    let distinct: std::collections::BTreeSet<i32> =
        frames.iter().map(|f| (f.tracks[0].cv * 12.0).round() as i32).collect();
    assert_eq!(distinct.into_iter().collect::<Vec<_>>(), vec![0, 3]);
}
