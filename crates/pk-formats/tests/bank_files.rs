//! Integration tests for bank encoding and decoding.

use pk_engine::{KernelConfig, Sequencer, StopAtEnd, TieMode};
use pk_formats::{load_bank, save_bank, Bank, FormatError, BANK_VERSION};
use pk_ir::{Cv2Mode, GateType, Phrase, RunMode, SeqAttributes};

fn sample_sequencer() -> Box<Sequencer> {
    let mut seq = Box::new(Sequencer::with_seed(4, 7));
    seq.set_config(KernelConfig {
        tie_mode: TieMode::Legacy,
        stop_at_end: StopAtEnd::Track(2),
        stop_while_editing: true,
    });
    for t in 0..4 {
        let k = seq.kernel_mut(t).unwrap();
        k.set_cv(3, 5, 0.25 * t as f32);
        k.set_seq_attributes(3, SeqAttributes::new(12, RunMode::Pendulum));
        k.set_phrase(10, Phrase::new(3, 4));
        k.set_song_window(2, 10);
        k.set_pulses_per_step(6);
        k.set_delay(3);
        k.set_run_mode_song(RunMode::Reverse);
        k.set_cv2_mode(Cv2Mode::Note);
        k.set_seq_index_edit(5 + t);
    }
    let mut a = seq.kernel(1).unwrap().attributes(3, 5);
    a.set_gate_type(GateType::Tr2);
    a.set_slide(true);
    seq.kernel_mut(1).unwrap().set_attributes(3, 5, a);
    seq
}

fn assert_same_content(a: &Sequencer, b: &Sequencer) {
    assert_eq!(a.config(), b.config());
    for (ka, kb) in a.kernels().iter().zip(b.kernels()) {
        assert_eq!(ka.phrases(), kb.phrases());
        assert_eq!((ka.song_begin(), ka.song_end()), (kb.song_begin(), kb.song_end()));
        assert_eq!(ka.pulses_per_step(), kb.pulses_per_step());
        assert_eq!(ka.delay(), kb.delay());
        assert_eq!(ka.run_mode_song(), kb.run_mode_song());
        assert_eq!(ka.cv2_mode(), kb.cv2_mode());
        assert_eq!(ka.seq_index_edit(), kb.seq_index_edit());
        for seqn in 0..pk_ir::MAX_SEQS {
            assert_eq!(ka.seq_attributes(seqn), kb.seq_attributes(seqn));
            for stepn in 0..pk_ir::MAX_STEPS {
                assert_eq!(ka.cv(seqn, stepn), kb.cv(seqn, stepn));
                assert_eq!(ka.attributes(seqn, stepn), kb.attributes(seqn, stepn));
            }
        }
    }
}

#[test]
fn saved_bank_loads_identically() {
    let original = sample_sequencer();
    let bytes = save_bank(&original).unwrap();

    let mut loaded = Box::new(Sequencer::with_seed(4, 0));
    load_bank(&bytes, &mut loaded).unwrap();
    assert_same_content(&original, &loaded);
    let k1 = loaded.kernel(1).unwrap();
    assert_eq!(k1.attributes(3, 5).gate_type(), GateType::Tr2);
    assert_eq!(k1.run_mode_song(), RunMode::Reverse);
    assert_eq!(k1.cv2_mode(), Cv2Mode::Note);
    assert_eq!(k1.seq_index_edit(), 6);
}

#[test]
fn bad_magic_is_rejected() {
    let mut bytes = save_bank(&sample_sequencer()).unwrap();
    bytes[0] = b'X';
    let mut seq = Box::new(Sequencer::with_seed(4, 0));
    assert!(matches!(load_bank(&bytes, &mut seq), Err(FormatError::InvalidHeader)));
}

#[test]
fn future_version_is_rejected() {
    let mut bytes = save_bank(&sample_sequencer()).unwrap();
    bytes[4..6].copy_from_slice(&(BANK_VERSION + 1).to_le_bytes());
    let mut seq = Box::new(Sequencer::with_seed(4, 0));
    assert!(matches!(
        load_bank(&bytes, &mut seq),
        Err(FormatError::UnsupportedVersion(v)) if v == BANK_VERSION + 1
    ));
}

#[test]
fn truncated_bank_leaves_sequencer_untouched() {
    let bytes = save_bank(&sample_sequencer()).unwrap();
    let mut seq = Box::new(Sequencer::with_seed(4, 0));
    seq.kernel_mut(0).unwrap().set_cv(0, 0, 1.5);

    let result = load_bank(&bytes[..bytes.len() / 2], &mut seq);
    assert!(matches!(result, Err(FormatError::UnexpectedEof)));
    assert_eq!(seq.kernel(0).unwrap().cv(0, 0), 1.5);
}

#[test]
fn smaller_sequencer_drops_extra_tracks() {
    let original = sample_sequencer();
    let bytes = save_bank(&original).unwrap();

    let mut two = Box::new(Sequencer::with_seed(2, 0));
    load_bank(&bytes, &mut two).unwrap();
    assert_eq!(two.num_tracks(), 2);
    assert_eq!(two.kernel(1).unwrap().cv(3, 5), 0.25);
}

#[test]
fn larger_sequencer_resets_missing_tracks() {
    let bytes = save_bank(&Sequencer::with_seed(1, 0)).unwrap();
    let mut four = sample_sequencer();
    load_bank(&bytes, &mut four).unwrap();
    let k = four.kernel(3).unwrap();
    assert_eq!(k.cv(3, 5), 0.0);
    assert_eq!(k.phrase(10), Phrase::INIT);
    assert_eq!(k.pulses_per_step(), 1);
}

#[test]
fn parsed_bank_exposes_records() {
    let bytes = save_bank(&sample_sequencer()).unwrap();
    let bank = Bank::parse(&bytes).unwrap();
    assert_eq!(bank.tracks.len(), 4);
    assert_eq!(bank.tracks[0].phrases.len(), pk_ir::MAX_PHRASES);
    assert_eq!(bank.tracks[0].sequences.len(), pk_ir::MAX_SEQS);
    assert_eq!(bank.config().stop_at_end, StopAtEnd::Track(2));
}
