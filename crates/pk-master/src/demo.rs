//! A short two-track song built from panel edits.

use pk_ir::{CopyRange, Edit, GateType, RunMode};

const RIFF: [i8; 8] = [0, 3, 5, 7, 10, 7, 5, 3];

/// Edits that turn a fresh sequencer into the demo song.
///
/// Track A plays an 8-step riff twice, then the riff up a fourth. Track B
/// follows track A's song with a four-step ping-pong bass line.
pub fn demo_edits() -> Vec<Edit> {
    let mut edits = vec![
        Edit::SelectTrack(0),
        Edit::SelectSequence { seq: 0, multi: false },
        Edit::ModLength { delta: -24, multi: false },
    ];
    for (i, semis) in RIFF.iter().enumerate() {
        edits.push(Edit::SelectStep(i as u8));
        edits.push(Edit::WriteCv { cv: *semis as f32 / 12.0, count: 1, multi: false });
    }
    edits.extend([
        Edit::SelectStep(3),
        Edit::SetGateType { gate_type: GateType::Trig, multi: false },
        Edit::SelectStep(7),
        Edit::ToggleGate { multi: false },
        Edit::CopySequence(CopyRange::All),
        Edit::SelectSequence { seq: 1, multi: false },
        Edit::PasteSequence,
        Edit::Transpose { delta: 5, multi: false },
        Edit::SelectPhrase(0),
        Edit::SetPhraseSeq { seq: 0, multi: false },
        Edit::ModPhraseReps { delta: 1, multi: false },
        Edit::SelectPhrase(1),
        Edit::SetPhraseSeq { seq: 1, multi: false },
        Edit::SetSongEnd { multi: false },
        // bass
        Edit::SelectTrack(1),
        Edit::SelectSequence { seq: 0, multi: false },
        Edit::ModLength { delta: -28, multi: false },
        Edit::SetSeqRunMode { mode: RunMode::PingPong, multi: false },
        Edit::SelectStep(0),
        Edit::WriteCv { cv: -1.0, count: 1, multi: false },
        Edit::SelectStep(2),
        Edit::WriteCv { cv: -1.0 + 7.0 / 12.0, count: 1, multi: false },
        Edit::ToggleSlide { multi: false },
        Edit::SetSongRunMode { mode: RunMode::FollowTrackA, multi: false },
        Edit::SelectTrack(0),
        Edit::SelectSequence { seq: 0, multi: false },
        Edit::SelectStep(0),
        Edit::SelectPhrase(0),
    ]);
    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use pk_engine::{FixedRandom, Sequencer};
    use pk_ir::Phrase;

    #[test]
    fn demo_builds_two_phrase_song() {
        let mut seq = Box::new(Sequencer::new(2, FixedRandom::new(0, 0.0)));
        for edit in demo_edits() {
            seq.apply_edit(&edit);
        }
        let a = seq.kernel(0).unwrap();
        assert_eq!(a.length(0), 8);
        assert_eq!(a.length(1), 8);
        assert_eq!(a.phrase(0), Phrase::new(0, 2));
        assert_eq!(a.phrase(1), Phrase::new(1, 1));
        assert_eq!((a.song_begin(), a.song_end()), (0, 1));
        assert!((a.cv(1, 1) - 8.0 / 12.0).abs() < 1e-6);
        assert!(!a.attributes(0, 7).gate());

        let b = seq.kernel(1).unwrap();
        assert_eq!(b.length(0), 4);
        assert_eq!(b.run_mode_song(), RunMode::FollowTrackA);
        assert!(b.attributes(0, 2).slide());
    }
}
