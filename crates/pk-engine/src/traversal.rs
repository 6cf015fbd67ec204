//! Run-mode traversal shared by the step and phrase levels.
//!
//! Both levels walk an ordered set of indices: steps `0..length` of a
//! sequence, or the playable phrases inside a song's `[begin, end]` window.
//! [`IndexSpace`] abstracts over the two so that every run mode is written
//! once. Each call to [`advance`] moves one position and reports whether the
//! walk completed its configured number of passes (a "boundary crossing").

use pk_ir::{Phrase, RunMode};

use crate::random::RandomSource;

/// An ordered set of visitable indices.
pub trait IndexSpace {
    /// Number of visitable indices.
    fn count(&self) -> usize;
    /// Lowest visitable index (or a sensible parking index when empty).
    fn first(&self) -> usize;
    /// Highest visitable index.
    fn last(&self) -> usize;
    fn contains(&self, index: usize) -> bool;
    /// Next visitable index strictly after `index`, without wrapping.
    fn next_after(&self, index: usize) -> Option<usize>;
    /// Previous visitable index strictly before `index`, without wrapping.
    fn prev_before(&self, index: usize) -> Option<usize>;
    /// The `n`-th visitable index, `n < count()`.
    fn nth(&self, n: usize) -> usize;
}

/// Steps `0..len` of a sequence.
#[derive(Clone, Copy, Debug)]
pub struct StepSpace {
    len: usize,
}

impl StepSpace {
    pub fn new(len: usize) -> Self {
        Self { len: len.max(1) }
    }
}

impl IndexSpace for StepSpace {
    fn count(&self) -> usize {
        self.len
    }

    fn first(&self) -> usize {
        0
    }

    fn last(&self) -> usize {
        self.len - 1
    }

    fn contains(&self, index: usize) -> bool {
        index < self.len
    }

    fn next_after(&self, index: usize) -> Option<usize> {
        let n = index + 1;
        (n < self.len).then_some(n)
    }

    fn prev_before(&self, index: usize) -> Option<usize> {
        if index == 0 {
            None
        } else {
            Some((index - 1).min(self.len - 1))
        }
    }

    fn nth(&self, n: usize) -> usize {
        n.min(self.len - 1)
    }
}

/// The playable phrases (repeat count above zero) of `phrases[begin..=end]`.
#[derive(Clone, Copy, Debug)]
pub struct SongSpace<'a> {
    phrases: &'a [Phrase],
    begin: usize,
    end: usize,
}

impl<'a> SongSpace<'a> {
    pub fn new(phrases: &'a [Phrase], begin: usize, end: usize) -> Self {
        let end = end.min(phrases.len().saturating_sub(1));
        Self { phrases, begin: begin.min(end), end }
    }

    fn playable(&self, index: usize) -> bool {
        self.phrases.get(index).is_some_and(|p| p.is_playable())
    }
}

impl IndexSpace for SongSpace<'_> {
    fn count(&self) -> usize {
        (self.begin..=self.end).filter(|&i| self.playable(i)).count()
    }

    fn first(&self) -> usize {
        (self.begin..=self.end)
            .find(|&i| self.playable(i))
            .unwrap_or(self.begin)
    }

    fn last(&self) -> usize {
        (self.begin..=self.end)
            .rev()
            .find(|&i| self.playable(i))
            .unwrap_or(self.begin)
    }

    fn contains(&self, index: usize) -> bool {
        (self.begin..=self.end).contains(&index) && self.playable(index)
    }

    fn next_after(&self, index: usize) -> Option<usize> {
        let from = (index + 1).max(self.begin);
        (from..=self.end).find(|&i| self.playable(i))
    }

    fn prev_before(&self, index: usize) -> Option<usize> {
        let to = index.min(self.end + 1);
        (self.begin..to).rev().find(|&i| self.playable(i))
    }

    fn nth(&self, n: usize) -> usize {
        (self.begin..=self.end)
            .filter(|&i| self.playable(i))
            .nth(n)
            .unwrap_or(self.begin)
    }
}

/// Remaining-repeat bookkeeping for one traversal level.
///
/// The counter is re-armed whenever the run mode changes or it runs out.
/// For ping-pong and pendulum its parity encodes direction: even counts
/// move forward, odd counts move backward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunHistory {
    mode: Option<RunMode>,
    remaining: u32,
}

impl RunHistory {
    pub const fn new() -> Self {
        Self { mode: None, remaining: 0 }
    }

    /// Forget the current pass so the next advance starts a fresh one.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    fn arm(&mut self, mode: RunMode, reps: u32, count: usize) {
        if self.mode == Some(mode) && self.remaining != 0 {
            return;
        }
        let reps = reps.max(1);
        self.mode = Some(mode);
        self.remaining = match mode {
            RunMode::PingPong | RunMode::Pendulum => reps * 2,
            RunMode::Brownian | RunMode::Random => reps * count as u32,
            _ => reps,
        }
        .max(1);
    }

    /// Count one unit down; true when the pass set is complete.
    fn consume(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }

    fn forward_phase(&self) -> bool {
        self.remaining % 2 == 0
    }
}

/// Starting index for a fresh run.
pub fn init_index(space: &impl IndexSpace, mode: RunMode) -> usize {
    match mode {
        RunMode::Reverse => space.last(),
        _ => space.first(),
    }
}

/// Move `index` one position under `mode`.
///
/// `reps` is the number of passes before a crossing is reported. Returns
/// true on the advance that completes the final pass. An empty space leaves
/// `index` alone and always reports a crossing. `FollowTrackA` is resolved by
/// the caller; if it reaches here it walks forward.
pub fn advance<R: RandomSource>(
    index: &mut usize,
    space: &impl IndexSpace,
    mode: RunMode,
    reps: u32,
    history: &mut RunHistory,
    rng: &mut R,
) -> bool {
    let count = space.count();
    if count == 0 {
        return true;
    }
    history.arm(mode, reps, count);

    match mode {
        RunMode::Forward | RunMode::FollowTrackA => match space.next_after(*index) {
            Some(n) => {
                *index = n;
                false
            }
            None => {
                *index = space.first();
                history.consume()
            }
        },
        RunMode::Reverse => match space.prev_before(*index) {
            Some(p) => {
                *index = p;
                false
            }
            None => {
                *index = space.last();
                history.consume()
            }
        },
        RunMode::PingPong => {
            if history.forward_phase() {
                match space.next_after(*index) {
                    Some(n) => *index = n,
                    None => {
                        // Hold the end for a second hit, then turn around.
                        *index = space.last();
                        history.consume();
                    }
                }
                false
            } else {
                match space.prev_before(*index) {
                    Some(p) => {
                        *index = p;
                        false
                    }
                    None => {
                        *index = space.first();
                        history.consume()
                    }
                }
            }
        }
        RunMode::Pendulum => {
            if history.forward_phase() {
                match space.next_after(*index) {
                    Some(n) => {
                        *index = n;
                        false
                    }
                    None => {
                        // Turn without repeating the end.
                        history.consume();
                        let turned = space.prev_before(space.last()).unwrap_or(space.first());
                        *index = turned;
                        turned == space.first() && history.consume()
                    }
                }
            } else {
                let p = space.prev_before(*index).unwrap_or(space.first());
                *index = p;
                p == space.first() && history.consume()
            }
        }
        RunMode::Brownian => {
            *index = match rng.next_u32() % 3 {
                0 => space.prev_before(*index).unwrap_or(space.last()),
                2 => space.next_after(*index).unwrap_or(space.first()),
                _ if space.contains(*index) => *index,
                _ => space.first(),
            };
            history.consume()
        }
        RunMode::Random => {
            *index = space.nth(rng.next_u32() as usize % count);
            history.consume()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{FixedRandom, ScriptedRandom};

    /// Walk `clocks` advances from a fresh start, returning visited indices
    /// (after each advance) and the 1-based clocks that reported a crossing.
    fn walk(
        space: &impl IndexSpace,
        mode: RunMode,
        reps: u32,
        clocks: usize,
        rng: &mut impl RandomSource,
    ) -> (Vec<usize>, Vec<usize>) {
        let mut index = init_index(space, mode);
        let mut history = RunHistory::new();
        let mut visited = Vec::new();
        let mut crossings = Vec::new();
        for clock in 1..=clocks {
            if advance(&mut index, space, mode, reps, &mut history, rng) {
                crossings.push(clock);
            }
            visited.push(index);
        }
        (visited, crossings)
    }

    fn no_rng() -> FixedRandom {
        FixedRandom::new(0, 0.0)
    }

    #[test]
    fn forward_wraps_and_crosses_each_pass() {
        let (visited, crossings) = walk(&StepSpace::new(4), RunMode::Forward, 1, 8, &mut no_rng());
        assert_eq!(visited, [1, 2, 3, 0, 1, 2, 3, 0]);
        assert_eq!(crossings, [4, 8]);
    }

    #[test]
    fn forward_with_reps_crosses_once_per_reps_passes() {
        let (_, crossings) = walk(&StepSpace::new(4), RunMode::Forward, 2, 8, &mut no_rng());
        assert_eq!(crossings, [8]);
    }

    #[test]
    fn reverse_starts_at_end() {
        let space = StepSpace::new(4);
        assert_eq!(init_index(&space, RunMode::Reverse), 3);
        let (visited, crossings) = walk(&space, RunMode::Reverse, 1, 4, &mut no_rng());
        assert_eq!(visited, [2, 1, 0, 3]);
        assert_eq!(crossings, [4]);
    }

    #[test]
    fn ping_pong_hits_ends_twice() {
        let (visited, crossings) = walk(&StepSpace::new(4), RunMode::PingPong, 1, 8, &mut no_rng());
        // From 0: 0 1 2 3 3 2 1 0 | 0 ...
        assert_eq!(visited, [1, 2, 3, 3, 2, 1, 0, 0]);
        assert_eq!(crossings, [8]);
    }

    #[test]
    fn pendulum_does_not_repeat_ends() {
        let (visited, crossings) = walk(&StepSpace::new(4), RunMode::Pendulum, 1, 12, &mut no_rng());
        // Cycle of 2L-2 = 6 positions: 0 1 2 3 2 1 | 0 1 2 3 2 1
        assert_eq!(visited, [1, 2, 3, 2, 1, 0, 1, 2, 3, 2, 1, 0]);
        assert_eq!(crossings, [6, 12]);
    }

    #[test]
    fn pendulum_length_two() {
        let (visited, crossings) = walk(&StepSpace::new(2), RunMode::Pendulum, 1, 4, &mut no_rng());
        assert_eq!(visited, [1, 0, 1, 0]);
        assert_eq!(crossings, [2, 4]);
    }

    #[test]
    fn single_step_sequences_cross_every_clock() {
        for mode in [RunMode::Forward, RunMode::Reverse, RunMode::Pendulum, RunMode::Random] {
            let (visited, crossings) = walk(&StepSpace::new(1), mode, 1, 3, &mut no_rng());
            assert_eq!(visited, [0, 0, 0], "{mode:?}");
            assert_eq!(crossings, [1, 2, 3], "{mode:?}");
        }
    }

    #[test]
    fn random_crosses_after_length_times_reps() {
        let mut rng = ScriptedRandom::new(&[3, 9, 0, 6, 1, 2, 7, 5]);
        let (visited, crossings) = walk(&StepSpace::new(4), RunMode::Random, 2, 8, &mut rng);
        assert_eq!(visited, [3, 1, 0, 2, 1, 2, 3, 1]);
        assert_eq!(crossings, [8]);
    }

    #[test]
    fn brownian_moves_at_most_one_and_wraps() {
        // 0 → back, 1 → stay, 2 → forward
        let mut rng = ScriptedRandom::new(&[0, 1, 2, 2]);
        let (visited, crossings) = walk(&StepSpace::new(4), RunMode::Brownian, 1, 4, &mut rng);
        assert_eq!(visited, [3, 3, 0, 1]);
        assert_eq!(crossings, [4]);
    }

    #[test]
    fn shrinking_length_pulls_index_back_in_range() {
        let space = StepSpace::new(4);
        let mut history = RunHistory::new();
        let mut index = 10;
        advance(&mut index, &space, RunMode::Forward, 1, &mut history, &mut no_rng());
        assert_eq!(index, 0);
        let mut index = 10;
        advance(&mut index, &space, RunMode::Reverse, 1, &mut history, &mut no_rng());
        assert_eq!(index, 3);
    }

    #[test]
    fn mode_change_rearms_counter() {
        let space = StepSpace::new(4);
        let mut history = RunHistory::new();
        let mut index = 0;
        advance(&mut index, &space, RunMode::PingPong, 3, &mut history, &mut no_rng());
        assert_eq!(history.remaining(), 6);
        advance(&mut index, &space, RunMode::Forward, 3, &mut history, &mut no_rng());
        assert_eq!(history.remaining(), 3);
    }

    fn song(reps: &[u8]) -> Vec<Phrase> {
        reps.iter().enumerate().map(|(i, &r)| Phrase::new(i as u8, r)).collect()
    }

    #[test]
    fn song_skips_zero_rep_phrases() {
        let phrases = song(&[1, 0, 1, 0, 1]);
        let space = SongSpace::new(&phrases, 0, 4);
        assert_eq!(space.count(), 3);
        let (visited, crossings) = walk(&space, RunMode::Forward, 1, 3, &mut no_rng());
        assert_eq!(visited, [2, 4, 0]);
        assert_eq!(crossings, [3]);
    }

    #[test]
    fn song_window_limits_traversal() {
        let phrases = song(&[1, 1, 1, 1, 1]);
        let space = SongSpace::new(&phrases, 1, 3);
        assert_eq!(init_index(&space, RunMode::Forward), 1);
        assert_eq!(init_index(&space, RunMode::Reverse), 3);
        let (visited, _) = walk(&space, RunMode::PingPong, 1, 6, &mut no_rng());
        assert_eq!(visited, [2, 3, 3, 2, 1, 1]);
    }

    #[test]
    fn empty_song_stays_put_and_crosses() {
        let phrases = song(&[0, 0, 0]);
        let space = SongSpace::new(&phrases, 0, 2);
        let mut index = 1;
        let mut history = RunHistory::new();
        assert!(advance(&mut index, &space, RunMode::Forward, 1, &mut history, &mut no_rng()));
        assert_eq!(index, 1);
    }

    #[test]
    fn song_random_only_lands_on_playable_phrases() {
        let phrases = song(&[0, 1, 0, 1]);
        let space = SongSpace::new(&phrases, 0, 3);
        let mut rng = ScriptedRandom::new(&[0, 1, 2, 3, 4, 5]);
        let (visited, _) = walk(&space, RunMode::Random, 1, 6, &mut rng);
        assert!(visited.iter().all(|&i| i == 1 || i == 3));
    }
}
