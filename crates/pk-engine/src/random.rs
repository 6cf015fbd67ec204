//! Random sources for probability gates and the random run modes.

/// Uniform random numbers consumed by the kernel.
///
/// The kernel never owns a generator; callers pass one in so that tests and
/// offline renders can substitute a deterministic source.
pub trait RandomSource {
    fn next_u32(&mut self) -> u32;

    /// Uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }
}

impl RandomSource for tinyrand::Wyrand {
    fn next_u32(&mut self) -> u32 {
        (tinyrand::Rand::next_u64(self) >> 32) as u32
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_u32(&mut self) -> u32 {
        (**self).next_u32()
    }

    fn next_unit(&mut self) -> f32 {
        (**self).next_unit()
    }
}

/// A source that returns the same values forever.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedRandom {
    pub word: u32,
    pub unit: f32,
}

impl FixedRandom {
    pub const fn new(word: u32, unit: f32) -> Self {
        Self { word, unit }
    }
}

impl RandomSource for FixedRandom {
    fn next_u32(&mut self) -> u32 {
        self.word
    }

    fn next_unit(&mut self) -> f32 {
        self.unit
    }
}

/// Replays a fixed list of words, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedRandom<'a> {
    words: &'a [u32],
    pos: usize,
}

impl<'a> ScriptedRandom<'a> {
    pub fn new(words: &'a [u32]) -> Self {
        Self { words, pos: 0 }
    }
}

impl RandomSource for ScriptedRandom<'_> {
    fn next_u32(&mut self) -> u32 {
        if self.words.is_empty() {
            return 0;
        }
        let w = self.words[self.pos % self.words.len()];
        self.pos += 1;
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinyrand::{Seeded, Wyrand};

    #[test]
    fn unit_draws_stay_below_one() {
        let mut rng = Wyrand::seed(42);
        for _ in 0..10_000 {
            let u = rng.next_unit();
            assert!((0.0..1.0).contains(&u));
        }
        assert!(FixedRandom::new(u32::MAX, 0.0).next_u32() == u32::MAX);
        assert!(ScriptedRandom::new(&[u32::MAX]).next_unit() < 1.0);
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = Wyrand::seed(7);
        let mut b = Wyrand::seed(7);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn scripted_cycles() {
        let mut r = ScriptedRandom::new(&[1, 2]);
        assert_eq!([r.next_u32(), r.next_u32(), r.next_u32()], [1, 2, 1]);
    }
}
