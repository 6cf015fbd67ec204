//! Traversal algorithms for steps within a sequence and phrases within a song.

/// Number of run modes.
pub const NUM_RUN_MODES: usize = 7;

/// How the next step (or phrase) index is chosen on each advance.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunMode {
    #[default]
    Forward = 0,
    Reverse = 1,
    /// Forward then backward, hitting both endpoints twice.
    PingPong = 2,
    /// Forward then backward, hitting each endpoint once.
    Pendulum = 3,
    /// Random walk of -1, 0 or +1 per advance, wrapping at the bounds.
    Brownian = 4,
    /// Uniform random index per advance.
    Random = 5,
    /// Mirror the first track's run position.
    FollowTrackA = 6,
}

const SHORT_NAMES: [&str; NUM_RUN_MODES] = ["FWD", "REV", "PPG", "PEN", "BRN", "RND", "TKA"];

impl RunMode {
    pub const ALL: [RunMode; NUM_RUN_MODES] = [
        RunMode::Forward,
        RunMode::Reverse,
        RunMode::PingPong,
        RunMode::Pendulum,
        RunMode::Brownian,
        RunMode::Random,
        RunMode::FollowTrackA,
    ];

    /// Run mode for a stored index. Indices past the table saturate to the last mode.
    pub const fn from_index(index: u8) -> Self {
        let i = if (index as usize) < NUM_RUN_MODES {
            index as usize
        } else {
            NUM_RUN_MODES - 1
        };
        Self::ALL[i]
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn short_name(self) -> &'static str {
        SHORT_NAMES[self as usize]
    }

    /// Modes driven by a random source.
    pub const fn is_random(self) -> bool {
        matches!(self, RunMode::Brownian | RunMode::Random)
    }

    /// Step through the mode list, saturating at both ends.
    ///
    /// `FollowTrackA` is only reachable when `allow_follow` is set; the first
    /// track has nobody to follow.
    pub fn offset(self, delta: i32, allow_follow: bool) -> Self {
        let last = if allow_follow { NUM_RUN_MODES } else { NUM_RUN_MODES - 1 };
        let i = (self as i32 + delta).clamp(0, last as i32 - 1);
        Self::from_index(i as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips() {
        for mode in RunMode::ALL {
            assert_eq!(RunMode::from_index(mode.index()), mode);
        }
    }

    #[test]
    fn out_of_range_saturates() {
        assert_eq!(RunMode::from_index(200), RunMode::FollowTrackA);
    }

    #[test]
    fn offset_skips_follow_on_first_track() {
        assert_eq!(RunMode::Random.offset(1, false), RunMode::Random);
        assert_eq!(RunMode::Random.offset(1, true), RunMode::FollowTrackA);
        assert_eq!(RunMode::Forward.offset(-3, true), RunMode::Forward);
    }
}
