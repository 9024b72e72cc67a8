/// Hearts a learner starts every lesson with.
pub const STARTING_HEARTS: u8 = 5;

/// What happens when an incorrect answer uses up the last heart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeartsPolicy {
    /// The session ends in `SessionPhase::LessonFailed`; nothing is recorded.
    #[default]
    FailLesson,
    /// The session goes on at zero hearts with unlimited retries.
    KeepPlaying,
}

/// Per-session tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRules {
    pub starting_hearts: u8,
    pub hearts_policy: HeartsPolicy,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            starting_hearts: STARTING_HEARTS,
            hearts_policy: HeartsPolicy::default(),
        }
    }
}

impl SessionRules {
    #[must_use]
    pub fn with_hearts_policy(mut self, hearts_policy: HeartsPolicy) -> Self {
        self.hearts_policy = hearts_policy;
        self
    }

    #[must_use]
    pub fn with_starting_hearts(mut self, starting_hearts: u8) -> Self {
        self.starting_hearts = starting_hearts;
        self
    }
}
