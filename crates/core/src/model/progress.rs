use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::ids::{LanguageCode, LessonId};

/// Points granted for an awarded lesson completion.
pub const POINTS_PER_LESSON: u32 = 100;

/// Streak increment for an awarded lesson completion.
pub const STREAK_PER_LESSON: u32 = 1;

//
// ─── AWARD POLICY ──────────────────────────────────────────────────────────────
//

/// Decides whether completing an already completed lesson awards again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AwardPolicy {
    /// Award streak and points only the first time a lesson is completed.
    #[default]
    OncePerLesson,
    /// Award streak and points on every completion.
    EveryCompletion,
}

/// What a completion did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionAward {
    /// Streak and points were incremented.
    Awarded { points: u32, streak: u32 },
    /// The lesson was already completed and the policy withheld the award.
    AlreadyCompleted,
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Durable learner progress: completed lessons per language, streak and points.
///
/// Serialized as `{ "completedLessons": { "<lang>": ["<id>"] }, "streak": n, "points": n }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default)]
    completed_lessons: BTreeMap<LanguageCode, BTreeSet<LessonId>>,
    #[serde(default)]
    streak: u32,
    #[serde(default)]
    points: u32,
}

impl ProgressRecord {
    /// Rehydrate a record from persisted parts.
    #[must_use]
    pub fn from_parts(
        completed_lessons: BTreeMap<LanguageCode, BTreeSet<LessonId>>,
        streak: u32,
        points: u32,
    ) -> Self {
        Self {
            completed_lessons,
            streak,
            points,
        }
    }

    #[must_use]
    pub fn completed_lessons(&self) -> &BTreeMap<LanguageCode, BTreeSet<LessonId>> {
        &self.completed_lessons
    }

    /// Completed lesson ids for `language`, if any were recorded.
    #[must_use]
    pub fn completed_in(&self, language: &str) -> Option<&BTreeSet<LessonId>> {
        self.completed_lessons.get(language)
    }

    #[must_use]
    pub fn completed_count(&self, language: &str) -> usize {
        self.completed_in(language).map_or(0, BTreeSet::len)
    }

    #[must_use]
    pub fn is_completed(&self, language: &str, lesson_id: &str) -> bool {
        self.completed_in(language)
            .is_some_and(|ids| ids.contains(lesson_id))
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Mark `lesson_id` completed under `language` and award streak and points
    /// according to `policy`. Counters saturate instead of overflowing.
    pub fn record_completion(
        &mut self,
        language: &LanguageCode,
        lesson_id: &LessonId,
        policy: AwardPolicy,
    ) -> CompletionAward {
        let newly_completed = self
            .completed_lessons
            .entry(language.clone())
            .or_default()
            .insert(lesson_id.clone());

        if !newly_completed && policy == AwardPolicy::OncePerLesson {
            return CompletionAward::AlreadyCompleted;
        }

        self.streak = self.streak.saturating_add(STREAK_PER_LESSON);
        self.points = self.points.saturating_add(POINTS_PER_LESSON);
        CompletionAward::Awarded {
            points: POINTS_PER_LESSON,
            streak: STREAK_PER_LESSON,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
