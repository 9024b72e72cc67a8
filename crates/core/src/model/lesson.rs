use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{LessonId, StepId};
use crate::model::step::Step;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson {id}: title cannot be empty")]
    EmptyTitle { id: LessonId },

    #[error("lesson {id}: a lesson needs at least one step")]
    NoSteps { id: LessonId },

    #[error("lesson {id}: step {step} is defined more than once")]
    DuplicateStep { id: LessonId, step: StepId },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonDraft {
    pub id: LessonId,
    pub title: String,
    pub steps: Vec<Step>,
}

/// Ordered, non-empty sequence of steps under a language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "LessonDraft")]
pub struct Lesson {
    id: LessonId,
    title: String,
    steps: Vec<Step>,
}

impl TryFrom<LessonDraft> for Lesson {
    type Error = LessonError;

    fn try_from(draft: LessonDraft) -> Result<Self, Self::Error> {
        Self::new(draft.id, draft.title, draft.steps)
    }
}

impl Lesson {
    /// Create a lesson from already validated steps.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the title is blank, there are no steps, or a step id
    /// repeats.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        steps: Vec<Step>,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle { id });
        }
        if steps.is_empty() {
            return Err(LessonError::NoSteps { id });
        }
        let mut seen = HashSet::with_capacity(steps.len());
        for step in &steps {
            if !seen.insert(step.id()) {
                return Err(LessonError::DuplicateStep { id, step: step.id() });
            }
        }

        Ok(Self { id, title, steps })
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Number of steps; always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a constructed lesson; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}
