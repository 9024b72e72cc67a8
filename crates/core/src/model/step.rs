use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::StepId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepError {
    #[error("step {id}: prompt cannot be empty")]
    EmptyPrompt { id: StepId },

    #[error("step {id}: multiple choice step needs at least one option")]
    NoOptions { id: StepId },

    #[error("step {id}: correct option {index} is out of range for {len} options")]
    CorrectOptionOutOfRange { id: StepId, index: usize, len: usize },

    #[error("step {id}: expected answer cannot be empty")]
    EmptyExpectedAnswer { id: StepId },

    #[error("step {id}: answer key does not fit a {kind} step")]
    AnswerKindMismatch { id: StepId, kind: StepKindTag },
}

//
// ─── STEP KIND ─────────────────────────────────────────────────────────────────
//

/// Discriminant of a step's exercise type, as written in lesson content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKindTag {
    MultipleChoice,
    Writing,
}

impl fmt::Display for StepKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKindTag::MultipleChoice => f.write_str("multiple choice"),
            StepKindTag::Writing => f.write_str("writing"),
        }
    }
}

/// Exercise payload of a step together with its answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// Pick one of `options`; `correct_option` is always a valid index.
    MultipleChoice {
        options: Vec<String>,
        correct_option: usize,
    },
    /// Type the `expected` answer; never blank.
    Writing { expected: String },
}

impl StepKind {
    #[must_use]
    pub fn tag(&self) -> StepKindTag {
        match self {
            StepKind::MultipleChoice { .. } => StepKindTag::MultipleChoice,
            StepKind::Writing { .. } => StepKindTag::Writing,
        }
    }
}

//
// ─── ANSWER INPUT ──────────────────────────────────────────────────────────────
//

/// What the learner has entered for the current step so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AnswerInput {
    #[default]
    Empty,
    Option(usize),
    Text(String),
}

impl AnswerInput {
    /// Blank text counts as empty, so whitespace can never be submitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerInput::Empty => true,
            AnswerInput::Option(_) => false,
            AnswerInput::Text(text) => text.trim().is_empty(),
        }
    }
}

//
// ─── STEP DRAFT ────────────────────────────────────────────────────────────────
//

/// Answer key as it appears in lesson content: an option index or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    Index(usize),
    Text(String),
}

/// Unvalidated step, shaped like the lesson content format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDraft {
    pub id: StepId,
    #[serde(rename = "type")]
    pub kind: StepKindTag,
    pub question: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: AnswerKey,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl StepDraft {
    /// Check the step invariants and build a `Step`.
    ///
    /// # Errors
    ///
    /// Returns `StepError` if the prompt is blank, the answer key does not match the
    /// step kind, a multiple choice key is out of range, or a writing key is blank.
    pub fn validate(self) -> Result<Step, StepError> {
        let id = self.id;
        if self.question.trim().is_empty() {
            return Err(StepError::EmptyPrompt { id });
        }

        let kind = match (self.kind, self.correct_answer) {
            (StepKindTag::MultipleChoice, AnswerKey::Index(index)) => {
                if self.options.is_empty() {
                    return Err(StepError::NoOptions { id });
                }
                if index >= self.options.len() {
                    return Err(StepError::CorrectOptionOutOfRange {
                        id,
                        index,
                        len: self.options.len(),
                    });
                }
                StepKind::MultipleChoice {
                    options: self.options,
                    correct_option: index,
                }
            }
            (StepKindTag::Writing, AnswerKey::Text(expected)) => {
                if expected.trim().is_empty() {
                    return Err(StepError::EmptyExpectedAnswer { id });
                }
                StepKind::Writing { expected }
            }
            (kind, _) => return Err(StepError::AnswerKindMismatch { id, kind }),
        };

        Ok(Step {
            id,
            prompt: self.question,
            content: non_blank(self.content),
            kind,
            explanation: non_blank(self.explanation),
            hint: non_blank(self.hint),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//
// ─── STEP ──────────────────────────────────────────────────────────────────────
//

/// One validated exercise unit of a lesson. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "StepDraft")]
pub struct Step {
    id: StepId,
    prompt: String,
    content: Option<String>,
    kind: StepKind,
    explanation: Option<String>,
    hint: Option<String>,
}

impl TryFrom<StepDraft> for Step {
    type Error = StepError;

    fn try_from(draft: StepDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl Step {
    /// Build a multiple choice step.
    ///
    /// # Errors
    ///
    /// Returns `StepError` if the prompt is blank, there are no options, or
    /// `correct_option` is out of range.
    pub fn multiple_choice(
        id: StepId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
    ) -> Result<Self, StepError> {
        StepDraft {
            id,
            kind: StepKindTag::MultipleChoice,
            question: prompt.into(),
            content: None,
            options,
            correct_answer: AnswerKey::Index(correct_option),
            explanation: None,
            hint: None,
        }
        .validate()
    }

    /// Build a writing step.
    ///
    /// # Errors
    ///
    /// Returns `StepError` if the prompt or the expected answer is blank.
    pub fn writing(
        id: StepId,
        prompt: impl Into<String>,
        expected: impl Into<String>,
    ) -> Result<Self, StepError> {
        StepDraft {
            id,
            kind: StepKindTag::Writing,
            question: prompt.into(),
            content: None,
            options: Vec::new(),
            correct_answer: AnswerKey::Text(expected.into()),
            explanation: None,
            hint: None,
        }
        .validate()
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = non_blank(Some(content.into()));
        self
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = non_blank(Some(explanation.into()));
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = non_blank(Some(hint.into()));
        self
    }

    #[must_use]
    pub fn id(&self) -> StepId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Options of a multiple choice step; empty for writing steps.
    #[must_use]
    pub fn options(&self) -> &[String] {
        match &self.kind {
            StepKind::MultipleChoice { options, .. } => options,
            StepKind::Writing { .. } => &[],
        }
    }

    /// Human readable correct answer, shown after a wrong attempt.
    #[must_use]
    pub fn correct_answer_text(&self) -> &str {
        match &self.kind {
            StepKind::MultipleChoice {
                options,
                correct_option,
            } => options.get(*correct_option).map_or("", String::as_str),
            StepKind::Writing { expected } => expected,
        }
    }

    /// Grade `input` against the answer key.
    ///
    /// Multiple choice compares indices. Writing compares trimmed, lowercased text.
    /// Input of the wrong shape is never correct.
    #[must_use]
    pub fn is_correct(&self, input: &AnswerInput) -> bool {
        match (&self.kind, input) {
            (StepKind::MultipleChoice { correct_option, .. }, AnswerInput::Option(selected)) => {
                selected == correct_option
            }
            (StepKind::Writing { expected }, AnswerInput::Text(text)) => {
                normalize(text) == normalize(expected)
            }
            _ => false,
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
