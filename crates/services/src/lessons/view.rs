use serde::Serialize;

use lesson_core::model::{AnswerInput, Lesson, StepKindTag};
use lesson_core::session::{LessonSession, SessionPhase};

/// Presentation-agnostic snapshot of the current step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub lesson_id: String,
    pub lesson_title: String,
    /// 1-based position of the current step.
    pub position: usize,
    pub total: usize,
    pub progress: f32,
    pub kind: StepKindTag,
    pub prompt: String,
    pub content: Option<String>,
    pub options: Vec<String>,
    pub selected_option: Option<usize>,
    pub text: String,
    pub has_hint: bool,
    /// Set only while the hint is toggled on.
    pub hint: Option<String>,
    pub hearts: u8,
    pub max_hearts: u8,
    pub result: Option<ResultView>,
    pub can_submit: bool,
    pub can_retry: bool,
    pub is_last_step: bool,
    pub completed: bool,
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub correct: bool,
    /// Shown only after an incorrect answer.
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
}

impl StepView {
    #[must_use]
    pub fn from_session(session: &LessonSession) -> Self {
        let step = session.current_step();
        let state = session.state();

        let (selected_option, text) = match session.input() {
            AnswerInput::Empty => (None, String::new()),
            AnswerInput::Option(index) => (Some(*index), String::new()),
            AnswerInput::Text(text) => (None, text.clone()),
        };

        let result = state.result_revealed().then(|| {
            let correct = state.last_correct();
            ResultView {
                correct,
                correct_answer: (!correct).then(|| step.correct_answer_text().to_owned()),
                explanation: step.explanation().map(str::to_owned),
            }
        });

        Self {
            lesson_id: session.lesson().id().to_string(),
            lesson_title: session.lesson().title().to_owned(),
            position: session.position(),
            total: session.total_steps(),
            progress: session.progress_fraction(),
            kind: step.kind().tag(),
            prompt: step.prompt().to_owned(),
            content: step.content().map(str::to_owned),
            options: step.options().to_vec(),
            selected_option,
            text,
            has_hint: step.hint().is_some(),
            hint: state
                .hint_visible()
                .then(|| step.hint().map(str::to_owned))
                .flatten(),
            hearts: session.hearts(),
            max_hearts: session.rules().starting_hearts,
            result,
            can_submit: session.can_submit(),
            can_retry: session.can_retry(),
            is_last_step: session.is_last_step(),
            completed: session.phase() == SessionPhase::LessonComplete,
            failed: session.phase() == SessionPhase::LessonFailed,
        }
    }
}

/// One row of a lesson listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonListItem {
    pub id: String,
    pub title: String,
    pub step_count: usize,
    pub completed: bool,
}

impl LessonListItem {
    #[must_use]
    pub fn new(lesson: &Lesson, completed: bool) -> Self {
        Self {
            id: lesson.id().to_string(),
            title: lesson.title().to_owned(),
            step_count: lesson.len(),
            completed,
        }
    }
}
