use crate::model::{AnswerInput, Catalog, LanguageCode, Lesson, LessonId, Step};
use crate::session::rules::SessionRules;
use crate::session::state::{
    SessionAction, SessionError, SessionEvent, SessionPhase, SessionState, Transition,
};

/// Payload handed to the progress store when a lesson is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSignal {
    pub language: LanguageCode,
    pub lesson_id: LessonId,
}

/// One in-progress traversal of a single lesson.
///
/// Owns its lesson and its current `SessionState`. Persists nothing: dropping
/// the session abandons it.
#[derive(Debug, Clone)]
pub struct LessonSession {
    language: LanguageCode,
    lesson: Lesson,
    rules: SessionRules,
    state: SessionState,
}

impl LessonSession {
    #[must_use]
    pub fn start(language: LanguageCode, lesson: Lesson, rules: SessionRules) -> Self {
        let state = SessionState::new(&rules);
        Self {
            language,
            lesson,
            rules,
            state,
        }
    }

    /// Look up `(language, lesson_id)` in `catalog` and start a session on it.
    ///
    /// Returns `None` when the catalog has no such lesson.
    #[must_use]
    pub fn from_catalog(
        catalog: &Catalog,
        language: &str,
        lesson_id: &str,
        rules: SessionRules,
    ) -> Option<Self> {
        let code = catalog.language(language)?;
        let lesson = catalog.lesson_by_id(language, lesson_id)?;
        Some(Self::start(code.clone(), lesson.clone(), rules))
    }

    /// Apply `action` and return the completion signal if this transition finished
    /// the lesson.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the action is rejected; the session is unchanged.
    pub fn apply(&mut self, action: SessionAction) -> Result<Option<CompletionSignal>, SessionError> {
        let Transition { state, event } = self.state.reduce(&self.lesson, &self.rules, action)?;
        self.state = state;
        Ok(match event {
            Some(SessionEvent::LessonCompleted) => Some(CompletionSignal {
                language: self.language.clone(),
                lesson_id: self.lesson.id().clone(),
            }),
            _ => None,
        })
    }

    /// # Errors
    ///
    /// See [`LessonSession::apply`].
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        self.apply(SessionAction::SelectOption(index)).map(|_| ())
    }

    /// # Errors
    ///
    /// See [`LessonSession::apply`].
    pub fn enter_text(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.apply(SessionAction::EnterText(text.into())).map(|_| ())
    }

    /// Evaluate the current input. Returns whether it was correct.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptySubmission` without a hearts penalty when nothing
    /// was entered, or `SessionError::InvalidTransition` outside `AnsweringStep`.
    pub fn submit_answer(&mut self) -> Result<bool, SessionError> {
        self.apply(SessionAction::Submit)?;
        Ok(self.state.last_correct())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless a wrong answer is shown.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        self.apply(SessionAction::Retry).map(|_| ())
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless a result is shown.
    pub fn advance(&mut self) -> Result<Option<CompletionSignal>, SessionError> {
        self.apply(SessionAction::Advance)
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` once the session has ended.
    pub fn toggle_hint(&mut self) -> Result<(), SessionError> {
        self.apply(SessionAction::ToggleHint).map(|_| ())
    }

    #[must_use]
    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn hearts(&self) -> u8 {
        self.state.hearts()
    }

    #[must_use]
    pub fn input(&self) -> &AnswerInput {
        self.state.input()
    }

    /// The step on screen. Stays on the last step once the session has ended.
    #[must_use]
    pub fn current_step(&self) -> &Step {
        &self.lesson.steps()[self.state.step_index().min(self.lesson.last_index())]
    }

    /// 1-based position of the current step.
    #[must_use]
    pub fn position(&self) -> usize {
        self.state.step_index() + 1
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.lesson.len()
    }

    #[must_use]
    pub fn is_last_step(&self) -> bool {
        self.state.step_index() >= self.lesson.last_index()
    }

    /// Share of the lesson reached, counting the current step, in `(0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_fraction(&self) -> f32 {
        self.position() as f32 / self.total_steps() as f32
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase() == SessionPhase::AnsweringStep && !self.state.input().is_empty()
    }

    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.phase() == SessionPhase::ResultShown && !self.state.last_correct()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase().is_terminal()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
