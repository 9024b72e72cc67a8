use std::fmt;
use thiserror::Error;

use crate::model::{AnswerInput, Lesson, Step, StepKind, StepKindTag};
use crate::session::rules::{HeartsPolicy, SessionRules};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Rejected session actions. A rejected action never changes the state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: SessionPhase,
    },

    #[error("cannot submit an empty answer")]
    EmptySubmission,

    #[error("option {index} is out of range for {len} options")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("cannot {action} on a {kind} step")]
    InputMismatch {
        action: &'static str,
        kind: StepKindTag,
    },

    /// The state was reduced against a lesson shorter than the one it was built
    /// for. `LessonSession` always pairs a state with its own lesson, so this only
    /// reaches callers driving `SessionState::reduce` by hand.
    #[error("step index {index} is outside the lesson")]
    StepOutOfRange { index: usize },
}

//
// ─── PHASES, ACTIONS, EVENTS ───────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for an answer to the current step. Initial phase.
    AnsweringStep,
    /// The last submission has been evaluated and is on screen.
    ResultShown,
    /// Terminal. Every step was passed through.
    LessonComplete,
    /// Terminal. Hearts ran out under `HeartsPolicy::FailLesson`.
    LessonFailed,
}

impl SessionPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::LessonComplete | SessionPhase::LessonFailed)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::AnsweringStep => f.write_str("answering a step"),
            SessionPhase::ResultShown => f.write_str("showing a result"),
            SessionPhase::LessonComplete => f.write_str("the lesson is complete"),
            SessionPhase::LessonFailed => f.write_str("the lesson is failed"),
        }
    }
}

/// Input events forwarded by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    SelectOption(usize),
    EnterText(String),
    Submit,
    Retry,
    Advance,
    ToggleHint,
}

impl SessionAction {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::SelectOption(_) => "select an option",
            SessionAction::EnterText(_) => "enter text",
            SessionAction::Submit => "submit",
            SessionAction::Retry => "retry",
            SessionAction::Advance => "advance",
            SessionAction::ToggleHint => "toggle the hint",
        }
    }
}

/// Notable outcome of a transition, beyond the new state itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    AnswerEvaluated { correct: bool, hearts: u8 },
    /// Emitted once, on the transition into `LessonComplete`.
    LessonCompleted,
    /// Emitted once, on the transition into `LessonFailed`.
    HeartsExhausted,
}

/// New state produced by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub event: Option<SessionEvent>,
}

impl Transition {
    fn quiet(state: SessionState) -> Self {
        Self { state, event: None }
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Snapshot of one lesson traversal.
///
/// Values are never mutated in place: `reduce` returns the next snapshot and
/// leaves `self` untouched, also when the action is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    phase: SessionPhase,
    step_index: usize,
    input: AnswerInput,
    last_correct: bool,
    hearts: u8,
    hint_visible: bool,
}

impl SessionState {
    #[must_use]
    pub fn new(rules: &SessionRules) -> Self {
        Self {
            phase: SessionPhase::AnsweringStep,
            step_index: 0,
            input: AnswerInput::Empty,
            last_correct: false,
            hearts: rules.starting_hearts,
            hint_visible: false,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    #[must_use]
    pub fn input(&self) -> &AnswerInput {
        &self.input
    }

    /// True once an answer has been evaluated and until the step is reset.
    #[must_use]
    pub fn result_revealed(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::ResultShown | SessionPhase::LessonFailed
        )
    }

    #[must_use]
    pub fn last_correct(&self) -> bool {
        self.last_correct
    }

    #[must_use]
    pub fn hearts(&self) -> u8 {
        self.hearts
    }

    #[must_use]
    pub fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    /// Compute the state that follows `action`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the action is not valid in the current phase or
    /// does not fit the current step. The receiver is unchanged in every case.
    pub fn reduce(
        &self,
        lesson: &Lesson,
        rules: &SessionRules,
        action: SessionAction,
    ) -> Result<Transition, SessionError> {
        let name = action.name();
        match action {
            SessionAction::SelectOption(index) => {
                self.require(name, SessionPhase::AnsweringStep)?;
                self.select_option(self.current_step(lesson)?, index)
            }
            SessionAction::EnterText(text) => {
                self.require(name, SessionPhase::AnsweringStep)?;
                self.enter_text(self.current_step(lesson)?, text)
            }
            SessionAction::Submit => {
                self.require(name, SessionPhase::AnsweringStep)?;
                self.submit(self.current_step(lesson)?, rules)
            }
            SessionAction::Retry => {
                self.require(name, SessionPhase::ResultShown)?;
                self.retry()
            }
            SessionAction::Advance => {
                self.require(name, SessionPhase::ResultShown)?;
                Ok(self.advance(lesson))
            }
            SessionAction::ToggleHint => {
                if self.phase.is_terminal() {
                    return Err(self.invalid(name));
                }
                Ok(Transition::quiet(Self {
                    hint_visible: !self.hint_visible,
                    ..self.clone()
                }))
            }
        }
    }

    fn require(&self, action: &'static str, phase: SessionPhase) -> Result<(), SessionError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase,
        }
    }

    fn current_step<'a>(&self, lesson: &'a Lesson) -> Result<&'a Step, SessionError> {
        lesson
            .step(self.step_index)
            .ok_or(SessionError::StepOutOfRange {
                index: self.step_index,
            })
    }

    fn select_option(&self, step: &Step, index: usize) -> Result<Transition, SessionError> {
        let StepKind::MultipleChoice { options, .. } = step.kind() else {
            return Err(SessionError::InputMismatch {
                action: "select an option",
                kind: step.kind().tag(),
            });
        };
        if index >= options.len() {
            return Err(SessionError::OptionOutOfRange {
                index,
                len: options.len(),
            });
        }
        Ok(Transition::quiet(Self {
            input: AnswerInput::Option(index),
            ..self.clone()
        }))
    }

    fn enter_text(&self, step: &Step, text: String) -> Result<Transition, SessionError> {
        if !matches!(step.kind(), StepKind::Writing { .. }) {
            return Err(SessionError::InputMismatch {
                action: "enter text",
                kind: step.kind().tag(),
            });
        }
        Ok(Transition::quiet(Self {
            input: AnswerInput::Text(text),
            ..self.clone()
        }))
    }

    fn submit(&self, step: &Step, rules: &SessionRules) -> Result<Transition, SessionError> {
        if self.input.is_empty() {
            return Err(SessionError::EmptySubmission);
        }

        let correct = step.is_correct(&self.input);
        let hearts = if correct {
            self.hearts
        } else {
            self.hearts.saturating_sub(1)
        };
        let exhausted =
            !correct && hearts == 0 && rules.hearts_policy == HeartsPolicy::FailLesson;

        let state = Self {
            phase: if exhausted {
                SessionPhase::LessonFailed
            } else {
                SessionPhase::ResultShown
            },
            last_correct: correct,
            hearts,
            ..self.clone()
        };
        let event = if exhausted {
            SessionEvent::HeartsExhausted
        } else {
            SessionEvent::AnswerEvaluated { correct, hearts }
        };
        Ok(Transition {
            state,
            event: Some(event),
        })
    }

    fn retry(&self) -> Result<Transition, SessionError> {
        if self.last_correct {
            return Err(self.invalid("retry"));
        }
        Ok(Transition::quiet(self.reset_step(self.step_index)))
    }

    fn advance(&self, lesson: &Lesson) -> Transition {
        if self.step_index >= lesson.last_index() {
            return Transition {
                state: Self {
                    phase: SessionPhase::LessonComplete,
                    ..self.clone()
                },
                event: Some(SessionEvent::LessonCompleted),
            };
        }
        Transition::quiet(self.reset_step(self.step_index + 1))
    }

    /// Fresh per-step fields at `step_index`; hearts carry over.
    fn reset_step(&self, step_index: usize) -> Self {
        Self {
            phase: SessionPhase::AnsweringStep,
            step_index,
            input: AnswerInput::Empty,
            last_correct: false,
            hearts: self.hearts,
            hint_visible: false,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LessonId, StepId};

    fn lesson() -> Lesson {
        let choose = Step::multiple_choice(
            StepId::new(1),
            "How do you say hello?",
            vec!["Adiós".into(), "Hola".into()],
            1,
        )
        .unwrap();
        let write = Step::writing(StepId::new(2), "Write hello", "Hola").unwrap();
        Lesson::new(LessonId::new("1").unwrap(), "Greetings", vec![choose, write]).unwrap()
    }

    fn step(
        state: &SessionState,
        lesson: &Lesson,
        action: SessionAction,
    ) -> Result<Transition, SessionError> {
        state.reduce(lesson, &SessionRules::default(), action)
    }

    fn answered(lesson: &Lesson, option: usize) -> SessionState {
        let state = SessionState::new(&SessionRules::default());
        let state = step(&state, lesson, SessionAction::SelectOption(option))
            .unwrap()
            .state;
        step(&state, lesson, SessionAction::Submit).unwrap().state
    }

    #[test]
    fn new_state_starts_at_first_step_with_full_hearts() {
        let state = SessionState::new(&SessionRules::default());
        assert_eq!(state.phase(), SessionPhase::AnsweringStep);
        assert_eq!(state.step_index(), 0);
        assert_eq!(state.hearts(), 5);
        assert!(!state.result_revealed());
        assert!(!state.hint_visible());
    }

    #[test]
    fn empty_submission_is_rejected_without_penalty() {
        let lesson = lesson();
        let state = SessionState::new(&SessionRules::default());
        let err = step(&state, &lesson, SessionAction::Submit).unwrap_err();
        assert_eq!(err, SessionError::EmptySubmission);
        assert_eq!(state.hearts(), 5);
    }

    #[test]
    fn wrong_answer_costs_one_heart() {
        let lesson = lesson();
        let state = answered(&lesson, 0);
        assert_eq!(state.phase(), SessionPhase::ResultShown);
        assert!(!state.last_correct());
        assert_eq!(state.hearts(), 4);
    }

    #[test]
    fn retry_is_rejected_after_correct_answer() {
        let lesson = lesson();
        let state = answered(&lesson, 1);
        let err = step(&state, &lesson, SessionAction::Retry).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition { action: "retry", .. }
        ));
    }

    #[test]
    fn retry_keeps_index_and_hearts() {
        let lesson = lesson();
        let state = answered(&lesson, 0);
        let state = step(&state, &lesson, SessionAction::ToggleHint)
            .unwrap()
            .state;
        let retried = step(&state, &lesson, SessionAction::Retry).unwrap().state;

        assert_eq!(retried.phase(), SessionPhase::AnsweringStep);
        assert_eq!(retried.step_index(), 0);
        assert_eq!(retried.hearts(), 4);
        assert_eq!(retried.input(), &AnswerInput::Empty);
        assert!(!retried.hint_visible());
    }

    #[test]
    fn advance_is_rejected_while_answering() {
        let lesson = lesson();
        let state = SessionState::new(&SessionRules::default());
        let err = step(&state, &lesson, SessionAction::Advance).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                action: "advance",
                phase: SessionPhase::AnsweringStep,
            }
        );
    }

    #[test]
    fn input_must_match_step_kind() {
        let lesson = lesson();
        let state = SessionState::new(&SessionRules::default());
        let err = step(&state, &lesson, SessionAction::EnterText("Hola".into())).unwrap_err();
        assert!(matches!(err, SessionError::InputMismatch { .. }));

        let err = step(&state, &lesson, SessionAction::SelectOption(2)).unwrap_err();
        assert_eq!(err, SessionError::OptionOutOfRange { index: 2, len: 2 });
    }

    #[test]
    fn input_is_locked_once_result_is_shown() {
        let lesson = lesson();
        let state = answered(&lesson, 0);
        let err = step(&state, &lesson, SessionAction::SelectOption(1)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[test]
    fn hint_toggles_in_both_live_phases() {
        let lesson = lesson();
        let state = SessionState::new(&SessionRules::default());
        let shown = step(&state, &lesson, SessionAction::ToggleHint).unwrap().state;
        assert!(shown.hint_visible());
        let hidden = step(&shown, &lesson, SessionAction::ToggleHint).unwrap().state;
        assert!(!hidden.hint_visible());

        let result = answered(&lesson, 1);
        let shown = step(&result, &lesson, SessionAction::ToggleHint).unwrap().state;
        assert!(shown.hint_visible());
        assert!(shown.last_correct());
    }

    #[test]
    fn advance_on_last_step_completes() {
        let lesson = lesson();
        let state = answered(&lesson, 1);
        let state = step(&state, &lesson, SessionAction::Advance).unwrap().state;
        assert_eq!(state.step_index(), 1);

        let state = step(&state, &lesson, SessionAction::EnterText("hola".into()))
            .unwrap()
            .state;
        let state = step(&state, &lesson, SessionAction::Submit).unwrap().state;
        let done = step(&state, &lesson, SessionAction::Advance).unwrap();

        assert_eq!(done.state.phase(), SessionPhase::LessonComplete);
        assert_eq!(done.event, Some(SessionEvent::LessonCompleted));
        assert!(step(&done.state, &lesson, SessionAction::ToggleHint).is_err());
    }

    #[test]
    fn last_heart_fails_the_lesson_by_default() {
        let lesson = lesson();
        let rules = SessionRules::default().with_starting_hearts(1);
        let state = SessionState::new(&rules);
        let state = state
            .reduce(&lesson, &rules, SessionAction::SelectOption(0))
            .unwrap()
            .state;
        let failed = state.reduce(&lesson, &rules, SessionAction::Submit).unwrap();

        assert_eq!(failed.state.phase(), SessionPhase::LessonFailed);
        assert_eq!(failed.event, Some(SessionEvent::HeartsExhausted));
        assert!(failed.state.result_revealed());
        assert!(
            failed
                .state
                .reduce(&lesson, &rules, SessionAction::Retry)
                .is_err()
        );
    }

    #[test]
    fn keep_playing_allows_retries_at_zero_hearts() {
        let lesson = lesson();
        let rules = SessionRules::default()
            .with_starting_hearts(1)
            .with_hearts_policy(HeartsPolicy::KeepPlaying);
        let mut state = SessionState::new(&rules);
        for _ in 0..3 {
            state = state
                .reduce(&lesson, &rules, SessionAction::SelectOption(0))
                .unwrap()
                .state;
            state = state
                .reduce(&lesson, &rules, SessionAction::Submit)
                .unwrap()
                .state;
            assert_eq!(state.phase(), SessionPhase::ResultShown);
            assert_eq!(state.hearts(), 0);
            state = state
                .reduce(&lesson, &rules, SessionAction::Retry)
                .unwrap()
                .state;
        }
        assert_eq!(state.step_index(), 0);
    }

    #[test]
    fn state_from_a_longer_lesson_is_rejected() {
        let state = answered(&lesson(), 1);
        let state = step(&state, &lesson(), SessionAction::Advance).unwrap().state;
        assert_eq!(state.step_index(), 1);

        let short = Lesson::new(
            LessonId::new("2").unwrap(),
            "Short",
            vec![Step::writing(StepId::new(1), "Write hi", "Hola").unwrap()],
        )
        .unwrap();
        let err = step(&state, &short, SessionAction::EnterText("hola".into())).unwrap_err();
        assert_eq!(err, SessionError::StepOutOfRange { index: 1 });
    }
}
