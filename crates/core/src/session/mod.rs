//! Lesson session state machine.
//!
//! `SessionState::reduce` is the pure transition function; `LessonSession`
//! binds it to one lesson and turns completion into a `CompletionSignal`.

mod engine;
mod rules;
mod state;

pub use engine::{CompletionSignal, LessonSession};
pub use rules::{HeartsPolicy, STARTING_HEARTS, SessionRules};
pub use state::{
    SessionAction, SessionError, SessionEvent, SessionPhase, SessionState, Transition,
};
