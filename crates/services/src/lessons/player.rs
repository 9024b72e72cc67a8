use std::sync::Arc;

use lesson_core::model::Catalog;
use lesson_core::session::{LessonSession, SessionAction, SessionPhase, SessionRules};

use crate::error::PlayerError;
use crate::lessons::LessonListItem;
use crate::progress_store::{CompletionOutcome, ProgressStore};

/// Result of dispatching one action to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub phase: SessionPhase,
    pub hearts: u8,
    /// Present only for the action that finished the lesson.
    pub completion: Option<CompletionOutcome>,
}

/// Host for lesson sessions: resolves lessons from the catalog and forwards
/// completion signals to the progress store.
#[derive(Clone)]
pub struct LessonPlayer {
    catalog: Arc<Catalog>,
    progress: ProgressStore,
    rules: SessionRules,
}

impl LessonPlayer {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, progress: ProgressStore) -> Self {
        Self {
            catalog,
            progress,
            rules: SessionRules::default(),
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: SessionRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn progress_store(&self) -> &ProgressStore {
        &self.progress
    }

    #[must_use]
    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    /// Lessons for `language` in catalog order, flagged with completion state.
    pub async fn lesson_list(&self, language: &str) -> Vec<LessonListItem> {
        let progress = self.progress.progress().await;
        self.catalog
            .lessons_for(language)
            .iter()
            .map(|lesson| {
                LessonListItem::new(lesson, progress.is_completed(language, lesson.id().as_str()))
            })
            .collect()
    }

    /// Start a session on `(language, lesson_id)`.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::LessonNotFound` if the catalog has no such lesson.
    pub fn start_lesson(
        &self,
        language: &str,
        lesson_id: &str,
    ) -> Result<LessonSession, PlayerError> {
        let session = LessonSession::from_catalog(&self.catalog, language, lesson_id, self.rules)
            .ok_or_else(|| PlayerError::LessonNotFound {
                language: language.to_owned(),
                lesson_id: lesson_id.to_owned(),
            })?;
        tracing::debug!(
            language = %session.language(),
            lesson_id = %session.lesson().id(),
            steps = session.total_steps(),
            "lesson started"
        );
        Ok(session)
    }

    /// Apply `action` to `session`; if it finishes the lesson, record the completion.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Session` if the action is rejected. Storage problems are
    /// handled by the progress store and never surface here.
    pub async fn dispatch(
        &self,
        session: &mut LessonSession,
        action: SessionAction,
    ) -> Result<StepOutcome, PlayerError> {
        let signal = session.apply(action).inspect_err(|err| {
            tracing::debug!(error = %err, "session action rejected");
        })?;

        let completion = match signal {
            Some(signal) => Some(self.progress.apply_signal(&signal).await),
            None => None,
        };

        Ok(StepOutcome {
            phase: session.phase(),
            hearts: session.hearts(),
            completion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::Clock;
    use lesson_core::model::{LanguageCode, Lesson, LessonId, Step, StepId};
    use lesson_core::time::fixed_now;

    fn player() -> LessonPlayer {
        let step = Step::writing(StepId::new(1), "Write thank you", "Gracias").unwrap();
        let lesson = Lesson::new(LessonId::new("2").unwrap(), "Manners", vec![step]).unwrap();
        let catalog = Catalog::new([(LanguageCode::new("spanish").unwrap(), vec![lesson])]).unwrap();
        LessonPlayer::new(
            Arc::new(catalog),
            ProgressStore::in_memory(Clock::fixed(fixed_now())),
        )
    }

    #[test]
    fn unknown_lesson_is_not_found() {
        let err = player().start_lesson("spanish", "9").unwrap_err();
        assert!(matches!(err, PlayerError::LessonNotFound { .. }));
        assert_eq!(err.to_string(), "lesson 9 not found for language spanish");
    }

    #[tokio::test]
    async fn finishing_records_progress_once() {
        let player = player();
        let mut session = player.start_lesson("spanish", "2").unwrap();

        player
            .dispatch(&mut session, SessionAction::EnterText("gracias".into()))
            .await
            .unwrap();
        let evaluated = player
            .dispatch(&mut session, SessionAction::Submit)
            .await
            .unwrap();
        assert_eq!(evaluated.phase, SessionPhase::ResultShown);
        assert!(evaluated.completion.is_none());

        let done = player
            .dispatch(&mut session, SessionAction::Advance)
            .await
            .unwrap();
        assert_eq!(done.phase, SessionPhase::LessonComplete);
        let completion = done.completion.expect("completion recorded");
        assert!(completion.progress.is_completed("spanish", "2"));

        let again = player.dispatch(&mut session, SessionAction::Advance).await;
        assert!(matches!(again, Err(PlayerError::Session(_))));
        assert_eq!(player.progress_store().progress().await.points(), 100);
    }

    #[tokio::test]
    async fn lesson_list_flags_completed_lessons() {
        let player = player();
        assert!(!player.lesson_list("spanish").await[0].completed);

        player
            .progress_store()
            .complete_lesson(
                &LanguageCode::new("spanish").unwrap(),
                &LessonId::new("2").unwrap(),
            )
            .await;

        let list = player.lesson_list("spanish").await;
        assert_eq!(list.len(), 1);
        assert!(list[0].completed);
        assert_eq!(list[0].title, "Manners");
        assert!(player.lesson_list("klingon").await.is_empty());
    }

    #[tokio::test]
    async fn abandoned_session_records_nothing() {
        let player = player();
        let mut session = player.start_lesson("spanish", "2").unwrap();
        player
            .dispatch(&mut session, SessionAction::EnterText("gracias".into()))
            .await
            .unwrap();
        drop(session);

        assert_eq!(player.progress_store().progress().await.points(), 0);
    }
}
