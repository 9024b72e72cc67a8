use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use lesson_core::model::{AwardPolicy, CompletionAward, LanguageCode, LessonId, ProgressRecord};
use lesson_core::session::CompletionSignal;
use storage::repository::{InMemoryRepository, ProgressRepository, StorageError};

use crate::Clock;

/// Result of forwarding one completion to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub award: CompletionAward,
    /// Record after the completion was applied.
    pub progress: ProgressRecord,
    pub completed_at: DateTime<Utc>,
    /// False when the write failed; the in-memory result is still returned.
    pub persisted: bool,
}

/// Sole writer of the learner's progress record.
///
/// Progress is best-effort local state: storage failures are logged and
/// replaced by the default record, never returned to callers.
#[derive(Clone)]
pub struct ProgressStore {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
    policy: AwardPolicy,
    write_lock: Arc<Mutex<()>>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            repo,
            policy: AwardPolicy::default(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(clock, Arc::new(InMemoryRepository::new()))
    }

    #[must_use]
    pub fn with_award_policy(mut self, policy: AwardPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn award_policy(&self) -> AwardPolicy {
        self.policy
    }

    /// Current progress. Never fails: unreadable storage yields the default record.
    pub async fn progress(&self) -> ProgressRecord {
        match self.repo.load_progress().await {
            Ok(record) => record.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "progress unavailable, using empty record");
                ProgressRecord::default()
            }
        }
    }

    /// Record `lesson_id` as completed under `language` and persist the result.
    ///
    /// If the stored record cannot be read, the completion is applied in memory
    /// only and `persisted` is false.
    pub async fn complete_lesson(
        &self,
        language: &LanguageCode,
        lesson_id: &LessonId,
    ) -> CompletionOutcome {
        let _guard = self.write_lock.lock().await;

        // A corrupt payload can only be recovered by overwriting it; any other load
        // failure leaves the stored record untouched.
        let (mut progress, writable) = match self.repo.load_progress().await {
            Ok(record) => (record.unwrap_or_default(), true),
            Err(err @ StorageError::Serialization(_)) => {
                tracing::warn!(error = %err, "stored progress is corrupt, starting over");
                (ProgressRecord::default(), true)
            }
            Err(err) => {
                tracing::warn!(
                    language = %language,
                    lesson_id = %lesson_id,
                    error = %err,
                    "progress unavailable, completion will not be saved"
                );
                (ProgressRecord::default(), false)
            }
        };
        let award = progress.record_completion(language, lesson_id, self.policy);
        let completed_at = self.clock.now();

        let persisted = if !writable {
            false
        } else if award == CompletionAward::AlreadyCompleted {
            true
        } else {
            match self.repo.save_progress(&progress, completed_at).await {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(
                        language = %language,
                        lesson_id = %lesson_id,
                        error = %err,
                        "failed to persist lesson completion"
                    );
                    false
                }
            }
        };

        tracing::info!(
            language = %language,
            lesson_id = %lesson_id,
            ?award,
            streak = progress.streak(),
            points = progress.points(),
            "lesson completed"
        );

        CompletionOutcome {
            award,
            progress,
            completed_at,
            persisted,
        }
    }

    /// Forward a session's completion signal.
    pub async fn apply_signal(&self, signal: &CompletionSignal) -> CompletionOutcome {
        self.complete_lesson(&signal.language, &signal.lesson_id)
            .await
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
