use std::sync::Arc;

use lesson_core::model::{AwardPolicy, Catalog};
use lesson_core::session::SessionRules;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::lessons::LessonPlayer;
use crate::progress_store::ProgressStore;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    progress: ProgressStore,
    player: LessonPlayer,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: Catalog,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, catalog))
    }

    /// Build services over process-local storage. Progress is lost on exit.
    #[must_use]
    pub fn in_memory(clock: Clock, catalog: Catalog) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, catalog)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, catalog: Catalog) -> Self {
        let catalog = Arc::new(catalog);
        let progress = ProgressStore::new(clock, Arc::clone(&storage.progress));
        let player = LessonPlayer::new(Arc::clone(&catalog), progress.clone());
        Self {
            catalog,
            progress,
            player,
        }
    }

    /// Replace the session rules used for new lessons.
    #[must_use]
    pub fn with_rules(mut self, rules: SessionRules) -> Self {
        self.player = self.player.with_rules(rules);
        self
    }

    /// Replace the award policy. The player shares the store, so both see it.
    #[must_use]
    pub fn with_award_policy(mut self, policy: AwardPolicy) -> Self {
        self.progress = self.progress.with_award_policy(policy);
        let rules = *self.player.rules();
        self.player = LessonPlayer::new(Arc::clone(&self.catalog), self.progress.clone())
            .with_rules(rules);
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
    pub fn lesson_player(&self) -> &LessonPlayer {
        &self.player
    }
}
