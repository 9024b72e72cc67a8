//! Shared error types for the services crate.

use thiserror::Error;

use lesson_core::session::SessionError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `LessonPlayer`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayerError {
    /// The catalog has no lesson `lesson_id` under `language`. Hosts render a
    /// "not found" view; no session exists.
    #[error("lesson {lesson_id} not found for language {language}")]
    LessonNotFound { language: String, lesson_id: String },
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors emitted while loading lesson content.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogLoadError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
