#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod error;
pub mod lessons;
pub mod progress_store;

pub use lesson_core::Clock;

pub use app_services::AppServices;
pub use catalog::{load_catalog_from_path, load_catalog_from_str};
pub use error::{AppServicesError, CatalogLoadError, PlayerError};
pub use lessons::{LessonListItem, LessonPlayer, ResultView, StepOutcome, StepView};
pub use progress_store::{CompletionOutcome, ProgressStore};
