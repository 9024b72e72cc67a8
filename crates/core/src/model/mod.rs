mod catalog;
mod ids;
mod lesson;
mod progress;
mod step;

pub use ids::{LanguageCode, LessonId, ParseIdError, StepId};

pub use catalog::{Catalog, CatalogError};
pub use lesson::{Lesson, LessonDraft, LessonError};
pub use progress::{
    AwardPolicy, CompletionAward, POINTS_PER_LESSON, ProgressRecord, STREAK_PER_LESSON,
};
pub use step::{AnswerInput, AnswerKey, Step, StepDraft, StepError, StepKind, StepKindTag};
