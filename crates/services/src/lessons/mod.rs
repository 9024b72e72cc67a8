mod player;
mod view;

pub use player::{LessonPlayer, StepOutcome};
pub use view::{LessonListItem, ResultView, StepView};
