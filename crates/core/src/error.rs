use thiserror::Error;

use crate::model::{CatalogError, LessonError, ParseIdError, StepError};
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    Step(#[from] StepError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LanguageCode, Lesson, LessonId};

    fn build(title: &str) -> Result<Lesson, Error> {
        let id = LessonId::new("1")?;
        Ok(Lesson::new(id, title, Vec::new())?)
    }

    #[test]
    fn layer_errors_convert_with_question_mark() {
        assert!(matches!(build("Basics"), Err(Error::Lesson(_))));
        let err: Error = LanguageCode::new(" ").unwrap_err().into();
        assert!(matches!(err, Error::Id(_)));
    }
}
