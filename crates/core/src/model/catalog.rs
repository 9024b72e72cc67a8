use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::ids::{LanguageCode, LessonId};
use crate::model::lesson::Lesson;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("language {language}: lesson {id} is defined more than once")]
    DuplicateLesson { language: LanguageCode, id: LessonId },
}

/// Read-only mapping from language to its ordered lessons.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<LanguageCode, Vec<Lesson>>")]
pub struct Catalog {
    languages: BTreeMap<LanguageCode, Vec<Lesson>>,
}

impl TryFrom<BTreeMap<LanguageCode, Vec<Lesson>>> for Catalog {
    type Error = CatalogError;

    fn try_from(languages: BTreeMap<LanguageCode, Vec<Lesson>>) -> Result<Self, Self::Error> {
        Self::new(languages)
    }
}

impl Catalog {
    /// Build a catalog from per-language lesson lists.
    ///
    /// A language listed twice keeps its last list.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateLesson` if a language repeats a lesson id.
    pub fn new(
        entries: impl IntoIterator<Item = (LanguageCode, Vec<Lesson>)>,
    ) -> Result<Self, CatalogError> {
        let languages: BTreeMap<_, _> = entries.into_iter().collect();
        for (language, lessons) in &languages {
            let mut seen = HashSet::with_capacity(lessons.len());
            for lesson in lessons {
                if !seen.insert(lesson.id()) {
                    return Err(CatalogError::DuplicateLesson {
                        language: language.clone(),
                        id: lesson.id().clone(),
                    });
                }
            }
        }
        Ok(Self { languages })
    }

    /// Lessons for `language` in catalog order; empty for an unknown language.
    #[must_use]
    pub fn lessons_for(&self, language: &str) -> &[Lesson] {
        self.languages
            .get(language)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn lesson_by_id(&self, language: &str, lesson_id: &str) -> Option<&Lesson> {
        self.lessons_for(language)
            .iter()
            .find(|lesson| lesson.id().as_str() == lesson_id)
    }

    /// The catalog's own key for `language`, if the language is known.
    #[must_use]
    pub fn language(&self, language: &str) -> Option<&LanguageCode> {
        self.languages.get_key_value(language).map(|(code, _)| code)
    }

    pub fn languages(&self) -> impl Iterator<Item = &LanguageCode> {
        self.languages.keys()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::StepId;
    use crate::model::step::Step;

    fn lesson(id: &str) -> Lesson {
        let step = Step::writing(StepId::new(1), "Translate hello", "Hola").unwrap();
        Lesson::new(LessonId::new(id).unwrap(), format!("Lesson {id}"), vec![step]).unwrap()
    }

    fn spanish() -> LanguageCode {
        LanguageCode::new("spanish").unwrap()
    }

    #[test]
    fn unknown_language_yields_empty_list() {
        let catalog = Catalog::new([(spanish(), vec![lesson("1")])]).unwrap();
        assert!(catalog.lessons_for("klingon").is_empty());
        assert!(catalog.lesson_by_id("klingon", "1").is_none());
    }

    #[test]
    fn finds_lesson_by_language_and_id() {
        let catalog = Catalog::new([(spanish(), vec![lesson("1"), lesson("2")])]).unwrap();
        assert_eq!(catalog.lessons_for("spanish").len(), 2);
        let found = catalog.lesson_by_id("spanish", "2").unwrap();
        assert_eq!(found.title(), "Lesson 2");
        assert!(catalog.lesson_by_id("spanish", "3").is_none());
    }

    #[test]
    fn duplicate_lesson_ids_are_rejected() {
        let err = Catalog::new([(spanish(), vec![lesson("1"), lesson("1")])]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateLesson { .. }));
    }

    #[test]
    fn deserializes_language_keyed_json() {
        let json = r#"{
            "hindi": [{
                "id": "1",
                "title": "Namaste",
                "steps": [{"id": 1, "type": "writing", "question": "Say hello", "correctAnswer": "Namaste"}]
            }]
        }"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.languages().count(), 1);
        assert_eq!(catalog.lessons_for("hindi")[0].len(), 1);
    }
}
