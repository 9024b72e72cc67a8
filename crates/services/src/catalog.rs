//! Loading lesson content into a `Catalog`.
//!
//! Content is JSON keyed by language code, each value an ordered list of lessons.
//! Step and lesson invariants are checked while parsing, so a catalog that loads
//! is always playable.

use std::path::Path;

use lesson_core::model::Catalog;

use crate::error::CatalogLoadError;

/// Parse a catalog from JSON text.
///
/// # Errors
///
/// Returns `CatalogLoadError::Parse` if the JSON is malformed or any lesson or
/// step breaks its invariants.
pub fn load_catalog_from_str(json: &str) -> Result<Catalog, CatalogLoadError> {
    let catalog: Catalog = serde_json::from_str(json)?;
    tracing::debug!(
        languages = catalog.languages().count(),
        "loaded lesson catalog"
    );
    Ok(catalog)
}

/// Read and parse a catalog file.
///
/// # Errors
///
/// Returns `CatalogLoadError::Io` if the file cannot be read, or
/// `CatalogLoadError::Parse` as for [`load_catalog_from_str`].
pub fn load_catalog_from_path(path: impl AsRef<Path>) -> Result<Catalog, CatalogLoadError> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    load_catalog_from_str(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = r#"{
        "spanish": [
            {
                "id": "1",
                "title": "Greetings",
                "steps": [
                    {
                        "id": 1,
                        "type": "multiple-choice",
                        "question": "How do you say hello?",
                        "options": ["Adiós", "Hola", "Gracias"],
                        "correctAnswer": 1,
                        "explanation": "Hola is the everyday greeting."
                    },
                    {
                        "id": 2,
                        "type": "writing",
                        "question": "Write hello in Spanish",
                        "correctAnswer": "Hola",
                        "hint": "Four letters"
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn loads_language_keyed_lessons() {
        let catalog = load_catalog_from_str(CONTENT).unwrap();
        let lesson = catalog.lesson_by_id("spanish", "1").unwrap();
        assert_eq!(lesson.len(), 2);
        assert_eq!(lesson.steps()[1].hint(), Some("Four letters"));
        assert!(catalog.lessons_for("english").is_empty());
    }

    #[test]
    fn rejects_invalid_answer_key() {
        let broken = CONTENT.replace("\"correctAnswer\": 1", "\"correctAnswer\": 7");
        let err = load_catalog_from_str(&broken).unwrap_err();
        assert!(matches!(err, CatalogLoadError::Parse(_)));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn rejects_duplicate_lessons() {
        let json = r#"{"spanish": [
            {"id": "1", "title": "A", "steps": [{"id": 1, "type": "writing", "question": "Q", "correctAnswer": "a"}]},
            {"id": "1", "title": "B", "steps": [{"id": 1, "type": "writing", "question": "Q", "correctAnswer": "b"}]}
        ]}"#;
        assert!(load_catalog_from_str(json).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_catalog_from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CatalogLoadError::Io(_)));
    }
}
