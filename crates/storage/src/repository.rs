use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::ProgressRecord;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Fixed key the progress record is stored under.
pub const PROGRESS_NAMESPACE: &str = "user-progress";

/// Version written into every stored progress payload.
pub const PROGRESS_FORMAT_VERSION: u32 = 1;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── PAYLOAD ───────────────────────────────────────────────────────────────────
//

/// On-disk shape of the progress record: the record's own fields plus a format version.
#[derive(Debug, Serialize, Deserialize)]
struct ProgressPayload {
    version: u32,
    #[serde(flatten)]
    record: ProgressRecord,
}

/// Serialize a record into its stored JSON form.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_progress(record: &ProgressRecord) -> Result<String, StorageError> {
    #[derive(Serialize)]
    struct Borrowed<'a> {
        version: u32,
        #[serde(flatten)]
        record: &'a ProgressRecord,
    }

    serde_json::to_string(&Borrowed {
        version: PROGRESS_FORMAT_VERSION,
        record,
    })
    .map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Parse a stored JSON payload back into a record.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the payload is malformed or was written
/// by a newer format version.
pub fn decode_progress(payload: &str) -> Result<ProgressRecord, StorageError> {
    let parsed: ProgressPayload = serde_json::from_str(payload)
        .map_err(|err| StorageError::Serialization(err.to_string()))?;
    if parsed.version > PROGRESS_FORMAT_VERSION {
        return Err(StorageError::Serialization(format!(
            "unsupported progress format version {}",
            parsed.version
        )));
    }
    Ok(parsed.record)
}

//
// ─── CONTRACT ──────────────────────────────────────────────────────────────────
//

/// Durable home of the single progress record.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the stored record, or `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if storage is unreachable or the payload is corrupt.
    async fn load_progress(&self) -> Result<Option<ProgressRecord>, StorageError>;

    /// Replace the stored record in one atomic write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_progress(
        &self,
        record: &ProgressRecord,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Keeps the encoded payload so it exercises the same codec as durable backends.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<Option<(String, DateTime<Utc>)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored payload verbatim, bypassing the codec.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw_payload(
        &self,
        payload: impl Into<String>,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some((payload.into(), saved_at));
        Ok(())
    }

    /// Timestamp of the last save, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn last_saved_at(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.as_ref().map(|(_, at)| *at))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .as_ref()
            .map(|(payload, _)| decode_progress(payload))
            .transpose()
    }

    async fn save_progress(
        &self,
        record: &ProgressRecord,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = encode_progress(record)?;
        self.put_raw_payload(payload, saved_at)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::{AwardPolicy, LanguageCode, LessonId};
    use lesson_core::time::fixed_now;

    fn sample_record() -> ProgressRecord {
        let mut record = ProgressRecord::default();
        for (lang, id) in [("english", "1"), ("english", "2"), ("hindi", "1")] {
            record.record_completion(
                &LanguageCode::new(lang).unwrap(),
                &LessonId::new(id).unwrap(),
                AwardPolicy::OncePerLesson,
            );
        }
        record
    }

    #[tokio::test]
    async fn empty_repository_loads_nothing() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_progress().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn round_trips_progress_record() {
        let repo = InMemoryRepository::new();
        let record = sample_record();

        repo.save_progress(&record, fixed_now()).await.unwrap();

        let loaded = repo.load_progress().await.unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(repo.last_saved_at().unwrap(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn corrupt_payload_is_a_serialization_error() {
        let repo = InMemoryRepository::new();
        repo.put_raw_payload("{not json", fixed_now()).unwrap();
        let err = repo.load_progress().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn payload_carries_version_and_record_fields() {
        let payload = encode_progress(&sample_record()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["streak"], 3);
        assert_eq!(value["points"], 300);
        assert_eq!(value["completedLessons"]["english"][1], "2");
    }

    #[test]
    fn newer_payload_version_is_rejected() {
        let err = decode_progress(r#"{"version": 99, "streak": 1, "points": 100}"#).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
