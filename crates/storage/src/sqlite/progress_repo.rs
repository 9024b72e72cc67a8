use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::repository::{ProgressRepository, StorageError, decode_progress, encode_progress};
use lesson_core::model::ProgressRecord;

use super::SqliteRepository;

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT payload
            FROM progress_records
            WHERE namespace = ?1
            ",
        )
        .bind(&self.namespace)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row
            .try_get("payload")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        decode_progress(&payload).map(Some)
    }

    async fn save_progress(
        &self,
        record: &ProgressRecord,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = encode_progress(record)?;

        sqlx::query(
            r"
            INSERT INTO progress_records (namespace, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(namespace) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&self.namespace)
        .bind(payload)
        .bind(saved_at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
