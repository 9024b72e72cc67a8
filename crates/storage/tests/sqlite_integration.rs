use lesson_core::model::{AwardPolicy, LanguageCode, LessonId, ProgressRecord};
use lesson_core::time::fixed_now;
use storage::repository::{ProgressRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;

fn record_with(completions: &[(&str, &str)]) -> ProgressRecord {
    let mut record = ProgressRecord::default();
    for (lang, id) in completions {
        record.record_completion(
            &LanguageCode::new(*lang).unwrap(),
            &LessonId::new(*id).unwrap(),
            AwardPolicy::OncePerLesson,
        );
    }
    record
}

async fn memory_repo(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_record() {
    let repo = memory_repo("memdb_progress_roundtrip").await;
    assert!(repo.load_progress().await.unwrap().is_none());

    let record = record_with(&[("english", "1"), ("spanish", "1"), ("spanish", "2")]);
    repo.save_progress(&record, fixed_now()).await.unwrap();

    let loaded = repo.load_progress().await.unwrap().expect("stored record");
    assert_eq!(loaded, record);
    assert_eq!(loaded.completed_count("spanish"), 2);
    assert_eq!(loaded.points(), 300);
}

#[tokio::test]
async fn sqlite_save_replaces_previous_record() {
    let repo = memory_repo("memdb_progress_replace").await;
    repo.save_progress(&record_with(&[("english", "1")]), fixed_now())
        .await
        .unwrap();
    let newer = record_with(&[("english", "1"), ("english", "2")]);
    repo.save_progress(&newer, fixed_now()).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM progress_records")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(repo.load_progress().await.unwrap(), Some(newer));
}

#[tokio::test]
async fn sqlite_corrupt_payload_is_reported() {
    let repo = memory_repo("memdb_progress_corrupt").await;
    sqlx::query(
        "INSERT INTO progress_records (namespace, payload, updated_at) VALUES (?1, ?2, ?3)",
    )
    .bind(repo.namespace())
    .bind("{\"streak\": \"lots\"")
    .bind(fixed_now())
    .execute(repo.pool())
    .await
    .unwrap();

    let err = repo.load_progress().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn sqlite_namespaces_are_isolated() {
    let repo = memory_repo("memdb_progress_namespaces").await;
    let other = repo.clone().with_namespace("guest-progress");

    repo.save_progress(&record_with(&[("hindi", "1")]), fixed_now())
        .await
        .unwrap();

    assert!(other.load_progress().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = memory_repo("memdb_progress_migrate_twice").await;
    repo.migrate().await.expect("second migrate");

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(versions, 1);
}

#[tokio::test]
async fn sqlite_file_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("learn.sqlite3").display());
    let record = record_with(&[("spanish", "1")]);

    {
        let storage = Storage::sqlite(&url).await.expect("open");
        storage
            .progress
            .save_progress(&record, fixed_now())
            .await
            .unwrap();
    }

    let reopened = Storage::sqlite(&url).await.expect("reopen");
    let loaded = reopened.progress.load_progress().await.unwrap();
    assert_eq!(loaded, Some(record));
}
