//! libSQL post index (offline mode).
//!
//! Records one [`PostRecord`] per persisted post. The files on disk stay
//! authoritative; callers treat index failures as non-fatal.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, Row, params};
use postcrew_shared::{PostId, PostRecord, PostcrewError, Result};
use tracing::{debug, info};

use crate::migrations;

/// Index database file name inside the output directory.
pub const INDEX_FILE_NAME: &str = "posts.db";

fn storage_err(e: impl std::fmt::Display) -> PostcrewError {
    PostcrewError::Storage(e.to_string())
}

/// Handle on the post index database.
pub struct PostIndex {
    _db: Database,
    conn: Connection,
}

impl PostIndex {
    /// Open or create the index at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PostcrewError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let index = Self { _db: db, conn };
        index.run_migrations().await?;
        Ok(index)
    }

    /// Open the index that lives in `output_dir`.
    pub async fn open_in(output_dir: &Path) -> Result<Self> {
        Self::open(&output_dir.join(INDEX_FILE_NAME)).await
    }

    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    PostcrewError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 before the first migration.
    async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0, // table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Post operations
    // -----------------------------------------------------------------------

    pub async fn insert_post(&self, record: &PostRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO posts (id, topic, focus, content_path, rendered_path, content_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id.to_string(),
                    record.topic.as_str(),
                    record.focus.as_str(),
                    path_str(&record.content_path),
                    path_str(&record.rendered_path),
                    record.content_hash.as_str(),
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(storage_err)?;

        debug!(id = %record.id, path = %record.content_path.display(), "post indexed");
        Ok(())
    }

    pub async fn get_post_by_path(&self, content_path: &Path) -> Result<Option<PostRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, topic, focus, content_path, rendered_path, content_hash, created_at, updated_at
                 FROM posts WHERE content_path = ?1",
                params![path_str(content_path)],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    /// All indexed posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<PostRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, topic, focus, content_path, rendered_path, content_hash, created_at, updated_at
                 FROM posts ORDER BY created_at DESC, id DESC",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    /// Record a new content hash after a save. Returns whether a row matched.
    pub async fn touch_post(&self, content_path: &Path, content_hash: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE posts SET content_hash = ?1, updated_at = ?2 WHERE content_path = ?3",
                params![content_hash, now.as_str(), path_str(content_path)],
            )
            .await
            .map_err(storage_err)?;
        Ok(changed > 0)
    }

    /// Drop the row for `content_path`. Returns whether a row was removed.
    pub async fn delete_post_by_path(&self, content_path: &Path) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM posts WHERE content_path = ?1",
                params![path_str(content_path)],
            )
            .await
            .map_err(storage_err)?;
        Ok(changed > 0)
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| PostcrewError::Storage(format!("invalid timestamp '{value}': {e}")))
}

fn row_to_record(row: &Row) -> Result<PostRecord> {
    let id: String = row.get(0).map_err(storage_err)?;
    let created_at: String = row.get(6).map_err(storage_err)?;
    let updated_at: String = row.get(7).map_err(storage_err)?;

    Ok(PostRecord {
        id: id
            .parse::<PostId>()
            .map_err(|e| PostcrewError::Storage(format!("invalid post id '{id}': {e}")))?,
        topic: row.get(1).map_err(storage_err)?,
        focus: row.get(2).map_err(storage_err)?,
        content_path: PathBuf::from(row.get::<String>(3).map_err(storage_err)?),
        rendered_path: PathBuf::from(row.get::<String>(4).map_err(storage_err)?),
        content_hash: row.get(5).map_err(storage_err)?,
        created_at: parse_time(&created_at)?,
        updated_at: parse_time(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    async fn test_index() -> PostIndex {
        let tmp = std::env::temp_dir().join(format!("postcrew_test_{}.db", Uuid::now_v7()));
        PostIndex::open(&tmp).await.expect("open test db")
    }

    fn record(stem: &str, created_at: DateTime<Utc>) -> PostRecord {
        PostRecord {
            id: PostId::new(),
            topic: "Edge Computing".into(),
            focus: "latency".into(),
            content_path: PathBuf::from(format!("generated_posts/{stem}.md")),
            rendered_path: PathBuf::from(format!("generated_posts/{stem}.html")),
            content_hash: "abc123".into(),
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let index = test_index().await;
        assert_eq!(index.schema_version().await, 2);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("postcrew_test_{}.db", Uuid::now_v7()));
        let first = PostIndex::open(&tmp).await.expect("first open");
        drop(first);
        let second = PostIndex::open(&tmp).await.expect("second open");
        assert_eq!(second.schema_version().await, 2);
    }

    #[tokio::test]
    async fn insert_and_get_by_path() {
        let index = test_index().await;
        let rec = record("edge-computing_20240101_120000", Utc::now());
        index.insert_post(&rec).await.expect("insert");

        let found = index
            .get_post_by_path(&rec.content_path)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(found.id, rec.id);
        assert_eq!(found.topic, "Edge Computing");
        assert_eq!(found.rendered_path, rec.rendered_path);
        assert_eq!(found.created_at.timestamp(), rec.created_at.timestamp());

        let missing = index
            .get_post_by_path(Path::new("generated_posts/none.md"))
            .await
            .expect("get missing");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn duplicate_path_is_rejected() {
        let index = test_index().await;
        let rec = record("dup", Utc::now());
        index.insert_post(&rec).await.unwrap();

        let again = PostRecord {
            id: PostId::new(),
            ..rec
        };
        let result = index.insert_post(&again).await;
        assert!(matches!(result, Err(PostcrewError::Storage(_))));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let index = test_index().await;
        let now = Utc::now();
        index.insert_post(&record("old", now - Duration::hours(2))).await.unwrap();
        index.insert_post(&record("new", now)).await.unwrap();
        index.insert_post(&record("mid", now - Duration::hours(1))).await.unwrap();

        let stems: Vec<String> = index
            .list_posts()
            .await
            .expect("list")
            .iter()
            .map(|r| r.content_path.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(stems, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn touch_updates_hash() {
        let index = test_index().await;
        let rec = record("touched", Utc::now() - Duration::minutes(5));
        index.insert_post(&rec).await.unwrap();

        assert!(index.touch_post(&rec.content_path, "def456").await.unwrap());
        let found = index.get_post_by_path(&rec.content_path).await.unwrap().unwrap();
        assert_eq!(found.content_hash, "def456");
        assert!(found.updated_at > found.created_at);

        let untracked = index
            .touch_post(Path::new("generated_posts/other.md"), "x")
            .await
            .unwrap();
        assert!(!untracked);
    }

    #[tokio::test]
    async fn delete_by_path() {
        let index = test_index().await;
        let rec = record("gone", Utc::now());
        index.insert_post(&rec).await.unwrap();

        assert!(index.delete_post_by_path(&rec.content_path).await.unwrap());
        assert!(!index.delete_post_by_path(&rec.content_path).await.unwrap());
        assert!(index.list_posts().await.unwrap().is_empty());
    }
}
