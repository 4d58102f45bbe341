//! Post library: the file store plus its best-effort index.
//!
//! File operations are authoritative. Index updates that fail are logged at
//! WARN and never fail the operation.

use std::path::{Path, PathBuf};

use chrono::Utc;
use postcrew_shared::{PostId, PostRecord, PostcrewError, Result};
use postcrew_storage::{PostIndex, PostStore, SavedPost};
use tracing::{info, warn};

/// Ensure a post was selected before acting on it.
pub fn require_selection(path: Option<&Path>) -> Result<&Path> {
    path.ok_or_else(|| PostcrewError::precondition("no post selected"))
}

pub struct Library {
    store: PostStore,
    index: Option<PostIndex>,
}

impl Library {
    pub fn new(store: PostStore, index: Option<PostIndex>) -> Self {
        Self { store, index }
    }

    /// Open the store in `output_dir` along with its index.
    ///
    /// An index that cannot be opened is skipped with a warning.
    pub async fn open(output_dir: &Path) -> Result<Self> {
        let store = PostStore::new(output_dir)?;
        let index = match PostIndex::open_in(output_dir).await {
            Ok(index) => Some(index),
            Err(e) => {
                warn!(error = %e, "post index unavailable, continuing without it");
                None
            }
        };
        Ok(Self::new(store, index))
    }

    pub fn list(&self) -> Result<Vec<PathBuf>> {
        self.store.list()
    }

    /// Indexed posts, newest first. Empty when there is no index.
    pub async fn history(&self) -> Result<Vec<PostRecord>> {
        match &self.index {
            Some(index) => index.list_posts().await,
            None => Ok(Vec::new()),
        }
    }

    /// Resolve the post to act on: an explicit path, else the newest post
    /// when `latest` is set.
    pub fn select(&self, path: Option<PathBuf>, latest: bool) -> Result<PathBuf> {
        let chosen = match path {
            Some(path) => Some(path),
            None if latest => self.store.latest()?,
            None => None,
        };
        require_selection(chosen.as_deref()).map(Path::to_path_buf)
    }

    pub fn load(&self, path: &Path) -> Result<String> {
        self.store.load(path)
    }

    /// Write a new post and record it in the index.
    pub async fn create(
        &self,
        stem: &str,
        content: &str,
        topic: &str,
        focus: &str,
    ) -> Result<SavedPost> {
        let saved = self.store.create(stem, content, topic)?;

        if let Some(index) = &self.index {
            let now = Utc::now();
            let record = PostRecord {
                id: PostId::new(),
                topic: topic.to_string(),
                focus: focus.to_string(),
                content_path: saved.content_path.clone(),
                rendered_path: saved.rendered_path.clone(),
                content_hash: saved.content_hash.clone(),
                created_at: now,
                updated_at: now,
            };
            if let Err(e) = index.insert_post(&record).await {
                warn!(error = %e, "failed to index new post");
            }
        }

        Ok(saved)
    }

    /// Save edited content, regenerate the rendered view, refresh the index.
    pub async fn save(&self, path: &Path, content: &str) -> Result<SavedPost> {
        let saved = self.store.save(path, content)?;

        if let Some(index) = &self.index {
            match index.touch_post(path, &saved.content_hash).await {
                Ok(true) => {}
                Ok(false) => info!(path = %path.display(), "saved post is not indexed"),
                Err(e) => warn!(error = %e, "failed to update post index"),
            }
        }

        Ok(saved)
    }

    /// Delete both files of a post and drop its index row. Idempotent.
    pub async fn delete(&self, path: &Path) -> Result<()> {
        self.store.delete(path)?;

        if let Some(index) = &self.index {
            if let Err(e) = index.delete_post_by_path(path).await {
                warn!(error = %e, "failed to remove post from index");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("postcrew_library_{}", Uuid::now_v7()))
    }

    #[test]
    fn require_selection_rejects_none() {
        let err = require_selection(None).unwrap_err();
        assert!(matches!(err, PostcrewError::Precondition { .. }));
        assert_eq!(
            require_selection(Some(Path::new("a.md"))).unwrap(),
            Path::new("a.md")
        );
    }

    #[tokio::test]
    async fn select_latest_and_missing() {
        let dir = temp_dir();
        let library = Library::open(&dir).await.unwrap();

        assert!(matches!(
            library.select(None, true),
            Err(PostcrewError::Precondition { .. })
        ));
        assert!(matches!(
            library.select(None, false),
            Err(PostcrewError::Precondition { .. })
        ));

        let saved = library.create("only", "# Only", "Only", "focus").await.unwrap();
        assert_eq!(library.select(None, true).unwrap(), saved.content_path);
        let explicit = dir.join("other.md");
        assert_eq!(library.select(Some(explicit.clone()), true).unwrap(), explicit);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn crud_keeps_index_in_step() {
        let dir = temp_dir();
        let library = Library::open(&dir).await.unwrap();

        let saved = library
            .create("edge_20240101_000000", "# Edge\n\nv1", "Edge", "latency")
            .await
            .unwrap();
        let history = library.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content_hash, saved.content_hash);

        let edited = library
            .save(&saved.content_path, "# Edge v2\n\nv2")
            .await
            .unwrap();
        assert_eq!(edited.title, "Edge v2");
        assert_eq!(library.load(&saved.content_path).unwrap(), "# Edge v2\n\nv2");
        let history = library.history().await.unwrap();
        assert_eq!(history[0].content_hash, edited.content_hash);

        library.delete(&saved.content_path).await.unwrap();
        library.delete(&saved.content_path).await.unwrap();
        assert!(library.list().unwrap().is_empty());
        assert!(library.history().await.unwrap().is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn works_without_index() {
        let dir = temp_dir();
        let library = Library::new(PostStore::new(&dir).unwrap(), None);
        let saved = library.create("plain", "# Plain", "Plain", "f").await.unwrap();
        assert!(library.history().await.unwrap().is_empty());
        library.save(&saved.content_path, "# Plain 2").await.unwrap();
        library.delete(&saved.content_path).await.unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }
}
