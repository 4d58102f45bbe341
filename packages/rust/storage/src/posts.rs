//! File-backed post store.
//!
//! A post is a `<stem>.md` content file plus a `<stem>.html` rendered view
//! in the output directory. The rendered file is regenerated from the
//! content file on every write and never edited directly.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use postcrew_markdown::{extract_title, render_document};
use postcrew_shared::{PostcrewError, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

/// Title used for a saved post whose content has no level-1 heading.
pub const FALLBACK_TITLE: &str = "Edited Post";

/// Highest `_<n>` suffix tried when a new post's stem is taken.
const MAX_STEM_SUFFIX: usize = 100;

/// Outcome of writing a post pair.
#[derive(Debug, Clone)]
pub struct SavedPost {
    pub content_path: PathBuf,
    pub rendered_path: PathBuf,
    pub title: String,
    /// The full rendered document.
    pub html: String,
    pub content_hash: String,
}

/// SHA-256 hex digest of post content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Rendered-view path paired with a content path.
pub fn rendered_path_for(content_path: &Path) -> PathBuf {
    content_path.with_extension("html")
}

/// Post store rooted at one output directory.
#[derive(Debug, Clone)]
pub struct PostStore {
    root: PathBuf,
}

impl PostStore {
    /// Open the store, creating the output directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| PostcrewError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Content files in the output directory, newest modification first.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PostcrewError::io(&self.root, e)),
        };

        let mut posts: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PostcrewError::io(&self.root, e))?;
            let path = entry.path();
            if !is_content_file(&path) {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .map_err(|e| PostcrewError::io(&path, e))?;
            posts.push((modified, path));
        }

        posts.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        Ok(posts.into_iter().map(|(_, path)| path).collect())
    }

    /// The most recently modified post, if any.
    pub fn latest(&self) -> Result<Option<PathBuf>> {
        Ok(self.list()?.into_iter().next())
    }

    /// Read a post's markdown content.
    pub fn load(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| PostcrewError::io(path, e))
    }

    /// Overwrite a post's content and regenerate its rendered view.
    ///
    /// The title comes from the first level-1 heading, else
    /// [`FALLBACK_TITLE`].
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn save(&self, path: &Path, content: &str) -> Result<SavedPost> {
        if !is_content_file(path) {
            return Err(PostcrewError::validation(format!(
                "post path must end in .md: {}",
                path.display()
            )));
        }

        let title = extract_title(content).unwrap_or_else(|| FALLBACK_TITLE.to_string());
        let saved = write_pair(path, content, &title)?;
        info!(title = %saved.title, "post saved");
        Ok(saved)
    }

    /// Write a new post named `<stem>.md` in the output directory.
    ///
    /// Existing posts are never replaced: a taken stem gets the first free
    /// `_2`, `_3`, ... suffix.
    #[instrument(skip_all, fields(stem = %stem))]
    pub fn create(&self, stem: &str, content: &str, title: &str) -> Result<SavedPost> {
        let path = self.reserve(stem)?;
        let saved = match write_pair(&path, content, title) {
            Ok(saved) => saved,
            Err(e) => {
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }
        };
        info!(path = %saved.content_path.display(), "post created");
        Ok(saved)
    }

    /// Claim a content path that no other post uses by creating it empty.
    fn reserve(&self, stem: &str) -> Result<PathBuf> {
        for n in 1..=MAX_STEM_SUFFIX {
            let name = if n == 1 {
                format!("{stem}.md")
            } else {
                format!("{stem}_{n}.md")
            };
            let path = self.root.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(path),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(file = %path.display(), "stem taken");
                }
                Err(e) => return Err(PostcrewError::io(&path, e)),
            }
        }
        Err(PostcrewError::Storage(format!(
            "no free file name for '{stem}' after {MAX_STEM_SUFFIX} attempts"
        )))
    }

    /// Remove a post's content and rendered files. Missing files are fine.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn delete(&self, path: &Path) -> Result<()> {
        for target in [path.to_path_buf(), rendered_path_for(path)] {
            match std::fs::remove_file(&target) {
                Ok(()) => debug!(file = %target.display(), "removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(PostcrewError::io(&target, e)),
            }
        }
        Ok(())
    }
}

fn is_content_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

/// Write content then rendered view, each through a temp sibling and rename.
fn write_pair(content_path: &Path, content: &str, title: &str) -> Result<SavedPost> {
    let rendered_path = rendered_path_for(content_path);
    let html = render_document(content, title);

    write_atomic(content_path, content)?;
    write_atomic(&rendered_path, &html)?;

    Ok(SavedPost {
        content_path: content_path.to_path_buf(),
        rendered_path,
        title: title.to_string(),
        html,
        content_hash: content_hash(content),
    })
}

fn write_atomic(target: &Path, content: &str) -> Result<()> {
    let file_name = target
        .file_name()
        .ok_or_else(|| PostcrewError::validation(format!("not a file path: {}", target.display())))?
        .to_string_lossy();
    let temp = target.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| PostcrewError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| PostcrewError::io(target, e))?;

    debug!(file = %target.display(), size = content.len(), "wrote file");
    Ok(())
}
