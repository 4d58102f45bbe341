//! Persistence for generated posts.
//!
//! - [`PostStore`]: the authoritative `.md`/`.html` file pairs in the output
//!   directory.
//! - [`PostIndex`]: a libSQL database (`posts.db`) recording one
//!   [`PostRecord`](postcrew_shared::PostRecord) per post.

mod index;
mod migrations;
mod posts;

pub use index::{INDEX_FILE_NAME, PostIndex};
pub use posts::{FALLBACK_TITLE, PostStore, SavedPost, content_hash, rendered_path_for};
