//! SQL migration definitions for the post index.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: posts",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per persisted post (content + rendered file pair)
CREATE TABLE IF NOT EXISTS posts (
    id            TEXT PRIMARY KEY,
    topic         TEXT NOT NULL,
    focus         TEXT NOT NULL,
    content_path  TEXT NOT NULL UNIQUE,
    rendered_path TEXT NOT NULL,
    content_hash  TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Index posts by creation time",
            sql: r#"
CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
