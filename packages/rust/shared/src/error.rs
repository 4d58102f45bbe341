//! Error types for postcrew.
//!
//! Library crates use [`PostcrewError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all postcrew operations.
#[derive(Debug, thiserror::Error)]
pub enum PostcrewError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to an external service.
    #[error("network error: {0}")]
    Network(String),

    /// Model invocation error (transport, API, or response shape).
    #[error("llm error: {0}")]
    Llm(String),

    /// Post index (database) error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A post file that was expected to exist does not.
    #[error("post not found: {path:?}")]
    NotFound { path: PathBuf },

    /// Data validation error (out-of-range option, malformed path, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A caller-side precondition was not met (e.g. no post selected).
    #[error("precondition failed: {message}")]
    Precondition { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PostcrewError>;

impl PostcrewError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a precondition error from any displayable message.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    ///
    /// `NotFound` I/O errors become [`PostcrewError::NotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound { path };
        }
        Self::Io { path, source }
    }

    /// Whether this error means "the file is not there".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PostcrewError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = PostcrewError::validation("temperature 1.5 is outside 0.1..=1.0");
        assert!(err.to_string().contains("temperature 1.5"));

        let err = PostcrewError::precondition("no post selected");
        assert_eq!(err.to_string(), "precondition failed: no post selected");
    }

    #[test]
    fn io_not_found_maps_to_not_found() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = PostcrewError::io("posts/a.md", source);
        assert!(err.is_not_found());

        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = PostcrewError::io("posts/a.md", source);
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("posts/a.md"));
    }
}
