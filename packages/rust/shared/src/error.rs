//! Error types for coursedocs.
//!
//! Library crates use [`CourseDocsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all coursedocs operations.
#[derive(Debug, thiserror::Error)]
pub enum CourseDocsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Zip writer error while packaging a course.
    #[error("archive error at {path:?}: {message}")]
    Archive { path: PathBuf, message: String },

    /// Splitting an oversized archive into parts failed or could not be verified.
    #[error("split error at {path:?}: {message}")]
    Split { path: PathBuf, message: String },

    /// Data validation error (bad names, inconsistent layout, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CourseDocsError>;

impl CourseDocsError {
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

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an archive error for the zip at `path`.
    pub fn archive(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Archive {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a split error for the zip at `path`.
    pub fn split(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Split {
            path: path.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CourseDocsError::config("chunk_size must be positive");
        assert_eq!(err.to_string(), "config error: chunk_size must be positive");

        let err = CourseDocsError::split("zips/math/calc1.zip", "part sizes do not add up");
        assert!(err.to_string().contains("calc1.zip"));
        assert!(err.to_string().contains("part sizes do not add up"));
    }

    #[test]
    fn io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = CourseDocsError::io("README.md", source);
        assert!(err.to_string().contains("README.md"));
        assert!(err.to_string().contains("gone"));
    }
}
