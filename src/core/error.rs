//! Build error taxonomy.
//!
//! | Variant            | Effect                                             |
//! |--------------------|----------------------------------------------------|
//! | `FilesystemAccess` | fatal to the task                                  |
//! | `Compile`          | recovered by the bundle runner, never escapes it   |
//! | `Stage`            | fatal to the current build invocation              |
//! | `TaskComposition`  | several children of a parallel composite failed    |
//! | `UnknownTask`      | a task name that was never registered              |
//! | `Watch`            | the watch session could not start                  |
//!
//! Composites return a single failing child's error as-is.

use crate::bundle::GlobError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cannot access `{}`", path.display())]
    FilesystemAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("compile error in `{bundle}`: {message}")]
    Compile { bundle: String, message: String },

    #[error("{stage} failed for `{bundle}`: {message}")]
    Stage {
        bundle: String,
        stage: &'static str,
        message: String,
    },

    #[error("task `{task}` failed: {} did not complete", .failed.join(", "))]
    TaskComposition { task: String, failed: Vec<String> },

    #[error("unknown task `{0}`")]
    UnknownTask(String),

    #[error(transparent)]
    Glob(#[from] GlobError),

    #[error("background job panicked: {0}")]
    Join(String),

    #[error("watch session failed: {0}")]
    Watch(String),
}

impl BuildError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FilesystemAccess {
            path: path.into(),
            source,
        }
    }

    /// Whether the bundle runner should recover from this error.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Compile { .. })
    }
}

impl From<tokio::task::JoinError> for BuildError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Join(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BuildError::TaskComposition {
            task: "assets".into(),
            failed: vec!["styles".into(), "scripts".into()],
        };
        assert_eq!(err.to_string(), "task `assets` failed: styles, scripts did not complete");

        let err = BuildError::io("css", std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(err.to_string(), "cannot access `css`");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_only_compile_is_recoverable() {
        let compile = BuildError::Compile {
            bundle: "site.css".into(),
            message: "ParseError".into(),
        };
        let stage = BuildError::Stage {
            bundle: "site.css".into(),
            stage: "autoprefix",
            message: "bad".into(),
        };
        assert!(compile.is_recoverable());
        assert!(!stage.is_recoverable());
        assert!(!BuildError::UnknownTask("x".into()).is_recoverable());
    }
}
