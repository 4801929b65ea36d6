//! Stage abstraction shared by every transform.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::BuildError;

/// How a stage failure is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Source-language compilation. Failures are reported and recovered.
    Compile,
    /// Any later transform. Failures abort the build invocation.
    Transform,
}

/// Stage output together with where its lines came from.
#[derive(Debug)]
pub struct Mapped {
    pub content: String,
    /// Input line of every output line, `None` when the stage cannot tell.
    pub origins: Option<Vec<Option<u32>>>,
}

impl Mapped {
    /// Output whose line positions are unknown.
    pub fn opaque(content: String) -> Self {
        Self { content, origins: None }
    }
}

/// One opaque, replaceable transform: `content -> content | error`.
///
/// Stages are synchronous; the pipeline runs each one on the blocking pool.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    fn apply(&self, input: String) -> anyhow::Result<String>;

    /// Like `apply`, also reporting line positions when the stage can.
    ///
    /// Called instead of `apply` when the bundle has a source map. Without
    /// positions the map is dropped rather than left pointing at the wrong
    /// lines.
    fn apply_mapped(&self, input: String) -> anyhow::Result<Mapped> {
        self.apply(input).map(Mapped::opaque)
    }
}

/// Failure of a single pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage}: {message}")]
    Compile { stage: &'static str, message: String },

    #[error("{stage}: {message}")]
    Stage { stage: &'static str, message: String },

    #[error("cannot read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stage `{0}` panicked")]
    Panicked(&'static str),
}

impl PipelineError {
    /// Classify a stage failure by the stage's kind.
    pub fn from_stage(stage: &dyn Stage, err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        match stage.kind() {
            StageKind::Compile => Self::Compile {
                stage: stage.name(),
                message,
            },
            StageKind::Transform => Self::Stage {
                stage: stage.name(),
                message,
            },
        }
    }

    /// Attach the bundle name, producing the task-level error.
    pub fn into_build_error(self, bundle: &str) -> BuildError {
        let bundle = bundle.to_string();
        match self {
            Self::Compile { message, .. } => BuildError::Compile { bundle, message },
            Self::Stage { stage, message } => BuildError::Stage {
                bundle,
                stage,
                message,
            },
            Self::Read { path, source } => BuildError::io(path, source),
            Self::Panicked(stage) => BuildError::Stage {
                bundle,
                stage,
                message: "panicked".into(),
            },
        }
    }
}
