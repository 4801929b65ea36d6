//! Compile stage: pipes content through an external style compiler.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::sourcemap::{origins_from_json, take_inline_map};
use super::{Mapped, Stage, StageKind};
use crate::config::StyleCompiler;
use crate::utils::exec::{COMPILER_NOISE, Cmd};

/// Runs `lessc -`, `sass --stdin` or a configured replacement with the
/// bundle content on stdin and takes stdout as the compiled CSS.
///
/// The compiler also sees `STITCH_ROOT` and `STITCH_MODE` in its environment.
///
/// A compiler that appends an inline map (`lessc --source-map-map-inline`,
/// `sass --embed-source-map`) keeps the bundle's source map; the comment is
/// always stripped from the output.
pub struct CompileStage {
    compiler: StyleCompiler,
    command: Vec<String>,
    root: PathBuf,
    mode: &'static str,
}

impl CompileStage {
    /// `$STITCH_ROOT` and `$STITCH_MODE` in `command` are substituted here.
    pub fn new(compiler: StyleCompiler, command: &[String], root: &Path, mode: &'static str) -> Self {
        let root_str = root.to_string_lossy();
        let command = command
            .iter()
            .map(|arg| {
                arg.replace("$STITCH_ROOT", &root_str)
                    .replace("$STITCH_MODE", mode)
            })
            .collect();
        Self {
            compiler,
            command,
            root: root.to_path_buf(),
            mode,
        }
    }

    #[cfg(test)]
    pub fn command(&self) -> &[String] {
        &self.command
    }
}

impl Stage for CompileStage {
    fn name(&self) -> &'static str {
        self.compiler.name()
    }

    fn kind(&self) -> StageKind {
        StageKind::Compile
    }

    fn apply(&self, input: String) -> Result<String> {
        let mut css = self.compile(input)?;
        take_inline_map(&mut css);
        Ok(css)
    }

    fn apply_mapped(&self, input: String) -> Result<Mapped> {
        let mut content = self.compile(input.clone())?;
        let origins = take_inline_map(&mut content).and_then(|json| origins_from_json(&content, &json, &input));
        Ok(Mapped { content, origins })
    }
}

impl CompileStage {
    fn compile(&self, input: String) -> Result<String> {
        let stdout = Cmd::from_slice(&self.command)?
            .cwd(&self.root)
            .env("STITCH_ROOT", self.root.to_string_lossy())
            .env("STITCH_MODE", self.mode)
            .stdin(input)
            .quiet(COMPILER_NOISE)
            .run()?;
        String::from_utf8(stdout).context("compiler output is not valid UTF-8")
    }
}
