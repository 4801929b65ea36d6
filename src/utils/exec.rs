//! External command execution.
//!
//! The compile stage pipes bundle content through an installed compiler
//! (`lessc -`, `sass --stdin`) and takes its stdout.
//!
//! ```ignore
//! let css = Cmd::from_slice(&["lessc", "-"])?
//!     .cwd(root)
//!     .stdin(source)
//!     .run()?;
//! ```

use std::borrow::Cow;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::log;

/// Compiler deprecation chatter that does not affect the output.
pub const COMPILER_NOISE: &[&str] = &["DEPRECATION WARNING", "Deprecation"];

/// One external command with its input.
#[derive(Debug)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(&'static str, String)>,
    input: Option<Vec<u8>>,
    noise: &'static [&'static str],
}

impl Cmd {
    /// Build from a configured command line such as `["npx", "sass", "--stdin"]`.
    pub fn from_slice<S: AsRef<str>>(command: &[S]) -> Result<Self> {
        let Some((program, args)) = command.split_first() else {
            bail!("empty command");
        };
        Ok(Self {
            program: program.as_ref().into(),
            args: args
                .iter()
                .map(AsRef::as_ref)
                .filter(|a| !a.is_empty())
                .map(OsString::from)
                .collect(),
            cwd: None,
            envs: Vec::new(),
            input: None,
            noise: &[],
        })
    }

    pub fn cwd(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.envs.push((key, value.into()));
        self
    }

    /// Data written to the command's stdin.
    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.input = Some(data.into());
        self
    }

    /// stderr line prefixes that are neither logged nor reported.
    pub fn quiet(mut self, prefixes: &'static [&'static str]) -> Self {
        self.noise = prefixes;
        self
    }

    /// Run to completion and return stdout.
    ///
    /// A non-zero exit is an error carrying the command's stderr. On success
    /// any remaining stderr is logged under the program name.
    pub fn run(self) -> Result<Vec<u8>> {
        let name = self.program.to_string_lossy().into_owned();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (*k, v.as_str())))
            .stdin(if self.input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().with_context(|| format!("Failed to spawn `{name}`"))?;

        // Fed from a thread: a compiler may fill stdout before draining stdin
        let writer = child
            .stdin
            .take()
            .zip(self.input)
            .map(|(mut stdin, data)| std::thread::spawn(move || stdin.write_all(&data)));

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for `{name}`"))?;

        if let Some(writer) = writer {
            let written = writer
                .join()
                .map_err(|_| anyhow::anyhow!("stdin writer for `{name}` panicked"))?;
            // BrokenPipe: the process exited early and its status says why
            if let Err(e) = written
                && e.kind() != std::io::ErrorKind::BrokenPipe
            {
                return Err(e).with_context(|| format!("Failed to write stdin to `{name}`"));
            }
        }

        let stderr = filtered_stderr(&output, self.noise);
        if !output.status.success() {
            let mut msg = format!("`{name}` exited with {}", output.status);
            if !stderr.is_empty() {
                msg.push('\n');
                msg.push_str(&stderr);
            }
            bail!(msg);
        }

        if !stderr.is_empty() {
            log!(&name; "{}", stderr);
        }
        Ok(output.stdout)
    }
}

/// stderr without color codes, blank lines and noise.
fn filtered_stderr(output: &Output, noise: &[&str]) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    strip_ansi(&stderr)
        .lines()
        .map(str::trim_end)
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !noise.iter().any(|p| trimmed.starts_with(p))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip ANSI color codes.
pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    static ANSI: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").ok());
    match ANSI.as_ref() {
        Some(re) => re.replace_all(s, ""),
        None => Cow::Borrowed(s),
    }
}
