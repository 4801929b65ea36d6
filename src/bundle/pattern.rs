//! Ordered include/exclude glob matching.
//!
//! Patterns are evaluated in declaration order against root-relative paths
//! written with `/` separators. A leading `!` negates a pattern and a leading
//! `./` is ignored.
//!
//! # Negation modes
//!
//! - `ordered` (default): the last pattern that matches a path decides.
//!   A negation only excludes what earlier positive patterns included, and a
//!   later positive pattern can bring the path back.
//! - `global`: a path is included when any positive pattern matches and no
//!   negated pattern matches, wherever the negation appears.
//!
//! # Scanning
//!
//! Each positive pattern is walked from its literal directory prefix
//! (`css/**/*.less` walks `css/`), sorted by file name, so discovery order is
//! pattern order then directory order. A path matched by several patterns is
//! reported once, under the first pattern that matches it.

use super::CandidateFile;
use crate::core::BuildError;
use crate::utils::path::relative_slash;
use glob::{MatchOptions, Pattern};
use jwalk::WalkDir;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// `*` never crosses a `/`; only `**` spans directories.
pub const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// How negated patterns interact with positive ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegationMode {
    #[default]
    Ordered,
    Global,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid glob pattern `{pattern}`: {message}")]
pub struct GlobError {
    pub pattern: String,
    pub message: String,
}

#[derive(Debug, Clone)]
struct GlobRule {
    source: String,
    pattern: Pattern,
    negated: bool,
}

/// A directory to watch for changes to a pattern list's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchDir {
    pub path: PathBuf,
    pub recursive: bool,
}

/// Compiled, ordered list of include/exclude patterns.
#[derive(Debug, Clone)]
pub struct PatternList {
    rules: Vec<GlobRule>,
    mode: NegationMode,
}

impl PatternList {
    pub fn new<S: AsRef<str>>(patterns: &[S], mode: NegationMode) -> Result<Self, GlobError> {
        let rules = patterns
            .iter()
            .map(|p| compile_rule(p.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { rules, mode })
    }

    /// Whether a root-relative path is selected by this list.
    pub fn matches(&self, relative: &str) -> bool {
        match self.mode {
            NegationMode::Ordered => {
                let mut included = false;
                for rule in &self.rules {
                    if rule.pattern.matches_with(relative, MATCH_OPTIONS) {
                        included = !rule.negated;
                    }
                }
                included
            }
            NegationMode::Global => {
                let mut positive = false;
                for rule in &self.rules {
                    if rule.pattern.matches_with(relative, MATCH_OPTIONS) {
                        if rule.negated {
                            return false;
                        }
                        positive = true;
                    }
                }
                positive
            }
        }
    }

    /// Scan the filesystem under `root` for matching files.
    ///
    /// Always reads the current state of the disk. A pattern whose base
    /// directory does not exist contributes nothing; an unreadable `root`
    /// fails the scan.
    pub fn scan(&self, root: &Path) -> Result<Vec<CandidateFile>, BuildError> {
        std::fs::read_dir(root).map_err(|e| BuildError::io(root, e))?;

        let mut seen = FxHashSet::default();
        let mut files = Vec::new();

        for rule in self.rules.iter().filter(|r| !r.negated) {
            let plan = WalkPlan::for_pattern(&rule.source);
            let dir = if plan.base.is_empty() {
                root.to_path_buf()
            } else {
                root.join(&plan.base)
            };
            if !dir.is_dir() {
                continue;
            }

            let mut walker = WalkDir::new(&dir).sort(true).follow_links(true);
            if let Some(depth) = plan.depth {
                walker = walker.max_depth(depth);
            }

            for entry in walker.into_iter().filter_map(Result::ok) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = entry.file_name().to_str().unwrap_or_default();
                if IGNORED_FILES.contains(&name) {
                    continue;
                }

                let path = entry.path();
                let Some(relative) = relative_slash(&path, root) else {
                    continue;
                };
                if !rule.pattern.matches_with(&relative, MATCH_OPTIONS)
                    || !seen.insert(relative.clone())
                    || !self.matches(&relative)
                {
                    continue;
                }

                let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
                files.push(CandidateFile {
                    absolute: path,
                    relative,
                    modified,
                });
            }
        }

        Ok(files)
    }

    /// Directories whose changes can affect this list, for the watcher.
    pub fn watch_dirs(&self, root: &Path) -> Vec<WatchDir> {
        let mut dirs: Vec<WatchDir> = Vec::new();
        for plan in self.walk_plans() {
            let path = if plan.base.is_empty() {
                root.to_path_buf()
            } else {
                root.join(&plan.base)
            };
            let recursive = plan.depth.is_none_or(|d| d > 1);
            match dirs.iter_mut().find(|d| d.path == path) {
                Some(existing) => existing.recursive |= recursive,
                None => dirs.push(WatchDir { path, recursive }),
            }
        }
        dirs
    }

    fn walk_plans(&self) -> impl Iterator<Item = WalkPlan> + '_ {
        self.rules
            .iter()
            .filter(|r| !r.negated)
            .map(|r| WalkPlan::for_pattern(&r.source))
    }
}

/// Where to start walking for one pattern and how deep to go.
#[derive(Debug, PartialEq, Eq)]
struct WalkPlan {
    base: String,
    /// `None` when the pattern contains `**`.
    depth: Option<usize>,
}

impl WalkPlan {
    fn for_pattern(source: &str) -> Self {
        let parts: Vec<&str> = source.split('/').filter(|p| !p.is_empty()).collect();
        match parts.iter().position(|p| is_magic(p)) {
            // Literal path: walk its parent one level deep
            None => Self {
                base: parts[..parts.len().saturating_sub(1)].join("/"),
                depth: Some(1),
            },
            Some(i) => {
                let rest = &parts[i..];
                Self {
                    base: parts[..i].join("/"),
                    depth: (!rest.iter().any(|p| p.contains("**"))).then_some(rest.len()),
                }
            }
        }
    }
}

fn is_magic(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

fn compile_rule(raw: &str) -> Result<GlobRule, GlobError> {
    let trimmed = raw.trim();
    let (negated, body) = match trimmed.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut source = body;
    while let Some(rest) = source.strip_prefix("./") {
        source = rest;
    }

    if source.is_empty() {
        return Err(GlobError {
            pattern: raw.to_string(),
            message: "pattern is empty".into(),
        });
    }
    if source.starts_with('/') || source.split('/').any(|p| p == "..") {
        return Err(GlobError {
            pattern: raw.to_string(),
            message: "pattern must stay inside the project root".into(),
        });
    }

    let pattern = Pattern::new(source).map_err(|e| GlobError {
        pattern: raw.to_string(),
        message: e.msg.to_string(),
    })?;

    Ok(GlobRule {
        source: source.to_string(),
        pattern,
        negated,
    })
}
