//! Markup pages with `@@include('file', {"key": "value"})` expansion.
//!
//! Included paths resolve relative to the including file. Params replace
//! `@@key` inside the included content, longest key first so `@@titles`
//! is not clobbered by `@@title`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use regex::Regex;
use serde_json::{Map, Value};

use super::context::BuildContext;
use crate::bundle::{CandidateFile, GlobError, NegationMode, PatternList};
use crate::config::MarkupConfig;
use crate::core::BuildError;
use crate::debug;
use crate::utils::path::normalize_path;
use crate::utils::plural::plural_count;

const STAGE: &str = "include";

/// Compiled `[markup]` section.
#[derive(Debug, Clone)]
pub struct MarkupSpec {
    pub src: PatternList,
    /// Files that only trigger a rebuild, e.g. partials.
    pub watch: PatternList,
    prefix: String,
    directive: Regex,
}

impl MarkupSpec {
    pub fn new(config: &MarkupConfig, negation: NegationMode) -> Result<Self, GlobError> {
        let source = format!(
            r#"{}include\(\s*["']([^"']+)["']\s*(?:,\s*(\{{[\s\S]*?\}}))?\s*\)"#,
            regex::escape(&config.prefix)
        );
        let directive = Regex::new(&source).map_err(|e| GlobError {
            pattern: config.prefix.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            src: PatternList::new(&config.src, negation)?,
            watch: PatternList::new(&config.watch, negation)?,
            prefix: config.prefix.clone(),
            directive,
        })
    }

    /// Whether a root-relative path is a page or a watched partial.
    pub fn affects(&self, relative: &str) -> bool {
        self.src.matches(relative) || self.watch.matches(relative)
    }

    /// Where a page lands: same relative path under the destination root.
    pub fn output_path(&self, destination: &Path, page: &CandidateFile) -> PathBuf {
        destination.join(&page.relative)
    }

    /// Read a page and expand its includes.
    pub fn render(&self, page: &Path) -> Result<String, BuildError> {
        let content = std::fs::read_to_string(page).map_err(|e| BuildError::io(page, e))?;
        let mut stack = vec![normalize_path(page)];
        self.expand(&content, page, &mut stack)
    }

    fn expand(&self, content: &str, file: &Path, stack: &mut Vec<PathBuf>) -> Result<String, BuildError> {
        let dir = file.parent().unwrap_or(Path::new("."));
        let mut out = String::with_capacity(content.len());
        let mut last = 0;

        for caps in self.directive.captures_iter(content) {
            let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&content[last..whole.start()]);
            last = whole.end();

            // Resolved so `../includes/x.html` and `x.html` compare equal
            let path = normalize_path(&dir.join(target.as_str()));
            if stack.contains(&path) {
                return Err(self.stage_error(
                    stack,
                    format!("include cycle: `{}` includes itself", target.as_str()),
                ));
            }

            let params = match caps.get(2) {
                Some(raw) => serde_json::from_str::<Map<String, Value>>(raw.as_str()).map_err(|e| {
                    self.stage_error(stack, format!("invalid params for `{}`: {e}", target.as_str()))
                })?,
                None => Map::new(),
            };

            let included = std::fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))?;
            let included = self.substitute(&included, &params);

            stack.push(path.clone());
            let expanded = self.expand(&included, &path, stack)?;
            stack.pop();
            out.push_str(&expanded);
        }

        out.push_str(&content[last..]);
        Ok(out)
    }

    fn substitute(&self, content: &str, params: &Map<String, Value>) -> String {
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

        let mut out = content.to_string();
        for key in keys {
            let value = match &params[key] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out = out.replace(&format!("{}{key}", self.prefix), &value);
        }
        out
    }

    fn stage_error(&self, stack: &[PathBuf], message: String) -> BuildError {
        let page = stack
            .first()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        BuildError::Stage {
            bundle: page,
            stage: STAGE,
            message,
        }
    }
}

/// Build every page into the destination root.
pub async fn build_markup(ctx: std::sync::Arc<BuildContext>) -> Result<(), BuildError> {
    let Some(spec) = ctx.markup.clone() else {
        debug!("markup"; "disabled by profile `{}`", ctx.profile.name);
        return Ok(());
    };

    let started = Instant::now();
    let task_ctx = ctx.clone();
    let count = tokio::task::spawn_blocking(move || -> Result<usize, BuildError> {
        let ctx = task_ctx;
        let pages = spec.src.scan(&ctx.root)?;
        pages.par_iter().try_for_each(|page| {
            let html = spec.render(&page.absolute)?;
            let output = spec.output_path(&ctx.destination, page);
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
            }
            std::fs::write(&output, html).map_err(|e| BuildError::io(&output, e))?;
            debug!("markup"; "{} -> {}", page.relative, output.display());
            Ok::<_, BuildError>(())
        })?;
        Ok(pages.len())
    })
    .await??;

    ctx.report_success(
        "markup",
        &format!(
            "{} in {}ms",
            plural_count(count, "page"),
            started.elapsed().as_millis()
        ),
    );
    Ok(())
}
