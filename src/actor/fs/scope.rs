//! Which files the watch session cares about, and for what.

use std::path::{Path, PathBuf};

use notify::RecursiveMode;

use crate::actor::messages::WatchTarget;
use crate::bundle::PatternList;
use crate::core::BundleKind;
use crate::task::{BuildContext, MarkupSpec};
use crate::utils::path::{is_within, normalize_path, relative_slash};

/// Input patterns of every task, resolved against the project root.
pub struct WatchScope {
    root: PathBuf,
    config_path: PathBuf,
    destination: PathBuf,
    styles: Vec<PatternList>,
    scripts: Vec<PatternList>,
    markup: Option<MarkupSpec>,
}

impl WatchScope {
    pub fn from_context(ctx: &BuildContext) -> Self {
        let inputs = |kind| {
            ctx.bundles(kind)
                .iter()
                .map(|job| job.spec.inputs.clone())
                .collect()
        };
        // Event paths arrive canonicalized; the config file may not exist yet
        let config_path = match (ctx.config_path.parent(), ctx.config_path.file_name()) {
            (Some(dir), Some(name)) => normalize_path(dir).join(name),
            _ => normalize_path(&ctx.config_path),
        };
        Self {
            root: ctx.root.clone(),
            config_path,
            destination: ctx.destination.clone(),
            styles: inputs(BundleKind::Styles),
            scripts: inputs(BundleKind::Scripts),
            markup: ctx.markup.clone(),
        }
    }

    pub(super) fn is_config(&self, path: &Path) -> bool {
        path == self.config_path
    }

    /// Files the build writes itself.
    pub(super) fn is_output(&self, path: &Path) -> bool {
        is_within(path, &self.destination)
    }

    /// Targets whose inputs include `path`, in `WatchTarget` order.
    pub(super) fn targets_for(&self, path: &Path) -> Vec<WatchTarget> {
        let Some(relative) = relative_slash(path, &self.root) else {
            return Vec::new();
        };

        let mut targets = Vec::new();
        if self.styles.iter().any(|p| p.matches(&relative)) {
            targets.push(WatchTarget::Styles);
        }
        if self.scripts.iter().any(|p| p.matches(&relative)) {
            targets.push(WatchTarget::Scripts);
        }
        if self.markup.as_ref().is_some_and(|m| m.affects(&relative)) {
            targets.push(WatchTarget::Markup);
        }
        targets
    }

    /// Directories to hand to the watcher.
    ///
    /// The root is always watched, non-recursively, for the config file.
    pub(super) fn watch_roots(&self) -> Vec<(PathBuf, RecursiveMode)> {
        let mut lists: Vec<&PatternList> = self.styles.iter().chain(&self.scripts).collect();
        if let Some(markup) = &self.markup {
            lists.push(&markup.src);
            lists.push(&markup.watch);
        }

        let mut roots: Vec<(PathBuf, RecursiveMode)> = vec![(self.root.clone(), RecursiveMode::NonRecursive)];
        for dir in lists.iter().flat_map(|list| list.watch_dirs(&self.root)) {
            let mode = if dir.recursive {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            match roots.iter_mut().find(|(path, _)| *path == dir.path) {
                Some(existing) if mode == RecursiveMode::Recursive => existing.1 = mode,
                Some(_) => {}
                None => roots.push((dir.path, mode)),
            }
        }
        roots
    }
}
