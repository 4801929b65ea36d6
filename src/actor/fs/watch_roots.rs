use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::debug;

/// The directories a watch session wants watched, and whether each one
/// currently is.
///
/// A root that does not exist yet (the first `css/` of a new project) or was
/// deleted and recreated is picked up by the next `maintain`.
pub(super) struct WatchRoots {
    roots: Vec<Root>,
}

struct Root {
    path: PathBuf,
    mode: RecursiveMode,
    attached: bool,
}

impl WatchRoots {
    pub(super) fn new(paths: Vec<(PathBuf, RecursiveMode)>) -> Self {
        let roots = paths
            .into_iter()
            .map(|(path, mode)| Root { path, mode, attached: false })
            .collect();
        Self { roots }
    }

    /// Startup pass: a root that exists but cannot be watched is an error.
    pub(super) fn attach_existing(&mut self, watcher: &mut RecommendedWatcher) -> notify::Result<()> {
        for root in self.roots.iter_mut().filter(|r| r.path.exists()) {
            watcher.watch(&root.path, root.mode)?;
            root.attached = true;
        }
        for root in self.roots.iter().filter(|r| !r.attached) {
            debug!("watch"; "not yet present: {}", root.path.display());
        }
        Ok(())
    }

    /// Forget roots that vanished and retry every unattached one.
    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        for root in &mut self.roots {
            let exists = root.path.exists();
            if !exists {
                root.attached = false;
            } else if !root.attached && watcher.watch(&root.path, root.mode).is_ok() {
                root.attached = true;
                debug!("watch"; "attached {}", root.path.display());
            }
        }
    }

    #[cfg(test)]
    pub(super) fn attached(&self) -> usize {
        self.roots.iter().filter(|r| r.attached).count()
    }
}
