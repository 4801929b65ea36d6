//! `clean`: remove the files the build produces.
//!
//! Only declared outputs are removed (bundles, their maps and rendered pages),
//! never the whole destination, which may be shared with an application.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::context::BuildContext;
use crate::core::{BuildError, BundleKind};
use crate::utils::path::is_within;
use crate::utils::plural::plural_count;
use crate::debug;

/// Every path `build` would write, given the current markup sources.
pub fn outputs(ctx: &BuildContext) -> Result<Vec<PathBuf>, BuildError> {
    let mut paths = Vec::new();
    for kind in BundleKind::ALL {
        for job in ctx.bundles(kind) {
            paths.push(job.spec.output_path());
            paths.push(job.spec.map_path());
        }
    }
    if let Some(markup) = &ctx.markup {
        for page in markup.src.scan(&ctx.root)? {
            paths.push(markup.output_path(&ctx.destination, &page));
        }
    }
    Ok(paths)
}

pub async fn clean(ctx: Arc<BuildContext>) -> Result<(), BuildError> {
    let task_ctx = Arc::clone(&ctx);
    let removed = tokio::task::spawn_blocking(move || remove_outputs(&task_ctx)).await??;
    ctx.artifacts.clear();
    debug!("clean"; "{} removed", plural_count(removed, "file"));
    Ok(())
}

fn remove_outputs(ctx: &BuildContext) -> Result<usize, BuildError> {
    let mut removed = 0;
    for path in outputs(ctx)? {
        if !is_within(&path, &ctx.destination) {
            debug!("clean"; "skip {} (outside destination)", path.display());
            continue;
        }
        if remove_file(&path)? {
            removed += 1;
        }
    }
    Ok(removed)
}

fn remove_file(path: &Path) -> Result<bool, BuildError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BuildError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildOptions;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, path: &str) {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[tokio::test]
    async fn test_clean_removes_declared_outputs_only() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "index.html");
        touch(&dir, "build/index.html");
        touch(&dir, "build/css/site.css");
        touch(&dir, "build/js/site.js");
        touch(&dir, "build/maps/site.js.map");
        touch(&dir, "build/images/logo.png");

        let ctx = Arc::new(BuildContext::for_test(dir.path(), "", BuildOptions::default()));
        clean(Arc::clone(&ctx)).await.unwrap();

        assert!(!dir.path().join("build/index.html").exists());
        assert!(!dir.path().join("build/css/site.css").exists());
        assert!(!dir.path().join("build/js/site.js").exists());
        assert!(!dir.path().join("build/maps/site.js.map").exists());
        assert!(dir.path().join("build/images/logo.png").exists());
        assert!(dir.path().join("index.html").exists());
    }

    #[tokio::test]
    async fn test_clean_twice_is_ok() {
        let dir = TempDir::new().unwrap();
        let ctx = Arc::new(BuildContext::for_test(dir.path(), "", BuildOptions::default()));
        clean(Arc::clone(&ctx)).await.unwrap();
        clean(ctx).await.unwrap();
    }

    #[test]
    fn test_outputs_skip_markup_when_disabled() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "index.html");
        let config = "[profiles.app]\ndestination = \"public\"\nmarkup = false";
        let ctx = BuildContext::for_test(dir.path(), config, BuildOptions::default());

        let paths = outputs(&ctx).unwrap();
        assert!(paths.contains(&ctx.destination.join("css/site.css")));
        assert!(!paths.iter().any(|p| p.ends_with("index.html")));
    }
}
