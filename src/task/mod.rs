//! Named tasks and their composition.
//!
//! | Task      | Runs                                   |
//! |-----------|----------------------------------------|
//! | `clean`   | delete declared outputs                |
//! | `styles`  | every style bundle, in parallel        |
//! | `scripts` | every script bundle, in parallel       |
//! | `markup`  | expand includes into destination pages |
//! | `assets`  | styles, scripts and markup in parallel |
//! | `build`   | clean, then assets                     |
//! | `watch`   | watch session with live reload         |
//! | `dev`     | build, then watch                      |

mod bundles;
mod clean;
mod context;
mod graph;
mod markup;
mod watch;

pub use context::BuildContext;
pub use graph::TaskGraph;
pub use markup::MarkupSpec;

use std::sync::Arc;

use crate::core::{BuildError, BundleKind};

/// Register every task over a shared context.
pub fn build_graph(ctx: Arc<BuildContext>) -> Result<Arc<TaskGraph>, BuildError> {
    let graph = Arc::new_cyclic(|weak| {
        let mut graph = TaskGraph::new();

        let c = Arc::clone(&ctx);
        graph.leaf("clean", move || clean::clean(Arc::clone(&c)));
        let c = Arc::clone(&ctx);
        graph.leaf("styles", move || bundles::build_kind(Arc::clone(&c), BundleKind::Styles));
        let c = Arc::clone(&ctx);
        graph.leaf("scripts", move || bundles::build_kind(Arc::clone(&c), BundleKind::Scripts));
        let c = Arc::clone(&ctx);
        graph.leaf("markup", move || markup::build_markup(Arc::clone(&c)));

        let c = Arc::clone(&ctx);
        let weak = weak.clone();
        graph.leaf("watch", move || watch::watch(Arc::clone(&c), weak.clone()));

        graph
            .parallel("assets", &["styles", "scripts", "markup"])
            .series("build", &["clean", "assets"])
            .series("dev", &["build", "watch"]);
        graph
    });

    graph.check()?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildOptions;
    use std::fs;
    use tempfile::TempDir;

    const PLAIN: &str = r#"
[pipeline]
compiler = "none"
autoprefix = false
transpile = false
source_maps = false
"#;

    fn write(dir: &TempDir, path: &str, content: &str) {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_all_tasks_registered() {
        let dir = TempDir::new().unwrap();
        let ctx = Arc::new(BuildContext::for_test(dir.path(), PLAIN, BuildOptions::default()));
        let graph = build_graph(ctx).unwrap();
        for name in ["clean", "styles", "scripts", "markup", "assets", "build", "watch", "dev"] {
            assert!(graph.contains(name), "{name} missing");
        }
    }

    #[tokio::test]
    async fn test_build_replaces_outputs_and_keeps_the_rest() {
        let dir = TempDir::new().unwrap();
        write(&dir, "css/a.less", ".a{}");
        write(&dir, "js/a.js", "var a = 1;");
        write(&dir, "index.html", "<body>@@include('includes/nav.html')</body>");
        write(&dir, "includes/nav.html", "<nav></nav>");
        write(&dir, "build/css/site.css", "stale");
        write(&dir, "build/robots.txt", "keep");

        let ctx = Arc::new(BuildContext::for_test(dir.path(), PLAIN, BuildOptions::default()));
        let graph = build_graph(ctx).unwrap();
        graph.run("build").await.unwrap();

        let build = dir.path().join("build");
        assert_eq!(fs::read_to_string(build.join("css/site.css")).unwrap(), ".a{}");
        assert_eq!(fs::read_to_string(build.join("js/site.js")).unwrap(), "var a = 1;");
        assert_eq!(fs::read_to_string(build.join("index.html")).unwrap(), "<body><nav></nav></body>");
        assert!(!build.join("includes/nav.html").exists());
        assert_eq!(fs::read_to_string(build.join("robots.txt")).unwrap(), "keep");
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let dir = TempDir::new().unwrap();
        let ctx = Arc::new(BuildContext::for_test(dir.path(), PLAIN, BuildOptions::default()));
        let graph = build_graph(ctx).unwrap();
        let err = graph.run("deploy").await.unwrap_err();
        assert!(matches!(err, BuildError::UnknownTask(name) if name == "deploy"));
    }
}
