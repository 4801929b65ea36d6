//! Bundle runner: scan, order, transform, write.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;

use super::context::{BuildContext, BundleJob};
use super::graph::join_failures;
use crate::core::{BuildError, BundleKind};
use crate::reload::ReloadMessage;
use crate::utils::plural::plural_count;
use crate::debug;

/// Build one bundle.
///
/// A compile error is reported (status block and browser overlay) and
/// recovered: nothing new is written and the last good artifact stays in
/// place. If its file has gone missing meanwhile, it is written back.
pub async fn build_bundle(ctx: Arc<BuildContext>, kind: BundleKind, index: usize) -> Result<(), BuildError> {
    let Some(job) = ctx.bundles(kind).get(index) else {
        return Err(BuildError::UnknownTask(format!("{}#{index}", kind.name())));
    };
    let BundleJob { spec, pipeline } = job;
    let started = Instant::now();
    debug!(kind.name(); "{}: {}", spec.target(), pipeline.stage_names().join(" -> "));

    let root = ctx.root.clone();
    let scan_spec = Arc::clone(spec);
    let files = tokio::task::spawn_blocking(move || scan_spec.collect(&root)).await??;

    let artifact = match pipeline.run(spec, &files).await {
        Ok(artifact) => artifact,
        Err(e) => {
            let err = e.into_build_error(&spec.file_name);
            if !err.is_recoverable() {
                return Err(err);
            }
            let message = err.to_string();
            ctx.report_error(&format!("{} failed", spec.target()), &message);
            ctx.send_live(ReloadMessage::notify(message, ctx.pipeline.notify_timeout));
            restore_last_good(&ctx, spec.output_path()).await?;
            return Ok(());
        }
    };

    artifact.write().await?;
    debug!(kind.name(); "wrote {} ({} bytes)", artifact.destination.display(), artifact.bytes().len());
    let artifact = ctx.artifacts.store(artifact);

    if kind == BundleKind::Styles && ctx.options.inject_styles {
        ctx.send_live(ReloadMessage::css(spec.target(), artifact.content.clone()));
    }

    ctx.report_success(
        kind.name(),
        &format!(
            "{} ({}) in {}ms",
            spec.target(),
            plural_count(files.len(), "input"),
            started.elapsed().as_millis()
        ),
    );
    Ok(())
}

async fn restore_last_good(ctx: &BuildContext, destination: PathBuf) -> Result<(), BuildError> {
    let Some(last) = ctx.artifacts.get(&destination) else {
        return Ok(());
    };
    if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
        return Ok(());
    }
    last.write().await?;
    debug!("bundle"; "restored last good {}", destination.display());
    Ok(())
}

/// Build every bundle of a kind concurrently.
pub async fn build_kind(ctx: Arc<BuildContext>, kind: BundleKind) -> Result<(), BuildError> {
    let mut set = JoinSet::new();
    for (index, job) in ctx.bundles(kind).iter().enumerate() {
        let ctx = Arc::clone(&ctx);
        let name = job.spec.file_name.clone();
        set.spawn(async move { (index, name, build_bundle(ctx, kind, index).await) });
    }

    let mut failed = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, _, Ok(()))) => {}
            Ok((index, name, Err(e))) => failed.push((index, name, e)),
            Err(e) => failed.push((usize::MAX, kind.name().to_string(), e.into())),
        }
    }
    failed.sort_by_key(|(index, ..)| *index);

    join_failures(
        kind.name(),
        failed.into_iter().map(|(_, name, e)| (name, e)).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::messages::WsMsg;
    use crate::core::BuildOptions;
    use crate::reload::LiveChannel;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    const NO_COMPILER: &str = r#"
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

    #[tokio::test]
    async fn test_styles_concatenated_in_order() {
        let dir = TempDir::new().unwrap();
        write(&dir, "css/b.less", ".b{}");
        write(&dir, "css/common.less", ".common{}");
        write(&dir, "css/a.less", ".a{}");

        let ctx = Arc::new(BuildContext::for_test(dir.path(), NO_COMPILER, BuildOptions::default()));
        build_kind(Arc::clone(&ctx), BundleKind::Styles).await.unwrap();

        let out = fs::read_to_string(dir.path().join("build/css/site.css")).unwrap();
        assert_eq!(out, ".common{}\n.a{}\n.b{}");
        assert!(ctx.artifacts.get(&ctx.destination.join("css/site.css")).is_some());
    }

    #[tokio::test]
    async fn test_no_inputs_writes_empty_file() {
        let dir = TempDir::new().unwrap();
        let ctx = Arc::new(BuildContext::for_test(dir.path(), NO_COMPILER, BuildOptions::default()));
        build_kind(ctx, BundleKind::Scripts).await.unwrap();

        let out = dir.path().join("build/js/site.js");
        assert_eq!(fs::read(out).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_script_map_written_beside_scripts_dir() {
        let dir = TempDir::new().unwrap();
        write(&dir, "js/common.js", "var a = 1;");
        write(&dir, "js/app.js", "var b = 2;");

        let config = NO_COMPILER.replace("source_maps = false", "source_maps = true");
        let options = BuildOptions::resolve(false, false, true);
        let ctx = Arc::new(BuildContext::for_test(dir.path(), &config, options));
        build_kind(ctx, BundleKind::Scripts).await.unwrap();

        let out = fs::read_to_string(dir.path().join("build/js/site.js")).unwrap();
        assert!(out.starts_with("var a = 1;\nvar b = 2;"));
        assert!(out.ends_with("//# sourceMappingURL=../maps/site.js.map\n"));
        let map = fs::read_to_string(dir.path().join("build/maps/site.js.map")).unwrap();
        assert!(map.contains("js/common.js"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compile_error_is_recovered_and_keeps_output() {
        let dir = TempDir::new().unwrap();
        write(&dir, "css/a.less", ".a{}");
        write(&dir, "build/css/site.css", "previous");

        let config = r#"
[pipeline]
compiler = "less"
less = ["sh", "-c", "echo 'ParseError: Unrecognised input' >&2; exit 1"]
autoprefix = false
source_maps = false
"#;
        let ctx = Arc::new(BuildContext::for_test(dir.path(), config, BuildOptions::default()));
        build_kind(Arc::clone(&ctx), BundleKind::Styles).await.unwrap();

        let out = fs::read_to_string(dir.path().join("build/css/site.css")).unwrap();
        assert_eq!(out, "previous");
        assert!(ctx.artifacts.get(&ctx.destination.join("css/site.css")).is_none());
    }

    /// Passes input through unless it contains `broken`.
    const PICKY_COMPILER: &str = r##"
[pipeline]
compiler = "less"
less = ["sh", "-c", "in=$(cat); case \"$in\" in *broken*) echo 'ParseError: Unrecognised input' >&2; exit 1;; esac; printf '%s' \"$in\""]
autoprefix = false
source_maps = false
"##;

    async fn next_live(rx: &mut mpsc::Receiver<WsMsg>) -> ReloadMessage {
        match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
            Ok(Some(WsMsg::Send(msg))) => msg,
            _ => panic!("no live message"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compile_error_notifies_browser_without_css() {
        let dir = TempDir::new().unwrap();
        write(&dir, "css/a.less", ".a{}");

        let options = BuildOptions::resolve(false, false, false);
        let ctx = Arc::new(BuildContext::for_test(dir.path(), PICKY_COMPILER, options));
        let (tx, mut rx) = mpsc::channel(8);
        ctx.attach_live(LiveChannel::new(tx, 0));

        build_bundle(Arc::clone(&ctx), BundleKind::Styles, 0).await.unwrap();
        assert!(matches!(next_live(&mut rx).await, ReloadMessage::Css { .. }));

        write(&dir, "css/a.less", ".a{ broken");
        build_bundle(Arc::clone(&ctx), BundleKind::Styles, 0).await.unwrap();
        match next_live(&mut rx).await {
            ReloadMessage::Notify { message, timeout } => {
                assert_eq!(timeout, ctx.pipeline.notify_timeout);
                assert!(message.contains("ParseError"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compile_error_restores_missing_output() {
        let dir = TempDir::new().unwrap();
        write(&dir, "css/a.less", ".a{}");
        let ctx = Arc::new(BuildContext::for_test(dir.path(), PICKY_COMPILER, BuildOptions::default()));
        build_bundle(Arc::clone(&ctx), BundleKind::Styles, 0).await.unwrap();

        let out = dir.path().join("build/css/site.css");
        fs::remove_file(&out).unwrap();
        write(&dir, "css/a.less", ".a{ broken");
        build_bundle(Arc::clone(&ctx), BundleKind::Styles, 0).await.unwrap();

        assert_eq!(fs::read_to_string(out).unwrap(), ".a{}");
    }

    #[tokio::test]
    async fn test_two_failing_bundles_compose() {
        let dir = TempDir::new().unwrap();
        // A file where the destination directory should be
        write(&dir, "out", "not a directory");
        let config = format!(
            r#"{NO_COMPILER}
[profiles.app]
destination = "out"

[[bundles.scripts]]
src = ["js/*.js"]
file = "one.js"

[[bundles.scripts]]
src = ["js/*.js"]
file = "two.js"
"#
        );
        let ctx = Arc::new(BuildContext::for_test(dir.path(), &config, BuildOptions::default()));
        let err = build_kind(ctx, BundleKind::Scripts).await.unwrap_err();
        match err {
            BuildError::TaskComposition { task, failed } => {
                assert_eq!(task, "scripts");
                assert_eq!(failed, vec!["one.js", "two.js"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
