//! Shared state of one stitch process.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use super::markup::MarkupSpec;
use crate::bundle::{BundleSpec, GlobError};
use crate::config::{ActiveProfile, PipelineConfig, ProjectConfig, ServeConfig};
use crate::core::{BuildOptions, BundleKind};
use crate::logger::{status_error, status_success};
use crate::pipeline::{ArtifactCache, TransformPipeline};
use crate::reload::{LiveChannel, ReloadMessage};
use crate::log;

/// A bundle together with the stages that produce it.
pub struct BundleJob {
    pub spec: Arc<BundleSpec>,
    pub pipeline: TransformPipeline,
}

/// Everything tasks need, resolved once at start-up.
///
/// Configuration parts are immutable. Only the artifact cache, the live
/// channel and the watch flag change while the process runs.
pub struct BuildContext {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub options: BuildOptions,
    pub profile: ActiveProfile,
    /// Absolute destination root.
    pub destination: PathBuf,
    pub styles: Vec<BundleJob>,
    pub scripts: Vec<BundleJob>,
    /// `None` when the profile disables markup.
    pub markup: Option<MarkupSpec>,
    pub pipeline: PipelineConfig,
    pub serve: ServeConfig,
    pub artifacts: ArtifactCache,
    live: OnceLock<LiveChannel>,
    watching: AtomicBool,
}

impl BuildContext {
    pub fn new(config: &ProjectConfig, options: BuildOptions) -> Result<Self, GlobError> {
        let jobs = |kind| -> Result<Vec<BundleJob>, GlobError> {
            Ok(config
                .bundle_specs(kind)?
                .into_iter()
                .map(|spec| BundleJob {
                    pipeline: TransformPipeline::for_bundle(&spec, &config.pipeline, options, &config.root),
                    spec: Arc::new(spec),
                })
                .collect())
        };

        let markup = if config.active.config.markup {
            Some(MarkupSpec::new(&config.markup, config.glob.negation)?)
        } else {
            None
        };

        Ok(Self {
            root: config.root.clone(),
            config_path: config.config_path.clone(),
            options,
            profile: config.active.clone(),
            destination: config.destination(),
            styles: jobs(BundleKind::Styles)?,
            scripts: jobs(BundleKind::Scripts)?,
            markup,
            pipeline: config.pipeline.clone(),
            serve: config.serve.clone(),
            artifacts: ArtifactCache::new(),
            live: OnceLock::new(),
            watching: AtomicBool::new(false),
        })
    }

    pub fn bundles(&self, kind: BundleKind) -> &[BundleJob] {
        match kind {
            BundleKind::Styles => &self.styles,
            BundleKind::Scripts => &self.scripts,
        }
    }

    // ========================================================================
    // watch session
    // ========================================================================

    /// Mark the process as watching: results go to the status block.
    pub fn set_watching(&self) {
        self.watching.store(true, Ordering::SeqCst);
    }

    pub fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }

    /// Attach the live-reload channel. Only the first call has an effect.
    pub fn attach_live(&self, live: LiveChannel) {
        let _ = self.live.set(live);
    }

    pub fn live(&self) -> Option<&LiveChannel> {
        self.live.get()
    }

    /// Push a message to connected browsers, if any channel is attached.
    pub fn send_live(&self, msg: ReloadMessage) {
        if let Some(live) = self.live.get() {
            live.send(msg);
        }
    }

    // ========================================================================
    // reporting
    // ========================================================================

    pub fn report_success(&self, module: &str, message: &str) {
        if self.is_watching() {
            status_success(message);
        } else {
            log!(module; "{}", message);
        }
    }

    pub fn report_error(&self, summary: &str, detail: &str) {
        if self.is_watching() {
            status_error(summary, detail);
        } else {
            log!("error"; "{}\n{}", summary, detail);
        }
    }
}

#[cfg(test)]
impl BuildContext {
    /// Context over a config snippet rooted at `root`.
    pub fn for_test(root: &std::path::Path, config: &str, options: BuildOptions) -> Self {
        let config = crate::config::test_project_config(root, config);
        Self::new(&config, options).unwrap()
    }
}
