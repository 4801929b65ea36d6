//! Bundle transform pipeline.
//!
//! Turns an ordered input list into one artifact:
//!
//! ```text
//! inputs ─► concat ─► [compile] ─► [autoprefix | minify-css] ─┐
//!                   └► [transpile] ─► [minify-js] ────────────┴─► Artifact
//! ```
//!
//! Stages are opaque `content -> content` functions. Which ones run is
//! decided once per bundle from `[pipeline]` and the build options. With
//! source maps on, the concatenation's line layout is carried through every
//! stage; a stage that cannot report positions drops the map.

mod artifact;
mod compile;
mod script;
mod sourcemap;
mod stage;
mod style;

pub use artifact::{Artifact, ArtifactCache, ExternalMap};
pub use compile::CompileStage;
pub use script::{MinifyJs, Transpile};
pub use sourcemap::{LineMap, SourceMap};
pub use stage::{Mapped, PipelineError, Stage, StageKind};
pub use style::{Autoprefix, MinifyCss};

use std::path::Path;
use std::sync::Arc;

use crate::bundle::{BundleSpec, CandidateFile};
use crate::config::PipelineConfig;
use crate::core::{BuildOptions, BundleKind};
use crate::debug;

/// Ordered stage list of one bundle.
#[derive(Clone, Default)]
pub struct TransformPipeline {
    stages: Vec<Arc<dyn Stage>>,
    source_maps: bool,
}

impl TransformPipeline {
    pub fn new(source_maps: bool) -> Self {
        Self {
            stages: Vec::new(),
            source_maps,
        }
    }

    /// Append a stage.
    pub fn pipe(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Stage list for a bundle.
    ///
    /// Styles: compile, then autoprefix (dev) or prefix+minify (prod).
    /// Scripts: transpile, then minify (prod).
    pub fn for_bundle(
        spec: &BundleSpec,
        config: &PipelineConfig,
        options: BuildOptions,
        root: &Path,
    ) -> Self {
        let mut pipeline = Self::new(options.source_maps);

        match spec.kind {
            BundleKind::Styles => {
                let compiler = spec.compiler.unwrap_or(config.compiler);
                if let Some(command) = config.command_for(compiler)
                    && !command.is_empty()
                {
                    pipeline = pipeline.pipe(CompileStage::new(compiler, command, root, options.mode()));
                }

                // Targets were validated when the config was loaded
                let targets = if config.autoprefix {
                    config.targets.to_browsers().ok().flatten()
                } else {
                    None
                };
                if options.prod {
                    pipeline = pipeline.pipe(MinifyCss::new(targets));
                } else if config.autoprefix {
                    pipeline = pipeline.pipe(Autoprefix::new(targets));
                }
            }
            BundleKind::Scripts => {
                if config.transpile {
                    pipeline = pipeline.pipe(Transpile::new(&config.es_target, &spec.file_name));
                }
                if options.prod {
                    pipeline = pipeline.pipe(MinifyJs);
                }
            }
        }

        pipeline
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Read, concatenate and transform `files` into the bundle's artifact.
    ///
    /// Zero inputs produce a zero-length artifact; no stage runs and no map
    /// is emitted.
    pub async fn run(
        &self,
        spec: &BundleSpec,
        files: &[CandidateFile],
    ) -> Result<Artifact, PipelineError> {
        if files.is_empty() {
            return Ok(Artifact::empty(spec.output_path()));
        }

        let mut sources = Vec::with_capacity(files.len());
        for file in files {
            let content = tokio::fs::read_to_string(&file.absolute)
                .await
                .map_err(|source| PipelineError::Read {
                    path: file.absolute.clone(),
                    source,
                })?;
            sources.push((file.relative.clone(), content));
        }

        let contents: Vec<&str> = sources.iter().map(|(_, c)| c.as_str()).collect();
        let mut content = contents.join("\n");
        let mut lines = self.source_maps.then(|| LineMap::for_concat(&contents));

        for stage in &self.stages {
            let stage = Arc::clone(stage);
            let name = stage.name();
            let mapped = lines.is_some();
            let out = tokio::task::spawn_blocking(move || {
                let out = if mapped {
                    stage.apply_mapped(content)
                } else {
                    stage.apply(content).map(Mapped::opaque)
                };
                out.map_err(|e| PipelineError::from_stage(stage.as_ref(), &e))
            })
            .await
            .map_err(|_| PipelineError::Panicked(name))??;

            content = out.content;
            lines = match (lines, out.origins) {
                (Some(lines), Some(origins)) => Some(lines.through(&origins)),
                (Some(_), None) => {
                    debug!(spec.kind.name(); "{}: `{}` reports no positions, source map dropped", spec.file_name, name);
                    None
                }
                (None, _) => None,
            };
        }

        let mut artifact = Artifact {
            content,
            source_map: None,
            destination: spec.output_path(),
        };

        if let Some(lines) = lines {
            let inputs: Vec<_> = sources
                .iter()
                .map(|(path, c)| (path.clone(), c.as_str()))
                .collect();
            let map = SourceMap::new(&spec.file_name, &inputs, &lines);
            match spec.kind {
                BundleKind::Styles => {
                    artifact.content.push_str(&SourceMap::css_comment(&map.to_data_url()));
                }
                BundleKind::Scripts => {
                    artifact.content.push_str(&SourceMap::js_comment(&spec.map_url()));
                    artifact.source_map = Some(ExternalMap {
                        path: spec.map_path(),
                        json: map.to_json(),
                    });
                }
            }
        }

        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::NegationMode;
    use crate::config::StyleCompiler;
    use std::fs;
    use tempfile::TempDir;

    struct Upper;

    impl Stage for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn apply(&self, input: String) -> anyhow::Result<String> {
            Ok(input.to_uppercase())
        }
    }

    /// Drops the first line and says where the rest came from.
    struct Behead;

    impl Stage for Behead {
        fn name(&self) -> &'static str {
            "behead"
        }

        fn apply(&self, input: String) -> anyhow::Result<String> {
            Ok(self.apply_mapped(input)?.content)
        }

        fn apply_mapped(&self, input: String) -> anyhow::Result<Mapped> {
            let rest: Vec<&str> = input.split('\n').skip(1).collect();
            Ok(Mapped {
                content: rest.join("\n"),
                origins: Some((1u32..).take(rest.len()).map(Some).collect()),
            })
        }
    }

    struct Broken(StageKind);

    impl Stage for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn kind(&self) -> StageKind {
            self.0
        }

        fn apply(&self, _input: String) -> anyhow::Result<String> {
            anyhow::bail!("ParseError: Unrecognised input")
        }
    }

    fn spec(kind: BundleKind, root: &Path) -> BundleSpec {
        let (file, dir, src) = match kind {
            BundleKind::Styles => ("site.css", "css", "css/**/*.less"),
            BundleKind::Scripts => ("site.js", "js", "js/**/*.js"),
        };
        let dest_root = root.join("build");
        BundleSpec::new(
            kind,
            file,
            &dest_root,
            &dest_root.join(dir),
            &[src],
            &[] as &[&str],
            NegationMode::Ordered,
        )
        .unwrap()
    }

    fn write_inputs(root: &Path, files: &[(&str, &str)]) -> Vec<CandidateFile> {
        files
            .iter()
            .map(|(rel, content)| {
                let path = root.join(rel);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, content).unwrap();
                CandidateFile::new(path, *rel)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_concat_in_order_then_stages() {
        let dir = TempDir::new().unwrap();
        let files = write_inputs(dir.path(), &[("js/b.js", "b();"), ("js/a.js", "a();")]);
        let spec = spec(BundleKind::Scripts, dir.path());

        let artifact = TransformPipeline::new(false)
            .pipe(Upper)
            .run(&spec, &files)
            .await
            .unwrap();
        assert_eq!(artifact.content, "B();\nA();");
        assert_eq!(artifact.destination, dir.path().join("build/js/site.js"));
        assert!(artifact.source_map.is_none());
    }

    #[tokio::test]
    async fn test_zero_inputs_skip_stages() {
        let dir = TempDir::new().unwrap();
        let spec = spec(BundleKind::Styles, dir.path());
        let artifact = TransformPipeline::new(true)
            .pipe(Broken(StageKind::Transform))
            .run(&spec, &[])
            .await
            .unwrap();
        assert!(artifact.is_empty());
        assert!(artifact.source_map.is_none());
    }

    #[tokio::test]
    async fn test_stage_errors_classified() {
        let dir = TempDir::new().unwrap();
        let files = write_inputs(dir.path(), &[("css/a.less", "a {}")]);
        let spec = spec(BundleKind::Styles, dir.path());

        let err = TransformPipeline::new(false)
            .pipe(Broken(StageKind::Compile))
            .pipe(Upper)
            .run(&spec, &files)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Compile { stage: "broken", .. }));

        let err = TransformPipeline::new(false)
            .pipe(Upper)
            .pipe(Broken(StageKind::Transform))
            .run(&spec, &files)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Stage { .. }));
    }

    #[tokio::test]
    async fn test_missing_input_is_read_error() {
        let dir = TempDir::new().unwrap();
        let spec = spec(BundleKind::Scripts, dir.path());
        let files = vec![CandidateFile::new(dir.path().join("js/gone.js"), "js/gone.js")];
        let err = TransformPipeline::new(false).run(&spec, &files).await.unwrap_err();
        assert!(matches!(err, PipelineError::Read { .. }));
    }

    #[tokio::test]
    async fn test_style_map_is_inline() {
        let dir = TempDir::new().unwrap();
        let files = write_inputs(dir.path(), &[("css/a.less", "a {}")]);
        let spec = spec(BundleKind::Styles, dir.path());
        let artifact = TransformPipeline::new(true).run(&spec, &files).await.unwrap();
        assert!(artifact.content.starts_with("a {}\n/*# sourceMappingURL=data:application/json;"));
        assert!(artifact.source_map.is_none());
    }

    #[tokio::test]
    async fn test_script_map_is_external() {
        let dir = TempDir::new().unwrap();
        let files = write_inputs(dir.path(), &[("js/a.js", "a();")]);
        let spec = spec(BundleKind::Scripts, dir.path());
        let artifact = TransformPipeline::new(true).run(&spec, &files).await.unwrap();
        assert!(artifact.content.ends_with("//# sourceMappingURL=../maps/site.js.map\n"));
        let map = artifact.source_map.unwrap();
        assert_eq!(map.path, dir.path().join("build/maps/site.js.map"));
        assert!(map.json.contains("\"sources\":[\"js/a.js\"]"));
    }

    #[tokio::test]
    async fn test_map_follows_stage_output() {
        let dir = TempDir::new().unwrap();
        let files = write_inputs(dir.path(), &[("js/a.js", "a();\nb();"), ("js/c.js", "c();")]);
        let spec = spec(BundleKind::Scripts, dir.path());
        let artifact = TransformPipeline::new(true)
            .pipe(Behead)
            .run(&spec, &files)
            .await
            .unwrap();

        let body = artifact
            .content
            .strip_suffix(&SourceMap::js_comment(&spec.map_url()))
            .unwrap();
        assert_eq!(body, "b();\nc();");

        let json: serde_json::Value =
            serde_json::from_str(&artifact.source_map.unwrap().json).unwrap();
        let mappings = json["mappings"].as_str().unwrap();
        assert_eq!(mappings.split(';').count(), body.lines().count());
        // b(); is a.js line 1, c(); is c.js line 0
        assert_eq!(mappings, "AACA;ACDA");
    }

    #[tokio::test]
    async fn test_opaque_stage_drops_map() {
        let dir = TempDir::new().unwrap();
        let files = write_inputs(dir.path(), &[("css/a.less", "a {}\nb {}")]);
        let spec = spec(BundleKind::Styles, dir.path());
        let artifact = TransformPipeline::new(true)
            .pipe(Upper)
            .run(&spec, &files)
            .await
            .unwrap();
        assert_eq!(artifact.content, "A {}\nB {}");
        assert!(artifact.source_map.is_none());
    }

    #[test]
    fn test_for_bundle_stage_selection() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::default();
        let dev = BuildOptions::resolve(false, false, true);
        let prod = BuildOptions::resolve(true, false, true);

        let styles = spec(BundleKind::Styles, dir.path());
        assert_eq!(
            TransformPipeline::for_bundle(&styles, &config, dev, dir.path()).stage_names(),
            ["less", "autoprefix"]
        );
        assert_eq!(
            TransformPipeline::for_bundle(&styles, &config, prod, dir.path()).stage_names(),
            ["less", "minify-css"]
        );

        let plain = styles.clone().with_compiler(Some(StyleCompiler::None));
        let pipeline = TransformPipeline::for_bundle(&plain, &config, dev, dir.path());
        assert_eq!(pipeline.stage_names(), ["autoprefix"]);

        let scripts = spec(BundleKind::Scripts, dir.path());
        assert_eq!(
            TransformPipeline::for_bundle(&scripts, &config, dev, dir.path()).stage_names(),
            ["transpile"]
        );
        assert_eq!(
            TransformPipeline::for_bundle(&scripts, &config, prod, dir.path()).stage_names(),
            ["transpile", "minify-js"]
        );
    }
}
