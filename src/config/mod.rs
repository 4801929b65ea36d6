//! Project configuration management for `stitch.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── bundle     # [[bundles.styles]], [[bundles.scripts]]
//! │   ├── markup     # [markup]
//! │   ├── pattern    # [glob]
//! │   ├── pipeline   # [pipeline], [pipeline.targets]
//! │   ├── profile    # [profile], [profiles.<name>]
//! │   └── serve      # [serve]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! The project root is the directory holding the config file. Every path in
//! the file is relative to it.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    ActiveProfile, BundleConfig, BundlesConfig, GlobConfig, MarkupConfig,
    PipelineConfig, ProfileConfig, ProfileSelect, ServeConfig, StyleCompiler, select_profile,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::bundle::{BundleSpec, GlobError};
use crate::cli::Cli;
use crate::core::BundleKind;
use crate::log;
use crate::utils::path::{normalize_path, resolve_path};
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG: &str = "stitch.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `stitch.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Profile selected at start-up (internal use only)
    #[serde(skip)]
    pub active: ActiveProfile,

    #[serde(default)]
    pub bundles: BundlesConfig,

    #[serde(default)]
    pub markup: MarkupConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub profile: ProfileSelect,

    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub glob: GlobConfig,
}

impl ProjectConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. Without one the
    /// defaults apply and the current directory is the project root, unless
    /// `-C` named a file explicitly.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = normalize_path(&path);
                config
            }
            None if cli.config != Path::new(DEFAULT_CONFIG) => {
                return Err(ConfigError::Io(
                    cli.config.clone(),
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                )
                .into());
            }
            None => {
                log!("config"; "no {} found, using defaults", DEFAULT_CONFIG);
                Self {
                    config_path: cwd.join(DEFAULT_CONFIG),
                    ..Self::default()
                }
            }
        };

        config.finalize(cli.profile.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the root and the active profile.
    fn finalize(&mut self, requested_profile: Option<&str>) -> Result<(), ConfigError> {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.root = normalize_path(&root);
        self.active = select_profile(
            &self.profiles,
            requested_profile,
            self.profile.default.as_deref(),
        )?;
        Ok(())
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content).map_err(ConfigError::Toml)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    // ========================================================================
    // resolved paths
    // ========================================================================

    /// Absolute destination root of the active profile.
    pub fn destination(&self) -> PathBuf {
        resolve_path(&self.active.config.destination, &self.root)
    }

    /// Absolute output directory of a bundle.
    pub fn bundle_dir(&self, kind: BundleKind, bundle: &BundleConfig) -> PathBuf {
        let profile = &self.active.config;
        let sub = bundle.dest.as_deref().unwrap_or(match kind {
            BundleKind::Styles => &profile.styles_dir,
            BundleKind::Scripts => &profile.scripts_dir,
        });
        resolve_path(sub, &self.destination())
    }

    /// Compiler a style bundle resolves to.
    pub fn style_compiler(&self, bundle: &BundleConfig) -> StyleCompiler {
        bundle.compiler.unwrap_or(self.pipeline.compiler)
    }

    /// Build the runtime bundle specs of one kind.
    pub fn bundle_specs(&self, kind: BundleKind) -> Result<Vec<BundleSpec>, GlobError> {
        let dest_root = self.destination();
        self.bundles
            .of_kind(kind)
            .iter()
            .map(|bundle| {
                let spec = BundleSpec::new(
                    kind,
                    &bundle.file,
                    &dest_root,
                    &self.bundle_dir(kind, bundle),
                    &bundle.src,
                    &bundle.order,
                    self.glob.negation,
                )?;
                Ok(match kind {
                    BundleKind::Styles => spec.with_compiler(Some(self.style_compiler(bundle))),
                    BundleKind::Scripts => spec,
                })
            })
            .collect()
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the whole configuration, reporting every problem at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.bundles.validate(self.glob.negation, &mut diag);
        self.markup.validate(self.glob.negation, &mut diag);
        self.serve.validate(&mut diag);

        let mut compilers: Vec<StyleCompiler> = self
            .bundles
            .styles
            .iter()
            .map(|b| self.style_compiler(b))
            .collect();
        compilers.sort_by_key(|c| c.name());
        compilers.dedup();
        self.pipeline.validate(&compilers, &mut diag);

        self.validate_destination(&mut diag);
        self.validate_unique_outputs(&mut diag);

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// The destination root must not contain the sources.
    fn validate_destination(&self, diag: &mut ConfigDiagnostics) {
        let dest = self.destination();
        if self.root.starts_with(&dest) {
            diag.error_with_hint(
                FieldPath::new("profiles.destination"),
                format!(
                    "destination `{}` of profile `{}` contains the project root",
                    self.active.config.destination.display(),
                    self.active.name
                ),
                "`clean` deletes inside the destination, point it at a build directory",
            );
        }
    }

    /// Two bundles must not write the same file.
    fn validate_unique_outputs(&self, diag: &mut ConfigDiagnostics) {
        let mut outputs: FxHashMap<PathBuf, &str> = FxHashMap::default();
        for kind in BundleKind::ALL {
            for bundle in self.bundles.of_kind(kind) {
                let path = self.bundle_dir(kind, bundle).join(&bundle.file);
                if let Some(previous) = outputs.insert(path.clone(), &bundle.file) {
                    diag.error(
                        match kind {
                            BundleKind::Styles => BundlesConfig::FIELDS.styles,
                            BundleKind::Scripts => BundlesConfig::FIELDS.scripts,
                        },
                        format!(
                            "`{}` and `{}` both write `{}`",
                            previous,
                            bundle.file,
                            path.display()
                        ),
                    );
                }
            }
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet. Panics on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ProjectConfig {
    let (parsed, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Parse a config snippet rooted at `root`, with the profile resolved.
#[cfg(test)]
pub fn test_project_config(root: &Path, content: &str) -> ProjectConfig {
    let mut config = test_parse_config(content);
    config.config_path = root.join(DEFAULT_CONFIG);
    config.finalize(None).unwrap();
    config
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(ProjectConfig::parse_with_ignored("[serve\nport = 1").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let (config, ignored) =
            ProjectConfig::parse_with_ignored("[serve]\nport = 4000\nwatch = true\n[unknown]\nx = 1")
                .unwrap();
        assert_eq!(config.serve.port, 4000);
        assert!(ignored.iter().any(|f| f == "serve.watch"));
        assert!(ignored.iter().any(|f| f.contains("unknown")));
    }

    #[test]
    fn test_paths_follow_profile() {
        let dir = TempDir::new().unwrap();
        let config = test_project_config(
            dir.path(),
            "[profiles.app]\ndestination = \"public/assets\"\nscripts_dir = \"scripts\"",
        );
        let root = normalize_path(dir.path());

        assert_eq!(config.active.name, "app");
        assert_eq!(config.destination(), root.join("public/assets"));

        let scripts = config.bundle_specs(BundleKind::Scripts).unwrap();
        assert_eq!(scripts[0].output_path(), root.join("public/assets/scripts/site.js"));

        let styles = config.bundle_specs(BundleKind::Styles).unwrap();
        assert_eq!(styles[0].compiler, Some(StyleCompiler::Less));
        assert_eq!(styles[0].target(), "css/site.css");
    }

    #[test]
    fn test_destination_must_not_contain_root() {
        let dir = TempDir::new().unwrap();
        for destination in [".", ".."] {
            let config = test_project_config(
                dir.path(),
                &format!("[pipeline]\ncompiler = \"none\"\n[profiles.x]\ndestination = \"{destination}\""),
            );
            let mut diag = ConfigDiagnostics::new();
            config.validate_destination(&mut diag);
            assert_eq!(diag.len(), 1, "destination {destination}");
        }
    }

    #[test]
    fn test_duplicate_outputs_reported() {
        let dir = TempDir::new().unwrap();
        let config = test_project_config(
            dir.path(),
            r#"
[[bundles.scripts]]
src = ["js/a/*.js"]
file = "site.js"

[[bundles.scripts]]
src = ["js/b/*.js"]
file = "site.js"
"#,
        );
        let mut diag = ConfigDiagnostics::new();
        config.validate_unique_outputs(&mut diag);
        assert_eq!(diag.len(), 1);
        assert!(diag.errors()[0].message.contains("both write"));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let dir = TempDir::new().unwrap();
        let config = test_project_config(
            dir.path(),
            r#"
[pipeline]
compiler = "none"
es_target = "es1999"

[serve]
port = 5000
ws_port = 5000

[[bundles.styles]]
src = ["css/*.css"]
file = "../site.css"
"#,
        );
        let err = config.validate().unwrap_err();
        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err}");
        };
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_default_config_validates_without_compiler() {
        let dir = TempDir::new().unwrap();
        let config = test_project_config(dir.path(), "[pipeline]\ncompiler = \"none\"");
        assert!(config.validate().is_ok());
    }
}
