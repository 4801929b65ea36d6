//! `[pipeline]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [pipeline]
//! compiler = "less"                 # "less" | "scss" | "none"
//! less = ["lessc", "-"]             # reads stdin, writes stdout
//! scss = ["sass", "--stdin"]
//! autoprefix = true
//! transpile = true
//! es_target = "es2015"
//! source_maps = true                # development default; --sm forces, --prod disables
//! notify_timeout = 3000             # ms a compile error stays in the browser
//!
//! [pipeline.targets]
//! chrome = "90"
//! safari = "14.1"
//! ```
//!
//! Compiler commands may reference `$STITCH_ROOT` (project root) and
//! `$STITCH_MODE` (`dev` or `prod`).

use crate::config::{ConfigDiagnostics, FieldPath};
use lightningcss::targets::Browsers;
use serde::{Deserialize, Serialize};

/// External style compiler applied before autoprefixing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleCompiler {
    #[default]
    Less,
    Scss,
    None,
}

impl StyleCompiler {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Less => "less",
            Self::Scss => "scss",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub compiler: StyleCompiler,
    pub less: Vec<String>,
    pub scss: Vec<String>,
    pub autoprefix: bool,
    pub transpile: bool,
    pub es_target: String,
    pub source_maps: bool,
    pub notify_timeout: u64,
    pub targets: BrowserTargets,
}

pub struct PipelineFields {
    pub less: FieldPath,
    pub scss: FieldPath,
    pub es_target: FieldPath,
    pub targets: FieldPath,
}

impl PipelineConfig {
    pub const FIELDS: PipelineFields = PipelineFields {
        less: FieldPath::new("pipeline.less"),
        scss: FieldPath::new("pipeline.scss"),
        es_target: FieldPath::new("pipeline.es_target"),
        targets: FieldPath::new("pipeline.targets"),
    };

    /// Command line for a compiler, `None` for `StyleCompiler::None`.
    pub fn command_for(&self, compiler: StyleCompiler) -> Option<&[String]> {
        match compiler {
            StyleCompiler::Less => Some(&self.less),
            StyleCompiler::Scss => Some(&self.scss),
            StyleCompiler::None => None,
        }
    }

    /// Validate stage settings.
    ///
    /// `in_use` lists the compilers that style bundles actually resolve to;
    /// only those need to be installed.
    pub fn validate(&self, in_use: &[StyleCompiler], diag: &mut ConfigDiagnostics) {
        for &compiler in in_use {
            let field = match compiler {
                StyleCompiler::Less => Self::FIELDS.less,
                StyleCompiler::Scss => Self::FIELDS.scss,
                StyleCompiler::None => continue,
            };
            let command = self.command_for(compiler).unwrap_or_default();

            let Some(program) = command.first() else {
                diag.error(field, format!("{} compiler selected but command is empty", compiler.name()));
                continue;
            };

            let is_package_runner = ["npx", "bunx", "pnpx", "yarn", "dlx"].contains(&program.as_str());
            if which::which(program).is_err() {
                if is_package_runner {
                    if let Some(package) = command.get(1) {
                        diag.hint(field, format!("`{package}` via `{program}`, ensure package is installed"));
                    }
                } else {
                    diag.error_with_hint(
                        field,
                        format!("`{program}` not found"),
                        format!("install the compiler or update {field}"),
                    );
                }
            }
        }

        if oxc::transformer::TransformOptions::from_target(&self.es_target).is_err() {
            diag.error_with_hint(
                Self::FIELDS.es_target,
                format!("unknown target `{}`", self.es_target),
                "use an ES version such as `es2015` or `esnext`",
            );
        }

        if let Err(e) = self.targets.to_browsers() {
            diag.error(Self::FIELDS.targets, e);
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            compiler: StyleCompiler::Less,
            less: vec!["lessc".into(), "-".into()],
            scss: vec!["sass".into(), "--stdin".into()],
            autoprefix: true,
            transpile: true,
            es_target: "es2015".into(),
            source_maps: true,
            notify_timeout: 3000,
            targets: BrowserTargets::default(),
        }
    }
}

/// Minimum browser versions for autoprefixing, e.g. `safari = "14.1"`.
///
/// The defaults apply only when `[pipeline.targets]` is absent; a declared
/// table lists every browser it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserTargets {
    pub android: Option<String>,
    pub chrome: Option<String>,
    pub edge: Option<String>,
    pub firefox: Option<String>,
    pub ie: Option<String>,
    pub ios_saf: Option<String>,
    pub opera: Option<String>,
    pub safari: Option<String>,
    pub samsung: Option<String>,
}

impl Default for BrowserTargets {
    fn default() -> Self {
        Self {
            android: None,
            chrome: Some("90".into()),
            edge: Some("90".into()),
            firefox: Some("88".into()),
            ie: None,
            ios_saf: Some("14".into()),
            opera: None,
            safari: Some("14".into()),
            samsung: None,
        }
    }
}

impl BrowserTargets {
    /// Convert to lightningcss targets. `Ok(None)` when nothing is set.
    pub fn to_browsers(&self) -> Result<Option<Browsers>, String> {
        let parse = |name: &str, value: &Option<String>| -> Result<Option<u32>, String> {
            value
                .as_deref()
                .map(|v| parse_version(v).ok_or_else(|| format!("`{name} = \"{v}\"` is not a version")))
                .transpose()
        };

        let browsers = Browsers {
            android: parse("android", &self.android)?,
            chrome: parse("chrome", &self.chrome)?,
            edge: parse("edge", &self.edge)?,
            firefox: parse("firefox", &self.firefox)?,
            ie: parse("ie", &self.ie)?,
            ios_saf: parse("ios_saf", &self.ios_saf)?,
            opera: parse("opera", &self.opera)?,
            safari: parse("safari", &self.safari)?,
            samsung: parse("samsung", &self.samsung)?,
        };

        let any = [
            browsers.android,
            browsers.chrome,
            browsers.edge,
            browsers.firefox,
            browsers.ie,
            browsers.ios_saf,
            browsers.opera,
            browsers.safari,
            browsers.samsung,
        ]
        .iter()
        .any(Option::is_some);

        Ok(any.then_some(browsers))
    }
}

/// `"13.1.2"` → `0x000d0102`, the encoding lightningcss uses.
fn parse_version(v: &str) -> Option<u32> {
    let mut parts = v.trim().split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch: u32 = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    if parts.next().is_some() || major > 0xff || minor > 0xff || patch > 0xff {
        return None;
    }
    Some((major << 16) | (minor << 8) | patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_pipeline_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.pipeline.compiler, StyleCompiler::Less);
        assert_eq!(config.pipeline.less, vec!["lessc", "-"]);
        assert!(config.pipeline.autoprefix);
        assert!(config.pipeline.source_maps);
        assert_eq!(config.pipeline.notify_timeout, 3000);
    }

    #[test]
    fn test_pipeline_override() {
        let config = test_parse_config(
            "[pipeline]\ncompiler = \"scss\"\nscss = [\"npx\", \"sass\", \"--stdin\"]\ntranspile = false\n[pipeline.targets]\nchrome = \"100\"\nsafari = \"15.4\"",
        );
        assert_eq!(config.pipeline.compiler, StyleCompiler::Scss);
        assert_eq!(
            config.pipeline.command_for(StyleCompiler::Scss).unwrap(),
            ["npx", "sass", "--stdin"]
        );
        assert!(!config.pipeline.transpile);
        // Declaring the table replaces default targets
        assert_eq!(config.pipeline.targets.firefox, None);
        assert_eq!(config.pipeline.targets.chrome.as_deref(), Some("100"));
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("80"), Some(80 << 16));
        assert_eq!(parse_version("13.1"), Some((13 << 16) | (1 << 8)));
        assert_eq!(parse_version("13.1.2"), Some((13 << 16) | (1 << 8) | 2));
        assert_eq!(parse_version("latest"), None);
        assert_eq!(parse_version("1.2.3.4"), None);
        assert_eq!(parse_version("300"), None);
    }

    #[test]
    fn test_to_browsers() {
        let browsers = BrowserTargets::default().to_browsers().unwrap().unwrap();
        assert_eq!(browsers.chrome, Some(90 << 16));
        assert_eq!(browsers.ie, None);

        let empty = BrowserTargets {
            chrome: None,
            edge: None,
            firefox: None,
            ios_saf: None,
            safari: None,
            ..BrowserTargets::default()
        };
        assert!(empty.to_browsers().unwrap().is_none());

        let bad = BrowserTargets {
            safari: Some("x".into()),
            ..BrowserTargets::default()
        };
        assert!(bad.to_browsers().unwrap_err().contains("safari"));
    }

    #[test]
    fn test_validate_none_compiler_skips_lookup() {
        let config = test_parse_config("[pipeline]\nless = []");
        let mut diag = ConfigDiagnostics::new();
        config.pipeline.validate(&[StyleCompiler::None], &mut diag);
        assert!(diag.is_empty());

        config.pipeline.validate(&[StyleCompiler::Less], &mut diag);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_validate_es_target() {
        let config = test_parse_config("[pipeline]\nes_target = \"es1999\"");
        let mut diag = ConfigDiagnostics::new();
        config.pipeline.validate(&[], &mut diag);
        assert_eq!(diag.errors()[0].field, PipelineConfig::FIELDS.es_target);
    }
}
