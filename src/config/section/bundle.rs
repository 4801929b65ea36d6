//! `[[bundles.styles]]` / `[[bundles.scripts]]` configuration.
//!
//! # Example
//!
//! ```toml
//! [[bundles.styles]]
//! src = ["css/**/*.less", "css/**/*.scss", "!build/**/*"]
//! file = "site.css"
//! order = ["**/common.less", "**/*.less"]
//!
//! [[bundles.scripts]]
//! src = ["js/**/*.js", "!build/**/*"]
//! file = "site.js"
//! order = ["**/common.js", "**/*.js"]
//! dest = "js/vendor"      # optional, relative to the profile destination
//! ```
//!
//! Without a `[bundles]` table the two bundles above are used. Once the table
//! is present, a missing list means no bundles of that kind.

use super::StyleCompiler;
use crate::bundle::{NegationMode, OrderResolver, PatternList, is_plain_file_name};
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::BundleKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One declared bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Input patterns, evaluated in order; `!` negates.
    pub src: Vec<String>,
    /// Output file name.
    pub file: String,
    /// Concatenation order patterns, first match wins.
    #[serde(default)]
    pub order: Vec<String>,
    /// Output directory relative to the destination root.
    /// Defaults to the profile's `styles_dir` / `scripts_dir`.
    #[serde(default)]
    pub dest: Option<PathBuf>,
    /// Compiler override for this style bundle.
    #[serde(default)]
    pub compiler: Option<StyleCompiler>,
}

impl BundleConfig {
    fn new(src: &[&str], file: &str, order: &[&str]) -> Self {
        Self {
            src: src.iter().map(|s| (*s).to_string()).collect(),
            file: file.into(),
            order: order.iter().map(|s| (*s).to_string()).collect(),
            dest: None,
            compiler: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlesConfig {
    #[serde(default)]
    pub styles: Vec<BundleConfig>,
    #[serde(default)]
    pub scripts: Vec<BundleConfig>,
}

pub struct BundlesFields {
    pub styles: FieldPath,
    pub scripts: FieldPath,
}

impl BundlesConfig {
    pub const FIELDS: BundlesFields = BundlesFields {
        styles: FieldPath::new("bundles.styles"),
        scripts: FieldPath::new("bundles.scripts"),
    };

    pub fn of_kind(&self, kind: BundleKind) -> &[BundleConfig] {
        match kind {
            BundleKind::Styles => &self.styles,
            BundleKind::Scripts => &self.scripts,
        }
    }

    /// Check file names, patterns and per-bundle overrides.
    pub fn validate(&self, negation: NegationMode, diag: &mut ConfigDiagnostics) {
        for kind in BundleKind::ALL {
            let field = match kind {
                BundleKind::Styles => Self::FIELDS.styles,
                BundleKind::Scripts => Self::FIELDS.scripts,
            };

            for (i, bundle) in self.of_kind(kind).iter().enumerate() {
                let label = format!("#{} (`{}`)", i + 1, bundle.file);

                if !is_plain_file_name(&bundle.file) {
                    diag.error_with_hint(
                        field,
                        format!("{label}: `file` must be a single file name"),
                        "use `dest` to place the bundle in a subdirectory",
                    );
                }
                if bundle.src.is_empty() {
                    diag.error(field, format!("{label}: `src` is empty"));
                }
                if let Err(e) = PatternList::new(&bundle.src, negation) {
                    diag.error(field, format!("{label}: {e}"));
                }
                if let Err(e) = OrderResolver::new(&bundle.order) {
                    diag.error(field, format!("{label}: {e}"));
                }
                if let Some(dest) = &bundle.dest
                    && (dest.is_absolute()
                        || dest.components().any(|c| matches!(c, std::path::Component::ParentDir)))
                {
                    diag.error(
                        field,
                        format!("{label}: `dest` must be relative and stay inside the destination"),
                    );
                }
                if kind == BundleKind::Scripts && bundle.compiler.is_some() {
                    diag.warn(field, format!("{label}: `compiler` only applies to style bundles"));
                }
            }
        }
    }
}

impl Default for BundlesConfig {
    fn default() -> Self {
        Self {
            styles: vec![BundleConfig::new(
                &["css/**/*.less", "css/**/*.scss", "!build/**/*"],
                "site.css",
                &["**/common.less", "**/*.less"],
            )],
            scripts: vec![BundleConfig::new(
                &["./js/**/*.js", "!build/**/*"],
                "site.js",
                &["**/common.js", "**/*.js"],
            )],
        }
    }
}
