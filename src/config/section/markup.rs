//! `[markup]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [markup]
//! src = ["*.html", "!includes/**/*.html"]   # pages written to the destination root
//! watch = ["includes/**/*.html"]            # extra files that trigger a markup rebuild
//! prefix = "@@"                             # include directive prefix: @@include('file')
//! ```
//!
//! Whether markup is built at all is decided by the active profile
//! (`[profiles.<name>] markup`).

use crate::bundle::{NegationMode, PatternList};
use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    pub src: Vec<String>,
    pub watch: Vec<String>,
    pub prefix: String,
}

pub struct MarkupFields {
    pub src: FieldPath,
    pub watch: FieldPath,
    pub prefix: FieldPath,
}

impl MarkupConfig {
    pub const FIELDS: MarkupFields = MarkupFields {
        src: FieldPath::new("markup.src"),
        watch: FieldPath::new("markup.watch"),
        prefix: FieldPath::new("markup.prefix"),
    };

    pub fn validate(&self, negation: NegationMode, diag: &mut ConfigDiagnostics) {
        if let Err(e) = PatternList::new(&self.src, negation) {
            diag.error(Self::FIELDS.src, e.to_string());
        }
        if let Err(e) = PatternList::new(&self.watch, negation) {
            diag.error(Self::FIELDS.watch, e.to_string());
        }
        if self.prefix.trim().is_empty() {
            diag.error(Self::FIELDS.prefix, "include prefix must not be empty");
        }
    }
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            src: vec!["*.html".into(), "!includes/**/*.html".into()],
            watch: vec!["includes/**/*.html".into()],
            prefix: "@@".into(),
        }
    }
}
