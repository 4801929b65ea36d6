use super::{CandidateFile, GlobError, NegationMode, OrderResolver, PatternList};
use crate::config::StyleCompiler;
use crate::core::{BuildError, BundleKind};
use crate::debug;
use crate::utils::plural::plural_count;
use std::path::{Path, PathBuf};

/// Source maps of a bundle in `<dest>/js` are written to `<dest>/maps`.
const MAPS_DIR: &str = "maps";

/// One declared output artifact.
///
/// Immutable once built from configuration; shared by every task invocation.
#[derive(Debug, Clone)]
pub struct BundleSpec {
    pub kind: BundleKind,
    pub file_name: String,
    /// Absolute directory the artifact is written to.
    pub dest_dir: PathBuf,
    /// Absolute destination root the directory lives under.
    pub dest_root: PathBuf,
    pub inputs: PatternList,
    pub order: OrderResolver,
    /// Per-bundle compiler override (styles only).
    pub compiler: Option<StyleCompiler>,
}

impl BundleSpec {
    pub fn new<S: AsRef<str>>(
        kind: BundleKind,
        file_name: &str,
        dest_root: &Path,
        dest_dir: &Path,
        inputs: &[S],
        order: &[S],
        negation: NegationMode,
    ) -> Result<Self, GlobError> {
        Ok(Self {
            kind,
            file_name: file_name.to_string(),
            dest_dir: dest_dir.to_path_buf(),
            dest_root: dest_root.to_path_buf(),
            inputs: PatternList::new(inputs, negation)?,
            order: OrderResolver::new(order)?,
            compiler: None,
        })
    }

    pub fn with_compiler(mut self, compiler: Option<StyleCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.dest_dir.join(&self.file_name)
    }

    /// Output path relative to the destination root, e.g. `css/site.css`.
    ///
    /// This is the target the live-reload client matches stylesheets against.
    pub fn target(&self) -> String {
        crate::utils::path::relative_slash(&self.output_path(), &self.dest_root)
            .unwrap_or_else(|| self.file_name.clone())
    }

    /// Where an external source map for this bundle is written.
    pub fn map_path(&self) -> PathBuf {
        self.maps_parent()
            .join(MAPS_DIR)
            .join(format!("{}.map", self.file_name))
    }

    /// `sourceMappingURL` of the external map, relative to the artifact.
    pub fn map_url(&self) -> String {
        if self.dest_dir == self.dest_root {
            format!("{MAPS_DIR}/{}.map", self.file_name)
        } else {
            format!("../{MAPS_DIR}/{}.map", self.file_name)
        }
    }

    fn maps_parent(&self) -> &Path {
        if self.dest_dir == self.dest_root {
            &self.dest_root
        } else {
            self.dest_dir.parent().unwrap_or(&self.dest_root)
        }
    }

    /// Scan and order the bundle's inputs against the current disk state.
    pub fn collect(&self, root: &Path) -> Result<Vec<CandidateFile>, BuildError> {
        let found = self.inputs.scan(root)?;
        let ordered = self.order.resolve(found);
        debug!(self.kind.name(); "{}: {}", self.file_name, plural_count(ordered.len(), "input"));
        crate::debug_do! {
            for file in &ordered {
                debug!(self.kind.name(); "  {}", file.relative);
            }
        }
        Ok(ordered)
    }
}

/// Whether `name` is a single well-formed relative file name.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}
