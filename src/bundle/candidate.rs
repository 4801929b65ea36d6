use std::path::PathBuf;
use std::time::SystemTime;

/// A file matched by a bundle's input patterns.
///
/// Produced fresh by every scan and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub absolute: PathBuf,
    /// Root-relative path with `/` separators, the form patterns match against.
    pub relative: String,
    pub modified: Option<SystemTime>,
}

impl CandidateFile {
    pub fn new(absolute: PathBuf, relative: impl Into<String>) -> Self {
        Self {
            absolute,
            relative: relative.into(),
            modified: None,
        }
    }
}
