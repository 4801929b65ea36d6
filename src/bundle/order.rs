//! Concatenation ordering.
//!
//! Each file is ranked by the index of the first order pattern it matches;
//! files matching none rank after all patterns. A stable sort on
//! `(rank, discovery index)` keeps scan order among equals.

use super::CandidateFile;
use super::pattern::{GlobError, MATCH_OPTIONS};
use glob::Pattern;

#[derive(Debug, Clone, Default)]
pub struct OrderResolver {
    patterns: Vec<Pattern>,
}

impl OrderResolver {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, GlobError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let raw = p.as_ref();
                let source = raw.trim().trim_start_matches("./");
                Pattern::new(source).map_err(|e| GlobError {
                    pattern: raw.to_string(),
                    message: e.msg.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// Index of the first matching pattern, or the pattern count.
    pub fn rank(&self, relative: &str) -> usize {
        self.patterns
            .iter()
            .position(|p| p.matches_with(relative, MATCH_OPTIONS))
            .unwrap_or(self.patterns.len())
    }

    pub fn resolve(&self, files: Vec<CandidateFile>) -> Vec<CandidateFile> {
        let mut ranked: Vec<_> = files
            .into_iter()
            .map(|f| (self.rank(&f.relative), f))
            .collect();
        // sort_by_key is stable, so discovery order breaks ties
        ranked.sort_by_key(|(rank, _)| *rank);
        ranked.into_iter().map(|(_, f)| f).collect()
    }
}
