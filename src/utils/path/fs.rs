//! Path normalization utilities.
//!
//! Glob patterns are always matched against root-relative paths written with
//! `/` separators, regardless of platform. `relative_slash` produces that form.

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Resolve a path relative to `base` unless it is already absolute.
///
/// Unlike [`normalize_path`] the target does not need to exist, so `.` and
/// `..` components are folded lexically.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Root-relative form of `path` with `/` separators.
///
/// Returns `None` when `path` is not under `root`.
pub fn relative_slash(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Whether `path` equals `dir` or lies beneath it (lexical check).
#[inline]
pub fn is_within(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_resolve_path_folds_components() {
        let base = Path::new("/project");
        assert_eq!(resolve_path(Path::new("./build"), base), PathBuf::from("/project/build"));
        assert_eq!(resolve_path(Path::new("../dist"), base), PathBuf::from("/dist"));
        assert_eq!(resolve_path(Path::new("/abs/out"), base), PathBuf::from("/abs/out"));
        assert_eq!(resolve_path(Path::new("."), base), PathBuf::from("/project"));
    }

    #[test]
    fn test_relative_slash() {
        let root = Path::new("/project");
        assert_eq!(
            relative_slash(Path::new("/project/css/base/common.less"), root).as_deref(),
            Some("css/base/common.less")
        );
        assert_eq!(relative_slash(Path::new("/project"), root).as_deref(), Some(""));
        assert_eq!(relative_slash(Path::new("/elsewhere/a.less"), root), None);
    }

    #[test]
    fn test_is_within() {
        let dest = Path::new("/project/build");
        assert!(is_within(Path::new("/project/build/css/site.css"), dest));
        assert!(is_within(dest, dest));
        assert!(!is_within(Path::new("/project/builder/x"), dest));
    }
}
