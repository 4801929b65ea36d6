//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Resolve a request URL to a file under `serve_root`.
///
/// Directories resolve to their `index` file. Anything escaping the root,
/// directly or through a symlink, resolves to `None`.
pub fn resolve_path(url: &str, serve_root: &Path, index: &str) -> Option<PathBuf> {
    let clean = normalize_url(url);

    if clean.split('/').any(|part| part == "..") {
        return None;
    }

    let local = serve_root.join(&clean);
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join(index);
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Path part of a URL: decoded, without query or fragment, trimmed of slashes.
pub fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();
    decoded.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::write(dir.path().join("docs/index.html"), "docs").unwrap();
        fs::write(dir.path().join("css/site.css"), "").unwrap();
        fs::write(dir.path().join("a b.html"), "").unwrap();
        dir
    }

    #[test]
    fn test_directory_index() {
        let dir = site();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(resolve_path("/", dir.path(), "index.html"), Some(root.join("index.html")));
        assert_eq!(
            resolve_path("/docs/?x=1", dir.path(), "index.html"),
            Some(root.join("docs/index.html"))
        );
        assert_eq!(resolve_path("/css/", dir.path(), "index.html"), None);
    }

    #[test]
    fn test_files_and_encoding() {
        let dir = site();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(
            resolve_path("/css/site.css?v=3", dir.path(), "index.html"),
            Some(root.join("css/site.css"))
        );
        assert_eq!(
            resolve_path("/a%20b.html", dir.path(), "index.html"),
            Some(root.join("a b.html"))
        );
        assert_eq!(resolve_path("/missing.js", dir.path(), "index.html"), None);
    }

    #[test]
    fn test_traversal_rejected() {
        let dir = site();
        assert_eq!(resolve_path("/../etc/passwd", dir.path(), "index.html"), None);
        assert_eq!(resolve_path("/%2e%2e/etc/passwd", dir.path(), "index.html"), None);
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/docs/page.html?x#top"), "docs/page.html");
        assert_eq!(normalize_url("/"), "");
    }
}
