//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Outcome of mapping a request URL onto the served directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    /// The URL tries to leave the served directory.
    Forbidden,
    NotFound,
}

/// Resolve a URL to a file, handling `index.html` for directories.
pub fn resolve_path(url: &str, serve_root: &Path) -> Resolved {
    let clean = normalize_url(url);

    if clean.split('/').any(|segment| segment == "..") {
        return Resolved::Forbidden;
    }

    let Ok(root) = serve_root.canonicalize() else {
        return Resolved::NotFound;
    };
    let Ok(canonical) = root.join(&clean).canonicalize() else {
        return Resolved::NotFound;
    };

    // Symlinks may still point outside the root
    if !canonical.starts_with(&root) {
        return Resolved::Forbidden;
    }

    if canonical.is_file() {
        return Resolved::File(canonical);
    }

    let index = canonical.join("index.html");
    if canonical.is_dir() && index.is_file() {
        return Resolved::File(index);
    }

    Resolved::NotFound
}

/// Decode, strip query string and fragment, trim slashes.
fn normalize_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    decoded.replace('\\', "/").trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("index.html"), "<html></html>").unwrap();
        fs::create_dir_all(root.join("dist/css")).unwrap();
        fs::write(root.join("dist/css/main.min.css"), "a{}").unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("docs/index.html"), "<html></html>").unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        temp
    }

    fn file(root: &Path, rel: &str) -> Resolved {
        Resolved::File(root.canonicalize().unwrap().join(rel))
    }

    #[test]
    fn test_root_serves_index() {
        let temp = site();
        assert_eq!(resolve_path("/", temp.path()), file(temp.path(), "index.html"));
    }

    #[test]
    fn test_directory_serves_index() {
        let temp = site();
        assert_eq!(
            resolve_path("/docs/", temp.path()),
            file(temp.path(), "docs/index.html")
        );
        assert_eq!(resolve_path("/empty", temp.path()), Resolved::NotFound);
    }

    #[test]
    fn test_query_string_ignored() {
        let temp = site();
        assert_eq!(
            resolve_path("/dist/css/main.min.css?v=3#x", temp.path()),
            file(temp.path(), "dist/css/main.min.css")
        );
    }

    #[test]
    fn test_traversal_forbidden() {
        let temp = site();
        assert_eq!(resolve_path("/../etc/passwd", temp.path()), Resolved::Forbidden);
        assert_eq!(resolve_path("/dist/%2e%2e/%2e%2e/x", temp.path()), Resolved::Forbidden);
    }

    #[test]
    fn test_dots_inside_names_allowed() {
        let temp = site();
        fs::write(temp.path().join("a..b.txt"), "x").unwrap();
        assert_eq!(resolve_path("/a..b.txt", temp.path()), file(temp.path(), "a..b.txt"));
    }

    #[test]
    fn test_missing_file() {
        let temp = site();
        assert_eq!(resolve_path("/nope.js", temp.path()), Resolved::NotFound);
    }
}
