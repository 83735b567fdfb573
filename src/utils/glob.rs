//! Glob patterns relative to the project root.
//!
//! A pattern such as `assets/scss/**/*.scss` is split into a static base
//! directory (`assets/scss`) and a matcher for the full pattern. The base is
//! where snapshots start walking and where watchers attach.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use jwalk::WalkDir;
use notify::RecursiveMode;

use super::path::relative_slash;

/// Characters that make a path segment a glob rather than a literal.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// A compiled glob rooted at the project directory.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    /// Longest literal directory prefix of the pattern.
    base: PathBuf,
    /// Whether matches may live below the base directory's direct children.
    recursive: bool,
    matcher: GlobMatcher,
}

impl GlobPattern {
    /// Compile a `/`-separated pattern; `*` never crosses a separator.
    pub fn new(raw: &str) -> Result<Self, globset::Error> {
        let matcher = GlobBuilder::new(raw)
            .literal_separator(true)
            .build()?
            .compile_matcher();
        let (base, rest) = split_base(raw);

        Ok(Self {
            raw: raw.to_string(),
            base,
            recursive: rest.contains('/') || rest.contains("**"),
            matcher,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Match a root-relative, `/`-separated path.
    pub fn is_match(&self, relative: &str) -> bool {
        self.matcher.is_match(relative)
    }

    /// Match an absolute path under `root`.
    pub fn matches_path(&self, path: &Path, root: &Path) -> bool {
        relative_slash(path, root).is_some_and(|rel| self.is_match(&rel))
    }

    /// Watch mode needed on [`Self::base`] to observe every possible match.
    pub fn watch_mode(&self) -> RecursiveMode {
        if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        }
    }

    /// All files currently matching the pattern, sorted.
    ///
    /// The result is a point-in-time snapshot: files created after the walk
    /// are picked up by the next invocation.
    pub fn snapshot(&self, root: &Path) -> Vec<PathBuf> {
        let dir = root.join(&self.base);
        if !dir.is_dir() {
            return Vec::new();
        }

        let depth = if self.recursive { usize::MAX } else { 1 };
        let mut files: Vec<PathBuf> = WalkDir::new(&dir)
            .max_depth(depth)
            .sort(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path())
            .filter(|path| self.matches_path(path, root))
            .collect();
        files.sort();
        files
    }

    /// Path of a matched file relative to the base directory.
    ///
    /// Destinations mirror this layout, the same way `gulp.src` keeps the part
    /// of the path below the glob base.
    pub fn relative_to_base(&self, root: &Path, path: &Path) -> PathBuf {
        let base = root.join(&self.base);
        match path.strip_prefix(&base) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => path.file_name().map(PathBuf::from).unwrap_or_default(),
        }
    }
}

/// Split a pattern into its literal directory prefix and the remainder.
///
/// The last segment is never part of the base, so `index.html` has an empty
/// base and `assets/js/*.js` has base `assets/js`.
fn split_base(raw: &str) -> (PathBuf, &str) {
    let segments: Vec<&str> = raw.split('/').collect();
    let literal = segments[..segments.len() - 1]
        .iter()
        .take_while(|segment| !segment.contains(GLOB_META))
        .count();

    let base: PathBuf = segments[..literal].iter().collect();
    let offset: usize = segments[..literal].iter().map(|s| s.len() + 1).sum();
    (base, &raw[offset.min(raw.len())..])
}
