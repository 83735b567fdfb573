//! `[paths]` section: the asset group registry.
//!
//! # Example
//!
//! ```toml
//! [paths.styles]
//! source = "assets/scss/*.scss"      # files compiled on each run
//! watch  = "assets/scss/**/*.scss"   # files that trigger a rebuild
//! dest   = "dist/css"
//! ```
//!
//! A group table, when present, must give all three keys.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::AssetGroup;
use crate::utils::glob::GlobPattern;

/// Source glob, watch glob and destination directory of one asset group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPaths {
    pub source: String,
    pub watch: String,
    pub dest: PathBuf,
}

impl GroupPaths {
    fn new(source: &str, watch: &str, dest: &str) -> Self {
        Self {
            source: source.to_string(),
            watch: watch.to_string(),
            dest: PathBuf::from(dest),
        }
    }

    pub fn source_glob(&self) -> Result<GlobPattern, globset::Error> {
        GlobPattern::new(&self.source)
    }

    pub fn watch_glob(&self) -> Result<GlobPattern, globset::Error> {
        GlobPattern::new(&self.watch)
    }

    /// Field paths for `source`, `watch` and `dest` of a group.
    const fn fields(group: AssetGroup) -> [FieldPath; 3] {
        match group {
            AssetGroup::Styles => [
                FieldPath::new("paths.styles.source"),
                FieldPath::new("paths.styles.watch"),
                FieldPath::new("paths.styles.dest"),
            ],
            AssetGroup::Scripts => [
                FieldPath::new("paths.scripts.source"),
                FieldPath::new("paths.scripts.watch"),
                FieldPath::new("paths.scripts.dest"),
            ],
            AssetGroup::Icons => [
                FieldPath::new("paths.icons.source"),
                FieldPath::new("paths.icons.watch"),
                FieldPath::new("paths.icons.dest"),
            ],
        }
    }
}

/// Registry of all asset groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub styles: GroupPaths,
    pub scripts: GroupPaths,
    pub icons: GroupPaths,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            styles: GroupPaths::new("assets/scss/*.scss", "assets/scss/**/*.scss", "dist/css"),
            scripts: GroupPaths::new("assets/js/*.js", "assets/js/**/*.js", "dist/js"),
            icons: GroupPaths::new(
                "assets/images/svg/*.svg",
                "assets/images/svg/*.svg",
                "dist/images/icons/svg",
            ),
        }
    }
}

impl PathsConfig {
    pub fn group(&self, group: AssetGroup) -> &GroupPaths {
        match group {
            AssetGroup::Styles => &self.styles,
            AssetGroup::Scripts => &self.scripts,
            AssetGroup::Icons => &self.icons,
        }
    }

    /// Check globs compile and destinations never overlap.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for group in AssetGroup::ALL {
            let paths = self.group(group);
            let [source_field, watch_field, dest_field] = GroupPaths::fields(group);

            if let Err(err) = paths.source_glob() {
                diag.error(source_field, format!("invalid glob: {err}"));
            }
            if let Err(err) = paths.watch_glob() {
                diag.error(watch_field, format!("invalid glob: {err}"));
            }
            if paths.dest.is_absolute() {
                diag.error_with_hint(
                    dest_field,
                    "destination must be relative to the project root",
                    format!("use a path like `dist/{}`", group.label()),
                );
            }
        }

        for (i, a) in AssetGroup::ALL.iter().enumerate() {
            for b in &AssetGroup::ALL[i + 1..] {
                let (dest_a, dest_b) = (&self.group(*a).dest, &self.group(*b).dest);
                if overlaps(dest_a, dest_b) {
                    diag.error_with_hint(
                        GroupPaths::fields(*b)[2],
                        format!(
                            "`{}` overlaps the {a} destination `{}`",
                            dest_b.display(),
                            dest_a.display()
                        ),
                        "each group must own a separate output directory",
                    );
                }
            }
        }
    }
}

/// Two destinations overlap when equal or when one contains the other.
fn overlaps(a: &Path, b: &Path) -> bool {
    let (a, b) = (lexical(a), lexical(b));
    a.starts_with(&b) || b.starts_with(&a)
}

/// Drop `.` components so `./dist/css` and `dist/css` compare equal.
fn lexical(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
