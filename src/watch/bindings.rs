//! Watch bindings: which glob triggers what.

use std::path::{Path, PathBuf};

use notify::RecursiveMode;

use super::listener::ChangeBatch;
use crate::utils::glob::GlobPattern;

/// Globs under one project root, each bound to a target.
#[derive(Debug, Clone)]
pub struct Bindings<T> {
    root: PathBuf,
    entries: Vec<(T, GlobPattern)>,
}

impl<T: Copy + PartialEq> Bindings<T> {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            entries: Vec::new(),
        }
    }

    pub fn bind(&mut self, target: T, glob: GlobPattern) {
        self.entries.push((target, glob));
    }

    /// Directories to watch, one per glob base.
    pub fn roots(&self) -> Vec<(PathBuf, RecursiveMode)> {
        self.entries
            .iter()
            .map(|(_, glob)| (self.root.join(glob.base()), glob.watch_mode()))
            .collect()
    }

    /// Whether any glob matches `path`.
    pub fn matches(&self, path: &Path) -> bool {
        self.entries
            .iter()
            .any(|(_, glob)| glob.matches_path(path, &self.root))
    }

    /// Targets touched by `batch`, each once, in binding order.
    ///
    /// A binding fires when a changed path matches its glob or when its
    /// base directory was only just attached.
    pub fn triggered(&self, batch: &ChangeBatch) -> Vec<T> {
        let mut targets = Vec::new();
        for (target, glob) in &self.entries {
            if targets.contains(target) {
                continue;
            }
            let base = self.root.join(glob.base());
            let fired = batch.attached.contains(&base)
                || batch
                    .changes
                    .keys()
                    .any(|path| glob.matches_path(path, &self.root));
            if fired {
                targets.push(*target);
            }
        }
        targets
    }
}
