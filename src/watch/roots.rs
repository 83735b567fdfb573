use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Watch-root consistency manager.
///
/// Attaches the roots that exist at startup and picks up the others (or
/// roots removed and recreated later) on each `maintain` call.
pub(super) struct WatchRoots {
    desired: Vec<(PathBuf, RecursiveMode)>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    /// A root wanted both ways is watched recursively.
    pub(super) fn new(roots: impl IntoIterator<Item = (PathBuf, RecursiveMode)>) -> Self {
        let mut desired: Vec<(PathBuf, RecursiveMode)> = Vec::new();
        for (path, mode) in roots {
            match desired.iter_mut().find(|(p, _)| *p == path) {
                Some(existing) if mode == RecursiveMode::Recursive => existing.1 = mode,
                Some(_) => {}
                None => desired.push((path, mode)),
            }
        }
        Self {
            desired,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn desired(&self) -> &[(PathBuf, RecursiveMode)] {
        &self.desired
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for (path, mode) in &self.desired {
            if !path.is_dir() {
                crate::debug!("watch"; "not yet present: {}", path.display());
                continue;
            }
            watcher.watch(path, *mode)?;
            self.attached.insert(path.clone());
        }

        Ok(())
    }

    /// Re-attach roots that appeared since the last call; returns them.
    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) -> Vec<PathBuf> {
        // Drop stale handles for roots that no longer exist.
        self.attached.retain(|path| path.exists());

        let mut fresh = Vec::new();
        for (path, mode) in &self.desired {
            if self.attached.contains(path) || !path.is_dir() {
                continue;
            }

            if watcher.watch(path, *mode).is_ok() {
                self.attached.insert(path.clone());
                crate::debug!("watch"; "attached watch: {}", path.display());
                fresh.push(path.clone());
            }
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_roots_merge_to_recursive() {
        let roots = WatchRoots::new([
            (PathBuf::from("/site"), RecursiveMode::NonRecursive),
            (PathBuf::from("/site/dist"), RecursiveMode::Recursive),
            (PathBuf::from("/site"), RecursiveMode::Recursive),
        ]);
        assert_eq!(
            roots.desired(),
            &[
                (PathBuf::from("/site"), RecursiveMode::Recursive),
                (PathBuf::from("/site/dist"), RecursiveMode::Recursive),
            ]
        );
    }

    #[test]
    fn test_non_recursive_does_not_downgrade() {
        let roots = WatchRoots::new([
            (PathBuf::from("/a"), RecursiveMode::Recursive),
            (PathBuf::from("/a"), RecursiveMode::NonRecursive),
        ]);
        assert_eq!(roots.desired()[0].1, RecursiveMode::Recursive);
    }
}
