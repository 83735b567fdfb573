//! Filesystem listener.
//!
//! Bridges notify's callback thread into tokio and hands out debounced
//! batches of changes:
//!
//! ```text
//! notify thread → mpsc → Debouncer → ChangeBatch
//! ```

use std::path::PathBuf;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use super::debouncer::{ChangeKind, Debouncer};
use super::roots::WatchRoots;

/// How often missing watch roots are looked for.
const MAINTAIN_INTERVAL: Duration = Duration::from_secs(1);

/// Changes observed during one quiet period.
#[derive(Debug, Default)]
pub struct ChangeBatch {
    pub changes: FxHashMap<PathBuf, ChangeKind>,
    /// Roots attached since the previous batch. Files written into them
    /// before the watch existed produced no events.
    pub attached: Vec<PathBuf>,
}

/// A notify watcher over a fixed set of roots.
pub struct Listener {
    watcher: RecommendedWatcher,
    roots: WatchRoots,
    events: mpsc::Receiver<notify::Event>,
    debouncer: Debouncer,
    maintain: Interval,
}

impl Listener {
    /// Start watching `roots` right away; events buffer until the first
    /// [`Self::next_batch`] call. Must be called inside the tokio runtime.
    pub fn new(roots: Vec<(PathBuf, RecursiveMode)>) -> notify::Result<Self> {
        let (tx, events) = mpsc::channel::<notify::Event>(64);

        // The callback runs on notify's own thread, so blocking is fine
        let mut watcher = notify::recommended_watcher(move |res| match res {
            Ok(event) => {
                let _ = tx.blocking_send(event);
            }
            Err(e) => crate::log!("watch"; "notify error: {}", e),
        })?;

        let mut roots = WatchRoots::new(roots);
        roots.attach_existing(&mut watcher)?;

        let mut maintain = tokio::time::interval(MAINTAIN_INTERVAL);
        maintain.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Self {
            watcher,
            roots,
            events,
            debouncer: Debouncer::new(),
            maintain,
        })
    }

    /// Wait for the next non-empty batch of changes.
    pub async fn next_batch(&mut self) -> ChangeBatch {
        let Self {
            watcher,
            roots,
            events,
            debouncer,
            maintain,
        } = self;

        loop {
            tokio::select! {
                biased;
                Some(event) = events.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    if let Some(changes) = debouncer.take_if_ready() {
                        for (path, kind) in &changes {
                            crate::debug!("watch"; "{}: {}", kind.label(), path.display());
                        }
                        return ChangeBatch {
                            changes,
                            attached: Vec::new(),
                        };
                    }
                }
                _ = maintain.tick() => {
                    let attached = roots.maintain(watcher);
                    if !attached.is_empty() {
                        return ChangeBatch {
                            changes: FxHashMap::default(),
                            attached,
                        };
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tokio::time::timeout;

    use crate::utils::path::normalize_path;

    #[tokio::test]
    async fn test_write_produces_batch() {
        let temp = TempDir::new().unwrap();
        let root = normalize_path(temp.path());
        let mut listener =
            Listener::new(vec![(root.clone(), RecursiveMode::NonRecursive)]).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        fs::write(root.join("main.scss"), "a { b: c }").unwrap();

        let batch = timeout(Duration::from_secs(5), listener.next_batch())
            .await
            .unwrap();
        assert!(batch.changes.contains_key(&root.join("main.scss")));
    }

    #[tokio::test]
    async fn test_missing_root_attached_later() {
        let temp = TempDir::new().unwrap();
        let root = normalize_path(temp.path());
        let dist = root.join("dist");
        let mut listener = Listener::new(vec![(dist.clone(), RecursiveMode::Recursive)]).unwrap();

        fs::create_dir(&dist).unwrap();

        let batch = timeout(Duration::from_secs(5), listener.next_batch())
            .await
            .unwrap();
        assert_eq!(batch.attached, vec![dist]);
    }
}
