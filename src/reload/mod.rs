//! Live reload.
//!
//! A [`ReloadHub`] holds the connected browsers; a listener over the
//! `serve.reload` globs tells them to reload after each debounced batch.

mod hub;
mod message;

pub use hub::ReloadHub;
pub use message::HotReloadMessage;

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::core::is_shutdown;
use crate::debug;
use crate::utils::path::relative_slash;
use crate::watch::{Bindings, ChangeBatch, Listener};

/// Start the reload listener. Must be called inside the tokio runtime.
pub fn spawn_reload_watcher(config: &PipelineConfig, hub: ReloadHub) -> Result<()> {
    let mut bindings = Bindings::new(&config.root);
    for glob in config.serve.reload_globs()? {
        debug!("reload"; "watching {}", glob.as_str());
        bindings.bind((), glob);
    }

    let mut listener = Listener::new(bindings.roots()).context("failed to start reload watcher")?;
    let root = config.root.clone();

    tokio::spawn(async move {
        while !is_shutdown() {
            let batch = listener.next_batch().await;
            if bindings.triggered(&batch).is_empty() {
                continue;
            }
            let reason = describe(&batch, &bindings, &root);
            let sent = hub.broadcast(&HotReloadMessage::reload(&reason));
            debug!("reload"; "{reason}: reloaded {sent} client(s)");
        }
    });
    Ok(())
}

/// The first matching changed path, root-relative.
fn describe(batch: &ChangeBatch, bindings: &Bindings<()>, root: &Path) -> String {
    let mut changed: Vec<&Path> = batch
        .changes
        .keys()
        .map(|path| path.as_path())
        .filter(|path| bindings.matches(path))
        .chain(batch.attached.iter().map(|path| path.as_path()))
        .collect();
    changed.sort();

    changed
        .first()
        .and_then(|path| relative_slash(path, root))
        .unwrap_or_else(|| "change".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::glob::GlobPattern;
    use crate::watch::ChangeKind;
    use std::path::PathBuf;

    #[test]
    fn test_describe_names_first_matching_path() {
        let root = Path::new("/site");
        let mut bindings = Bindings::new(root);
        bindings.bind((), GlobPattern::new("dist/**/*.*").unwrap());

        let batch = ChangeBatch {
            changes: [
                ("/site/notes.txt", ChangeKind::Modified),
                ("/site/dist/js/app.min.js", ChangeKind::Modified),
                ("/site/dist/css/main.min.css", ChangeKind::Created),
            ]
            .into_iter()
            .map(|(p, k)| (PathBuf::from(p), k))
            .collect(),
            attached: Vec::new(),
        };
        assert_eq!(describe(&batch, &bindings, root), "dist/css/main.min.css");
    }
}
