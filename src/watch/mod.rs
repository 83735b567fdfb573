//! Watch supervisor.
//!
//! One listener over every group's watch glob. Each debounced batch reruns
//! the touched groups once, on the blocking pool. Reruns of the same group
//! are not serialized against each other.

mod bindings;
mod debouncer;
mod listener;
mod roots;

pub use bindings::Bindings;
pub use debouncer::ChangeKind;
pub use listener::{ChangeBatch, Listener};

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::core::{AssetGroup, is_shutdown};
use crate::pipeline::{PipelineError, run_group};
use crate::{debug, log, logger};

/// Owns the group listeners for the lifetime of the process.
pub struct WatchSupervisor {
    config: Arc<PipelineConfig>,
    bindings: Bindings<AssetGroup>,
    listener: Listener,
}

impl WatchSupervisor {
    /// Register a binding per group and attach the watcher.
    pub fn start(config: Arc<PipelineConfig>) -> Result<Self> {
        let mut bindings = Bindings::new(&config.root);
        for group in AssetGroup::ALL {
            let paths = config.paths.group(group);
            let glob = paths.watch_glob().map_err(|source| PipelineError::Glob {
                pattern: paths.watch.clone(),
                source,
            })?;
            debug!("watch"; "{group}: {}", glob.as_str());
            bindings.bind(group, glob);
        }

        let listener = Listener::new(bindings.roots()).context("failed to start file watcher")?;
        log!("watch"; "watching {} asset group(s)", AssetGroup::ALL.len());

        Ok(Self {
            config,
            bindings,
            listener,
        })
    }

    /// Dispatch reruns until shutdown.
    pub async fn run(mut self) {
        while !is_shutdown() {
            let batch = self.listener.next_batch().await;
            for group in self.bindings.triggered(&batch) {
                spawn_rebuild(group, Arc::clone(&self.config));
            }
        }
    }
}

fn spawn_rebuild(group: AssetGroup, config: Arc<PipelineConfig>) {
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || run_group(group, &config)).await;
        match result {
            Ok(Ok(report)) => report.show_status(),
            Ok(Err(err)) => {
                let err = anyhow::Error::from(err);
                logger::status_error(&format!("{group} failed"), &format!("{err:#}"));
            }
            Err(err) => log!("watch"; "{group} rebuild aborted: {err}"),
        }
    });
}
