//! Jobs and the runner that carries them out.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;

use crate::config::PipelineConfig;
use crate::core::AssetGroup;
use crate::pipeline::{PipelineError, run_group};
use crate::serve::DevServer;
use crate::watch::WatchSupervisor;

pub type JobFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Seam between the scheduler and the work it schedules.
pub trait JobRunner: Send + Sync + 'static {
    type Job: Send + 'static;

    fn run(&self, job: Self::Job) -> JobFuture;
}

/// Leaf work items of the task plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Run one group's pipeline once.
    Build(AssetGroup),
    /// Start the watch supervisor; returns once listeners are attached.
    Watch,
    /// Start the dev server; returns once both ports are bound.
    Serve,
}

/// Runs jobs against the loaded configuration.
pub struct AssetRunner {
    config: Arc<PipelineConfig>,
}

impl AssetRunner {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }
}

impl JobRunner for AssetRunner {
    type Job = Job;

    fn run(&self, job: Job) -> JobFuture {
        let config = Arc::clone(&self.config);
        Box::pin(async move {
            match job {
                Job::Build(group) => {
                    let report =
                        tokio::task::spawn_blocking(move || run_group(group, &config))
                            .await
                            .map_err(|source| PipelineError::Join { group, source })??;
                    report.log();
                    Ok(())
                }
                Job::Watch => {
                    let supervisor = WatchSupervisor::start(config)?;
                    tokio::spawn(supervisor.run());
                    Ok(())
                }
                Job::Serve => DevServer::start(config),
            }
        })
    }
}
