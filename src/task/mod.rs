//! Named tasks and their composition.
//!
//! | task         | plan                                           |
//! |--------------|------------------------------------------------|
//! | `scss`       | build styles                                   |
//! | `js`         | build scripts                                  |
//! | `svg-sprite` | build icons                                    |
//! | `watch`      | start the watch supervisor                     |
//! | `serve`      | start the dev server                           |
//! | `default`    | all builds in parallel, then watch and serve   |

mod plan;
mod runner;


pub use plan::{Plan, execute, parallel, series};
pub use runner::{AssetRunner, Job, JobFuture, JobRunner};

use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;

use crate::config::PipelineConfig;
use crate::core::AssetGroup;
use crate::pipeline::Pipeline;

/// Tasks invokable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TaskName {
    /// Build styles once
    Scss,
    /// Build scripts once
    Js,
    /// Build the icon sprite once
    SvgSprite,
    /// Rebuild asset groups on change
    Watch,
    /// Serve the project with live reload
    Serve,
    /// Build everything, then watch and serve
    #[default]
    Default,
}

impl TaskName {
    pub const fn for_group(group: AssetGroup) -> Self {
        match group {
            AssetGroup::Styles => Self::Scss,
            AssetGroup::Scripts => Self::Js,
            AssetGroup::Icons => Self::SvgSprite,
        }
    }

    pub fn plan(self) -> Plan<Job> {
        match self {
            Self::Scss => Plan::Job(Job::Build(AssetGroup::Styles)),
            Self::Js => Plan::Job(Job::Build(AssetGroup::Scripts)),
            Self::SvgSprite => Plan::Job(Job::Build(AssetGroup::Icons)),
            Self::Watch => Plan::Job(Job::Watch),
            Self::Serve => Plan::Job(Job::Serve),
            Self::Default => series([
                parallel(AssetGroup::ALL.map(|group| Self::for_group(group).plan())),
                parallel([Self::Watch.plan(), Self::Serve.plan()]),
            ]),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Scss => "scss",
            Self::Js => "js",
            Self::SvgSprite => "svg-sprite",
            Self::Watch => "watch",
            Self::Serve => "serve",
            Self::Default => "default",
        }
    }

    /// Whether the process stays up after the plan returns.
    ///
    /// `watch` and `serve` hand their loops to background tasks and return
    /// once set up, so setup failures surface through the plan.
    pub const fn keeps_alive(self) -> bool {
        matches!(self, Self::Watch | Self::Serve | Self::Default)
    }
}

/// Check every group's chain before anything runs.
pub fn validate_pipelines(config: &PipelineConfig) -> Result<()> {
    for group in AssetGroup::ALL {
        Pipeline::for_group(group, config)?.validate()?;
    }
    Ok(())
}

/// Run `task` to completion.
pub async fn run_task(task: TaskName, config: Arc<PipelineConfig>) -> Result<()> {
    validate_pipelines(&config)?;
    let plan = task.plan();
    crate::debug!("task"; "running `{}` ({} job(s))", task.name(), plan.jobs().len());

    execute(plan, Arc::new(AssetRunner::new(config))).await?;

    if task.keeps_alive() {
        std::future::pending::<()>().await;
    }
    Ok(())
}
