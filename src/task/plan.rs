//! Task composition.
//!
//! A plan is a tree of jobs. Leaves are concrete job values rather than task
//! names, so a plan can neither refer to itself nor to something missing.

use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinSet;

use super::runner::{JobFuture, JobRunner};

/// A composed unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan<J> {
    Job(J),
    /// Children run concurrently; done once every child is done.
    Parallel(Vec<Plan<J>>),
    /// Children run in order; the first failure aborts the rest.
    Series(Vec<Plan<J>>),
}

pub fn parallel<J>(plans: impl IntoIterator<Item = Plan<J>>) -> Plan<J> {
    Plan::Parallel(plans.into_iter().collect())
}

pub fn series<J>(plans: impl IntoIterator<Item = Plan<J>>) -> Plan<J> {
    Plan::Series(plans.into_iter().collect())
}

impl<J> Plan<J> {
    /// Every leaf job, depth first.
    pub fn jobs(&self) -> Vec<&J> {
        match self {
            Self::Job(job) => vec![job],
            Self::Parallel(plans) | Self::Series(plans) => {
                plans.iter().flat_map(Self::jobs).collect()
            }
        }
    }
}

/// Run a plan to completion.
///
/// A parallel group waits for all of its children even after one fails, then
/// reports the first failure observed.
pub fn execute<R: JobRunner>(plan: Plan<R::Job>, runner: Arc<R>) -> JobFuture {
    Box::pin(async move {
        match plan {
            Plan::Job(job) => runner.run(job).await,
            Plan::Series(steps) => {
                for step in steps {
                    execute(step, Arc::clone(&runner)).await?;
                }
                Ok(())
            }
            Plan::Parallel(branches) => {
                let mut set = JoinSet::new();
                for branch in branches {
                    set.spawn(execute(branch, Arc::clone(&runner)));
                }

                let mut first_error = None;
                while let Some(joined) = set.join_next().await {
                    let result: Result<()> = joined.map_err(Into::into).and_then(|r| r);
                    match result {
                        Err(err) if first_error.is_none() => first_error = Some(err),
                        Err(err) => crate::debug!("task"; "further failure: {err:#}"),
                        Ok(()) => {}
                    }
                }
                first_error.map_or(Ok(()), Err)
            }
        }
    })
}
