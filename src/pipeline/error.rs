//! Pipeline error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::AssetGroup;

/// Errors raised while running one pipeline invocation.
///
/// [`PipelineError::Source`] is per file: the file produces no output and the
/// rest of the invocation carries on. Every other variant fails the
/// invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed input, reported with whatever location the compiler gives.
    #[error("{}: {message}", path.display())]
    Source { path: PathBuf, message: String },

    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no {group} sources match `{pattern}`")]
    NoMatch { group: AssetGroup, pattern: String },

    #[error("invalid glob `{pattern}`")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid {group} configuration: {message}")]
    Config { group: AssetGroup, message: String },

    /// The stage chain breaks an ordering rule.
    #[error("{group} pipeline is mis-wired: {message}")]
    Order { group: AssetGroup, message: String },

    #[error("{group} pipeline did not complete")]
    Join {
        group: AssetGroup,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl PipelineError {
    pub fn in_file(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Source {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
